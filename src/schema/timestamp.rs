//! Lenient ISO-8601 timestamps.
//!
//! RFC 3339 instants parse as-is. Civil date-times without an offset, as
//! older shard documents store them, are read as UTC. Both the field readers
//! and the serde impls of stored documents go through [`parse`].

use jiff::{Timestamp, civil::DateTime, tz::TimeZone};
use serde::{Deserialize, Deserializer, de};

/// Parses an instant, falling back to an offset-less date-time in UTC.
pub fn parse(raw: &str) -> Result<Timestamp, jiff::Error> {
    let raw = raw.trim();
    if let Ok(ts) = raw.parse::<Timestamp>() {
        return Ok(ts);
    }
    raw.parse::<DateTime>()
        .and_then(|dt| dt.to_zoned(TimeZone::UTC))
        .map(|zoned| zoned.timestamp())
}

/// `deserialize_with` for a required timestamp.
pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Timestamp, D::Error> {
    let raw = String::deserialize(deserializer)?;
    parse(&raw).map_err(de::Error::custom)
}

/// `deserialize_with` for an optional timestamp. Pair with `#[serde(default)]`.
pub mod option {
    use super::{Deserialize, Deserializer, Timestamp, de, parse};

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Timestamp>, D::Error> {
        Option::<String>::deserialize(deserializer)?
            .map(|raw| parse(&raw).map_err(de::Error::custom))
            .transpose()
    }
}
