//! Status, priority, and clearance enumerations.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use super::ParseEnumError;

/// Where a shard (or the task a journal entry describes) stands.
///
/// The happy path runs pending → in progress → completed → archived.
/// Blocked and failed branch off from in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
    Blocked,
    Failed,
    Archived,
}

impl TaskStatus {
    pub const ALL: [Self; 6] = [
        Self::Pending,
        Self::InProgress,
        Self::Completed,
        Self::Blocked,
        Self::Failed,
        Self::Archived,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Blocked => "blocked",
            Self::Failed => "failed",
            Self::Archived => "archived",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| {
                ParseEnumError::new("task status", s, Self::ALL.into_iter().map(Self::as_str))
            })
    }
}

/// Shard priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Critical,
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    pub const ALL: [Self; 4] = [Self::Critical, Self::High, Self::Medium, Self::Low];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|priority| priority.as_str() == s)
            .ok_or_else(|| {
                ParseEnumError::new("priority", s, Self::ALL.into_iter().map(Self::as_str))
            })
    }
}

/// Clearance level of a record, 1 (public) through 5 (top secret).
///
/// Serialized as its integer. Higher levels sort after lower ones.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(into = "u8", try_from = "u8")]
pub enum SecurityLevel {
    Public = 1,
    #[default]
    Internal = 2,
    Confidential = 3,
    Secret = 4,
    TopSecret = 5,
}

impl SecurityLevel {
    pub const ALL: [Self; 5] = [
        Self::Public,
        Self::Internal,
        Self::Confidential,
        Self::Secret,
        Self::TopSecret,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Internal => "internal",
            Self::Confidential => "confidential",
            Self::Secret => "secret",
            Self::TopSecret => "top_secret",
        }
    }

    pub fn level(self) -> u8 {
        self as u8
    }
}

impl From<SecurityLevel> for u8 {
    fn from(level: SecurityLevel) -> Self {
        level.level()
    }
}

impl TryFrom<u8> for SecurityLevel {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|level| level.level() == value)
            .ok_or_else(|| format!("security level must be between 1 and 5, got {value}"))
    }
}

impl fmt::Display for SecurityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accepts either the level number (`"5"`) or its name (`"top_secret"`).
impl FromStr for SecurityLevel {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let by_number = s.parse::<u8>().ok().and_then(|n| Self::try_from(n).ok());
        by_number
            .or_else(|| Self::ALL.into_iter().find(|level| level.as_str() == s))
            .ok_or_else(|| {
                ParseEnumError::new(
                    "security level",
                    s,
                    ["1", "2", "3", "4", "5"]
                        .into_iter()
                        .chain(Self::ALL.into_iter().map(Self::as_str)),
                )
            })
    }
}
