//! Field readers: pull typed values out of a mapping, recording violations.
//!
//! Every reader returns `None` when its field is invalid and records why.
//! Callers read all of their fields first and only then combine the results,
//! so one bad field never hides another.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Display;
use std::sync::LazyLock;

use jiff::Timestamp;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use super::{FieldViolation, SchemaValidationError, timestamp};

/// Length and pattern constraints for a string field.
///
/// Lengths count characters, not bytes.
#[derive(Debug, Clone, Copy)]
pub struct Text {
    min: Option<usize>,
    max: Option<usize>,
    pattern: Option<&'static LazyLock<Regex>>,
}

impl Text {
    /// Any string is accepted.
    pub const ANY: Self = Self {
        min: None,
        max: None,
        pattern: None,
    };

    pub const fn between(min: usize, max: usize) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
            pattern: None,
        }
    }

    pub const fn at_least(min: usize) -> Self {
        Self {
            min: Some(min),
            max: None,
            pattern: None,
        }
    }

    pub const fn matching(pattern: &'static LazyLock<Regex>) -> Self {
        Self {
            min: None,
            max: None,
            pattern: Some(pattern),
        }
    }

    fn check(&self, value: &str) -> Option<String> {
        let len = value.chars().count();
        if let Some(min) = self.min
            && len < min
        {
            return Some(format!("must be at least {min} characters, got {len}"));
        }
        if let Some(max) = self.max
            && len > max
        {
            return Some(format!("must be at most {max} characters, got {len}"));
        }
        if let Some(pattern) = self.pattern
            && !pattern.is_match(value)
        {
            return Some(format!("must match {}", pattern.as_str()));
        }
        None
    }
}

/// Inclusive numeric bounds.
#[derive(Debug, Clone, Copy)]
pub struct Bounds<T> {
    min: Option<T>,
    max: Option<T>,
}

impl<T> Bounds<T> {
    pub const fn between(min: T, max: T) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
        }
    }

    pub const fn at_least(min: T) -> Self {
        Self {
            min: Some(min),
            max: None,
        }
    }
}

impl<T: PartialOrd + Display + Copy> Bounds<T> {
    fn check(&self, value: T) -> Option<String> {
        if let Some(min) = self.min
            && value < min
        {
            return Some(format!("must be at least {min}, got {value}"));
        }
        if let Some(max) = self.max
            && value > max
        {
            return Some(format!("must be at most {max}, got {value}"));
        }
        None
    }
}

/// What a mapping holds under a field name.
enum Slot<'a> {
    Missing,
    Null,
    Present(&'a Value),
}

/// Reads fields out of a mapping for one record, collecting violations.
pub struct Fields<'a> {
    record: &'static str,
    map: &'a Map<String, Value>,
    now: Option<Timestamp>,
    violations: Vec<FieldViolation>,
}

impl<'a> Fields<'a> {
    /// `now` fills timestamp fields that are absent from the mapping.
    /// Without it, an absent timestamp is a violation.
    pub fn new(record: &'static str, map: &'a Map<String, Value>, now: Option<Timestamp>) -> Self {
        Self {
            record,
            map,
            now,
            violations: Vec::new(),
        }
    }

    /// Turns the assembled record into a result.
    ///
    /// Any recorded violation fails the whole record.
    pub fn finish<T>(mut self, record: Option<T>) -> Result<T, SchemaValidationError> {
        match record {
            Some(record) if self.violations.is_empty() => Ok(record),
            _ => {
                if self.violations.is_empty() {
                    let record = self.record;
                    self.reject::<()>(record, "record could not be assembled");
                }
                Err(SchemaValidationError {
                    record: self.record,
                    violations: self.violations,
                })
            }
        }
    }

    fn slot(&self, field: &str) -> Slot<'a> {
        let map: &'a Map<String, Value> = self.map;
        match map.get(field) {
            None => Slot::Missing,
            Some(Value::Null) => Slot::Null,
            Some(value) => Slot::Present(value),
        }
    }

    fn reject<T>(&mut self, field: &str, message: impl Into<String>) -> Option<T> {
        self.violations.push(FieldViolation {
            field: field.to_string(),
            message: message.into(),
        });
        None
    }

    // ── Strings ──

    /// A required string.
    pub fn text(&mut self, field: &str, rule: &Text) -> Option<String> {
        match self.slot(field) {
            Slot::Present(value) => self.string_value(field, value, rule),
            Slot::Missing | Slot::Null => self.reject(field, "is required"),
        }
    }

    /// A string with a default used when the field is absent.
    pub fn text_or(&mut self, field: &str, rule: &Text, default: &str) -> Option<String> {
        match self.slot(field) {
            Slot::Present(value) => self.string_value(field, value, rule),
            Slot::Missing => Some(default.to_string()),
            Slot::Null => self.reject(field, "must not be null"),
        }
    }

    /// An optional string: absent and null both mean `None`.
    pub fn optional_text(&mut self, field: &str, rule: &Text) -> Option<Option<String>> {
        match self.slot(field) {
            Slot::Present(value) => self.string_value(field, value, rule).map(Some),
            Slot::Missing | Slot::Null => Some(None),
        }
    }

    /// A list of strings, empty when absent.
    pub fn text_list(&mut self, field: &str) -> Option<Vec<String>> {
        match self.slot(field) {
            Slot::Missing => Some(Vec::new()),
            Slot::Null => self.reject(field, "must not be null"),
            Slot::Present(Value::Array(items)) => {
                let mut out = Vec::with_capacity(items.len());
                for (i, item) in items.iter().enumerate() {
                    match item {
                        Value::String(s) => out.push(s.trim().to_string()),
                        other => {
                            return self.reject(
                                field,
                                format!("item {i}: expected a string, got {}", kind(other)),
                            );
                        }
                    }
                }
                Some(out)
            }
            Slot::Present(other) => {
                self.reject(field, format!("expected a list, got {}", kind(other)))
            }
        }
    }

    fn string_value(&mut self, field: &str, value: &Value, rule: &Text) -> Option<String> {
        let Value::String(raw) = value else {
            return self.reject(field, format!("expected a string, got {}", kind(value)));
        };
        let trimmed = raw.trim();
        match rule.check(trimmed) {
            Some(message) => self.reject(field, message),
            None => Some(trimmed.to_string()),
        }
    }

    // ── Enumerations ──

    /// A required member of a closed set.
    pub fn choice<E: DeserializeOwned>(&mut self, field: &str) -> Option<E> {
        match self.slot(field) {
            Slot::Present(value) => self.choice_value(field, value),
            Slot::Missing | Slot::Null => self.reject(field, "is required"),
        }
    }

    /// A member of a closed set with a default used when absent.
    pub fn choice_or<E: DeserializeOwned>(&mut self, field: &str, default: E) -> Option<E> {
        match self.slot(field) {
            Slot::Present(value) => self.choice_value(field, value),
            Slot::Missing => Some(default),
            Slot::Null => self.reject(field, "must not be null"),
        }
    }

    /// A set of members of a closed set, empty when absent. Duplicates collapse.
    pub fn choice_set<E: DeserializeOwned + Ord>(&mut self, field: &str) -> Option<BTreeSet<E>> {
        match self.slot(field) {
            Slot::Missing => Some(BTreeSet::new()),
            Slot::Null => self.reject(field, "must not be null"),
            Slot::Present(Value::Array(items)) => {
                let mut out = BTreeSet::new();
                for (i, item) in items.iter().enumerate() {
                    match decode(item) {
                        Ok(member) => {
                            out.insert(member);
                        }
                        Err(message) => return self.reject(field, format!("item {i}: {message}")),
                    }
                }
                Some(out)
            }
            Slot::Present(other) => {
                self.reject(field, format!("expected a list, got {}", kind(other)))
            }
        }
    }

    fn choice_value<E: DeserializeOwned>(&mut self, field: &str, value: &Value) -> Option<E> {
        match decode(value) {
            Ok(member) => Some(member),
            Err(message) => self.reject(field, message),
        }
    }

    // ── Numbers and flags ──

    /// An integer within bounds, with a default used when absent.
    pub fn integer_or<T: TryFrom<i64>>(
        &mut self,
        field: &str,
        bounds: Bounds<i64>,
        default: T,
    ) -> Option<T> {
        let value = match self.slot(field) {
            Slot::Missing => return Some(default),
            Slot::Null => return self.reject(field, "must not be null"),
            Slot::Present(value) => value,
        };
        let Some(n) = value.as_i64() else {
            return self.reject(field, format!("expected an integer, got {}", kind(value)));
        };
        if let Some(message) = bounds.check(n) {
            return self.reject(field, message);
        }
        match T::try_from(n) {
            Ok(n) => Some(n),
            Err(_) => self.reject(field, format!("{n} is out of range")),
        }
    }

    /// A number within bounds, with a default used when absent.
    pub fn number_or(&mut self, field: &str, bounds: Bounds<f64>, default: f64) -> Option<f64> {
        match self.slot(field) {
            Slot::Present(value) => self.number_value(field, value, bounds),
            Slot::Missing => Some(default),
            Slot::Null => self.reject(field, "must not be null"),
        }
    }

    /// An optional number within bounds.
    pub fn optional_number(&mut self, field: &str, bounds: Bounds<f64>) -> Option<Option<f64>> {
        match self.slot(field) {
            Slot::Present(value) => self.number_value(field, value, bounds).map(Some),
            Slot::Missing | Slot::Null => Some(None),
        }
    }

    fn number_value(&mut self, field: &str, value: &Value, bounds: Bounds<f64>) -> Option<f64> {
        let Some(n) = value.as_f64() else {
            return self.reject(field, format!("expected a number, got {}", kind(value)));
        };
        match bounds.check(n) {
            Some(message) => self.reject(field, message),
            None => Some(n),
        }
    }

    /// A boolean with a default used when absent.
    pub fn flag_or(&mut self, field: &str, default: bool) -> Option<bool> {
        match self.slot(field) {
            Slot::Present(Value::Bool(b)) => Some(*b),
            Slot::Present(other) => {
                self.reject(field, format!("expected true or false, got {}", kind(other)))
            }
            Slot::Missing => Some(default),
            Slot::Null => self.reject(field, "must not be null"),
        }
    }

    // ── Timestamps ──

    /// A timestamp that defaults to the reader's `now` when absent.
    pub fn timestamp_or_now(&mut self, field: &str) -> Option<Timestamp> {
        match self.slot(field) {
            Slot::Present(value) => self.timestamp_value(field, value),
            Slot::Missing => match self.now {
                Some(now) => Some(now),
                None => self.reject(field, "is required"),
            },
            Slot::Null => self.reject(field, "must not be null"),
        }
    }

    /// An optional timestamp.
    pub fn optional_timestamp(&mut self, field: &str) -> Option<Option<Timestamp>> {
        match self.slot(field) {
            Slot::Present(value) => self.timestamp_value(field, value).map(Some),
            Slot::Missing | Slot::Null => Some(None),
        }
    }

    /// Accepts RFC 3339 instants, and civil date-times without an offset,
    /// which are read as UTC.
    fn timestamp_value(&mut self, field: &str, value: &Value) -> Option<Timestamp> {
        let Value::String(raw) = value else {
            return self.reject(field, format!("expected a timestamp, got {}", kind(value)));
        };
        match timestamp::parse(raw) {
            Ok(ts) => Some(ts),
            Err(e) => self.reject(field, format!("expected an ISO-8601 timestamp: {e}")),
        }
    }

    // ── Mappings ──

    /// A required mapping of string to string.
    pub fn required_string_map(&mut self, field: &str) -> Option<BTreeMap<String, String>> {
        match self.slot(field) {
            Slot::Present(value) => self.string_map_value(field, value),
            Slot::Missing | Slot::Null => self.reject(field, "is required"),
        }
    }

    /// A mapping of string to string, empty when absent.
    pub fn string_map(&mut self, field: &str) -> Option<BTreeMap<String, String>> {
        match self.slot(field) {
            Slot::Present(value) => self.string_map_value(field, value),
            Slot::Missing => Some(BTreeMap::new()),
            Slot::Null => self.reject(field, "must not be null"),
        }
    }

    /// A free-form mapping, empty when absent.
    pub fn value_map(&mut self, field: &str) -> Option<Map<String, Value>> {
        match self.slot(field) {
            Slot::Present(Value::Object(obj)) => Some(obj.clone()),
            Slot::Present(other) => {
                self.reject(field, format!("expected a mapping, got {}", kind(other)))
            }
            Slot::Missing => Some(Map::new()),
            Slot::Null => self.reject(field, "must not be null"),
        }
    }

    /// A list of string-to-string mappings, empty when absent.
    pub fn map_list(&mut self, field: &str) -> Option<Vec<BTreeMap<String, String>>> {
        match self.slot(field) {
            Slot::Missing => Some(Vec::new()),
            Slot::Null => self.reject(field, "must not be null"),
            Slot::Present(Value::Array(items)) => {
                let mut out = Vec::with_capacity(items.len());
                for (i, item) in items.iter().enumerate() {
                    match string_map(item) {
                        Ok(map) => out.push(map),
                        Err(message) => return self.reject(field, format!("item {i}: {message}")),
                    }
                }
                Some(out)
            }
            Slot::Present(other) => {
                self.reject(field, format!("expected a list, got {}", kind(other)))
            }
        }
    }

    fn string_map_value(&mut self, field: &str, value: &Value) -> Option<BTreeMap<String, String>> {
        match string_map(value) {
            Ok(map) => Some(map),
            Err(message) => self.reject(field, message),
        }
    }
}

/// Deserializes a closed-set member, trimming string input first.
fn decode<E: DeserializeOwned>(value: &Value) -> Result<E, String> {
    let value = match value {
        Value::String(s) => Value::String(s.trim().to_string()),
        other => other.clone(),
    };
    serde_json::from_value(value).map_err(|e| e.to_string())
}

fn string_map(value: &Value) -> Result<BTreeMap<String, String>, String> {
    let Value::Object(obj) = value else {
        return Err(format!("expected a mapping, got {}", kind(value)));
    };
    let mut out = BTreeMap::new();
    for (key, value) in obj {
        match value {
            Value::String(s) => {
                out.insert(key.clone(), s.trim().to_string());
            }
            other => return Err(format!("{key}: expected a string, got {}", kind(other))),
        }
    }
    Ok(out)
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "a mapping",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    static UPPER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Z]+$").unwrap());

    fn mapping(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("test input must be an object"),
        }
    }

    #[test]
    fn text_is_trimmed_before_checking() {
        let map = mapping(json!({ "name": "   abcde   " }));
        let mut fields = Fields::new("test", &map, None);

        let name = fields.text("name", &Text::between(5, 5));
        assert_eq!(name.as_deref(), Some("abcde"));
        assert!(fields.finish(Some(())).is_ok());
    }

    #[test]
    fn collects_every_violation() {
        let map = mapping(json!({ "code": "lower", "count": 42, "flag": "yes" }));
        let mut fields = Fields::new("test", &map, None);

        let code = fields.text("code", &Text::matching(&UPPER));
        let count: Option<u8> = fields.integer_or("count", Bounds::between(1, 10), 5);
        let flag = fields.flag_or("flag", false);
        let missing = fields.text("missing", &Text::ANY);
        let record = (|| Some((code?, count?, flag?, missing?)))();

        let err = fields.finish(record).unwrap_err();
        let names: Vec<&str> = err.fields().collect();
        assert_eq!(names, ["code", "count", "flag", "missing"]);
    }

    #[test]
    fn defaults_fill_absent_fields() {
        let map = Map::new();
        let now = Timestamp::new(1_700_000_000, 0).unwrap();
        let mut fields = Fields::new("test", &map, Some(now));

        assert_eq!(fields.text_or("s", &Text::ANY, "medium").as_deref(), Some("medium"));
        assert_eq!(fields.integer_or::<u8>("n", Bounds::between(1, 10), 5), Some(5));
        assert_eq!(fields.flag_or("b", true), Some(true));
        assert_eq!(fields.timestamp_or_now("at"), Some(now));
        assert_eq!(fields.optional_text("o", &Text::ANY), Some(None));
        assert_eq!(fields.text_list("l"), Some(vec![]));
    }

    #[test]
    fn null_on_defaulted_field_is_rejected() {
        let map = mapping(json!({ "s": null }));
        let mut fields = Fields::new("test", &map, None);

        assert_eq!(fields.text_or("s", &Text::ANY, "x"), None);
        assert!(fields.finish(Some(())).unwrap_err().violates("s"));
    }

    #[test]
    fn naive_timestamps_are_read_as_utc() {
        let map = mapping(json!({
            "zoned": "2026-01-13T10:00:00Z",
            "naive": "2026-01-13T10:00:00.250000",
        }));
        let mut fields = Fields::new("test", &map, None);

        let zoned = fields.timestamp_or_now("zoned").unwrap();
        let naive = fields.timestamp_or_now("naive").unwrap();
        assert_eq!(naive.as_second(), zoned.as_second());
    }

    #[test]
    fn number_bounds_are_inclusive() {
        let map = mapping(json!({ "low": 0.0, "high": 100.0, "over": 100.5 }));
        let mut fields = Fields::new("test", &map, None);
        let percent = Bounds::between(0.0, 100.0);

        assert_eq!(fields.number_or("low", percent, 1.0), Some(0.0));
        assert_eq!(fields.number_or("high", percent, 1.0), Some(100.0));
        assert_eq!(fields.number_or("over", percent, 1.0), None);
    }

    #[test]
    fn string_maps_reject_non_string_values() {
        let map = mapping(json!({ "env": { "LOG_LEVEL": "info", "PORT": 80 } }));
        let mut fields = Fields::new("test", &map, None);

        assert_eq!(fields.string_map("env"), None);
        let err = fields.finish(Some(())).unwrap_err();
        assert!(err.violations[0].message.contains("PORT"));
    }
}
