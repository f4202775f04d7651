//! Declarative field constraints for validated records.
//!
//! Records are built from a loose mapping of field name to JSON value.
//! Every field is checked on its own and every violation is collected, so
//! a mapping with three bad fields reports all three. String values are
//! trimmed before any constraint runs.

mod fields;
mod record;
pub mod timestamp;

use std::fmt;

use serde::Serialize;

pub use fields::{Bounds, Fields, Text};
pub use record::Record;

/// One field that failed its constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldViolation {
    pub field: String,
    pub message: String,
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// A record failed structural validation.
///
/// Carries every violated field, not just the first one found.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {record}: {}", join_violations(.violations))]
pub struct SchemaValidationError {
    /// Which kind of record was being built.
    pub record: &'static str,
    pub violations: Vec<FieldViolation>,
}

impl SchemaValidationError {
    /// An error with a single violation.
    pub fn single(record: &'static str, field: &str, message: impl Into<String>) -> Self {
        Self {
            record,
            violations: vec![FieldViolation {
                field: field.to_string(),
                message: message.into(),
            }],
        }
    }

    /// Whether the given field is among the violations.
    pub fn violates(&self, field: &str) -> bool {
        self.violations.iter().any(|v| v.field == field)
    }

    /// Names of the violated fields, in the order they were checked.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.violations.iter().map(|v| v.field.as_str())
    }
}

fn join_violations(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_lists_every_violation() {
        let err = SchemaValidationError {
            record: "shard",
            violations: vec![
                FieldViolation {
                    field: "shard_id".into(),
                    message: "must match ^SHARD-\\d{3}-[A-Z]+$".into(),
                },
                FieldViolation {
                    field: "title".into(),
                    message: "is required".into(),
                },
            ],
        };

        let text = err.to_string();
        assert!(text.starts_with("invalid shard: "));
        assert!(text.contains("shard_id: must match"));
        assert!(text.contains("title: is required"));
        assert!(err.violates("title"));
        assert!(!err.violates("description"));
    }
}
