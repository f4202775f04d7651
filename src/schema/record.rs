//! The contract every validated record type implements.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::clock::Clock;

use super::{Fields, SchemaValidationError};

/// A record whose fields carry declarative constraints.
///
/// Implementors only describe how to read their fields; construction from a
/// mapping, re-validation, and validate-on-assignment come from here.
pub trait Record: Serialize + Sized {
    /// Human-readable record kind, used in error messages.
    const NAME: &'static str;

    /// Reads every field, recording violations on `fields`.
    ///
    /// Must read all fields before combining them so each one is checked.
    fn read(fields: &mut Fields<'_>) -> Option<Self>;

    /// Builds a record from a field mapping.
    ///
    /// Absent timestamps are filled from `clock`. Unknown keys are ignored.
    fn from_fields(
        map: &Map<String, Value>,
        clock: &dyn Clock,
    ) -> Result<Self, SchemaValidationError> {
        let mut fields = Fields::new(Self::NAME, map, Some(clock.now()));
        let record = Self::read(&mut fields);
        fields.finish(record)
    }

    /// Builds a record from any JSON value; non-objects are rejected.
    fn from_value(value: &Value, clock: &dyn Clock) -> Result<Self, SchemaValidationError> {
        match value {
            Value::Object(map) => Self::from_fields(map, clock),
            _ => Err(SchemaValidationError::single(
                Self::NAME,
                Self::NAME,
                "expected a mapping of field names to values",
            )),
        }
    }

    /// Builds a record from anything that serializes to a field mapping.
    fn from_serializable<S: Serialize>(
        source: &S,
        clock: &dyn Clock,
    ) -> Result<Self, SchemaValidationError> {
        let map = to_mapping::<Self, _>(source)?;
        Self::from_fields(&map, clock)
    }

    /// The record as a field mapping: enums as their scalar values,
    /// timestamps as ISO-8601 strings.
    fn to_fields(&self) -> Result<Map<String, Value>, SchemaValidationError> {
        to_mapping::<Self, _>(self)
    }

    /// Re-runs every constraint against the current field values.
    ///
    /// Fields are public, so a record assembled by hand may be invalid.
    fn check(&self) -> Result<(), SchemaValidationError> {
        let map = self.to_fields()?;
        let mut fields = Fields::new(Self::NAME, &map, None);
        let record = Self::read(&mut fields);
        fields.finish(record).map(|_| ())
    }

    /// Assigns one field, re-running its constraint.
    ///
    /// On failure the record is left unchanged.
    fn set(&mut self, field: &str, value: Value) -> Result<(), SchemaValidationError> {
        let mut map = self.to_fields()?;
        if !map.contains_key(field) {
            return Err(SchemaValidationError::single(
                Self::NAME,
                field,
                "is not a field of this record",
            ));
        }
        map.insert(field.to_string(), value);

        let mut fields = Fields::new(Self::NAME, &map, None);
        let record = Self::read(&mut fields);
        *self = fields.finish(record)?;
        Ok(())
    }
}

fn to_mapping<R: Record, S: Serialize>(
    source: &S,
) -> Result<Map<String, Value>, SchemaValidationError> {
    match serde_json::to_value(source) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(SchemaValidationError::single(
            R::NAME,
            R::NAME,
            "did not serialize to a field mapping",
        )),
        Err(e) => Err(SchemaValidationError::single(R::NAME, R::NAME, e.to_string())),
    }
}
