//! Dynamic response values
//!
//! Inbound `values` hold numbers, booleans, strings or nested objects
//! depending on the field. They are kept as a tagged union and converted
//! through checked accessors.

use serde::{Deserialize, Serialize};
use serde_json::Map;

use crate::error::{EyeTribeError, Result};

/// A single dynamic value (number | bool | string | array | object | null)
pub type Value = serde_json::Value;

/// Conversion from a dynamic value into a concrete type
pub trait FromValue: Sized {
    /// Human readable name of the expected type
    const EXPECTED: &'static str;

    /// Convert `value`, reporting `field` on mismatch
    fn from_value(field: &str, value: &Value) -> Result<Self>;
}

fn mismatch<T: FromValue>(field: &str, value: &Value) -> EyeTribeError {
    EyeTribeError::TypeMismatch {
        field: field.to_string(),
        expected: T::EXPECTED,
        found: type_name(value),
    }
}

/// Name of a value's JSON type
pub(crate) fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl FromValue for i64 {
    const EXPECTED: &'static str = "integer";

    fn from_value(field: &str, value: &Value) -> Result<Self> {
        if let Some(n) = value.as_i64() {
            return Ok(n);
        }
        // The server may render integral values as floats (`30.0`)
        match value.as_f64() {
            Some(f) if f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64 => {
                Ok(f as i64)
            }
            _ => Err(mismatch::<Self>(field, value)),
        }
    }
}

impl FromValue for f64 {
    const EXPECTED: &'static str = "number";

    fn from_value(field: &str, value: &Value) -> Result<Self> {
        value.as_f64().ok_or_else(|| mismatch::<Self>(field, value))
    }
}

impl FromValue for bool {
    const EXPECTED: &'static str = "bool";

    fn from_value(field: &str, value: &Value) -> Result<Self> {
        value.as_bool().ok_or_else(|| mismatch::<Self>(field, value))
    }
}

impl FromValue for String {
    const EXPECTED: &'static str = "string";

    fn from_value(field: &str, value: &Value) -> Result<Self> {
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| mismatch::<Self>(field, value))
    }
}

impl FromValue for Values {
    const EXPECTED: &'static str = "object";

    fn from_value(field: &str, value: &Value) -> Result<Self> {
        value
            .as_object()
            .map(|map| Values(map.clone()))
            .ok_or_else(|| mismatch::<Self>(field, value))
    }
}

impl FromValue for Value {
    const EXPECTED: &'static str = "any";

    fn from_value(_field: &str, value: &Value) -> Result<Self> {
        Ok(value.clone())
    }
}

/// The field-keyed `values` object of an inbound frame
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Values(Map<String, Value>);

impl Values {
    /// Create an empty mapping
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw value for a field
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Typed value for a field, `None` when absent
    pub fn get_as<T: FromValue>(&self, field: &str) -> Result<Option<T>> {
        self.0
            .get(field)
            .map(|value| T::from_value(field, value))
            .transpose()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over `(field, value)` pairs
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for Values {
    fn from(map: Map<String, Value>) -> Self {
        Values(map)
    }
}
