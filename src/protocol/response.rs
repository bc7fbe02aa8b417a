//! Response definitions
//!
//! Represents frames received from the tracker server.

use serde::{Deserialize, Serialize};

use super::values::{FromValue, Value, Values};
use crate::error::{EyeTribeError, Result};

/// One decoded inbound frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub category: String,

    pub request: String,

    /// Field-keyed payload, interpreted lazily
    pub values: Values,

    /// Top-level status code, when the server puts it outside `values`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub statuscode: Option<i64>,
}

impl Response {
    /// Raw value of a field, failing with `FieldMissing` when absent
    pub fn field(&self, field: &str) -> Result<&Value> {
        self.values.get(field).ok_or_else(|| self.missing(field))
    }

    /// Typed value of a field
    pub fn field_as<T: FromValue>(&self, field: &str) -> Result<T> {
        T::from_value(field, self.field(field)?)
    }

    /// Status code of a command reply
    ///
    /// Looks in `values` first, then at the top level of the frame.
    pub fn status_code(&self) -> Result<i64> {
        if let Some(code) = self.values.get_as::<i64>("statuscode")? {
            return Ok(code);
        }
        self.statuscode.ok_or_else(|| self.missing("statuscode"))
    }

    pub(crate) fn missing(&self, field: &str) -> EyeTribeError {
        EyeTribeError::FieldMissing {
            category: self.category.clone(),
            request: self.request.clone(),
            field: field.to_string(),
        }
    }
}
