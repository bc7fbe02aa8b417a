//! Request definitions
//!
//! Represents messages sent to the tracker server.

use std::collections::BTreeMap;

use serde::Serialize;

/// Category for tracker state queries
pub const CATEGORY_TRACKER: &str = "tracker";

/// Category for calibration commands
pub const CATEGORY_CALIBRATION: &str = "calibration";

/// Category for keep-alive messages
pub const CATEGORY_HEARTBEAT: &str = "heartbeat";

/// Verb used by every simple query
pub const VERB_GET: &str = "get";

/// Payload of a request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum RequestValues {
    /// Names of the fields being queried
    Fields(Vec<String>),

    /// Named integer parameters of a command
    Params(BTreeMap<String, i64>),
}

/// An outbound request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Request {
    pub category: String,
    pub request: String,
    pub values: RequestValues,
}

impl Request {
    /// Build a simple `get` query for one field
    pub fn query(category: &str, field: &str) -> Self {
        Self {
            category: category.to_string(),
            request: VERB_GET.to_string(),
            values: RequestValues::Fields(vec![field.to_string()]),
        }
    }

    /// Build a parameterized command
    pub fn command<'a, I>(category: &str, request: &str, params: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, i64)>,
    {
        let params = params
            .into_iter()
            .map(|(name, value)| (name.to_string(), value))
            .collect();

        Self {
            category: category.to_string(),
            request: request.to_string(),
            values: RequestValues::Params(params),
        }
    }

    /// Whether this request is a simple query
    pub fn is_query(&self) -> bool {
        matches!(self.values, RequestValues::Fields(_))
    }
}
