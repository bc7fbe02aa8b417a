//! Protocol codec
//!
//! Encoding and decoding functions for the JSON wire protocol.
//!
//! ## Wire Format
//!
//! ### Request
//! ```text
//! {"category":"tracker","request":"get","values":["version"]}
//! {"category":"calibration","request":"start","values":{"pointcount":9}}
//! ```
//!
//! ### Frame
//! ```text
//! {"category":"tracker","request":"get","values":{"version":1}}
//! ```
//!
//! Framing (the trailing newline) is handled by the transport, not here.

use crate::error::{EyeTribeError, Result};
use super::{Request, Response, Value, CATEGORY_HEARTBEAT};

// =============================================================================
// Request Encoding
// =============================================================================

/// Encode a request to JSON bytes
pub fn encode(request: &Request) -> Result<Vec<u8>> {
    serde_json::to_vec(request).map_err(|e| {
        EyeTribeError::Encoding(format!(
            "{}/{}: {}",
            request.category, request.request, e
        ))
    })
}

/// Encode the keep-alive message
pub fn encode_heartbeat() -> Vec<u8> {
    format!(r#"{{"category":"{}"}}"#, CATEGORY_HEARTBEAT).into_bytes()
}

// =============================================================================
// Frame Decoding
// =============================================================================

/// Decode a frame into a response
///
/// Fails on malformed JSON or when `category`, `request` or `values` is missing.
pub fn decode(bytes: &[u8]) -> Result<Response> {
    response_from_frame(decode_frame(bytes)?)
}

/// Parse a frame without checking its shape
///
/// Only requires a JSON object, so the transport can test a match key before
/// committing to the full response shape.
pub fn decode_frame(bytes: &[u8]) -> Result<Value> {
    let frame: Value = serde_json::from_slice(bytes)
        .map_err(|e| EyeTribeError::Decoding(format!("Malformed frame: {}", e)))?;

    if !frame.is_object() {
        return Err(EyeTribeError::Decoding(format!(
            "Frame is not a JSON object: {}",
            super::values::type_name(&frame)
        )));
    }

    Ok(frame)
}

/// Convert a parsed frame into a response
pub fn response_from_frame(frame: Value) -> Result<Response> {
    serde_json::from_value(frame)
        .map_err(|e| EyeTribeError::Decoding(format!("Invalid frame shape: {}", e)))
}

/// Whether a frame's top-level `field` is the string `value`
pub fn frame_matches(frame: &Value, field: &str, value: &str) -> bool {
    frame.get(field).and_then(Value::as_str) == Some(value)
}
