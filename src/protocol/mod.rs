//! Protocol Module
//!
//! Defines the JSON wire protocol spoken with the tracker server.
//!
//! ## Message Format
//!
//! Every message is a single JSON object terminated by `\n`:
//!
//! ```text
//! {"category": <string>, "request": <string>, "values": <list | object>}
//! ```
//!
//! ### Outbound
//! - Query:   `{"category":"tracker","request":"get","values":["framerate"]}`
//! - Command: `{"category":"calibration","request":"pointstart","values":{"x":100,"y":200}}`
//!
//! ### Inbound
//! - Frame:   `{"category":"tracker","request":"get","values":{"framerate":30}}`
//!
//! The server also pushes unsolicited frames, so a reply is found by
//! scanning for a frame whose top-level field matches, not by position.
//!
//! ### Categories
//! - `tracker`:     status queries and gaze frames
//! - `calibration`: calibration lifecycle commands
//! - `heartbeat`:   keep-alive

mod request;
mod response;
mod values;
mod codec;

pub use request::{Request, RequestValues, CATEGORY_CALIBRATION, CATEGORY_HEARTBEAT, CATEGORY_TRACKER, VERB_GET};
pub use response::Response;
pub use values::{FromValue, Value, Values};
pub use codec::{
    decode, decode_frame, encode, encode_heartbeat, frame_matches, response_from_frame,
};
