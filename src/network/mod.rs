//! Network Module
//!
//! Transport capability and its TCP implementation.
//!
//! ## Architecture
//! - `Transport` trait consumed by the correlator
//! - `TcpTransport` with a reader thread feeding a frame channel
//! - Optional heartbeat thread sharing the socket writer
//! - Newline-delimited framing

mod transport;
mod framing;
mod tcp;

pub use transport::Transport;
pub use framing::{write_frame, FrameReader, DELIMITER};
pub use tcp::TcpTransport;
