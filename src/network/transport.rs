//! Transport capability
//!
//! The connection primitives the correlator is built on.

use crate::error::Result;
use crate::protocol::Response;

/// A persistent connection to a tracker server
///
/// Implementations own framing and the demultiplexing of unrelated inbound
/// frames. They are driven by one caller at a time.
pub trait Transport {
    /// Open a connection to `host:port`
    fn connect(&mut self, host: &str, port: &str) -> Result<()>;

    /// Send one encoded message
    fn send_bytes(&mut self, payload: &[u8]) -> Result<()>;

    /// Block until an inbound frame whose top-level `field` equals `value`
    ///
    /// Frames that do not match are consumed and dropped.
    fn read_blocking_match(&mut self, field: &str, value: &str) -> Result<Response>;

    /// Close the connection
    fn close(&mut self);
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn connect(&mut self, host: &str, port: &str) -> Result<()> {
        (**self).connect(host, port)
    }

    fn send_bytes(&mut self, payload: &[u8]) -> Result<()> {
        (**self).send_bytes(payload)
    }

    fn read_blocking_match(&mut self, field: &str, value: &str) -> Result<Response> {
        (**self).read_blocking_match(field, value)
    }

    fn close(&mut self) {
        (**self).close()
    }
}
