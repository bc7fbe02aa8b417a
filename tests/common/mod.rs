//! Shared test helpers
//!
//! `FakeTransport` replays scripted inbound frames and records what the
//! client sends. Matching uses the real codec predicate, so unrelated frames
//! are skipped exactly as on a live connection.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::io;

use eyetribe::protocol::{decode_frame, frame_matches, response_from_frame, Response};
use eyetribe::{Client, EyeTribeError, Result, Transport};
use serde_json::Value;

#[derive(Default)]
pub struct FakeTransport {
    /// Frames the "server" will deliver, in order
    pub inbound: VecDeque<String>,

    /// Payloads written by the client
    pub sent: Vec<Vec<u8>>,

    /// Every `(host, port)` passed to connect
    pub connects: Vec<(String, String)>,

    pub connected: bool,
    pub close_calls: usize,

    pub fail_connect: bool,

    /// Fail every send after this many successful ones
    pub fail_send_after: Option<usize>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_frames<S: AsRef<str>>(frames: &[S]) -> Self {
        let mut transport = Self::new();
        for frame in frames {
            transport.push_frame(frame.as_ref());
        }
        transport
    }

    pub fn push_frame(&mut self, frame: &str) {
        self.inbound.push_back(frame.to_string());
    }

    /// Sent payloads parsed back as JSON
    pub fn sent_json(&self) -> Vec<Value> {
        self.sent
            .iter()
            .map(|bytes| serde_json::from_slice(bytes).expect("client sent invalid JSON"))
            .collect()
    }

    pub fn sent_text(&self) -> Vec<String> {
        self.sent
            .iter()
            .map(|bytes| String::from_utf8(bytes.clone()).expect("client sent invalid UTF-8"))
            .collect()
    }
}

impl Transport for FakeTransport {
    fn connect(&mut self, host: &str, port: &str) -> Result<()> {
        if self.fail_connect {
            return Err(EyeTribeError::Connection(io::Error::new(
                io::ErrorKind::ConnectionRefused,
                "connection refused",
            )));
        }
        self.connects.push((host.to_string(), port.to_string()));
        self.connected = true;
        Ok(())
    }

    fn send_bytes(&mut self, payload: &[u8]) -> Result<()> {
        if !self.connected {
            return Err(EyeTribeError::NotConnected);
        }
        if let Some(limit) = self.fail_send_after {
            if self.sent.len() >= limit {
                return Err(EyeTribeError::Connection(io::Error::new(
                    io::ErrorKind::BrokenPipe,
                    "broken pipe",
                )));
            }
        }
        self.sent.push(payload.to_vec());
        Ok(())
    }

    fn read_blocking_match(&mut self, field: &str, value: &str) -> Result<Response> {
        while let Some(raw) = self.inbound.pop_front() {
            let frame = decode_frame(raw.as_bytes())?;
            if frame_matches(&frame, field, value) {
                return response_from_frame(frame);
            }
        }
        Err(EyeTribeError::Connection(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "no scripted frame left",
        )))
    }

    fn close(&mut self) {
        self.connected = false;
        self.close_calls += 1;
    }
}

/// A client already connected over a fake transport
pub fn connected_client<S: AsRef<str>>(frames: &[S]) -> Client<FakeTransport> {
    let mut client = Client::new(FakeTransport::with_frames(frames));
    client.connect("localhost", "6555").unwrap();
    client
}

/// A connected client with nothing scripted yet
pub fn silent_client() -> Client<FakeTransport> {
    connected_client::<&str>(&[])
}

/// Reply to a `get` query
pub fn get_reply(values: &str) -> String {
    format!(r#"{{"category":"tracker","request":"get","values":{}}}"#, values)
}

/// Reply to a calibration command
pub fn calibration_reply(request: &str, status: i64) -> String {
    format!(
        r#"{{"category":"calibration","request":"{}","values":{{"statuscode":{}}}}}"#,
        request, status
    )
}
