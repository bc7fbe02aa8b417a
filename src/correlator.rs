//! Correlator Module
//!
//! Turns one outbound request into one matching inbound frame.
//!
//! ## Matching
//! The server pushes frames on its own schedule, so a reply is not the next
//! frame read but the next frame whose top-level key matches:
//! - queries wait on `request == "get"`
//! - commands wait on `request == <command name>`
//!
//! The match key is the verb, not a per-call id. Two `get` queries in flight
//! on one connection could swap replies, so a correlator only ever has one
//! outstanding call (every operation takes `&mut self`).

use crate::error::Result;
use crate::network::Transport;
use crate::protocol::{encode, FromValue, Request, Response, Value, Values, VERB_GET};

/// Top-level key used to recognize a reply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKey<'a> {
    /// Match on the `request` field
    Request(&'a str),

    /// Match on the `category` field
    Category(&'a str),
}

impl<'a> MatchKey<'a> {
    pub fn field(&self) -> &'static str {
        match self {
            MatchKey::Request(_) => "request",
            MatchKey::Category(_) => "category",
        }
    }

    pub fn value(&self) -> &'a str {
        match *self {
            MatchKey::Request(value) | MatchKey::Category(value) => value,
        }
    }
}

/// The key the correlator is currently blocked on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingMatch {
    pub field: String,
    pub value: String,
}

/// Request/response correlation over a [`Transport`]
pub struct Correlator<T> {
    transport: T,

    /// Set only while blocked in the transport's match primitive
    pending: Option<PendingMatch>,
}

impl<T: Transport> Correlator<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            pending: None,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// The match currently awaited, if any
    pub fn pending(&self) -> Option<&PendingMatch> {
        self.pending.as_ref()
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Query one field and return its raw value
    pub fn query(&mut self, category: &str, field: &str) -> Result<Value> {
        let response = self.exchange(&Request::query(category, field), MatchKey::Request(VERB_GET))?;
        response.field(field).cloned()
    }

    /// Query one field and convert it
    pub fn query_as<V: FromValue>(&mut self, category: &str, field: &str) -> Result<V> {
        let response = self.exchange(&Request::query(category, field), MatchKey::Request(VERB_GET))?;
        response.field_as(field)
    }

    /// Query one field and return the whole `values` mapping of the reply
    pub fn fetch(&mut self, category: &str, field: &str) -> Result<Values> {
        self.fetch_matching(category, field, MatchKey::Request(VERB_GET))
    }

    /// Like [`fetch`](Self::fetch), with an explicit match key
    pub fn fetch_matching(&mut self, category: &str, field: &str, key: MatchKey<'_>) -> Result<Values> {
        let response = self.exchange(&Request::query(category, field), key)?;
        Ok(response.values)
    }

    // =========================================================================
    // Commands
    // =========================================================================

    /// Send a parameterized command and return its status code
    pub fn command<'p, I>(&mut self, category: &str, request: &str, params: I) -> Result<i64>
    where
        I: IntoIterator<Item = (&'p str, i64)>,
    {
        let message = Request::command(category, request, params);
        let response = self.exchange(&message, MatchKey::Request(request))?;
        let status = response.status_code()?;

        tracing::debug!("{}/{} returned status {}", category, request, status);
        Ok(status)
    }

    // =========================================================================
    // Exchange
    // =========================================================================

    /// Send `request` and block until a frame matching `key` arrives
    pub fn exchange(&mut self, request: &Request, key: MatchKey<'_>) -> Result<Response> {
        let payload = encode(request)?;
        tracing::debug!(
            "Sending {}/{} ({} bytes)",
            request.category,
            request.request,
            payload.len()
        );
        self.transport.send_bytes(&payload)?;

        self.await_match(key)
    }

    fn await_match(&mut self, key: MatchKey<'_>) -> Result<Response> {
        self.pending = Some(PendingMatch {
            field: key.field().to_string(),
            value: key.value().to_string(),
        });

        let result = self.transport.read_blocking_match(key.field(), key.value());

        // Cleared whether the frame decoded or not
        self.pending = None;

        match &result {
            Ok(response) => tracing::debug!(
                "Matched {}={} with {}/{} frame",
                key.field(),
                key.value(),
                response.category,
                response.request
            ),
            Err(e) => tracing::warn!("Waiting for {}={} failed: {}", key.field(), key.value(), e),
        }

        result
    }
}
