//! Event messages appended to streams
//!
//! The engine never interprets the body; serialization format is the
//! application's choice. Headers carry per-event metadata.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A single domain fact with an opaque body and optional headers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventMessage {
    /// Event body (serialized data)
    pub body: Vec<u8>,

    /// Headers for metadata
    pub headers: HashMap<String, String>,
}

impl EventMessage {
    /// Create a new event with body and headers
    pub fn new(body: Vec<u8>, headers: HashMap<String, String>) -> Self {
        Self { body, headers }
    }

    /// Create an event with just a body
    pub fn with_body(body: Vec<u8>) -> Self {
        Self {
            body,
            headers: HashMap::new(),
        }
    }

    /// Add a header to the event
    pub fn with_header(mut self, key: String, value: String) -> Self {
        self.headers.insert(key, value);
        self
    }

    /// Get a header value
    pub fn get_header(&self, key: &str) -> Option<&str> {
        self.headers.get(key).map(|s| s.as_str())
    }
}

// Bare bodies and (body, headers) pairs convert directly into events, so
// append call sites taking `impl Into<EventMessage>` stay terse
impl From<Vec<u8>> for EventMessage {
    fn from(body: Vec<u8>) -> Self {
        EventMessage::with_body(body)
    }
}

impl From<(Vec<u8>, HashMap<String, String>)> for EventMessage {
    fn from((body, headers): (Vec<u8>, HashMap<String, String>)) -> Self {
        EventMessage::new(body, headers)
    }
}
