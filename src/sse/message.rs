//! The wire-level SSE record and the event-name rule.

use std::borrow::Cow;

use bytes::Bytes;
use once_cell::sync::Lazy;
use regex::Regex;

/// Event name a decoder reports when a block carries no `event:` field.
pub const DEFAULT_EVENT: &str = "message";

/// A letter first, then letters, digits, `_`, `-` or `.`; every `.` must be
/// followed by a non-dot character, which rules out `..` and a trailing dot.
static EVENT_NAME_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\p{L}(?:[\p{L}\p{Nd}_-]|\.[\p{L}\p{Nd}_-])*$").expect("Invalid event name regex")
});

/// Returns true if `name` may be used as an event name.
///
/// The empty name is valid: encoders omit it and decoders report
/// [`DEFAULT_EVENT`]. The encoder and the decoder share this predicate.
pub fn is_valid_event_name(name: &str) -> bool {
    name.is_empty() || EVENT_NAME_REGEX.is_match(name)
}

/// One Server-Sent Events message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Message {
    /// Event identifier. Sticky across messages on the decoder side.
    pub id: String,
    /// Event name; empty means "no event line".
    pub event: String,
    /// Payload bytes. Embedded LFs become separate `data:` lines.
    pub data: Bytes,
    /// Reconnection hint in milliseconds; zero means unset.
    pub retry: u64,
}

impl Message {
    /// Create a message carrying only `data`.
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self {
            data: data.into(),
            ..Self::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_event(mut self, event: impl Into<String>) -> Self {
        self.event = event.into();
        self
    }

    pub fn with_data(mut self, data: impl Into<Bytes>) -> Self {
        self.data = data.into();
        self
    }

    pub fn with_retry(mut self, retry_ms: u64) -> Self {
        self.retry = retry_ms;
        self
    }

    /// True if at least one of id, event or data is non-empty.
    pub fn has_content(&self) -> bool {
        !self.id.is_empty() || !self.event.is_empty() || !self.data.is_empty()
    }

    /// The payload as text, with invalid UTF-8 replaced.
    pub fn data_str(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.data)
    }

    /// Parse the payload as JSON.
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.data)
    }
}
