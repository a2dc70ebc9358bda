//! Streaming-related error types.
//!
//! Errors raised by the Server-Sent Events engine: encoding, decoding,
//! reading a response body and driving a writer.

use std::fmt;

/// SSE engine error variants.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamError {
    /// The message has no id, event or data; there is nothing to dispatch.
    NoContent,

    /// The event name violates the event-name rule.
    InvalidEventName {
        name: String,
    },

    /// The underlying byte source failed. Sticky on decoders and readers.
    Read {
        message: String,
    },

    /// The response is not an event stream.
    BadContentType {
        content_type: Option<String>,
    },

    /// The writer was closed before or while sending.
    WriterClosed,

    /// The writer's cancellation token fired.
    Cancelled,

    /// Draining the writer did not finish within the close timeout.
    CloseTimeout {
        timeout_ms: u64,
    },

    /// Writing to or flushing the sink failed.
    Write {
        message: String,
    },

    /// The sink cannot flush, so events would sit in a buffer.
    SinkNotFlushable,

    /// A value could not be encoded as JSON for `send_json`.
    Json {
        message: String,
    },

    /// Several errors recorded by a writer, in the order they happened.
    Aggregate {
        errors: Vec<StreamError>,
    },
}

impl StreamError {
    /// Join recorded errors into one value.
    ///
    /// Returns `None` for an empty list, the error itself for a single
    /// entry and [`StreamError::Aggregate`] otherwise.
    pub fn join(mut errors: Vec<StreamError>) -> Option<StreamError> {
        match errors.len() {
            0 => None,
            1 => errors.pop(),
            _ => Some(StreamError::Aggregate { errors }),
        }
    }

    /// Iterate over the leaf errors, flattening aggregates.
    pub fn leaves(&self) -> Vec<&StreamError> {
        match self {
            StreamError::Aggregate { errors } => errors.iter().flat_map(|e| e.leaves()).collect(),
            other => vec![other],
        }
    }

    /// Returns true if this error, or any error it aggregates, matches `pred`.
    pub fn contains(&self, pred: impl Fn(&StreamError) -> bool) -> bool {
        self.leaves().into_iter().any(pred)
    }

    /// Check if this error is likely transient and can be retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            StreamError::Read { .. } | StreamError::Write { .. } => true,
            StreamError::Aggregate { errors } => errors.iter().all(|e| e.is_retryable()),
            _ => false,
        }
    }

    /// Get a user-friendly error message.
    pub fn user_message(&self) -> String {
        match self {
            StreamError::NoContent => "The event has no id, event name or data.".to_string(),
            StreamError::InvalidEventName { name } => {
                format!("'{}' is not a valid event name.", name)
            }
            StreamError::Read { .. } => {
                "Connection to the event source was lost.".to_string()
            }
            StreamError::BadContentType { content_type } => match content_type {
                Some(ct) => format!("The server answered with '{}' instead of an event stream.", ct),
                None => "The server did not declare a content type for the event stream.".to_string(),
            },
            StreamError::WriterClosed => "The event stream is already closed.".to_string(),
            StreamError::Cancelled => "The event stream was cancelled.".to_string(),
            StreamError::CloseTimeout { timeout_ms } => format!(
                "The event stream did not finish within {} ms and was closed anyway.",
                timeout_ms
            ),
            StreamError::Write { .. } => "The client stopped receiving events.".to_string(),
            StreamError::SinkNotFlushable => {
                "The response cannot be flushed, so events cannot be streamed.".to_string()
            }
            StreamError::Json { .. } => "The event payload could not be encoded as JSON.".to_string(),
            StreamError::Aggregate { errors } => format!("{} stream errors occurred.", errors.len()),
        }
    }

    /// Get a short error code for logging.
    pub fn error_code(&self) -> &'static str {
        match self {
            StreamError::NoContent => "E_SSE_NO_CONTENT",
            StreamError::InvalidEventName { .. } => "E_SSE_EVENT_NAME",
            StreamError::Read { .. } => "E_SSE_READ",
            StreamError::BadContentType { .. } => "E_SSE_CONTENT_TYPE",
            StreamError::WriterClosed => "E_SSE_CLOSED",
            StreamError::Cancelled => "E_SSE_CANCELLED",
            StreamError::CloseTimeout { .. } => "E_SSE_CLOSE_TIMEOUT",
            StreamError::Write { .. } => "E_SSE_WRITE",
            StreamError::SinkNotFlushable => "E_SSE_NO_FLUSH",
            StreamError::Json { .. } => "E_SSE_JSON",
            StreamError::Aggregate { .. } => "E_SSE_MULTI",
        }
    }
}

impl fmt::Display for StreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamError::NoContent => write!(f, "message has no content"),
            StreamError::InvalidEventName { name } => write!(f, "invalid event name: {:?}", name),
            StreamError::Read { message } => write!(f, "stream read failed: {}", message),
            StreamError::BadContentType { content_type } => match content_type {
                Some(ct) => write!(f, "expected text/event-stream, got {:?}", ct),
                None => write!(f, "missing content type, expected text/event-stream"),
            },
            StreamError::WriterClosed => write!(f, "writer is closed"),
            StreamError::Cancelled => write!(f, "stream cancelled"),
            StreamError::CloseTimeout { timeout_ms } => {
                write!(f, "close timed out after {} ms", timeout_ms)
            }
            StreamError::Write { message } => write!(f, "sink write failed: {}", message),
            StreamError::SinkNotFlushable => write!(f, "sink does not support flushing"),
            StreamError::Json { message } => write!(f, "json encoding failed: {}", message),
            StreamError::Aggregate { errors } => {
                let joined: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
                write!(f, "{}", joined.join("; "))
            }
        }
    }
}

impl std::error::Error for StreamError {}

impl From<serde_json::Error> for StreamError {
    fn from(err: serde_json::Error) -> Self {
        StreamError::Json {
            message: err.to_string(),
        }
    }
}
