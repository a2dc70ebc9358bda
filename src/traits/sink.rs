//! Response sink trait abstraction.
//!
//! The writer owns one sink and is the only code that touches it, so the
//! trait takes `&mut self` and does not need to be `Sync`.

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::StreamError;

/// A streaming HTTP response body the writer can push bytes into.
#[async_trait]
pub trait EventSink: Send + 'static {
    /// Current value of a response header, matched case-insensitively.
    fn header(&self, name: &str) -> Option<String>;

    /// Set a response header, replacing any value with the same name.
    fn set_header(&mut self, name: &str, value: &str);

    /// Whether `flush` actually delivers buffered bytes to the client.
    /// A writer refuses sinks that cannot flush.
    fn can_flush(&self) -> bool {
        true
    }

    /// Write one chunk.
    async fn write(&mut self, chunk: Bytes) -> Result<(), StreamError>;

    /// Push written bytes to the client.
    async fn flush(&mut self) -> Result<(), StreamError>;
}
