//! Recording sink for writer tests.

use async_trait::async_trait;
use bytes::Bytes;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::error::StreamError;
use crate::traits::{header_value, EventSink, Headers};

#[derive(Debug, Default)]
struct SinkState {
    headers: Headers,
    bytes: Vec<u8>,
    writes: usize,
    flushes: usize,
}

/// An [`EventSink`] that keeps everything written to it.
///
/// Clones share state, so a test can hand one clone to the writer and
/// inspect the other.
#[derive(Debug, Clone)]
pub struct RecordingSink {
    state: Arc<Mutex<SinkState>>,
    flushable: bool,
    fail_after: Option<usize>,
    write_delay: Option<Duration>,
}

impl Default for RecordingSink {
    fn default() -> Self {
        Self {
            state: Arc::default(),
            flushable: true,
            fail_after: None,
            write_delay: None,
        }
    }
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink that reports it cannot flush.
    pub fn non_flushable() -> Self {
        Self {
            flushable: false,
            ..Self::default()
        }
    }

    /// Accept `n` writes, then fail every later one.
    pub fn fail_writes_after(mut self, n: usize) -> Self {
        self.fail_after = Some(n);
        self
    }

    /// Sleep before each write.
    pub fn with_write_delay(mut self, delay: Duration) -> Self {
        self.write_delay = Some(delay);
        self
    }

    /// Preset a response header.
    pub fn with_header(self, name: &str, value: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .headers
            .insert(name.to_string(), value.to_string());
        self
    }

    /// Everything written so far.
    pub fn bytes(&self) -> Vec<u8> {
        self.state.lock().unwrap().bytes.clone()
    }

    pub fn flush_count(&self) -> usize {
        self.state.lock().unwrap().flushes
    }

    pub fn header(&self, name: &str) -> Option<String> {
        let state = self.state.lock().unwrap();
        header_value(&state.headers, name).map(str::to_string)
    }
}

#[async_trait]
impl EventSink for RecordingSink {
    fn header(&self, name: &str) -> Option<String> {
        RecordingSink::header(self, name)
    }

    fn set_header(&mut self, name: &str, value: &str) {
        let mut state = self.state.lock().unwrap();
        state.headers.retain(|key, _| !key.eq_ignore_ascii_case(name));
        state.headers.insert(name.to_string(), value.to_string());
    }

    fn can_flush(&self) -> bool {
        self.flushable
    }

    async fn write(&mut self, chunk: Bytes) -> Result<(), StreamError> {
        if let Some(delay) = self.write_delay {
            tokio::time::sleep(delay).await;
        }
        let mut state = self.state.lock().unwrap();
        if let Some(limit) = self.fail_after {
            if state.writes >= limit {
                return Err(StreamError::Write {
                    message: "broken pipe".to_string(),
                });
            }
        }
        state.writes += 1;
        state.bytes.extend_from_slice(&chunk);
        Ok(())
    }

    async fn flush(&mut self) -> Result<(), StreamError> {
        self.state.lock().unwrap().flushes += 1;
        Ok(())
    }
}
