//! Axum response sink.
//!
//! [`body_channel`] returns a connected pair: the [`BodySink`] goes to an
//! [`EventWriter`](crate::sse::EventWriter), the [`BodyStream`] becomes the
//! handler's response.
//!
//! ```ignore
//! async fn events() -> axum::response::Response {
//!     let (sink, body) = body_channel(16);
//!     let writer = EventWriter::new(CancellationToken::new(), sink, WriterConfig::default())?;
//!     tokio::spawn(async move {
//!         let _ = writer.send(&Message::new("hello")).await;
//!         writer.close().await;
//!     });
//!     body.into_response()
//! }
//! ```

use std::convert::Infallible;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use futures::stream;
use tokio::sync::mpsc;

use crate::error::StreamError;
use crate::traits::{header_value, EventSink, Headers};

type SharedHeaders = Arc<Mutex<Headers>>;

fn lock(headers: &SharedHeaders) -> std::sync::MutexGuard<'_, Headers> {
    headers.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Create a connected sink / response body pair with `buffer` chunks of slack.
pub fn body_channel(buffer: usize) -> (BodySink, BodyStream) {
    let (tx, rx) = mpsc::channel(buffer.max(1));
    let headers = SharedHeaders::default();
    (
        BodySink {
            tx,
            headers: headers.clone(),
        },
        BodyStream { rx, headers },
    )
}

/// Writer side of an axum streaming body.
#[derive(Debug)]
pub struct BodySink {
    tx: mpsc::Sender<Bytes>,
    headers: SharedHeaders,
}

#[async_trait]
impl EventSink for BodySink {
    fn header(&self, name: &str) -> Option<String> {
        header_value(&lock(&self.headers), name).map(str::to_string)
    }

    fn set_header(&mut self, name: &str, value: &str) {
        let mut headers = lock(&self.headers);
        headers.retain(|key, _| !key.eq_ignore_ascii_case(name));
        headers.insert(name.to_string(), value.to_string());
    }

    async fn write(&mut self, chunk: Bytes) -> Result<(), StreamError> {
        self.tx.send(chunk).await.map_err(|_| StreamError::Write {
            message: "client disconnected".to_string(),
        })
    }

    /// Chunks go straight to hyper, so there is nothing to flush.
    async fn flush(&mut self) -> Result<(), StreamError> {
        if self.tx.is_closed() {
            return Err(StreamError::Write {
                message: "client disconnected".to_string(),
            });
        }
        Ok(())
    }
}

/// Response side of an axum streaming body.
#[derive(Debug)]
pub struct BodyStream {
    rx: mpsc::Receiver<Bytes>,
    headers: SharedHeaders,
}

impl IntoResponse for BodyStream {
    fn into_response(self) -> Response {
        let headers = lock(&self.headers).clone();
        let chunks = stream::unfold(self.rx, |mut rx| async move {
            rx.recv().await.map(|chunk| (Ok::<_, Infallible>(chunk), rx))
        });

        let mut response = Response::new(Body::from_stream(chunks));
        *response.status_mut() = StatusCode::OK;
        for (name, value) in headers {
            match (
                HeaderName::try_from(name.as_str()),
                HeaderValue::try_from(value.as_str()),
            ) {
                (Ok(name), Ok(value)) => {
                    response.headers_mut().insert(name, value);
                }
                _ => tracing::warn!(header = %name, "skipping invalid response header"),
            }
        }
        response
    }
}
