//! HTTP client trait abstraction.
//!
//! Opening an event stream is the only HTTP operation the reader needs, so
//! the seam is one method returning a status, headers and a streaming body.

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use std::collections::HashMap;
use std::fmt;
use std::pin::Pin;

use crate::error::NetworkError;

/// HTTP headers represented as a key-value map.
pub type Headers = HashMap<String, String>;

/// A response body delivered incrementally.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, NetworkError>> + Send>>;

/// Case-insensitive header lookup.
pub fn header_value<'a>(headers: &'a Headers, name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}

/// A response whose body has not been read yet.
pub struct StreamingResponse {
    /// HTTP status code
    pub status: u16,
    /// Response headers
    pub headers: Headers,
    /// Response body
    pub body: ByteStream,
}

impl StreamingResponse {
    pub fn new(status: u16, headers: Headers, body: ByteStream) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// Check if the response indicates success (2xx status).
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// The `Content-Type` header, looked up case-insensitively.
    pub fn content_type(&self) -> Option<&str> {
        header_value(&self.headers, "content-type")
    }
}

impl fmt::Debug for StreamingResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamingResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

/// Trait for HTTP client operations.
///
/// Implementations include the production reqwest-based client and a
/// scripted mock for tests.
///
/// # Example
///
/// ```ignore
/// use sift::traits::{HttpClient, Headers};
///
/// async fn open<C: HttpClient>(client: &C) -> Result<u16, sift::error::NetworkError> {
///     let response = client.open_stream("https://example.com/events", &Headers::new()).await?;
///     Ok(response.status)
/// }
/// ```
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Perform a GET request and return the response with its body unread.
    ///
    /// Non-2xx statuses are not errors at this level; callers inspect
    /// [`StreamingResponse::status`].
    async fn open_stream(&self, url: &str, headers: &Headers) -> Result<StreamingResponse, NetworkError>;
}
