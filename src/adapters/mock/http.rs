//! Mock HTTP client for testing.
//!
//! Returns scripted event-stream responses and records every request so
//! tests can check the headers a reader sent.

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::error::NetworkError;
use crate::traits::{ByteStream, Headers, HttpClient, StreamingResponse};

/// A recorded HTTP request for verification in tests.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    /// Request URL
    pub url: String,
    /// Request headers
    pub headers: Headers,
}

/// Configuration for a mock response.
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// Return a response whose body yields `chunks` then ends.
    Stream {
        status: u16,
        content_type: Option<String>,
        chunks: Vec<Bytes>,
    },
    /// Return a body that yields `chunks` then fails with `error`.
    BrokenStream {
        chunks: Vec<Bytes>,
        error: NetworkError,
    },
    /// Fail before any response is produced.
    Error(NetworkError),
}

/// Build a 200 `text/event-stream` response over the given chunks.
pub fn event_stream_response(chunks: Vec<Bytes>) -> StreamingResponse {
    build_response(200, Some("text/event-stream; charset=utf-8"), chunks, None)
}

fn build_response(
    status: u16,
    content_type: Option<&str>,
    chunks: Vec<Bytes>,
    error: Option<NetworkError>,
) -> StreamingResponse {
    let mut headers = Headers::new();
    if let Some(ct) = content_type {
        headers.insert("content-type".to_string(), ct.to_string());
    }
    let items = chunks
        .into_iter()
        .map(Ok)
        .chain(error.into_iter().map(Err))
        .collect::<Vec<_>>();
    let body: ByteStream = Box::pin(futures::stream::iter(items));
    StreamingResponse::new(status, headers, body)
}

/// Mock HTTP client for testing.
///
/// # Example
///
/// ```ignore
/// use sift::adapters::mock::{MockHttpClient, MockResponse};
/// use bytes::Bytes;
///
/// let client = MockHttpClient::new();
/// client.set_response(
///     "https://example.com/events",
///     MockResponse::Stream {
///         status: 200,
///         content_type: Some("text/event-stream".into()),
///         chunks: vec![Bytes::from("data: hi\n\n")],
///     },
/// );
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockHttpClient {
    /// Configured responses by URL pattern
    responses: Arc<Mutex<HashMap<String, MockResponse>>>,
    /// Default response when no specific match
    default_response: Arc<Mutex<Option<MockResponse>>>,
    /// Recorded requests for verification
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockHttpClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a response for a URL. Exact matches win over prefix matches.
    pub fn set_response(&self, url: &str, response: MockResponse) {
        let mut responses = self.responses.lock().unwrap();
        responses.insert(url.to_string(), response);
    }

    /// Set a default response for URLs without specific matches.
    pub fn set_default_response(&self, response: MockResponse) {
        let mut default = self.default_response.lock().unwrap();
        *default = Some(response);
    }

    /// Get all recorded requests.
    pub fn get_requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn clear_requests(&self) {
        self.requests.lock().unwrap().clear();
    }

    fn record_request(&self, url: &str, headers: &Headers) {
        let mut requests = self.requests.lock().unwrap();
        requests.push(RecordedRequest {
            url: url.to_string(),
            headers: headers.clone(),
        });
    }

    fn get_response(&self, url: &str) -> Option<MockResponse> {
        let responses = self.responses.lock().unwrap();

        if let Some(response) = responses.get(url) {
            return Some(response.clone());
        }

        for (pattern, response) in responses.iter() {
            if url.starts_with(pattern) {
                return Some(response.clone());
            }
        }

        let default = self.default_response.lock().unwrap();
        default.clone()
    }
}

#[async_trait]
impl HttpClient for MockHttpClient {
    async fn open_stream(&self, url: &str, headers: &Headers) -> Result<StreamingResponse, NetworkError> {
        self.record_request(url, headers);

        match self.get_response(url) {
            Some(MockResponse::Stream {
                status,
                content_type,
                chunks,
            }) => Ok(build_response(status, content_type.as_deref(), chunks, None)),
            Some(MockResponse::BrokenStream { chunks, error }) => Ok(build_response(
                200,
                Some("text/event-stream"),
                chunks,
                Some(error),
            )),
            Some(MockResponse::Error(err)) => Err(err),
            None => Err(NetworkError::Other {
                message: format!("No mock response for URL: {}", url),
            }),
        }
    }
}
