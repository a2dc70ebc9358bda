//! Reqwest-based HTTP client adapter.
//!
//! Production implementation of [`HttpClient`] from `crate::traits`.

use async_trait::async_trait;
use futures_util::StreamExt;

use crate::error::{classify_reqwest_error, NetworkError};
use crate::traits::{ByteStream, Headers, HttpClient, StreamingResponse};

/// HTTP client implementation using reqwest.
///
/// # Example
///
/// ```ignore
/// use sift::adapters::ReqwestHttpClient;
/// use sift::sse::EventReader;
///
/// let client = ReqwestHttpClient::new();
/// let mut reader = EventReader::connect(&client, "https://example.com/events", None).await?;
/// while reader.advance().await {
///     println!("{:?}", reader.current());
/// }
/// ```
#[derive(Debug, Clone)]
pub struct ReqwestHttpClient {
    client: reqwest::Client,
}

impl ReqwestHttpClient {
    /// Create a new ReqwestHttpClient with default settings.
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    /// Create a new ReqwestHttpClient with a custom reqwest::Client.
    ///
    /// Event streams are long-lived, so a custom client should use a
    /// connect timeout rather than a total request timeout.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Get a reference to the underlying reqwest::Client.
    pub fn inner(&self) -> &reqwest::Client {
        &self.client
    }

    /// Convert reqwest headers to our Headers type.
    fn convert_headers(headers: &reqwest::header::HeaderMap) -> Headers {
        headers
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.to_string(), v.to_string()))
            })
            .collect()
    }

    /// Apply headers to a request builder.
    fn apply_headers(
        builder: reqwest::RequestBuilder,
        headers: &Headers,
    ) -> reqwest::RequestBuilder {
        let mut builder = builder;
        for (key, value) in headers {
            builder = builder.header(key, value);
        }
        builder
    }
}

impl Default for ReqwestHttpClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn open_stream(&self, url: &str, headers: &Headers) -> Result<StreamingResponse, NetworkError> {
        let builder = Self::apply_headers(self.client.get(url), headers);
        let response = builder
            .send()
            .await
            .map_err(|e| classify_reqwest_error(&e, url))?;

        let status = response.status().as_u16();
        let response_headers = Self::convert_headers(response.headers());
        let owned_url = url.to_string();
        let body: ByteStream = Box::pin(
            response
                .bytes_stream()
                .map(move |chunk| chunk.map_err(|e| classify_reqwest_error(&e, &owned_url))),
        );

        Ok(StreamingResponse::new(status, response_headers, body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reqwest_http_client_with_custom_client() {
        let custom = reqwest::Client::builder()
            .connect_timeout(std::time::Duration::from_secs(5))
            .build()
            .unwrap();
        let client = ReqwestHttpClient::with_client(custom);
        let _ = client.inner();
    }

    #[test]
    fn test_convert_headers() {
        let mut header_map = reqwest::header::HeaderMap::new();
        header_map.insert(
            reqwest::header::CONTENT_TYPE,
            "text/event-stream".parse().unwrap(),
        );
        header_map.insert(reqwest::header::CACHE_CONTROL, "no-cache".parse().unwrap());

        let headers = ReqwestHttpClient::convert_headers(&header_map);
        assert_eq!(
            headers.get("content-type"),
            Some(&"text/event-stream".to_string())
        );
        assert_eq!(headers.get("cache-control"), Some(&"no-cache".to_string()));
    }

    #[tokio::test]
    async fn test_invalid_url() {
        let client = ReqwestHttpClient::default();
        let result = client.open_stream("not-a-valid-url", &Headers::new()).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_connection_refused() {
        let client = ReqwestHttpClient::new();
        let result = client
            .open_stream("http://127.0.0.1:59999/events", &Headers::new())
            .await;
        assert!(matches!(
            result,
            Err(NetworkError::ConnectionFailed { .. }) | Err(NetworkError::Other { .. })
        ));
    }
}
