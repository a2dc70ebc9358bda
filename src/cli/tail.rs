//! `sift tail`: print messages from an event stream.

use std::io::Write;

use super::config::CliConfig;
use super::CliError;
use crate::error::{ErrorContext, ResultExt, SiftError};
use crate::sse::{encode, EventReader, Message};
use crate::traits::HttpClient;

/// Print each message from `url` in wire format until the stream ends or
/// the configured limit is reached. Returns the number printed.
pub async fn handle_tail_command<C>(
    client: &C,
    url: &str,
    config: &CliConfig,
    out: &mut impl Write,
) -> Result<usize, CliError>
where
    C: HttpClient + ?Sized,
{
    let context = |operation: &str| ErrorContext::new(operation).with_component("tail").with_url(url);
    let mut reader = EventReader::connect(client, url, config.last_event_id.as_deref())
        .await
        .with_context(|| context("connect"))?;
    let mut count = 0;

    while config.tail_limit.map_or(true, |limit| count < limit) && reader.advance().await {
        if let Some(msg) = reader.current() {
            write_message(out, msg)?;
            count += 1;
        }
    }

    let error = reader.error().cloned();
    tracing::info!(url, count, last_id = reader.last_id(), "tail finished");
    reader.close();

    match error {
        Some(err) => {
            let ctx = context("read");
            tracing::warn!(error = %err, context = %ctx.to_log_string(), "tail stream failed");
            Err(SiftError::from(err).with_context(ctx).into())
        }
        None => Ok(count),
    }
}

fn write_message(out: &mut impl Write, msg: &Message) -> Result<(), CliError> {
    let bytes = encode(msg).map_err(SiftError::from)?;
    out.write_all(&bytes)?;
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::mock::{MockHttpClient, MockResponse};
    use crate::error::{ErrorCategory, NetworkError};
    use bytes::Bytes;

    const URL: &str = "http://localhost/events";

    fn stream(body: &'static [u8]) -> MockResponse {
        MockResponse::Stream {
            status: 200,
            content_type: Some("text/event-stream".to_string()),
            chunks: vec![Bytes::from_static(body)],
        }
    }

    #[tokio::test]
    async fn test_prints_messages() {
        let client = MockHttpClient::new();
        client.set_response(URL, stream(b"id: 1\ndata: a\n\nevent: tick\ndata: b\n\n"));

        let mut out = Vec::new();
        let count = handle_tail_command(&client, URL, &CliConfig::default(), &mut out)
            .await
            .unwrap();

        assert_eq!(count, 2);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "id: 1\nevent: message\ndata: a\n\nid: 1\nevent: tick\ndata: b\n\n"
        );
    }

    #[tokio::test]
    async fn test_limit_and_last_event_id() {
        let client = MockHttpClient::new();
        client.set_response(URL, stream(b"data: a\n\ndata: b\n\ndata: c\n\n"));
        let config = CliConfig::default().with_tail_limit(2).with_last_event_id("7");

        let mut out = Vec::new();
        let count = handle_tail_command(&client, URL, &config, &mut out).await.unwrap();
        assert_eq!(count, 2);

        let requests = client.get_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].headers.get("Last-Event-ID").map(String::as_str), Some("7"));
    }

    #[tokio::test]
    async fn test_http_error_status() {
        let client = MockHttpClient::new();
        client.set_response(
            URL,
            MockResponse::Stream {
                status: 503,
                content_type: None,
                chunks: Vec::new(),
            },
        );

        let err = handle_tail_command(&client, URL, &CliConfig::default(), &mut Vec::new())
            .await
            .unwrap_err();
        let CliError::Sift(err) = err else {
            panic!("expected a sift error, got {:?}", err);
        };
        assert!(matches!(
            err.inner(),
            SiftError::Network(NetworkError::HttpStatus { status: 503, .. })
        ));
        let ctx = err.context().unwrap();
        assert_eq!(ctx.operation, "connect");
        assert_eq!(ctx.component.as_deref(), Some("tail"));
        assert_eq!(ctx.url.as_deref(), Some(URL));

        let shown = CliError::Sift(err).to_string();
        assert!(shown.contains("Context: tail connect http://localhost/events"));
        assert!(shown.ends_with(ErrorCategory::Server.recovery_hint()));
    }

    #[tokio::test]
    async fn test_read_error_after_messages() {
        let client = MockHttpClient::new();
        client.set_response(
            URL,
            MockResponse::BrokenStream {
                chunks: vec![Bytes::from_static(b"data: a\n\n")],
                error: NetworkError::Body {
                    message: "reset".to_string(),
                },
            },
        );

        let mut out = Vec::new();
        let err = handle_tail_command(&client, URL, &CliConfig::default(), &mut out)
            .await
            .unwrap_err();
        assert_eq!(String::from_utf8(out).unwrap(), "event: message\ndata: a\n\n");
        let CliError::Sift(err) = err else {
            panic!("expected a sift error, got {:?}", err);
        };
        assert!(matches!(err.inner(), SiftError::Stream(_)));
        assert_eq!(err.context().map(|c| c.operation.as_str()), Some("read"));
        assert!(err.is_retryable());
    }
}
