//! Client-side reader: a decoder bound to an HTTP response.

use futures::stream::{self, Stream};

use super::decoder::Decoder;
use super::message::Message;
use crate::error::{NetworkError, SiftResult, StreamError};
use crate::traits::http::{ByteStream, Headers, HttpClient, StreamingResponse};

/// Media type every event stream response must declare.
pub const EVENT_STREAM_MEDIA_TYPE: &str = "text/event-stream";

/// Returns true if `content_type` names the event-stream media type.
/// Parameters such as `charset` are allowed; comparison ignores case.
pub fn is_event_stream(content_type: &str) -> bool {
    content_type
        .split(';')
        .next()
        .map(|media| media.trim().eq_ignore_ascii_case(EVENT_STREAM_MEDIA_TYPE))
        .unwrap_or(false)
}

/// Reads messages from an event-stream response body.
#[derive(Debug)]
pub struct EventReader {
    decoder: Decoder<ByteStream>,
}

impl EventReader {
    /// Wrap a response, rejecting anything that is not `text/event-stream`.
    pub fn new(response: StreamingResponse) -> Result<Self, StreamError> {
        match response.content_type() {
            Some(ct) if is_event_stream(ct) => {}
            other => {
                return Err(StreamError::BadContentType {
                    content_type: other.map(str::to_string),
                })
            }
        }
        tracing::debug!(status = response.status, "event stream opened");
        Ok(Self {
            decoder: Decoder::new(response.body),
        })
    }

    /// Open `url` through `client` and wrap the response.
    ///
    /// Sends `Accept: text/event-stream`, `Cache-Control: no-cache` and,
    /// when given, `Last-Event-ID`. Non-2xx statuses are errors.
    pub async fn connect<C>(client: &C, url: &str, last_event_id: Option<&str>) -> SiftResult<Self>
    where
        C: HttpClient + ?Sized,
    {
        let mut headers = Headers::new();
        headers.insert("Accept".to_string(), EVENT_STREAM_MEDIA_TYPE.to_string());
        headers.insert("Cache-Control".to_string(), "no-cache".to_string());
        if let Some(id) = last_event_id {
            headers.insert("Last-Event-ID".to_string(), id.to_string());
        }

        let response = client.open_stream(url, &headers).await?;
        if !response.is_success() {
            tracing::warn!(url, status = response.status, "event source rejected request");
            return Err(NetworkError::HttpStatus {
                status: response.status,
                message: format!("unexpected status opening {}", url),
            }
            .into());
        }
        Ok(Self::new(response)?)
    }

    /// Decode the next message. False at end of stream, on error or after close.
    pub async fn advance(&mut self) -> bool {
        self.decoder.advance().await
    }

    pub fn current(&self) -> Option<&Message> {
        self.decoder.current()
    }

    pub fn error(&self) -> Option<&StreamError> {
        self.decoder.error()
    }

    /// The id of the most recently dispatched message, or "" before any.
    pub fn last_id(&self) -> &str {
        self.decoder.current().map(|m| m.id.as_str()).unwrap_or("")
    }

    /// Release the response body. Safe to call more than once.
    pub fn close(&mut self) {
        if !self.decoder.is_closed() {
            tracing::debug!(last_id = self.last_id(), "event stream closed");
        }
        self.decoder.close();
    }
}

/// Iterate a response as a stream of messages.
///
/// A bad content type yields a single error item. A read error is yielded
/// once as the last item. The body is released when the stream ends or is
/// dropped early.
pub fn iterate(response: StreamingResponse) -> impl Stream<Item = Result<Message, StreamError>> + Send {
    stream::unfold(Some(EventReader::new(response)), |state| async move {
        match state? {
            Err(err) => Some((Err(err), None)),
            Ok(mut reader) => {
                if reader.advance().await {
                    let msg = reader.current().cloned()?;
                    Some((Ok(msg), Some(Ok(reader))))
                } else {
                    let err = reader.error().cloned();
                    reader.close();
                    err.map(|e| (Err(e), None))
                }
            }
        }
    })
}
