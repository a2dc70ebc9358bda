//! Wire bytes to messages.
//!
//! [`EventParser`] is the sans-IO core: push chunks in, pull messages out.
//! [`Decoder`] binds it to an async byte stream and adds the sticky error
//! and the `advance` / `current` protocol.

use std::fmt;

use bytes::{Buf, Bytes, BytesMut};
use futures::{Stream, StreamExt};

use super::message::{is_valid_event_name, Message, DEFAULT_EVENT};
use crate::error::StreamError;

const BOM: &[u8] = b"\xEF\xBB\xBF";

/// Splits a byte stream into logical lines ending at LF, CR or CRLF.
#[derive(Debug, Default)]
struct LineScanner {
    buf: BytesMut,
    skip_lf: bool,
    bom_checked: bool,
}

impl LineScanner {
    fn push(&mut self, chunk: &[u8]) {
        self.buf.extend_from_slice(chunk);
    }

    /// Returns false while the buffer is still a proper prefix of a BOM.
    fn check_bom(&mut self, at_eof: bool) -> bool {
        if self.bom_checked {
            return true;
        }
        if self.buf.len() < BOM.len() && BOM.starts_with(&self.buf) && !at_eof {
            return false;
        }
        if self.buf.starts_with(BOM) {
            self.buf.advance(BOM.len());
        }
        self.bom_checked = true;
        true
    }

    fn next_line(&mut self) -> Option<Bytes> {
        if !self.check_bom(false) {
            return None;
        }
        if self.skip_lf {
            if self.buf.is_empty() {
                return None;
            }
            if self.buf[0] == b'\n' {
                self.buf.advance(1);
            }
            self.skip_lf = false;
        }

        let end = self.buf.iter().position(|b| *b == b'\n' || *b == b'\r')?;
        let line = self.buf.split_to(end).freeze();
        if self.buf[0] == b'\r' {
            self.skip_lf = true;
        }
        self.buf.advance(1);
        Some(line)
    }

    /// The unterminated remainder at end of input, if any.
    fn finish(&mut self) -> Option<Bytes> {
        self.check_bom(true);
        if self.skip_lf && self.buf.first() == Some(&b'\n') {
            self.buf.advance(1);
        }
        self.skip_lf = false;
        if self.buf.is_empty() {
            None
        } else {
            Some(self.buf.split().freeze())
        }
    }
}

/// Incremental SSE parser with no I/O of its own.
#[derive(Debug, Default)]
pub struct EventParser {
    lines: LineScanner,
    event: Option<String>,
    data: BytesMut,
    last_id: String,
    retry: u64,
    finished: bool,
}

impl EventParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append raw bytes from the transport.
    pub fn push(&mut self, chunk: &[u8]) {
        self.lines.push(chunk);
    }

    /// The next complete message in the pushed bytes, if any.
    pub fn next_message(&mut self) -> Option<Message> {
        while let Some(line) = self.lines.next_line() {
            if let Some(msg) = self.process_line(&line) {
                return Some(msg);
            }
        }
        None
    }

    /// Signal end of input: process any unterminated last line and make
    /// the final dispatch attempt. Later calls return `None`.
    pub fn finish(&mut self) -> Option<Message> {
        if self.finished {
            return None;
        }
        self.finished = true;
        if let Some(line) = self.lines.finish() {
            if let Some(msg) = self.process_line(&line) {
                return Some(msg);
            }
        }
        self.dispatch()
    }

    /// The most recent `id:` value seen, dispatched or not.
    pub fn last_id(&self) -> &str {
        &self.last_id
    }

    fn process_line(&mut self, line: &[u8]) -> Option<Message> {
        if line.is_empty() {
            return self.dispatch();
        }
        if line[0] == b':' {
            return None;
        }

        let (name, value) = match line.iter().position(|b| *b == b':') {
            Some(colon) => {
                let value = &line[colon + 1..];
                (&line[..colon], value.strip_prefix(b" ").unwrap_or(value))
            }
            None => (line, &b""[..]),
        };
        let value = String::from_utf8_lossy(value);

        match name {
            b"id" => self.last_id = value.into_owned(),
            b"event" => {
                self.event = Some(if value.is_empty() {
                    DEFAULT_EVENT.to_string()
                } else {
                    value.into_owned()
                });
            }
            b"data" => {
                self.data.extend_from_slice(value.as_bytes());
                self.data.extend_from_slice(b"\n");
            }
            b"retry" => {
                if !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit()) {
                    if let Ok(ms) = value.parse::<u64>() {
                        if ms > 0 {
                            self.retry = ms;
                        }
                    }
                }
            }
            _ => {}
        }
        None
    }

    fn dispatch(&mut self) -> Option<Message> {
        let event = self.event.take();
        let mut data = self.data.split();

        if data.len() <= 1 {
            return None;
        }
        let retry = std::mem::take(&mut self.retry);
        let event = event.unwrap_or_else(|| DEFAULT_EVENT.to_string());
        if !is_valid_event_name(&event) {
            tracing::trace!(event = %event, "discarding block with invalid event name");
            return None;
        }

        data.truncate(data.len() - 1);
        Some(Message {
            id: self.last_id.clone(),
            event,
            data: data.freeze(),
            retry,
        })
    }
}

/// Decode every message in a complete byte string.
pub fn decode_all(input: &[u8]) -> Vec<Message> {
    let mut parser = EventParser::new();
    parser.push(input);
    let mut out = Vec::new();
    while let Some(msg) = parser.next_message() {
        out.push(msg);
    }
    out.extend(parser.finish());
    out
}

/// Streaming decoder over an async byte source.
///
/// Not meant for concurrent use: one task drives `advance`.
pub struct Decoder<S> {
    source: Option<S>,
    parser: EventParser,
    current: Option<Message>,
    error: Option<StreamError>,
}

impl<S, E> Decoder<S>
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
    E: fmt::Display,
{
    pub fn new(source: S) -> Self {
        Self {
            source: Some(source),
            parser: EventParser::new(),
            current: None,
            error: None,
        }
    }

    /// Decode the next message into the `current` slot.
    ///
    /// Returns false at end of stream, after a read error, or once the
    /// decoder has been closed. A read error is sticky.
    pub async fn advance(&mut self) -> bool {
        loop {
            if let Some(msg) = self.parser.next_message() {
                self.current = Some(msg);
                return true;
            }
            let Some(source) = self.source.as_mut() else {
                return false;
            };

            match source.next().await {
                Some(Ok(chunk)) => self.parser.push(&chunk),
                Some(Err(err)) => {
                    tracing::warn!(error = %err, "event stream read failed");
                    self.error = Some(StreamError::Read {
                        message: err.to_string(),
                    });
                    self.source = None;
                    return false;
                }
                None => {
                    self.source = None;
                    return match self.parser.finish() {
                        Some(msg) => {
                            self.current = Some(msg);
                            true
                        }
                        None => false,
                    };
                }
            }
        }
    }

    /// The last dispatched message; `None` before the first successful advance.
    pub fn current(&self) -> Option<&Message> {
        self.current.as_ref()
    }

    /// The sticky read error, if one occurred.
    pub fn error(&self) -> Option<&StreamError> {
        self.error.as_ref()
    }

    /// Drop the byte source. Idempotent; no message is decoded afterwards.
    pub fn close(&mut self) {
        self.source = None;
        self.parser = EventParser::new();
    }

    pub fn is_closed(&self) -> bool {
        self.source.is_none()
    }
}

impl<S> fmt::Debug for Decoder<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Decoder")
            .field("open", &self.source.is_some())
            .field("current", &self.current)
            .field("error", &self.error)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    fn msg(id: &str, event: &str, data: &str) -> Message {
        Message {
            id: id.to_string(),
            event: event.to_string(),
            data: Bytes::copy_from_slice(data.as_bytes()),
            retry: 0,
        }
    }

    #[test]
    fn test_minimal_decode() {
        assert_eq!(decode_all(b"data: hello\n\n"), vec![msg("", "message", "hello")]);
    }

    #[test]
    fn test_multi_line_data_and_sticky_id() {
        let input = b"id: 7\ndata: line1\ndata: line2\n\ndata: line3\n\n";
        assert_eq!(
            decode_all(input),
            vec![msg("7", "message", "line1\nline2"), msg("7", "message", "line3")]
        );
    }

    #[test]
    fn test_empty_id_replaces_last_id() {
        let input = b"id: 1\ndata: a\n\nid\ndata: b\n\n";
        let out = decode_all(input);
        assert_eq!(out[0].id, "1");
        assert_eq!(out[1].id, "");
    }

    #[test]
    fn test_invalid_event_block_discarded() {
        let input = b"event: .bad\ndata: x\n\nevent: good\ndata: y\n\n";
        assert_eq!(decode_all(input), vec![msg("", "good", "y")]);
    }

    #[test]
    fn test_cr_and_crlf_line_endings() {
        let input = b"data: a\r\rdata: b\r\n\r\ndata: c\n\n";
        assert_eq!(
            decode_all(input),
            vec![msg("", "message", "a"), msg("", "message", "b"), msg("", "message", "c")]
        );
    }

    #[test]
    fn test_crlf_split_across_chunks() {
        let mut parser = EventParser::new();
        parser.push(b"data: a\r");
        assert_eq!(parser.next_message(), None);
        parser.push(b"\n\r");
        assert_eq!(parser.next_message(), Some(msg("", "message", "a")));
        parser.push(b"\ndata: b\n\n");
        assert_eq!(parser.next_message(), Some(msg("", "message", "b")));
    }

    #[test]
    fn test_bom_skipped_once() {
        let input = b"\xEF\xBB\xBFdata: a\n\n\xEF\xBB\xBFdata: b\n\n";
        let out = decode_all(input);
        assert_eq!(out[0], msg("", "message", "a"));
        // A second BOM is part of the field name, so the block has no data.
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn test_bom_split_across_chunks() {
        let mut parser = EventParser::new();
        parser.push(b"\xEF\xBB");
        assert_eq!(parser.next_message(), None);
        parser.push(b"\xBFdata: x\n\n");
        assert_eq!(parser.next_message(), Some(msg("", "message", "x")));
    }

    #[test]
    fn test_comments_and_unknown_fields_ignored() {
        let input = b": keepalive\nfoo: bar\ndata: x\n\n";
        assert_eq!(decode_all(input), vec![msg("", "message", "x")]);
    }

    #[test]
    fn test_only_one_leading_space_stripped() {
        let out = decode_all(b"data:  two\ndata:none\n\n");
        assert_eq!(out[0].data_str(), " two\nnone");
    }

    #[test]
    fn test_lone_data_line_does_not_dispatch() {
        assert!(decode_all(b"data\n\n").is_empty());
        let out = decode_all(b"data\ndata\n\n");
        assert_eq!(out, vec![msg("", "message", "\n")]);
    }

    #[test]
    fn test_retry_rules() {
        let out = decode_all(b"retry: 1500\ndata: a\n\ndata: b\n\nretry: -5\nretry: 0\nretry: x1\ndata: c\n\n");
        assert_eq!(out[0].retry, 1500);
        assert_eq!(out[1].retry, 0);
        assert_eq!(out[2].retry, 0);
    }

    #[test]
    fn test_empty_event_value_means_default() {
        let out = decode_all(b"event:\ndata: x\n\n");
        assert_eq!(out[0].event, "message");
    }

    #[test]
    fn test_invalid_utf8_replaced() {
        let out = decode_all(b"data: a\xFFb\n\n");
        assert_eq!(out[0].data_str(), "a\u{FFFD}b");
    }

    #[test]
    fn test_final_dispatch_at_eof() {
        assert_eq!(decode_all(b"data: tail"), vec![msg("", "message", "tail")]);
        assert_eq!(decode_all(b"data: tail\n"), vec![msg("", "message", "tail")]);
    }

    #[test]
    fn test_finish_is_idempotent() {
        let mut parser = EventParser::new();
        parser.push(b"data: x");
        assert!(parser.finish().is_some());
        assert!(parser.finish().is_none());
    }

    #[tokio::test]
    async fn test_decoder_over_chunked_stream() {
        let chunks: Vec<Result<Bytes, String>> = vec![
            Ok(Bytes::from_static(b"id: 1\nda")),
            Ok(Bytes::from_static(b"ta: hel")),
            Ok(Bytes::from_static(b"lo\n\ndata: bye")),
        ];
        let mut decoder = Decoder::new(stream::iter(chunks));

        assert!(decoder.current().is_none());
        assert!(decoder.advance().await);
        assert_eq!(decoder.current(), Some(&msg("1", "message", "hello")));
        assert!(decoder.advance().await);
        assert_eq!(decoder.current(), Some(&msg("1", "message", "bye")));
        assert!(!decoder.advance().await);
        assert!(decoder.error().is_none());
    }

    #[tokio::test]
    async fn test_read_error_is_sticky_without_drain() {
        let chunks: Vec<Result<Bytes, String>> = vec![
            Ok(Bytes::from_static(b"data: first\n\ndata: pending")),
            Err("connection reset".to_string()),
            Ok(Bytes::from_static(b"data: never\n\n")),
        ];
        let mut decoder = Decoder::new(stream::iter(chunks));

        assert!(decoder.advance().await);
        assert!(!decoder.advance().await);
        assert_eq!(
            decoder.error(),
            Some(&StreamError::Read {
                message: "connection reset".to_string()
            })
        );
        assert!(!decoder.advance().await);
        assert_eq!(decoder.current().map(|m| m.data_str().into_owned()), Some("first".to_string()));
    }

    #[tokio::test]
    async fn test_close_stops_decoding() {
        let chunks: Vec<Result<Bytes, String>> = vec![Ok(Bytes::from_static(b"data: a\n\ndata: b\n\n"))];
        let mut decoder = Decoder::new(stream::iter(chunks));
        assert!(decoder.advance().await);
        decoder.close();
        decoder.close();
        assert!(decoder.is_closed());
        assert!(!decoder.advance().await);
    }
}
