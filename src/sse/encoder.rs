//! Message to wire bytes.

use bytes::{BufMut, Bytes, BytesMut};

use super::message::{is_valid_event_name, Message};
use crate::error::StreamError;

/// Encode one message into its canonical SSE form.
///
/// Lines come out in the order `id`, `event`, `data` (one per LF-separated
/// segment), `retry` (only when non-zero), followed by the blank line that
/// terminates the block.
pub fn encode(msg: &Message) -> Result<Bytes, StreamError> {
    let mut buf = BytesMut::with_capacity(encoded_len_hint(msg));
    encode_into(msg, &mut buf)?;
    Ok(buf.freeze())
}

/// Encode into an existing buffer. Nothing is written on error.
pub fn encode_into(msg: &Message, buf: &mut BytesMut) -> Result<(), StreamError> {
    if !is_valid_event_name(&msg.event) {
        return Err(StreamError::InvalidEventName {
            name: msg.event.clone(),
        });
    }
    if !msg.has_content() {
        return Err(StreamError::NoContent);
    }

    if !msg.id.is_empty() {
        put_field(buf, b"id", &msg.id);
    }
    if !msg.event.is_empty() {
        put_field(buf, b"event", &msg.event);
    }
    if !msg.data.is_empty() {
        for segment in msg.data.split(|b| *b == b'\n') {
            buf.put_slice(b"data: ");
            for &byte in segment {
                if byte == b'\r' {
                    buf.put_slice(b"\\r");
                } else {
                    buf.put_u8(byte);
                }
            }
            buf.put_u8(b'\n');
        }
    }
    if msg.retry > 0 {
        buf.put_slice(b"retry: ");
        buf.put_slice(msg.retry.to_string().as_bytes());
        buf.put_u8(b'\n');
    }
    buf.put_u8(b'\n');
    Ok(())
}

fn put_field(buf: &mut BytesMut, name: &[u8], value: &str) {
    buf.put_slice(name);
    buf.put_slice(b": ");
    for ch in value.chars() {
        match ch {
            '\r' => buf.put_slice(b"\\r"),
            '\n' => buf.put_slice(b"\\n"),
            _ => {
                let mut tmp = [0u8; 4];
                buf.put_slice(ch.encode_utf8(&mut tmp).as_bytes());
            }
        }
    }
    buf.put_u8(b'\n');
}

fn encoded_len_hint(msg: &Message) -> usize {
    let lines = msg.data.iter().filter(|b| **b == b'\n').count() + 1;
    msg.id.len() + msg.event.len() + msg.data.len() + lines * 7 + 32
}
