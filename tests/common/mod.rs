//! Common test utilities for integration tests. Test doubles live in
//! `sift::adapters::mock`.
//!
//! # Example
//!
//! ```ignore
//! mod common;
//! use common::{encode_all, chunk_bytes};
//!
//! let wire = encode_all(&[Message::new("hi")]);
//! let chunks = chunk_bytes(&wire, 3);
//! ```

#![allow(dead_code)]

use bytes::{Bytes, BytesMut};
use sift::sse::{encode_into, Message};

/// Encode messages back to back.
pub fn encode_all(messages: &[Message]) -> Bytes {
    let mut buf = BytesMut::new();
    for msg in messages {
        encode_into(msg, &mut buf).expect("test message should encode");
    }
    buf.freeze()
}

/// Split `bytes` into chunks of at most `size` bytes.
pub fn chunk_bytes(bytes: &[u8], size: usize) -> Vec<Bytes> {
    bytes
        .chunks(size.max(1))
        .map(Bytes::copy_from_slice)
        .collect()
}

/// Numbered messages `m0`, `m1`, ... with matching ids.
pub fn numbered_messages(count: usize) -> Vec<Message> {
    (0..count)
        .map(|i| Message::new(format!("m{}", i)).with_id(i.to_string()))
        .collect()
}
