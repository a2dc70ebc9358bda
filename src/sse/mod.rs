//! Server-Sent Events protocol engine.
//!
//! Wire format, one event per blank-line terminated block:
//! - `id: <text>` - last event id
//! - `event: <name>` - event type, `message` when absent
//! - `data: <text>` - payload line, repeated for multi-line data
//! - `retry: <ms>` - reconnection delay
//! - Lines starting with `:` - comments (ignored)
//!
//! # Module structure
//! - `message` - the [`Message`] value and event name rules
//! - `encoder` - message to wire bytes
//! - `decoder` - incremental [`EventParser`] and pull-based [`Decoder`]
//! - `reader` - client side over an [`HttpClient`](crate::traits::HttpClient)
//! - `writer` - server side [`EventWriter`] with queueing and heartbeats

mod decoder;
mod encoder;
mod message;
mod reader;
mod writer;

pub use decoder::{decode_all, Decoder, EventParser};
pub use encoder::{encode, encode_into};
pub use message::{is_valid_event_name, Message, DEFAULT_EVENT};
pub use reader::{is_event_stream, iterate, EventReader, EVENT_STREAM_MEDIA_TYPE};
pub use writer::{
    ErrorCallback, EventWriter, WriterConfig, DEFAULT_CLOSE_TIMEOUT, DEFAULT_QUEUE_SIZE,
};
