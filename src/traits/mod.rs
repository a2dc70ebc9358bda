//! Trait abstractions for dependency injection and testability.
//!
//! # Traits
//!
//! - [`HttpClient`] - opens streaming HTTP responses for the event reader
//! - [`EventSink`] - response body the event writer writes into
//! - [`VectorStore`] - consumer of compiled filters

pub mod http;
pub mod sink;
pub mod vector_store;

pub use http::{header_value, ByteStream, Headers, HttpClient, StreamingResponse};
pub use sink::EventSink;
pub use vector_store::VectorStore;
