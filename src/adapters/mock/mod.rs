//! Mock implementations for testing.
//!
//! # Available Mocks
//!
//! - [`MockHttpClient`] - HTTP client with scripted chunked responses
//! - [`RecordingSink`] - event sink that keeps written bytes
//! - [`RecordingVectorStore`] - vector store that records requests

pub mod http;
pub mod sink;
pub mod vector_store;

pub use http::{event_stream_response, MockHttpClient, MockResponse, RecordedRequest};
pub use sink::RecordingSink;
pub use vector_store::RecordingVectorStore;
