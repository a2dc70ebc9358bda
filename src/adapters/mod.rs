//! Concrete implementations of trait abstractions.
//!
//! # Adapters
//!
//! - [`ReqwestHttpClient`] - HTTP client using reqwest
//! - [`BodySink`] / [`BodyStream`] - event sink feeding an axum response
//!
//! # Mock Implementations
//!
//! The [`mock`] submodule provides test doubles:
//! - [`mock::MockHttpClient`] - scripted streaming responses
//! - [`mock::RecordingSink`] - in-memory event sink
//! - [`mock::RecordingVectorStore`] - records validated store requests

pub mod axum_sink;
pub mod mock;
pub mod reqwest_http;

pub use axum_sink::{body_channel, BodySink, BodyStream};
pub use reqwest_http::ReqwestHttpClient;
