//! sift - Server-Sent Events engine and metadata filter compiler
//!
//! - [`sse`] encodes, decodes, reads and writes `text/event-stream` traffic
//! - [`filter`] compiles metadata filter expressions for vector stores
//! - [`store`] holds the request types that carry compiled filters
//! - [`traits`] / [`adapters`] are the transport seams and their
//!   implementations

pub mod adapters;
pub mod cli;
pub mod error;
pub mod filter;
pub mod sse;
pub mod store;
pub mod traits;
