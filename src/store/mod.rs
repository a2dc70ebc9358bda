//! Vector store request types.
//!
//! Every request validates itself; filters go through the analyzer.

mod document;
mod request;

pub use document::Document;
pub use request::{CreateRequest, DeleteRequest, RetrieveRequest, DEFAULT_TOP_K};
