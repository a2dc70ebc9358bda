//! Vector store trait abstraction.
//!
//! The public operations validate their request, then hand it to the
//! backend hook. Backends only implement the hooks and can assume the
//! request is well formed.

use async_trait::async_trait;

use crate::error::SiftResult;
use crate::store::{CreateRequest, DeleteRequest, Document, RetrieveRequest};

/// A store of embedded documents queried by similarity and filtered by
/// metadata.
///
/// # Example
///
/// ```ignore
/// use sift::filter::compile;
/// use sift::store::RetrieveRequest;
/// use sift::traits::VectorStore;
///
/// async fn english_docs<S: VectorStore>(store: &S) -> SiftResult<Vec<Document>> {
///     let request = RetrieveRequest::new("rust async")
///         .with_top_k(10)
///         .with_filter(compile("lang == 'en'")?);
///     store.retrieve(&request).await
/// }
/// ```
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Backend search for a validated request.
    async fn fetch(&self, request: &RetrieveRequest) -> SiftResult<Vec<Document>>;

    /// Backend insert for a validated request.
    async fn insert(&self, request: &CreateRequest) -> SiftResult<()>;

    /// Backend removal for a validated request.
    async fn remove(&self, request: &DeleteRequest) -> SiftResult<()>;

    async fn retrieve(&self, request: &RetrieveRequest) -> SiftResult<Vec<Document>> {
        request.validate()?;
        self.fetch(request).await
    }

    async fn create(&self, request: &CreateRequest) -> SiftResult<()> {
        request.validate()?;
        self.insert(request).await
    }

    async fn delete(&self, request: &DeleteRequest) -> SiftResult<()> {
        request.validate()?;
        self.remove(request).await
    }
}
