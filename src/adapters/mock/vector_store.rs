//! In-memory vector store for testing.
//!
//! Requests reach the hooks only after validation, so the recorded lists
//! show exactly what a real backend would have received. Filters are not
//! evaluated: retrieval returns stored documents in insertion order.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use crate::error::{NetworkError, SiftResult};
use crate::store::{CreateRequest, DeleteRequest, Document, RetrieveRequest};
use crate::traits::VectorStore;

#[derive(Debug, Default)]
struct StoreState {
    documents: Vec<Document>,
    retrieved: Vec<RetrieveRequest>,
    created: Vec<CreateRequest>,
    deleted: Vec<DeleteRequest>,
    fail_with: Option<NetworkError>,
}

/// Vector store double that records every validated request.
#[derive(Debug, Clone, Default)]
pub struct RecordingVectorStore {
    state: Arc<Mutex<StoreState>>,
}

impl RecordingVectorStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every backend call fail with `error`.
    pub fn fail_with(&self, error: NetworkError) {
        self.state.lock().unwrap().fail_with = Some(error);
    }

    pub fn documents(&self) -> Vec<Document> {
        self.state.lock().unwrap().documents.clone()
    }

    pub fn retrieve_requests(&self) -> Vec<RetrieveRequest> {
        self.state.lock().unwrap().retrieved.clone()
    }

    pub fn create_requests(&self) -> Vec<CreateRequest> {
        self.state.lock().unwrap().created.clone()
    }

    pub fn delete_requests(&self) -> Vec<DeleteRequest> {
        self.state.lock().unwrap().deleted.clone()
    }

    fn check_failure(state: &StoreState) -> SiftResult<()> {
        match &state.fail_with {
            Some(err) => Err(err.clone().into()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl VectorStore for RecordingVectorStore {
    async fn fetch(&self, request: &RetrieveRequest) -> SiftResult<Vec<Document>> {
        let mut state = self.state.lock().unwrap();
        Self::check_failure(&state)?;
        state.retrieved.push(request.clone());
        Ok(state.documents.iter().take(request.top_k).cloned().collect())
    }

    async fn insert(&self, request: &CreateRequest) -> SiftResult<()> {
        let mut state = self.state.lock().unwrap();
        Self::check_failure(&state)?;
        state.created.push(request.clone());
        state.documents.extend(request.documents.iter().cloned());
        Ok(())
    }

    async fn remove(&self, request: &DeleteRequest) -> SiftResult<()> {
        let mut state = self.state.lock().unwrap();
        Self::check_failure(&state)?;
        state.deleted.push(request.clone());
        Ok(())
    }
}
