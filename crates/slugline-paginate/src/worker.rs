//! Pagination worker protocol.
//!
//! Workers receive one contiguous chunk of elements and pack it in
//! isolation; they communicate only with the dispatcher, never with each
//! other, so no worker needs a lock.

use crate::element::{Element, Page};
use crate::pack::pack_elements;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Worker errors.
#[derive(Debug, Error)]
pub enum WorkerError {
    /// The worker task failed or panicked.
    #[error("Worker failed: {0}")]
    Failed(String),
}

/// A chunk of work dispatched to one worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkRequest {
    /// The contiguous elements of this chunk.
    pub elements: Vec<Element>,
    /// Index of the chunk's first element in the full document.
    pub start_index: usize,
    /// Ordinal of this chunk in the dispatch.
    pub chunk_index: usize,
    /// Page height budget.
    pub page_budget: u32,
}

/// A worker's answer for one chunk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkResponse {
    /// Local pages for the chunk, in order.
    pub pages: Vec<Page>,
    /// Echo of the request's start index; the merge orders by this, not
    /// by any page numbering the worker could only approximate.
    pub start_index: usize,
    /// Echo of the request's chunk ordinal.
    pub chunk_index: usize,
}

/// One pagination worker.
///
/// The trait is the seam the engine tests fail-and-timeout behavior
/// through; production uses [`ThreadPoolWorker`].
#[async_trait]
pub trait ChunkWorker: Send + Sync {
    /// Pack one chunk into pages.
    ///
    /// # Errors
    ///
    /// Returns an error if the chunk could not be processed; the engine
    /// drops the chunk from the merge and keeps its siblings.
    async fn run(&self, request: ChunkRequest) -> Result<ChunkResponse, WorkerError>;
}

/// Default worker: runs the sequential packer on the blocking thread
/// pool, one task per chunk.
#[derive(Debug, Default)]
pub struct ThreadPoolWorker;

#[async_trait]
impl ChunkWorker for ThreadPoolWorker {
    async fn run(&self, request: ChunkRequest) -> Result<ChunkResponse, WorkerError> {
        let ChunkRequest {
            elements,
            start_index,
            chunk_index,
            page_budget,
        } = request;

        tokio::task::spawn_blocking(move || ChunkResponse {
            pages: pack_elements(&elements, page_budget),
            start_index,
            chunk_index,
        })
        .await
        .map_err(|e| WorkerError::Failed(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::ElementKind;

    #[tokio::test]
    async fn test_thread_pool_worker_matches_sequential_pack() {
        let elements: Vec<Element> = (0..10)
            .map(|i| Element::new(ElementKind::Action, format!("Beat {i}."), i))
            .collect();

        let response = ThreadPoolWorker
            .run(ChunkRequest {
                elements: elements.clone(),
                start_index: 7,
                chunk_index: 1,
                page_budget: 100,
            })
            .await
            .unwrap();

        assert_eq!(response.start_index, 7);
        assert_eq!(response.chunk_index, 1);
        assert_eq!(response.pages, pack_elements(&elements, 100));
    }
}
