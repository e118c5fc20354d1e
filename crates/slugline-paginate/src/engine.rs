//! Pagination dispatch, merge, and fallback.

use crate::element::{Element, PaginationResult};
use crate::pack::pack_elements;
use crate::worker::{ChunkRequest, ChunkResponse, ChunkWorker, ThreadPoolWorker};
use futures_util::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Engine configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Number of parallel workers. Zero disables the parallel path.
    pub workers: usize,
    /// Independent timeout applied to each chunk.
    pub chunk_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            workers: default_worker_count(),
            chunk_timeout: Duration::from_secs(10),
        }
    }
}

fn default_worker_count() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .min(8)
}

/// The pagination engine.
///
/// Splits the element list into contiguous count-based chunks, fans them
/// out to workers, merges the survivors back into document order, and
/// falls back to the sequential path when the parallel one yields
/// nothing. Pagination never fails: the worst case is the fallback
/// result.
pub struct PaginationEngine {
    config: EngineConfig,
    worker: Arc<dyn ChunkWorker>,
}

impl PaginationEngine {
    /// Create an engine with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    /// Create an engine with custom configuration.
    #[must_use]
    pub fn with_config(config: EngineConfig) -> Self {
        Self::with_worker(config, Arc::new(ThreadPoolWorker))
    }

    /// Create an engine dispatching through a custom worker.
    #[must_use]
    pub fn with_worker(config: EngineConfig, worker: Arc<dyn ChunkWorker>) -> Self {
        Self { config, worker }
    }

    /// Paginate `elements` under the given page height budget.
    ///
    /// Output is always in document order, never worker-completion order.
    pub async fn paginate(&self, elements: &[Element], budget: u32) -> PaginationResult {
        if self.config.workers == 0 || elements.is_empty() {
            return PaginationResult::new(pack_elements(elements, budget));
        }

        let chunks = chunk_by_count(elements, self.config.workers);
        debug!(
            elements = elements.len(),
            chunks = chunks.len(),
            budget,
            "Dispatching pagination"
        );

        let dispatches = chunks.into_iter().enumerate().map(|(index, (start, slice))| {
            let worker = Arc::clone(&self.worker);
            let timeout = self.config.chunk_timeout;
            let request = ChunkRequest {
                elements: slice.to_vec(),
                start_index: start,
                chunk_index: index,
                page_budget: budget,
            };

            async move {
                match tokio::time::timeout(timeout, worker.run(request)).await {
                    Ok(Ok(response)) => Some(response),
                    Ok(Err(e)) => {
                        warn!(chunk = index, error = %e, "Pagination chunk failed");
                        None
                    }
                    Err(_) => {
                        warn!(chunk = index, ?timeout, "Pagination chunk timed out");
                        None
                    }
                }
            }
        });

        // Each chunk resolves on its own timeout; one hung worker cannot
        // hold back its siblings' results.
        let mut responses: Vec<ChunkResponse> =
            join_all(dispatches).await.into_iter().flatten().collect();

        if responses.is_empty() {
            warn!("All pagination chunks failed; using sequential fallback");
            return PaginationResult::new(pack_elements(elements, budget));
        }

        // Restore document order by chunk start index; the workers'
        // completion order means nothing.
        responses.sort_by_key(|r| r.start_index);
        let pages = responses.into_iter().flat_map(|r| r.pages).collect();

        PaginationResult::new(pages)
    }
}

impl Default for PaginationEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Split into at most `workers` contiguous chunks of equal count, the
/// last chunk absorbing the remainder. Boundaries ignore element heights;
/// height-aware splitting would need cross-chunk negotiation, which is
/// exactly what the parallel path avoids.
fn chunk_by_count(elements: &[Element], workers: usize) -> Vec<(usize, &[Element])> {
    let chunk_count = workers.min(elements.len()).max(1);
    let base = elements.len() / chunk_count;

    (0..chunk_count)
        .map(|i| {
            let start = i * base;
            let end = if i == chunk_count - 1 {
                elements.len()
            } else {
                start + base
            };
            (start, &elements[start..end])
        })
        .collect()
}
