//! # slugline-paginate
//!
//! Concurrent pagination engine for screenplay documents.
//!
//! The engine re-flows a flat, ordered sequence of screenplay elements
//! into fixed-height pages:
//!
//! - **Element / Page** - The document model being partitioned
//! - **layout** - The pure height heuristic shared by every path
//! - **pack** - The sequential bin-packer (the reference semantics)
//! - **ChunkWorker** - The worker protocol and thread-pool dispatch
//! - **PaginationEngine** - Chunking, fan-out, ordered merge, fallback
//!
//! ## Architecture
//!
//! ```text
//! elements ──▶ chunk by count ──▶ worker pool ──▶ ordered merge ──▶ pages
//!                   │                 │ timeout/failure
//!                   └────────────── fallback (sequential) ─────────▶ pages
//! ```
//!
//! Pages are rebuilt wholesale on every run; the engine never patches a
//! previous result.

pub mod element;
pub mod engine;
pub mod layout;
pub mod pack;
pub mod worker;

pub use element::{Element, ElementKind, Page, PaginationResult};
pub use engine::{EngineConfig, PaginationEngine};
pub use layout::{element_height, DEFAULT_PAGE_HEIGHT};
pub use pack::pack_elements;
pub use worker::{ChunkRequest, ChunkResponse, ChunkWorker, ThreadPoolWorker, WorkerError};
