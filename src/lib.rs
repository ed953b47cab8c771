//! Reconciliation engine - links statement transactions to source documents
//! and derives per-folder compliance scores.
//!
//! The engine is a library-level core: callers hand it a [`storage::FolderStore`]
//! and drive it through [`services::Reconciler`]. OCR extraction and the HTTP
//! layer sit outside this crate.

pub mod config;
pub mod error;
pub mod matching;
pub mod models;
pub mod services;
pub mod storage;

pub use error::EngineError;
pub use models::ReconcileSummary;
pub use services::Reconciler;
