//! Civicdocs — citizen document review engine.
//!
//! Tracks citizen-submitted identity documents through a three-stage
//! human-plus-AI pipeline: submission (with automatic department
//! routing), departmental official review, and administrative
//! adjudication. AI extraction attaches structured metadata at each
//! stage but never gates a human action; persistence is SQLite.
//!
//! The transport layer (HTTP routing, sessions, request validation) is
//! deliberately out of this crate — embed [`ReviewEngine`] behind
//! whatever interface the deployment needs.

pub mod ai;
pub mod config;
pub mod db;
pub mod models;
pub mod review;
pub mod stats;

pub use ai::{DocumentAnalyzer, GeminiClient, MockAnalyzer};
pub use models::{Department, Document, DocumentStatus, DocumentType};
pub use review::{ReviewEngine, ReviewError, SubmissionReceipt, SubmissionRequest};

use tracing_subscriber::EnvFilter;

/// Initialize tracing for an embedding application.
///
/// Honors `RUST_LOG` when set, falls back to the crate default filter.
/// Safe to call more than once; later calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .try_init();
}
