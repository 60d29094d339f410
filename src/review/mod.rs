pub mod engine;
pub mod locks;
pub mod routing;

pub use engine::*;
pub use routing::*;

use thiserror::Error;
use uuid::Uuid;

use crate::ai::AiError;
use crate::db::DatabaseError;

#[derive(Error, Debug)]
pub enum ReviewError {
    #[error("Document not found: {0}")]
    NotFound(Uuid),

    #[error("{operation} is not allowed while the document is {found}")]
    InvalidStatus {
        operation: &'static str,
        found: &'static str,
    },

    #[error("Review comment must not be empty")]
    EmptyComment,

    #[error("Submission must include at least one image")]
    NoImages,

    #[error("Unknown review action: {0}")]
    UnknownAction(String),

    #[error("Lock poisoned")]
    LockPoisoned,

    #[error("AI analysis failed: {0}")]
    Analyzer(#[from] AiError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

impl ReviewError {
    /// True for violations the caller must fix by correcting the request
    /// (wrong state, bad input) — retrying unchanged cannot succeed.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            Self::InvalidStatus { .. }
                | Self::EmptyComment
                | Self::NoImages
                | Self::UnknownAction(_)
        )
    }
}
