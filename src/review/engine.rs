//! Document review pipeline engine.
//!
//! Single entry point for every state-machine transition: citizen
//! submission → official review → admin adjudication, with the AI
//! analyzer attached at each stage. Uses trait-based DI for the analyzer
//! so the engine remains fully testable with mock implementations.
//!
//! Human-driven transitions (submit, review, decide) never fail because
//! the analyzer is unavailable — those stages degrade to "block omitted".
//! The AI-only operations (extraction, fraud analysis) surface analyzer
//! failures to the caller, who may retry.

use std::sync::Mutex;

use chrono::{Local, NaiveDateTime};
use rusqlite::Connection;
use serde::Serialize;
use uuid::Uuid;

use super::locks::DocumentLocks;
use super::routing::owning_department;
use super::ReviewError;
use crate::ai::DocumentAnalyzer;
use crate::db::repository;
use crate::db::DatabaseError;
use crate::models::document::{AiReport, Document, FraudAnalysis};
use crate::models::enums::{Department, DocumentStatus, DocumentType, ReviewAction};
use crate::stats::{self, DepartmentStats, OverviewStats};

// ---------------------------------------------------------------------------
// Request / receipt types
// ---------------------------------------------------------------------------

/// A citizen's submission, as received from the outer transport layer.
#[derive(Debug, Clone)]
pub struct SubmissionRequest {
    pub citizen_id: String,
    /// Citizen-declared type; when absent the analyzer infers one.
    pub document_type: Option<String>,
    pub images: Vec<String>,
    pub description: Option<String>,
}

/// What the citizen gets back immediately after submitting.
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionReceipt {
    pub document_id: Uuid,
    pub department: Department,
    pub status: DocumentStatus,
    pub submitted_at: NaiveDateTime,
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

pub struct ReviewEngine {
    conn: Mutex<Connection>,
    analyzer: Box<dyn DocumentAnalyzer + Send + Sync>,
    locks: DocumentLocks,
}

impl ReviewEngine {
    pub fn new(conn: Connection, analyzer: Box<dyn DocumentAnalyzer + Send + Sync>) -> Self {
        Self {
            conn: Mutex::new(conn),
            analyzer,
            locks: DocumentLocks::new(),
        }
    }

    // -- citizen ------------------------------------------------------------

    /// Create a document in `submitted` and route it to its department.
    ///
    /// When no type is declared the analyzer is asked once to infer it;
    /// any analyzer failure falls back to `Other` — submission must
    /// never block on the AI collaborator.
    pub fn submit(&self, request: SubmissionRequest) -> Result<SubmissionReceipt, ReviewError> {
        if request.images.is_empty() {
            return Err(ReviewError::NoImages);
        }

        let document_type = self.resolve_type(&request);
        let department = owning_department(&document_type);
        let at = now();

        let document = Document {
            id: Uuid::new_v4(),
            citizen_id: request.citizen_id,
            document_type,
            department_id: department.clone(),
            status: DocumentStatus::Submitted,
            images: request.images,
            description: request.description,
            ai_extraction: None,
            ai_validation: None,
            ai_assessment: None,
            ai_fraud_analysis: None,
            official_review_comment: None,
            official_reviewed_at: None,
            admin_review_comment: None,
            admin_reviewed_at: None,
            assigned_official_id: None,
            created_at: at,
            updated_at: at,
        };

        self.with_conn(|conn| repository::insert_document(conn, &document))?;

        tracing::info!(
            document_id = %document.id,
            department = department.as_str(),
            document_type = document.document_type.as_str(),
            "document submitted"
        );

        Ok(SubmissionReceipt {
            document_id: document.id,
            department,
            status: DocumentStatus::Submitted,
            submitted_at: at,
        })
    }

    fn resolve_type(&self, request: &SubmissionRequest) -> DocumentType {
        if let Some(declared) = &request.document_type {
            return DocumentType::from_wire(declared);
        }
        match self.analyzer.analyze(&request.images, "unknown") {
            Ok(analysis) => analysis.inferred_type().unwrap_or(DocumentType::Other),
            Err(e) => {
                tracing::warn!(error = %e, "type inference unavailable, defaulting to other");
                DocumentType::Other
            }
        }
    }

    // -- official -----------------------------------------------------------

    /// Run AI extraction over a document's images.
    ///
    /// Retryable: a failure leaves the record untouched, a repeated
    /// success overwrites the previous block.
    pub fn run_extraction(&self, document_id: Uuid) -> Result<AiReport, ReviewError> {
        let gate = self.locks.acquire(document_id)?;
        let _serial = gate.lock().map_err(|_| ReviewError::LockPoisoned)?;

        let mut document = self.fetch(document_id)?;
        if document.status.is_terminal() {
            return Err(ReviewError::InvalidStatus {
                operation: "Extraction",
                found: document.status.as_str(),
            });
        }

        let analysis = self
            .analyzer
            .analyze(&document.images, document.document_type.as_str())?;
        let at = now();
        let report = AiReport::from_analysis(&analysis, self.analyzer.model_name(), at);

        document.ai_extraction = Some(report.clone());
        document.status = DocumentStatus::AiProcessed;
        document.updated_at = at;
        self.persist(&document)?;

        tracing::info!(
            document_id = %document_id,
            confidence = report.confidence,
            "extraction recorded, document ai_processed"
        );
        Ok(report)
    }

    /// Record an official's review and hand the document to the admin
    /// queue. A validation pass is attempted but never blocks the review.
    pub fn official_review(
        &self,
        document_id: Uuid,
        official_id: &str,
        comment: &str,
    ) -> Result<Document, ReviewError> {
        let comment = comment.trim();
        if comment.is_empty() {
            return Err(ReviewError::EmptyComment);
        }

        let gate = self.locks.acquire(document_id)?;
        let _serial = gate.lock().map_err(|_| ReviewError::LockPoisoned)?;

        let mut document = self.fetch(document_id)?;
        match document.status {
            DocumentStatus::Submitted | DocumentStatus::AiProcessed => {}
            ref found => {
                return Err(ReviewError::InvalidStatus {
                    operation: "Official review",
                    found: found.as_str(),
                })
            }
        }

        let at = now();
        if let Some(validation) = self.try_stage(&document, "validation", at) {
            document.ai_validation = Some(validation);
        }
        document.status = DocumentStatus::OfficialReviewed;
        document.official_review_comment = Some(comment.to_string());
        document.official_reviewed_at = Some(at);
        document.updated_at = at;
        self.persist(&document)?;

        tracing::info!(
            document_id = %document_id,
            official_id,
            "official review recorded"
        );
        Ok(document)
    }

    /// Pin an official to a document. Does not move `status`.
    pub fn assign_official(
        &self,
        document_id: Uuid,
        official_id: &str,
    ) -> Result<Document, ReviewError> {
        let gate = self.locks.acquire(document_id)?;
        let _serial = gate.lock().map_err(|_| ReviewError::LockPoisoned)?;

        let mut document = self.fetch(document_id)?;
        if document.status.is_terminal() {
            return Err(ReviewError::InvalidStatus {
                operation: "Assignment",
                found: document.status.as_str(),
            });
        }

        document.assigned_official_id = Some(official_id.to_string());
        document.updated_at = now();
        self.persist(&document)?;
        Ok(document)
    }

    // -- admin --------------------------------------------------------------

    /// Record the admin's final decision.
    ///
    /// `action` is the wire action code: `approve`, `reject` or
    /// `request_changes`; anything else is a precondition error. An
    /// assessment pass is attempted but never blocks the decision.
    pub fn admin_review(
        &self,
        document_id: Uuid,
        admin_id: &str,
        action: &str,
        comment: &str,
    ) -> Result<Document, ReviewError> {
        let action: ReviewAction = action
            .parse()
            .map_err(|_| ReviewError::UnknownAction(action.to_string()))?;
        let comment = comment.trim();
        if comment.is_empty() {
            return Err(ReviewError::EmptyComment);
        }

        let gate = self.locks.acquire(document_id)?;
        let _serial = gate.lock().map_err(|_| ReviewError::LockPoisoned)?;

        let mut document = self.fetch(document_id)?;
        if document.status != DocumentStatus::OfficialReviewed {
            return Err(ReviewError::InvalidStatus {
                operation: "Admin review",
                found: document.status.as_str(),
            });
        }

        let at = now();
        if let Some(assessment) = self.try_stage(&document, "assessment", at) {
            document.ai_assessment = Some(assessment);
        }
        document.status = action.terminal_status();
        document.admin_review_comment = Some(comment.to_string());
        document.admin_reviewed_at = Some(at);
        document.updated_at = at;
        self.persist(&document)?;

        tracing::info!(
            document_id = %document_id,
            admin_id,
            status = document.status.as_str(),
            "admin decision recorded"
        );
        Ok(document)
    }

    /// Run the fraud side-channel. Never moves `status`; each call
    /// overwrites the previous block (last write wins).
    pub fn analyze_fraud(&self, document_id: Uuid) -> Result<FraudAnalysis, ReviewError> {
        let gate = self.locks.acquire(document_id)?;
        let _serial = gate.lock().map_err(|_| ReviewError::LockPoisoned)?;

        let mut document = self.fetch(document_id)?;
        let analysis = self
            .analyzer
            .analyze(&document.images, document.document_type.as_str())?;
        let at = now();
        let fraud = FraudAnalysis::from_analysis(&analysis, self.analyzer.model_name(), at);

        document.ai_fraud_analysis = Some(fraud.clone());
        document.updated_at = at;
        self.persist(&document)?;

        tracing::info!(
            document_id = %document_id,
            risk_level = fraud.risk_level.as_str(),
            "fraud analysis recorded"
        );
        Ok(fraud)
    }

    /// Move a document to another department. Admin-only transition;
    /// the automatic routing from submission is otherwise final.
    pub fn reassign_department(
        &self,
        document_id: Uuid,
        department: Department,
    ) -> Result<Document, ReviewError> {
        let gate = self.locks.acquire(document_id)?;
        let _serial = gate.lock().map_err(|_| ReviewError::LockPoisoned)?;

        let mut document = self.fetch(document_id)?;
        if document.status.is_terminal() {
            return Err(ReviewError::InvalidStatus {
                operation: "Reassignment",
                found: document.status.as_str(),
            });
        }

        tracing::info!(
            document_id = %document_id,
            from = document.department_id.as_str(),
            to = department.as_str(),
            "department reassigned"
        );
        document.department_id = department;
        document.updated_at = now();
        self.persist(&document)?;
        Ok(document)
    }

    // -- reads --------------------------------------------------------------

    pub fn document(&self, document_id: Uuid) -> Result<Document, ReviewError> {
        self.fetch(document_id)
    }

    /// Documents for one citizen; the `"all"` sentinel lists everything.
    pub fn documents_for_citizen(&self, citizen_id: &str) -> Result<Vec<Document>, ReviewError> {
        self.with_conn(|conn| repository::get_documents_by_citizen(conn, citizen_id))
    }

    pub fn documents_for_department(
        &self,
        department: &Department,
    ) -> Result<Vec<Document>, ReviewError> {
        self.with_conn(|conn| repository::get_documents_by_department(conn, department))
    }

    /// The admin queue: everything an official has signed off on.
    pub fn documents_awaiting_admin(&self) -> Result<Vec<Document>, ReviewError> {
        self.with_conn(|conn| {
            repository::get_documents_by_status(conn, &DocumentStatus::OfficialReviewed)
        })
    }

    pub fn all_documents(&self) -> Result<Vec<Document>, ReviewError> {
        self.with_conn(repository::get_all_documents)
    }

    /// System-wide counts against today's local calendar date.
    pub fn overview_stats(&self) -> Result<OverviewStats, ReviewError> {
        let documents = self.all_documents()?;
        Ok(stats::overview(&documents, Local::now().date_naive()))
    }

    /// Per-department workload, all five departments always reported.
    pub fn department_stats(&self) -> Result<Vec<DepartmentStats>, ReviewError> {
        let documents = self.all_documents()?;
        Ok(stats::by_department(&documents))
    }

    // -- internals ----------------------------------------------------------

    /// Attempt an analyzer pass for a human-driven transition. Failure
    /// degrades to "stage skipped" so the transition still completes.
    fn try_stage(&self, document: &Document, stage: &'static str, at: NaiveDateTime) -> Option<AiReport> {
        match self
            .analyzer
            .analyze(&document.images, document.document_type.as_str())
        {
            Ok(analysis) => Some(AiReport::from_analysis(
                &analysis,
                self.analyzer.model_name(),
                at,
            )),
            Err(e) => {
                tracing::warn!(
                    document_id = %document.id,
                    stage,
                    error = %e,
                    "analyzer unavailable, stage skipped"
                );
                None
            }
        }
    }

    fn fetch(&self, document_id: Uuid) -> Result<Document, ReviewError> {
        self.with_conn(|conn| repository::get_document(conn, &document_id))?
            .ok_or(ReviewError::NotFound(document_id))
    }

    fn persist(&self, document: &Document) -> Result<(), ReviewError> {
        self.with_conn(|conn| repository::update_document(conn, document))
    }

    fn with_conn<T>(
        &self,
        f: impl FnOnce(&Connection) -> Result<T, DatabaseError>,
    ) -> Result<T, ReviewError> {
        let conn = self.conn.lock().map_err(|_| ReviewError::LockPoisoned)?;
        f(&conn).map_err(ReviewError::from)
    }
}

fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
