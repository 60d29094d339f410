use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::AiError;
use crate::models::enums::DocumentType;

/// Structured result of one analyzer invocation over a document's images.
///
/// All three scores are normalized to [0, 1] by the response parser.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentAnalysis {
    pub extracted_fields: BTreeMap<String, String>,
    pub confidence: f32,
    pub quality_score: f32,
    pub fraud_risk: f32,
    pub recommendations: Vec<String>,
    pub issues: Vec<String>,
}

impl DocumentAnalysis {
    /// Document type inferred by the analyzer, if it reported one.
    ///
    /// The type travels as an ordinary extracted field so the analyzer
    /// contract stays a single flat map.
    pub fn inferred_type(&self) -> Option<DocumentType> {
        self.extracted_fields
            .get("document_type")
            .map(|s| DocumentType::from_wire(s))
    }
}

/// Analyzer abstraction (allows mocking for tests).
///
/// One implementation per provider; the review engine calls the same
/// method for extraction, validation, assessment, and fraud framing and
/// interprets the result per stage.
pub trait DocumentAnalyzer {
    fn analyze(&self, images: &[String], type_hint: &str) -> Result<DocumentAnalysis, AiError>;

    /// Identifier recorded in the AI blocks this analyzer produces.
    fn model_name(&self) -> &str;
}
