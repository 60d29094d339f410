use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{Department, DocumentStatus, DocumentType, FraudRiskLevel};
use crate::ai::DocumentAnalysis;

/// The central record tracked by the review pipeline.
///
/// `status` and the per-stage AI blocks are only ever mutated by review
/// engine transitions; everything else is fixed at submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: Uuid,
    pub citizen_id: String,
    pub document_type: DocumentType,
    pub department_id: Department,
    pub status: DocumentStatus,
    /// Ordered opaque image payload references (base64 or data URLs).
    pub images: Vec<String>,
    pub description: Option<String>,
    pub ai_extraction: Option<AiReport>,
    pub ai_validation: Option<AiReport>,
    pub ai_assessment: Option<AiReport>,
    pub ai_fraud_analysis: Option<FraudAnalysis>,
    pub official_review_comment: Option<String>,
    pub official_reviewed_at: Option<NaiveDateTime>,
    pub admin_review_comment: Option<String>,
    pub admin_reviewed_at: Option<NaiveDateTime>,
    pub assigned_official_id: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// A structured analysis block recorded by one pipeline stage
/// (extraction, validation, or assessment — distinguished by which
/// `Document` field holds it).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiReport {
    pub extracted_fields: BTreeMap<String, String>,
    pub confidence: f32,
    pub quality_score: f32,
    pub fraud_risk: f32,
    pub recommendations: Vec<String>,
    pub issues: Vec<String>,
    pub model: String,
    pub recorded_at: NaiveDateTime,
}

impl AiReport {
    pub fn from_analysis(analysis: &DocumentAnalysis, model: &str, at: NaiveDateTime) -> Self {
        Self {
            extracted_fields: analysis.extracted_fields.clone(),
            confidence: analysis.confidence,
            quality_score: analysis.quality_score,
            fraud_risk: analysis.fraud_risk,
            recommendations: analysis.recommendations.clone(),
            issues: analysis.issues.clone(),
            model: model.to_string(),
            recorded_at: at,
        }
    }
}

/// The fraud side-channel block. Last write wins; never moves `status`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FraudAnalysis {
    pub risk_level: FraudRiskLevel,
    pub fraud_risk: f32,
    pub authenticity_score: f32,
    pub indicators: Vec<String>,
    pub recommendations: Vec<String>,
    pub model: String,
    pub analyzed_at: NaiveDateTime,
}

impl FraudAnalysis {
    pub fn from_analysis(analysis: &DocumentAnalysis, model: &str, at: NaiveDateTime) -> Self {
        Self {
            risk_level: FraudRiskLevel::from_score(analysis.fraud_risk),
            fraud_risk: analysis.fraud_risk,
            authenticity_score: (1.0 - analysis.fraud_risk).clamp(0.0, 1.0),
            indicators: analysis.issues.clone(),
            recommendations: analysis.recommendations.clone(),
            model: model.to_string(),
            analyzed_at: at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample_analysis() -> DocumentAnalysis {
        DocumentAnalysis {
            extracted_fields: BTreeMap::from([
                ("full_name".to_string(), "John Doe".to_string()),
                ("document_number".to_string(), "1234567890".to_string()),
            ]),
            confidence: 0.92,
            quality_score: 0.88,
            fraud_risk: 0.15,
            recommendations: vec!["Verify hologram".to_string()],
            issues: vec![],
        }
    }

    fn ts() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 6, 1)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap()
    }

    #[test]
    fn report_copies_all_analysis_fields() {
        let report = AiReport::from_analysis(&sample_analysis(), "gemini-1.5-flash", ts());
        assert_eq!(report.extracted_fields.len(), 2);
        assert_eq!(report.confidence, 0.92);
        assert_eq!(report.quality_score, 0.88);
        assert_eq!(report.fraud_risk, 0.15);
        assert_eq!(report.recommendations, vec!["Verify hologram"]);
        assert_eq!(report.model, "gemini-1.5-flash");
        assert_eq!(report.recorded_at, ts());
    }

    #[test]
    fn fraud_analysis_derives_risk_level_and_authenticity() {
        let mut analysis = sample_analysis();
        analysis.fraud_risk = 0.75;
        analysis.issues = vec!["Font mismatch on date field".to_string()];

        let fraud = FraudAnalysis::from_analysis(&analysis, "gemini-1.5-flash", ts());
        assert_eq!(fraud.risk_level, FraudRiskLevel::High);
        assert_eq!(fraud.fraud_risk, 0.75);
        assert!((fraud.authenticity_score - 0.25).abs() < 1e-6);
        assert_eq!(fraud.indicators.len(), 1);
    }

    #[test]
    fn fraud_analysis_low_risk() {
        let fraud = FraudAnalysis::from_analysis(&sample_analysis(), "mock", ts());
        assert_eq!(fraud.risk_level, FraudRiskLevel::Low);
        assert!((fraud.authenticity_score - 0.85).abs() < 1e-6);
    }

    #[test]
    fn document_serializes_with_optional_blocks_absent() {
        let doc = Document {
            id: Uuid::new_v4(),
            citizen_id: "citizen-1".into(),
            document_type: DocumentType::NationalId,
            department_id: Department::Nira,
            status: DocumentStatus::Submitted,
            images: vec!["img-1".into()],
            description: None,
            ai_extraction: None,
            ai_validation: None,
            ai_assessment: None,
            ai_fraud_analysis: None,
            official_review_comment: None,
            official_reviewed_at: None,
            admin_review_comment: None,
            admin_reviewed_at: None,
            assigned_official_id: None,
            created_at: ts(),
            updated_at: ts(),
        };

        let json = serde_json::to_string(&doc).unwrap();
        assert!(json.contains("\"status\":\"submitted\""));
        assert!(json.contains("\"department_id\":\"nira\""));

        let back: Document = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, doc.id);
        assert!(back.ai_extraction.is_none());
    }
}
