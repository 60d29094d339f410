pub mod document;
pub mod enums;

pub use document::{AiReport, Document, FraudAnalysis};
pub use enums::{Department, DocumentStatus, DocumentType, FraudRiskLevel, ReviewAction};
