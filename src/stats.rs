//! Read-only aggregation over the document store.
//!
//! Pure counting functions over document slices; the review engine
//! exposes wrappers that fetch one consistent snapshot per call. Counts
//! never mutate anything and tolerate running at any point in the
//! pipeline's lifecycle.

use chrono::NaiveDate;
use serde::Serialize;

use crate::models::document::Document;
use crate::models::enums::{Department, DocumentStatus};

/// System-wide dashboard counts.
#[derive(Debug, Clone, Default, Serialize)]
pub struct OverviewStats {
    pub total_documents: usize,
    pub pending: usize,
    /// Documents with AI involvement: either the status says so or an
    /// extraction block is present. Both signals count — an attached
    /// block is evidence of processing even without a status change.
    pub ai_processed: usize,
    pub official_review: usize,
    /// Documents that reached the admin phase (comment or assessment).
    pub admin_review: usize,
    pub completed: usize,
    pub rejected: usize,
    pub completed_today: usize,
}

/// Workload row for one department.
#[derive(Debug, Clone, Serialize)]
pub struct DepartmentStats {
    pub department: Department,
    pub name: &'static str,
    pub total: usize,
    pub completed: usize,
    pub pending: usize,
    /// completed / total; 0 when the department has no documents.
    pub efficiency: f32,
}

/// Count documents against `today` as the reference calendar date.
pub fn overview(documents: &[Document], today: NaiveDate) -> OverviewStats {
    let mut stats = OverviewStats {
        total_documents: documents.len(),
        ..OverviewStats::default()
    };

    for doc in documents {
        match doc.status {
            DocumentStatus::Submitted => stats.pending += 1,
            DocumentStatus::OfficialReviewed => stats.official_review += 1,
            DocumentStatus::Approved => {
                stats.completed += 1;
                if doc.updated_at.date() == today {
                    stats.completed_today += 1;
                }
            }
            DocumentStatus::Rejected => stats.rejected += 1,
            DocumentStatus::AiProcessed | DocumentStatus::NeedsChanges => {}
        }
        if doc.status == DocumentStatus::AiProcessed || doc.ai_extraction.is_some() {
            stats.ai_processed += 1;
        }
        if doc.admin_review_comment.is_some() || doc.ai_assessment.is_some() {
            stats.admin_review += 1;
        }
    }

    stats
}

/// Bucket documents by owning department.
///
/// Every known department is reported, zero rows included, so dashboards
/// always render the full table.
pub fn by_department(documents: &[Document]) -> Vec<DepartmentStats> {
    Department::ALL
        .iter()
        .map(|dept| {
            let mut total = 0;
            let mut completed = 0;
            let mut pending = 0;
            for doc in documents.iter().filter(|d| &d.department_id == dept) {
                total += 1;
                match doc.status {
                    DocumentStatus::Approved => completed += 1,
                    DocumentStatus::Submitted => pending += 1,
                    _ => {}
                }
            }
            let efficiency = if total == 0 {
                0.0
            } else {
                completed as f32 / total as f32
            };
            DepartmentStats {
                department: dept.clone(),
                name: dept.display_name(),
                total,
                completed,
                pending,
                efficiency,
            }
        })
        .collect()
}
