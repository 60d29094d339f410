use std::str::FromStr;

use chrono::NaiveDateTime;
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::document::{AiReport, Document, FraudAnalysis};
use crate::models::enums::{Department, DocumentStatus, DocumentType};

const SELECT_DOCUMENT: &str = "SELECT id, citizen_id, document_type, department_id, status, images,
     description, ai_extraction, ai_validation, ai_assessment, ai_fraud_analysis,
     official_review_comment, official_reviewed_at, admin_review_comment, admin_reviewed_at,
     assigned_official_id, created_at, updated_at
     FROM documents";

pub fn insert_document(conn: &Connection, doc: &Document) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO documents (id, citizen_id, document_type, department_id, status, images,
         description, ai_extraction, ai_validation, ai_assessment, ai_fraud_analysis,
         official_review_comment, official_reviewed_at, admin_review_comment, admin_reviewed_at,
         assigned_official_id, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)",
        params![
            doc.id.to_string(),
            doc.citizen_id,
            doc.document_type.as_str(),
            doc.department_id.as_str(),
            doc.status.as_str(),
            serde_json::to_string(&doc.images)?,
            doc.description,
            json_opt(&doc.ai_extraction)?,
            json_opt(&doc.ai_validation)?,
            json_opt(&doc.ai_assessment)?,
            json_opt(&doc.ai_fraud_analysis)?,
            doc.official_review_comment,
            doc.official_reviewed_at.map(format_timestamp),
            doc.admin_review_comment,
            doc.admin_reviewed_at.map(format_timestamp),
            doc.assigned_official_id,
            format_timestamp(doc.created_at),
            format_timestamp(doc.updated_at),
        ],
    )?;
    Ok(())
}

pub fn get_document(conn: &Connection, id: &Uuid) -> Result<Option<Document>, DatabaseError> {
    let mut stmt = conn.prepare(&format!("{SELECT_DOCUMENT} WHERE id = ?1"))?;

    let result = stmt.query_row(params![id.to_string()], read_row);
    match result {
        Ok(row) => Ok(Some(document_from_row(row)?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// All documents, newest submission first.
pub fn get_all_documents(conn: &Connection) -> Result<Vec<Document>, DatabaseError> {
    let mut stmt = conn.prepare(&format!("{SELECT_DOCUMENT} ORDER BY created_at DESC"))?;
    let rows = stmt.query_map([], read_row)?;
    collect_documents(rows)
}

/// Documents owned by one citizen. The `"all"` sentinel lists every
/// document (used by official/admin dashboards).
pub fn get_documents_by_citizen(
    conn: &Connection,
    citizen_id: &str,
) -> Result<Vec<Document>, DatabaseError> {
    if citizen_id == "all" {
        return get_all_documents(conn);
    }
    let mut stmt = conn.prepare(&format!(
        "{SELECT_DOCUMENT} WHERE citizen_id = ?1 ORDER BY created_at DESC"
    ))?;
    let rows = stmt.query_map(params![citizen_id], read_row)?;
    collect_documents(rows)
}

pub fn get_documents_by_department(
    conn: &Connection,
    department: &Department,
) -> Result<Vec<Document>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "{SELECT_DOCUMENT} WHERE department_id = ?1 ORDER BY created_at DESC"
    ))?;
    let rows = stmt.query_map(params![department.as_str()], read_row)?;
    collect_documents(rows)
}

pub fn get_documents_by_status(
    conn: &Connection,
    status: &DocumentStatus,
) -> Result<Vec<Document>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "{SELECT_DOCUMENT} WHERE status = ?1 ORDER BY created_at DESC"
    ))?;
    let rows = stmt.query_map(params![status.as_str()], read_row)?;
    collect_documents(rows)
}

/// Write back every mutable field of a document.
///
/// `citizen_id`, `document_type`, `images`, `description`, and
/// `created_at` are fixed at submission and deliberately not updated.
pub fn update_document(conn: &Connection, doc: &Document) -> Result<(), DatabaseError> {
    let rows = conn.execute(
        "UPDATE documents SET department_id = ?2, status = ?3,
         ai_extraction = ?4, ai_validation = ?5, ai_assessment = ?6, ai_fraud_analysis = ?7,
         official_review_comment = ?8, official_reviewed_at = ?9,
         admin_review_comment = ?10, admin_reviewed_at = ?11,
         assigned_official_id = ?12, updated_at = ?13
         WHERE id = ?1",
        params![
            doc.id.to_string(),
            doc.department_id.as_str(),
            doc.status.as_str(),
            json_opt(&doc.ai_extraction)?,
            json_opt(&doc.ai_validation)?,
            json_opt(&doc.ai_assessment)?,
            json_opt(&doc.ai_fraud_analysis)?,
            doc.official_review_comment,
            doc.official_reviewed_at.map(format_timestamp),
            doc.admin_review_comment,
            doc.admin_reviewed_at.map(format_timestamp),
            doc.assigned_official_id,
            format_timestamp(doc.updated_at),
        ],
    )?;
    if rows == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "Document".into(),
            id: doc.id.to_string(),
        });
    }
    Ok(())
}

// Internal row type for Document mapping
struct DocumentRow {
    id: String,
    citizen_id: String,
    document_type: String,
    department_id: String,
    status: String,
    images: String,
    description: Option<String>,
    ai_extraction: Option<String>,
    ai_validation: Option<String>,
    ai_assessment: Option<String>,
    ai_fraud_analysis: Option<String>,
    official_review_comment: Option<String>,
    official_reviewed_at: Option<String>,
    admin_review_comment: Option<String>,
    admin_reviewed_at: Option<String>,
    assigned_official_id: Option<String>,
    created_at: String,
    updated_at: String,
}

fn read_row(row: &Row<'_>) -> rusqlite::Result<DocumentRow> {
    Ok(DocumentRow {
        id: row.get(0)?,
        citizen_id: row.get(1)?,
        document_type: row.get(2)?,
        department_id: row.get(3)?,
        status: row.get(4)?,
        images: row.get(5)?,
        description: row.get(6)?,
        ai_extraction: row.get(7)?,
        ai_validation: row.get(8)?,
        ai_assessment: row.get(9)?,
        ai_fraud_analysis: row.get(10)?,
        official_review_comment: row.get(11)?,
        official_reviewed_at: row.get(12)?,
        admin_review_comment: row.get(13)?,
        admin_reviewed_at: row.get(14)?,
        assigned_official_id: row.get(15)?,
        created_at: row.get(16)?,
        updated_at: row.get(17)?,
    })
}

fn document_from_row(row: DocumentRow) -> Result<Document, DatabaseError> {
    Ok(Document {
        id: Uuid::parse_str(&row.id)
            .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
        citizen_id: row.citizen_id,
        document_type: DocumentType::from_str(&row.document_type)?,
        department_id: Department::from_str(&row.department_id)?,
        status: DocumentStatus::from_str(&row.status)?,
        images: serde_json::from_str(&row.images)?,
        description: row.description,
        ai_extraction: json_block::<AiReport>(row.ai_extraction),
        ai_validation: json_block::<AiReport>(row.ai_validation),
        ai_assessment: json_block::<AiReport>(row.ai_assessment),
        ai_fraud_analysis: json_block::<FraudAnalysis>(row.ai_fraud_analysis),
        official_review_comment: row.official_review_comment,
        official_reviewed_at: row.official_reviewed_at.as_deref().map(parse_timestamp),
        admin_review_comment: row.admin_review_comment,
        admin_reviewed_at: row.admin_reviewed_at.as_deref().map(parse_timestamp),
        assigned_official_id: row.assigned_official_id,
        created_at: parse_timestamp(&row.created_at),
        updated_at: parse_timestamp(&row.updated_at),
    })
}

fn collect_documents(
    rows: impl Iterator<Item = rusqlite::Result<DocumentRow>>,
) -> Result<Vec<Document>, DatabaseError> {
    let mut docs = Vec::new();
    for row in rows {
        docs.push(document_from_row(row?)?);
    }
    Ok(docs)
}

fn json_opt<T: serde::Serialize>(value: &Option<T>) -> Result<Option<String>, DatabaseError> {
    value
        .as_ref()
        .map(|v| serde_json::to_string(v))
        .transpose()
        .map_err(DatabaseError::from)
}

/// A corrupted optional block reads back as absent rather than failing
/// the whole row.
fn json_block<T: serde::de::DeserializeOwned>(value: Option<String>) -> Option<T> {
    value.and_then(|s| serde_json::from_str(&s).ok())
}

fn format_timestamp(ts: NaiveDateTime) -> String {
    ts.format("%Y-%m-%d %H:%M:%S%.f").to_string()
}

fn parse_timestamp(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f"))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::open_memory_database;
    use chrono::NaiveDate;
    use std::collections::BTreeMap;

    fn ts() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, 10)
            .unwrap()
            .and_hms_opt(14, 5, 33)
            .unwrap()
    }

    fn make_document(citizen: &str) -> Document {
        Document {
            id: Uuid::new_v4(),
            citizen_id: citizen.into(),
            document_type: DocumentType::NationalId,
            department_id: Department::Nira,
            status: DocumentStatus::Submitted,
            images: vec!["payload-a".into(), "payload-b".into()],
            description: Some("renewal".into()),
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
        }
    }

    fn make_report() -> AiReport {
        AiReport {
            extracted_fields: BTreeMap::from([("full_name".to_string(), "Jane".to_string())]),
            confidence: 0.9,
            quality_score: 0.8,
            fraud_risk: 0.1,
            recommendations: vec![],
            issues: vec!["glare on photo".into()],
            model: "mock".into(),
            recorded_at: ts(),
        }
    }

    #[test]
    fn insert_and_get_round_trip() {
        let conn = open_memory_database().unwrap();
        let doc = make_document("citizen-1");
        insert_document(&conn, &doc).unwrap();

        let fetched = get_document(&conn, &doc.id).unwrap().unwrap();
        assert_eq!(fetched.id, doc.id);
        assert_eq!(fetched.citizen_id, "citizen-1");
        assert_eq!(fetched.document_type, DocumentType::NationalId);
        assert_eq!(fetched.department_id, Department::Nira);
        assert_eq!(fetched.status, DocumentStatus::Submitted);
        assert_eq!(fetched.images, vec!["payload-a", "payload-b"]);
        assert_eq!(fetched.description, Some("renewal".into()));
        assert_eq!(fetched.created_at, ts());
        assert!(fetched.ai_extraction.is_none());
    }

    #[test]
    fn get_missing_document_returns_none() {
        let conn = open_memory_database().unwrap();
        assert!(get_document(&conn, &Uuid::new_v4()).unwrap().is_none());
    }

    #[test]
    fn ai_blocks_round_trip_as_json() {
        let conn = open_memory_database().unwrap();
        let mut doc = make_document("citizen-1");
        doc.ai_extraction = Some(make_report());
        doc.ai_fraud_analysis = Some(FraudAnalysis {
            risk_level: crate::models::enums::FraudRiskLevel::Medium,
            fraud_risk: 0.5,
            authenticity_score: 0.5,
            indicators: vec!["blurred seal".into()],
            recommendations: vec!["request original".into()],
            model: "mock".into(),
            analyzed_at: ts(),
        });
        insert_document(&conn, &doc).unwrap();

        let fetched = get_document(&conn, &doc.id).unwrap().unwrap();
        let extraction = fetched.ai_extraction.unwrap();
        assert_eq!(extraction.extracted_fields["full_name"], "Jane");
        assert_eq!(extraction.issues, vec!["glare on photo"]);
        let fraud = fetched.ai_fraud_analysis.unwrap();
        assert_eq!(fraud.indicators, vec!["blurred seal"]);
    }

    #[test]
    fn corrupted_block_reads_as_absent() {
        let conn = open_memory_database().unwrap();
        let doc = make_document("citizen-1");
        insert_document(&conn, &doc).unwrap();
        conn.execute(
            "UPDATE documents SET ai_extraction = 'not json' WHERE id = ?1",
            params![doc.id.to_string()],
        )
        .unwrap();

        let fetched = get_document(&conn, &doc.id).unwrap().unwrap();
        assert!(fetched.ai_extraction.is_none());
    }

    #[test]
    fn list_by_citizen_filters_and_all_sentinel() {
        let conn = open_memory_database().unwrap();
        insert_document(&conn, &make_document("citizen-1")).unwrap();
        insert_document(&conn, &make_document("citizen-1")).unwrap();
        insert_document(&conn, &make_document("citizen-2")).unwrap();

        assert_eq!(get_documents_by_citizen(&conn, "citizen-1").unwrap().len(), 2);
        assert_eq!(get_documents_by_citizen(&conn, "citizen-2").unwrap().len(), 1);
        assert_eq!(get_documents_by_citizen(&conn, "citizen-3").unwrap().len(), 0);
        assert_eq!(get_documents_by_citizen(&conn, "all").unwrap().len(), 3);
    }

    #[test]
    fn list_by_department() {
        let conn = open_memory_database().unwrap();
        let mut passport = make_document("citizen-1");
        passport.document_type = DocumentType::Passport;
        passport.department_id = Department::Immigration;
        insert_document(&conn, &passport).unwrap();
        insert_document(&conn, &make_document("citizen-1")).unwrap();

        let immigration = get_documents_by_department(&conn, &Department::Immigration).unwrap();
        assert_eq!(immigration.len(), 1);
        assert_eq!(immigration[0].document_type, DocumentType::Passport);
        assert!(get_documents_by_department(&conn, &Department::Health)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn list_by_status() {
        let conn = open_memory_database().unwrap();
        let mut reviewed = make_document("citizen-1");
        reviewed.status = DocumentStatus::OfficialReviewed;
        insert_document(&conn, &reviewed).unwrap();
        insert_document(&conn, &make_document("citizen-2")).unwrap();

        let queue = get_documents_by_status(&conn, &DocumentStatus::OfficialReviewed).unwrap();
        assert_eq!(queue.len(), 1);
        assert_eq!(queue[0].id, reviewed.id);
    }

    #[test]
    fn update_persists_mutable_fields() {
        let conn = open_memory_database().unwrap();
        let mut doc = make_document("citizen-1");
        insert_document(&conn, &doc).unwrap();

        doc.status = DocumentStatus::OfficialReviewed;
        doc.official_review_comment = Some("looks fine".into());
        doc.official_reviewed_at = Some(ts());
        doc.assigned_official_id = Some("official-7".into());
        doc.ai_validation = Some(make_report());
        doc.updated_at = ts();
        update_document(&conn, &doc).unwrap();

        let fetched = get_document(&conn, &doc.id).unwrap().unwrap();
        assert_eq!(fetched.status, DocumentStatus::OfficialReviewed);
        assert_eq!(fetched.official_review_comment, Some("looks fine".into()));
        assert_eq!(fetched.official_reviewed_at, Some(ts()));
        assert_eq!(fetched.assigned_official_id, Some("official-7".into()));
        assert!(fetched.ai_validation.is_some());
    }

    #[test]
    fn update_missing_document_is_not_found() {
        let conn = open_memory_database().unwrap();
        let doc = make_document("citizen-1");
        let err = update_document(&conn, &doc).unwrap_err();
        assert!(matches!(err, DatabaseError::NotFound { .. }));
    }

    #[test]
    fn timestamps_with_fractional_seconds_round_trip() {
        let conn = open_memory_database().unwrap();
        let mut doc = make_document("citizen-1");
        doc.created_at = NaiveDate::from_ymd_opt(2025, 3, 10)
            .unwrap()
            .and_hms_micro_opt(14, 5, 33, 123_456)
            .unwrap();
        doc.updated_at = doc.created_at;
        insert_document(&conn, &doc).unwrap();

        let fetched = get_document(&conn, &doc.id).unwrap().unwrap();
        assert_eq!(fetched.created_at, doc.created_at);
    }
}
