use crate::models::enums::{Department, DocumentType};

/// Map a document type to the department that owns its review.
///
/// Total on purpose: `Other` (and any unrecognized wire string, which
/// parses to `Other`) falls back to NIRA so routing can never block a
/// submission.
pub fn owning_department(document_type: &DocumentType) -> Department {
    match document_type {
        DocumentType::NationalId
        | DocumentType::DriversLicense
        | DocumentType::BirthCertificate => Department::Nira,
        DocumentType::Passport | DocumentType::Visa => Department::Immigration,
        DocumentType::MarriageCertificate | DocumentType::BusinessRegistration => Department::Ursb,
        DocumentType::TaxCertificate => Department::Finance,
        DocumentType::HealthCertificate => Department::Health,
        DocumentType::Other => Department::Nira,
    }
}
