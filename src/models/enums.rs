use crate::db::DatabaseError;
use serde::{Deserialize, Serialize};

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = DatabaseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(DatabaseError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

str_enum!(DocumentType {
    NationalId => "national_id",
    DriversLicense => "drivers_license",
    Passport => "passport",
    BirthCertificate => "birth_certificate",
    MarriageCertificate => "marriage_certificate",
    BusinessRegistration => "business_registration",
    TaxCertificate => "tax_certificate",
    HealthCertificate => "health_certificate",
    Visa => "visa",
    Other => "other",
});

str_enum!(DocumentStatus {
    Submitted => "submitted",
    AiProcessed => "ai_processed",
    OfficialReviewed => "official_reviewed",
    Approved => "approved",
    Rejected => "rejected",
    NeedsChanges => "needs_changes",
});

str_enum!(Department {
    Nira => "nira",
    Ursb => "ursb",
    Immigration => "immigration",
    Finance => "finance",
    Health => "health",
});

str_enum!(ReviewAction {
    Approve => "approve",
    Reject => "reject",
    RequestChanges => "request_changes",
});

str_enum!(FraudRiskLevel {
    Low => "low",
    Medium => "medium",
    High => "high",
});

impl DocumentType {
    /// Lenient parse for citizen- or AI-supplied type strings.
    ///
    /// Submission must never fail on an unrecognized type, so anything
    /// outside the known vocabulary collapses to `Other`.
    pub fn from_wire(s: &str) -> Self {
        s.parse().unwrap_or(Self::Other)
    }
}

impl DocumentStatus {
    /// True once a final disposition has been reached.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Approved | Self::Rejected | Self::NeedsChanges)
    }
}

impl Department {
    /// Every known department, in reporting order.
    pub const ALL: [Department; 5] = [
        Department::Nira,
        Department::Ursb,
        Department::Immigration,
        Department::Finance,
        Department::Health,
    ];

    /// Human-readable name for dashboards.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Nira => "NIRA",
            Self::Ursb => "URSB",
            Self::Immigration => "Immigration",
            Self::Finance => "Finance",
            Self::Health => "Health",
        }
    }
}

impl ReviewAction {
    /// The terminal status an admin decision resolves to.
    pub fn terminal_status(&self) -> DocumentStatus {
        match self {
            Self::Approve => DocumentStatus::Approved,
            Self::Reject => DocumentStatus::Rejected,
            Self::RequestChanges => DocumentStatus::NeedsChanges,
        }
    }
}

impl FraudRiskLevel {
    /// Bucket a raw fraud-risk score into a reporting level.
    pub fn from_score(score: f32) -> Self {
        if score < 0.33 {
            Self::Low
        } else if score < 0.66 {
            Self::Medium
        } else {
            Self::High
        }
    }
}
