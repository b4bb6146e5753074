use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, ValidationError};

/// Valid participant roles in the supply chain (spec.md §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParticipantType {
    Grower,
    Importer,
    Distributor,
    Retailer,
}

impl ParticipantType {
    /// Parses a caller-supplied string, case-insensitively, into one of
    /// the four fixed participant types (spec.md §4.1).
    pub fn parse(raw: &str) -> Result<Self, LedgerError> {
        match raw.to_ascii_uppercase().as_str() {
            "GROWER" => Ok(ParticipantType::Grower),
            "IMPORTER" => Ok(ParticipantType::Importer),
            "DISTRIBUTOR" => Ok(ParticipantType::Distributor),
            "RETAILER" => Ok(ParticipantType::Retailer),
            other => Err(LedgerError::Validation(
                ValidationError::InvalidParticipantType(other.to_string()),
            )),
        }
    }
}

/// A registered supply-chain participant. Created once; `participant_type`
/// is immutable thereafter (spec.md §3 Lifecycles).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participant {
    pub participant_id: String,
    pub participant_type: ParticipantType,
    pub company_name: String,
    pub contact_email: String,
    /// Material ids registered under this participant (a set; duplicate
    /// insertion is rejected with `Conflict` in `registry::register_material`).
    pub materials: Vec<String>,
}

impl Participant {
    pub fn new(
        participant_id: impl Into<String>,
        participant_type: ParticipantType,
        company_name: impl Into<String>,
        contact_email: impl Into<String>,
    ) -> Self {
        Self {
            participant_id: participant_id.into(),
            participant_type,
            company_name: company_name.into(),
            contact_email: contact_email.into(),
            materials: Vec::new(),
        }
    }

    pub fn has_material(&self, material_id: &str) -> bool {
        self.materials
            .iter()
            .any(|m| m.eq_ignore_ascii_case(material_id))
    }
}
