use serde::{Deserialize, Serialize};

/// The tri-state called for in spec.md §9 ("Dual-flag semantics"): a batch
/// is clean, suspected ("potential"), or confirmed contaminated. Spec.md's
/// invariant I4 — `IsCompromised` and `PotentialCompromised` are never both
/// true — holds structurally here rather than needing a runtime check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ContaminationStatus {
    #[default]
    Clean,
    Potential,
    Confirmed,
}

impl ContaminationStatus {
    pub fn is_compromised(self) -> bool {
        matches!(self, ContaminationStatus::Confirmed)
    }

    pub fn is_potential_compromised(self) -> bool {
        matches!(self, ContaminationStatus::Potential)
    }

    /// Reconstructs the status from the wire-level boolean pair used by
    /// spec.md's JSON schemas. `is_compromised` wins ties, per I4.
    pub fn from_flags(is_compromised: bool, potential_compromised: bool) -> Self {
        if is_compromised {
            ContaminationStatus::Confirmed
        } else if potential_compromised {
            ContaminationStatus::Potential
        } else {
            ContaminationStatus::Clean
        }
    }

    pub fn to_flags(self) -> (bool, bool) {
        match self {
            ContaminationStatus::Clean => (false, false),
            ContaminationStatus::Potential => (false, true),
            ContaminationStatus::Confirmed => (true, false),
        }
    }
}
