use serde::{Deserialize, Serialize};

use super::contamination_status::ContaminationStatus;
use super::participant::ParticipantType;

/// One endpoint of a provenance edge: a batch as seen from one side of a
/// transfer (spec.md §3 BatchTradeInfo).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchTradeInfo {
    pub participant_id: String,
    pub material_id: String,
    pub batch_number: String,
    pub serial_numbers: Vec<String>,
    pub quantity: u64,
    pub contamination: ContaminationStatus,
}

impl BatchTradeInfo {
    pub fn new(
        participant_id: impl Into<String>,
        material_id: impl Into<String>,
        batch_number: impl Into<String>,
        serial_numbers: Vec<String>,
        quantity: u64,
    ) -> Self {
        Self {
            participant_id: participant_id.into(),
            material_id: material_id.into(),
            batch_number: batch_number.into(),
            serial_numbers,
            quantity,
            contamination: ContaminationStatus::Clean,
        }
    }

    /// The provenance-graph node identity for this endpoint: `(ParticipantID,
    /// BatchNumber)`, lowercased (spec.md GLOSSARY, §4.3 visited-set key).
    pub fn node_key(&self) -> (String, String) {
        (
            self.participant_id.to_ascii_lowercase(),
            self.batch_number.to_ascii_lowercase(),
        )
    }

    pub fn matches(&self, participant_id: &str, batch_number: &str) -> bool {
        self.participant_id.eq_ignore_ascii_case(participant_id)
            && self.batch_number.eq_ignore_ascii_case(batch_number)
    }
}

/// Forward adjacency entry: one source batch and every batch it fed
/// (spec.md §3 Mapping).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mapping {
    pub from: BatchTradeInfo,
    pub to: Vec<BatchTradeInfo>,
}

/// Mirror of `Mapping`, keyed by the destination endpoint (spec.md §3
/// ReverseMapping).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReverseMapping {
    pub to: BatchTradeInfo,
    pub from: Vec<BatchTradeInfo>,
}

/// Per-product participant roster entry; coarsens flag state to the
/// participant (spec.md §9 "SupplyChainMembers is a coarsening").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupplyChainMember {
    pub participant_id: String,
    pub participant_type: ParticipantType,
    pub material_id: String,
    pub contamination: ContaminationStatus,
}

/// A product class shared across all participants handling the same good;
/// carries the provenance graph (spec.md GLOSSARY).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub product_id: String,
    pub product_type: String,
    pub total_quantity: u64,
    pub all_materials: Vec<String>,
    pub supply_chain_members: Vec<SupplyChainMember>,
    pub mappings: Vec<Mapping>,
    pub reverse_mappings: Vec<ReverseMapping>,
}

impl Product {
    pub fn new(product_id: impl Into<String>, product_type: impl Into<String>) -> Self {
        Self {
            product_id: product_id.into(),
            product_type: product_type.into(),
            total_quantity: 0,
            all_materials: Vec::new(),
            supply_chain_members: Vec::new(),
            mappings: Vec::new(),
            reverse_mappings: Vec::new(),
        }
    }

    pub fn has_material(&self, material_id: &str) -> bool {
        self.all_materials
            .iter()
            .any(|m| m.eq_ignore_ascii_case(material_id))
    }

    pub fn find_member_mut(&mut self, participant_id: &str) -> Option<&mut SupplyChainMember> {
        self.supply_chain_members
            .iter_mut()
            .find(|m| m.participant_id.eq_ignore_ascii_case(participant_id))
    }

    pub fn find_member(&self, participant_id: &str) -> Option<&SupplyChainMember> {
        self.supply_chain_members
            .iter()
            .find(|m| m.participant_id.eq_ignore_ascii_case(participant_id))
    }

    /// Upserts a `SupplyChainMembers` entry, keyed by `ParticipantID`
    /// (spec.md §4.2 Case A step 4 / Case B step 6).
    pub fn upsert_member(
        &mut self,
        participant_id: &str,
        participant_type: ParticipantType,
        material_id: &str,
        contamination: ContaminationStatus,
    ) {
        if let Some(existing) = self.find_member_mut(participant_id) {
            existing.contamination = contamination;
        } else {
            self.supply_chain_members.push(SupplyChainMember {
                participant_id: participant_id.to_string(),
                participant_type,
                material_id: material_id.to_string(),
                contamination,
            });
        }
    }

    pub fn find_mapping_mut(&mut self, participant_id: &str, batch_number: &str) -> Option<&mut Mapping> {
        self.mappings
            .iter_mut()
            .find(|m| m.from.matches(participant_id, batch_number))
    }

    pub fn find_mapping(&self, participant_id: &str, batch_number: &str) -> Option<&Mapping> {
        self.mappings
            .iter()
            .find(|m| m.from.matches(participant_id, batch_number))
    }

    pub fn find_reverse_mapping_mut(
        &mut self,
        participant_id: &str,
        batch_number: &str,
    ) -> Option<&mut ReverseMapping> {
        self.reverse_mappings
            .iter_mut()
            .find(|m| m.to.matches(participant_id, batch_number))
    }

    pub fn find_reverse_mapping(
        &self,
        participant_id: &str,
        batch_number: &str,
    ) -> Option<&ReverseMapping> {
        self.reverse_mappings
            .iter()
            .find(|m| m.to.matches(participant_id, batch_number))
    }
}
