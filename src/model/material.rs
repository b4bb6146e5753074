use serde::{Deserialize, Serialize};

use super::contamination_status::ContaminationStatus;

/// One batch of a Material, produced or received in one event
/// (spec.md GLOSSARY).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchInfo {
    pub participant_id: String,
    pub material_id: String,
    pub batch_number: String,
    pub serial_numbers: Vec<String>,
    pub quantity: u64,
    pub contamination: ContaminationStatus,
}

impl BatchInfo {
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

    pub fn matches_batch(&self, batch_number: &str) -> bool {
        self.batch_number.eq_ignore_ascii_case(batch_number)
    }
}

/// A participant-owned SKU tied to one Product; holds batches
/// (spec.md §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Material {
    /// `<ParticipantID>-<MaterialMasterID>`, already lowercased at the key
    /// layer by `codec::normalize_key`; this field keeps the original case.
    pub material_id: String,
    pub participant_id: String,
    pub material_master_id: String,
    pub product_bc_id: String,
    pub material_description: String,
    pub plant: String,
    pub storage_location: String,
    pub unit_of_measure: String,
    pub total_quantity: u64,
    pub batches: Vec<BatchInfo>,
}

impl Material {
    pub fn new(
        participant_id: impl Into<String>,
        material_master_id: impl Into<String>,
        product_bc_id: impl Into<String>,
        material_description: impl Into<String>,
        plant: impl Into<String>,
        storage_location: impl Into<String>,
        unit_of_measure: impl Into<String>,
    ) -> Self {
        let participant_id = participant_id.into();
        let material_master_id = material_master_id.into();
        let material_id = format!("{}-{}", participant_id, material_master_id);
        Self {
            material_id,
            participant_id,
            material_master_id,
            product_bc_id: product_bc_id.into(),
            material_description: material_description.into(),
            plant: plant.into(),
            storage_location: storage_location.into(),
            unit_of_measure: unit_of_measure.into(),
            total_quantity: 0,
            batches: Vec::new(),
        }
    }

    pub fn find_batch(&self, batch_number: &str) -> Option<&BatchInfo> {
        self.batches.iter().find(|b| b.matches_batch(batch_number))
    }

    pub fn find_batch_mut(&mut self, batch_number: &str) -> Option<&mut BatchInfo> {
        self.batches
            .iter_mut()
            .find(|b| b.matches_batch(batch_number))
    }

    /// Upserts a batch (spec.md §4.2 step 3): adds quantity if the batch
    /// exists, otherwise appends a fresh one carrying `seed_contamination`.
    pub fn upsert_batch(
        &mut self,
        participant_id: &str,
        material_id: &str,
        batch_number: &str,
        serial_numbers: Vec<String>,
        quantity: u64,
        seed_contamination: ContaminationStatus,
    ) {
        if let Some(existing) = self.find_batch_mut(batch_number) {
            existing.quantity += quantity;
        } else {
            let mut batch = BatchInfo::new(
                participant_id,
                material_id,
                batch_number,
                serial_numbers,
                quantity,
            );
            batch.contamination = seed_contamination;
            self.batches.push(batch);
        }
    }

    /// Builds the canonical `<ParticipantID>-<MaterialMasterID>` key from
    /// its two parts (spec.md §3 Material key).
    pub fn key_for(participant_id: &str, material_master_id: &str) -> String {
        format!("{}-{}", participant_id, material_master_id)
    }
}
