//! Contamination Engine (spec.md §4.3): the forward+backward traversal that
//! propagates confirmed/potential contamination through a Product's
//! provenance graph. Each phase carries its own visited set keyed by
//! `(participant_id, batch_number)` (lowercased) to bound work at O(V+E)
//! and terminate in the presence of cycles (spec.md §4.3.1, §5).

use std::collections::HashSet;

use tracing::info;

use crate::codec::material_key;
use crate::error::{LedgerError, NotFoundError, Result};
use crate::model::{ContaminationStatus, Product};
use crate::registry;
use crate::storage::Transaction;

type NodeKey = (String, String);

/// `reportContamination(ParticipantID, MaterialID, BatchNumber)` (spec.md
/// §4.3.1). `MaterialID` here is the material-*master* id, same as
/// `registerMaterial`'s `MaterialMasterID` (`original_source/
/// chaincodeApp.go:1178` builds `ParticipantID + "-" + MaterialID`).
pub fn report_contamination(
    tx: &mut Transaction,
    participant_id: &str,
    material_master_id: &str,
    batch_number: &str,
) -> Result<()> {
    propagate(
        tx,
        participant_id,
        material_master_id,
        batch_number,
        ContaminationStatus::Confirmed,
    )
}

/// `clearContamination(ParticipantID, MaterialID, BatchNumber)`
/// (spec.md §4.3.2). Same shape as report, setting both flags false
/// throughout.
pub fn clear_contamination(
    tx: &mut Transaction,
    participant_id: &str,
    material_master_id: &str,
    batch_number: &str,
) -> Result<()> {
    propagate(
        tx,
        participant_id,
        material_master_id,
        batch_number,
        ContaminationStatus::Clean,
    )
}

fn propagate(
    tx: &mut Transaction,
    participant_id: &str,
    material_master_id: &str,
    batch_number: &str,
    seed_status: ContaminationStatus,
) -> Result<()> {
    let composite_material_id = material_key(participant_id, material_master_id);
    let material = registry::load_material(tx, &composite_material_id)?;
    let mut product = registry::load_product(tx, &material.product_bc_id)?;

    // Phase 1: downstream mark over Mappings, before Phase 2 so that on a
    // cycle the upstream pass (below) is the one that wins, matching the
    // known quirk in spec.md §4.3.1/§9.
    let downstream_status = if seed_status.is_compromised() {
        ContaminationStatus::Confirmed
    } else {
        ContaminationStatus::Clean
    };
    let mut visited: HashSet<NodeKey> = HashSet::new();
    mark_downstream(tx, &mut product, participant_id, batch_number, downstream_status, &mut visited)?;

    // Phase 2: upstream mark over ReverseMappings.
    let upstream_status = if seed_status.is_compromised() {
        ContaminationStatus::Potential
    } else {
        ContaminationStatus::Clean
    };
    let mut visited: HashSet<NodeKey> = HashSet::new();
    mark_upstream(tx, &mut product, participant_id, batch_number, upstream_status, &mut visited)?;

    // Finally, the seed batch and its SCM entry take the originally
    // requested status (spec.md §4.3.1 "Finally, set the seed batch...").
    set_material_batch(tx, participant_id, &composite_material_id, batch_number, seed_status)?;
    let seed_participant_type = match product.find_member(participant_id) {
        Some(member) => member.participant_type,
        None => registry::load_participant(tx, participant_id)?.participant_type,
    };
    product.upsert_member(participant_id, seed_participant_type, &composite_material_id, seed_status);

    registry::save_product(tx, &product)?;
    info!(participant_id, batch_number, ?seed_status, "contamination propagation complete");
    Ok(())
}

fn mark_downstream(
    tx: &mut Transaction,
    product: &mut Product,
    participant_id: &str,
    batch_number: &str,
    status: ContaminationStatus,
    visited: &mut HashSet<NodeKey>,
) -> Result<()> {
    let node = (participant_id.to_ascii_lowercase(), batch_number.to_ascii_lowercase());
    if visited.contains(&node) {
        return Ok(());
    }
    visited.insert(node);

    let Some(mapping) = product.find_mapping_mut(participant_id, batch_number) else {
        return Ok(());
    };
    mapping.from.contamination = status;
    let targets: Vec<(String, String)> = mapping
        .to
        .iter_mut()
        .map(|to| {
            to.contamination = status;
            (to.participant_id.clone(), to.batch_number.clone())
        })
        .collect();

    for (to_participant, to_batch) in &targets {
        if let Some(reverse) = product.find_reverse_mapping_mut(to_participant, to_batch) {
            reverse.to.contamination = status;
        }
        let participant_type = registry::load_participant(tx, to_participant)?.participant_type;
        product.upsert_member(to_participant, participant_type, to_batch, status);
        update_material_batch_for_edge(tx, product, to_participant, to_batch, status)?;
    }

    for (to_participant, to_batch) in &targets {
        mark_downstream(tx, product, to_participant, to_batch, status, visited)?;
    }
    Ok(())
}

fn mark_upstream(
    tx: &mut Transaction,
    product: &mut Product,
    participant_id: &str,
    batch_number: &str,
    status: ContaminationStatus,
    visited: &mut HashSet<NodeKey>,
) -> Result<()> {
    let node = (participant_id.to_ascii_lowercase(), batch_number.to_ascii_lowercase());
    if visited.contains(&node) {
        return Ok(());
    }
    visited.insert(node);

    let Some(reverse) = product.find_reverse_mapping_mut(participant_id, batch_number) else {
        return Ok(());
    };
    reverse.to.contamination = status;
    let sources: Vec<(String, String)> = reverse
        .from
        .iter_mut()
        .map(|from| {
            from.contamination = status;
            (from.participant_id.clone(), from.batch_number.clone())
        })
        .collect();

    for (from_participant, from_batch) in &sources {
        if let Some(mapping) = product.find_mapping_mut(from_participant, from_batch) {
            mapping.from.contamination = status;
        }
        let participant_type = registry::load_participant(tx, from_participant)?.participant_type;
        product.upsert_member(from_participant, participant_type, from_batch, status);
        update_material_batch_for_edge(tx, product, from_participant, from_batch, status)?;
    }

    for (from_participant, from_batch) in &sources {
        mark_upstream(tx, product, from_participant, from_batch, status, visited)?;
    }
    Ok(())
}

/// Loads, updates, and persists the Material batch record a mapping
/// endpoint refers to. `to_batch`/`from_batch` here is only the batch
/// number; the owning Material is resolved by scanning the product's known
/// materials for one whose participant matches (mirrors spec.md's "load the
/// Material for (ParticipantID, MaterialID)" where MaterialID comes from the
/// endpoint itself, found by a point lookup in our codebase via the edge's
/// stored `material_id`).
fn update_material_batch_for_edge(
    tx: &mut Transaction,
    product: &Product,
    participant_id: &str,
    batch_number: &str,
    status: ContaminationStatus,
) -> Result<()> {
    let material_id = product
        .find_mapping(participant_id, batch_number)
        .map(|m| m.from.material_id.clone())
        .or_else(|| {
            product
                .find_reverse_mapping(participant_id, batch_number)
                .map(|m| m.to.material_id.clone())
        })
        .ok_or_else(|| {
            LedgerError::NotFound(NotFoundError::Asset(format!(
                "no mapping endpoint for ({participant_id}, {batch_number})"
            )))
        })?;
    set_material_batch(tx, participant_id, &material_id, batch_number, status)
}

fn set_material_batch(
    tx: &mut Transaction,
    _participant_id: &str,
    material_id: &str,
    batch_number: &str,
    status: ContaminationStatus,
) -> Result<()> {
    let mut material = registry::load_material(tx, material_id)?;
    if let Some(batch) = material.find_batch_mut(batch_number) {
        batch.contamination = status;
    }
    registry::save_material(tx, &material)
}
