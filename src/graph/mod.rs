//! Graph Mutator (spec.md §2, §4.2): `submit_goods_receipt` is the only
//! entry point that creates provenance edges. Both cases run inside one
//! `storage::Transaction` and persist every touched record at the end.

use tracing::info;

use crate::codec::material_key;
use crate::error::{ConflictError, LedgerError, NotFoundError, Result};
use crate::model::{
    ContaminationStatus, GoodsReceipt, GoodsReceiptAgainst, Mapping, OrderStatus, ReverseMapping,
    ShipmentStatus,
};
use crate::registry;
use crate::storage::Transaction;

/// `submitGoodsReceipt` (spec.md §4.2). Dispatches on `receipt.against`.
pub fn submit_goods_receipt(tx: &mut Transaction, receipt: GoodsReceipt) -> Result<()> {
    match receipt.against {
        GoodsReceiptAgainst::ProductionOrder => submit_against_production_order(tx, receipt),
        GoodsReceiptAgainst::PurchaseOrder => submit_against_purchase_order(tx, receipt),
    }
}

/// Case A (spec.md §4.2): a Production Order introduces new material; no
/// mapping edges are created.
fn submit_against_production_order(tx: &mut Transaction, receipt: GoodsReceipt) -> Result<()> {
    let mut order = registry::load_production_order(tx, &receipt.po_id)?;
    if order.status != OrderStatus::Open {
        return Err(LedgerError::Conflict(ConflictError::AlreadyCompleted(order.po_id.clone())));
    }
    if !order.participant_id.eq_ignore_ascii_case(&receipt.received_by) {
        return Err(LedgerError::Unauthorized(format!(
            "{} is not the owner of production order {}",
            receipt.received_by, order.po_id
        )));
    }

    let material_key = material_key(&order.participant_id, &order.material_id);
    let mut material = registry::load_material(tx, &material_key)?;
    let mut product = registry::load_product(tx, &material.product_bc_id)?;
    let participant = registry::load_participant(tx, &order.participant_id)?;

    product.total_quantity += order.quantity;
    material.total_quantity += order.quantity;
    material.upsert_batch(
        &order.participant_id,
        &material.material_id.clone(),
        &receipt.batch_number,
        receipt.serial_numbers.clone(),
        order.quantity,
        ContaminationStatus::Clean,
    );
    product.upsert_member(
        &order.participant_id,
        participant.participant_type,
        &material.material_id.clone(),
        ContaminationStatus::Clean,
    );
    order.status = OrderStatus::Completed;

    registry::save_product(tx, &product)?;
    registry::save_material(tx, &material)?;
    registry::save_production_order(tx, &order)?;
    registry::save_goods_receipt(tx, &receipt)?;
    info!(gr_number = receipt.gr_number, po_id = order.po_id, "goods receipt against production order");
    Ok(())
}

/// Case B (spec.md §4.2): a Purchase Order receipt credits the receiver and
/// creates the forward/reverse mapping edge.
fn submit_against_purchase_order(tx: &mut Transaction, receipt: GoodsReceipt) -> Result<()> {
    let mut po = registry::load_purchase_order(tx, &receipt.po_id)?;
    if po.status != OrderStatus::Open {
        return Err(LedgerError::Conflict(ConflictError::AlreadyCompleted(po.po_id.clone())));
    }
    if !po.requestor_id.eq_ignore_ascii_case(&receipt.received_by) {
        return Err(LedgerError::Unauthorized(format!(
            "{} is not the requestor of purchase order {}",
            receipt.received_by, po.po_id
        )));
    }
    if !po.shipment_exists {
        return Err(LedgerError::Validation(crate::error::ValidationError::Other(format!(
            "purchase order {} has no shipment",
            po.po_id
        ))));
    }

    let vendor_material_key = material_key(&po.vendor_id, &po.vendor_material_id);
    let receiver_material_key = material_key(&po.requestor_id, &po.requestor_material_id);
    let vendor_material = registry::load_material(tx, &vendor_material_key)?;
    let mut receiver_material = registry::load_material(tx, &receiver_material_key)?;
    let mut product = registry::load_product(tx, &receiver_material.product_bc_id)?;
    registry::load_participant(tx, &po.vendor_id)?;
    let receiver_participant = registry::load_participant(tx, &po.requestor_id)?;
    let mut shipment = po
        .shipment_id
        .clone()
        .map(|id| registry::load_shipment(tx, &id))
        .transpose()?
        .ok_or_else(|| LedgerError::NotFound(NotFoundError::Shipment(po.po_id.clone())))?;

    // Step 2: seed the receiver batch's flags from the vendor batch, subject to I4.
    let vendor_batch = vendor_material
        .find_batch(&po.vendor_batch_number)
        .ok_or_else(|| {
            LedgerError::NotFound(NotFoundError::Asset(format!(
                "vendor batch {} not found",
                po.vendor_batch_number
            )))
        })?;
    let seeded_contamination = vendor_batch.contamination;

    // Step 3: credit the receiver.
    receiver_material.total_quantity += po.quantity;
    receiver_material.upsert_batch(
        &po.requestor_id,
        &receiver_material.material_id.clone(),
        &receipt.batch_number,
        receipt.serial_numbers.clone(),
        po.quantity,
        seeded_contamination,
    );

    // Step 4 + 5: append/accumulate the forward edge and its mirror.
    upsert_edge(
        &mut product,
        &po.vendor_id,
        &po.vendor_material_id,
        &po.vendor_batch_number,
        &po.requestor_id,
        &po.requestor_material_id,
        &receipt.batch_number,
        po.quantity,
        seeded_contamination,
    );

    // Step 6: ensure a SupplyChainMembers entry for the receiver, copying the
    // vendor's flags only if this is a newly-added entry.
    if product.find_member(&po.requestor_id).is_none() {
        let vendor_member_contamination = product
            .find_member(&po.vendor_id)
            .map(|m| m.contamination)
            .unwrap_or(ContaminationStatus::Clean);
        product.upsert_member(
            &po.requestor_id,
            receiver_participant.participant_type,
            &receiver_material.material_id.clone(),
            vendor_member_contamination,
        );
    }

    // Step 7: complete the shipment and the purchase order.
    shipment.status = ShipmentStatus::Completed;
    po.status = OrderStatus::Completed;

    registry::save_purchase_order(tx, &po)?;
    registry::save_shipment(tx, &shipment)?;
    registry::save_product(tx, &product)?;
    registry::save_material(tx, &receiver_material)?;
    registry::save_goods_receipt(tx, &receipt)?;
    info!(
        gr_number = receipt.gr_number,
        po_id = po.po_id,
        shipment_id = shipment.shipment_id,
        "goods receipt against purchase order"
    );
    Ok(())
}

/// Appends to `Product.Mappings` / mirrors into `Product.ReverseMappings`,
/// maintaining invariant I2 (spec.md §4.2 steps 4-5).
#[allow(clippy::too_many_arguments)]
fn upsert_edge(
    product: &mut crate::model::Product,
    from_participant_id: &str,
    from_material_id: &str,
    from_batch_number: &str,
    to_participant_id: &str,
    to_material_id: &str,
    to_batch_number: &str,
    quantity: u64,
    contamination: ContaminationStatus,
) {
    let from_material_key = material_key(from_participant_id, from_material_id);
    let to_material_key = material_key(to_participant_id, to_material_id);

    match product.find_mapping_mut(from_participant_id, from_batch_number) {
        Some(mapping) => {
            mapping.from.quantity += quantity;
            match mapping
                .to
                .iter_mut()
                .find(|t| t.matches(to_participant_id, to_batch_number))
            {
                Some(existing) => existing.quantity += quantity,
                None => {
                    let mut to = crate::model::BatchTradeInfo::new(
                        to_participant_id,
                        to_material_key.clone(),
                        to_batch_number,
                        Vec::new(),
                        quantity,
                    );
                    to.contamination = contamination;
                    mapping.to.push(to);
                }
            }
        }
        None => {
            let mut from = crate::model::BatchTradeInfo::new(
                from_participant_id,
                from_material_key.clone(),
                from_batch_number,
                Vec::new(),
                quantity,
            );
            from.contamination = contamination;
            let mut to = crate::model::BatchTradeInfo::new(
                to_participant_id,
                to_material_key.clone(),
                to_batch_number,
                Vec::new(),
                quantity,
            );
            to.contamination = contamination;
            product.mappings.push(Mapping { from, to: vec![to] });
        }
    }

    match product.find_reverse_mapping_mut(to_participant_id, to_batch_number) {
        Some(reverse) => {
            reverse.to.quantity += quantity;
            match reverse
                .from
                .iter_mut()
                .find(|f| f.matches(from_participant_id, from_batch_number))
            {
                Some(existing) => existing.quantity += quantity,
                None => {
                    let mut from = crate::model::BatchTradeInfo::new(
                        from_participant_id,
                        from_material_key,
                        from_batch_number,
                        Vec::new(),
                        quantity,
                    );
                    from.contamination = contamination;
                    reverse.from.push(from);
                }
            }
        }
        None => {
            let mut to = crate::model::BatchTradeInfo::new(
                to_participant_id,
                to_material_key,
                to_batch_number,
                Vec::new(),
                quantity,
            );
            to.contamination = contamination;
            let mut from = crate::model::BatchTradeInfo::new(
                from_participant_id,
                from_material_key,
                from_batch_number,
                Vec::new(),
                quantity,
            );
            from.contamination = contamination;
            product
                .reverse_mappings
                .push(ReverseMapping { to, from: vec![from] });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::GoodsReceipt;
    use crate::registry;
    use crate::storage::MemoryStore;

    fn seed_s1(tx: &mut Transaction) {
        registry::create_participant(tx, "A", "GROWER", "Acme", "a@test").unwrap();
        registry::create_participant(tx, "B", "IMPORTER", "Bravo", "b@test").unwrap();
        registry::create_product(tx, "P1", "coffee").unwrap();
        registry::register_material(tx, "A", "MA", "P1", "desc", "plant1", "loc1", "KG").unwrap();
        registry::register_material(tx, "B", "MB", "P1", "desc", "plant2", "loc2", "KG").unwrap();
        registry::create_production_order(tx, "PO1", "A", "MA", 100, "KG").unwrap();
        submit_goods_receipt(
            tx,
            GoodsReceipt::new(
                "GR1",
                "A",
                crate::model::GoodsReceiptAgainst::ProductionOrder,
                "PO1",
                "BATCH-A1",
                vec![],
            ),
        )
        .unwrap();
    }

    #[test]
    fn s1_produce_sets_quantities_and_status() {
        let mut store = MemoryStore::new();
        let mut tx = Transaction::begin(&mut store);
        seed_s1(&mut tx);
        let product = registry::load_product(&tx, "P1").unwrap();
        let material = registry::load_material(&tx, "a-ma").unwrap();
        let order = registry::load_production_order(&tx, "PO1").unwrap();
        assert_eq!(product.total_quantity, 100);
        assert_eq!(material.find_batch("BATCH-A1").unwrap().quantity, 100);
        assert_eq!(order.status, OrderStatus::Completed);
        assert!(product.find_member("A").is_some());
        tx.commit().unwrap();
    }

    #[test]
    fn s2_ship_and_receive_creates_mirrored_edge() {
        let mut store = MemoryStore::new();
        let mut tx = Transaction::begin(&mut store);
        seed_s1(&mut tx);
        registry::create_purchase_order(&mut tx, "PO2", "B", "MB", "A", "MA", "BATCH-A1", 40, "KG", 1.0, "USD").unwrap();
        registry::create_shipment(&mut tx, "S1", "P1", "PO2").unwrap();
        submit_goods_receipt(
            &mut tx,
            GoodsReceipt::new(
                "GR2",
                "B",
                crate::model::GoodsReceiptAgainst::PurchaseOrder,
                "PO2",
                "BATCH-B1",
                vec![],
            ),
        )
        .unwrap();

        let vendor_material = registry::load_material(&tx, "a-ma").unwrap();
        let receiver_material = registry::load_material(&tx, "b-mb").unwrap();
        let product = registry::load_product(&tx, "P1").unwrap();
        let po = registry::load_purchase_order(&tx, "PO2").unwrap();
        let shipment = registry::load_shipment(&tx, "S1").unwrap();

        assert_eq!(vendor_material.find_batch("BATCH-A1").unwrap().quantity, 60);
        assert_eq!(receiver_material.find_batch("BATCH-B1").unwrap().quantity, 40);
        let mapping = product.find_mapping("A", "BATCH-A1").unwrap();
        assert_eq!(mapping.to.len(), 1);
        assert_eq!(mapping.to[0].quantity, 40);
        let reverse = product.find_reverse_mapping("B", "BATCH-B1").unwrap();
        assert_eq!(reverse.from.len(), 1);
        assert_eq!(reverse.from[0].quantity, 40);
        assert_eq!(po.status, OrderStatus::Completed);
        assert_eq!(shipment.status, ShipmentStatus::Completed);
        tx.commit().unwrap();
    }

    #[test]
    fn s3_additional_receipt_accumulates_edge_quantity() {
        let mut store = MemoryStore::new();
        let mut tx = Transaction::begin(&mut store);
        seed_s1(&mut tx);
        registry::create_purchase_order(&mut tx, "PO2", "B", "MB", "A", "MA", "BATCH-A1", 40, "KG", 1.0, "USD").unwrap();
        registry::create_shipment(&mut tx, "S1", "P1", "PO2").unwrap();
        submit_goods_receipt(
            &mut tx,
            GoodsReceipt::new("GR2", "B", crate::model::GoodsReceiptAgainst::PurchaseOrder, "PO2", "BATCH-B1", vec![]),
        )
        .unwrap();

        registry::create_purchase_order(&mut tx, "PO3", "B", "MB", "A", "MA", "BATCH-A1", 25, "KG", 1.0, "USD").unwrap();
        registry::create_shipment(&mut tx, "S2", "P1", "PO3").unwrap();
        submit_goods_receipt(
            &mut tx,
            GoodsReceipt::new("GR3", "B", crate::model::GoodsReceiptAgainst::PurchaseOrder, "PO3", "BATCH-B1", vec![]),
        )
        .unwrap();

        let vendor_material = registry::load_material(&tx, "a-ma").unwrap();
        let receiver_material = registry::load_material(&tx, "b-mb").unwrap();
        let product = registry::load_product(&tx, "P1").unwrap();
        assert_eq!(vendor_material.find_batch("BATCH-A1").unwrap().quantity, 35);
        assert_eq!(receiver_material.find_batch("BATCH-B1").unwrap().quantity, 65);
        let mapping = product.find_mapping("A", "BATCH-A1").unwrap();
        assert_eq!(mapping.to[0].quantity, 65);
        let reverse = product.find_reverse_mapping("B", "BATCH-B1").unwrap();
        assert_eq!(reverse.from[0].quantity, 65);
        tx.commit().unwrap();
    }

    #[test]
    fn edge_endpoints_inherit_contamination_from_the_vendor_batch() {
        let mut store = MemoryStore::new();
        let mut tx = Transaction::begin(&mut store);
        seed_s1(&mut tx);
        let mut vendor_material = registry::load_material(&tx, "a-ma").unwrap();
        vendor_material.upsert_batch(
            "A",
            "A-MA",
            "BATCH-A1",
            vec![],
            100,
            ContaminationStatus::Confirmed,
        );
        registry::save_material(&mut tx, &vendor_material).unwrap();

        registry::create_purchase_order(&mut tx, "PO2", "B", "MB", "A", "MA", "BATCH-A1", 40, "KG", 1.0, "USD").unwrap();
        registry::create_shipment(&mut tx, "S1", "P1", "PO2").unwrap();
        submit_goods_receipt(
            &mut tx,
            GoodsReceipt::new(
                "GR2",
                "B",
                crate::model::GoodsReceiptAgainst::PurchaseOrder,
                "PO2",
                "BATCH-B1",
                vec![],
            ),
        )
        .unwrap();

        let receiver_material = registry::load_material(&tx, "b-mb").unwrap();
        assert_eq!(
            receiver_material.find_batch("BATCH-B1").unwrap().contamination,
            ContaminationStatus::Confirmed
        );

        let product = registry::load_product(&tx, "P1").unwrap();
        let mapping = product.find_mapping("A", "BATCH-A1").unwrap();
        assert_eq!(mapping.from.contamination, ContaminationStatus::Confirmed);
        assert_eq!(mapping.to[0].contamination, ContaminationStatus::Confirmed);
        let reverse = product.find_reverse_mapping("B", "BATCH-B1").unwrap();
        assert_eq!(reverse.to.contamination, ContaminationStatus::Confirmed);
        assert_eq!(reverse.from[0].contamination, ContaminationStatus::Confirmed);
        tx.commit().unwrap();
    }
}
