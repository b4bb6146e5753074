//! Structural invariants from spec.md §8 that aren't already pinned down by
//! the per-scenario tests: mirror symmetry between `Mappings` and
//! `ReverseMappings` (I2), quantity conservation across a trade, termination
//! and the known upstream-wins-on-a-cycle quirk (I4/§9), and that a rejected
//! operation leaves no trace in the key's history.

use provchain_ledger::contamination;
use provchain_ledger::dispatch;
use provchain_ledger::error::StatusCode;
use provchain_ledger::graph::submit_goods_receipt;
use provchain_ledger::model::{ContaminationStatus, GoodsReceipt, GoodsReceiptAgainst};
use provchain_ledger::registry;
use provchain_ledger::storage::{MemoryStore, Store, Transaction};

fn three_hop_chain(tx: &mut Transaction) {
    registry::create_participant(tx, "A", "GROWER", "Acme", "a@test").unwrap();
    registry::create_participant(tx, "B", "IMPORTER", "Bravo", "b@test").unwrap();
    registry::create_participant(tx, "C", "DISTRIBUTOR", "Charlie", "c@test").unwrap();
    registry::create_product(tx, "P1", "coffee").unwrap();
    registry::register_material(tx, "A", "MA", "P1", "d", "p1", "l1", "KG").unwrap();
    registry::register_material(tx, "B", "MB", "P1", "d", "p2", "l2", "KG").unwrap();
    registry::register_material(tx, "C", "MC", "P1", "d", "p3", "l3", "KG").unwrap();
    registry::create_production_order(tx, "PO1", "A", "MA", 100, "KG").unwrap();
    submit_goods_receipt(
        tx,
        GoodsReceipt::new("GR1", "A", GoodsReceiptAgainst::ProductionOrder, "PO1", "BATCH-A1", vec![]),
    )
    .unwrap();
    registry::create_purchase_order(tx, "PO2", "B", "MB", "A", "MA", "BATCH-A1", 40, "KG", 1.0, "USD").unwrap();
    registry::create_shipment(tx, "S1", "P1", "PO2").unwrap();
    submit_goods_receipt(
        tx,
        GoodsReceipt::new("GR2", "B", GoodsReceiptAgainst::PurchaseOrder, "PO2", "BATCH-B1", vec![]),
    )
    .unwrap();
    registry::create_purchase_order(tx, "PO3", "C", "MC", "B", "MB", "BATCH-B1", 20, "KG", 1.0, "USD").unwrap();
    registry::create_shipment(tx, "S2", "P1", "PO3").unwrap();
    submit_goods_receipt(
        tx,
        GoodsReceipt::new("GR3", "C", GoodsReceiptAgainst::PurchaseOrder, "PO3", "BATCH-C1", vec![]),
    )
    .unwrap();
}

#[test]
fn mirror_symmetry_holds_after_multi_hop_trade() {
    let mut store = MemoryStore::new();
    let mut tx = Transaction::begin(&mut store);
    three_hop_chain(&mut tx);

    let product = registry::load_product(&tx, "P1").unwrap();
    assert!(!product.mappings.is_empty());

    for mapping in &product.mappings {
        for to in &mapping.to {
            let reverse = product
                .find_reverse_mapping(&to.participant_id, &to.batch_number)
                .expect("every Mapping.to endpoint must have a mirrored ReverseMapping");
            let from = reverse
                .from
                .iter()
                .find(|f| f.matches(&mapping.from.participant_id, &mapping.from.batch_number))
                .expect("ReverseMapping.from must contain the mirrored source endpoint");
            assert_eq!(from.quantity, to.quantity);
        }
    }
    for reverse in &product.reverse_mappings {
        for from in &reverse.from {
            let mapping = product
                .find_mapping(&from.participant_id, &from.batch_number)
                .expect("every ReverseMapping.from endpoint must have a mirrored Mapping");
            let to = mapping
                .to
                .iter()
                .find(|t| t.matches(&reverse.to.participant_id, &reverse.to.batch_number))
                .expect("Mapping.to must contain the mirrored destination endpoint");
            assert_eq!(to.quantity, from.quantity);
        }
    }
    tx.commit().unwrap();
}

#[test]
fn vendor_debit_equals_receiver_credit_and_product_total_only_grows() {
    let mut store = MemoryStore::new();
    let mut tx = Transaction::begin(&mut store);
    three_hop_chain(&mut tx);

    let vendor = registry::load_material(&tx, "a-ma").unwrap();
    let receiver = registry::load_material(&tx, "b-mb").unwrap();
    let debited = 100 - vendor.find_batch("BATCH-A1").unwrap().quantity;
    assert_eq!(debited, receiver.find_batch("BATCH-B1").unwrap().quantity);

    let product = registry::load_product(&tx, "P1").unwrap();
    assert_eq!(product.total_quantity, 100, "total quantity is set once, at the production order, and trades only move it between batches");
    tx.commit().unwrap();
}

#[test]
fn contamination_propagation_terminates_on_a_cycle_and_upstream_wins_over_downstream() {
    let mut store = MemoryStore::new();
    let mut tx = Transaction::begin(&mut store);
    three_hop_chain(&mut tx);

    // Close the loop: C sells back into A's own BATCH-A1, so the forward
    // graph has an edge from (C, BATCH-C1) into the exact seed node
    // (A, BATCH-A1).
    registry::create_purchase_order(&mut tx, "PO4", "A", "MA", "C", "MC", "BATCH-C1", 5, "KG", 1.0, "USD").unwrap();
    registry::create_shipment(&mut tx, "S3", "P1", "PO4").unwrap();
    submit_goods_receipt(
        &mut tx,
        GoodsReceipt::new("GR4", "A", GoodsReceiptAgainst::PurchaseOrder, "PO4", "BATCH-A1", vec![]),
    )
    .unwrap();

    let product = registry::load_product(&tx, "P1").unwrap();
    assert!(product.find_mapping("C", "BATCH-C1").is_some());
    assert!(product.find_reverse_mapping("A", "BATCH-A1").is_some());

    // This terminates at all (the visited set bounds the DFS); if it didn't,
    // the test process would never come back.
    contamination::report_contamination(&mut tx, "A", "MA", "BATCH-A1").unwrap();

    let product = registry::load_product(&tx, "P1").unwrap();
    // The seed batch itself always takes the explicitly requested status.
    assert_eq!(product.find_member("A").unwrap().contamination, ContaminationStatus::Confirmed);
    // B and C are reached by both phases; since phase 2 (upstream) runs
    // after phase 1 (downstream) and the cycle reconnects them to A, the
    // upstream "potential" mark is the one that survives.
    assert_eq!(product.find_member("B").unwrap().contamination, ContaminationStatus::Potential);
    assert_eq!(product.find_member("C").unwrap().contamination, ContaminationStatus::Potential);
    tx.commit().unwrap();
}

#[test]
fn rejected_operation_leaves_no_trace_in_history() {
    let mut store = MemoryStore::new();
    let create = r#"{"ParticipantID":"A","ParticipantType":"GROWER","CompanyName":"Acme","ContactEmail":"a@test"}"#;
    let first = dispatch::dispatch(&mut store, "createParticipant", &[create.to_string()]);
    assert_eq!(first.status, StatusCode::Created201);

    let duplicate = dispatch::dispatch(&mut store, "createParticipant", &[create.to_string()]);
    assert_eq!(duplicate.status, StatusCode::Conflict409);

    assert_eq!(store.history("a").unwrap().len(), 1);
}
