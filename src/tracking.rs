//! Shipment Tracking (spec.md §4.4): appends a GPS reading to an
//! in-transit shipment.

use tracing::info;

use crate::error::{ConflictError, LedgerError, Result};
use crate::model::{GpsReading, ShipmentStatus};
use crate::registry;
use crate::storage::Transaction;

/// `trackShipment(ShipmentID, Latitude, Longitude, Accuracy, Timestamp)`.
/// Rejected once the shipment has completed (spec.md §4.4).
pub fn track_shipment(
    tx: &mut Transaction,
    shipment_id: &str,
    latitude: f64,
    longitude: f64,
    accuracy: f64,
    timestamp: &str,
) -> Result<()> {
    let mut shipment = registry::load_shipment(tx, shipment_id)?;
    if shipment.status != ShipmentStatus::Shipping {
        return Err(LedgerError::Conflict(ConflictError::AlreadyCompleted(shipment_id.to_string())));
    }
    shipment.gps_readings.push(GpsReading {
        latitude,
        longitude,
        accuracy,
        timestamp: timestamp.to_string(),
    });
    registry::save_shipment(tx, &shipment)?;
    info!(shipment_id, "recorded GPS reading");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry;
    use crate::storage::MemoryStore;

    #[test]
    fn track_shipment_appends_reading_while_shipping() {
        let mut store = MemoryStore::new();
        let mut tx = Transaction::begin(&mut store);
        registry::create_participant(&mut tx, "A", "GROWER", "Acme", "a@test").unwrap();
        registry::create_participant(&mut tx, "B", "IMPORTER", "Bravo", "b@test").unwrap();
        registry::create_product(&mut tx, "P1", "coffee").unwrap();
        registry::register_material(&mut tx, "A", "MA", "P1", "d", "p1", "l1", "KG").unwrap();
        registry::register_material(&mut tx, "B", "MB", "P1", "d", "p2", "l2", "KG").unwrap();
        let mut vendor_material = registry::load_material(&tx, "a-ma").unwrap();
        vendor_material.upsert_batch("A", "A-MA", "BATCH-A1", vec![], 100, crate::model::ContaminationStatus::Clean);
        vendor_material.total_quantity = 100;
        registry::save_material(&mut tx, &vendor_material).unwrap();
        registry::create_purchase_order(&mut tx, "PO2", "B", "MB", "A", "MA", "BATCH-A1", 40, "KG", 1.0, "USD").unwrap();
        registry::create_shipment(&mut tx, "S1", "P1", "PO2").unwrap();

        track_shipment(&mut tx, "S1", 1.0, 2.0, 5.0, "2026-01-01T00:00:00Z").unwrap();
        let shipment = registry::load_shipment(&tx, "S1").unwrap();
        assert_eq!(shipment.gps_readings.len(), 1);
        tx.commit().unwrap();
    }

    #[test]
    fn track_shipment_rejects_completed_shipment() {
        let mut store = MemoryStore::new();
        let mut tx = Transaction::begin(&mut store);
        registry::create_participant(&mut tx, "A", "GROWER", "Acme", "a@test").unwrap();
        registry::create_participant(&mut tx, "B", "IMPORTER", "Bravo", "b@test").unwrap();
        registry::create_product(&mut tx, "P1", "coffee").unwrap();
        registry::register_material(&mut tx, "A", "MA", "P1", "d", "p1", "l1", "KG").unwrap();
        registry::register_material(&mut tx, "B", "MB", "P1", "d", "p2", "l2", "KG").unwrap();
        let mut vendor_material = registry::load_material(&tx, "a-ma").unwrap();
        vendor_material.upsert_batch("A", "A-MA", "BATCH-A1", vec![], 100, crate::model::ContaminationStatus::Clean);
        vendor_material.total_quantity = 100;
        registry::save_material(&mut tx, &vendor_material).unwrap();
        registry::create_purchase_order(&mut tx, "PO2", "B", "MB", "A", "MA", "BATCH-A1", 40, "KG", 1.0, "USD").unwrap();
        registry::create_shipment(&mut tx, "S1", "P1", "PO2").unwrap();
        crate::graph::submit_goods_receipt(
            &mut tx,
            crate::model::GoodsReceipt::new(
                "GR2",
                "B",
                crate::model::GoodsReceiptAgainst::PurchaseOrder,
                "PO2",
                "BATCH-B1",
                vec![],
            ),
        )
        .unwrap();

        let err = track_shipment(&mut tx, "S1", 1.0, 2.0, 5.0, "2026-01-01T00:00:00Z").unwrap_err();
        assert!(matches!(err, LedgerError::Conflict(_)));
        tx.commit().unwrap();
    }
}
