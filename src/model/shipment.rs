use serde::{Deserialize, Serialize};

/// One GPS fix appended by `tracking::track_shipment` (spec.md §4.4).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GpsReading {
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy: f64,
    pub timestamp: String,
}

/// Lifecycle of a Shipment (spec.md §3, plus the supplemental `Cancelled`
/// terminal state from §4.5 — cancellation never reopens a shipment).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShipmentStatus {
    Shipping,
    Completed,
    Cancelled,
}

/// The in-transit record linking a Product and a Purchase Order
/// (spec.md §3 Shipment).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shipment {
    pub shipment_id: String,
    pub product_bc_id: String,
    pub po_id: String,
    pub gps_readings: Vec<GpsReading>,
    pub status: ShipmentStatus,
}

impl Shipment {
    pub fn new(
        shipment_id: impl Into<String>,
        product_bc_id: impl Into<String>,
        po_id: impl Into<String>,
    ) -> Self {
        Self {
            shipment_id: shipment_id.into(),
            product_bc_id: product_bc_id.into(),
            po_id: po_id.into(),
            gps_readings: Vec::new(),
            status: ShipmentStatus::Shipping,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_shipment_starts_shipping_with_no_readings() {
        let s = Shipment::new("S1", "P1", "PO2");
        assert_eq!(s.status, ShipmentStatus::Shipping);
        assert!(s.gps_readings.is_empty());
    }
}
