use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, ValidationError};

/// Status shared by Purchase Orders and Production Orders; transitions once,
/// OPEN to COMPLETED, never reopened (spec.md §3 Lifecycles).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    Open,
    Completed,
}

impl OrderStatus {
    pub fn parse(raw: &str) -> Result<Self, LedgerError> {
        match raw.to_ascii_uppercase().as_str() {
            "OPEN" => Ok(OrderStatus::Open),
            "COMPLETED" => Ok(OrderStatus::Completed),
            other => Err(LedgerError::Validation(ValidationError::Other(format!(
                "invalid order status: {other}"
            )))),
        }
    }
}

/// A request from one participant (requestor) to another (vendor) for a
/// quantity of a vendor batch (spec.md §3 PurchaseOrder).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseOrder {
    pub po_id: String,
    pub requestor_id: String,
    pub requestor_material_id: String,
    pub vendor_id: String,
    pub vendor_material_id: String,
    pub vendor_batch_number: String,
    pub quantity: u64,
    pub unit_of_measure: String,
    pub net_price: f64,
    pub currency: String,
    pub shipment_exists: bool,
    pub shipment_id: Option<String>,
    pub status: OrderStatus,
}

impl PurchaseOrder {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        po_id: impl Into<String>,
        requestor_id: impl Into<String>,
        requestor_material_id: impl Into<String>,
        vendor_id: impl Into<String>,
        vendor_material_id: impl Into<String>,
        vendor_batch_number: impl Into<String>,
        quantity: u64,
        unit_of_measure: impl Into<String>,
        net_price: f64,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            po_id: po_id.into(),
            requestor_id: requestor_id.into(),
            requestor_material_id: requestor_material_id.into(),
            vendor_id: vendor_id.into(),
            vendor_material_id: vendor_material_id.into(),
            vendor_batch_number: vendor_batch_number.into(),
            quantity,
            unit_of_measure: unit_of_measure.into(),
            net_price,
            currency: currency.into(),
            shipment_exists: false,
            shipment_id: None,
            status: OrderStatus::Open,
        }
    }
}

/// A request that introduces new material into the graph from one
/// participant's own production (spec.md §3 ProductionOrder).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductionOrder {
    pub po_id: String,
    pub participant_id: String,
    pub material_id: String,
    pub quantity: u64,
    pub unit_of_measure: String,
    pub status: OrderStatus,
}

impl ProductionOrder {
    pub fn new(
        po_id: impl Into<String>,
        participant_id: impl Into<String>,
        material_id: impl Into<String>,
        quantity: u64,
        unit_of_measure: impl Into<String>,
    ) -> Self {
        Self {
            po_id: po_id.into(),
            participant_id: participant_id.into(),
            material_id: material_id.into(),
            quantity,
            unit_of_measure: unit_of_measure.into(),
            status: OrderStatus::Open,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn purchase_order_starts_open_with_no_shipment() {
        let po = PurchaseOrder::new("PO1", "B", "B-MB", "A", "A-MA", "BATCH-A1", 40, "KG", 1.0, "USD");
        assert_eq!(po.status, OrderStatus::Open);
        assert!(!po.shipment_exists);
        assert!(po.shipment_id.is_none());
    }

    #[test]
    fn order_status_parses_case_insensitively() {
        assert_eq!(OrderStatus::parse("open").unwrap(), OrderStatus::Open);
        assert_eq!(OrderStatus::parse("COMPLETED").unwrap(), OrderStatus::Completed);
        assert!(OrderStatus::parse("CANCELLED").is_err());
    }
}
