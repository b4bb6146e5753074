use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, ValidationError};

/// Which order kind a Goods Receipt is recorded against (spec.md §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GoodsReceiptAgainst {
    ProductionOrder,
    PurchaseOrder,
}

impl GoodsReceiptAgainst {
    pub fn parse(raw: &str) -> Result<Self, LedgerError> {
        match raw.to_ascii_uppercase().as_str() {
            "PRODUCTION ORDER" => Ok(GoodsReceiptAgainst::ProductionOrder),
            "PURCHASE ORDER" => Ok(GoodsReceiptAgainst::PurchaseOrder),
            other => Err(LedgerError::Validation(ValidationError::InvalidAgainst(
                other.to_string(),
            ))),
        }
    }
}

/// Append-only record of a batch entering or moving through the graph
/// (spec.md §3 GoodsReceipt / GLOSSARY).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoodsReceipt {
    pub gr_number: String,
    pub received_by: String,
    pub against: GoodsReceiptAgainst,
    pub po_id: String,
    pub batch_number: String,
    pub serial_numbers: Vec<String>,
}

impl GoodsReceipt {
    pub fn new(
        gr_number: impl Into<String>,
        received_by: impl Into<String>,
        against: GoodsReceiptAgainst,
        po_id: impl Into<String>,
        batch_number: impl Into<String>,
        serial_numbers: Vec<String>,
    ) -> Self {
        Self {
            gr_number: gr_number.into(),
            received_by: received_by.into(),
            against,
            po_id: po_id.into(),
            batch_number: batch_number.into(),
            serial_numbers,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn against_parses_the_two_known_values() {
        assert_eq!(
            GoodsReceiptAgainst::parse("production order").unwrap(),
            GoodsReceiptAgainst::ProductionOrder
        );
        assert_eq!(
            GoodsReceiptAgainst::parse("PURCHASE ORDER").unwrap(),
            GoodsReceiptAgainst::PurchaseOrder
        );
    }

    #[test]
    fn against_rejects_unknown_value() {
        assert!(GoodsReceiptAgainst::parse("SALES ORDER").is_err());
    }
}
