//! Operation Dispatcher (spec.md §2, §6): maps an operation name and a list
//! of string arguments — argument 0 a JSON payload, the rest scalar ids —
//! to the registry/graph/contamination/tracking layers, and renders the
//! result as `{status, message, payload}`.

use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, StatusCode};
use crate::model::GoodsReceipt;
use crate::model::GoodsReceiptAgainst;
use crate::storage::{MemoryStore, Transaction};
use crate::{codec, contamination, graph, registry, tracking};

/// The uniform response shape every dispatched operation returns
/// (spec.md §6).
#[derive(Debug, Clone)]
pub struct Response {
    pub status: StatusCode,
    pub message: String,
    pub payload: Option<Vec<u8>>,
}

impl Response {
    fn ok(status: StatusCode, message: impl Into<String>, payload: Option<Vec<u8>>) -> Self {
        Self { status, message: message.into(), payload }
    }

    fn from_error(err: LedgerError) -> Self {
        let status = StatusCode::from(&err);
        Self { status, message: err.to_string(), payload: None }
    }
}

impl From<&LedgerError> for StatusCode {
    fn from(err: &LedgerError) -> Self {
        err.status_code()
    }
}

/// Dispatches a named operation against `store`. Unknown operation names
/// map to 501 (spec.md §6).
pub fn dispatch(store: &mut MemoryStore, operation: &str, args: &[String]) -> Response {
    let result = run(store, operation, args);
    match result {
        Ok(response) => response,
        Err(err) => Response::from_error(err),
    }
}

fn arg(args: &[String], index: usize) -> Result<&str, LedgerError> {
    args.get(index)
        .map(|s| s.as_str())
        .ok_or_else(|| LedgerError::Validation(crate::error::ValidationError::MissingField(format!(
            "argument {index}"
        ))))
}

fn parse_payload<T: serde::de::DeserializeOwned>(args: &[String]) -> Result<T, LedgerError> {
    let raw = arg(args, 0)?;
    serde_json::from_str(raw).map_err(LedgerError::Json)
}

fn run(store: &mut MemoryStore, operation: &str, args: &[String]) -> Result<Response, LedgerError> {
    match operation {
        "createParticipant" => {
            let payload: CreateParticipantPayload = parse_payload(args)?;
            let mut tx = Transaction::begin(store);
            let participant = registry::create_participant(
                &mut tx,
                &payload.participant_id,
                &payload.participant_type,
                &payload.company_name,
                &payload.contact_email,
            )?;
            tx.commit()?;
            Ok(Response::ok(
                StatusCode::Created201,
                "participant created",
                Some(codec::encode(&participant)?),
            ))
        }
        "createProduct" => {
            let payload: CreateProductPayload = parse_payload(args)?;
            let mut tx = Transaction::begin(store);
            let product = registry::create_product(&mut tx, &payload.product_id, &payload.product_type)?;
            tx.commit()?;
            Ok(Response::ok(
                StatusCode::Created201,
                "product created",
                Some(codec::encode(&product)?),
            ))
        }
        "registerMaterial" => {
            let payload: RegisterMaterialPayload = parse_payload(args)?;
            let mut tx = Transaction::begin(store);
            let material = registry::register_material(
                &mut tx,
                &payload.participant_id,
                &payload.material_master_id,
                &payload.product_bc_id,
                &payload.material_description,
                &payload.plant,
                &payload.storage_location,
                &payload.unit_of_measure,
            )?;
            tx.commit()?;
            Ok(Response::ok(
                StatusCode::Created201,
                "material registered",
                Some(codec::encode(&material)?),
            ))
        }
        "createProductionOrder" => {
            let payload: CreateProductionOrderPayload = parse_payload(args)?;
            let mut tx = Transaction::begin(store);
            let order = registry::create_production_order(
                &mut tx,
                &payload.po_id,
                &payload.participant_id,
                &payload.material_id,
                payload.quantity,
                &payload.unit_of_measure,
            )?;
            tx.commit()?;
            Ok(Response::ok(
                StatusCode::Created201,
                "production order created",
                Some(codec::encode(&order)?),
            ))
        }
        "createPurchaseOrder" => {
            let payload: CreatePurchaseOrderPayload = parse_payload(args)?;
            let mut tx = Transaction::begin(store);
            let order = registry::create_purchase_order(
                &mut tx,
                &payload.po_id,
                &payload.requestor_id,
                &payload.requestor_material_id,
                &payload.vendor_id,
                &payload.vendor_material_id,
                &payload.vendor_batch_number,
                payload.quantity,
                &payload.unit_of_measure,
                payload.net_price,
                &payload.currency,
            )?;
            tx.commit()?;
            Ok(Response::ok(
                StatusCode::Created201,
                "purchase order created",
                Some(codec::encode(&order)?),
            ))
        }
        "createShipment" => {
            let payload: CreateShipmentPayload = parse_payload(args)?;
            let mut tx = Transaction::begin(store);
            let shipment = registry::create_shipment(
                &mut tx,
                &payload.shipment_id,
                &payload.product_bc_id,
                &payload.po_id,
            )?;
            tx.commit()?;
            Ok(Response::ok(
                StatusCode::Created201,
                "shipment created",
                Some(codec::encode(&shipment)?),
            ))
        }
        "cancelShipment" => {
            let shipment_id = arg(args, 1)?;
            let mut tx = Transaction::begin(store);
            let shipment = registry::cancel_shipment(&mut tx, shipment_id)?;
            tx.commit()?;
            Ok(Response::ok(
                StatusCode::Ok200,
                "shipment cancelled",
                Some(codec::encode(&shipment)?),
            ))
        }
        "trackShipment" => {
            let payload: TrackShipmentPayload = parse_payload(args)?;
            let mut tx = Transaction::begin(store);
            tracking::track_shipment(
                &mut tx,
                &payload.shipment_id,
                payload.latitude,
                payload.longitude,
                payload.accuracy,
                &payload.timestamp,
            )?;
            tx.commit()?;
            Ok(Response::ok(StatusCode::Ok200, "GPS reading recorded", None))
        }
        "submitGoodsReceipt" => {
            let payload: SubmitGoodsReceiptPayload = parse_payload(args)?;
            let against = GoodsReceiptAgainst::parse(&payload.against)?;
            let receipt = GoodsReceipt::new(
                payload.gr_number,
                payload.received_by,
                against,
                payload.po_id,
                payload.batch_number,
                payload.serial_numbers,
            );
            let mut tx = Transaction::begin(store);
            graph::submit_goods_receipt(&mut tx, receipt)?;
            tx.commit()?;
            Ok(Response::ok(StatusCode::Created201, "goods receipt submitted", None))
        }
        "reportContamination" => {
            let payload: ContaminationPayload = parse_payload(args)?;
            let mut tx = Transaction::begin(store);
            contamination::report_contamination(
                &mut tx,
                &payload.participant_id,
                &payload.material_id,
                &payload.batch_number,
            )?;
            tx.commit()?;
            Ok(Response::ok(StatusCode::Ok200, "contamination reported", None))
        }
        "clearContamination" => {
            let payload: ContaminationPayload = parse_payload(args)?;
            let mut tx = Transaction::begin(store);
            contamination::clear_contamination(
                &mut tx,
                &payload.participant_id,
                &payload.material_id,
                &payload.batch_number,
            )?;
            tx.commit()?;
            Ok(Response::ok(StatusCode::Ok200, "contamination cleared", None))
        }
        "getMaterial" => {
            let material_id = arg(args, 1)?;
            let tx = Transaction::begin(store);
            let material = registry::get_material(&tx, material_id)?;
            tx.commit()?;
            Ok(Response::ok(StatusCode::Ok200, "material found", Some(codec::encode(&material)?)))
        }
        "deleteMaterial" => {
            let material_id = arg(args, 1)?;
            let requested_by = arg(args, 2)?;
            let mut tx = Transaction::begin(store);
            registry::delete_material(&mut tx, material_id, requested_by)?;
            tx.commit()?;
            Ok(Response::ok(StatusCode::NoContent204, "material deleted", None))
        }
        "getAsset" => {
            let asset_key = arg(args, 1)?;
            let tx = Transaction::begin(store);
            let bytes = registry::get_asset(&tx, asset_key)?;
            tx.commit()?;
            Ok(Response::ok(StatusCode::Ok200, "asset found", Some(bytes)))
        }
        "deleteAsset" => {
            let asset_key = arg(args, 1)?;
            let mut tx = Transaction::begin(store);
            registry::delete_asset(&mut tx, asset_key)?;
            tx.commit()?;
            Ok(Response::ok(StatusCode::NoContent204, "asset deleted", None))
        }
        "getHistory" => {
            let key = arg(args, 1)?;
            let tx = Transaction::begin(store);
            let history = tx.history(key)?;
            tx.commit()?;
            let payload: Vec<HistoryEntryPayload> = history
                .into_iter()
                .map(|entry| HistoryEntryPayload {
                    transaction_id: entry.transaction_id,
                    value: entry.value,
                    timestamp: entry.timestamp,
                    is_delete: entry.is_delete,
                })
                .collect();
            Ok(Response::ok(StatusCode::Ok200, "history retrieved", Some(codec::encode(&payload)?)))
        }
        "customQueries" => Ok(Response::ok(
            StatusCode::NotImplemented501,
            "custom query engine is not implemented",
            None,
        )),
        other => Ok(Response::ok(
            StatusCode::NotImplemented501,
            format!("unknown operation: {other}"),
            None,
        )),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CreateParticipantPayload {
    #[serde(rename = "ParticipantID")]
    participant_id: String,
    participant_type: String,
    company_name: String,
    contact_email: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CreateProductPayload {
    #[serde(rename = "ProductID")]
    product_id: String,
    product_type: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RegisterMaterialPayload {
    #[serde(rename = "ParticipantID")]
    participant_id: String,
    #[serde(rename = "MaterialMasterID")]
    material_master_id: String,
    #[serde(rename = "ProductBCID")]
    product_bc_id: String,
    material_description: String,
    plant: String,
    storage_location: String,
    unit_of_measure: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CreateProductionOrderPayload {
    #[serde(rename = "POID")]
    po_id: String,
    #[serde(rename = "ParticipantID")]
    participant_id: String,
    #[serde(rename = "MaterialID")]
    material_id: String,
    quantity: u64,
    unit_of_measure: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CreatePurchaseOrderPayload {
    #[serde(rename = "POID")]
    po_id: String,
    #[serde(rename = "RequestorID")]
    requestor_id: String,
    #[serde(rename = "RequestorMaterialID")]
    requestor_material_id: String,
    #[serde(rename = "VendorID")]
    vendor_id: String,
    #[serde(rename = "VendorMaterialID")]
    vendor_material_id: String,
    vendor_batch_number: String,
    quantity: u64,
    unit_of_measure: String,
    net_price: f64,
    currency: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CreateShipmentPayload {
    #[serde(rename = "ShipmentID")]
    shipment_id: String,
    #[serde(rename = "ProductBCID")]
    product_bc_id: String,
    #[serde(rename = "POID")]
    po_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct TrackShipmentPayload {
    #[serde(rename = "ShipmentID")]
    shipment_id: String,
    latitude: f64,
    longitude: f64,
    accuracy: f64,
    timestamp: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SubmitGoodsReceiptPayload {
    #[serde(rename = "GRNumber")]
    gr_number: String,
    received_by: String,
    against: String,
    #[serde(rename = "POID")]
    po_id: String,
    batch_number: String,
    serial_numbers: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ContaminationPayload {
    #[serde(rename = "ParticipantID")]
    participant_id: String,
    #[serde(rename = "MaterialID")]
    material_id: String,
    batch_number: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct HistoryEntryPayload {
    transaction_id: u64,
    value: Option<Vec<u8>>,
    timestamp: String,
    is_delete: bool,
}
