//! Entity Registry (spec.md §2, §4.1): create/read/delete for Participants,
//! Products, Materials, Purchase Orders, Production Orders, Shipments, and
//! Goods Receipts. Every creation validates referenced ids, rejects
//! duplicate primary keys with `Conflict`, and writes within one
//! `storage::Transaction` so a multi-record create is all-or-nothing.

use tracing::info;

use crate::codec::{self, material_key, normalize_key};
use crate::error::{ConflictError, LedgerError, NotFoundError, Result, ValidationError};
use crate::model::{
    ContaminationStatus, GoodsReceipt, Material, Participant, ParticipantType, Product,
    ProductionOrder, PurchaseOrder, Shipment, ShipmentStatus,
};
use crate::storage::Transaction;

fn load<T: serde::de::DeserializeOwned>(tx: &Transaction, key: &str) -> Result<Option<T>> {
    match tx.get(key)? {
        Some(bytes) => Ok(Some(codec::decode(&bytes)?)),
        None => Ok(None),
    }
}

fn save<T: serde::Serialize>(tx: &mut Transaction, key: &str, value: &T) -> Result<()> {
    tx.put(key, codec::encode(value)?)
}

pub fn load_participant(tx: &Transaction, participant_id: &str) -> Result<Participant> {
    load(tx, participant_id)?
        .ok_or_else(|| LedgerError::NotFound(NotFoundError::Participant(participant_id.to_string())))
}

pub fn load_product(tx: &Transaction, product_id: &str) -> Result<Product> {
    load(tx, product_id)?
        .ok_or_else(|| LedgerError::NotFound(NotFoundError::Product(product_id.to_string())))
}

pub fn load_material(tx: &Transaction, material_id: &str) -> Result<Material> {
    load(tx, material_id)?
        .ok_or_else(|| LedgerError::NotFound(NotFoundError::Material(material_id.to_string())))
}

pub fn load_purchase_order(tx: &Transaction, po_id: &str) -> Result<PurchaseOrder> {
    load(tx, po_id)?
        .ok_or_else(|| LedgerError::NotFound(NotFoundError::PurchaseOrder(po_id.to_string())))
}

pub fn load_production_order(tx: &Transaction, po_id: &str) -> Result<ProductionOrder> {
    load(tx, po_id)?
        .ok_or_else(|| LedgerError::NotFound(NotFoundError::ProductionOrder(po_id.to_string())))
}

pub fn load_shipment(tx: &Transaction, shipment_id: &str) -> Result<Shipment> {
    load(tx, shipment_id)?
        .ok_or_else(|| LedgerError::NotFound(NotFoundError::Shipment(shipment_id.to_string())))
}

pub fn create_participant(
    tx: &mut Transaction,
    participant_id: &str,
    participant_type: &str,
    company_name: &str,
    contact_email: &str,
) -> Result<Participant> {
    let key = normalize_key(participant_id);
    if tx.get(&key)?.is_some() {
        return Err(LedgerError::Conflict(ConflictError::AlreadyExists {
            kind: "participant",
            id: participant_id.to_string(),
        }));
    }
    let ptype = ParticipantType::parse(participant_type)?;
    let participant = Participant::new(participant_id, ptype, company_name, contact_email);
    save(tx, &key, &participant)?;
    info!(participant_id, "created participant");
    Ok(participant)
}

pub fn create_product(tx: &mut Transaction, product_id: &str, product_type: &str) -> Result<Product> {
    let key = normalize_key(product_id);
    if tx.get(&key)?.is_some() {
        return Err(LedgerError::Conflict(ConflictError::AlreadyExists {
            kind: "product",
            id: product_id.to_string(),
        }));
    }
    let product = Product::new(product_id, product_type);
    save(tx, &key, &product)?;
    info!(product_id, "created product");
    Ok(product)
}

/// `registerMaterial` (spec.md §4.1): builds the material key, appends to
/// the owning Participant and Product sets, and writes all three records in
/// this one transaction.
pub fn register_material(
    tx: &mut Transaction,
    participant_id: &str,
    material_master_id: &str,
    product_bc_id: &str,
    material_description: &str,
    plant: &str,
    storage_location: &str,
    unit_of_measure: &str,
) -> Result<Material> {
    let mut participant = load_participant(tx, participant_id)?;
    let mut product = load_product(tx, product_bc_id)?;

    let material_id = Material::key_for(participant_id, material_master_id);
    let key = material_key(participant_id, material_master_id);
    if tx.get(&key)?.is_some() {
        return Err(LedgerError::Conflict(ConflictError::AlreadyExists {
            kind: "material",
            id: material_id,
        }));
    }
    if participant.has_material(&material_id) {
        return Err(LedgerError::Conflict(ConflictError::MaterialAlreadyOnParticipant(
            material_id,
        )));
    }
    if product.has_material(&material_id) {
        return Err(LedgerError::Conflict(ConflictError::MaterialAlreadyOnProduct(
            material_id,
        )));
    }

    let material = Material::new(
        participant_id,
        material_master_id,
        product_bc_id,
        material_description,
        plant,
        storage_location,
        unit_of_measure,
    );

    participant.materials.push(material_id.clone());
    product.all_materials.push(material_id.clone());

    save(tx, &key, &material)?;
    save(tx, &normalize_key(participant_id), &participant)?;
    save(tx, &normalize_key(product_bc_id), &product)?;
    info!(material_id, "registered material");
    Ok(material)
}

#[allow(clippy::too_many_arguments)]
pub fn create_purchase_order(
    tx: &mut Transaction,
    po_id: &str,
    requestor_id: &str,
    requestor_material_id: &str,
    vendor_id: &str,
    vendor_material_id: &str,
    vendor_batch_number: &str,
    quantity: u64,
    unit_of_measure: &str,
    net_price: f64,
    currency: &str,
) -> Result<PurchaseOrder> {
    let key = normalize_key(po_id);
    if tx.get(&key)?.is_some() {
        return Err(LedgerError::Conflict(ConflictError::AlreadyExists {
            kind: "purchase order",
            id: po_id.to_string(),
        }));
    }
    load_participant(tx, requestor_id)?;
    load_participant(tx, vendor_id)?;
    let vendor_material = load_material(tx, &material_key(vendor_id, vendor_material_id))?;
    if vendor_material.find_batch(vendor_batch_number).is_none() {
        return Err(LedgerError::NotFound(NotFoundError::Asset(format!(
            "vendor batch {vendor_batch_number} not found on material {}",
            vendor_material.material_id
        ))));
    }

    let po = PurchaseOrder::new(
        po_id,
        requestor_id,
        requestor_material_id,
        vendor_id,
        vendor_material_id,
        vendor_batch_number,
        quantity,
        unit_of_measure,
        net_price,
        currency,
    );
    save(tx, &key, &po)?;
    info!(po_id, "created purchase order");
    Ok(po)
}

pub fn create_production_order(
    tx: &mut Transaction,
    po_id: &str,
    participant_id: &str,
    material_id: &str,
    quantity: u64,
    unit_of_measure: &str,
) -> Result<ProductionOrder> {
    let key = normalize_key(po_id);
    if tx.get(&key)?.is_some() {
        return Err(LedgerError::Conflict(ConflictError::AlreadyExists {
            kind: "production order",
            id: po_id.to_string(),
        }));
    }
    load_participant(tx, participant_id)?;
    load_material(tx, &material_key(participant_id, material_id))?;

    let order = ProductionOrder::new(po_id, participant_id, material_id, quantity, unit_of_measure);
    save(tx, &key, &order)?;
    info!(po_id, "created production order");
    Ok(order)
}

/// `createShipment` debits the vendor Material and its batch now, per
/// spec.md §4.2 ("Vendor Material quantity is debited at Shipment
/// creation, not at receipt") and §9 Open Question 3.
pub fn create_shipment(
    tx: &mut Transaction,
    shipment_id: &str,
    product_bc_id: &str,
    po_id: &str,
) -> Result<Shipment> {
    let key = normalize_key(shipment_id);
    if tx.get(&key)?.is_some() {
        return Err(LedgerError::Conflict(ConflictError::AlreadyExists {
            kind: "shipment",
            id: shipment_id.to_string(),
        }));
    }
    let mut po = load_purchase_order(tx, po_id)?;
    if po.status != crate::model::OrderStatus::Open {
        return Err(LedgerError::Conflict(ConflictError::AlreadyCompleted(po_id.to_string())));
    }
    if po.shipment_exists {
        return Err(LedgerError::Conflict(ConflictError::ShipmentAlreadyExists(po_id.to_string())));
    }
    load_product(tx, product_bc_id)?;

    let vendor_material_key = material_key(&po.vendor_id, &po.vendor_material_id);
    let mut vendor_material = load_material(tx, &vendor_material_key)?;
    let batch = vendor_material
        .find_batch_mut(&po.vendor_batch_number)
        .ok_or_else(|| {
            LedgerError::NotFound(NotFoundError::Asset(format!(
                "vendor batch {} not found",
                po.vendor_batch_number
            )))
        })?;
    if batch.quantity < po.quantity {
        return Err(LedgerError::Validation(ValidationError::NegativeQuantity {
            what: format!("vendor batch {}", po.vendor_batch_number),
            quantity: po.quantity as i64,
        }));
    }
    batch.quantity -= po.quantity;
    vendor_material.total_quantity = vendor_material.total_quantity.saturating_sub(po.quantity);

    let shipment = Shipment::new(shipment_id, product_bc_id, po_id);
    po.shipment_exists = true;
    po.shipment_id = Some(shipment_id.to_string());

    save(tx, &vendor_material_key, &vendor_material)?;
    save(tx, &normalize_key(po_id), &po)?;
    save(tx, &key, &shipment)?;
    info!(shipment_id, po_id, "created shipment, debited vendor batch");
    Ok(shipment)
}

/// Supplemental operation (SPEC_FULL.md §4.5 / spec.md §9 Open Question 3):
/// releases a vendor batch's debited quantity when a shipment never
/// completes. Terminal: a cancelled shipment cannot be reopened.
pub fn cancel_shipment(tx: &mut Transaction, shipment_id: &str) -> Result<Shipment> {
    let mut shipment = load_shipment(tx, shipment_id)?;
    if shipment.status != ShipmentStatus::Shipping {
        return Err(LedgerError::Conflict(ConflictError::AlreadyCompleted(shipment_id.to_string())));
    }
    let mut po = load_purchase_order(tx, &shipment.po_id)?;
    if po.status != crate::model::OrderStatus::Open {
        return Err(LedgerError::Conflict(ConflictError::AlreadyCompleted(po.po_id.clone())));
    }

    let vendor_material_key = material_key(&po.vendor_id, &po.vendor_material_id);
    let mut vendor_material = load_material(tx, &vendor_material_key)?;
    match vendor_material.find_batch_mut(&po.vendor_batch_number) {
        Some(batch) => batch.quantity += po.quantity,
        None => {
            vendor_material.upsert_batch(
                &po.vendor_id,
                &vendor_material.material_id.clone(),
                &po.vendor_batch_number,
                Vec::new(),
                po.quantity,
                ContaminationStatus::Clean,
            );
        }
    }
    vendor_material.total_quantity += po.quantity;

    shipment.status = ShipmentStatus::Cancelled;
    po.shipment_exists = false;
    po.shipment_id = None;

    save(tx, &vendor_material_key, &vendor_material)?;
    save(tx, &normalize_key(&po.po_id.clone()), &po)?;
    save(tx, &normalize_key(shipment_id), &shipment)?;
    info!(shipment_id, "cancelled shipment, credited vendor batch back");
    Ok(shipment)
}

pub fn get_material(tx: &Transaction, material_id: &str) -> Result<Material> {
    load_material(tx, &normalize_key(material_id))
}

/// Admin escape hatch (spec.md §4.1): does not cascade. Rejects with
/// `Unauthorized` if `requested_by` does not own the material.
pub fn delete_material(tx: &mut Transaction, material_id: &str, requested_by: &str) -> Result<()> {
    let key = normalize_key(material_id);
    let material = load_material(tx, &key)?;
    if !material.participant_id.eq_ignore_ascii_case(requested_by) {
        return Err(LedgerError::Unauthorized(format!(
            "{requested_by} does not own material {material_id}"
        )));
    }
    tx.delete(&key)
}

pub fn get_asset(tx: &Transaction, asset_key: &str) -> Result<Vec<u8>> {
    tx.get(&normalize_key(asset_key))?
        .ok_or_else(|| LedgerError::NotFound(NotFoundError::Asset(asset_key.to_string())))
}

pub fn delete_asset(tx: &mut Transaction, asset_key: &str) -> Result<()> {
    let key = normalize_key(asset_key);
    if tx.get(&key)?.is_none() {
        return Err(LedgerError::NotFound(NotFoundError::Asset(asset_key.to_string())));
    }
    tx.delete(&key)
}

pub fn save_goods_receipt(tx: &mut Transaction, receipt: &GoodsReceipt) -> Result<()> {
    save(tx, &normalize_key(&receipt.gr_number), receipt)
}

pub fn save_participant(tx: &mut Transaction, participant: &Participant) -> Result<()> {
    save(tx, &normalize_key(&participant.participant_id), participant)
}

pub fn save_product(tx: &mut Transaction, product: &Product) -> Result<()> {
    save(tx, &normalize_key(&product.product_id), product)
}

pub fn save_material(tx: &mut Transaction, material: &Material) -> Result<()> {
    save(tx, &normalize_key(&material.material_id), material)
}

pub fn save_purchase_order(tx: &mut Transaction, po: &PurchaseOrder) -> Result<()> {
    save(tx, &normalize_key(&po.po_id), po)
}

pub fn save_production_order(tx: &mut Transaction, po: &ProductionOrder) -> Result<()> {
    save(tx, &normalize_key(&po.po_id), po)
}

pub fn save_shipment(tx: &mut Transaction, shipment: &Shipment) -> Result<()> {
    save(tx, &normalize_key(&shipment.shipment_id), shipment)
}
