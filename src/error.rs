//! Error handling for the provenance ledger
//!
//! Mirrors the error taxonomy of spec.md §7: one error kind per failure
//! class, each mapping to an HTTP-shaped status code at the dispatch
//! boundary.

use thiserror::Error;

/// Top-level error type for ledger operations.
#[derive(Error, Debug)]
pub enum LedgerError {
    /// Malformed payload, unknown enum variant, a quantity that would go
    /// negative, or any other caller-input problem.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// A referenced participant/product/material/order/shipment is missing.
    #[error("not found: {0}")]
    NotFound(#[from] NotFoundError),

    /// Primary-key collision, duplicate registration, or re-completion of
    /// an already-completed order.
    #[error("conflict: {0}")]
    Conflict(#[from] ConflictError),

    /// A delete where the caller does not own the asset. Spec.md §7 notes
    /// this reuses 400 rather than introducing 403 — a known quirk of the
    /// source design, preserved here rather than "fixed".
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Store read/write failure.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Payload JSON failed to parse.
    #[error("invalid JSON payload: {0}")]
    Json(#[from] serde_json::Error),
}

/// Validation-specific errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("missing required field: {0}")]
    MissingField(String),

    #[error("invalid participant type: {0}")]
    InvalidParticipantType(String),

    #[error("invalid goods receipt 'Against' value: {0}")]
    InvalidAgainst(String),

    #[error("quantity {quantity} would drive '{what}' below zero")]
    NegativeQuantity { what: String, quantity: i64 },

    #[error("{0}")]
    Other(String),
}

/// Not-found errors, one variant per entity kind so dispatch messages stay
/// specific (mirrors the original chaincode's per-entity "Does Not Exist"
/// messages).
#[derive(Error, Debug)]
pub enum NotFoundError {
    #[error("participant not found: {0}")]
    Participant(String),

    #[error("product not found: {0}")]
    Product(String),

    #[error("material not found: {0}")]
    Material(String),

    #[error("purchase order not found: {0}")]
    PurchaseOrder(String),

    #[error("production order not found: {0}")]
    ProductionOrder(String),

    #[error("shipment not found: {0}")]
    Shipment(String),

    #[error("asset not found: {0}")]
    Asset(String),
}

/// Conflict errors.
#[derive(Error, Debug)]
pub enum ConflictError {
    #[error("{kind} already exists: {id}")]
    AlreadyExists { kind: &'static str, id: String },

    #[error("material already registered with participant: {0}")]
    MaterialAlreadyOnParticipant(String),

    #[error("material already registered with product: {0}")]
    MaterialAlreadyOnProduct(String),

    #[error("{0} already completed")]
    AlreadyCompleted(String),

    #[error("shipment already exists for purchase order: {0}")]
    ShipmentAlreadyExists(String),
}

/// Storage-layer errors.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("key not found: {0}")]
    KeyNotFound(String),

    #[error("serialization failed: {0}")]
    Codec(String),

    #[error("transaction already committed or rolled back")]
    TransactionClosed,

    #[error("backend I/O error: {0}")]
    Io(String),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, LedgerError>;

/// HTTP-shaped status codes, per spec.md §6.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    Ok200,
    Created201,
    NoContent204,
    BadRequest400,
    NotFound404,
    Conflict409,
    InternalServerError500,
    NotImplemented501,
}

impl StatusCode {
    pub fn as_u16(self) -> u16 {
        match self {
            StatusCode::Ok200 => 200,
            StatusCode::Created201 => 201,
            StatusCode::NoContent204 => 204,
            StatusCode::BadRequest400 => 400,
            StatusCode::NotFound404 => 404,
            StatusCode::Conflict409 => 409,
            StatusCode::InternalServerError500 => 500,
            StatusCode::NotImplemented501 => 501,
        }
    }
}

impl LedgerError {
    /// Maps an error to the HTTP-shaped status code the dispatch boundary
    /// reports (spec.md §7).
    pub fn status_code(&self) -> StatusCode {
        match self {
            LedgerError::Validation(_) => StatusCode::BadRequest400,
            LedgerError::NotFound(_) => StatusCode::NotFound404,
            LedgerError::Conflict(_) => StatusCode::Conflict409,
            LedgerError::Unauthorized(_) => StatusCode::BadRequest400,
            LedgerError::Storage(_) => StatusCode::InternalServerError500,
            LedgerError::Json(_) => StatusCode::BadRequest400,
        }
    }
}
