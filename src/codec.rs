//! Bidirectional serialisation of entity records to/from store byte blobs,
//! and the key-normalisation helper every store access goes through
//! (spec.md §2 "Entity Codec").

use serde::{de::DeserializeOwned, Serialize};

use crate::error::{LedgerError, StorageError};

/// Lowercases a caller-supplied id before it touches the store (spec.md §3:
/// "All identifiers are case-insensitive strings; the store normalises to
/// lowercase before lookup.").
pub fn normalize_key(raw: &str) -> String {
    raw.to_ascii_lowercase()
}

/// Builds the Material key `<ParticipantID>-<MaterialMasterID>`, normalised.
pub fn material_key(participant_id: &str, material_master_id: &str) -> String {
    normalize_key(&format!("{}-{}", participant_id, material_master_id))
}

/// Serialises an entity record to the bytes the store persists under a key.
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, LedgerError> {
    serde_json::to_vec(value)
        .map_err(|e| LedgerError::Storage(StorageError::Codec(e.to_string())))
}

/// Deserialises bytes read from the store back into an entity record.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, LedgerError> {
    serde_json::from_slice(bytes).map_err(|e| LedgerError::Storage(StorageError::Codec(e.to_string())))
}
