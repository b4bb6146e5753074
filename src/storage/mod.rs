//! Transactional key/value store abstraction (spec.md §2 "Store
//! Abstraction"). `Transaction` adapts `core::atomic_operations`'s
//! begin/commit/rollback snapshot pattern from "clone the whole store" to
//! "clone the bytes behind each key this transaction touches" (spec.md §5).

use std::collections::HashMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::codec::normalize_key;
use crate::error::Result;

/// One entry in a key's change log, as returned by `Store::history` and
/// serialised for the `getHistory` dispatch operation (spec.md §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub transaction_id: u64,
    pub value: Option<Vec<u8>>,
    pub timestamp: String,
    pub is_delete: bool,
}

/// The transactional key/value interface every entity access goes through.
/// Keys are lowercased before lookup; values are opaque bytes (spec.md §2).
pub trait Store {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;
    fn put(&mut self, key: &str, value: Vec<u8>) -> Result<()>;
    fn delete(&mut self, key: &str) -> Result<()>;
    fn history(&self, key: &str) -> Result<Vec<HistoryEntry>>;
    fn query(&self, query: &str) -> Result<String>;
}

/// In-memory `Store` implementation. No example repo in the corpus wires an
/// embedded-database crate into this exact get/put/delete/history/query
/// shape, so this stays a plain `HashMap`-backed store rather than
/// fabricating a dependency (see DESIGN.md).
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: HashMap<String, Vec<u8>>,
    history: HashMap<String, Vec<HistoryEntry>>,
    next_tx_id: u64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn record_history(&mut self, key: &str, value: Option<Vec<u8>>, is_delete: bool) {
        let transaction_id = self.next_tx_id;
        self.next_tx_id += 1;
        self.history.entry(key.to_string()).or_default().push(HistoryEntry {
            transaction_id,
            value,
            timestamp: Utc::now().to_rfc3339(),
            is_delete,
        });
    }
}

impl Store for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.data.get(&normalize_key(key)).cloned())
    }

    fn put(&mut self, key: &str, value: Vec<u8>) -> Result<()> {
        let key = normalize_key(key);
        self.record_history(&key, Some(value.clone()), false);
        self.data.insert(key, value);
        Ok(())
    }

    fn delete(&mut self, key: &str) -> Result<()> {
        let key = normalize_key(key);
        self.record_history(&key, None, true);
        self.data.remove(&key);
        Ok(())
    }

    fn history(&self, key: &str) -> Result<Vec<HistoryEntry>> {
        Ok(self.history.get(&normalize_key(key)).cloned().unwrap_or_default())
    }

    /// `MemoryStore` has no query engine; `dispatch::customQueries` reports
    /// 501 before ever calling this.
    fn query(&self, query: &str) -> Result<String> {
        Ok(format!("unsupported query: {query}"))
    }
}

/// A single operation's unit of work against a `MemoryStore`. Reads observe
/// this transaction's own prior writes (they go straight to the backing
/// store); an uncommitted transaction restores every key it touched when
/// dropped, which is how an early `?` return becomes a rollback (spec.md §5).
pub struct Transaction<'a> {
    store: &'a mut MemoryStore,
    backup: HashMap<String, Option<Vec<u8>>>,
    done: bool,
}

impl<'a> Transaction<'a> {
    pub fn begin(store: &'a mut MemoryStore) -> Self {
        Self {
            store,
            backup: HashMap::new(),
            done: false,
        }
    }

    pub fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.store.get(key)
    }

    pub fn put(&mut self, key: &str, value: Vec<u8>) -> Result<()> {
        self.snapshot(key)?;
        self.store.put(key, value)
    }

    pub fn delete(&mut self, key: &str) -> Result<()> {
        self.snapshot(key)?;
        self.store.delete(key)
    }

    pub fn history(&self, key: &str) -> Result<Vec<HistoryEntry>> {
        self.store.history(key)
    }

    pub fn query(&self, query: &str) -> Result<String> {
        self.store.query(query)
    }

    fn snapshot(&mut self, key: &str) -> Result<()> {
        let key = normalize_key(key);
        if !self.backup.contains_key(&key) {
            let original = self.store.get(&key)?;
            self.backup.insert(key, original);
        }
        Ok(())
    }

    /// Flushes the transaction: every write already landed in the store as
    /// it happened, so committing is just discarding the rollback backup.
    pub fn commit(mut self) -> Result<()> {
        self.backup.clear();
        self.done = true;
        Ok(())
    }

    /// Explicit rollback. Equivalent to dropping the transaction without
    /// calling `commit`.
    pub fn rollback(mut self) {
        self.restore();
        self.done = true;
    }

    fn restore(&mut self) {
        for (key, original) in self.backup.drain() {
            match original {
                Some(bytes) => {
                    let _ = self.store.put(&key, bytes);
                }
                None => {
                    let _ = self.store.delete(&key);
                }
            }
        }
    }
}

impl<'a> Drop for Transaction<'a> {
    fn drop(&mut self) {
        if !self.done {
            self.restore();
        }
    }
}
