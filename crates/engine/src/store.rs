//! Opaque key-value persistence, one logical table per record kind.
//!
//! The store enforces no schema; every invariant on the values lives in the
//! repository that owns the table.

use std::collections::HashMap;
use std::sync::RwLock;

use anyhow::Result;
use indexmap::IndexMap;

pub trait KvStore: Send + Sync {
    fn get(&self, table: &str, key: &str) -> Result<Option<String>>;

    fn set(&self, table: &str, key: &str, value: String) -> Result<()>;

    /// Returns whether the key existed.
    fn delete(&self, table: &str, key: &str) -> Result<bool>;

    /// All entries of a table, in insertion order.
    fn get_all(&self, table: &str) -> Result<Vec<(String, String)>>;

    fn has(&self, table: &str, key: &str) -> Result<bool> {
        Ok(self.get(table, key)?.is_some())
    }
}

/// Process-local store. Nothing survives a restart.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<HashMap<String, IndexMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvStore for MemoryStore {
    fn get(&self, table: &str, key: &str) -> Result<Option<String>> {
        let tables = self.tables.read().expect("memory store poisoned");
        Ok(tables.get(table).and_then(|t| t.get(key)).cloned())
    }

    fn set(&self, table: &str, key: &str, value: String) -> Result<()> {
        self.tables
            .write()
            .expect("memory store poisoned")
            .entry(table.to_string())
            .or_default()
            .insert(key.to_string(), value);
        Ok(())
    }

    fn delete(&self, table: &str, key: &str) -> Result<bool> {
        let mut tables = self.tables.write().expect("memory store poisoned");
        Ok(tables
            .get_mut(table)
            .is_some_and(|t| t.shift_remove(key).is_some()))
    }

    fn get_all(&self, table: &str) -> Result<Vec<(String, String)>> {
        let tables = self.tables.read().expect("memory store poisoned");
        Ok(tables
            .get(table)
            .map(|t| t.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tables_are_isolated() {
        let store = MemoryStore::new();
        store.set("lands", "Home", "1".into()).unwrap();
        assert!(store.has("lands", "Home").unwrap());
        assert!(!store.has("wallets", "Home").unwrap());
    }

    #[test]
    fn delete_reports_presence_and_keeps_order() {
        let store = MemoryStore::new();
        for key in ["a", "b", "c"] {
            store.set("t", key, key.to_uppercase()).unwrap();
        }
        assert!(store.delete("t", "b").unwrap());
        assert!(!store.delete("t", "b").unwrap());
        let keys: Vec<String> = store.get_all("t").unwrap().into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["a", "c"]);
    }
}
