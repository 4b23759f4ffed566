//! File-backed key-value store.
//!
//! Each table is one JSON object file, `<dir>/<table>.json`, mapping keys to
//! the opaque value strings. Tables are loaded at open and the whole file is
//! rewritten on every mutation (write to a temp file, then rename), so a
//! crash mid-write leaves the previous file intact.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::RwLock;

use anyhow::{Context, Result};
use claim_engine::store::KvStore;
use indexmap::IndexMap;

type Table = IndexMap<String, String>;

pub struct JsonFileStore {
    dir: PathBuf,
    tables: RwLock<HashMap<String, Table>>,
}

impl JsonFileStore {
    /// Open (creating if needed) the store rooted at `dir`.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).with_context(|| format!("creating {}", dir.display()))?;

        let mut tables = HashMap::new();
        for entry in fs::read_dir(&dir).with_context(|| format!("listing {}", dir.display()))? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(table) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let text = fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))?;
            let entries: Table =
                serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))?;
            tracing::debug!("Loaded table '{}' ({} entries)", table, entries.len());
            tables.insert(table.to_string(), entries);
        }

        tracing::info!("Store opened at {} ({} tables)", dir.display(), tables.len());
        Ok(Self {
            dir,
            tables: RwLock::new(tables),
        })
    }

    fn table_path(&self, table: &str) -> PathBuf {
        self.dir.join(format!("{table}.json"))
    }

    fn flush(&self, table: &str, entries: &Table) -> Result<()> {
        let path = self.table_path(table);
        let tmp = path.with_extension("json.tmp");
        let text = serde_json::to_string_pretty(entries)?;
        fs::write(&tmp, text).with_context(|| format!("writing {}", tmp.display()))?;
        fs::rename(&tmp, &path).with_context(|| format!("replacing {}", path.display()))?;
        Ok(())
    }

    /// Apply `mutate` to a copy of the table, write it out, and only then
    /// swap it in.
    fn rewrite<R>(&self, table: &str, mutate: impl FnOnce(&mut Table) -> R) -> Result<R> {
        let mut tables = self.tables.write().expect("store tables poisoned");
        let mut entries = tables.get(table).cloned().unwrap_or_default();
        let result = mutate(&mut entries);
        self.flush(table, &entries)?;
        tables.insert(table.to_string(), entries);
        Ok(result)
    }
}

impl KvStore for JsonFileStore {
    fn get(&self, table: &str, key: &str) -> Result<Option<String>> {
        let tables = self.tables.read().expect("store tables poisoned");
        Ok(tables.get(table).and_then(|t| t.get(key)).cloned())
    }

    fn set(&self, table: &str, key: &str, value: String) -> Result<()> {
        self.rewrite(table, |entries| {
            entries.insert(key.to_string(), value);
        })
    }

    fn delete(&self, table: &str, key: &str) -> Result<bool> {
        if self.get(table, key)?.is_none() {
            return Ok(false);
        }
        self.rewrite(table, |entries| entries.shift_remove(key).is_some())
    }

    fn get_all(&self, table: &str) -> Result<Vec<(String, String)>> {
        let tables = self.tables.read().expect("store tables poisoned");
        Ok(tables
            .get(table)
            .map(|t| t.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fresh_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(name);
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn entries_survive_reopen() {
        let dir = fresh_dir("claim_store_reopen");
        {
            let store = JsonFileStore::open(&dir).unwrap();
            store.set("lands", "Home", r#"{"name":"Home"}"#.into()).unwrap();
            store.set("lands", "Farm", r#"{"name":"Farm"}"#.into()).unwrap();
            assert!(store.delete("lands", "Farm").unwrap());
            assert!(!store.delete("lands", "Farm").unwrap());
        }
        assert!(dir.join("lands.json").exists());
        assert!(!dir.join("lands.json.tmp").exists());

        let store = JsonFileStore::open(&dir).unwrap();
        assert_eq!(store.get("lands", "Home").unwrap().as_deref(), Some(r#"{"name":"Home"}"#));
        assert!(!store.has("lands", "Farm").unwrap());
        assert_eq!(store.get_all("lands").unwrap().len(), 1);
        assert!(store.get_all("other").unwrap().is_empty());

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn corrupt_table_fails_open() {
        let dir = fresh_dir("claim_store_corrupt");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("lands.json"), "not json").unwrap();
        assert!(JsonFileStore::open(&dir).is_err());
        let _ = fs::remove_dir_all(&dir);
    }
}
