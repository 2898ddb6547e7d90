//! In-process row store, used for dry runs and tests.

use super::{RowStore, StoreError};
use crate::domain::PublishedRow;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

/// Row store holding the table in memory, keyed by (`code`, `market`).
#[derive(Debug, Default)]
pub struct MemoryStore {
    rows: Mutex<BTreeMap<(String, String), PublishedRow>>,
    upsert_calls: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn table(&self) -> MutexGuard<'_, BTreeMap<(String, String), PublishedRow>> {
        self.rows.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn len(&self) -> usize {
        self.table().len()
    }

    pub fn is_empty(&self) -> bool {
        self.table().is_empty()
    }

    pub fn get(&self, code: &str, market: &str) -> Option<PublishedRow> {
        self.table()
            .get(&(code.to_string(), market.to_string()))
            .cloned()
    }

    /// All stored rows, ordered by (`code`, `market`).
    pub fn snapshot(&self) -> Vec<PublishedRow> {
        self.table().values().cloned().collect()
    }

    /// Number of `upsert` calls received (one per batch).
    pub fn upsert_calls(&self) -> usize {
        self.upsert_calls.load(Ordering::SeqCst)
    }
}

impl RowStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    fn upsert(&self, rows: &[PublishedRow]) -> Result<(), StoreError> {
        self.upsert_calls.fetch_add(1, Ordering::SeqCst);
        let mut table = self.table();
        for row in rows {
            table.insert(row.key(), row.clone());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(code: &str, market: &str, change: f64) -> PublishedRow {
        PublishedRow {
            code: code.into(),
            name: "n".into(),
            category: "c".into(),
            marcap: 1.0,
            change_ratio: change,
            market: market.into(),
        }
    }

    #[test]
    fn upsert_overwrites_same_key() {
        let store = MemoryStore::new();
        store.upsert(&[row("005930", "KOSPI200", 1.0)]).unwrap();
        store.upsert(&[row("005930", "KOSPI200", 2.0)]).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("005930", "KOSPI200").unwrap().change_ratio, 2.0);
        assert_eq!(store.upsert_calls(), 2);
    }

    #[test]
    fn same_code_in_two_markets_is_two_rows() {
        let store = MemoryStore::new();
        store
            .upsert(&[row("005930", "KOSPI200", 1.0), row("005930", "KOSDAQ150", 1.0)])
            .unwrap();
        assert_eq!(store.len(), 2);
    }
}
