//! Row types flowing through a segment run, from the curated file to the
//! published table row.

use super::segment::{Exchange, Segment};
use super::ticker::TickerCode;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// One tracked ticker from a curated file, with its manual sector label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CuratedEntry {
    pub ticker_code: TickerCode,
    /// `None` when the curated row left the label blank.
    pub sector_label: Option<String>,
}

/// Curated entries for one segment, deduplicated by ticker code.
///
/// Insertion order is preserved and the first occurrence of a code wins.
#[derive(Debug, Clone, Default)]
pub struct CuratedSet {
    entries: Vec<CuratedEntry>,
    index: HashMap<TickerCode, usize>,
}

impl CuratedSet {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a set from raw entries. Returns the set and the number of
    /// duplicate rows that were dropped.
    pub fn from_entries(entries: impl IntoIterator<Item = CuratedEntry>) -> (Self, usize) {
        let mut set = Self::default();
        let mut dropped = 0;
        for entry in entries {
            if !set.insert(entry) {
                dropped += 1;
            }
        }
        (set, dropped)
    }

    /// Insert an entry unless its code is already present.
    pub fn insert(&mut self, entry: CuratedEntry) -> bool {
        if self.index.contains_key(&entry.ticker_code) {
            return false;
        }
        self.index
            .insert(entry.ticker_code.clone(), self.entries.len());
        self.entries.push(entry);
        true
    }

    pub fn get(&self, code: &TickerCode) -> Option<&CuratedEntry> {
        self.index.get(code).map(|&i| &self.entries[i])
    }

    pub fn contains(&self, code: &TickerCode) -> bool {
        self.index.contains_key(code)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CuratedEntry> {
        self.entries.iter()
    }
}

/// One row of a live exchange listing.
///
/// Besides the identifying columns the provider keeps every other field it
/// received, keyed by listing field name, so capitalization can be resolved
/// through an alias list.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingRecord {
    pub ticker_code: TickerCode,
    pub display_name: String,
    /// Market label as reported by the listing ("KOSPI", "KOSDAQ GLOBAL", ...).
    pub market: Option<String>,
    pub fields: BTreeMap<String, serde_json::Value>,
}

/// A curated ticker that is still listed, with derived capitalization.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedRecord {
    pub ticker_code: TickerCode,
    pub display_name: String,
    pub sector_label: String,
    pub exchange: Option<Exchange>,
    /// Market capitalization in trillions of won; 0.0 when unavailable.
    pub market_cap_trillions: f64,
}

/// A merged record with its one-day percentage change.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedRecord {
    pub record: MergedRecord,
    /// One-day change in percent; 0.0 when it could not be resolved.
    pub change_ratio_pct: f64,
}

impl EnrichedRecord {
    /// Wrap a merged record with the unresolved default change.
    pub fn unresolved(record: MergedRecord) -> Self {
        Self {
            record,
            change_ratio_pct: 0.0,
        }
    }
}

/// Row schema of the remote `stocks` table, keyed by (`code`, `market`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishedRow {
    pub code: String,
    pub name: String,
    pub category: String,
    /// Market capitalization in trillions.
    pub marcap: f64,
    pub change_ratio: f64,
    pub market: String,
}

impl PublishedRow {
    /// Map an enriched record to the table schema. Non-finite numbers are
    /// replaced with 0.0 so the row never carries NaN or infinity.
    pub fn from_enriched(enriched: &EnrichedRecord, segment: Segment) -> Self {
        let record = &enriched.record;
        Self {
            code: record.ticker_code.as_str().to_string(),
            name: record.display_name.clone(),
            category: record.sector_label.clone(),
            marcap: finite_or_zero(record.market_cap_trillions),
            change_ratio: finite_or_zero(enriched.change_ratio_pct),
            market: segment.label().to_string(),
        }
    }

    /// Upsert identity of the row.
    pub fn key(&self) -> (String, String) {
        (self.code.clone(), self.market.clone())
    }
}

fn finite_or_zero(v: f64) -> f64 {
    if v.is_finite() {
        v
    } else {
        0.0
    }
}
