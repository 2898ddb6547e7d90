//! Property tests for the merge and change invariants.
//!
//! Uses proptest to verify:
//! 1. The merge is an inner join in listing order with no repeated ticker
//! 2. Every merged record's sector is the curated label or the fallback
//! 3. One-day change is finite whenever it resolves

use proptest::prelude::*;
use sectormap_core::domain::{CuratedEntry, CuratedSet, ListingRecord, TickerCode};
use sectormap_core::fields::FieldAliases;
use sectormap_runner::{merge_listing, one_day_change_pct};
use std::collections::{BTreeMap, HashSet};

const FALLBACK: &str = "기타";

// ── Strategies (proptest) ────────────────────────────────────────────

/// Codes drawn from a small pool so curated and listing sides overlap.
fn arb_code() -> impl Strategy<Value = TickerCode> {
    (0u32..40).prop_map(|n| TickerCode::normalize(&n.to_string()).unwrap())
}

fn arb_curated() -> impl Strategy<Value = Vec<(TickerCode, Option<String>)>> {
    prop::collection::vec((arb_code(), prop::option::of("[가-힣]{1,4}")), 0..30)
}

fn arb_listing() -> impl Strategy<Value = Vec<ListingRecord>> {
    prop::collection::vec(arb_code(), 0..50).prop_map(|codes| {
        codes
            .into_iter()
            .enumerate()
            .map(|(i, ticker_code)| ListingRecord {
                ticker_code,
                display_name: format!("listed {i}"),
                market: Some("KOSPI".into()),
                fields: BTreeMap::new(),
            })
            .collect()
    })
}

fn arb_closes() -> impl Strategy<Value = Vec<Option<f64>>> {
    prop::collection::vec(
        prop::option::of(prop_oneof![Just(f64::NAN), Just(0.0), 1.0..1.0e6_f64]),
        0..8,
    )
}

fn build_set(entries: &[(TickerCode, Option<String>)]) -> CuratedSet {
    CuratedSet::from_entries(entries.iter().map(|(code, label)| CuratedEntry {
        ticker_code: code.clone(),
        sector_label: label.clone(),
    }))
    .0
}

// ── 1–2. Inner join ──────────────────────────────────────────────────

proptest! {
    #[test]
    fn merge_is_an_ordered_inner_join(curated in arb_curated(), listing in arb_listing()) {
        let set = build_set(&curated);
        let merged = merge_listing(&set, &listing, &FieldAliases::market_cap(), FALLBACK);

        let mut expected = Vec::new();
        let mut seen = HashSet::new();
        for row in &listing {
            if set.contains(&row.ticker_code) && seen.insert(row.ticker_code.clone()) {
                expected.push(row.ticker_code.clone());
            }
        }
        let actual: Vec<TickerCode> = merged.iter().map(|m| m.ticker_code.clone()).collect();
        prop_assert_eq!(actual, expected);
    }

    #[test]
    fn merged_sector_is_curated_or_fallback(curated in arb_curated(), listing in arb_listing()) {
        let set = build_set(&curated);
        let merged = merge_listing(&set, &listing, &FieldAliases::market_cap(), FALLBACK);
        for m in &merged {
            let entry = set.get(&m.ticker_code).unwrap();
            let want = entry.sector_label.as_deref().unwrap_or(FALLBACK);
            prop_assert_eq!(m.sector_label.as_str(), want);
            prop_assert_eq!(m.market_cap_trillions, 0.0);
        }
    }
}

// ── 3. Change ────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn resolved_change_is_finite(closes in arb_closes()) {
        if let Some(pct) = one_day_change_pct(&closes) {
            prop_assert!(pct.is_finite());
        }
    }
}
