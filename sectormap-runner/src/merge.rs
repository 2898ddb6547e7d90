//! Market merger — joins a curated set against the live listing.
//!
//! Only tickers present on both sides survive (inner join), in listing
//! order. Capitalization is resolved through the configured alias list and
//! converted to trillions.

use sectormap_core::data::{DataError, ListingProvider};
use sectormap_core::domain::{CuratedSet, Exchange, ListingRecord, MergedRecord, Segment};
use sectormap_core::fields::{coerce_number, FieldAliases};
use sectormap_core::Outcome;
use std::collections::HashSet;

const TRILLION: f64 = 1_000_000_000_000.0;

/// Market capitalization of a listing row in trillions. Missing or
/// non-numeric values give 0.0.
pub fn market_cap_trillions(record: &ListingRecord, aliases: &FieldAliases) -> f64 {
    match aliases.resolve(&record.fields) {
        Ok((_, value)) => coerce_number(value).map_or(0.0, |raw| raw / TRILLION),
        Err(_) => 0.0,
    }
}

/// Inner-join `curated` with `listing` on ticker code.
///
/// A code listed twice keeps its first listing row, so the output never
/// repeats a ticker.
pub fn merge_listing(
    curated: &CuratedSet,
    listing: &[ListingRecord],
    aliases: &FieldAliases,
    fallback_category: &str,
) -> Vec<MergedRecord> {
    let mut seen = HashSet::new();
    listing
        .iter()
        .filter_map(|row| {
            let entry = curated.get(&row.ticker_code)?;
            if !seen.insert(row.ticker_code.clone()) {
                return None;
            }
            Some(MergedRecord {
                ticker_code: row.ticker_code.clone(),
                display_name: row.display_name.clone(),
                sector_label: entry
                    .sector_label
                    .clone()
                    .unwrap_or_else(|| fallback_category.to_string()),
                exchange: row.market.as_deref().and_then(Exchange::from_market_label),
                market_cap_trillions: market_cap_trillions(row, aliases),
            })
        })
        .collect()
}

/// Fetch the segment's listing and join it with `curated`.
///
/// An empty curated set short-circuits without touching the provider. A
/// listing failure degrades to an empty merge so the next segment still runs.
pub fn merge_segment(
    segment: Segment,
    curated: &CuratedSet,
    provider: &dyn ListingProvider,
    aliases: &FieldAliases,
    fallback_category: &str,
) -> Outcome<Vec<MergedRecord>, DataError> {
    if curated.is_empty() {
        return Outcome::Complete(Vec::new());
    }

    let listing = match provider.fetch_listing(segment.exchange()) {
        Ok(listing) => listing,
        Err(e) => {
            tracing::warn!(
                segment = %segment,
                provider = provider.name(),
                error = %e,
                "listing fetch failed, skipping merge"
            );
            return Outcome::degraded(Vec::new(), e);
        }
    };

    let merged = merge_listing(curated, &listing, aliases, fallback_category);
    tracing::info!(
        segment = %segment,
        curated = curated.len(),
        listed = listing.len(),
        merged = merged.len(),
        "merged curated set with listing"
    );
    Outcome::Complete(merged)
}
