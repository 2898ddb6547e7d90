//! Change enricher — one-day percentage change from recent daily closes.
//!
//! Symbols are requested from the price provider in chunks. A chunk that
//! fails leaves its records at 0.0 change and marks the result degraded; it
//! never fails the segment.

use sectormap_core::data::{ClosingPrices, DataError, PriceProvider};
use sectormap_core::domain::{EnrichedRecord, MergedRecord};
use sectormap_core::Outcome;
use std::collections::HashSet;

/// Enriched records plus counters for the segment report.
#[derive(Debug, Clone, PartialEq)]
pub struct Enrichment {
    pub records: Vec<EnrichedRecord>,
    /// Records whose change was computed from provider data.
    pub resolved: usize,
    /// Provider requests that failed.
    pub failed_batches: usize,
}

/// Percentage change between the last two valid closes.
///
/// Gaps and non-finite values are skipped. Fewer than two valid closes, or a
/// zero previous close, gives `None`.
pub fn one_day_change_pct(closes: &[Option<f64>]) -> Option<f64> {
    let mut previous = None;
    let mut latest = None;
    for close in closes.iter().flatten().copied().filter(|c| c.is_finite()) {
        previous = latest;
        latest = Some(close);
    }
    let (previous, latest) = (previous?, latest?);
    if previous == 0.0 {
        return None;
    }
    let pct = (latest - previous) / previous * 100.0;
    pct.is_finite().then_some(pct)
}

/// Attach a one-day change to every record.
pub fn enrich(
    records: Vec<MergedRecord>,
    provider: &dyn PriceProvider,
    lookback_days: u32,
    batch_size: usize,
) -> Outcome<Enrichment, DataError> {
    if records.is_empty() {
        return Outcome::Complete(Enrichment {
            records: Vec::new(),
            resolved: 0,
            failed_batches: 0,
        });
    }

    let symbols: Vec<String> = records
        .iter()
        .map(|r| provider.symbol_for(&r.ticker_code, r.exchange))
        .collect();

    let mut seen = HashSet::new();
    let mut unique = Vec::with_capacity(symbols.len());
    for symbol in &symbols {
        if seen.insert(symbol.as_str()) {
            unique.push(symbol.clone());
        }
    }

    let mut prices = ClosingPrices::new();
    let mut failed_batches = 0;
    let mut first_failure = None;
    for chunk in unique.chunks(batch_size.max(1)) {
        match provider.fetch_closes(chunk, lookback_days) {
            Ok(batch) => prices.extend(batch),
            Err(e) => {
                tracing::warn!(
                    provider = provider.name(),
                    symbols = chunk.len(),
                    error = %e,
                    "price fetch failed, changes default to 0"
                );
                failed_batches += 1;
                first_failure.get_or_insert(e);
            }
        }
    }

    let mut resolved = 0;
    let enriched: Vec<EnrichedRecord> = records
        .into_iter()
        .zip(&symbols)
        .map(|(record, symbol)| {
            match prices.get(symbol).and_then(one_day_change_pct) {
                Some(change) => {
                    resolved += 1;
                    EnrichedRecord {
                        record,
                        change_ratio_pct: change,
                    }
                }
                None => EnrichedRecord::unresolved(record),
            }
        })
        .collect();

    let enrichment = Enrichment {
        records: enriched,
        resolved,
        failed_batches,
    };
    match first_failure {
        Some(cause) => Outcome::degraded(enrichment, cause),
        None => Outcome::Complete(enrichment),
    }
}
