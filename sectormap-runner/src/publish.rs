//! Publisher — maps enriched records to table rows and upserts them in
//! fixed-size batches.

use sectormap_core::domain::{EnrichedRecord, PublishedRow, Segment};
use sectormap_core::store::{RowStore, StoreError};
use serde::Serialize;
use thiserror::Error;

/// A batch upsert failed. Batches before it were already applied.
#[derive(Debug, Error)]
#[error("{segment}: upsert batch {batch}/{total_batches} failed after {rows_sent} rows: {source}")]
pub struct PublishError {
    pub segment: Segment,
    /// 1-based index of the failing batch.
    pub batch: usize,
    pub total_batches: usize,
    pub rows_sent: usize,
    #[source]
    pub source: StoreError,
}

/// What a publish call sent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PublishSummary {
    pub rows: usize,
    pub batches: usize,
}

pub fn to_rows(records: &[EnrichedRecord], segment: Segment) -> Vec<PublishedRow> {
    records
        .iter()
        .map(|r| PublishedRow::from_enriched(r, segment))
        .collect()
}

/// Upsert `records` for `segment` in batches of `batch_size` rows.
///
/// Empty input is a no-op. Stops at the first failing batch.
pub fn publish(
    records: &[EnrichedRecord],
    segment: Segment,
    store: &dyn RowStore,
    batch_size: usize,
) -> Result<PublishSummary, PublishError> {
    if records.is_empty() {
        tracing::info!(segment = %segment, "nothing to publish");
        return Ok(PublishSummary::default());
    }

    let rows = to_rows(records, segment);
    let batch_size = batch_size.max(1);
    let total_batches = rows.len().div_ceil(batch_size);
    let mut summary = PublishSummary::default();

    for (i, batch) in rows.chunks(batch_size).enumerate() {
        store.upsert(batch).map_err(|source| PublishError {
            segment,
            batch: i + 1,
            total_batches,
            rows_sent: summary.rows,
            source,
        })?;
        summary.rows += batch.len();
        summary.batches += 1;
        tracing::debug!(segment = %segment, batch = i + 1, total_batches, "batch upserted");
    }

    tracing::info!(
        segment = %segment,
        store = store.name(),
        rows = summary.rows,
        batches = summary.batches,
        "published"
    );
    Ok(summary)
}
