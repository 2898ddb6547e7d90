//! Segment pipeline: curated load → listing merge → change enrichment → publish.
//!
//! Each segment is an independent unit. Degradations (missing curated file,
//! listing or price outage) are recorded in the segment report and the run
//! goes on; fatal errors stop only the segment they happen in.

use crate::config::Settings;
use crate::enrich::enrich;
use crate::merge::merge_segment;
use crate::publish::{publish, PublishError, PublishSummary};
use rayon::prelude::*;
use sectormap_core::data::{CuratedLoader, DataError, ListingProvider, PriceProvider};
use sectormap_core::domain::Segment;
use sectormap_core::store::RowStore;
use sectormap_core::Outcome;
use serde::Serialize;
use thiserror::Error;

/// A segment could not be completed.
#[derive(Debug, Error)]
pub enum SegmentError {
    #[error("{segment}: {stage} failed: {source}")]
    Data {
        segment: Segment,
        stage: &'static str,
        #[source]
        source: DataError,
    },

    #[error(transparent)]
    Publish(#[from] PublishError),
}

impl SegmentError {
    pub fn segment(&self) -> Segment {
        match self {
            SegmentError::Data { segment, .. } => *segment,
            SegmentError::Publish(e) => e.segment,
        }
    }
}

/// Which stage fell back to a default, and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Degradation {
    pub stage: &'static str,
    pub cause: String,
}

/// Counters for one completed segment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SegmentReport {
    pub segment: Segment,
    pub curated: usize,
    pub merged: usize,
    pub changes_resolved: usize,
    /// Price requests that failed; their records kept a 0.0 change.
    pub price_batches_failed: usize,
    pub published: PublishSummary,
    pub degradations: Vec<Degradation>,
}

impl SegmentReport {
    pub fn is_degraded(&self) -> bool {
        !self.degradations.is_empty()
    }
}

/// Results for every segment of a run, in the order requested.
#[derive(Debug)]
pub struct RunReport {
    pub segments: Vec<(Segment, Result<SegmentReport, SegmentError>)>,
}

impl RunReport {
    pub fn all_succeeded(&self) -> bool {
        self.segments.iter().all(|(_, r)| r.is_ok())
    }

    pub fn failures(&self) -> impl Iterator<Item = &SegmentError> {
        self.segments.iter().filter_map(|(_, r)| r.as_ref().err())
    }

    pub fn report_for(&self, segment: Segment) -> Option<&Result<SegmentReport, SegmentError>> {
        self.segments
            .iter()
            .find(|(s, _)| *s == segment)
            .map(|(_, r)| r)
    }

    pub fn rows_published(&self) -> usize {
        self.segments
            .iter()
            .filter_map(|(_, r)| r.as_ref().ok())
            .map(|r| r.published.rows)
            .sum()
    }
}

/// Wires the providers and the store into per-segment runs.
pub struct Pipeline<'a> {
    settings: &'a Settings,
    loader: CuratedLoader,
    listing: &'a dyn ListingProvider,
    prices: &'a dyn PriceProvider,
    store: &'a dyn RowStore,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        settings: &'a Settings,
        listing: &'a dyn ListingProvider,
        prices: &'a dyn PriceProvider,
        store: &'a dyn RowStore,
    ) -> Self {
        Self {
            settings,
            loader: CuratedLoader::new(settings.curated.columns()),
            listing,
            prices,
            store,
        }
    }

    /// Run one segment end to end.
    pub fn run_segment(&self, segment: Segment) -> Result<SegmentReport, SegmentError> {
        let mut degradations = Vec::new();
        let path = self.settings.curated.path_for(segment);
        tracing::info!(segment = %segment, path = %path.display(), "segment started");

        let curated = absorb(
            self.loader.load(&path),
            segment,
            "curated",
            &mut degradations,
        )?;

        let merged = absorb(
            merge_segment(
                segment,
                &curated,
                self.listing,
                &self.settings.listing.cap_aliases,
                &self.settings.curated.fallback_category,
            ),
            segment,
            "listing",
            &mut degradations,
        )?;
        let merged_count = merged.len();

        let enrichment = absorb(
            enrich(
                merged,
                self.prices,
                self.settings.prices.lookback_days,
                self.settings.prices.batch_size,
            ),
            segment,
            "prices",
            &mut degradations,
        )?;

        let published = publish(
            &enrichment.records,
            segment,
            self.store,
            self.settings.store.batch_size,
        )?;

        Ok(SegmentReport {
            segment,
            curated: curated.len(),
            merged: merged_count,
            changes_resolved: enrichment.resolved,
            price_batches_failed: enrichment.failed_batches,
            published,
            degradations,
        })
    }

    /// Run every segment in `segments`. A failing segment is logged and
    /// recorded; it never stops the others.
    pub fn run(&self, segments: &[Segment]) -> RunReport {
        let run_one = |segment: Segment| {
            let result = self.run_segment(segment);
            match &result {
                Ok(report) if report.is_degraded() => tracing::warn!(
                    segment = %segment,
                    rows = report.published.rows,
                    degradations = report.degradations.len(),
                    "segment completed with defaults"
                ),
                Ok(report) => tracing::info!(
                    segment = %segment,
                    rows = report.published.rows,
                    "segment completed"
                ),
                Err(e) => tracing::error!(segment = %segment, error = %e, "segment failed"),
            }
            (segment, result)
        };

        let segments: Vec<_> = if self.settings.run.parallel_segments {
            segments.par_iter().map(|&s| run_one(s)).collect()
        } else {
            segments.iter().map(|&s| run_one(s)).collect()
        };
        RunReport { segments }
    }
}

/// Unwrap a stage outcome, recording a degradation or turning a fatal cause
/// into a segment error.
fn absorb<T>(
    outcome: Outcome<T, DataError>,
    segment: Segment,
    stage: &'static str,
    degradations: &mut Vec<Degradation>,
) -> Result<T, SegmentError> {
    match outcome {
        Outcome::Complete(value) => Ok(value),
        Outcome::Degraded { value, cause } => {
            tracing::warn!(segment = %segment, stage, error = %cause, "stage degraded");
            degradations.push(Degradation {
                stage,
                cause: cause.to_string(),
            });
            Ok(value)
        }
        Outcome::Fatal(source) => Err(SegmentError::Data {
            segment,
            stage,
            source,
        }),
    }
}
