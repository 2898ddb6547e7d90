//! SectorMap Runner — the per-segment reconciliation pipeline.
//!
//! This crate builds on `sectormap-core` to provide:
//! - Settings from an optional TOML file and store credentials from the environment
//! - The market merger (curated set ⋈ live listing, capitalization in trillions)
//! - The change enricher (batched price fetch, one-day change with 0.0 fallback)
//! - The batched upsert publisher
//! - `Pipeline`, which runs segments as failure-isolated units

pub mod config;
pub mod enrich;
pub mod merge;
pub mod pipeline;
pub mod publish;

pub use config::{credentials_from, credentials_from_env, ConfigError, Settings};
pub use enrich::{enrich, one_day_change_pct, Enrichment};
pub use merge::{market_cap_trillions, merge_listing, merge_segment};
pub use pipeline::{Degradation, Pipeline, RunReport, SegmentError, SegmentReport};
pub use publish::{publish, to_rows, PublishError, PublishSummary};
