//! Remote row stores that published rows are upserted into.

pub mod memory;
pub mod supabase;

pub use memory::MemoryStore;
pub use supabase::{StoreCredentials, SupabaseStore};

use crate::domain::PublishedRow;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store transport error: {0}")]
    Transport(String),

    #[error("store rejected upsert (HTTP {status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("failed to serialize rows: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// A table that accepts batched upserts keyed by (`code`, `market`).
///
/// Applying the same batch twice must leave the table in the same state.
pub trait RowStore: Send + Sync {
    fn name(&self) -> &str;

    fn upsert(&self, rows: &[PublishedRow]) -> Result<(), StoreError>;
}
