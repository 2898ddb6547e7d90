//! Supabase (PostgREST) row store.
//!
//! Upserts go to `POST {url}/rest/v1/{table}?on_conflict=code,market` with
//! `Prefer: resolution=merge-duplicates`, so a repeated batch updates the
//! existing rows in place.

use super::{RowStore, StoreError};
use crate::domain::PublishedRow;
use std::fmt;
use std::time::Duration;

/// Project URL and API key for the remote store.
#[derive(Clone, PartialEq, Eq)]
pub struct StoreCredentials {
    pub url: String,
    pub key: String,
}

impl fmt::Debug for StoreCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreCredentials")
            .field("url", &self.url)
            .field("key", &"<redacted>")
            .finish()
    }
}

/// PostgREST upsert client for one table.
pub struct SupabaseStore {
    client: reqwest::blocking::Client,
    credentials: StoreCredentials,
    table: String,
    on_conflict: String,
}

impl SupabaseStore {
    pub fn new(
        credentials: StoreCredentials,
        table: impl Into<String>,
        on_conflict: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, StoreError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StoreError::Transport(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            credentials,
            table: table.into(),
            on_conflict: on_conflict.into(),
        })
    }

    /// REST endpoint for upserts into the configured table.
    pub fn endpoint(&self) -> String {
        format!(
            "{}/rest/v1/{}?on_conflict={}",
            self.credentials.url.trim_end_matches('/'),
            self.table,
            self.on_conflict
        )
    }
}

impl RowStore for SupabaseStore {
    fn name(&self) -> &str {
        "supabase"
    }

    fn upsert(&self, rows: &[PublishedRow]) -> Result<(), StoreError> {
        if rows.is_empty() {
            return Ok(());
        }
        let body = serde_json::to_vec(rows)?;
        let resp = self
            .client
            .post(self.endpoint())
            .header("apikey", &self.credentials.key)
            .bearer_auth(&self.credentials.key)
            .header("Content-Type", "application/json")
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .body(body)
            .send()
            .map_err(|e| StoreError::Transport(e.to_string()))?;

        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }
        let body = resp.text().unwrap_or_default();
        Err(StoreError::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}
