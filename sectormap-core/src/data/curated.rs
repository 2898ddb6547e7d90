//! Curated set loader — the locally maintained ticker → sector table.
//!
//! Curated files are CSV exports edited by hand, so they arrive either as
//! UTF-8 (optionally with a BOM) or as CP949 from spreadsheet tools. The
//! ticker and sector columns are located through ordered header aliases.

use super::provider::DataError;
use crate::domain::{CuratedEntry, CuratedSet, TickerCode};
use crate::outcome::Outcome;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::path::Path;

/// Header names accepted for the ticker and sector columns, in priority order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CuratedColumns {
    pub ticker: Vec<String>,
    pub sector: Vec<String>,
}

impl Default for CuratedColumns {
    fn default() -> Self {
        Self {
            ticker: vec!["종목코드".into(), "ticker_code".into(), "Code".into()],
            sector: vec!["내분류".into(), "sector_label".into(), "Sector".into()],
        }
    }
}

/// Text encoding a curated file was read with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceEncoding {
    Utf8,
    Cp949,
}

/// Decode curated file bytes: UTF-8 first (BOM stripped), CP949 second.
pub fn decode_text(bytes: &[u8]) -> Option<(Cow<'_, str>, SourceEncoding)> {
    let body = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    if let Ok(text) = std::str::from_utf8(body) {
        return Some((Cow::Borrowed(text), SourceEncoding::Utf8));
    }
    encoding_rs::EUC_KR
        .decode_without_bom_handling_and_without_replacement(bytes)
        .map(|text| (text, SourceEncoding::Cp949))
}

/// Loads curated files into a [`CuratedSet`].
#[derive(Debug, Clone, Default)]
pub struct CuratedLoader {
    columns: CuratedColumns,
}

impl CuratedLoader {
    pub fn new(columns: CuratedColumns) -> Self {
        Self { columns }
    }

    /// Load the curated set at `path`.
    ///
    /// A missing file is degraded to an empty set. Undecodable bytes and a
    /// header without the required columns are fatal.
    pub fn load(&self, path: &Path) -> Outcome<CuratedSet, DataError> {
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Outcome::degraded(
                    CuratedSet::empty(),
                    DataError::MissingCuratedFile {
                        path: path.to_path_buf(),
                    },
                );
            }
            Err(e) => return Outcome::Fatal(DataError::Io(e)),
        };

        let Some((text, encoding)) = decode_text(&bytes) else {
            return Outcome::Fatal(DataError::DecodeFailure {
                path: path.to_path_buf(),
            });
        };
        if encoding == SourceEncoding::Cp949 {
            tracing::debug!(path = %path.display(), "curated file decoded as CP949");
        }

        self.parse(&text, path).into()
    }

    /// Parse decoded CSV text. `source` is only used in error messages.
    pub fn parse(&self, text: &str, source: &Path) -> Result<CuratedSet, DataError> {
        if text.trim().is_empty() {
            return Ok(CuratedSet::empty());
        }

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(text.as_bytes());

        let headers = reader.headers()?.clone();
        let rows: Vec<csv::StringRecord> = reader.records().collect::<Result<_, _>>()?;
        if rows.is_empty() {
            return Ok(CuratedSet::empty());
        }

        let ticker_idx = find_column(&headers, &self.columns.ticker, source)?;
        let sector_idx = find_column(&headers, &self.columns.sector, source)?;

        let mut entries = Vec::with_capacity(rows.len());
        for (line, row) in rows.iter().enumerate() {
            let raw = row.get(ticker_idx).unwrap_or_default();
            let ticker_code = match TickerCode::normalize(raw) {
                Ok(code) => code,
                Err(e) => {
                    tracing::warn!(
                        path = %source.display(),
                        row = line + 1,
                        error = %e,
                        "skipping curated row"
                    );
                    continue;
                }
            };
            let sector_label = row
                .get(sector_idx)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from);
            entries.push(CuratedEntry {
                ticker_code,
                sector_label,
            });
        }

        let (set, dropped) = CuratedSet::from_entries(entries);
        if dropped > 0 {
            tracing::debug!(path = %source.display(), dropped, "dropped duplicate curated tickers");
        }
        Ok(set)
    }
}

fn find_column(
    headers: &csv::StringRecord,
    aliases: &[String],
    source: &Path,
) -> Result<usize, DataError> {
    aliases
        .iter()
        .find_map(|alias| headers.iter().position(|h| h == alias))
        .ok_or_else(|| DataError::MissingColumn {
            path: source.to_path_buf(),
            tried: aliases.to_vec(),
        })
}
