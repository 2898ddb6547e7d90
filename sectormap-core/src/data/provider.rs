//! Provider traits and structured error types.
//!
//! `ListingProvider` and `PriceProvider` abstract over the live exchange
//! listing and the price-history source so the pipeline can be driven by
//! fakes in tests.

use crate::domain::{Exchange, ListingRecord, TickerCode};
use std::collections::HashMap;
use std::path::PathBuf;
use thiserror::Error;

/// Structured error types for data operations.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("authentication required: {0}")]
    AuthenticationRequired(String),

    #[error("hard stop: data provider has blocked requests (circuit breaker tripped)")]
    CircuitBreakerTripped,

    #[error("curated file not found: {}", path.display())]
    MissingCuratedFile { path: PathBuf },

    #[error("cannot decode {} as UTF-8 or CP949", path.display())]
    DecodeFailure { path: PathBuf },

    #[error("{}: none of the columns {tried:?} found in header", path.display())]
    MissingColumn { path: PathBuf, tried: Vec<String> },

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("data error: {0}")]
    Other(String),
}

/// Trait for live exchange listing sources.
pub trait ListingProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Fetch every currently-listed ticker on `exchange`, in listing order.
    fn fetch_listing(&self, exchange: Exchange) -> Result<Vec<ListingRecord>, DataError>;
}

/// Daily closing prices per provider symbol, oldest first.
///
/// Gaps (non-trading days, missing quotes) are kept as `None` so callers can
/// decide what counts as a valid close.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClosingPrices {
    by_symbol: HashMap<String, Vec<Option<f64>>>,
}

impl ClosingPrices {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, symbol: impl Into<String>, closes: Vec<Option<f64>>) {
        self.by_symbol.insert(symbol.into(), closes);
    }

    pub fn get(&self, symbol: &str) -> Option<&[Option<f64>]> {
        self.by_symbol.get(symbol).map(|v| v.as_slice())
    }

    pub fn extend(&mut self, other: ClosingPrices) {
        self.by_symbol.extend(other.by_symbol);
    }

    pub fn len(&self) -> usize {
        self.by_symbol.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_symbol.is_empty()
    }
}

/// Trait for daily price-history sources.
pub trait PriceProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Fetch recent daily closes for several symbols in one request.
    ///
    /// Symbols the provider does not know are simply absent from the result.
    fn fetch_closes(
        &self,
        symbols: &[String],
        lookback_days: u32,
    ) -> Result<ClosingPrices, DataError>;

    /// Provider symbol for a ticker: `.KS` for KOSPI, `.KQ` for KOSDAQ,
    /// `.KS` when the exchange is unknown.
    fn symbol_for(&self, code: &TickerCode, exchange: Option<Exchange>) -> String {
        let suffix = match exchange {
            Some(Exchange::Kosdaq) => "KQ",
            Some(Exchange::Kospi) | None => "KS",
        };
        format!("{code}.{suffix}")
    }
}
