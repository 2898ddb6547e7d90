use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Length of every normalized exchange ticker code.
pub const TICKER_LEN: usize = 6;

/// A 6-character, left-zero-padded exchange ticker code (e.g. `005930`).
///
/// The only way to build one is [`TickerCode::normalize`], so every value in
/// circulation already satisfies the length invariant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct TickerCode(String);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TickerError {
    #[error("ticker code is empty")]
    Empty,

    #[error("ticker code '{0}' is longer than 6 characters")]
    TooLong(String),

    #[error("ticker code '{0}' contains non-alphanumeric characters")]
    InvalidChar(String),
}

impl TickerCode {
    /// Trim whitespace and left-pad with zeros to six characters.
    pub fn normalize(raw: &str) -> Result<Self, TickerError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(TickerError::Empty);
        }
        if !trimmed.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(TickerError::InvalidChar(trimmed.to_string()));
        }
        if trimmed.len() > TICKER_LEN {
            return Err(TickerError::TooLong(trimmed.to_string()));
        }
        Ok(Self(format!("{trimmed:0>width$}", width = TICKER_LEN)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TickerCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for TickerCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
