//! Ordered field-alias resolution for loosely-typed provider rows.
//!
//! Listing providers do not agree on what they call market capitalization.
//! An alias list names the accepted field names in priority order; the first
//! one present in a row wins, even if its value later fails to parse.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

/// Capitalization field names, in priority order.
pub const DEFAULT_CAP_ALIASES: [&str; 4] = ["Marcap", "MarCap", "MarketCap", "Amount"];

/// None of the aliases were present in a row.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("none of the fields {tried:?} are present")]
pub struct FieldNotFound {
    pub tried: Vec<String>,
}

/// Ordered list of accepted names for one logical field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldAliases(Vec<String>);

impl FieldAliases {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(names.into_iter().map(Into::into).collect())
    }

    pub fn market_cap() -> Self {
        Self::new(DEFAULT_CAP_ALIASES)
    }

    pub fn names(&self) -> &[String] {
        &self.0
    }

    /// Return the first alias present in `fields` together with its value.
    pub fn resolve<'a>(
        &'a self,
        fields: &'a BTreeMap<String, Value>,
    ) -> Result<(&'a str, &'a Value), FieldNotFound> {
        self.0
            .iter()
            .find_map(|name| fields.get(name).map(|v| (name.as_str(), v)))
            .ok_or_else(|| FieldNotFound {
                tried: self.0.clone(),
            })
    }
}

impl Default for FieldAliases {
    fn default() -> Self {
        Self::market_cap()
    }
}

/// Coerce a JSON value to a finite number.
///
/// Accepts numbers and numeric strings with thousands separators
/// (`"1,234"`). Anything else, including NaN and infinities, is `None`.
pub fn coerce_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let cleaned: String = s.chars().filter(|c| *c != ',' && !c.is_whitespace()).collect();
            cleaned.parse::<f64>().ok()
        }
        _ => None,
    }?;
    n.is_finite().then_some(n)
}
