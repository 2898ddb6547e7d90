use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A tracked market segment. Each segment has its own curated file and is
/// published under its own `market` label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Segment {
    /// KOSPI 200 constituents, listed on the KOSPI exchange.
    Kospi200,
    /// KOSDAQ 150 constituents, listed on the KOSDAQ exchange.
    Kosdaq150,
}

impl Segment {
    /// Both segments, in the order a full run processes them.
    pub const ALL: [Segment; 2] = [Segment::Kospi200, Segment::Kosdaq150];

    /// Label written to the `market` column of published rows.
    pub fn label(&self) -> &'static str {
        match self {
            Segment::Kospi200 => "KOSPI200",
            Segment::Kosdaq150 => "KOSDAQ150",
        }
    }

    /// Exchange whose live listing the segment is joined against.
    pub fn exchange(&self) -> Exchange {
        match self {
            Segment::Kospi200 => Exchange::Kospi,
            Segment::Kosdaq150 => Exchange::Kosdaq,
        }
    }

    /// Default curated file name for the segment.
    pub fn curated_file_name(&self) -> &'static str {
        match self {
            Segment::Kospi200 => "my_sectors_kospi200.csv",
            Segment::Kosdaq150 => "my_sectors_kosdaq150.csv",
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown segment '{0}' (expected kospi200 or kosdaq150)")]
pub struct SegmentParseError(pub String);

impl FromStr for Segment {
    type Err = SegmentParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "kospi200" | "kospi" => Ok(Segment::Kospi200),
            "kosdaq150" | "kosdaq" => Ok(Segment::Kosdaq150),
            _ => Err(SegmentParseError(s.to_string())),
        }
    }
}

/// Exchange a ticker trades on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Exchange {
    Kospi,
    Kosdaq,
}

impl Exchange {
    pub fn label(&self) -> &'static str {
        match self {
            Exchange::Kospi => "KOSPI",
            Exchange::Kosdaq => "KOSDAQ",
        }
    }

    /// Classify a free-form market label from a listing ("KOSPI",
    /// "KOSDAQ GLOBAL", ...). Returns `None` when neither name appears.
    pub fn from_market_label(label: &str) -> Option<Self> {
        let upper = label.to_ascii_uppercase();
        if upper.contains("KOSPI") {
            Some(Exchange::Kospi)
        } else if upper.contains("KOSDAQ") {
            Some(Exchange::Kosdaq)
        } else {
            None
        }
    }
}

impl fmt::Display for Exchange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segment_labels_and_exchanges() {
        assert_eq!(Segment::Kospi200.label(), "KOSPI200");
        assert_eq!(Segment::Kosdaq150.label(), "KOSDAQ150");
        assert_eq!(Segment::Kospi200.exchange(), Exchange::Kospi);
        assert_eq!(Segment::Kosdaq150.exchange(), Exchange::Kosdaq);
    }

    #[test]
    fn segment_parses_case_insensitively() {
        assert_eq!("KOSPI200".parse::<Segment>().unwrap(), Segment::Kospi200);
        assert_eq!(" kosdaq150 ".parse::<Segment>().unwrap(), Segment::Kosdaq150);
        assert!("nasdaq".parse::<Segment>().is_err());
    }

    #[test]
    fn market_label_classification() {
        assert_eq!(Exchange::from_market_label("KOSPI"), Some(Exchange::Kospi));
        assert_eq!(
            Exchange::from_market_label("KOSDAQ GLOBAL"),
            Some(Exchange::Kosdaq)
        );
        assert_eq!(Exchange::from_market_label("KONEX"), None);
        assert_eq!(Exchange::from_market_label(""), None);
    }
}
