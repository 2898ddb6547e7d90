//! Yahoo Finance price provider.
//!
//! Uses the multi-symbol spark endpoint so one request covers a whole
//! segment: `?symbols=A,B,...&range=5d&interval=1d`. Each symbol comes back
//! with its daily closes, where gaps are reported as `null`.
//!
//! Yahoo Finance has no official API and is subject to unannounced format
//! changes. A malformed envelope maps to `ResponseFormatChanged`; a malformed
//! entry for one symbol only drops that symbol.

use super::circuit_breaker::CircuitBreaker;
use super::http::{build_client, send_with_retry, RetryPolicy};
use super::provider::{ClosingPrices, DataError, PriceProvider};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_SPARK_URL: &str = "https://query1.finance.yahoo.com/v7/finance/spark";

#[derive(Debug, Deserialize)]
pub(crate) struct SparkResponse {
    spark: SparkBody,
}

#[derive(Debug, Deserialize)]
struct SparkBody {
    /// Parsed per entry so one bad symbol cannot sink the batch.
    result: Option<Vec<Value>>,
    error: Option<SparkError>,
}

#[derive(Debug, Deserialize)]
struct SparkError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct SparkResult {
    symbol: String,
    #[serde(default)]
    response: Option<Vec<SparkSeries>>,
}

#[derive(Debug, Deserialize)]
struct SparkSeries {
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Option<Vec<QuoteData>>,
}

#[derive(Debug, Deserialize)]
struct QuoteData {
    #[serde(default)]
    close: Option<Vec<Option<f64>>>,
}

/// Yahoo Finance price provider.
pub struct YahooPriceProvider {
    client: reqwest::blocking::Client,
    circuit_breaker: Arc<CircuitBreaker>,
    retry: RetryPolicy,
    base_url: String,
}

impl YahooPriceProvider {
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
        retry: RetryPolicy,
        circuit_breaker: Arc<CircuitBreaker>,
    ) -> Result<Self, DataError> {
        Ok(Self {
            client: build_client(timeout)?,
            circuit_breaker,
            retry,
            base_url: base_url.into(),
        })
    }

    /// Parse a spark response into per-symbol closes.
    pub(crate) fn parse_response(resp: SparkResponse) -> Result<ClosingPrices, DataError> {
        let results = match (resp.spark.result, resp.spark.error) {
            (Some(results), _) => results,
            (None, Some(err)) => {
                return Err(DataError::ResponseFormatChanged(format!(
                    "{}: {}",
                    err.code, err.description
                )))
            }
            (None, None) => {
                return Err(DataError::ResponseFormatChanged(
                    "empty result with no error".into(),
                ))
            }
        };

        let mut prices = ClosingPrices::new();
        for entry in results {
            let symbol = entry
                .get("symbol")
                .and_then(Value::as_str)
                .unwrap_or("?")
                .to_string();
            let result: SparkResult = match serde_json::from_value(entry) {
                Ok(result) => result,
                Err(e) => {
                    tracing::debug!(%symbol, error = %e, "skipping malformed spark result");
                    continue;
                }
            };
            let closes = result
                .response
                .and_then(|series| series.into_iter().next())
                .and_then(|series| series.indicators.quote)
                .and_then(|quotes| quotes.into_iter().next())
                .and_then(|q| q.close);
            match closes {
                Some(closes) => prices.insert(result.symbol, closes),
                None => tracing::debug!(symbol = %result.symbol, "no closes in spark result"),
            }
        }
        Ok(prices)
    }
}

impl PriceProvider for YahooPriceProvider {
    fn name(&self) -> &str {
        "yahoo_finance"
    }

    fn fetch_closes(
        &self,
        symbols: &[String],
        lookback_days: u32,
    ) -> Result<ClosingPrices, DataError> {
        if symbols.is_empty() {
            return Ok(ClosingPrices::new());
        }

        let joined = symbols.join(",");
        let range = format!("{lookback_days}d");
        let resp = send_with_retry(&self.circuit_breaker, self.retry, self.name(), || {
            self.client.get(&self.base_url).query(&[
                ("symbols", joined.as_str()),
                ("range", range.as_str()),
                ("interval", "1d"),
            ])
        })?;

        let spark: SparkResponse = resp.json().map_err(|e| {
            DataError::ResponseFormatChanged(format!("failed to parse spark response: {e}"))
        })?;
        Self::parse_response(spark)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{json_response, StubServer};

    fn parse(body: &str) -> Result<ClosingPrices, DataError> {
        let resp: SparkResponse = serde_json::from_str(body).unwrap();
        YahooPriceProvider::parse_response(resp)
    }

    #[test]
    fn parses_multi_symbol_spark() {
        let body = r#"{"spark":{"result":[
            {"symbol":"005930.KS","response":[{"meta":{},"timestamp":[1,2,3,4,5],
              "indicators":{"quote":[{"close":[100.0,102.0,101.0,105.0,110.0]}]}}]},
            {"symbol":"091990.KQ","response":[{"meta":{},"timestamp":[1,2,3],
              "indicators":{"quote":[{"close":[null,50.5,null]}]}}]}
        ],"error":null}}"#;
        let prices = parse(body).unwrap();
        assert_eq!(prices.len(), 2);
        assert_eq!(prices.get("005930.KS").unwrap().len(), 5);
        assert_eq!(
            prices.get("091990.KQ").unwrap(),
            &[None, Some(50.5), None][..]
        );
    }

    #[test]
    fn symbol_without_series_is_absent() {
        let body = r#"{"spark":{"result":[{"symbol":"999999.KS","response":[]}],"error":null}}"#;
        let prices = parse(body).unwrap();
        assert!(prices.get("999999.KS").is_none());
    }

    #[test]
    fn null_series_only_drops_its_own_symbol() {
        let body = r#"{"spark":{"result":[
            {"symbol":"005930.KS","response":[{"indicators":{"quote":[{"close":[105.0,110.0]}]}}]},
            {"symbol":"000660.KS","response":[{"indicators":{"quote":[{"close":null}]}}]},
            {"symbol":"035420.KS","response":null},
            {"symbol":"247540.KQ","response":[{"indicators":{"quote":null}}]},
            {"symbol":"091990.KQ","response":[{"indicators":null}]},
            {"response":[]}
        ],"error":null}}"#;
        let prices = parse(body).unwrap();
        assert_eq!(prices.len(), 1);
        assert_eq!(
            prices.get("005930.KS").unwrap(),
            &[Some(105.0), Some(110.0)][..]
        );
    }

    #[test]
    fn provider_error_is_reported() {
        let body = r#"{"spark":{"result":null,"error":{"code":"Bad Request","description":"Missing symbols"}}}"#;
        match parse(body) {
            Err(DataError::ResponseFormatChanged(msg)) => assert!(msg.contains("Missing symbols")),
            other => panic!("expected ResponseFormatChanged, got {other:?}"),
        }
    }

    #[test]
    fn fetch_requests_all_symbols_in_one_call() {
        let server = StubServer::serve(vec![json_response(
            r#"{"spark":{"result":[
                {"symbol":"005930.KS","response":[{"indicators":{"quote":[{"close":[105.0,110.0]}]}}]},
                {"symbol":"247540.KQ","response":[{"indicators":{"quote":[{"close":null}]}}]}
            ],"error":null}}"#,
        )]);
        let provider = YahooPriceProvider::new(
            format!("{}/v7/finance/spark", server.url),
            Duration::from_secs(5),
            RetryPolicy::default(),
            Arc::new(CircuitBreaker::default_provider()),
        )
        .unwrap();

        let symbols = vec!["005930.KS".to_string(), "247540.KQ".to_string()];
        let prices = provider.fetch_closes(&symbols, 5).unwrap();
        assert_eq!(prices.len(), 1);
        assert!(prices.get("005930.KS").is_some());

        let requests = server.finish();
        assert_eq!(requests.len(), 1);
        let request_line = requests[0].lines().next().unwrap();
        assert!(request_line.starts_with("GET /v7/finance/spark?"), "{request_line}");
        assert!(request_line.contains("symbols=005930.KS%2C247540.KQ"));
        assert!(request_line.contains("range=5d"));
        assert!(request_line.contains("interval=1d"));
    }
}
