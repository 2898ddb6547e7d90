//! KRX listing provider.
//!
//! Queries the exchange's JSON data service for the full listing of one
//! market (`STK` = KOSPI, `KSQ` = KOSDAQ) on a trading date. The service
//! answers non-trading dates with an empty block or rows without prices, so
//! the provider walks back from today until it finds a populated listing.
//!
//! Exchange column names are mapped to listing field names (`Code`, `Name`,
//! `Market`, `Marcap`, ...). Unmapped columns are kept under their raw name.

use super::circuit_breaker::CircuitBreaker;
use super::http::{build_client, send_with_retry, RetryPolicy};
use super::provider::{DataError, ListingProvider};
use crate::domain::{Exchange, ListingRecord, TickerCode};
use crate::fields::coerce_number;
use chrono::{Local, NaiveDate};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_KRX_URL: &str = "http://data.krx.co.kr/comm/bldAttendant/getJsonData.cmd";

const LISTING_BLD: &str = "dbms/MDC/STAT/standard/MDCSTAT01501";
const REFERER: &str = "http://data.krx.co.kr/contents/MDC/MDI/mdiLoader";

/// Exchange column → listing field name.
const FIELD_MAP: [(&str, &str); 11] = [
    ("ISU_SRT_CD", "Code"),
    ("ISU_ABBRV", "Name"),
    ("MKT_NM", "Market"),
    ("SECT_TP_NM", "Dept"),
    ("TDD_CLSPRC", "Close"),
    ("CMPPREVDD_PRC", "Changes"),
    ("FLUC_RT", "ChangesRatio"),
    ("ACC_TRDVOL", "Volume"),
    ("ACC_TRDVAL", "Amount"),
    ("MKTCAP", "Marcap"),
    ("LIST_SHRS", "Stocks"),
];

#[derive(Debug, Deserialize)]
pub(crate) struct KrxResponse {
    #[serde(rename = "OutBlock_1", default)]
    out_block: Vec<Map<String, Value>>,
}

/// KRX listing provider.
pub struct KrxListingProvider {
    client: reqwest::blocking::Client,
    circuit_breaker: Arc<CircuitBreaker>,
    retry: RetryPolicy,
    url: String,
    lookback_days: u32,
}

impl KrxListingProvider {
    pub fn new(
        url: impl Into<String>,
        lookback_days: u32,
        timeout: Duration,
        retry: RetryPolicy,
        circuit_breaker: Arc<CircuitBreaker>,
    ) -> Result<Self, DataError> {
        Ok(Self {
            client: build_client(timeout)?,
            circuit_breaker,
            retry,
            url: url.into(),
            lookback_days: lookback_days.max(1),
        })
    }

    fn market_id(exchange: Exchange) -> &'static str {
        match exchange {
            Exchange::Kospi => "STK",
            Exchange::Kosdaq => "KSQ",
        }
    }

    fn fetch_day(
        &self,
        exchange: Exchange,
        date: NaiveDate,
    ) -> Result<Vec<ListingRecord>, DataError> {
        let trd_dd = date.format("%Y%m%d").to_string();
        let resp = send_with_retry(&self.circuit_breaker, self.retry, self.name(), || {
            self.client
                .post(&self.url)
                .header("Referer", REFERER)
                .form(&[
                    ("bld", LISTING_BLD),
                    ("mktId", Self::market_id(exchange)),
                    ("trdDd", trd_dd.as_str()),
                    ("share", "1"),
                    ("money", "1"),
                    ("csvxls_isNo", "false"),
                ])
        })?;

        let body: KrxResponse = resp.json().map_err(|e| {
            DataError::ResponseFormatChanged(format!("failed to parse KRX listing: {e}"))
        })?;
        Ok(Self::parse_listing(body))
    }

    /// Convert raw exchange rows into listing records. Rows without a usable
    /// short code are skipped.
    pub(crate) fn parse_listing(body: KrxResponse) -> Vec<ListingRecord> {
        let mut records = Vec::with_capacity(body.out_block.len());
        for raw in body.out_block {
            let mut fields: BTreeMap<String, Value> = BTreeMap::new();
            for (key, value) in raw {
                let name = FIELD_MAP
                    .iter()
                    .find(|(krx, _)| *krx == key)
                    .map(|(_, mapped)| mapped.to_string())
                    .unwrap_or(key);
                fields.insert(name, value);
            }

            let code = match fields.get("Code").and_then(Value::as_str) {
                Some(raw_code) => match TickerCode::normalize(raw_code) {
                    Ok(code) => code,
                    Err(e) => {
                        tracing::debug!(error = %e, "skipping listing row");
                        continue;
                    }
                },
                None => continue,
            };
            let display_name = fields
                .get("Name")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .trim()
                .to_string();
            let market = fields
                .get("Market")
                .and_then(Value::as_str)
                .map(|m| m.trim().to_string());

            records.push(ListingRecord {
                ticker_code: code,
                display_name,
                market,
                fields,
            });
        }
        records
    }

    /// A listing is usable once at least one row carries a capitalization.
    fn is_trading_day_listing(records: &[ListingRecord]) -> bool {
        records
            .iter()
            .any(|r| r.fields.get("Marcap").and_then(coerce_number).is_some())
    }
}

impl ListingProvider for KrxListingProvider {
    fn name(&self) -> &str {
        "krx"
    }

    fn fetch_listing(&self, exchange: Exchange) -> Result<Vec<ListingRecord>, DataError> {
        let today = Local::now().date_naive();
        for back in 0..self.lookback_days {
            let Some(date) = today.checked_sub_days(chrono::Days::new(u64::from(back))) else {
                break;
            };
            let records = self.fetch_day(exchange, date)?;
            if Self::is_trading_day_listing(&records) {
                tracing::debug!(%exchange, %date, rows = records.len(), "listing fetched");
                return Ok(records);
            }
        }
        Err(DataError::Other(format!(
            "no {exchange} listing with prices in the last {} days",
            self.lookback_days
        )))
    }
}
