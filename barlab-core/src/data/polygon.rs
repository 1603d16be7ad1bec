//! Polygon.io aggregates provider.
//!
//! Fetches hourly aggregate bars from the v2 aggs endpoint. Any transport or
//! API-level failure surfaces as `DataError::DataUnavailable`; there is no
//! retry or rate-limit handling here — that is a caller concern.

use super::provider::{BarProvider, DataError};
use crate::domain::Bar;
use chrono::NaiveDate;
use serde::Deserialize;
use std::time::Duration;

/// Polygon v2 aggs API response.
#[derive(Debug, Deserialize)]
struct AggsResponse {
    status: String,
    #[serde(default)]
    results: Option<Vec<AggRow>>,
    #[serde(default)]
    error: Option<String>,
}

/// One aggregate row as Polygon serializes it (single-letter keys).
#[derive(Debug, Deserialize)]
struct AggRow {
    t: i64,
    #[serde(default)]
    o: Option<f64>,
    #[serde(default)]
    h: Option<f64>,
    #[serde(default)]
    l: Option<f64>,
    #[serde(default)]
    c: Option<f64>,
    #[serde(default)]
    v: Option<f64>,
    #[serde(default)]
    vw: Option<f64>,
    #[serde(default)]
    n: Option<i64>,
    #[serde(default)]
    otc: Option<bool>,
}

/// Polygon.io data provider over a blocking HTTP client.
pub struct PolygonProvider {
    client: reqwest::blocking::Client,
    api_key: String,
    base_url: String,
}

impl PolygonProvider {
    pub fn new(api_key: impl Into<String>) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("failed to build HTTP client");

        Self {
            client,
            api_key: api_key.into(),
            base_url: "https://api.polygon.io".to_string(),
        }
    }

    /// Read the API key from the `POLYGON_API_KEY` environment variable.
    pub fn from_env() -> Result<Self, DataError> {
        let api_key = std::env::var("POLYGON_API_KEY").map_err(|_| DataError::DataUnavailable {
            ticker: String::new(),
            reason: "POLYGON_API_KEY is not set".into(),
        })?;
        Ok(Self::new(api_key))
    }

    /// Override the API host, for tests against a local stub.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Build the aggs URL for a ticker and inclusive date range.
    fn aggs_url(&self, ticker: &str, from: NaiveDate, to: NaiveDate) -> String {
        format!(
            "{base}/v2/aggs/ticker/{ticker}/range/1/hour/{from}/{to}\
             ?adjusted=true&sort=asc&limit=50000",
            base = self.base_url,
        )
    }

    /// Parse an aggs response into bars, ascending by timestamp.
    fn parse_response(ticker: &str, resp: AggsResponse) -> Result<Vec<Bar>, DataError> {
        if resp.status != "OK" {
            return Err(DataError::DataUnavailable {
                ticker: ticker.to_string(),
                reason: resp
                    .error
                    .unwrap_or_else(|| format!("API status '{}'", resp.status)),
            });
        }

        // A covered-but-empty range comes back with no results array.
        let rows = resp.results.unwrap_or_default();

        let mut bars = Vec::with_capacity(rows.len());
        for row in rows {
            let timestamp = chrono::DateTime::from_timestamp_millis(row.t)
                .ok_or_else(|| DataError::DataUnavailable {
                    ticker: ticker.to_string(),
                    reason: format!("timestamp {} out of range", row.t),
                })?
                .naive_utc();
            bars.push(Bar {
                timestamp,
                open: row.o,
                high: row.h,
                low: row.l,
                close: row.c,
                volume: row.v,
                vwap: row.vw,
                transactions: row.n,
                otc: row.otc,
            });
        }
        bars.sort_by_key(Bar::epoch_millis);
        Ok(bars)
    }
}

impl BarProvider for PolygonProvider {
    fn name(&self) -> &str {
        "polygon"
    }

    fn fetch_bars(
        &self,
        ticker: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Bar>, DataError> {
        let url = self.aggs_url(ticker, from, to);
        let resp = self
            .client
            .get(&url)
            .bearer_auth(&self.api_key)
            .send()
            .map_err(|e| DataError::DataUnavailable {
                ticker: ticker.to_string(),
                reason: format!("request failed: {e}"),
            })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(DataError::DataUnavailable {
                ticker: ticker.to_string(),
                reason: format!("HTTP {status}"),
            });
        }

        let body: AggsResponse = resp.json().map_err(|e| DataError::DataUnavailable {
            ticker: ticker.to_string(),
            reason: format!("malformed response: {e}"),
        })?;

        Self::parse_response(ticker, body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_ok_response() {
        let resp: AggsResponse = serde_json::from_str(
            r#"{
                "status": "OK",
                "results": [
                    {"t": 1711972800000, "o": 100.0, "h": 102.0, "l": 99.0,
                     "c": 101.0, "v": 1000.0, "vw": 100.5, "n": 42},
                    {"t": 1711969200000, "c": 99.5}
                ]
            }"#,
        )
        .unwrap();

        let bars = PolygonProvider::parse_response("X:BTCUSD", resp).unwrap();
        assert_eq!(bars.len(), 2);
        // Sorted ascending regardless of response order.
        assert!(bars[0].timestamp < bars[1].timestamp);
        assert_eq!(bars[0].close, Some(99.5));
        assert_eq!(bars[0].open, None);
        assert_eq!(bars[1].transactions, Some(42));
    }

    #[test]
    fn parse_error_status() {
        let resp: AggsResponse = serde_json::from_str(
            r#"{"status": "ERROR", "error": "unknown ticker"}"#,
        )
        .unwrap();

        let err = PolygonProvider::parse_response("X:NOPE", resp).unwrap_err();
        assert!(matches!(err, DataError::DataUnavailable { .. }));
        assert!(err.to_string().contains("unknown ticker"));
    }

    #[test]
    fn parse_empty_results_is_not_an_error() {
        let resp: AggsResponse = serde_json::from_str(r#"{"status": "OK"}"#).unwrap();
        let bars = PolygonProvider::parse_response("X:BTCUSD", resp).unwrap();
        assert!(bars.is_empty());
    }

    #[test]
    fn aggs_url_shape() {
        let provider = PolygonProvider::new("key").with_base_url("http://localhost:1");
        let url = provider.aggs_url(
            "X:BTCUSD",
            NaiveDate::from_ymd_opt(2024, 4, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 4, 4).unwrap(),
        );
        assert!(url.starts_with(
            "http://localhost:1/v2/aggs/ticker/X:BTCUSD/range/1/hour/2024-04-01/2024-04-04"
        ));
    }
}
