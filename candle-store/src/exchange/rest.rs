//! Provider REST gateway client

use crate::data::{Candle, CandleInterval, Quotation};
use crate::exchange::{CandleSource, CandlesRequest};
use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Deserialize;
use tracing::{debug, info};

const MARKET_DATA_SERVICE: &str = "tinkoff.public.invest.api.contract.v1.MarketDataService";

/// Historic candles over the provider's REST gateway.
///
/// Requests longer than the interval's limit are split into consecutive windows.
#[derive(Debug, Clone)]
pub struct InvestRestClient {
    base_url: String,
    token: String,
    client: reqwest::Client,
}

impl InvestRestClient {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: token.into(),
            client: reqwest::Client::new(),
        }
    }

    async fn get_candles(
        &self,
        instrument_id: &str,
        interval: CandleInterval,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> anyhow::Result<Vec<Candle>> {
        let url = format!(
            "{}/{}/GetCandles",
            self.base_url.trim_end_matches('/'),
            MARKET_DATA_SERVICE
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(&serde_json::json!({
                "instrumentId": instrument_id,
                "from": from.to_rfc3339_opts(SecondsFormat::Secs, true),
                "to": to.to_rfc3339_opts(SecondsFormat::Secs, true),
                "interval": interval.api_name(),
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("GetCandles returned {}: {}", status, body);
        }

        let payload: GetCandlesResponse = response.json().await?;
        payload.candles.into_iter().map(Candle::try_from).collect()
    }
}

#[async_trait]
impl CandleSource for InvestRestClient {
    async fn historic_candles(&self, request: &CandlesRequest) -> anyhow::Result<Vec<Candle>> {
        let mut candles: Vec<Candle> = Vec::new();

        for (from, to) in request.interval.request_windows(request.from, request.to) {
            let batch = self
                .get_candles(&request.instrument_id, request.interval, from, to)
                .await
                .with_context(|| {
                    format!("GetCandles {} [{}, {})", request.instrument_id, from, to)
                })?;
            debug!("{} candles in [{}, {}) for {}", batch.len(), from, to, request.instrument_id);

            // adjacent windows may both return the boundary bar
            for candle in batch {
                if candles.last().map_or(true, |last| candle.time > last.time) {
                    candles.push(candle);
                }
            }
        }

        info!(
            "{} candles fetched for {} ({})",
            candles.len(),
            request.instrument_id,
            request.interval
        );
        Ok(candles)
    }
}

#[derive(Debug, Deserialize)]
struct GetCandlesResponse {
    #[serde(default)]
    candles: Vec<HistoricCandle>,
}

// proto3 JSON: int64 as strings, zero values omitted
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HistoricCandle {
    #[serde(default)]
    open: ApiQuotation,
    #[serde(default)]
    high: ApiQuotation,
    #[serde(default)]
    low: ApiQuotation,
    #[serde(default)]
    close: ApiQuotation,
    #[serde(default)]
    volume: Int64,
    time: DateTime<Utc>,
    #[serde(default)]
    is_complete: bool,
}

#[derive(Debug, Default, Deserialize)]
struct ApiQuotation {
    #[serde(default)]
    units: Int64,
    #[serde(default)]
    nano: i32,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Int64 {
    Number(i64),
    Text(String),
}

impl Default for Int64 {
    fn default() -> Self {
        Int64::Number(0)
    }
}

impl Int64 {
    fn value(&self) -> anyhow::Result<i64> {
        match self {
            Int64::Number(n) => Ok(*n),
            Int64::Text(s) => s
                .parse()
                .with_context(|| format!("invalid int64 value: {:?}", s)),
        }
    }
}

impl TryFrom<ApiQuotation> for Quotation {
    type Error = anyhow::Error;

    fn try_from(q: ApiQuotation) -> Result<Self, Self::Error> {
        Ok(Quotation::new(q.units.value()?, q.nano))
    }
}

impl TryFrom<HistoricCandle> for Candle {
    type Error = anyhow::Error;

    fn try_from(c: HistoricCandle) -> Result<Self, Self::Error> {
        Ok(Candle::new(
            c.open.try_into()?,
            c.high.try_into()?,
            c.low.try_into()?,
            c.close.try_into()?,
            c.volume.value()?,
            c.time,
            c.is_complete,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_decode_candles_response() {
        let body = r#"{
            "candles": [
                {
                    "open": {"units": "105", "nano": 500000000},
                    "high": {"units": "106"},
                    "low": {"units": "104", "nano": 990000000},
                    "close": {"units": "105", "nano": 750000000},
                    "volume": "1530",
                    "time": "2024-03-01T07:00:00Z",
                    "isComplete": true
                },
                {
                    "open": {"units": "105", "nano": 750000000},
                    "high": {"units": "105", "nano": 800000000},
                    "low": {"units": "105", "nano": 600000000},
                    "close": {"units": "105", "nano": 700000000},
                    "volume": 12,
                    "time": "2024-03-01T08:00:00Z"
                }
            ]
        }"#;

        let response: GetCandlesResponse = serde_json::from_str(body).unwrap();
        let candles: Vec<Candle> = response
            .candles
            .into_iter()
            .map(Candle::try_from)
            .collect::<anyhow::Result<_>>()
            .unwrap();

        assert_eq!(candles.len(), 2);
        assert_eq!(candles[0].open, Quotation::new(105, 500_000_000));
        assert_eq!(candles[0].high, Quotation::new(106, 0));
        assert_eq!(candles[0].volume, 1530);
        assert!(candles[0].is_complete);
        assert_eq!(candles[0].time, Utc.with_ymd_and_hms(2024, 3, 1, 7, 0, 0).unwrap());
        assert_eq!(candles[1].volume, 12);
        assert!(!candles[1].is_complete);
    }

    #[test]
    fn test_decode_empty_response() {
        let response: GetCandlesResponse = serde_json::from_str("{}").unwrap();
        assert!(response.candles.is_empty());
    }

    #[test]
    fn test_decode_rejects_bad_units() {
        let body = r#"{"candles": [{"open": {"units": "abc"}, "time": "2024-03-01T07:00:00Z"}]}"#;
        let response: GetCandlesResponse = serde_json::from_str(body).unwrap();
        let decoded: anyhow::Result<Vec<Candle>> =
            response.candles.into_iter().map(Candle::try_from).collect();
        assert!(decoded.is_err());
    }
}
