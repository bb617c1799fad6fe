//! Yahoo Finance quote provider

use super::{PriceBar, QuoteHistory, QuoteProvider};
use crate::error::{AssistantError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use time::OffsetDateTime;
use yahoo_finance_api as yahoo;

const SERVICE: &str = "yahoo";

/// Daily bars from the Yahoo Finance chart API
#[derive(Debug, Default, Clone, Copy)]
pub struct YahooQuoteProvider;

impl YahooQuoteProvider {
    pub fn new() -> Self {
        Self
    }
}

fn to_decimal(value: f64) -> Result<Decimal> {
    Decimal::try_from(value)
        .map_err(|e| AssistantError::upstream(SERVICE, format!("bad price {value}: {e}")))
}

/// Trailing P/E and market cap from a quote summary
fn valuation(summary: &yahoo::YQuoteSummary) -> (Option<Decimal>, Option<Decimal>) {
    let detail = summary
        .quote_summary
        .as_ref()
        .and_then(|s| s.result.as_ref())
        .and_then(|r| r.first())
        .and_then(|d| d.summary_detail.as_ref());

    let Some(detail) = detail else {
        return (None, None);
    };
    // An unbounded P/E comes back as infinity and does not fit
    let pe_ratio = detail
        .trailing_pe
        .and_then(|pe| Decimal::try_from(pe).ok())
        .map(|pe| pe.round_dp(2));
    let market_cap = detail.market_cap.map(Decimal::from);
    (pe_ratio, market_cap)
}

#[async_trait]
impl QuoteProvider for YahooQuoteProvider {
    #[tracing::instrument(skip(self))]
    async fn quote(&self, ticker: &str, lookback_days: i64) -> Result<QuoteHistory> {
        let mut provider =
            yahoo::YahooConnector::new().map_err(|e| AssistantError::upstream(SERVICE, e))?;

        let end = Utc::now();
        let start = end - Duration::days(lookback_days);

        // Convert chrono DateTime to time OffsetDateTime
        let start_odt = OffsetDateTime::from_unix_timestamp(start.timestamp()).map_err(|e| {
            AssistantError::upstream(SERVICE, format!("Invalid start timestamp: {e}"))
        })?;
        let end_odt = OffsetDateTime::from_unix_timestamp(end.timestamp()).map_err(|e| {
            AssistantError::upstream(SERVICE, format!("Invalid end timestamp: {e}"))
        })?;

        let response = provider
            .get_quote_history(ticker, start_odt, end_odt)
            .await
            .map_err(|e| AssistantError::upstream(SERVICE, e))?;

        let quotes = response
            .quotes()
            .map_err(|e| AssistantError::upstream(SERVICE, e))?;

        let bars = quotes
            .iter()
            .map(|q| {
                Ok(PriceBar {
                    timestamp: DateTime::from_timestamp(q.timestamp as i64, 0)
                        .unwrap_or_else(Utc::now),
                    high: to_decimal(q.high)?,
                    low: to_decimal(q.low)?,
                    close: to_decimal(q.close)?,
                    volume: q.volume,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        if bars.is_empty() {
            return Err(AssistantError::upstream(
                SERVICE,
                format!("no quotes for {ticker} in the last {lookback_days} days"),
            ));
        }

        let (pe_ratio, market_cap) = match provider.get_ticker_info(ticker).await {
            Ok(summary) => valuation(&summary),
            Err(e) => {
                tracing::warn!("No fundamentals for {}: {}", ticker, e);
                (None, None)
            }
        };

        Ok(QuoteHistory {
            bars,
            pe_ratio,
            market_cap,
        })
    }

    fn name(&self) -> &str {
        SERVICE
    }
}
