//! Market data: quote providers and the daily snapshot

pub mod fetcher;
pub mod mock;
pub mod yahoo;

pub use fetcher::SnapshotFetcher;
pub use mock::StaticQuoteProvider;
pub use yahoo::YahooQuoteProvider;

use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One daily price bar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub timestamp: DateTime<Utc>,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: u64,
}

/// Recent bars for a ticker, oldest first
#[derive(Debug, Clone, PartialEq, Default)]
pub struct QuoteHistory {
    pub bars: Vec<PriceBar>,
    pub pe_ratio: Option<Decimal>,
    pub market_cap: Option<Decimal>,
}

/// Source of recent quotes
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    /// Daily bars covering the last `lookback_days`
    async fn quote(&self, ticker: &str, lookback_days: i64) -> Result<QuoteHistory>;

    fn name(&self) -> &str;
}

/// Derived quote figures for one ticker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickerSnapshot {
    pub current_price: Decimal,
    pub change_24h_pct: Decimal,
    pub volume: u64,
    pub week_high: Decimal,
    pub week_low: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pe_ratio: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub market_cap: Option<Decimal>,
}

impl TickerSnapshot {
    /// Summarize a bar history; `None` when there are no bars
    pub fn from_history(history: &QuoteHistory) -> Option<Self> {
        let last = history.bars.last()?;
        let prior = history
            .bars
            .len()
            .checked_sub(2)
            .map_or(last.close, |i| history.bars[i].close);

        let change_24h_pct = if prior.is_zero() {
            Decimal::ZERO
        } else {
            ((last.close - prior) / prior * Decimal::ONE_HUNDRED).round_dp(2)
        };

        let week_high = history.bars.iter().map(|b| b.high).max()?;
        let week_low = history.bars.iter().map(|b| b.low).min()?;

        Some(Self {
            current_price: last.close.round_dp(2),
            change_24h_pct,
            volume: last.volume,
            week_high: week_high.round_dp(2),
            week_low: week_low.round_dp(2),
            pe_ratio: history.pe_ratio,
            market_cap: history.market_cap,
        })
    }
}

/// Snapshot entry: figures, or the reason they are missing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SnapshotEntry {
    Quote(TickerSnapshot),
    Error { error: String },
}

impl SnapshotEntry {
    pub fn quote(&self) -> Option<&TickerSnapshot> {
        match self {
            SnapshotEntry::Quote(q) => Some(q),
            SnapshotEntry::Error { .. } => None,
        }
    }
}

/// Per-ticker market data, keyed and ordered by ticker
pub type MarketSnapshot = BTreeMap<String, SnapshotEntry>;
