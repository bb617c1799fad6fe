//! Static quote provider for mock mode

use super::{PriceBar, QuoteHistory, QuoteProvider};
use crate::error::{AssistantError, Result};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashMap;

/// Returns fixed prices; unknown tickers fail like a real provider would
#[derive(Debug, Clone)]
pub struct StaticQuoteProvider {
    prices: HashMap<String, Decimal>,
}

impl Default for StaticQuoteProvider {
    fn default() -> Self {
        Self::new()
            .with_price("AAPL", dec!(195.40))
            .with_price("MSFT", dec!(415.20))
            .with_price("NVDA", dec!(132.75))
            .with_price("BTC-USD", dec!(64250.00))
            .with_price("ETH-USD", dec!(3120.50))
    }
}

impl StaticQuoteProvider {
    /// Provider with no prices
    pub fn new() -> Self {
        Self {
            prices: HashMap::new(),
        }
    }

    pub fn with_price(mut self, ticker: impl Into<String>, price: Decimal) -> Self {
        self.prices.insert(ticker.into(), price);
        self
    }
}

#[async_trait]
impl QuoteProvider for StaticQuoteProvider {
    async fn quote(&self, ticker: &str, lookback_days: i64) -> Result<QuoteHistory> {
        let price = self.prices.get(ticker).copied().ok_or_else(|| {
            AssistantError::upstream("mock", format!("no mock price for {ticker}"))
        })?;

        // Flat history with a 1% step on the last day
        let now = Utc::now();
        let days = lookback_days.max(2);
        let bars = (0..days)
            .map(|i| {
                let close = if i == days - 1 {
                    price
                } else {
                    (price / dec!(1.01)).round_dp(2)
                };
                PriceBar {
                    timestamp: now - Duration::days(days - 1 - i),
                    high: (close * dec!(1.02)).round_dp(2),
                    low: (close * dec!(0.98)).round_dp(2),
                    close,
                    volume: 1_500_000,
                }
            })
            .collect();

        Ok(QuoteHistory {
            bars,
            pe_ratio: None,
            market_cap: None,
        })
    }

    fn name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::TickerSnapshot;

    #[tokio::test]
    async fn test_static_quotes() {
        let provider = StaticQuoteProvider::default();
        let history = provider.quote("AAPL", 5).await.expect("quote");
        assert_eq!(history.bars.len(), 5);

        let snap = TickerSnapshot::from_history(&history).expect("snapshot");
        assert_eq!(snap.current_price, dec!(195.40));
        assert_eq!(snap.change_24h_pct, dec!(1.00));
    }

    #[tokio::test]
    async fn test_unknown_ticker_fails() {
        let provider = StaticQuoteProvider::new();
        assert!(matches!(
            provider.quote("ZZZZ", 5).await,
            Err(AssistantError::Upstream { .. })
        ));
    }
}
