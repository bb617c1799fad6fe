//! Best-effort market snapshot for the daily analysis

use super::{MarketSnapshot, QuoteProvider, SnapshotEntry, TickerSnapshot};
use crate::config::AssistantConfig;
use crate::ledger::Portfolio;
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

/// Fetches one quote per ticker, spacing requests evenly
pub struct SnapshotFetcher {
    provider: Arc<dyn QuoteProvider>,
    always_include: Vec<String>,
    lookback_days: i64,
    rate_limiter: Option<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>,
}

impl SnapshotFetcher {
    /// `spacing` of zero disables rate limiting
    pub fn new(
        provider: Arc<dyn QuoteProvider>,
        always_include: Vec<String>,
        lookback_days: i64,
        spacing: Duration,
    ) -> Self {
        let rate_limiter = Quota::with_period(spacing).map(RateLimiter::direct);
        Self {
            provider,
            always_include,
            lookback_days,
            rate_limiter,
        }
    }

    pub fn from_config(provider: Arc<dyn QuoteProvider>, config: &AssistantConfig) -> Self {
        Self::new(
            provider,
            config.always_include.clone(),
            config.lookback_days,
            config.quote_spacing,
        )
    }

    /// Portfolio tickers plus the always-included ones, sorted and unique
    pub fn tickers(&self, portfolio: &Portfolio) -> Vec<String> {
        portfolio
            .positions
            .iter()
            .map(|p| p.ticker.clone())
            .chain(self.always_include.iter().cloned())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Quote every ticker; a failing ticker records its error and the rest continue
    pub async fn fetch(&self, portfolio: &Portfolio) -> MarketSnapshot {
        let mut snapshot = MarketSnapshot::new();

        for ticker in self.tickers(portfolio) {
            if let Some(limiter) = &self.rate_limiter {
                limiter.until_ready().await;
            }

            let entry = match self.provider.quote(&ticker, self.lookback_days).await {
                Ok(history) => match TickerSnapshot::from_history(&history) {
                    Some(quote) => {
                        tracing::info!(
                            "✅ {}: {} ({:+}%)",
                            ticker,
                            quote.current_price,
                            quote.change_24h_pct
                        );
                        SnapshotEntry::Quote(quote)
                    }
                    None => {
                        tracing::warn!("No price bars returned for {}", ticker);
                        SnapshotEntry::Error {
                            error: "no data".to_string(),
                        }
                    }
                },
                Err(e) => {
                    tracing::error!("❌ Failed to fetch {}: {}", ticker, e);
                    SnapshotEntry::Error {
                        error: e.to_string(),
                    }
                }
            };
            snapshot.insert(ticker, entry);
        }

        snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AssistantError;
    use crate::ledger::Position;
    use crate::market::{MockQuoteProvider, PriceBar, QuoteHistory};
    use chrono::Utc;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn portfolio(tickers: &[&str]) -> Portfolio {
        let mut portfolio = Portfolio::with_cash(dec!(1000));
        for t in tickers {
            portfolio.positions.push(Position {
                ticker: (*t).to_string(),
                quantity: dec!(1),
                entry_price: dec!(100),
                date_open: None,
                last_updated: None,
            });
        }
        portfolio
    }

    fn history(close: Decimal) -> QuoteHistory {
        QuoteHistory {
            bars: vec![PriceBar {
                timestamp: Utc::now(),
                high: close,
                low: close,
                close,
                volume: 10,
            }],
            ..Default::default()
        }
    }

    fn crypto() -> Vec<String> {
        vec!["BTC-USD".to_string(), "ETH-USD".to_string()]
    }

    #[test]
    fn test_tickers_sorted_and_unique() {
        let provider = Arc::new(MockQuoteProvider::new());
        let fetcher = SnapshotFetcher::new(provider, crypto(), 5, Duration::ZERO);
        assert_eq!(
            fetcher.tickers(&portfolio(&["NVDA", "BTC-USD", "AAPL"])),
            vec!["AAPL", "BTC-USD", "ETH-USD", "NVDA"]
        );
    }

    #[tokio::test]
    async fn test_failure_isolated_to_ticker() {
        let mut provider = MockQuoteProvider::new();
        provider
            .expect_quote()
            .times(3)
            .returning(|ticker, days| {
                assert_eq!(days, 5);
                if ticker == "ETH-USD" {
                    Err(AssistantError::upstream("yahoo", "No data found"))
                } else {
                    Ok(history(dec!(42)))
                }
            });

        let fetcher = SnapshotFetcher::new(Arc::new(provider), crypto(), 5, Duration::ZERO);
        let snapshot = fetcher.fetch(&portfolio(&["AAPL"])).await;

        assert_eq!(snapshot.len(), 3);
        assert_eq!(
            snapshot["AAPL"].quote().map(|q| q.current_price),
            Some(dec!(42))
        );
        assert!(snapshot["BTC-USD"].quote().is_some());
        assert!(matches!(
            &snapshot["ETH-USD"],
            SnapshotEntry::Error { error } if error.contains("No data found")
        ));
    }

    #[tokio::test]
    async fn test_empty_history_recorded_as_error() {
        let mut provider = MockQuoteProvider::new();
        provider
            .expect_quote()
            .returning(|_, _| Ok(QuoteHistory::default()));

        let fetcher =
            SnapshotFetcher::new(Arc::new(provider), vec!["BTC-USD".into()], 5, Duration::ZERO);
        let snapshot = fetcher.fetch(&Portfolio::with_cash(dec!(0))).await;
        assert!(snapshot["BTC-USD"].quote().is_none());
    }

    #[tokio::test]
    async fn test_requests_are_spaced() {
        let mut provider = MockQuoteProvider::new();
        provider.expect_quote().returning(|_, _| Ok(history(dec!(1))));

        let fetcher = SnapshotFetcher::new(
            Arc::new(provider),
            crypto(),
            5,
            Duration::from_millis(500),
        );
        let started = std::time::Instant::now();
        let snapshot = fetcher.fetch(&portfolio(&["AAPL"])).await;
        assert_eq!(snapshot.len(), 3);
        // First request is immediate, the next two wait one period each
        assert!(started.elapsed() >= Duration::from_millis(900));
    }
}
