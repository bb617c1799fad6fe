//! Position ledger and trade settlement
//!
//! The ledger owns two documents: the portfolio (positions + cash) and the
//! append-only trade history. Every mutation is read-whole, modify, write-whole
//! with no locking, so concurrent writers can lose updates (last write wins).
//!
//! A sale writes the portfolio first and appends the history second. If the
//! portfolio write fails nothing is recorded; if only the history append fails
//! the sale stands and the receipt carries the error.

pub mod history;
pub mod model;

pub use model::{
    BuyReceipt, Portfolio, Position, SellReceipt, SellStatus, TradeRecord, TradeResult,
};

use crate::config::AssistantConfig;
use crate::error::{AssistantError, Result};
use crate::store::{DocumentStore, keys};
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Broker and tax parameters applied at settlement
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fees {
    /// Flat commission per order
    pub commission: Decimal,
    /// Tax on positive net gains
    pub tax_rate: Decimal,
}

impl Default for Fees {
    fn default() -> Self {
        Self {
            commission: dec!(1),
            tax_rate: dec!(0.19),
        }
    }
}

/// Clock used for position and trade dates
pub type Clock = fn() -> NaiveDateTime;

pub(crate) fn local_now() -> NaiveDateTime {
    chrono::Local::now().naive_local()
}

/// Normalize a user-supplied ticker
pub fn normalize_ticker(ticker: &str) -> Result<String> {
    let ticker = ticker.trim().to_uppercase();
    if ticker.is_empty() {
        return Err(AssistantError::InvalidArgument(
            "ticker must not be empty".to_string(),
        ));
    }
    Ok(ticker)
}

/// Overflowed arithmetic becomes a user-facing rejection
fn checked(value: Option<Decimal>) -> Result<Decimal> {
    value.ok_or_else(|| AssistantError::InvalidArgument("amount too large".into()))
}

fn require_positive(name: &str, value: Decimal) -> Result<()> {
    if value <= Decimal::ZERO {
        return Err(AssistantError::InvalidArgument(format!(
            "{name} must be positive, got {value}"
        )));
    }
    Ok(())
}

/// Ledger engine over a document store
#[derive(Debug, Clone)]
pub struct Ledger {
    store: DocumentStore,
    fees: Fees,
    initial_cash: Decimal,
    clock: Clock,
}

impl Ledger {
    pub fn new(store: DocumentStore, fees: Fees, initial_cash: Decimal) -> Self {
        Self {
            store,
            fees,
            initial_cash,
            clock: local_now,
        }
    }

    pub fn from_config(store: DocumentStore, config: &AssistantConfig) -> Self {
        let fees = Fees {
            commission: config.commission,
            tax_rate: config.tax_rate,
        };
        Self::new(store, fees, config.initial_cash)
    }

    /// Replace the clock (tests)
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn fees(&self) -> Fees {
        self.fees
    }

    /// Current portfolio; a missing document is a first-run portfolio
    pub async fn read(&self) -> Result<Portfolio> {
        Ok(self
            .store
            .get_json::<Portfolio>(keys::PORTFOLIO)
            .await?
            .unwrap_or_else(|| Portfolio::with_cash(self.initial_cash)))
    }

    /// All closed trades, oldest first
    pub async fn history(&self) -> Result<Vec<TradeRecord>> {
        Ok(self
            .store
            .get_text(keys::TRADE_HISTORY)
            .await?
            .map(|text| history::parse(&text))
            .unwrap_or_default())
    }

    /// Record a purchase
    #[tracing::instrument(skip(self))]
    pub async fn apply_buy(
        &self,
        ticker: &str,
        quantity: Decimal,
        price: Decimal,
    ) -> Result<BuyReceipt> {
        let ticker = normalize_ticker(ticker)?;
        require_positive("quantity", quantity)?;
        require_positive("price", price)?;

        let spent = checked(quantity.checked_mul(price))?;
        let cost = checked(spent.checked_add(self.fees.commission))?;

        let now = (self.clock)();
        let mut portfolio = self.read().await?;
        let cash_eur = checked(portfolio.cash_eur.checked_sub(cost))?.round_dp(2);

        let (position, extended) =
            match portfolio.positions.iter_mut().find(|p| p.ticker == ticker) {
                Some(existing) => {
                    let total = checked(existing.quantity.checked_add(quantity))?;
                    let held_value =
                        checked(existing.quantity.checked_mul(existing.entry_price))?;
                    let combined = checked(held_value.checked_add(spent))?;
                    existing.entry_price = checked(combined.checked_div(total))?.round_dp(2);
                    existing.quantity = total;
                    existing.last_updated = Some(now);
                    (existing.clone(), true)
                }
                None => {
                    let position = Position {
                        ticker: ticker.clone(),
                        quantity,
                        entry_price: price,
                        date_open: Some(now.date()),
                        last_updated: Some(now),
                    };
                    portfolio.positions.push(position.clone());
                    (position, false)
                }
            };

        portfolio.cash_eur = cash_eur;
        portfolio.last_updated = Some(now);

        self.store.put_json(keys::PORTFOLIO, &portfolio).await?;

        tracing::info!(
            "Bought {} {} @ {} (cash now {})",
            quantity,
            ticker,
            price,
            portfolio.cash_eur
        );

        Ok(BuyReceipt {
            position,
            quantity,
            price,
            extended,
            cash_eur: portfolio.cash_eur,
        })
    }

    /// Record a sale and book the realized P&L
    #[tracing::instrument(skip(self))]
    pub async fn apply_sell(
        &self,
        ticker: &str,
        quantity: Decimal,
        price: Decimal,
    ) -> Result<SellReceipt> {
        let ticker = normalize_ticker(ticker)?;
        require_positive("quantity", quantity)?;
        require_positive("price", price)?;

        let now = (self.clock)();
        let mut portfolio = self.read().await?;

        let index = portfolio
            .positions
            .iter()
            .position(|p| p.ticker == ticker)
            .ok_or_else(|| AssistantError::NotFound(ticker.clone()))?;

        let held = portfolio.positions[index].quantity;
        if quantity > held {
            return Err(AssistantError::InsufficientQuantity {
                ticker,
                held,
                requested: quantity,
            });
        }

        let entry_price = portfolio.positions[index].entry_price;
        let move_per_share = checked(price.checked_sub(entry_price))?;
        let gross = checked(move_per_share.checked_mul(quantity))?;
        let costs = checked(dec!(2).checked_mul(self.fees.commission))?;
        let before_tax = checked(gross.checked_sub(costs))?;
        let tax = checked(before_tax.checked_mul(self.fees.tax_rate))?.max(Decimal::ZERO);
        let net_pnl = checked(before_tax.checked_sub(tax))?.round_dp(2);
        let pnl_pct = checked(
            move_per_share
                .checked_div(entry_price)
                .and_then(|ratio| ratio.checked_mul(dec!(100))),
        )?
        .round_dp(2);
        let proceeds = checked(
            quantity
                .checked_mul(price)
                .and_then(|value| value.checked_sub(self.fees.commission)),
        )?;
        let cash_eur = checked(portfolio.cash_eur.checked_add(proceeds))?.round_dp(2);

        let remaining = (held - quantity).round_dp(4);
        let status = if quantity == held || remaining <= Decimal::ZERO {
            portfolio.positions.remove(index);
            SellStatus::Closed
        } else {
            let position = &mut portfolio.positions[index];
            position.quantity = remaining;
            position.last_updated = Some(now);
            SellStatus::Partial
        };

        portfolio.cash_eur = cash_eur;
        portfolio.last_updated = Some(now);

        self.store.put_json(keys::PORTFOLIO, &portfolio).await?;

        let record = TradeRecord {
            ticker,
            quantity,
            entry_price,
            exit_price: price,
            date_close: now.date(),
            gross_pnl: gross.round_dp(2),
            net_pnl,
            pnl_pct,
            result: TradeResult::from_net(net_pnl),
        };

        let history_error = match self.append_history(&record).await {
            Ok(()) => None,
            Err(e) => {
                tracing::error!(
                    "Portfolio saved but trade history append failed for {}: {}",
                    record.ticker,
                    e
                );
                Some(e.to_string())
            }
        };

        tracing::info!(
            "Sold {} {} @ {} ({}, net {})",
            record.quantity,
            record.ticker,
            price,
            status,
            net_pnl
        );

        Ok(SellReceipt {
            record,
            status,
            costs,
            tax: tax.round_dp(2),
            cash_eur: portfolio.cash_eur,
            history_error,
        })
    }

    async fn append_history(&self, record: &TradeRecord) -> Result<()> {
        let existing = self.store.get_text(keys::TRADE_HISTORY).await?;
        let text = history::append(existing.as_deref(), record)?;
        self.store.put_text(keys::TRADE_HISTORY, &text).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, ObjectStore};
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::sync::Arc;

    fn fixed_clock() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 2)
            .and_then(|d| d.and_hms_opt(9, 30, 0))
            .expect("valid timestamp")
    }

    fn ledger() -> Ledger {
        Ledger::new(DocumentStore::memory(), Fees::default(), dec!(2300)).with_clock(fixed_clock)
    }

    /// Memory backend that fails writes to one key
    struct FailingWrites {
        inner: MemoryStore,
        failing_key: &'static str,
    }

    #[async_trait]
    impl ObjectStore for FailingWrites {
        async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
            self.inner.get(key).await
        }

        async fn put(&self, key: &str, body: Vec<u8>, content_type: &str) -> Result<()> {
            if key == self.failing_key {
                return Err(AssistantError::store(key, "access denied"));
            }
            self.inner.put(key, body, content_type).await
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    /// Memory backend that yields after every read, interleaving concurrent tasks
    struct YieldingReads(MemoryStore);

    #[async_trait]
    impl ObjectStore for YieldingReads {
        async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
            let value = self.0.get(key).await;
            tokio::task::yield_now().await;
            value
        }

        async fn put(&self, key: &str, body: Vec<u8>, content_type: &str) -> Result<()> {
            self.0.put(key, body, content_type).await
        }

        fn name(&self) -> &str {
            "yielding"
        }
    }

    #[tokio::test]
    async fn test_first_run_portfolio() {
        let portfolio = ledger().read().await.expect("read");
        assert!(portfolio.positions.is_empty());
        assert_eq!(portfolio.cash_eur, dec!(2300));
        assert!(ledger().history().await.expect("history").is_empty());
    }

    #[tokio::test]
    async fn test_buy_new_position() {
        let ledger = ledger();
        let receipt = ledger
            .apply_buy("aapl", dec!(2), dec!(180.50))
            .await
            .expect("buy");

        assert!(!receipt.extended);
        assert_eq!(receipt.position.ticker, "AAPL");
        assert_eq!(receipt.position.date_open, NaiveDate::from_ymd_opt(2026, 3, 2));
        assert_eq!(receipt.cash_eur, dec!(1938.00));

        let portfolio = ledger.read().await.expect("read");
        assert_eq!(portfolio.positions.len(), 1);
        assert_eq!(portfolio.cash_eur, dec!(1938.00));
    }

    #[tokio::test]
    async fn test_buy_twice_averages_entry() {
        let ledger = ledger();
        ledger.apply_buy("AAPL", dec!(2), dec!(180.50)).await.expect("buy");
        let receipt = ledger
            .apply_buy("AAPL", dec!(3), dec!(190.00))
            .await
            .expect("buy");

        assert!(receipt.extended);
        assert_eq!(receipt.position.quantity, dec!(5));
        assert_eq!(receipt.position.entry_price, dec!(186.20));
        assert_eq!(receipt.cash_eur, dec!(1367.00));
    }

    #[tokio::test]
    async fn test_full_round_trip_trade() {
        let ledger = ledger();
        ledger.apply_buy("AAPL", dec!(2), dec!(180.50)).await.expect("buy");
        ledger.apply_buy("AAPL", dec!(3), dec!(190.00)).await.expect("buy");
        let receipt = ledger
            .apply_sell("AAPL", dec!(5), dec!(200.00))
            .await
            .expect("sell");

        assert_eq!(receipt.status, SellStatus::Closed);
        assert_eq!(receipt.record.gross_pnl, dec!(69.00));
        assert_eq!(receipt.costs, dec!(2));
        assert_eq!(receipt.tax, dec!(12.73));
        assert_eq!(receipt.record.net_pnl, dec!(54.27));
        assert_eq!(receipt.record.pnl_pct, dec!(7.41));
        assert_eq!(receipt.record.result, TradeResult::Win);
        assert_eq!(receipt.cash_eur, dec!(2366.00));
        assert!(receipt.history_error.is_none());

        let portfolio = ledger.read().await.expect("read");
        assert!(portfolio.position("AAPL").is_none());

        let history = ledger.history().await.expect("history");
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].net_pnl, dec!(54.27));
        assert_eq!(history[0].result, TradeResult::Win);
    }

    #[tokio::test]
    async fn test_partial_sell_keeps_entry() {
        let ledger = ledger();
        ledger.apply_buy("NVDA", dec!(1.5), dec!(100)).await.expect("buy");
        let receipt = ledger
            .apply_sell("NVDA", dec!(0.5), dec!(110))
            .await
            .expect("sell");

        assert_eq!(receipt.status, SellStatus::Partial);
        let portfolio = ledger.read().await.expect("read");
        let position = portfolio.position("NVDA").expect("still held");
        assert_eq!(position.quantity, dec!(1.0000));
        assert_eq!(position.entry_price, dec!(100));
    }

    #[tokio::test]
    async fn test_loss_pays_no_tax() {
        let ledger = ledger();
        ledger.apply_buy("TSLA", dec!(1), dec!(250)).await.expect("buy");
        let receipt = ledger
            .apply_sell("TSLA", dec!(1), dec!(240))
            .await
            .expect("sell");

        assert_eq!(receipt.tax, Decimal::ZERO);
        assert_eq!(receipt.record.gross_pnl, dec!(-10));
        assert_eq!(receipt.record.net_pnl, dec!(-12));
        assert_eq!(receipt.record.result, TradeResult::Loss);
    }

    #[tokio::test]
    async fn test_small_gain_below_costs_is_loss() {
        let ledger = ledger();
        ledger.apply_buy("SAP", dec!(1), dec!(100)).await.expect("buy");
        let receipt = ledger
            .apply_sell("SAP", dec!(1), dec!(101))
            .await
            .expect("sell");

        assert_eq!(receipt.tax, Decimal::ZERO);
        assert_eq!(receipt.record.net_pnl, dec!(-1));
        assert_eq!(receipt.record.result, TradeResult::Loss);
    }

    #[tokio::test]
    async fn test_oversell_leaves_portfolio_untouched() {
        let ledger = ledger();
        ledger.apply_buy("AAPL", dec!(2), dec!(180)).await.expect("buy");
        let before = ledger.read().await.expect("read");

        let err = ledger
            .apply_sell("AAPL", dec!(3), dec!(200))
            .await
            .expect_err("oversell");
        assert!(matches!(
            err,
            AssistantError::InsufficientQuantity { held, requested, .. }
                if held == dec!(2) && requested == dec!(3)
        ));
        assert_eq!(ledger.read().await.expect("read"), before);
        assert!(ledger.history().await.expect("history").is_empty());
    }

    #[tokio::test]
    async fn test_sell_unheld_ticker() {
        let ledger = ledger();
        let err = ledger
            .apply_sell("MSFT", dec!(1), dec!(300))
            .await
            .expect_err("not held");
        assert!(matches!(err, AssistantError::NotFound(t) if t == "MSFT"));
        assert!(ledger.history().await.expect("history").is_empty());
    }

    #[tokio::test]
    async fn test_rejects_non_positive_arguments() {
        let ledger = ledger();
        for (qty, price) in [(dec!(0), dec!(10)), (dec!(1), dec!(-5))] {
            assert!(matches!(
                ledger.apply_buy("AAPL", qty, price).await,
                Err(AssistantError::InvalidArgument(_))
            ));
            assert!(matches!(
                ledger.apply_sell("AAPL", qty, price).await,
                Err(AssistantError::InvalidArgument(_))
            ));
        }
        assert!(matches!(
            ledger.apply_buy("  ", dec!(1), dec!(1)).await,
            Err(AssistantError::InvalidArgument(_))
        ));
    }

    #[tokio::test]
    async fn test_overflowing_amounts_are_rejected() {
        let ledger = ledger();
        let huge = dec!(100000000000000000);

        let err = ledger
            .apply_buy("AAPL", huge, huge)
            .await
            .expect_err("overflow");
        assert!(matches!(err, AssistantError::InvalidArgument(m) if m == "amount too large"));
        assert!(ledger.read().await.expect("read").positions.is_empty());

        ledger
            .apply_buy("AAPL", huge, dec!(0.0000000001))
            .await
            .expect("tiny price");
        let before = ledger.read().await.expect("read");
        let err = ledger
            .apply_sell("AAPL", huge, huge)
            .await
            .expect_err("overflow");
        assert!(matches!(err, AssistantError::InvalidArgument(_)));
        assert_eq!(ledger.read().await.expect("read"), before);
        assert!(ledger.history().await.expect("history").is_empty());
    }

    #[tokio::test]
    async fn test_portfolio_write_failure_records_nothing() {
        let backend = Arc::new(FailingWrites {
            inner: MemoryStore::new(),
            failing_key: keys::PORTFOLIO,
        });
        let store = DocumentStore::new(backend.clone());
        let portfolio = Portfolio {
            positions: vec![Position {
                ticker: "AAPL".into(),
                quantity: dec!(1),
                entry_price: dec!(100),
                date_open: None,
                last_updated: None,
            }],
            cash_eur: dec!(500),
            last_updated: None,
        };
        backend
            .inner
            .put(
                keys::PORTFOLIO,
                serde_json::to_vec(&portfolio).expect("encode"),
                "application/json",
            )
            .await
            .expect("seed");

        let ledger = Ledger::new(store, Fees::default(), dec!(2300));
        let err = ledger
            .apply_sell("AAPL", dec!(1), dec!(120))
            .await
            .expect_err("write fails");
        assert!(matches!(err, AssistantError::Store { .. }));
        assert!(ledger.history().await.expect("history").is_empty());
    }

    #[tokio::test]
    async fn test_history_failure_is_reported_not_rolled_back() {
        let store = DocumentStore::new(Arc::new(FailingWrites {
            inner: MemoryStore::new(),
            failing_key: keys::TRADE_HISTORY,
        }));
        let ledger = Ledger::new(store, Fees::default(), dec!(2300));
        ledger.apply_buy("AAPL", dec!(1), dec!(100)).await.expect("buy");

        let receipt = ledger
            .apply_sell("AAPL", dec!(1), dec!(120))
            .await
            .expect("sale stands");
        assert!(receipt.history_error.is_some());
        assert!(ledger.read().await.expect("read").positions.is_empty());
        assert!(ledger.history().await.expect("history").is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_buys_lose_an_update() {
        // Both tasks read the same portfolio before either writes; the second
        // write replaces the first. This is the accepted last-write-wins model.
        let store = DocumentStore::new(Arc::new(YieldingReads(MemoryStore::new())));
        let ledger = Ledger::new(store, Fees::default(), dec!(2300));

        let (a, b) = tokio::join!(
            ledger.apply_buy("AAPL", dec!(1), dec!(100)),
            ledger.apply_buy("MSFT", dec!(1), dec!(200)),
        );
        a.expect("buy a");
        b.expect("buy b");

        let portfolio = ledger.read().await.expect("read");
        assert_eq!(portfolio.positions.len(), 1);
        assert_eq!(portfolio.positions[0].ticker, "MSFT");
        assert_eq!(portfolio.cash_eur, dec!(2099));
    }
}
