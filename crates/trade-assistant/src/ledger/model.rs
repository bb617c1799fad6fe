//! Ledger data types

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One open holding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub ticker: String,
    /// Always positive; a position at zero is removed
    pub quantity: Decimal,
    /// Weighted average entry price
    pub entry_price: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_open: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<NaiveDateTime>,
}

impl Position {
    /// Capital tied up at entry price
    pub fn invested(&self) -> Decimal {
        self.quantity.saturating_mul(self.entry_price)
    }
}

/// Open positions and cash
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Portfolio {
    #[serde(default)]
    pub positions: Vec<Position>,
    #[serde(default)]
    pub cash_eur: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<NaiveDateTime>,
}

impl Portfolio {
    /// Empty portfolio holding only cash
    pub fn with_cash(cash_eur: Decimal) -> Self {
        Self {
            positions: Vec::new(),
            cash_eur,
            last_updated: None,
        }
    }

    pub fn position(&self, ticker: &str) -> Option<&Position> {
        self.positions.iter().find(|p| p.ticker == ticker)
    }

    /// Sum of `quantity * entry_price` over all positions
    pub fn invested(&self) -> Decimal {
        self.positions
            .iter()
            .map(Position::invested)
            .fold(Decimal::ZERO, Decimal::saturating_add)
    }

    /// Cash plus invested capital
    pub fn net_worth(&self) -> Decimal {
        self.cash_eur.saturating_add(self.invested())
    }
}

/// Outcome of a closed trade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeResult {
    Win,
    Loss,
}

impl TradeResult {
    pub fn from_net(net_pnl: Decimal) -> Self {
        if net_pnl > Decimal::ZERO {
            Self::Win
        } else {
            Self::Loss
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Win => "win",
            Self::Loss => "loss",
        }
    }
}

impl std::str::FromStr for TradeResult {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "win" => Ok(Self::Win),
            "loss" => Ok(Self::Loss),
            other => Err(format!("unknown trade result '{other}'")),
        }
    }
}

/// One realized sale, as appended to the trade history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub ticker: String,
    pub quantity: Decimal,
    pub entry_price: Decimal,
    pub exit_price: Decimal,
    pub date_close: NaiveDate,
    pub gross_pnl: Decimal,
    pub net_pnl: Decimal,
    pub pnl_pct: Decimal,
    pub result: TradeResult,
}

/// Result of a recorded purchase
#[derive(Debug, Clone, PartialEq)]
pub struct BuyReceipt {
    /// Position after the purchase
    pub position: Position,
    /// Quantity bought by this order
    pub quantity: Decimal,
    pub price: Decimal,
    /// True when an existing position was averaged up/down
    pub extended: bool,
    pub cash_eur: Decimal,
}

impl fmt::Display for BuyReceipt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.extended {
            writeln!(f, "✅ Position extended")?;
            writeln!(
                f,
                "{}: {} shares @ {:.2}€ (average price)",
                self.position.ticker, self.position.quantity, self.position.entry_price
            )?;
        } else {
            writeln!(f, "✅ Purchase recorded")?;
            writeln!(
                f,
                "{}: {} shares @ {}€",
                self.position.ticker, self.quantity, self.price
            )?;
        }
        write!(f, "Remaining cash: {:.2}€", self.cash_eur)
    }
}

/// Whether a sale closed the position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SellStatus {
    Closed,
    Partial,
}

impl fmt::Display for SellStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Closed => write!(f, "closed"),
            Self::Partial => write!(f, "partial"),
        }
    }
}

/// Result of a recorded sale
#[derive(Debug, Clone, PartialEq)]
pub struct SellReceipt {
    pub record: TradeRecord,
    pub status: SellStatus,
    /// Commissions charged against the gain (entry + exit)
    pub costs: Decimal,
    pub tax: Decimal,
    pub cash_eur: Decimal,
    /// Set when the portfolio was saved but the history append failed
    pub history_error: Option<String>,
}

impl fmt::Display for SellReceipt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let r = &self.record;
        let emoji = match r.result {
            TradeResult::Win => "📈",
            TradeResult::Loss => "📉",
        };
        writeln!(f, "{emoji} Sale recorded ({})", self.status)?;
        writeln!(f, "{}: {} shares @ {}€", r.ticker, r.quantity, r.exit_price)?;
        writeln!(f)?;
        writeln!(f, "Entry: {}€", r.entry_price)?;
        writeln!(f, "Exit: {}€", r.exit_price)?;
        writeln!(f, "Gross P&L: {:.2}€ ({:+.2}%)", r.gross_pnl, r.pnl_pct)?;
        writeln!(f, "Costs: -{:.2}€", self.costs)?;
        writeln!(f, "Taxes: -{:.2}€", self.tax)?;
        writeln!(f, "NET P&L: {:.2}€", r.net_pnl)?;
        writeln!(f)?;
        write!(f, "Cash: {:.2}€", self.cash_eur)?;
        if let Some(err) = &self.history_error {
            write!(
                f,
                "\n\n⚠️ Portfolio saved but the trade history could not be updated: {err}"
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_portfolio_document_compat() {
        // Documents written by earlier versions carry float numbers and naive timestamps
        let json = r#"{
            "positions": [{"ticker": "AAPL", "quantity": 2.5, "entry_price": 180.5,
                           "date_open": "2026-01-05", "last_updated": "2026-01-05T09:30:00.123456"}],
            "cash_eur": 1848.75,
            "last_updated": "2026-01-05T09:30:00"
        }"#;
        let portfolio: Portfolio = serde_json::from_str(json).expect("parse");
        assert_eq!(portfolio.positions[0].quantity, dec!(2.5));
        assert_eq!(portfolio.cash_eur, dec!(1848.75));
        assert_eq!(portfolio.invested(), dec!(451.25));
        assert_eq!(portfolio.net_worth(), dec!(2300.00));
    }

    #[test]
    fn test_trade_result() {
        assert_eq!(TradeResult::from_net(dec!(0.01)), TradeResult::Win);
        assert_eq!(TradeResult::from_net(dec!(0)), TradeResult::Loss);
        assert_eq!("loss".parse::<TradeResult>(), Ok(TradeResult::Loss));
        assert!("draw".parse::<TradeResult>().is_err());
    }

    #[test]
    fn test_sell_receipt_warns_on_history_error() {
        let receipt = SellReceipt {
            record: TradeRecord {
                ticker: "AAPL".into(),
                quantity: dec!(1),
                entry_price: dec!(100),
                exit_price: dec!(90),
                date_close: NaiveDate::from_ymd_opt(2026, 1, 1).expect("date"),
                gross_pnl: dec!(-10),
                net_pnl: dec!(-12),
                pnl_pct: dec!(-10),
                result: TradeResult::Loss,
            },
            status: SellStatus::Closed,
            costs: dec!(2),
            tax: dec!(0),
            cash_eur: dec!(89),
            history_error: Some("timeout".into()),
        };
        let text = receipt.to_string();
        assert!(text.starts_with("📉 Sale recorded (closed)"));
        assert!(text.contains("Gross P&L: -10.00€ (-10.00%)"));
        assert!(text.contains("could not be updated: timeout"));
    }
}
