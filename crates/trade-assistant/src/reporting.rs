//! Read-only reports over the ledger
//!
//! Each report renders to chat reply text through `Display`.

use crate::error::Result;
use crate::ledger::{Ledger, Position, TradeRecord, TradeResult};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::fmt;

/// One open position with its invested amount
#[derive(Debug, Clone, PartialEq)]
pub struct PositionLine {
    pub ticker: String,
    pub quantity: Decimal,
    pub entry_price: Decimal,
    pub invested: Decimal,
    pub date_open: Option<NaiveDate>,
}

impl From<&Position> for PositionLine {
    fn from(p: &Position) -> Self {
        Self {
            ticker: p.ticker.clone(),
            quantity: p.quantity,
            entry_price: p.entry_price,
            invested: p.invested().round_dp(2),
            date_open: p.date_open,
        }
    }
}

/// Open positions with totals
#[derive(Debug, Clone, PartialEq)]
pub struct PositionsReport {
    pub positions: Vec<PositionLine>,
    pub total_invested: Decimal,
    pub cash: Decimal,
    pub total: Decimal,
}

impl fmt::Display for PositionsReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "💼 PORTFOLIO")?;
        writeln!(f)?;
        if self.positions.is_empty() {
            writeln!(f, "No open positions")?;
            return write!(f, "Cash: {:.2}€", self.cash);
        }
        for p in &self.positions {
            writeln!(f, "{}: {} shares @ {}€", p.ticker, p.quantity, p.entry_price)?;
            writeln!(f, "Invested: {:.2}€", p.invested)?;
            match p.date_open {
                Some(date) => writeln!(f, "Since: {date}")?,
                None => writeln!(f, "Since: N/A")?,
            }
            writeln!(f)?;
        }
        writeln!(f, "Total invested: {:.2}€", self.total_invested)?;
        writeln!(f, "Cash: {:.2}€", self.cash)?;
        write!(f, "Total portfolio: {:.2}€", self.total)
    }
}

/// Capital and realized performance
#[derive(Debug, Clone, PartialEq)]
pub struct BalanceSummary {
    pub net_worth: Decimal,
    pub cash: Decimal,
    pub invested: Decimal,
    pub realized_pnl: Decimal,
    pub closed_trades: usize,
    pub win_rate: Decimal,
}

impl fmt::Display for BalanceSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "💰 BALANCE")?;
        writeln!(f)?;
        writeln!(f, "Current capital: {:.2}€", self.net_worth)?;
        writeln!(f, "  Cash: {:.2}€", self.cash)?;
        writeln!(f, "  Invested: {:.2}€", self.invested)?;
        writeln!(f)?;
        writeln!(f, "Realized P&L: {:.2}€", self.realized_pnl)?;
        writeln!(f, "Closed trades: {}", self.closed_trades)?;
        write!(f, "Win rate: {}%", self.win_rate)
    }
}

/// A trade singled out in the stats
#[derive(Debug, Clone, PartialEq)]
pub struct TradeHighlight {
    pub ticker: String,
    pub net_pnl: Decimal,
    pub pnl_pct: Decimal,
}

impl From<&TradeRecord> for TradeHighlight {
    fn from(r: &TradeRecord) -> Self {
        Self {
            ticker: r.ticker.clone(),
            net_pnl: r.net_pnl,
            pnl_pct: r.pnl_pct,
        }
    }
}

/// Win/loss statistics over closed trades
#[derive(Debug, Clone, PartialEq)]
pub enum TradeStats {
    /// No closed trades yet
    InsufficientData,
    Summary {
        count: usize,
        wins: usize,
        losses: usize,
        win_rate: Decimal,
        total_net_pnl: Decimal,
        best: TradeHighlight,
        worst: TradeHighlight,
    },
}

impl fmt::Display for TradeStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "📊 STATS")?;
        writeln!(f)?;
        match self {
            TradeStats::InsufficientData => {
                writeln!(f, "No closed trades yet.")?;
                write!(f, "Statistics will appear after your first sale.")
            }
            TradeStats::Summary {
                count,
                wins,
                losses,
                win_rate,
                total_net_pnl,
                best,
                worst,
            } => {
                writeln!(f, "Total trades: {count}")?;
                writeln!(f, "Win rate: {win_rate}% ({wins}W / {losses}L)")?;
                writeln!(f, "Total net P&L: {total_net_pnl:.2}€")?;
                writeln!(f)?;
                writeln!(
                    f,
                    "Best trade: {} {:+.2}€ ({:+.2}%)",
                    best.ticker, best.net_pnl, best.pnl_pct
                )?;
                write!(
                    f,
                    "Worst trade: {} {:+.2}€ ({:+.2}%)",
                    worst.ticker, worst.net_pnl, worst.pnl_pct
                )
            }
        }
    }
}

/// Win rate in percent, 1 decimal; 0 without trades
pub fn win_rate(wins: usize, total: usize) -> Decimal {
    if total == 0 {
        return Decimal::ZERO;
    }
    (Decimal::from(wins) / Decimal::from(total) * dec!(100)).round_dp(1)
}

/// Reports over a ledger
#[derive(Debug, Clone)]
pub struct Reporter {
    ledger: Ledger,
}

impl Reporter {
    pub fn new(ledger: Ledger) -> Self {
        Self { ledger }
    }

    pub async fn current_positions(&self) -> Result<PositionsReport> {
        let portfolio = self.ledger.read().await?;
        let positions: Vec<PositionLine> =
            portfolio.positions.iter().map(PositionLine::from).collect();
        let total_invested = portfolio.invested().round_dp(2);
        Ok(PositionsReport {
            positions,
            total_invested,
            cash: portfolio.cash_eur,
            total: total_invested.saturating_add(portfolio.cash_eur).round_dp(2),
        })
    }

    pub async fn balance_summary(&self) -> Result<BalanceSummary> {
        let portfolio = self.ledger.read().await?;
        let history = self.ledger.history().await?;

        let realized = total_net_pnl(&history);
        let wins = history
            .iter()
            .filter(|t| t.result == TradeResult::Win)
            .count();

        Ok(BalanceSummary {
            net_worth: portfolio.net_worth().round_dp(2),
            cash: portfolio.cash_eur,
            invested: portfolio.invested().round_dp(2),
            realized_pnl: realized.round_dp(2),
            closed_trades: history.len(),
            win_rate: win_rate(wins, history.len()),
        })
    }

    pub async fn stats(&self) -> Result<TradeStats> {
        Ok(summarize(&self.ledger.history().await?))
    }
}

fn total_net_pnl(trades: &[TradeRecord]) -> Decimal {
    trades
        .iter()
        .map(|t| t.net_pnl)
        .fold(Decimal::ZERO, Decimal::saturating_add)
}

/// Statistics over a trade list
pub fn summarize(trades: &[TradeRecord]) -> TradeStats {
    let (Some(best), Some(worst)) = (
        trades.iter().max_by_key(|t| t.net_pnl),
        trades.iter().min_by_key(|t| t.net_pnl),
    ) else {
        return TradeStats::InsufficientData;
    };

    let wins = trades
        .iter()
        .filter(|t| t.result == TradeResult::Win)
        .count();

    TradeStats::Summary {
        count: trades.len(),
        wins,
        losses: trades.len() - wins,
        win_rate: win_rate(wins, trades.len()),
        total_net_pnl: total_net_pnl(trades).round_dp(2),
        best: best.into(),
        worst: worst.into(),
    }
}
