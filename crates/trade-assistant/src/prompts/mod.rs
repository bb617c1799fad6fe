//! Daily analysis prompt
//!
//! Rendering is a pure function of its inputs: the same state and timestamp
//! always produce the same text.

mod template;

use crate::error::Result;
use crate::ledger::Portfolio;
use crate::market::MarketSnapshot;
use crate::registry::Tip;
use crate::rules::Rules;
use chrono::NaiveDateTime;
use minijinja::{Environment, context};
use rust_decimal::Decimal;
use serde::Serialize;

/// Number of recent trades shown to the model
pub const RECENT_TRADES_SHOWN: usize = 10;

/// Everything the daily prompt is built from
#[derive(Debug, Clone, Copy)]
pub struct PromptInputs<'a> {
    pub portfolio: &'a Portfolio,
    pub snapshot: &'a MarketSnapshot,
    pub rules: &'a Rules,
    pub blacklist: &'a [String],
    pub tips: &'a [Tip],
    pub recent_trades: &'a [serde_json::Value],
    pub patterns: &'a serde_json::Value,
    pub tax_rate: Decimal,
    pub timestamp: NaiveDateTime,
}

/// A held position priced against the snapshot
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionDetail {
    pub ticker: String,
    pub quantity: Decimal,
    pub entry_price: Decimal,
    pub current_price: Decimal,
    pub pnl_pct: Decimal,
    pub pnl_eur: Decimal,
    pub stop_loss_price: Decimal,
    pub target_price: Decimal,
    pub change_24h: Decimal,
}

/// Positions that have a quote in the snapshot
pub fn position_details(inputs: &PromptInputs<'_>) -> Vec<PositionDetail> {
    inputs
        .portfolio
        .positions
        .iter()
        .filter_map(|pos| {
            let quote = inputs.snapshot.get(&pos.ticker)?.quote()?;
            let current = quote.current_price;
            let pnl_pct = if pos.entry_price.is_zero() {
                Decimal::ZERO
            } else {
                // Only a gain can overflow; a loss stops at -100%
                (current - pos.entry_price)
                    .checked_div(pos.entry_price)
                    .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
                    .unwrap_or(Decimal::MAX)
                    .round_dp(2)
            };
            Some(PositionDetail {
                ticker: pos.ticker.clone(),
                quantity: pos.quantity,
                entry_price: pos.entry_price,
                current_price: current,
                pnl_pct,
                pnl_eur: current
                    .saturating_sub(pos.entry_price)
                    .saturating_mul(pos.quantity)
                    .round_dp(2),
                stop_loss_price: inputs.rules.stop_loss_price(pos.entry_price),
                target_price: inputs.rules.target_price(pos.entry_price),
                change_24h: quote.change_24h_pct,
            })
        })
        .collect()
}

fn pretty<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

/// Decimal without trailing zeros
fn plain(value: Decimal) -> String {
    value.normalize().to_string()
}

fn is_blank(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Null => true,
        serde_json::Value::Object(map) => map.is_empty(),
        serde_json::Value::Array(items) => items.is_empty(),
        serde_json::Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

/// Render the daily analysis prompt
pub fn build_prompt(inputs: &PromptInputs<'_>) -> Result<String> {
    let details = position_details(inputs);

    let recent = &inputs.recent_trades
        [inputs.recent_trades.len().saturating_sub(RECENT_TRADES_SHOWN)..];

    // Empty sections render as an empty string so the template shows its placeholder
    let positions = if details.is_empty() {
        String::new()
    } else {
        pretty(&details)?
    };
    let recent_trades = if recent.is_empty() {
        String::new()
    } else {
        pretty(recent)?
    };
    let patterns = if is_blank(inputs.patterns) {
        String::new()
    } else {
        pretty(inputs.patterns)?
    };
    let tips = if inputs.tips.is_empty() {
        String::new()
    } else {
        pretty(inputs.tips)?
    };

    let trading = &inputs.rules.trading_rules;
    let costs = &inputs.rules.costs;

    let env = Environment::new();
    let rendered = env.render_str(
        template::DAILY_ANALYSIS,
        context! {
            timestamp => inputs.timestamp.format("%d/%m/%Y %H:%M").to_string(),
            net_worth => format!("{:.2}", inputs.portfolio.net_worth()),
            cash => format!("{:.2}", inputs.portfolio.cash_eur),
            position_count => details.len(),
            positions,
            market_data => pretty(inputs.snapshot)?,
            recent_trades,
            patterns,
            rules => context! {
                stop_loss_percent => plain(trading.stop_loss_percent),
                target_profit_percent => plain(trading.target_profit_percent),
                max_positions => trading.max_positions,
                min_cash_reserve_eur => plain(trading.min_cash_reserve_eur),
            },
            costs => context! {
                commission_eur => plain(costs.commission_eur),
                spread_percent_estimate => plain(costs.spread_percent_estimate),
                fx_spread_percent_usd_eur => plain(costs.fx_spread_percent_usd_eur),
            },
            tax_percent => plain(inputs.tax_rate * Decimal::ONE_HUNDRED),
            blacklist => inputs.blacklist,
            tips,
        },
    )?;

    Ok(rendered)
}
