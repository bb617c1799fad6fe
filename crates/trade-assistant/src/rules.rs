//! Trading rules document

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Thresholds the analysis is asked to respect
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TradingRules {
    /// Stop-loss distance from entry, in percent (negative)
    pub stop_loss_percent: Decimal,
    /// Take-profit distance from entry, in percent
    pub target_profit_percent: Decimal,
    pub max_positions: u32,
    pub min_cash_reserve_eur: Decimal,
}

impl Default for TradingRules {
    fn default() -> Self {
        Self {
            stop_loss_percent: dec!(-8),
            target_profit_percent: dec!(15),
            max_positions: 5,
            min_cash_reserve_eur: dec!(200),
        }
    }
}

/// Broker cost model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrokerCosts {
    pub commission_eur: Decimal,
    pub spread_percent_estimate: Decimal,
    pub fx_spread_percent_usd_eur: Decimal,
}

impl Default for BrokerCosts {
    fn default() -> Self {
        Self {
            commission_eur: dec!(1),
            spread_percent_estimate: dec!(0.1),
            fx_spread_percent_usd_eur: dec!(0.25),
        }
    }
}

/// Contents of `config/rules.json`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Rules {
    pub trading_rules: TradingRules,
    #[serde(rename = "trade_republic_costs")]
    pub costs: BrokerCosts,
}

impl Rules {
    /// Stop-loss price for an entry
    pub fn stop_loss_price(&self, entry: Decimal) -> Decimal {
        entry
            .saturating_mul(Decimal::ONE + self.trading_rules.stop_loss_percent / dec!(100))
            .round_dp(2)
    }

    /// Target price for an entry
    pub fn target_price(&self, entry: Decimal) -> Decimal {
        entry
            .saturating_mul(Decimal::ONE + self.trading_rules.target_profit_percent / dec!(100))
            .round_dp(2)
    }
}
