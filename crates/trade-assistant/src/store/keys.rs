//! Document keys

use chrono::NaiveDate;

pub const PORTFOLIO: &str = "portfolio/current_positions.json";
pub const TRADE_HISTORY: &str = "history/operations_full.csv";
pub const RECENT_TRADES: &str = "history/last_30_trades.json";
pub const PATTERNS: &str = "learning/patterns_learned.json";
pub const BLACKLIST: &str = "external/tickers_blacklist.txt";
pub const TIPS: &str = "external/user_tips.json";
pub const RULES: &str = "config/rules.json";

/// Run log key for a given day
pub fn daily_log(date: NaiveDate) -> String {
    format!("logs/daily_analysis_{}.json", date.format("%Y-%m-%d"))
}
