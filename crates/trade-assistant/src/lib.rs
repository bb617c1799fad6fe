//! Personal trading assistant
//!
//! Keeps a ledger of open positions and realized trades, answers chat
//! commands about it, and once a day sends an LLM-written analysis of the
//! portfolio against a fresh market snapshot.
//!
//! # Architecture
//!
//! - `store`: JSON/text documents over local files, S3 or memory
//! - `ledger`: buys, sells, weighted entry prices and realized P&L
//! - `reporting`: positions, balance and stats views
//! - `registry`: ticker blacklist and user tips
//! - `market`: per-ticker quotes with failure isolation
//! - `prompts` / `analyzer`: prompt rendering and the LLM call
//! - `notify`: chat delivery with message splitting
//! - `bot`: `/command` parsing, dispatch and the Telegram poller
//! - `pipeline`: the daily analysis run
//!
//! # Example
//!
//! ```rust,ignore
//! use trade_assistant::{AppContext, AssistantConfig, Delivery};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = AssistantConfig::from_env()?;
//!     let ctx = AppContext::build(config, Delivery::Console).await?;
//!
//!     if let Some(reply) = ctx.router().handle("/portfolio").await {
//!         println!("{reply}");
//!     }
//!     Ok(())
//! }
//! ```

pub mod analyzer;
pub mod bot;
pub mod config;
pub mod context;
pub mod error;
pub mod ledger;
pub mod market;
pub mod notify;
pub mod pipeline;
pub mod prompts;
pub mod registry;
pub mod reporting;
pub mod rules;
pub mod store;

// Re-export main types for convenience
pub use analyzer::{Analysis, Analyzer, LlmAnalyzer, StubAnalyzer};
pub use bot::{Command, CommandRouter, TelegramPoller};
pub use config::{AssistantConfig, StorageBackend};
pub use context::{AppContext, Delivery};
pub use error::{AssistantError, Result};
pub use ledger::{Fees, Ledger, Portfolio, Position, TradeRecord};
pub use notify::{Notifier, split_message};
pub use pipeline::{BackgroundTrigger, DailyAnalysis, RunSummary};
pub use rules::Rules;
pub use store::DocumentStore;
