//! Chat command bot
//!
//! [`CommandRouter`] turns one chat line into one reply. It never fails:
//! foreseeable problems (bad arguments, unheld tickers, overselling) get a
//! specific reply and anything else is logged and acknowledged generically.
//! [`TelegramPoller`] feeds it messages from the configured chat.

pub mod commands;
pub mod poller;

pub use commands::{Command, ParseError};
pub use poller::TelegramPoller;

use crate::error::{AssistantError, Result};
use crate::ledger::{Clock, Ledger, local_now};
use crate::registry::{BlacklistChange, Registry, Tip, TipChange};
use crate::reporting::Reporter;
use async_trait::async_trait;
use std::fmt::Write as _;
use std::sync::Arc;

/// Starts a daily analysis without waiting for it
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AnalysisTrigger: Send + Sync {
    async fn launch(&self) -> Result<()>;
}

/// Dispatches chat commands to the ledger, reports and registry
pub struct CommandRouter {
    ledger: Ledger,
    reporter: Reporter,
    registry: Registry,
    trigger: Arc<dyn AnalysisTrigger>,
    clock: Clock,
}

impl CommandRouter {
    pub fn new(
        ledger: Ledger,
        reporter: Reporter,
        registry: Registry,
        trigger: Arc<dyn AnalysisTrigger>,
    ) -> Self {
        Self {
            ledger,
            reporter,
            registry,
            trigger,
            clock: local_now,
        }
    }

    /// Override the clock used to date tips
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Reply to one chat line; `None` when the line is not a command
    pub async fn handle(&self, text: &str) -> Option<String> {
        let command = match Command::parse(text)? {
            Ok(command) => command,
            Err(e) => {
                tracing::info!("Rejected command {:?}: {:?}", text.trim(), e);
                return Some(e.to_string());
            }
        };

        let name = command.name();
        tracing::info!(command = name, "Handling command");

        let reply = match self.dispatch(command).await {
            Ok(reply) => reply,
            Err(e) => error_reply(name, &e),
        };
        Some(reply)
    }

    async fn dispatch(&self, command: Command) -> Result<String> {
        let reply = match command {
            Command::Buy {
                ticker,
                quantity,
                price,
            } => self
                .ledger
                .apply_buy(&ticker, quantity, price)
                .await?
                .to_string(),
            Command::Sell {
                ticker,
                quantity,
                price,
            } => self
                .ledger
                .apply_sell(&ticker, quantity, price)
                .await?
                .to_string(),
            Command::Portfolio => self.reporter.current_positions().await?.to_string(),
            Command::Balance => self.reporter.balance_summary().await?.to_string(),
            Command::Stats => self.reporter.stats().await?.to_string(),
            Command::Blacklist { ticker } => {
                blacklist_reply(self.registry.add_to_blacklist(&ticker).await?, &ticker)
            }
            Command::RemoveBlacklist { ticker } => {
                blacklist_reply(self.registry.remove_from_blacklist(&ticker).await?, &ticker)
            }
            Command::Blacklists => blacklist_listing(&self.registry.blacklist().await?),
            Command::Tip { ticker, context } => {
                let today = (self.clock)().date();
                match self.registry.upsert_tip(&ticker, &context, today).await? {
                    TipChange::Added => format!(
                        "✅ Tip added\n{ticker}: {context}\nIt will be considered in the next analysis"
                    ),
                    TipChange::Updated => format!("✅ Tip updated\n{ticker}: {context}"),
                }
            }
            Command::RemoveTip { ticker } => match self.registry.remove_tip(&ticker).await {
                Ok(()) => format!("✅ Tip for {ticker} removed"),
                Err(AssistantError::NotFound(_)) => format!("❌ No tip for {ticker}"),
                Err(e) => return Err(e),
            },
            Command::Tips => tips_listing(&self.registry.tips().await?),
            Command::Run => {
                self.trigger.launch().await?;
                "⚡ Analysis launched\nYou will receive the result in a few moments".to_string()
            }
            Command::Help => Command::help_text().to_string(),
        };
        Ok(reply)
    }
}

fn error_reply(command: &str, err: &AssistantError) -> String {
    if !err.is_user_facing() {
        tracing::error!("Command /{} failed: {}", command, err);
        return format!("❌ Could not complete /{command}, please try again later");
    }

    match err {
        AssistantError::NotFound(ticker) => format!("❌ No open position in {ticker}"),
        AssistantError::InsufficientQuantity { ticker, held, .. } => {
            format!("❌ You only hold {held} shares of {ticker}")
        }
        other => format!("❌ {other}"),
    }
}

fn blacklist_reply(change: BlacklistChange, ticker: &str) -> String {
    match change {
        BlacklistChange::Added => format!(
            "✅ {ticker} added to the blacklist\nIt will not be recommended in future analyses"
        ),
        BlacklistChange::AlreadyPresent => format!("⚠️ {ticker} is already blacklisted"),
        BlacklistChange::Removed => {
            format!("✅ {ticker} removed from the blacklist\nIt can be recommended again")
        }
        BlacklistChange::NotPresent => format!("❌ {ticker} is not in the blacklist"),
    }
}

fn blacklist_listing(tickers: &[String]) -> String {
    if tickers.is_empty() {
        return "🚫 BLACKLIST\n\nNo blocked tickers.".to_string();
    }
    format!("🚫 BLACKLIST\n\n{}", tickers.join("\n"))
}

fn tips_listing(tips: &[Tip]) -> String {
    if tips.is_empty() {
        return "💡 ACTIVE TIPS\n\nNo pending tips.".to_string();
    }
    let mut out = String::from("💡 ACTIVE TIPS\n");
    for tip in tips {
        let added = tip
            .date
            .map_or_else(|| "N/A".to_string(), |d| d.format("%d/%m/%Y").to_string());
        let _ = write!(out, "\n{}: {}\nAdded: {}\n", tip.ticker, tip.context, added);
    }
    out.trim_end().to_string()
}
