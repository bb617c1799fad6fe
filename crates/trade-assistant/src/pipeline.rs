//! Daily analysis run
//!
//! Loads the ledger and registry state, pulls a market snapshot, asks the
//! analyzer for a report and delivers it to the chat. A run log is written
//! afterwards; losing it does not fail the run.

use crate::analyzer::Analyzer;
use crate::bot::AnalysisTrigger;
use crate::error::Result;
use crate::ledger::{Clock, Ledger, local_now};
use crate::market::SnapshotFetcher;
use crate::notify::Notifier;
use crate::prompts::{PromptInputs, RECENT_TRADES_SHOWN, build_prompt};
use crate::registry::Registry;
use crate::rules::Rules;
use crate::store::{DocumentStore, keys};
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinSet;

/// What a successful run produced
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub portfolio_value: Decimal,
    pub analysis_length: usize,
    pub messages_sent: usize,
}

#[derive(Debug, Serialize)]
struct RunLog {
    date: NaiveDate,
    timestamp: NaiveDateTime,
    portfolio_value: Decimal,
    analysis_length: usize,
    execution: &'static str,
}

/// The scheduled daily analysis
pub struct DailyAnalysis {
    store: DocumentStore,
    ledger: Ledger,
    registry: Registry,
    fetcher: SnapshotFetcher,
    analyzer: Arc<dyn Analyzer>,
    notifier: Notifier,
    clock: Clock,
}

impl DailyAnalysis {
    pub fn new(
        store: DocumentStore,
        ledger: Ledger,
        fetcher: SnapshotFetcher,
        analyzer: Arc<dyn Analyzer>,
        notifier: Notifier,
    ) -> Self {
        Self {
            registry: Registry::new(store.clone()),
            store,
            ledger,
            fetcher,
            analyzer,
            notifier,
            clock: local_now,
        }
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Run once; failures are logged and returned
    pub async fn run(&self) -> Result<RunSummary> {
        tracing::info!("🚀 Starting daily analysis");
        match self.execute().await {
            Ok(summary) => {
                tracing::info!(
                    messages = summary.messages_sent,
                    "✅ Daily analysis completed ({} chars)",
                    summary.analysis_length
                );
                Ok(summary)
            }
            Err(e) => {
                tracing::error!("❌ Daily analysis failed: {}", e);
                Err(e)
            }
        }
    }

    async fn execute(&self) -> Result<RunSummary> {
        let now = (self.clock)();

        let portfolio = self.ledger.read().await?;
        let recent_trades = self.recent_trades().await?;
        let patterns = self
            .store
            .get_json::<Value>(keys::PATTERNS)
            .await?
            .unwrap_or(Value::Null);
        let blacklist = self.registry.blacklist().await?;
        let mut rules = self
            .store
            .get_json::<Rules>(keys::RULES)
            .await?
            .unwrap_or_default();
        // The analysis must quote the fee the ledger charges
        rules.costs.commission_eur = self.ledger.fees().commission;
        let tips = self.registry.tips().await?;

        tracing::info!(
            "Portfolio: {} positions, {:.2}€ cash",
            portfolio.positions.len(),
            portfolio.cash_eur
        );

        let snapshot = self.fetcher.fetch(&portfolio).await;

        let prompt = build_prompt(&PromptInputs {
            portfolio: &portfolio,
            snapshot: &snapshot,
            rules: &rules,
            blacklist: &blacklist,
            tips: &tips,
            recent_trades: &recent_trades,
            patterns: &patterns,
            tax_rate: self.ledger.fees().tax_rate,
            timestamp: now,
        })?;

        let analysis = self.analyzer.analyze(&prompt).await?;

        let message = format!(
            "📊 DAILY ANALYSIS - {}\n\n{}",
            now.format("%d/%m/%Y %H:%M"),
            analysis.text
        );
        let messages_sent = self.notifier.send(&message).await?;

        let summary = RunSummary {
            portfolio_value: portfolio.net_worth(),
            analysis_length: analysis.text.chars().count(),
            messages_sent,
        };

        let log = RunLog {
            date: now.date(),
            timestamp: now,
            portfolio_value: summary.portfolio_value,
            analysis_length: summary.analysis_length,
            execution: "success",
        };
        if let Err(e) = self.store.put_json(&keys::daily_log(now.date()), &log).await {
            tracing::warn!("Analysis delivered but the run log was not saved: {}", e);
        }

        Ok(summary)
    }

    /// Recent trades document, or the tail of the trade history when absent
    async fn recent_trades(&self) -> Result<Vec<Value>> {
        if let Some(trades) = self.store.get_json::<Vec<Value>>(keys::RECENT_TRADES).await? {
            return Ok(trades);
        }

        let history = self.ledger.history().await?;
        let tail = &history[history.len().saturating_sub(RECENT_TRADES_SHOWN)..];
        Ok(tail
            .iter()
            .map(serde_json::to_value)
            .collect::<std::result::Result<Vec<Value>, serde_json::Error>>()?)
    }
}

/// Runs the daily analysis on a background task
pub struct BackgroundTrigger {
    pipeline: Arc<DailyAnalysis>,
    tasks: Mutex<JoinSet<()>>,
}

impl BackgroundTrigger {
    pub fn new(pipeline: Arc<DailyAnalysis>) -> Self {
        Self {
            pipeline,
            tasks: Mutex::new(JoinSet::new()),
        }
    }

    /// Wait for every launched run to finish
    pub async fn wait(&self) {
        let mut tasks = self.tasks.lock().await;
        while tasks.join_next().await.is_some() {}
    }
}

#[async_trait]
impl AnalysisTrigger for BackgroundTrigger {
    async fn launch(&self) -> Result<()> {
        let pipeline = Arc::clone(&self.pipeline);
        let mut tasks = self.tasks.lock().await;
        while tasks.try_join_next().is_some() {}
        tasks.spawn(async move {
            // run() already logs its own failure
            let _ = pipeline.run().await;
        });
        tracing::info!("Daily analysis launched in background");
        Ok(())
    }
}
