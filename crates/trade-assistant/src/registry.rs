//! Blacklisted tickers and user tips

use crate::error::{AssistantError, Result};
use crate::ledger::normalize_ticker;
use crate::store::{DocumentStore, keys};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Outcome of a blacklist change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlacklistChange {
    Added,
    AlreadyPresent,
    Removed,
    NotPresent,
}

/// Outcome of a tip upsert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TipChange {
    Added,
    Updated,
}

/// An external opinion about a ticker, fed to the analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tip {
    pub ticker: String,
    pub context: String,
    /// Missing on tips recorded before dates were kept
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(default = "default_source")]
    pub source: String,
}

fn default_source() -> String {
    "user".to_string()
}

/// Blacklist and tips documents
#[derive(Debug, Clone)]
pub struct Registry {
    store: DocumentStore,
}

impl Registry {
    pub fn new(store: DocumentStore) -> Self {
        Self { store }
    }

    /// Blacklisted tickers in insertion order
    pub async fn blacklist(&self) -> Result<Vec<String>> {
        Ok(self
            .store
            .get_text(keys::BLACKLIST)
            .await?
            .map(|text| {
                text.lines()
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default())
    }

    pub async fn add_to_blacklist(&self, ticker: &str) -> Result<BlacklistChange> {
        let ticker = normalize_ticker(ticker)?;
        let mut tickers = self.blacklist().await?;
        if tickers.contains(&ticker) {
            return Ok(BlacklistChange::AlreadyPresent);
        }
        tickers.push(ticker);
        self.save_blacklist(&tickers).await?;
        Ok(BlacklistChange::Added)
    }

    pub async fn remove_from_blacklist(&self, ticker: &str) -> Result<BlacklistChange> {
        let ticker = normalize_ticker(ticker)?;
        let mut tickers = self.blacklist().await?;
        let before = tickers.len();
        tickers.retain(|t| *t != ticker);
        if tickers.len() == before {
            return Ok(BlacklistChange::NotPresent);
        }
        self.save_blacklist(&tickers).await?;
        Ok(BlacklistChange::Removed)
    }

    async fn save_blacklist(&self, tickers: &[String]) -> Result<()> {
        self.store.put_text(keys::BLACKLIST, &tickers.join("\n")).await
    }

    /// Active tips
    pub async fn tips(&self) -> Result<Vec<Tip>> {
        Ok(self.store.get_json(keys::TIPS).await?.unwrap_or_default())
    }

    /// Add a tip, or replace the context of the existing one for that ticker
    pub async fn upsert_tip(
        &self,
        ticker: &str,
        context: &str,
        today: NaiveDate,
    ) -> Result<TipChange> {
        let ticker = normalize_ticker(ticker)?;
        let context = context.trim();
        if context.is_empty() {
            return Err(AssistantError::InvalidArgument(
                "tip context must not be empty".to_string(),
            ));
        }

        let mut tips = self.tips().await?;
        let change = match tips.iter_mut().find(|t| t.ticker == ticker) {
            Some(tip) => {
                tip.context = context.to_string();
                tip.date = Some(today);
                TipChange::Updated
            }
            None => {
                tips.push(Tip {
                    ticker,
                    context: context.to_string(),
                    date: Some(today),
                    source: default_source(),
                });
                TipChange::Added
            }
        };

        self.store.put_json(keys::TIPS, &tips).await?;
        Ok(change)
    }

    /// Delete the tip for a ticker
    pub async fn remove_tip(&self, ticker: &str) -> Result<()> {
        let ticker = normalize_ticker(ticker)?;
        let mut tips = self.tips().await?;
        let before = tips.len();
        tips.retain(|t| t.ticker != ticker);
        if tips.len() == before {
            return Err(AssistantError::NotFound(format!("tip for {ticker}")));
        }
        self.store.put_json(keys::TIPS, &tips).await
    }
}
