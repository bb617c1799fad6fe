//! Application wiring
//!
//! [`AppContext`] is built once at startup from an [`AssistantConfig`] and
//! hands out the components every entry point needs.

use crate::analyzer::{Analyzer, LlmAnalyzer, StubAnalyzer};
use crate::bot::{CommandRouter, TelegramPoller};
use crate::config::{AssistantConfig, StorageBackend};
use crate::error::{AssistantError, Result};
use crate::ledger::Ledger;
use crate::market::{QuoteProvider, SnapshotFetcher, StaticQuoteProvider, YahooQuoteProvider};
use crate::notify::{ChatTransport, ConsoleTransport, Notifier, TelegramClient};
use crate::pipeline::{BackgroundTrigger, DailyAnalysis};
use crate::registry::Registry;
use crate::reporting::Reporter;
use crate::store::{DocumentStore, LocalStore, MemoryStore, ObjectStore, S3Store};
use std::sync::Arc;
use trader_llm::providers::AnthropicProvider;

/// Where replies and reports are delivered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// The configured Telegram chat; mock mode without Telegram prints instead
    Chat,
    /// Always print to stdout
    Console,
}

/// Components shared by every entry point
pub struct AppContext {
    pub config: AssistantConfig,
    pub store: DocumentStore,
    pub ledger: Ledger,
    pub registry: Registry,
    pub reporter: Reporter,
    pub notifier: Notifier,
    pub pipeline: Arc<DailyAnalysis>,
    pub trigger: Arc<BackgroundTrigger>,
    telegram: Option<TelegramClient>,
}

impl AppContext {
    pub async fn build(config: AssistantConfig, delivery: Delivery) -> Result<Self> {
        config.validate()?;

        if config.mock_mode {
            tracing::warn!("🧪 MOCK MODE: static quotes and stub analysis");
        }

        let store = open_store(&config).await?;
        tracing::info!("Using {} storage", store.backend_name());

        let ledger = Ledger::from_config(store.clone(), &config);
        let registry = Registry::new(store.clone());
        let reporter = Reporter::new(ledger.clone());

        let telegram = match (&config.telegram_token, delivery) {
            (Some(token), Delivery::Chat) => Some(TelegramClient::new(token.clone())?),
            _ => None,
        };
        let notifier = notifier(&config, delivery, telegram.as_ref())?;

        let fetcher = SnapshotFetcher::from_config(quote_provider(&config), &config);
        let pipeline = Arc::new(DailyAnalysis::new(
            store.clone(),
            ledger.clone(),
            fetcher,
            analyzer(&config)?,
            notifier.clone(),
        ));
        let trigger = Arc::new(BackgroundTrigger::new(Arc::clone(&pipeline)));

        Ok(Self {
            config,
            store,
            ledger,
            registry,
            reporter,
            notifier,
            pipeline,
            trigger,
            telegram,
        })
    }

    /// Command router wired to this context
    pub fn router(&self) -> CommandRouter {
        CommandRouter::new(
            self.ledger.clone(),
            self.reporter.clone(),
            self.registry.clone(),
            self.trigger.clone(),
        )
    }

    /// Telegram poller for the configured chat
    pub fn poller(&self) -> Result<TelegramPoller> {
        let client = self.telegram.clone().ok_or_else(|| {
            AssistantError::Config("bot mode needs TELEGRAM_TOKEN and TELEGRAM_CHAT_ID".into())
        })?;
        Ok(TelegramPoller::new(
            client,
            self.router(),
            self.notifier.clone(),
        ))
    }
}

async fn open_store(config: &AssistantConfig) -> Result<DocumentStore> {
    let backend: Arc<dyn ObjectStore> = match config.storage_backend {
        StorageBackend::Local => Arc::new(LocalStore::new(config.data_dir.clone())),
        StorageBackend::S3 => {
            let bucket = config
                .s3_bucket
                .clone()
                .ok_or_else(|| AssistantError::Config("S3_BUCKET is required".into()))?;
            Arc::new(S3Store::connect(bucket, config.aws_region.clone()).await)
        }
        StorageBackend::Memory => Arc::new(MemoryStore::new()),
    };
    Ok(DocumentStore::new(backend))
}

fn quote_provider(config: &AssistantConfig) -> Arc<dyn QuoteProvider> {
    if config.mock_mode {
        Arc::new(StaticQuoteProvider::default())
    } else {
        Arc::new(YahooQuoteProvider::new())
    }
}

fn analyzer(config: &AssistantConfig) -> Result<Arc<dyn Analyzer>> {
    if config.mock_mode {
        return Ok(Arc::new(StubAnalyzer::default()));
    }
    let provider = AnthropicProvider::new(config.require_anthropic_key()?)?;
    Ok(Arc::new(LlmAnalyzer::from_config(Arc::new(provider), config)))
}

fn notifier(
    config: &AssistantConfig,
    delivery: Delivery,
    telegram: Option<&TelegramClient>,
) -> Result<Notifier> {
    let transport: Arc<dyn ChatTransport> = match (delivery, telegram) {
        (Delivery::Chat, Some(client)) => Arc::new(client.clone()),
        (Delivery::Chat, None) if !config.mock_mode => {
            // Reports the missing keys
            config.require_telegram()?;
            Arc::new(ConsoleTransport)
        }
        _ => Arc::new(ConsoleTransport),
    };

    let chat_id = match (delivery, config.telegram_chat_id.as_deref()) {
        (Delivery::Chat, Some(id)) => id.to_string(),
        (Delivery::Chat, None) if !config.mock_mode => config.require_telegram()?.1.to_string(),
        _ => "console".to_string(),
    };

    Ok(Notifier::new(transport, chat_id).with_limit(config.message_limit))
}
