//! Configuration for the trading assistant

use crate::error::{AssistantError, Result};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use trader_utils::Environment;

/// Where documents are persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Files under a local directory (default)
    #[default]
    Local,
    /// S3 bucket
    S3,
    /// Process memory, lost on exit
    Memory,
}

impl std::str::FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "local" | "file" | "fs" => Ok(Self::Local),
            "s3" => Ok(Self::S3),
            "memory" | "mem" => Ok(Self::Memory),
            other => Err(format!("unknown storage backend '{other}'")),
        }
    }
}

/// Configuration for the trading assistant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantConfig {
    /// Storage backend
    pub storage_backend: StorageBackend,

    /// Root directory for the local backend
    pub data_dir: PathBuf,

    /// Bucket for the S3 backend
    pub s3_bucket: Option<String>,

    /// AWS region for the S3 backend
    pub aws_region: String,

    /// Anthropic API key
    #[serde(skip_serializing)]
    pub anthropic_api_key: Option<String>,

    /// Model used for the daily analysis
    pub model: String,

    /// Completion budget for the daily analysis
    pub max_tokens: usize,

    /// Telegram bot token
    #[serde(skip_serializing)]
    pub telegram_token: Option<String>,

    /// The only chat the bot talks to
    pub telegram_chat_id: Option<String>,

    /// Use stub analyzer and static quotes
    pub mock_mode: bool,

    /// Cash of a first-run portfolio
    pub initial_cash: Decimal,

    /// Tax rate applied to positive realized gains
    pub tax_rate: Decimal,

    /// Broker commission per order
    pub commission: Decimal,

    /// Tickers always included in the market snapshot
    pub always_include: Vec<String>,

    /// Quote history window, in days
    pub lookback_days: i64,

    /// Minimum spacing between quote requests
    pub quote_spacing: Duration,

    /// Maximum characters per chat message
    pub message_limit: usize,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            storage_backend: StorageBackend::Local,
            data_dir: PathBuf::from("data"),
            s3_bucket: None,
            aws_region: "eu-west-1".to_string(),
            anthropic_api_key: None,
            model: "claude-sonnet-4-5".to_string(),
            max_tokens: 4000,
            telegram_token: None,
            telegram_chat_id: None,
            mock_mode: false,
            initial_cash: dec!(2300),
            tax_rate: dec!(0.19),
            commission: dec!(1),
            always_include: vec!["BTC-USD".to_string(), "ETH-USD".to_string()],
            lookback_days: 5,
            quote_spacing: Duration::from_millis(500),
            message_limit: 4000,
        }
    }
}

impl AssistantConfig {
    /// Create a new configuration builder
    pub fn builder() -> AssistantConfigBuilder {
        AssistantConfigBuilder::default()
    }

    /// Load `.env` and read the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_environment(&Environment::load())
    }

    /// Read configuration from an environment snapshot
    pub fn from_environment(env: &Environment) -> Result<Self> {
        let mut builder = Self::builder().mock_mode(env.flag("MOCK_MODE"));

        if let Some(backend) = env.parse::<StorageBackend>("STORAGE_BACKEND")? {
            builder = builder.storage_backend(backend);
        }
        if let Some(dir) = env.get("DATA_DIR") {
            builder = builder.data_dir(dir);
        }
        if let Some(bucket) = env.get("S3_BUCKET") {
            builder = builder.s3_bucket(bucket);
        }
        if let Some(region) = env.get("AWS_REGION") {
            builder = builder.aws_region(region);
        }
        if let Some(key) = env.get_any(&["ANTHROPIC_API_KEY", "CLAUDE_API_KEY"]) {
            builder = builder.anthropic_api_key(key);
        }
        if let Some(model) = env.get("ANTHROPIC_MODEL") {
            builder = builder.model(model);
        }
        if let Some(token) = env.get("TELEGRAM_TOKEN") {
            builder = builder.telegram_token(token);
        }
        if let Some(chat_id) = env.get("TELEGRAM_CHAT_ID") {
            builder = builder.telegram_chat_id(chat_id);
        }
        if let Some(cash) = env.parse::<Decimal>("INITIAL_CASH_EUR")? {
            builder = builder.initial_cash(cash);
        }
        if let Some(rate) = env.parse::<Decimal>("TAX_RATE")? {
            builder = builder.tax_rate(rate);
        }
        if let Some(commission) = env.parse::<Decimal>("COMMISSION_EUR")? {
            builder = builder.commission(commission);
        }

        builder.build()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.storage_backend == StorageBackend::S3 && self.s3_bucket.is_none() {
            return Err(AssistantError::Config(
                "S3_BUCKET required when using the s3 storage backend".to_string(),
            ));
        }

        if self.initial_cash < Decimal::ZERO {
            return Err(AssistantError::Config(
                "INITIAL_CASH_EUR must not be negative".to_string(),
            ));
        }

        if self.tax_rate < Decimal::ZERO || self.tax_rate >= Decimal::ONE {
            return Err(AssistantError::Config(
                "TAX_RATE must be in [0, 1)".to_string(),
            ));
        }

        if self.commission < Decimal::ZERO {
            return Err(AssistantError::Config(
                "COMMISSION_EUR must not be negative".to_string(),
            ));
        }

        if self.message_limit == 0 {
            return Err(AssistantError::Config(
                "message_limit must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// API key for the live analyzer
    pub fn require_anthropic_key(&self) -> Result<&str> {
        self.anthropic_api_key.as_deref().ok_or_else(|| {
            AssistantError::Config("missing required configuration key: ANTHROPIC_API_KEY".into())
        })
    }

    /// Token and chat id for the Telegram transport
    pub fn require_telegram(&self) -> Result<(&str, &str)> {
        let token = self.telegram_token.as_deref().ok_or_else(|| {
            AssistantError::Config("missing required configuration key: TELEGRAM_TOKEN".into())
        })?;
        let chat_id = self.telegram_chat_id.as_deref().ok_or_else(|| {
            AssistantError::Config("missing required configuration key: TELEGRAM_CHAT_ID".into())
        })?;
        Ok((token, chat_id))
    }
}

/// Builder for AssistantConfig
#[derive(Debug, Default)]
pub struct AssistantConfigBuilder {
    storage_backend: Option<StorageBackend>,
    data_dir: Option<PathBuf>,
    s3_bucket: Option<String>,
    aws_region: Option<String>,
    anthropic_api_key: Option<String>,
    model: Option<String>,
    max_tokens: Option<usize>,
    telegram_token: Option<String>,
    telegram_chat_id: Option<String>,
    mock_mode: Option<bool>,
    initial_cash: Option<Decimal>,
    tax_rate: Option<Decimal>,
    commission: Option<Decimal>,
    always_include: Option<Vec<String>>,
    lookback_days: Option<i64>,
    quote_spacing: Option<Duration>,
    message_limit: Option<usize>,
}

impl AssistantConfigBuilder {
    /// Set the storage backend
    pub fn storage_backend(mut self, backend: StorageBackend) -> Self {
        self.storage_backend = Some(backend);
        self
    }

    /// Set the local data directory
    pub fn data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = Some(dir.into());
        self
    }

    /// Set the S3 bucket
    pub fn s3_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.s3_bucket = Some(bucket.into());
        self
    }

    /// Set the AWS region
    pub fn aws_region(mut self, region: impl Into<String>) -> Self {
        self.aws_region = Some(region.into());
        self
    }

    /// Set the Anthropic API key
    pub fn anthropic_api_key(mut self, key: impl Into<String>) -> Self {
        self.anthropic_api_key = Some(key.into());
        self
    }

    /// Set the analysis model
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set the completion budget
    pub fn max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Set the Telegram bot token
    pub fn telegram_token(mut self, token: impl Into<String>) -> Self {
        self.telegram_token = Some(token.into());
        self
    }

    /// Set the authorized Telegram chat
    pub fn telegram_chat_id(mut self, chat_id: impl Into<String>) -> Self {
        self.telegram_chat_id = Some(chat_id.into());
        self
    }

    /// Enable or disable mock mode
    pub fn mock_mode(mut self, enabled: bool) -> Self {
        self.mock_mode = Some(enabled);
        self
    }

    /// Set first-run cash
    pub fn initial_cash(mut self, cash: Decimal) -> Self {
        self.initial_cash = Some(cash);
        self
    }

    /// Set the tax rate
    pub fn tax_rate(mut self, rate: Decimal) -> Self {
        self.tax_rate = Some(rate);
        self
    }

    /// Set the per-order commission
    pub fn commission(mut self, commission: Decimal) -> Self {
        self.commission = Some(commission);
        self
    }

    /// Set the always-included tickers
    pub fn always_include(mut self, tickers: Vec<String>) -> Self {
        self.always_include = Some(tickers);
        self
    }

    /// Set the quote history window
    pub fn lookback_days(mut self, days: i64) -> Self {
        self.lookback_days = Some(days);
        self
    }

    /// Set the spacing between quote requests
    pub fn quote_spacing(mut self, spacing: Duration) -> Self {
        self.quote_spacing = Some(spacing);
        self
    }

    /// Set the per-message character limit
    pub fn message_limit(mut self, limit: usize) -> Self {
        self.message_limit = Some(limit);
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<AssistantConfig> {
        let defaults = AssistantConfig::default();

        let config = AssistantConfig {
            storage_backend: self.storage_backend.unwrap_or(defaults.storage_backend),
            data_dir: self.data_dir.unwrap_or(defaults.data_dir),
            s3_bucket: self.s3_bucket,
            aws_region: self.aws_region.unwrap_or(defaults.aws_region),
            anthropic_api_key: self.anthropic_api_key,
            model: self.model.unwrap_or(defaults.model),
            max_tokens: self.max_tokens.unwrap_or(defaults.max_tokens),
            telegram_token: self.telegram_token,
            telegram_chat_id: self.telegram_chat_id,
            mock_mode: self.mock_mode.unwrap_or(defaults.mock_mode),
            initial_cash: self.initial_cash.unwrap_or(defaults.initial_cash),
            tax_rate: self.tax_rate.unwrap_or(defaults.tax_rate),
            commission: self.commission.unwrap_or(defaults.commission),
            always_include: self.always_include.unwrap_or(defaults.always_include),
            lookback_days: self.lookback_days.unwrap_or(defaults.lookback_days),
            quote_spacing: self.quote_spacing.unwrap_or(defaults.quote_spacing),
            message_limit: self.message_limit.unwrap_or(defaults.message_limit),
        };

        config.validate()?;
        Ok(config)
    }
}
