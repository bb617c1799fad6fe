//! Error types for the trading assistant

use rust_decimal::Decimal;
use thiserror::Error;

/// Trading assistant errors
#[derive(Debug, Error)]
pub enum AssistantError {
    /// Bad arguments (non-positive quantity/price, malformed values)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Ticker not held, tip absent, etc.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Selling more than the position holds
    #[error("Insufficient quantity for {ticker}: held {held}, requested {requested}")]
    InsufficientQuantity {
        ticker: String,
        held: Decimal,
        requested: Decimal,
    },

    /// Market data, chat transport or other upstream service failure
    #[error("Upstream error from {service}: {detail}")]
    Upstream { service: String, detail: String },

    /// Storage read/write failure (never used for "key absent")
    #[error("Store error on {key}: {detail}")]
    Store { key: String, detail: String },

    /// LLM provider error
    #[error("LLM error: {0}")]
    Llm(#[from] trader_llm::LLMError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Trade history encoding error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Prompt template rendering error
    #[error("Template error: {0}")]
    Template(#[from] minijinja::Error),
}

/// Result type alias for assistant operations
pub type Result<T> = std::result::Result<T, AssistantError>;

impl AssistantError {
    /// Build an upstream error
    pub fn upstream(service: impl Into<String>, detail: impl ToString) -> Self {
        Self::Upstream {
            service: service.into(),
            detail: detail.to_string(),
        }
    }

    /// Build a store error
    pub fn store(key: impl Into<String>, detail: impl ToString) -> Self {
        Self::Store {
            key: key.into(),
            detail: detail.to_string(),
        }
    }

    /// Foreseeable errors caused by the request itself; these become
    /// specific chat replies instead of a generic failure
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            AssistantError::InvalidArgument(_)
                | AssistantError::NotFound(_)
                | AssistantError::InsufficientQuantity { .. }
        )
    }
}

impl From<trader_utils::EnvError> for AssistantError {
    fn from(err: trader_utils::EnvError) -> Self {
        AssistantError::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_error_display() {
        let err = AssistantError::InsufficientQuantity {
            ticker: "AAPL".to_string(),
            held: dec!(2),
            requested: dec!(3),
        };
        assert_eq!(
            err.to_string(),
            "Insufficient quantity for AAPL: held 2, requested 3"
        );

        let err = AssistantError::store("portfolio/current_positions.json", "timeout");
        assert_eq!(
            err.to_string(),
            "Store error on portfolio/current_positions.json: timeout"
        );
    }

    #[test]
    fn test_user_facing_classification() {
        assert!(AssistantError::NotFound("AAPL".into()).is_user_facing());
        assert!(AssistantError::InvalidArgument("qty".into()).is_user_facing());
        assert!(!AssistantError::upstream("telegram", "503").is_user_facing());
        assert!(!AssistantError::store("k", "denied").is_user_facing());
    }

    #[test]
    fn test_env_error_conversion() {
        let err: AssistantError = trader_utils::EnvError::Invalid {
            key: "TAX_RATE".into(),
            detail: "not a number".into(),
        }
        .into();
        assert!(matches!(err, AssistantError::Config(msg) if msg.contains("TAX_RATE")));
    }
}
