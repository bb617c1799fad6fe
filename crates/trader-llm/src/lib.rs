//! LLM provider abstraction layer for the trading assistant
//!
//! This crate provides provider-agnostic abstractions for asking a Large
//! Language Model for a completion:
//!
//! - Message types for LLM communication
//! - Completion request/response types
//! - Provider trait for LLM implementations
//! - Concrete provider implementations (behind feature flags)

pub mod completion;
pub mod error;
pub mod messages;
pub mod provider;

// Re-export main types
pub use completion::{CompletionRequest, CompletionResponse, StopReason, TokenUsage};
pub use error::{LLMError, Result};
pub use messages::{ContentBlock, Message, MessageContent, Role};
pub use provider::LLMProvider;

// Provider implementations (feature-gated)
#[cfg(feature = "anthropic")]
pub mod providers;
