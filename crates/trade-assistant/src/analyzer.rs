//! Daily analysis generation

use crate::config::AssistantConfig;
use crate::error::{AssistantError, Result};
use async_trait::async_trait;
use std::sync::Arc;
use trader_llm::{CompletionRequest, LLMProvider, Message, TokenUsage};

/// Per-million-token prices used for the cost estimate (USD)
const INPUT_PRICE_PER_MTOK: f64 = 3.0;
const OUTPUT_PRICE_PER_MTOK: f64 = 15.0;

/// Generated analysis text
#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    pub text: String,
    pub usage: Option<TokenUsage>,
}

/// Turns a prompt into an analysis
#[async_trait]
pub trait Analyzer: Send + Sync {
    async fn analyze(&self, prompt: &str) -> Result<Analysis>;
}

/// Analyzer backed by an LLM provider
pub struct LlmAnalyzer {
    provider: Arc<dyn LLMProvider>,
    model: String,
    max_tokens: usize,
}

impl LlmAnalyzer {
    pub fn new(provider: Arc<dyn LLMProvider>, model: impl Into<String>, max_tokens: usize) -> Self {
        Self {
            provider,
            model: model.into(),
            max_tokens,
        }
    }

    pub fn from_config(provider: Arc<dyn LLMProvider>, config: &AssistantConfig) -> Self {
        Self::new(provider, config.model.clone(), config.max_tokens)
    }
}

#[async_trait]
impl Analyzer for LlmAnalyzer {
    #[tracing::instrument(skip(self, prompt), fields(provider = self.provider.name(), model = %self.model))]
    async fn analyze(&self, prompt: &str) -> Result<Analysis> {
        let request = CompletionRequest::builder(&self.model)
            .add_message(Message::user(prompt))
            .max_tokens(self.max_tokens)
            .build();

        tracing::info!("Requesting analysis ({} prompt chars)", prompt.chars().count());

        let response = self.provider.complete(request).await.map_err(|e| {
            if e.is_transient() {
                tracing::warn!("Transient LLM failure: {}", e);
            } else {
                tracing::error!("LLM request failed: {}", e);
            }
            AssistantError::from(e)
        })?;

        let usage = response.usage;
        tracing::info!(
            input_tokens = usage.input_tokens,
            output_tokens = usage.output_tokens,
            "Estimated cost: ${:.4}",
            usage.estimated_cost_usd(INPUT_PRICE_PER_MTOK, OUTPUT_PRICE_PER_MTOK)
        );

        let text = response.message.text();
        if text.trim().is_empty() {
            return Err(AssistantError::upstream(
                self.provider.name(),
                format!("empty analysis (stop reason {:?})", response.stop_reason),
            ));
        }

        Ok(Analysis {
            text,
            usage: Some(usage),
        })
    }
}

/// Fixed analysis for mock mode
#[derive(Debug, Clone)]
pub struct StubAnalyzer {
    text: String,
}

impl Default for StubAnalyzer {
    fn default() -> Self {
        Self::new(
            "🧪 MOCK ANALYSIS\n\n\
             1. Macro context: risk level MEDIUM.\n\
             2. Open positions: HOLD.\n\
             3. New opportunities: none today.\n\
             9. Summary: no action recommended.",
        )
    }
}

impl StubAnalyzer {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

#[async_trait]
impl Analyzer for StubAnalyzer {
    async fn analyze(&self, prompt: &str) -> Result<Analysis> {
        tracing::info!("Mock mode: returning stub analysis for {} char prompt", prompt.len());
        Ok(Analysis {
            text: self.text.clone(),
            usage: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trader_llm::{CompletionResponse, LLMError, StopReason};

    /// Provider returning a canned response and recording the request
    struct CannedProvider {
        response: std::result::Result<String, fn() -> LLMError>,
        seen: std::sync::Mutex<Vec<CompletionRequest>>,
    }

    impl CannedProvider {
        fn ok(text: &str) -> Self {
            Self {
                response: Ok(text.to_string()),
                seen: std::sync::Mutex::new(Vec::new()),
            }
        }

        fn failing(err: fn() -> LLMError) -> Self {
            Self {
                response: Err(err),
                seen: std::sync::Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl LLMProvider for CannedProvider {
        async fn complete(&self, request: CompletionRequest) -> trader_llm::Result<CompletionResponse> {
            self.seen.lock().expect("lock").push(request);
            match &self.response {
                Ok(text) => Ok(CompletionResponse {
                    message: Message::assistant(text.clone()),
                    stop_reason: StopReason::EndTurn,
                    usage: TokenUsage {
                        input_tokens: 1200,
                        output_tokens: 800,
                    },
                }),
                Err(make) => Err(make()),
            }
        }

        fn name(&self) -> &str {
            "canned"
        }
    }

    #[tokio::test]
    async fn test_llm_analyzer_request() {
        let provider = Arc::new(CannedProvider::ok("📊 all good"));
        let analyzer = LlmAnalyzer::new(provider.clone(), "claude-test", 4000);

        let analysis = analyzer.analyze("prompt text").await.expect("analysis");
        assert_eq!(analysis.text, "📊 all good");
        assert_eq!(analysis.usage.map(|u| u.total()), Some(2000));

        let seen = provider.seen.lock().expect("lock");
        assert_eq!(seen[0].model, "claude-test");
        assert_eq!(seen[0].max_tokens, 4000);
        assert_eq!(seen[0].messages[0].text(), "prompt text");
    }

    #[tokio::test]
    async fn test_empty_text_is_upstream_error() {
        let analyzer = LlmAnalyzer::new(Arc::new(CannedProvider::ok("  ")), "m", 10);
        assert!(matches!(
            analyzer.analyze("p").await,
            Err(AssistantError::Upstream { .. })
        ));
    }

    #[tokio::test]
    async fn test_provider_error_is_propagated() {
        let analyzer = LlmAnalyzer::new(
            Arc::new(CannedProvider::failing(|| LLMError::AuthenticationFailed)),
            "m",
            10,
        );
        assert!(matches!(
            analyzer.analyze("p").await,
            Err(AssistantError::Llm(LLMError::AuthenticationFailed))
        ));
    }

    #[tokio::test]
    async fn test_stub_analyzer() {
        let analysis = StubAnalyzer::default().analyze("anything").await.expect("stub");
        assert!(analysis.text.starts_with("🧪 MOCK ANALYSIS"));
        assert!(analysis.usage.is_none());
    }
}
