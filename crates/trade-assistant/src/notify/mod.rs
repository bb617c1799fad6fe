//! Outbound chat messages
//!
//! Chat platforms cap message length, so [`Notifier`] splits long text into
//! chunks at line breaks and sends them in order.

pub mod console;
pub mod telegram;

pub use console::ConsoleTransport;
pub use telegram::TelegramClient;

use crate::error::{AssistantError, Result};
use async_trait::async_trait;
use std::sync::Arc;

/// Default per-message character limit
pub const DEFAULT_MESSAGE_LIMIT: usize = 4000;

/// Delivers one message to one chat
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn send(&self, chat_id: &str, text: &str) -> Result<()>;
}

/// Split text into chunks of at most `limit` characters.
///
/// Each cut is made at the last `\n` inside the window and that newline is
/// dropped, so joining the chunks with `\n` restores text that only needed
/// line-break cuts. A window without any newline is cut hard at `limit`.
pub fn split_message(text: &str, limit: usize) -> Vec<String> {
    let limit = limit.max(1);
    let mut chunks = Vec::new();
    let mut rest = text;

    loop {
        let Some((cut, _)) = rest.char_indices().nth(limit) else {
            chunks.push(rest.to_string());
            return chunks;
        };

        let window = &rest[..cut];
        match window.rfind('\n') {
            Some(newline) => {
                chunks.push(window[..newline].to_string());
                rest = &rest[newline + 1..];
            }
            None => {
                chunks.push(window.to_string());
                rest = &rest[cut..];
            }
        }
    }
}

/// Sends text to one chat through a transport
#[derive(Clone)]
pub struct Notifier {
    transport: Arc<dyn ChatTransport>,
    chat_id: String,
    limit: usize,
}

impl Notifier {
    pub fn new(transport: Arc<dyn ChatTransport>, chat_id: impl Into<String>) -> Self {
        Self {
            transport,
            chat_id: chat_id.into(),
            limit: DEFAULT_MESSAGE_LIMIT,
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn chat_id(&self) -> &str {
        &self.chat_id
    }

    /// Send text, split as needed; returns the number of messages sent
    pub async fn send(&self, text: &str) -> Result<usize> {
        let chunks: Vec<String> = split_message(text, self.limit)
            .into_iter()
            .filter(|c| !c.trim().is_empty())
            .collect();
        let total = chunks.len();

        for (i, chunk) in chunks.iter().enumerate() {
            self.transport
                .send(&self.chat_id, chunk)
                .await
                .map_err(|e| match e {
                    AssistantError::Upstream { .. } => e,
                    other => AssistantError::upstream("chat", other),
                })?;
            tracing::info!("✅ Message {}/{} sent", i + 1, total);
        }

        Ok(total)
    }
}

impl std::fmt::Debug for Notifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Notifier")
            .field("chat_id", &self.chat_id)
            .field("limit", &self.limit)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::Sequence;
    use mockall::predicate::eq;

    #[test]
    fn test_short_text_is_one_chunk() {
        assert_eq!(split_message("hello", 4000), vec!["hello"]);
        assert_eq!(split_message("", 4000), vec![""]);
    }

    #[test]
    fn test_split_long_text_at_newlines() {
        let line = "x".repeat(79);
        let text = vec![line; 113].join("\n");
        assert!(text.chars().count() > 9000);

        let chunks = split_message(&text, 4000);
        assert_eq!(chunks.len(), 3);
        assert!(chunks.iter().all(|c| c.chars().count() <= 4000));
        assert_eq!(chunks.join("\n"), text);
    }

    #[test]
    fn test_hard_cut_without_newlines() {
        let text = "a".repeat(9000);
        let chunks = split_message(&text, 4000);
        let sizes: Vec<usize> = chunks.iter().map(String::len).collect();
        assert_eq!(sizes, vec![4000, 4000, 1000]);
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn test_limit_counts_characters() {
        let text = "é".repeat(10);
        let chunks = split_message(&text, 4);
        assert_eq!(chunks, vec!["éééé", "éééé", "éé"]);
    }

    #[test]
    fn test_leading_newline_makes_progress() {
        let text = format!("\n{}", "b".repeat(10));
        let chunks = split_message(&text, 5);
        assert_eq!(chunks[0], "");
        assert_eq!(chunks.concat(), "b".repeat(10));
    }

    #[tokio::test]
    async fn test_notifier_sends_chunks_in_order() {
        let mut transport = MockChatTransport::new();
        let mut seq = Sequence::new();
        for expected in ["first line", "second line"] {
            transport
                .expect_send()
                .with(eq("42"), eq(expected))
                .times(1)
                .in_sequence(&mut seq)
                .returning(|_, _| Ok(()));
        }

        let notifier = Notifier::new(Arc::new(transport), "42").with_limit(12);
        let sent = notifier.send("first line\nsecond line").await.expect("send");
        assert_eq!(sent, 2);
    }

    #[tokio::test]
    async fn test_blank_chunks_are_skipped() {
        let mut transport = MockChatTransport::new();
        transport.expect_send().times(1).returning(|_, _| Ok(()));

        let notifier = Notifier::new(Arc::new(transport), "42").with_limit(5);
        assert_eq!(notifier.send("\n\nabc").await.expect("send"), 1);
    }

    #[tokio::test]
    async fn test_first_failure_aborts() {
        let mut transport = MockChatTransport::new();
        transport
            .expect_send()
            .times(1)
            .returning(|_, _| Err(AssistantError::upstream("telegram", "HTTP 502")));

        let notifier = Notifier::new(Arc::new(transport), "42").with_limit(5);
        let err = notifier.send("aaaa\nbbbb\ncccc").await.expect_err("fails");
        assert!(matches!(err, AssistantError::Upstream { .. }));
    }
}
