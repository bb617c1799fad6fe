//! Telegram long-polling loop

use super::CommandRouter;
use crate::error::Result;
use crate::notify::telegram::Update;
use crate::notify::{Notifier, TelegramClient};
use std::time::Duration;

const POLL_TIMEOUT_SECS: u64 = 30;
const RETRY_DELAY: Duration = Duration::from_secs(5);

/// Reads updates for one chat and answers them one at a time
pub struct TelegramPoller {
    client: TelegramClient,
    router: CommandRouter,
    notifier: Notifier,
    offset: i64,
    poll_timeout_secs: u64,
}

impl TelegramPoller {
    /// Only messages from the notifier's chat are handled
    pub fn new(client: TelegramClient, router: CommandRouter, notifier: Notifier) -> Self {
        Self {
            client,
            router,
            notifier,
            offset: 0,
            poll_timeout_secs: POLL_TIMEOUT_SECS,
        }
    }

    pub fn with_poll_timeout(mut self, secs: u64) -> Self {
        self.poll_timeout_secs = secs;
        self
    }

    /// Next update id to request
    pub fn offset(&self) -> i64 {
        self.offset
    }

    /// Fetch and handle one batch of updates; returns how many replies were sent
    pub async fn poll_once(&mut self) -> Result<usize> {
        let updates = self
            .client
            .get_updates(self.offset, self.poll_timeout_secs)
            .await?;
        Ok(self.handle_updates(updates).await)
    }

    async fn handle_updates(&mut self, updates: Vec<Update>) -> usize {
        let mut replied = 0;
        for update in updates {
            self.offset = self.offset.max(update.update_id + 1);

            let Some(message) = update.message else {
                continue;
            };
            if message.chat.id.to_string() != self.notifier.chat_id() {
                tracing::warn!("Ignoring message from unknown chat {}", message.chat.id);
                continue;
            }
            let Some(text) = message.text else {
                continue;
            };

            let Some(reply) = self.router.handle(&text).await else {
                continue;
            };
            match self.notifier.send(&reply).await {
                Ok(_) => replied += 1,
                Err(e) => tracing::error!("Failed to send reply: {}", e),
            }
        }
        replied
    }

    /// Poll until Ctrl-C
    pub async fn run(mut self) -> Result<()> {
        self.run_until(tokio::signal::ctrl_c()).await
    }

    /// Poll until `shutdown` completes
    ///
    /// Shutdown only interrupts the wait for updates or the retry delay. A
    /// batch already received is handled to the end, so a command is never
    /// left half applied.
    pub async fn run_until<F: Future>(&mut self, shutdown: F) -> Result<()> {
        tracing::info!("🤖 Bot started, listening for commands");
        tokio::pin!(shutdown);

        loop {
            let fetched = tokio::select! {
                biased;
                _ = &mut shutdown => break,
                fetched = self.client.get_updates(self.offset, self.poll_timeout_secs) => fetched,
            };

            match fetched {
                Ok(updates) => {
                    self.handle_updates(updates).await;
                }
                Err(e) => {
                    tracing::error!("Failed to poll Telegram updates: {}", e);
                    tokio::select! {
                        biased;
                        _ = &mut shutdown => break,
                        () = tokio::time::sleep(RETRY_DELAY) => {}
                    }
                }
            }
        }

        tracing::info!("Shutting down bot");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bot::MockAnalysisTrigger;
    use crate::ledger::{Fees, Ledger};
    use crate::registry::Registry;
    use crate::reporting::Reporter;
    use crate::store::DocumentStore;
    use rust_decimal_macros::dec;
    use serde_json::json;
    use std::sync::Arc;
    use wiremock::matchers::{body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn router() -> CommandRouter {
        router_on(DocumentStore::memory())
    }

    fn router_on(store: DocumentStore) -> CommandRouter {
        let ledger = Ledger::new(store.clone(), Fees::default(), dec!(2300));
        CommandRouter::new(
            ledger.clone(),
            Reporter::new(ledger),
            Registry::new(store),
            Arc::new(MockAnalysisTrigger::new()),
        )
    }

    #[tokio::test]
    async fn test_poll_once_answers_configured_chat_only() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/botTOKEN/getUpdates"))
            .and(query_param("offset", "0"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ok": true,
                "result": [
                    {"update_id": 10, "message": {"chat": {"id": 42}, "text": "/blacklists"}},
                    {"update_id": 11, "message": {"chat": {"id": 99}, "text": "/blacklists"}},
                    {"update_id": 12, "message": {"chat": {"id": 42}, "text": "thanks!"}},
                    {"update_id": 13, "message": {"chat": {"id": 42}}}
                ]
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/botTOKEN/sendMessage"))
            .and(body_partial_json(json!({"chat_id": "42"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true, "result": {}})))
            .expect(1)
            .mount(&server)
            .await;

        let client = TelegramClient::new("TOKEN")
            .expect("client")
            .with_api_base(server.uri());
        let notifier = Notifier::new(Arc::new(client.clone()), "42");
        let mut poller = TelegramPoller::new(client, router(), notifier).with_poll_timeout(0);

        assert_eq!(poller.poll_once().await.expect("poll"), 1);
        assert_eq!(poller.offset(), 14);
    }

    #[tokio::test]
    async fn test_poll_failure_keeps_offset() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;

        let client = TelegramClient::new("TOKEN")
            .expect("client")
            .with_api_base(server.uri());
        let notifier = Notifier::new(Arc::new(client.clone()), "42");
        let mut poller = TelegramPoller::new(client, router(), notifier).with_poll_timeout(0);

        assert!(poller.poll_once().await.is_err());
        assert_eq!(poller.offset(), 0);
    }

    #[tokio::test]
    async fn test_shutdown_before_polling() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true, "result": []})))
            .expect(0)
            .mount(&server)
            .await;

        let client = TelegramClient::new("TOKEN")
            .expect("client")
            .with_api_base(server.uri());
        let notifier = Notifier::new(Arc::new(client.clone()), "42");
        let mut poller = TelegramPoller::new(client, router(), notifier).with_poll_timeout(0);

        poller.run_until(async {}).await.expect("run");
        assert_eq!(poller.offset(), 0);
    }

    #[tokio::test]
    async fn test_shutdown_waits_for_batch_in_flight() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/botTOKEN/getUpdates"))
            .and(query_param("offset", "0"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ok": true,
                "result": [
                    {"update_id": 20, "message": {"chat": {"id": 42}, "text": "/buy AAPL 1 100"}},
                    {"update_id": 21, "message": {"chat": {"id": 42}, "text": "/sell AAPL 1 110"}}
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/botTOKEN/sendMessage"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"ok": true, "result": {}}))
                    .set_delay(Duration::from_millis(150)),
            )
            .expect(2)
            .mount(&server)
            .await;

        let store = DocumentStore::memory();
        let client = TelegramClient::new("TOKEN")
            .expect("client")
            .with_api_base(server.uri());
        let notifier = Notifier::new(Arc::new(client.clone()), "42");
        let mut poller =
            TelegramPoller::new(client, router_on(store.clone()), notifier).with_poll_timeout(0);

        // Fires once the first reply is on the wire
        let first_reply_sent = async {
            loop {
                let requests = server.received_requests().await.unwrap_or_default();
                if requests.iter().any(|r| r.url.path().ends_with("/sendMessage")) {
                    break;
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        };
        poller.run_until(first_reply_sent).await.expect("run");

        assert_eq!(poller.offset(), 22);
        let ledger = Ledger::new(store, Fees::default(), dec!(2300));
        assert!(ledger.read().await.expect("read").positions.is_empty());
        assert_eq!(ledger.history().await.expect("history").len(), 1);
    }
}
