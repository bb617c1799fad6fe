//! Transport that prints to stdout

use super::ChatTransport;
use crate::error::Result;
use async_trait::async_trait;

/// Prints messages instead of delivering them (mock mode, local commands)
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleTransport;

#[async_trait]
impl ChatTransport for ConsoleTransport {
    async fn send(&self, chat_id: &str, text: &str) -> Result<()> {
        tracing::debug!("Printing message for chat {}", chat_id);
        println!("{text}\n");
        Ok(())
    }
}
