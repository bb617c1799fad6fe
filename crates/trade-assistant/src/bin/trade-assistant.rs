//! Trading assistant CLI
//!
//! # Usage
//!
//! ```bash
//! # Daily analysis (run from a scheduler)
//! trade-assistant analyze
//!
//! # Telegram bot for the configured chat
//! trade-assistant bot
//!
//! # One chat command, reply printed locally
//! trade-assistant command /buy AAPL 2 180.50
//! ```
//!
//! Configuration is read from the environment and `.env`; set `MOCK_MODE=true`
//! to run without API keys.

use anyhow::Context;
use clap::{Parser, Subcommand};
use trade_assistant::{AppContext, AssistantConfig, Delivery};

#[derive(Parser, Debug)]
#[command(name = "trade-assistant", version)]
#[command(about = "Personal trading assistant", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Mode,
}

#[derive(Subcommand, Debug)]
enum Mode {
    /// Run the daily analysis once and send it to the chat
    Analyze,
    /// Answer chat commands from the configured Telegram chat
    Bot,
    /// Handle one chat command and print the reply
    Command {
        /// Command line, e.g. `/portfolio`
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        text: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    trader_utils::init_tracing_with_default("warn,trade_assistant=info");

    let args = Args::parse();
    let config = AssistantConfig::from_env().context("invalid configuration")?;

    match args.command {
        Mode::Analyze => {
            let ctx = AppContext::build(config, Delivery::Chat).await?;
            ctx.pipeline.run().await.context("daily analysis failed")?;
        }
        Mode::Bot => {
            let ctx = AppContext::build(config, Delivery::Chat).await?;
            ctx.poller()?.run().await?;
        }
        Mode::Command { text } => {
            let ctx = AppContext::build(config, Delivery::Console).await?;
            let line = text.join(" ");
            match ctx.router().handle(&line).await {
                Some(reply) => println!("{reply}"),
                None => println!("Not a command: {line}\nType /help to see the available commands"),
            }
            // A /run launched above finishes before exit
            ctx.trigger.wait().await;
        }
    }

    Ok(())
}
