//! Chat command parsing

use rust_decimal::Decimal;
use std::str::FromStr;

const BUY_USAGE: &str = "/buy TICKER QUANTITY PRICE\nE.g.: /buy AAPL 2 180.50";
const SELL_USAGE: &str = "/sell TICKER QUANTITY PRICE\nE.g.: /sell AAPL 2 195.00";
const BLACKLIST_USAGE: &str = "/blacklist TICKER\nE.g.: /blacklist PLTR";
const REMOVE_BLACKLIST_USAGE: &str = "/remove_blacklist TICKER\nE.g.: /remove_blacklist PLTR";
const TIP_USAGE: &str = "/tip TICKER CONTEXT\nE.g.: /tip NVDA new GPU launch next week";
const REMOVE_TIP_USAGE: &str = "/remove_tip TICKER\nE.g.: /remove_tip NVDA";

/// Parsed chat command
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Record a purchase
    Buy {
        ticker: String,
        quantity: Decimal,
        price: Decimal,
    },
    /// Record a sale
    Sell {
        ticker: String,
        quantity: Decimal,
        price: Decimal,
    },
    Portfolio,
    Balance,
    Stats,
    Blacklist { ticker: String },
    RemoveBlacklist { ticker: String },
    Blacklists,
    /// Add or replace the tip for a ticker
    Tip { ticker: String, context: String },
    RemoveTip { ticker: String },
    Tips,
    /// Launch the daily analysis in the background
    Run,
    Help,
}

/// Why a command line could not be turned into a [`Command`]
///
/// The `Display` text is the reply sent back to the chat.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("❌ Unknown command: {0}\nType /help to see the available commands")]
    Unknown(String),

    #[error("❌ Invalid format\nUsage: {0}")]
    Usage(&'static str),

    #[error("❌ Quantity and price must be numbers\nUsage: {0}")]
    InvalidNumber(&'static str),
}

/// Parse a number, accepting a decimal comma
fn number(raw: &str, usage: &'static str) -> Result<Decimal, ParseError> {
    Decimal::from_str(&raw.replace(',', ".")).map_err(|_| ParseError::InvalidNumber(usage))
}

fn trade_args(args: &[&str], usage: &'static str) -> Result<(String, Decimal, Decimal), ParseError> {
    let [ticker, quantity, price] = args else {
        return Err(ParseError::Usage(usage));
    };
    Ok((
        ticker.to_uppercase(),
        number(quantity, usage)?,
        number(price, usage)?,
    ))
}

fn single_ticker(args: &[&str], usage: &'static str) -> Result<String, ParseError> {
    match args {
        [ticker] => Ok(ticker.to_uppercase()),
        _ => Err(ParseError::Usage(usage)),
    }
}

impl Command {
    /// Parse one chat line.
    ///
    /// Returns `None` when the line is not a command at all.
    pub fn parse(input: &str) -> Option<Result<Self, ParseError>> {
        let input = input.trim();
        let body = input.strip_prefix('/')?;

        let parts: Vec<&str> = body.split_whitespace().collect();
        let (head, args) = parts.split_first()?;

        // "/stats@my_bot" in group chats
        let name = head.split('@').next().unwrap_or(*head).to_lowercase();

        let parsed = match name.as_str() {
            "buy" | "compro" => trade_args(args, BUY_USAGE).map(|(ticker, quantity, price)| {
                Command::Buy {
                    ticker,
                    quantity,
                    price,
                }
            }),
            "sell" | "vendo" => trade_args(args, SELL_USAGE).map(|(ticker, quantity, price)| {
                Command::Sell {
                    ticker,
                    quantity,
                    price,
                }
            }),
            "portfolio" => Ok(Command::Portfolio),
            "balance" => Ok(Command::Balance),
            "stats" => Ok(Command::Stats),
            "blacklist" => {
                single_ticker(args, BLACKLIST_USAGE).map(|ticker| Command::Blacklist { ticker })
            }
            "remove_blacklist" => single_ticker(args, REMOVE_BLACKLIST_USAGE)
                .map(|ticker| Command::RemoveBlacklist { ticker }),
            "blacklists" => Ok(Command::Blacklists),
            "tip" => match args.split_first() {
                Some((ticker, context)) if !context.is_empty() => Ok(Command::Tip {
                    ticker: ticker.to_uppercase(),
                    context: context.join(" "),
                }),
                _ => Err(ParseError::Usage(TIP_USAGE)),
            },
            "remove_tip" => {
                single_ticker(args, REMOVE_TIP_USAGE).map(|ticker| Command::RemoveTip { ticker })
            }
            "tips" => Ok(Command::Tips),
            "run" => Ok(Command::Run),
            "help" | "start" => Ok(Command::Help),
            _ => Err(ParseError::Unknown(format!("/{name}"))),
        };

        Some(parsed)
    }

    /// Get help text
    pub fn help_text() -> &'static str {
        r"🤖 TRADING ASSISTANT

📝 Record trades:
/buy TICKER QUANTITY PRICE
  E.g.: /buy AAPL 2 180.50
/sell TICKER QUANTITY PRICE
  E.g.: /sell AAPL 2 195.00

📊 Reports:
/portfolio - open positions
/balance - overall balance
/stats - trade statistics

🚫 Blacklist:
/blacklist TICKER - never recommend this ticker
/remove_blacklist TICKER - allow it again
/blacklists - list blocked tickers

💡 Tips:
/tip TICKER CONTEXT - add an external tip
/remove_tip TICKER - delete a tip
/tips - list active tips

⚡ Analysis:
/run - launch the daily analysis now

/help - show this message"
    }

    /// Short name used in logs
    pub fn name(&self) -> &'static str {
        match self {
            Command::Buy { .. } => "buy",
            Command::Sell { .. } => "sell",
            Command::Portfolio => "portfolio",
            Command::Balance => "balance",
            Command::Stats => "stats",
            Command::Blacklist { .. } => "blacklist",
            Command::RemoveBlacklist { .. } => "remove_blacklist",
            Command::Blacklists => "blacklists",
            Command::Tip { .. } => "tip",
            Command::RemoveTip { .. } => "remove_tip",
            Command::Tips => "tips",
            Command::Run => "run",
            Command::Help => "help",
        }
    }
}
