//! CSV encoding of the trade history

use super::model::{TradeRecord, TradeResult};
use crate::error::Result;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::str::FromStr;

pub const HEADER: [&str; 9] = [
    "ticker",
    "quantity",
    "entry_price",
    "exit_price",
    "date_close",
    "gross_pnl",
    "net_pnl",
    "pnl_pct",
    "result",
];

/// Parse the history log, skipping rows that do not decode
pub fn parse(text: &str) -> Vec<TradeRecord> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let mut records = Vec::new();
    for (index, row) in reader.records().enumerate() {
        let parsed = row
            .map_err(|e| e.to_string())
            .and_then(|row| decode_row(&row));
        match parsed {
            Ok(record) => records.push(record),
            // +2: header line and 1-based numbering
            Err(e) => tracing::warn!("Skipping trade history line {}: {}", index + 2, e),
        }
    }
    records
}

fn decode_row(row: &csv::StringRecord) -> std::result::Result<TradeRecord, String> {
    if row.len() < HEADER.len() {
        return Err(format!("expected {} fields, found {}", HEADER.len(), row.len()));
    }
    let decimal = |i: usize| {
        Decimal::from_str(&row[i]).map_err(|e| format!("{}: {e}", HEADER[i]))
    };

    Ok(TradeRecord {
        ticker: row[0].to_string(),
        quantity: decimal(1)?,
        entry_price: decimal(2)?,
        exit_price: decimal(3)?,
        date_close: NaiveDate::parse_from_str(&row[4], "%Y-%m-%d")
            .map_err(|e| format!("date_close: {e}"))?,
        gross_pnl: decimal(5)?,
        net_pnl: decimal(6)?,
        pnl_pct: decimal(7)?,
        result: TradeResult::from_str(&row[8])?,
    })
}

/// Append one record to an existing log, writing the header for a new log
pub fn append(existing: Option<&str>, record: &TradeRecord) -> Result<String> {
    let mut out = existing.unwrap_or_default().to_string();
    if out.trim().is_empty() {
        out.clear();
    } else if !out.ends_with('\n') {
        out.push('\n');
    }

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    if out.is_empty() {
        writer.write_record(HEADER)?;
    }
    writer.write_record([
        record.ticker.clone(),
        record.quantity.to_string(),
        record.entry_price.to_string(),
        record.exit_price.to_string(),
        record.date_close.format("%Y-%m-%d").to_string(),
        record.gross_pnl.to_string(),
        record.net_pnl.to_string(),
        record.pnl_pct.to_string(),
        record.result.as_str().to_string(),
    ])?;

    let bytes = writer
        .into_inner()
        .map_err(|e| crate::error::AssistantError::Csv(e.into_error().into()))?;
    out.push_str(&String::from_utf8_lossy(&bytes));
    Ok(out)
}
