//! Trade normalization.
//!
//! Resolves each raw trade's market against the reference data, types option
//! contracts from their symbol prefix, converts the trade date to Gregorian
//! and derives the holding period relative to the valuation date.

use chrono::NaiveDate;

use super::error::LedgerError;
use super::reference::ReferenceTable;
use super::trade::{OptionPrefixes, RawTrade, TradeRecord};
use crate::ports::calendar_port::CalendarPort;

#[derive(Debug, Clone, Copy)]
pub struct NormalizeContext {
    pub prefixes: OptionPrefixes,
    pub as_of: NaiveDate,
}

/// Drop a trailing `"- <annotation>"` (typically a time of day) from a date cell.
pub fn strip_date_annotation(raw: &str) -> &str {
    match raw.find("- ") {
        Some(idx) => raw[..idx].trim(),
        None => raw.trim(),
    }
}

pub fn normalize_trades(
    rows: &[RawTrade],
    reference: &ReferenceTable,
    calendar: &dyn CalendarPort,
    ctx: &NormalizeContext,
) -> Result<Vec<TradeRecord>, LedgerError> {
    rows.iter()
        .enumerate()
        .map(|(idx, raw)| normalize_trade(idx + 1, raw, reference, calendar, ctx))
        .collect()
}

fn normalize_trade(
    row: usize,
    raw: &RawTrade,
    reference: &ReferenceTable,
    calendar: &dyn CalendarPort,
    ctx: &NormalizeContext,
) -> Result<TradeRecord, LedgerError> {
    raw.check_fields(row)?;

    let date_str = strip_date_annotation(&raw.date);
    if date_str.is_empty() {
        return Err(LedgerError::MissingField {
            row,
            field: "date".into(),
        });
    }
    let date = calendar
        .to_gregorian(date_str)
        .map_err(|e| LedgerError::invalid_field(row, "date", e.to_string()))?;

    let holding_days = -calendar.days_between(ctx.as_of, date);
    if holding_days < 0 {
        return Err(LedgerError::invalid_field(
            row,
            "date",
            format!("{date} is after valuation date {}", ctx.as_of),
        ));
    }

    let lookup = reference.lookup(&raw.symbol);
    let market = lookup.market();
    let option_type = ctx.prefixes.classify(&raw.symbol, &market);

    Ok(TradeRecord {
        date,
        fund: raw.fund.clone(),
        symbol: raw.symbol.clone(),
        position: raw.position,
        price: raw.price,
        volume: raw.volume,
        market,
        market_defaulted: lookup.is_defaulted(),
        option_type,
        holding_days,
    })
}
