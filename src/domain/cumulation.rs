//! Cumulation of trades into held positions.
//!
//! Every (symbol, position) group collapses into one row carrying the
//! volume-weighted average price and the summed volume. Descriptive fields
//! (date, fund, option type, holding days) come from the group's first trade.

use chrono::NaiveDate;
use std::collections::BTreeMap;

use super::error::LedgerError;
use super::trade::{OptionType, Position, TradeRecord};

#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedPosition {
    pub date: NaiveDate,
    pub fund: String,
    pub symbol: String,
    pub position: Position,
    pub price: f64,
    pub volume: f64,
    pub option_type: Option<OptionType>,
    pub holding_days: i64,
}

struct GroupTotals<'a> {
    first: &'a TradeRecord,
    weighted_price: f64,
    volume: f64,
}

/// One row per distinct (symbol, position), ordered by symbol then position.
pub fn cumulate(trades: &[TradeRecord]) -> Result<Vec<AggregatedPosition>, LedgerError> {
    let mut groups: BTreeMap<(&str, Position), GroupTotals<'_>> = BTreeMap::new();

    for trade in trades {
        let totals = groups
            .entry((trade.symbol.as_str(), trade.position))
            .or_insert(GroupTotals {
                first: trade,
                weighted_price: 0.0,
                volume: 0.0,
            });
        totals.weighted_price += trade.price * trade.volume;
        totals.volume += trade.volume;
    }

    groups
        .into_iter()
        .map(|((symbol, position), totals)| {
            if totals.volume == 0.0 {
                return Err(LedgerError::DegenerateAggregation {
                    symbol: symbol.to_string(),
                    position,
                });
            }
            let first = totals.first;
            Ok(AggregatedPosition {
                date: first.date,
                fund: first.fund.clone(),
                symbol: symbol.to_string(),
                position,
                price: totals.weighted_price / totals.volume,
                volume: totals.volume,
                option_type: first.option_type,
                holding_days: first.holding_days,
            })
        })
        .collect()
}
