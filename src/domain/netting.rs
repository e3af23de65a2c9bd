//! Net portfolio positions.
//!
//! Long volume counts positive and short volume negative; each symbol's
//! signed sum becomes one entry. `avg_price` is the plain mean of trade
//! prices, not volume weighted, and `fund` is the first trade's fund.

use std::collections::BTreeMap;

use super::error::LedgerError;
use super::reference::ReferenceTable;
use super::trade::{Market, OptionPrefixes, OptionType, Position, RawTrade};

#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioEntry {
    pub symbol: String,
    pub fund: String,
    pub market: Market,
    pub option_type: Option<OptionType>,
    pub position: Position,
    /// Magnitude of the net volume; the sign lives in `position`.
    pub volume: f64,
    pub avg_price: f64,
}

impl PortfolioEntry {
    pub fn net_volume(&self) -> f64 {
        self.position.sign() * self.volume
    }
}

struct SymbolTotals<'a> {
    fund: &'a str,
    net_volume: f64,
    price_sum: f64,
    trades: usize,
}

/// Current holdings; fully closed symbols are dropped. The first row with a
/// malformed price, volume or symbol fails the whole build.
pub fn build_portfolio(
    trades: &[RawTrade],
    reference: &ReferenceTable,
    prefixes: &OptionPrefixes,
) -> Result<Vec<PortfolioEntry>, LedgerError> {
    let mut by_symbol: BTreeMap<&str, SymbolTotals<'_>> = BTreeMap::new();

    for (idx, trade) in trades.iter().enumerate() {
        trade.check_fields(idx + 1)?;
        let totals = by_symbol
            .entry(trade.symbol.as_str())
            .or_insert(SymbolTotals {
                fund: trade.fund.as_str(),
                net_volume: 0.0,
                price_sum: 0.0,
                trades: 0,
            });
        totals.net_volume += trade.position.sign() * trade.volume;
        totals.price_sum += trade.price;
        totals.trades += 1;
    }

    let entries: Vec<PortfolioEntry> = by_symbol
        .into_iter()
        .filter(|(symbol, totals)| {
            let open = totals.net_volume != 0.0;
            if !open {
                tracing::debug!(symbol, "position fully closed, excluded from portfolio");
            }
            open
        })
        .map(|(symbol, totals)| {
            let market = reference.lookup(symbol).market();
            PortfolioEntry {
                symbol: symbol.to_string(),
                fund: totals.fund.to_string(),
                option_type: prefixes.classify(symbol, &market),
                market,
                position: Position::from_net_volume(totals.net_volume),
                volume: totals.net_volume.abs(),
                avg_price: totals.price_sum / totals.trades as f64,
            }
        })
        .collect();
    Ok(entries)
}
