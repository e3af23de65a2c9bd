//! Instrument reference data and market lookup.

use std::collections::HashMap;

use super::trade::Market;

#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceRow {
    pub symbol: String,
    pub market: Market,
}

/// Result of resolving a symbol against the reference data.
#[derive(Debug, Clone, PartialEq)]
pub enum MarketLookup {
    Found(Market),
    /// Symbol absent from the reference data; treated as an option.
    Defaulted,
}

impl MarketLookup {
    pub fn market(&self) -> Market {
        match self {
            MarketLookup::Found(market) => market.clone(),
            MarketLookup::Defaulted => Market::Option,
        }
    }

    pub fn is_defaulted(&self) -> bool {
        matches!(self, MarketLookup::Defaulted)
    }
}

/// Symbol → market index. The first row for a symbol wins.
#[derive(Debug, Clone, Default)]
pub struct ReferenceTable {
    markets: HashMap<String, Market>,
}

impl ReferenceTable {
    pub fn new(rows: Vec<ReferenceRow>) -> Self {
        let mut markets = HashMap::with_capacity(rows.len());
        for row in rows {
            markets.entry(row.symbol).or_insert(row.market);
        }
        ReferenceTable { markets }
    }

    pub fn lookup(&self, symbol: &str) -> MarketLookup {
        match self.markets.get(symbol) {
            Some(market) => MarketLookup::Found(market.clone()),
            None => {
                tracing::debug!(symbol, "symbol missing from reference data, defaulting to option");
                MarketLookup::Defaulted
            }
        }
    }

    pub fn len(&self) -> usize {
        self.markets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markets.is_empty()
    }
}
