#![allow(dead_code)]

use chrono::NaiveDate;
use portfolio_ledger::adapters::calendar_adapter::GregorianCalendar;
use portfolio_ledger::domain::error::LedgerError;
use portfolio_ledger::domain::normalizer::{normalize_trades, NormalizeContext};
use portfolio_ledger::domain::reference::{ReferenceRow, ReferenceTable};
pub use portfolio_ledger::domain::trade::{Market, OptionPrefixes, Position, RawTrade, TradeRecord};
use portfolio_ledger::ports::reference_port::ReferencePort;
use portfolio_ledger::ports::trade_port::TradePort;
use std::io::Write;

pub struct MockTradePort {
    pub trades: Vec<RawTrade>,
    pub error: Option<String>,
}

impl MockTradePort {
    pub fn new() -> Self {
        Self {
            trades: Vec::new(),
            error: None,
        }
    }

    pub fn with_trade(mut self, trade: RawTrade) -> Self {
        self.trades.push(trade);
        self
    }

    pub fn with_error(mut self, reason: &str) -> Self {
        self.error = Some(reason.to_string());
        self
    }
}

impl TradePort for MockTradePort {
    fn fetch_trades(&self) -> Result<Vec<RawTrade>, LedgerError> {
        if let Some(reason) = &self.error {
            return Err(LedgerError::Source {
                reason: reason.clone(),
            });
        }
        Ok(self.trades.clone())
    }
}

pub struct MockReferencePort {
    pub rows: Vec<ReferenceRow>,
}

impl MockReferencePort {
    pub fn new() -> Self {
        Self { rows: Vec::new() }
    }

    pub fn with_market(mut self, symbol: &str, market: Market) -> Self {
        self.rows.push(ReferenceRow {
            symbol: symbol.to_string(),
            market,
        });
        self
    }
}

impl ReferencePort for MockReferencePort {
    fn fetch_reference(&self) -> Result<Vec<ReferenceRow>, LedgerError> {
        Ok(self.rows.clone())
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn as_of() -> NaiveDate {
    date(2024, 3, 31)
}

pub fn make_trade(symbol: &str, position: Position, price: f64, volume: f64, day: &str) -> RawTrade {
    RawTrade {
        date: day.to_string(),
        fund: "alpha".to_string(),
        symbol: symbol.to_string(),
        position,
        price,
        volume,
    }
}

/// Normalize with Gregorian dates against the fixed valuation date.
pub fn normalize(
    trades: &dyn TradePort,
    reference: &dyn ReferencePort,
) -> Result<Vec<TradeRecord>, LedgerError> {
    let table = ReferenceTable::new(reference.fetch_reference()?);
    let ctx = NormalizeContext {
        prefixes: OptionPrefixes::default(),
        as_of: as_of(),
    };
    normalize_trades(&trades.fetch_trades()?, &table, &GregorianCalendar, &ctx)
}

pub fn write_temp(content: &str, suffix: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}
