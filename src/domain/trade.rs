//! Trade records and instrument classification.

use chrono::NaiveDate;
use std::fmt;

use super::error::LedgerError;
use std::str::FromStr;

/// Trade direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Position {
    Long,
    Short,
}

impl Position {
    /// +1 for long, -1 for short.
    pub fn sign(self) -> f64 {
        match self {
            Position::Long => 1.0,
            Position::Short => -1.0,
        }
    }

    pub fn from_net_volume(net_volume: f64) -> Self {
        if net_volume < 0.0 {
            Position::Short
        } else {
            Position::Long
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Position::Long => write!(f, "long"),
            Position::Short => write!(f, "short"),
        }
    }
}

impl FromStr for Position {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "long" => Ok(Position::Long),
            "short" => Ok(Position::Short),
            other => Err(format!("expected long or short, got {other:?}")),
        }
    }
}

/// Market an instrument trades on, as named by the reference data.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Market {
    Equity,
    Option,
    Other(String),
}

impl Market {
    pub fn is_option(&self) -> bool {
        matches!(self, Market::Option)
    }
}

impl fmt::Display for Market {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Market::Equity => write!(f, "equity"),
            Market::Option => write!(f, "option"),
            Market::Other(name) => write!(f, "{name}"),
        }
    }
}

impl From<&str> for Market {
    fn from(s: &str) -> Self {
        let trimmed = s.trim();
        match trimmed.to_lowercase().as_str() {
            "equity" => Market::Equity,
            "option" => Market::Option,
            _ => Market::Other(trimmed.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OptionType {
    Call,
    Put,
}

impl fmt::Display for OptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionType::Call => write!(f, "call"),
            OptionType::Put => write!(f, "put"),
        }
    }
}

/// Leading symbol characters that mark option contracts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptionPrefixes {
    pub put: char,
    pub call: char,
}

impl Default for OptionPrefixes {
    fn default() -> Self {
        OptionPrefixes {
            put: 'ط',
            call: 'ض',
        }
    }
}

impl OptionPrefixes {
    /// Option type from the first character of `symbol`. Only option-market
    /// symbols are ever typed.
    pub fn classify(&self, symbol: &str, market: &Market) -> Option<OptionType> {
        if !market.is_option() {
            return None;
        }
        match symbol.chars().next() {
            Some(c) if c == self.put => Some(OptionType::Put),
            Some(c) if c == self.call => Some(OptionType::Call),
            _ => None,
        }
    }
}

/// A trade row as delivered by a trade source, before normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTrade {
    pub date: String,
    pub fund: String,
    pub symbol: String,
    pub position: Position,
    pub price: f64,
    pub volume: f64,
}

impl RawTrade {
    /// Checks the fields every consumer relies on: a symbol and a positive,
    /// finite price and volume. `row` is 1-based and ends up in the error.
    pub fn check_fields(&self, row: usize) -> Result<(), LedgerError> {
        if self.symbol.trim().is_empty() {
            return Err(LedgerError::MissingField {
                row,
                field: "symbol".into(),
            });
        }
        if !self.price.is_finite() || self.price <= 0.0 {
            return Err(LedgerError::invalid_field(row, "price", "must be positive"));
        }
        if !self.volume.is_finite() || self.volume <= 0.0 {
            return Err(LedgerError::invalid_field(row, "volume", "must be positive"));
        }
        Ok(())
    }
}

/// A normalized trade.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeRecord {
    pub date: NaiveDate,
    pub fund: String,
    pub symbol: String,
    pub position: Position,
    pub price: f64,
    pub volume: f64,
    pub market: Market,
    /// True when the symbol was missing from the reference data.
    pub market_defaulted: bool,
    pub option_type: Option<OptionType>,
    pub holding_days: i64,
}

impl TradeRecord {
    pub fn notional(&self) -> f64 {
        self.price * self.volume
    }
}
