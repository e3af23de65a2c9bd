//! CSV file adapters for trades, reference data and cash flows.
//!
//! Columns are located by header name, so column order is free. Row numbers
//! in errors count data rows from 1.

use crate::domain::cash_flow::CashFlow;
use crate::domain::error::LedgerError;
use crate::domain::reference::ReferenceRow;
use crate::domain::trade::{Market, Position, RawTrade};
use crate::ports::reference_port::ReferencePort;
use crate::ports::trade_port::TradePort;
use csv::StringRecord;
use std::path::{Path, PathBuf};

fn open(path: &Path) -> Result<csv::Reader<std::fs::File>, LedgerError> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| LedgerError::Source {
            reason: format!("failed to read {}: {}", path.display(), e),
        })
}

/// Column positions resolved from the header row.
struct Columns {
    headers: StringRecord,
}

impl Columns {
    fn from_reader(rdr: &mut csv::Reader<std::fs::File>, path: &Path) -> Result<Self, LedgerError> {
        let headers = rdr.headers().map_err(|e| LedgerError::Source {
            reason: format!("failed to read header of {}: {}", path.display(), e),
        })?;
        Ok(Columns {
            headers: headers.clone(),
        })
    }

    /// Index of the first header matching any of `names` (case-insensitive).
    fn find(&self, names: &[&str]) -> Option<usize> {
        self.headers
            .iter()
            .position(|h| names.iter().any(|n| h.eq_ignore_ascii_case(n)))
    }

    fn require(&self, names: &[&str], path: &Path) -> Result<usize, LedgerError> {
        self.find(names).ok_or_else(|| LedgerError::Source {
            reason: format!("{}: missing {} column", path.display(), names[0]),
        })
    }
}

fn cell<'r>(record: &'r StringRecord, idx: usize, row: usize, field: &str) -> Result<&'r str, LedgerError> {
    match record.get(idx) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(LedgerError::MissingField {
            row,
            field: field.to_string(),
        }),
    }
}

fn number(record: &StringRecord, idx: usize, row: usize, field: &str) -> Result<f64, LedgerError> {
    let raw = cell(record, idx, row, field)?;
    let cleaned: String = raw.chars().filter(|c| *c != ',' && !c.is_whitespace()).collect();
    cleaned
        .parse()
        .map_err(|e| LedgerError::invalid_field(row, field, format!("{raw:?}: {e}")))
}

fn records(
    rdr: &mut csv::Reader<std::fs::File>,
) -> impl Iterator<Item = (usize, Result<StringRecord, LedgerError>)> + '_ {
    rdr.records().enumerate().map(|(idx, result)| {
        (
            idx + 1,
            result.map_err(|e| LedgerError::Source {
                reason: format!("CSV parse error: {}", e),
            }),
        )
    })
}

/// Trade ledger with `date, fund, symbol, position, price, vol` columns.
pub struct CsvTradeAdapter {
    path: PathBuf,
}

impl CsvTradeAdapter {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl TradePort for CsvTradeAdapter {
    fn fetch_trades(&self) -> Result<Vec<RawTrade>, LedgerError> {
        let mut rdr = open(&self.path)?;
        let cols = Columns::from_reader(&mut rdr, &self.path)?;
        let date_idx = cols.require(&["date"], &self.path)?;
        let fund_idx = cols.require(&["fund"], &self.path)?;
        let symbol_idx = cols.require(&["symbol"], &self.path)?;
        let position_idx = cols.require(&["position"], &self.path)?;
        let price_idx = cols.require(&["price"], &self.path)?;
        let volume_idx = cols.require(&["vol", "volume"], &self.path)?;

        let mut trades = Vec::new();
        for (row, result) in records(&mut rdr) {
            let record = result?;
            let position = cell(&record, position_idx, row, "position")?
                .parse::<Position>()
                .map_err(|reason| LedgerError::invalid_field(row, "position", reason))?;

            trades.push(RawTrade {
                date: cell(&record, date_idx, row, "date")?.to_string(),
                fund: record.get(fund_idx).unwrap_or_default().to_string(),
                symbol: cell(&record, symbol_idx, row, "symbol")?.to_string(),
                position,
                price: number(&record, price_idx, row, "price")?,
                volume: number(&record, volume_idx, row, "volume")?,
            });
        }

        tracing::debug!(path = %self.path.display(), trades = trades.len(), "loaded trades");
        Ok(trades)
    }
}

/// Instrument reference table with `symbol, market` columns.
pub struct CsvReferenceAdapter {
    path: PathBuf,
}

impl CsvReferenceAdapter {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl ReferencePort for CsvReferenceAdapter {
    fn fetch_reference(&self) -> Result<Vec<ReferenceRow>, LedgerError> {
        let mut rdr = open(&self.path)?;
        let cols = Columns::from_reader(&mut rdr, &self.path)?;
        let symbol_idx = cols.require(&["symbol"], &self.path)?;
        let market_idx = cols.require(&["market"], &self.path)?;

        let mut rows = Vec::new();
        for (row, result) in records(&mut rdr) {
            let record = result?;
            rows.push(ReferenceRow {
                symbol: cell(&record, symbol_idx, row, "symbol")?.to_string(),
                market: Market::from(cell(&record, market_idx, row, "market")?),
            });
        }

        tracing::debug!(path = %self.path.display(), rows = rows.len(), "loaded reference data");
        Ok(rows)
    }
}

/// Cash-flow series with `value, until_now` columns.
pub fn read_cash_flows(path: &Path) -> Result<Vec<CashFlow>, LedgerError> {
    let mut rdr = open(path)?;
    let cols = Columns::from_reader(&mut rdr, path)?;
    let value_idx = cols.require(&["value"], path)?;
    let until_idx = cols.require(&["until_now", "days"], path)?;

    let mut flows = Vec::new();
    for (row, result) in records(&mut rdr) {
        let record = result?;
        flows.push(CashFlow::new(
            number(&record, value_idx, row, "value")?,
            number(&record, until_idx, row, "until_now")?,
        ));
    }
    Ok(flows)
}
