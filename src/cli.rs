//! CLI definition and dispatch.

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use crate::adapters::calendar_adapter::{GregorianCalendar, JalaliCalendar};
use crate::adapters::csv_adapter::{read_cash_flows, CsvReferenceAdapter, CsvTradeAdapter};
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::cash_flow::{cash_flows_from_trades, CashFlow};
use crate::domain::cumulation::{cumulate, AggregatedPosition};
use crate::domain::error::LedgerError;
use crate::domain::irr::{irr, IrrOutcome};
use crate::domain::netting::{build_portfolio, PortfolioEntry};
use crate::domain::normalizer::{normalize_trades, NormalizeContext};
use crate::domain::reference::ReferenceTable;
use crate::domain::settings::{build_settings, CalendarKind, Settings};
use crate::domain::trade::{RawTrade, TradeRecord};
use crate::ports::calendar_port::CalendarPort;
use crate::ports::reference_port::ReferencePort;
use crate::ports::trade_port::TradePort;

#[derive(Parser, Debug)]
#[command(
    name = "portfolio-ledger",
    about = "Trade ledger cumulation, position netting and IRR"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Args, Debug, Clone)]
pub struct LedgerArgs {
    /// Trade ledger CSV (date, fund, symbol, position, price, vol)
    #[arg(short, long)]
    pub trades: PathBuf,
    /// Reference CSV (symbol, market); without it every symbol is an option
    #[arg(short, long)]
    pub reference: Option<PathBuf>,
    /// INI configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Valuation date (YYYY-MM-DD), defaults to [valuation] as_of or today
    #[arg(long)]
    pub as_of: Option<NaiveDate>,
    /// Calendar of the trade dates: jalali or gregorian
    #[arg(long)]
    pub calendar: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the normalized trade ledger
    Trades {
        #[command(flatten)]
        ledger: LedgerArgs,
    },
    /// Cumulate trades into held positions per symbol and direction
    Positions {
        #[command(flatten)]
        ledger: LedgerArgs,
    },
    /// Net long and short volumes into current holdings
    Portfolio {
        #[command(flatten)]
        ledger: LedgerArgs,
    },
    /// Internal rate of return per 30-day period
    Irr {
        /// Cash-flow CSV (value, until_now)
        #[arg(long, conflicts_with = "trades")]
        cash_flows: Option<PathBuf>,
        /// Derive cash flows from a trade ledger instead
        #[arg(short, long)]
        trades: Option<PathBuf>,
        #[arg(short, long)]
        reference: Option<PathBuf>,
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(long)]
        as_of: Option<NaiveDate>,
        #[arg(long)]
        calendar: Option<String>,
        /// Current value of the open positions, added as a flow on the valuation date
        #[arg(long, allow_hyphen_values = true)]
        terminal_value: Option<f64>,
    },
    /// Validate a configuration file and print the effective settings
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Trades { ledger } => run_trades(&ledger),
        Command::Positions { ledger } => run_positions(&ledger),
        Command::Portfolio { ledger } => run_portfolio(&ledger),
        Command::Irr {
            cash_flows,
            trades,
            reference,
            config,
            as_of,
            calendar,
            terminal_value,
        } => match (cash_flows, trades) {
            (Some(path), _) => run_irr_from_file(&path, config.as_ref()),
            (None, Some(trades)) => {
                let ledger = LedgerArgs {
                    trades,
                    reference,
                    config,
                    as_of,
                    calendar,
                };
                run_irr_from_trades(&ledger, terminal_value)
            }
            (None, None) => {
                eprintln!("error: either --cash-flows or --trades is required");
                return ExitCode::from(2);
            }
        },
        Command::Validate { config } => run_validate(&config),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn load_settings(path: Option<&PathBuf>) -> Result<Settings, LedgerError> {
    let adapter = match path {
        Some(p) => {
            eprintln!("Loading config from {}", p.display());
            FileConfigAdapter::from_file(p).map_err(|e| LedgerError::ConfigParse {
                file: p.display().to_string(),
                reason: e.to_string(),
            })?
        }
        None => FileConfigAdapter::empty(),
    };
    build_settings(&adapter)
}

pub fn load_reference(path: Option<&PathBuf>) -> Result<ReferenceTable, LedgerError> {
    match path {
        Some(p) => Ok(ReferenceTable::new(
            CsvReferenceAdapter::new(p.clone()).fetch_reference()?,
        )),
        None => {
            eprintln!("warning: no reference data, every symbol defaults to the option market");
            Ok(ReferenceTable::default())
        }
    }
}

pub fn calendar_for(kind: CalendarKind) -> Box<dyn CalendarPort> {
    match kind {
        CalendarKind::Jalali => Box::new(JalaliCalendar),
        CalendarKind::Gregorian => Box::new(GregorianCalendar),
    }
}

/// Settings with the command-line overrides applied.
pub fn resolve_settings(ledger: &LedgerArgs) -> Result<Settings, LedgerError> {
    let mut settings = load_settings(ledger.config.as_ref())?;
    if let Some(as_of) = ledger.as_of {
        settings.as_of = Some(as_of);
    }
    if let Some(ref calendar) = ledger.calendar {
        settings.calendar = calendar
            .parse::<CalendarKind>()
            .map_err(|reason| LedgerError::ConfigInvalid {
                section: "valuation".into(),
                key: "calendar".into(),
                reason,
            })?;
    }
    Ok(settings)
}

pub struct Ledger {
    pub settings: Settings,
    pub reference: ReferenceTable,
    pub raw: Vec<RawTrade>,
}

pub fn load_ledger(ledger: &LedgerArgs) -> Result<Ledger, LedgerError> {
    let settings = resolve_settings(ledger)?;
    let reference = load_reference(ledger.reference.as_ref())?;
    eprintln!("Loading trades from {}", ledger.trades.display());
    let raw = CsvTradeAdapter::new(ledger.trades.clone()).fetch_trades()?;
    Ok(Ledger {
        settings,
        reference,
        raw,
    })
}

pub fn normalize_ledger(ledger: &Ledger) -> Result<Vec<TradeRecord>, LedgerError> {
    let as_of = ledger
        .settings
        .as_of
        .unwrap_or_else(|| chrono::Local::now().date_naive());
    let ctx = NormalizeContext {
        prefixes: ledger.settings.prefixes,
        as_of,
    };
    let calendar = calendar_for(ledger.settings.calendar);
    let records = normalize_trades(&ledger.raw, &ledger.reference, calendar.as_ref(), &ctx)?;

    let defaulted = records.iter().filter(|r| r.market_defaulted).count();
    if defaulted > 0 {
        tracing::info!(defaulted, "symbols without reference data treated as options");
    }
    Ok(records)
}

fn opt_to_string<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

pub fn write_trades<W: Write>(out: W, records: &[TradeRecord]) -> Result<(), LedgerError> {
    let mut wtr = csv::Writer::from_writer(out);
    wtr.write_record([
        "date", "fund", "symbol", "position", "price", "vol", "market", "type", "holding_days",
    ])
    .map_err(std::io::Error::from)?;
    for r in records {
        wtr.write_record([
            r.date.to_string(),
            r.fund.clone(),
            r.symbol.clone(),
            r.position.to_string(),
            r.price.to_string(),
            r.volume.to_string(),
            r.market.to_string(),
            opt_to_string(r.option_type),
            r.holding_days.to_string(),
        ])
        .map_err(std::io::Error::from)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_positions<W: Write>(out: W, positions: &[AggregatedPosition]) -> Result<(), LedgerError> {
    let mut wtr = csv::Writer::from_writer(out);
    wtr.write_record([
        "date", "fund", "symbol", "position", "price", "vol", "type", "holding_days",
    ])
    .map_err(std::io::Error::from)?;
    for p in positions {
        wtr.write_record([
            p.date.to_string(),
            p.fund.clone(),
            p.symbol.clone(),
            p.position.to_string(),
            p.price.to_string(),
            p.volume.to_string(),
            opt_to_string(p.option_type),
            p.holding_days.to_string(),
        ])
        .map_err(std::io::Error::from)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_portfolio<W: Write>(out: W, entries: &[PortfolioEntry]) -> Result<(), LedgerError> {
    let mut wtr = csv::Writer::from_writer(out);
    wtr.write_record(["symbol", "fund", "market", "type", "position", "vol"])
        .map_err(std::io::Error::from)?;
    for e in entries {
        wtr.write_record([
            e.symbol.clone(),
            e.fund.clone(),
            e.market.to_string(),
            opt_to_string(e.option_type),
            e.position.to_string(),
            e.volume.to_string(),
        ])
        .map_err(std::io::Error::from)?;
    }
    wtr.flush()?;
    Ok(())
}

fn run_trades(args: &LedgerArgs) -> Result<(), LedgerError> {
    let ledger = load_ledger(args)?;
    let records = normalize_ledger(&ledger)?;
    eprintln!("{} trades normalized", records.len());
    write_trades(std::io::stdout().lock(), &records)
}

fn run_positions(args: &LedgerArgs) -> Result<(), LedgerError> {
    let ledger = load_ledger(args)?;
    let records = normalize_ledger(&ledger)?;
    let positions = cumulate(&records)?;
    eprintln!(
        "{} trades cumulated into {} positions",
        records.len(),
        positions.len()
    );
    write_positions(std::io::stdout().lock(), &positions)
}

fn run_portfolio(args: &LedgerArgs) -> Result<(), LedgerError> {
    let ledger = load_ledger(args)?;
    let entries = build_portfolio(&ledger.raw, &ledger.reference, &ledger.settings.prefixes)?;
    eprintln!("{} open positions", entries.len());
    write_portfolio(std::io::stdout().lock(), &entries)
}

fn print_irr(flows: &[CashFlow], settings: &Settings) -> Result<(), LedgerError> {
    eprintln!("Solving IRR over {} cash flows", flows.len());
    match irr(flows, &settings.irr)? {
        IrrOutcome::Converged { rate, iterations } => {
            eprintln!("  converged in {} iterations", iterations);
            println!("{rate:.6}");
        }
        IrrOutcome::NotBracketed => {
            eprintln!(
                "  no IRR in [{}, {}]",
                settings.irr.lower_bound, settings.irr.max_upper
            );
            println!("none");
        }
    }
    Ok(())
}

fn run_irr_from_file(path: &PathBuf, config: Option<&PathBuf>) -> Result<(), LedgerError> {
    let settings = load_settings(config)?;
    eprintln!("Loading cash flows from {}", path.display());
    let flows = read_cash_flows(path)?;
    print_irr(&flows, &settings)
}

fn run_irr_from_trades(args: &LedgerArgs, terminal_value: Option<f64>) -> Result<(), LedgerError> {
    let ledger = load_ledger(args)?;
    let records = normalize_ledger(&ledger)?;
    let flows = cash_flows_from_trades(&records, terminal_value);
    print_irr(&flows, &ledger.settings)
}

fn run_validate(config: &PathBuf) -> Result<(), LedgerError> {
    let settings = load_settings(Some(config))?;
    eprintln!("\nEffective settings:");
    eprintln!("  risk_free_rate: {}", settings.risk_free_rate);
    eprintln!(
        "  as_of:          {}",
        settings
            .as_of
            .map(|d| d.to_string())
            .unwrap_or_else(|| "today".into())
    );
    eprintln!("  calendar:       {:?}", settings.calendar);
    eprintln!(
        "  prefixes:       put={} call={}",
        settings.prefixes.put, settings.prefixes.call
    );
    eprintln!(
        "  irr bracket:    [{}, {}] step {} up to {}",
        settings.irr.lower_bound, settings.irr.initial_upper, settings.irr.step, settings.irr.max_upper
    );
    eprintln!(
        "  irr solver:     xtol {} max {} iterations",
        settings.irr.tolerance, settings.irr.max_iterations
    );
    eprintln!("\nConfiguration is valid.");
    Ok(())
}
