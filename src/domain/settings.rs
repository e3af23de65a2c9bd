//! Run settings built from configuration.
//!
//! Every key is optional; present keys are validated before use.

use chrono::NaiveDate;
use std::str::FromStr;

use super::error::LedgerError;
use super::irr::IrrConfig;
use super::trade::OptionPrefixes;
use crate::ports::config_port::ConfigPort;

pub const DEFAULT_RISK_FREE_RATE: f64 = 0.30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalendarKind {
    Jalali,
    Gregorian,
}

impl FromStr for CalendarKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "jalali" | "solar_hijri" | "persian" => Ok(CalendarKind::Jalali),
            "gregorian" => Ok(CalendarKind::Gregorian),
            other => Err(format!("unknown calendar {other:?} (expected jalali or gregorian)")),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Annual risk-free rate, kept for pricing collaborators.
    pub risk_free_rate: f64,
    /// Valuation date; `None` means today.
    pub as_of: Option<NaiveDate>,
    pub calendar: CalendarKind,
    pub prefixes: OptionPrefixes,
    pub irr: IrrConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            risk_free_rate: DEFAULT_RISK_FREE_RATE,
            as_of: None,
            calendar: CalendarKind::Jalali,
            prefixes: OptionPrefixes::default(),
            irr: IrrConfig::default(),
        }
    }
}

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> LedgerError {
    LedgerError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

fn read_double(config: &dyn ConfigPort, section: &str, key: &str, default: f64) -> Result<f64, LedgerError> {
    let value = config
        .get_double(section, key)
        .map_err(|reason| invalid(section, key, reason))?
        .unwrap_or(default);
    if !value.is_finite() {
        return Err(invalid(section, key, "must be a finite number"));
    }
    Ok(value)
}

fn read_char(config: &dyn ConfigPort, section: &str, key: &str, default: char) -> Result<char, LedgerError> {
    match config.get_string(section, key) {
        None => Ok(default),
        Some(s) => {
            let mut chars = s.trim().chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Ok(c),
                _ => Err(invalid(section, key, "must be a single character")),
            }
        }
    }
}

pub fn build_settings(config: &dyn ConfigPort) -> Result<Settings, LedgerError> {
    let defaults = Settings::default();

    let risk_free_rate = read_double(config, "valuation", "risk_free_rate", defaults.risk_free_rate)?;
    if !(0.0..1.0).contains(&risk_free_rate) {
        return Err(invalid("valuation", "risk_free_rate", "must be between 0 and 1"));
    }

    let as_of = match config.get_string("valuation", "as_of") {
        None => None,
        Some(s) => Some(NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| {
            invalid("valuation", "as_of", "invalid date format (expected YYYY-MM-DD)")
        })?),
    };

    let calendar = match config.get_string("valuation", "calendar") {
        None => defaults.calendar,
        Some(s) => s
            .parse::<CalendarKind>()
            .map_err(|reason| invalid("valuation", "calendar", reason))?,
    };

    let prefixes = OptionPrefixes {
        put: read_char(config, "classification", "put_prefix", defaults.prefixes.put)?,
        call: read_char(config, "classification", "call_prefix", defaults.prefixes.call)?,
    };
    if prefixes.put == prefixes.call {
        return Err(invalid("classification", "call_prefix", "must differ from put_prefix"));
    }

    Ok(Settings {
        risk_free_rate,
        as_of,
        calendar,
        prefixes,
        irr: build_irr_config(config)?,
    })
}

fn build_irr_config(config: &dyn ConfigPort) -> Result<IrrConfig, LedgerError> {
    let defaults = IrrConfig::default();

    let lower_bound = read_double(config, "irr", "lower_bound", defaults.lower_bound)?;
    if lower_bound <= -1.0 {
        return Err(invalid("irr", "lower_bound", "must be greater than -1"));
    }
    let initial_upper = read_double(config, "irr", "initial_upper", defaults.initial_upper)?;
    if initial_upper <= lower_bound {
        return Err(invalid("irr", "initial_upper", "must be greater than lower_bound"));
    }
    let step = read_double(config, "irr", "step", defaults.step)?;
    if step <= 0.0 {
        return Err(invalid("irr", "step", "must be positive"));
    }
    let max_upper = read_double(config, "irr", "max_upper", defaults.max_upper)?;
    if max_upper < initial_upper {
        return Err(invalid("irr", "max_upper", "must not be below initial_upper"));
    }
    let tolerance = read_double(config, "irr", "tolerance", defaults.tolerance)?;
    if tolerance <= 0.0 {
        return Err(invalid("irr", "tolerance", "must be positive"));
    }
    let max_iterations = config
        .get_int("irr", "max_iterations")
        .map_err(|reason| invalid("irr", "max_iterations", reason))?
        .unwrap_or(defaults.max_iterations as i64);
    if max_iterations <= 0 {
        return Err(invalid("irr", "max_iterations", "must be positive"));
    }

    Ok(IrrConfig {
        lower_bound,
        initial_upper,
        step,
        max_upper,
        tolerance,
        max_iterations: max_iterations as usize,
    })
}
