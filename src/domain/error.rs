//! Domain error types.

use super::trade::Position;

/// Top-level error type for portfolio_ledger.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("degenerate aggregation: zero volume in group {symbol} ({position})")]
    DegenerateAggregation { symbol: String, position: Position },

    #[error("row {row}: invalid {field}: {reason}")]
    InvalidField {
        row: usize,
        field: String,
        reason: String,
    },

    #[error("row {row}: missing {field}")]
    MissingField { row: usize, field: String },

    #[error("invalid date {value:?}: {reason}")]
    InvalidDate { value: String, reason: String },

    #[error("source error: {reason}")]
    Source { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("root finder did not converge after {iterations} iterations")]
    NonConvergence { iterations: usize },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl LedgerError {
    pub(crate) fn invalid_field(row: usize, field: &str, reason: impl Into<String>) -> Self {
        LedgerError::InvalidField {
            row,
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<&LedgerError> for std::process::ExitCode {
    fn from(err: &LedgerError) -> Self {
        let code: u8 = match err {
            LedgerError::Io(_) => 1,
            LedgerError::ConfigParse { .. } | LedgerError::ConfigInvalid { .. } => 2,
            LedgerError::Source { .. }
            | LedgerError::InvalidField { .. }
            | LedgerError::MissingField { .. }
            | LedgerError::InvalidDate { .. } => 3,
            LedgerError::DegenerateAggregation { .. } | LedgerError::NonConvergence { .. } => 4,
        };
        std::process::ExitCode::from(code)
    }
}
