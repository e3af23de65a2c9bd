//! Internal rate of return.
//!
//! The lower end of the bracket is fixed above -1 so `1 + r` stays positive;
//! the upper end grows in fixed steps until NPV changes sign or the cap is
//! passed. With several sign changes the first bracketed root is returned.

use super::cash_flow::{npv, CashFlow};
use super::error::LedgerError;
use super::root_finder::{brent, RootError};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IrrConfig {
    pub lower_bound: f64,
    pub initial_upper: f64,
    pub step: f64,
    pub max_upper: f64,
    pub tolerance: f64,
    pub max_iterations: usize,
}

impl Default for IrrConfig {
    fn default() -> Self {
        IrrConfig {
            lower_bound: -0.99,
            initial_upper: 10.0,
            step: 10.0,
            max_upper: 1000.0,
            tolerance: 1e-6,
            max_iterations: 100,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IrrOutcome {
    Converged { rate: f64, iterations: usize },
    /// NPV never changed sign inside the search range; no IRR exists there.
    NotBracketed,
}

impl IrrOutcome {
    pub fn rate(&self) -> Option<f64> {
        match self {
            IrrOutcome::Converged { rate, .. } => Some(*rate),
            IrrOutcome::NotBracketed => None,
        }
    }
}

const OVERFLOW_BISECTIONS: usize = 64;

fn same_sign(a: f64, b: f64) -> bool {
    (a > 0.0 && b > 0.0) || (a < 0.0 && b < 0.0)
}

/// Bisects `(below, overflow)`, where NPV is finite with the sign of `f_lower`
/// at `below` and non-finite at `overflow`, for a finite point of opposite sign.
fn sign_change_before_overflow(
    flows: &[CashFlow],
    f_lower: f64,
    mut below: f64,
    mut overflow: f64,
) -> Option<f64> {
    for _ in 0..OVERFLOW_BISECTIONS {
        let mid = below + (overflow - below) / 2.0;
        let f_mid = npv(flows, mid);
        if !f_mid.is_finite() {
            overflow = mid;
        } else if same_sign(f_lower, f_mid) {
            below = mid;
        } else {
            return Some(mid);
        }
    }
    None
}

/// Rate per 30-day period at which the NPV of `flows` is zero.
pub fn irr(flows: &[CashFlow], config: &IrrConfig) -> Result<IrrOutcome, LedgerError> {
    if flows.iter().all(|cf| cf.value == 0.0) {
        tracing::warn!(flows = flows.len(), "no non-zero cash flows, IRR undefined");
        return Ok(IrrOutcome::NotBracketed);
    }

    let lower = config.lower_bound;
    let f_lower = npv(flows, lower);
    if !f_lower.is_finite() {
        tracing::warn!(lower, "NPV not finite at lower bound, IRR not bracketed");
        return Ok(IrrOutcome::NotBracketed);
    }
    // Largest rate seen so far whose NPV shares the sign of `f_lower`.
    let mut below = lower;
    let mut upper = config.initial_upper;

    loop {
        let f_upper = npv(flows, upper);
        if !f_upper.is_finite() {
            match sign_change_before_overflow(flows, f_lower, below, upper) {
                Some(bracketed) => {
                    tracing::debug!(upper, bracketed, "NPV overflowed, bracket pulled back");
                    upper = bracketed;
                    break;
                }
                None => {
                    tracing::warn!(lower, upper, "NPV not finite, abandoning bracket search");
                    return Ok(IrrOutcome::NotBracketed);
                }
            }
        }
        if !same_sign(f_lower, f_upper) {
            break;
        }
        below = upper;
        upper += config.step;
        if upper > config.max_upper {
            tracing::warn!(max_upper = config.max_upper, "no sign change in NPV, IRR not bracketed");
            return Ok(IrrOutcome::NotBracketed);
        }
        tracing::debug!(upper, "expanding IRR bracket");
    }

    match brent(|r| npv(flows, r), lower, upper, config.tolerance, config.max_iterations) {
        Ok(est) => {
            tracing::debug!(rate = est.root, iterations = est.iterations, "IRR converged");
            Ok(IrrOutcome::Converged {
                rate: est.root,
                iterations: est.iterations,
            })
        }
        Err(RootError::NotBracketed { .. }) => Ok(IrrOutcome::NotBracketed),
        Err(RootError::MaxIterations { iterations, .. }) => {
            Err(LedgerError::NonConvergence { iterations })
        }
    }
}
