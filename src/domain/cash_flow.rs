//! Dated cash flows and their net present value.

use super::trade::{Position, TradeRecord};

/// Days per compounding period.
pub const DAYS_PER_PERIOD: f64 = 30.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CashFlow {
    /// Negative for money paid out, positive for money received.
    pub value: f64,
    /// Days between the flow and the valuation date.
    pub until_now: f64,
}

impl CashFlow {
    pub fn new(value: f64, until_now: f64) -> Self {
        CashFlow { value, until_now }
    }
}

/// Σ value · (1 + r)^(until_now / 30).
///
/// Flows are compounded forward to the valuation date. `rate` must be
/// greater than -1; callers keep the search domain above that bound.
pub fn npv(flows: &[CashFlow], rate: f64) -> f64 {
    let base = 1.0 + rate;
    flows
        .iter()
        .map(|cf| cf.value * base.powf(cf.until_now / DAYS_PER_PERIOD))
        .sum()
}

/// Buys pay out, sells take in; each flow is dated by the trade's holding
/// period. An optional terminal value (e.g. the current mark of the open
/// positions) is added as a flow on the valuation date.
pub fn cash_flows_from_trades(trades: &[TradeRecord], terminal_value: Option<f64>) -> Vec<CashFlow> {
    let mut flows: Vec<CashFlow> = trades
        .iter()
        .map(|t| {
            let value = match t.position {
                Position::Long => -t.notional(),
                Position::Short => t.notional(),
            };
            CashFlow::new(value, t.holding_days as f64)
        })
        .collect();

    if let Some(value) = terminal_value {
        flows.push(CashFlow::new(value, 0.0));
    }
    flows
}
