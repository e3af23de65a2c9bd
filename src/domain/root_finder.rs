//! Bracketed root finding (Brent's method).
//!
//! Combines bisection with secant and inverse quadratic steps; an interpolated
//! step is only accepted while it shrinks the bracket fast enough, so the
//! method never does worse than bisection on a bracket with a sign change.

/// Relative tolerance added to the absolute one, scaled by |x|.
const RELATIVE_TOLERANCE: f64 = 4.0 * f64::EPSILON;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RootEstimate {
    pub root: f64,
    pub iterations: usize,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RootError {
    #[error("f({a}) and f({b}) must have opposite signs")]
    NotBracketed { a: f64, b: f64 },

    #[error("no convergence after {iterations} iterations (last estimate {last})")]
    MaxIterations { iterations: usize, last: f64 },
}

/// Find x in [a, b] with f(x) = 0 to within `xtol`.
pub fn brent<F>(f: F, a: f64, b: f64, xtol: f64, max_iterations: usize) -> Result<RootEstimate, RootError>
where
    F: Fn(f64) -> f64,
{
    let (mut x_prev, mut x_cur) = (a, b);
    let (mut f_prev, mut f_cur) = (f(x_prev), f(x_cur));

    if f_prev == 0.0 {
        return Ok(RootEstimate { root: x_prev, iterations: 0 });
    }
    if f_cur == 0.0 {
        return Ok(RootEstimate { root: x_cur, iterations: 0 });
    }
    if f_prev.is_sign_negative() == f_cur.is_sign_negative() || f_prev.is_nan() || f_cur.is_nan() {
        return Err(RootError::NotBracketed { a, b });
    }

    // x_blk is the far end of the bracket: f_blk always has the opposite sign of f_cur.
    let (mut x_blk, mut f_blk) = (0.0, 0.0);
    let (mut step_prev, mut step_cur) = (0.0_f64, 0.0_f64);

    for iteration in 1..=max_iterations {
        if f_prev != 0.0 && f_cur != 0.0 && f_prev.is_sign_negative() != f_cur.is_sign_negative() {
            x_blk = x_prev;
            f_blk = f_prev;
            step_prev = x_cur - x_prev;
            step_cur = step_prev;
        }
        if f_blk.abs() < f_cur.abs() {
            x_prev = x_cur;
            x_cur = x_blk;
            x_blk = x_prev;
            f_prev = f_cur;
            f_cur = f_blk;
            f_blk = f_prev;
        }

        let delta = (xtol + RELATIVE_TOLERANCE * x_cur.abs()) / 2.0;
        let bisect = (x_blk - x_cur) / 2.0;
        if f_cur == 0.0 || bisect.abs() < delta {
            return Ok(RootEstimate { root: x_cur, iterations: iteration });
        }

        if step_prev.abs() > delta && f_cur.abs() < f_prev.abs() {
            let trial = if x_prev == x_blk {
                // secant
                -f_cur * (x_cur - x_prev) / (f_cur - f_prev)
            } else {
                // inverse quadratic
                let d_prev = (f_prev - f_cur) / (x_prev - x_cur);
                let d_blk = (f_blk - f_cur) / (x_blk - x_cur);
                -f_cur * (f_blk * d_blk - f_prev * d_prev) / (d_blk * d_prev * (f_blk - f_prev))
            };
            if 2.0 * trial.abs() < step_prev.abs().min(3.0 * bisect.abs() - delta) {
                step_prev = step_cur;
                step_cur = trial;
            } else {
                step_prev = bisect;
                step_cur = bisect;
            }
        } else {
            step_prev = bisect;
            step_cur = bisect;
        }

        x_prev = x_cur;
        f_prev = f_cur;
        if step_cur.abs() > delta {
            x_cur += step_cur;
        } else {
            x_cur += if bisect > 0.0 { delta } else { -delta };
        }
        f_cur = f(x_cur);
    }

    Err(RootError::MaxIterations {
        iterations: max_iterations,
        last: x_cur,
    })
}
