//! Discounted cash flow at a constant per-step discount factor.

use crate::mc::PathMatrix;

/// Backward-recursion discounter.
///
/// Cash-flow inputs start one step in the future: element `0` is paid at step
/// 1, element `n - 1` at step `n`. Time-0 cash flows are not supported.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Discounter {
    /// Discount factor applied per step.
    pub factor: f64,
}

impl Discounter {
    pub fn new(factor: f64) -> Self {
        Self { factor }
    }

    /// `exp(-rate * dt)`.
    pub fn per_step(rate: f64, dt: f64) -> Self {
        Self::new((-rate * dt).exp())
    }

    /// Present value of one path's cash flows.
    ///
    /// The accumulator starts as `d * cf[n-1] + cf[n-2]`, folds each earlier
    /// flow in as `acc = d * acc + cf[t-1]`, and is discounted once more to
    /// time 0. A single flow is simply `d * cf[0]`; no flows is worth zero.
    pub fn present_value(&self, cash_flows: &[f64]) -> f64 {
        let d = self.factor;
        match cash_flows.len() {
            0 => 0.0,
            1 => d * cash_flows[0],
            n => {
                let mut acc = d * cash_flows[n - 1] + cash_flows[n - 2];
                for t in (1..n - 1).rev() {
                    acc = d * acc + cash_flows[t - 1];
                }
                d * acc
            }
        }
    }

    /// One present value per matrix row.
    pub fn present_values(&self, cash_flows: &PathMatrix<f64>) -> Vec<f64> {
        cash_flows
            .iter_rows()
            .map(|row| self.present_value(row))
            .collect()
    }

    /// One-dimensional input: one single-step cash flow per path.
    pub fn present_values_single_step(&self, cash_flows: &[f64]) -> Vec<f64> {
        cash_flows.iter().map(|&cf| self.present_value(&[cf])).collect()
    }
}
