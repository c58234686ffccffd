//! Backward-induction exercise allocation for a single path.
//!
//! At maturity the warrant is exercised whenever it finishes in the money.
//! Before maturity the only exercise is the forced one: the holder realises
//! intrinsic value on the last step before a pending redemption takes effect,
//! detected by the next price being the `0.0` redemption sentinel. An earlier
//! exercise cancels any later one found so far, so each path carries at most
//! one cash flow.

/// Exercise rule for one warrant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExerciseEngine {
    pub strike: f64,
    /// Steps `0..=lockout` never carry a cash flow.
    pub lockout: usize,
}

impl ExerciseEngine {
    pub fn new(strike: f64, lockout: usize) -> Self {
        Self { strike, lockout }
    }

    /// Fills `cash_flows` and `stop_rule` (both `prices.len()` long) for one
    /// path and returns the exercise step, if any.
    pub fn allocate(&self, prices: &[f64], cash_flows: &mut [f64], stop_rule: &mut [u8]) -> Option<usize> {
        debug_assert_eq!(prices.len(), cash_flows.len());
        debug_assert_eq!(prices.len(), stop_rule.len());
        cash_flows.fill(0.0);
        stop_rule.fill(0);

        let steps = prices.len().checked_sub(1)?;
        if steps <= self.lockout {
            return None;
        }

        let mut exercised_at = None;
        let terminal = prices[steps];
        cash_flows[steps] = (terminal - self.strike).max(0.0);
        if terminal > self.strike {
            stop_rule[steps] = 1;
            exercised_at = Some(steps);
        }

        for t in (self.lockout + 1..steps).rev() {
            if prices[t] > self.strike && prices[t + 1] == 0.0 {
                if let Some(later) = exercised_at {
                    cash_flows[later] = 0.0;
                    stop_rule[later] = 0;
                }
                cash_flows[t] = prices[t] - self.strike;
                stop_rule[t] = 1;
                exercised_at = Some(t);
            }
        }

        exercised_at
    }
}
