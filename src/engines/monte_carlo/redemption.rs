//! Rolling barrier-crossing counts and mechanical forced redemption.
//!
//! Redemption is recorded in the price row itself: every price from the
//! effective redemption step onward is set to exactly `0.0`. Simulated prices
//! are strictly positive, so zero unambiguously marks an extinguished warrant.

use crate::instruments::RedemptionTerms;

/// Barrier tracker for one warrant's redemption provision.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RedemptionTracker {
    pub barrier: f64,
    pub window: usize,
    pub trigger_count: usize,
    pub delay: usize,
    /// Steps that must elapse before crossings are counted.
    pub lockout: usize,
}

impl RedemptionTracker {
    pub fn new(terms: &RedemptionTerms, lockout: usize) -> Self {
        Self {
            barrier: terms.barrier,
            window: terms.window,
            trigger_count: terms.trigger_count,
            delay: terms.delay,
            lockout,
        }
    }

    /// First step of the counting window that ends at step `t` (`t > lockout`).
    ///
    /// During ramp-up the window is anchored at `lockout` while
    /// `t - lockout < window - 1`; afterwards it is the trailing `window`
    /// entries ending at `t`.
    #[inline]
    pub fn window_start(&self, t: usize) -> usize {
        if t - self.lockout < self.window - 1 {
            self.lockout
        } else {
            t + 1 - self.window
        }
    }

    /// Writes the rolling crossing count for every step of `prices` into
    /// `counts`. Steps at or before the lockout get zero.
    pub fn barrier_counts(&self, prices: &[f64], counts: &mut [u32]) {
        debug_assert_eq!(prices.len(), counts.len());
        counts.fill(0);
        if self.lockout + 1 >= prices.len() {
            return;
        }

        let hit = |s: f64| u32::from(s >= self.barrier);
        let mut lo = self.lockout;
        let mut running = hit(prices[lo]);
        for t in self.lockout + 1..prices.len() {
            running += hit(prices[t]);
            let start = self.window_start(t);
            while lo < start {
                running -= hit(prices[lo]);
                lo += 1;
            }
            counts[t] = running;
        }
    }

    /// Step from which the warrant is extinguished, if any.
    ///
    /// Triggers are checked at steps `0..=steps - 2`; the first step whose
    /// count reaches `trigger_count` schedules redemption `delay` steps later.
    /// A schedule falling after maturity has no effect.
    pub fn redemption_step(&self, counts: &[u32]) -> Option<usize> {
        let steps = counts.len().checked_sub(1)?;
        let trigger = counts
            .iter()
            .take(steps.saturating_sub(1))
            .position(|&c| c as usize >= self.trigger_count)?;
        let effective = trigger + self.delay;
        (effective <= steps).then_some(effective)
    }

    /// Counts crossings, then zeroes `prices` from the redemption step onward.
    ///
    /// Returns the index of the first zeroed entry.
    pub fn apply(&self, prices: &mut [f64], counts: &mut [u32]) -> Option<usize> {
        self.barrier_counts(prices, counts);
        let redeemed_at = self.redemption_step(counts)?;
        prices[redeemed_at..].fill(0.0);
        Some(redeemed_at)
    }
}
