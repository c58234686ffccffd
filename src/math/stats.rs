//! Streaming sample statistics for Monte Carlo estimators.

/// Welford accumulator for mean and dispersion.
///
/// Identical observations leave `m2` at exactly zero, so a degenerate
/// estimator (zero volatility) reports a standard error of exactly `0.0`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RunningStats {
    count: usize,
    mean: f64,
    m2: f64,
}

impl RunningStats {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn push(&mut self, value: f64) {
        self.count += 1;
        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (value - self.mean);
    }

    pub fn count(&self) -> usize {
        self.count
    }

    /// Sample mean; `0.0` when empty.
    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Dispersion normalised by `n` (NumPy's default `ddof = 0`).
    pub fn variance(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.m2 / self.count as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    /// `std_dev / sqrt(n)`.
    pub fn standard_error(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.std_dev() / (self.count as f64).sqrt()
        }
    }
}

impl FromIterator<f64> for RunningStats {
    fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> Self {
        let mut stats = Self::new();
        for v in iter {
            stats.push(v);
        }
        stats
    }
}

/// Mean and standard error of `values`, folded in slice order.
pub fn mean_and_stderr(values: &[f64]) -> (f64, f64) {
    let stats: RunningStats = values.iter().copied().collect();
    (stats.mean(), stats.standard_error())
}
