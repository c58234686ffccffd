//! Module `mc::paths`.
//!
//! Antithetic geometric Brownian motion paths for the underlying stock.
//!
//! Paths come in pairs: pair `i` draws `steps` standard normals from its own
//! sub-stream of the run seed, path `i` is driven by the draws and path
//! `i + N/2` by their exact negation. Single-stream generators
//! ([`FastRngKind::is_single_stream`]) instead fill the `(N/2) x steps` draw
//! matrix row by row from one generator, so pairs must be simulated in order. The log-Euler update
//! `S(t) = S(t-1) * exp(drift + vol_step * z(t))` is exact for GBM, so the
//! discretisation adds no bias at the observation dates.
//!
//! Zero is reserved as the "redeemed" sentinel downstream, so a path that
//! underflows to zero (or overflows, or produces NaN) is reported as a
//! numerical error instead of being passed on.

use crate::core::PricingError;
use crate::math::fast_rng::{FastRng, FastRngKind, sample_standard_normal, stream_seed};
use crate::mc::matrix::PathMatrix;

/// Largest path matrix (in `f64` cells) a run may allocate.
pub const MAX_MATRIX_CELLS: usize = u32::MAX as usize;

/// Per-step GBM parameters for one valuation run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathSimulator {
    /// Initial stock price.
    pub s0: f64,
    /// Per-step log drift `(r - vol^2 / 2) * dt`.
    pub drift: f64,
    /// Per-step log volatility `vol * sqrt(dt)`.
    pub vol_step: f64,
    /// Number of time steps after `t = 0`.
    pub steps: usize,
}

impl PathSimulator {
    /// Risk-neutral simulator for rate `rate` and volatility `vol`.
    pub fn new(s0: f64, rate: f64, vol: f64, dt: f64, steps: usize) -> Self {
        Self {
            s0,
            drift: (rate - 0.5 * vol * vol) * dt,
            vol_step: vol * dt.sqrt(),
            steps,
        }
    }

    /// Length of one price row, `steps + 1`.
    #[inline]
    pub fn path_len(&self) -> usize {
        self.steps + 1
    }

    /// Fills `draws` (length `steps`) with standard normals from `rng`.
    #[inline]
    pub fn fill_draws(&self, rng: &mut FastRng, draws: &mut [f64]) {
        for z in draws.iter_mut() {
            *z = sample_standard_normal(rng);
        }
    }

    /// Evolves one path from `draws`, each shock multiplied by `sign`.
    ///
    /// `out` must hold `steps + 1` prices; `out[0]` is set to `s0`.
    pub fn evolve(&self, draws: &[f64], sign: f64, out: &mut [f64]) -> Result<(), PricingError> {
        debug_assert_eq!(out.len(), self.path_len());
        debug_assert_eq!(draws.len(), self.steps);

        let mut s = self.s0;
        out[0] = s;
        for (t, &z) in draws.iter().enumerate() {
            s *= (self.drift + self.vol_step * (sign * z)).exp();
            if !s.is_finite() || s <= 0.0 {
                return Err(PricingError::NumericalError(format!(
                    "simulated price {s} at step {} is not a positive finite number",
                    t + 1
                )));
            }
            out[t + 1] = s;
        }
        Ok(())
    }

    /// Simulates antithetic pair `pair` of a run seeded with `seed`.
    ///
    /// `draws` receives the base shocks; `base` and `antithetic` receive the
    /// two price rows. Only pair 0 of a single-stream kind has a standalone
    /// stream; later pairs depend on every draw before them.
    pub fn simulate_pair(
        &self,
        rng_kind: FastRngKind,
        seed: u64,
        pair: usize,
        draws: &mut [f64],
        base: &mut [f64],
        antithetic: &mut [f64],
    ) -> Result<(), PricingError> {
        if rng_kind.is_single_stream() && pair > 0 {
            return Err(PricingError::InvalidInput(format!(
                "{} draws one stream per run; pair {pair} cannot be simulated on its own",
                rng_kind.as_str()
            )));
        }
        let mut rng = FastRng::from_seed(rng_kind, stream_seed(seed, pair));
        self.simulate_pair_from(&mut rng, draws, base, antithetic)
    }

    /// Next antithetic pair drawn from `rng`.
    pub fn simulate_pair_from(
        &self,
        rng: &mut FastRng,
        draws: &mut [f64],
        base: &mut [f64],
        antithetic: &mut [f64],
    ) -> Result<(), PricingError> {
        self.fill_draws(rng, draws);
        self.evolve(draws, 1.0, base)?;
        self.evolve(draws, -1.0, antithetic)
    }

    /// `rows * cols` when a matrix of that shape can be allocated.
    pub fn checked_cells(rows: usize, cols: usize) -> Result<usize, PricingError> {
        rows.checked_mul(cols)
            .filter(|&cells| cells <= MAX_MATRIX_CELLS)
            .ok_or_else(|| {
                PricingError::InvalidInput(format!(
                    "a {rows} x {cols} path matrix exceeds the {MAX_MATRIX_CELLS}-cell limit"
                ))
            })
    }

    /// Full price matrix for `num_paths` paths together with the
    /// `(num_paths / 2) x steps` base draw matrix.
    ///
    /// Rows `0..N/2` hold the base paths and rows `N/2..N` their antithetic
    /// partners, in the same order.
    pub fn simulate(
        &self,
        num_paths: usize,
        rng_kind: FastRngKind,
        seed: u64,
    ) -> Result<(PathMatrix<f64>, PathMatrix<f64>), PricingError> {
        if num_paths == 0 || num_paths % 2 != 0 {
            return Err(PricingError::InvalidInput(format!(
                "num_paths must be a positive even number for antithetic sampling, got {num_paths}"
            )));
        }
        if self.steps == 0 {
            return Err(PricingError::InvalidInput(
                "path simulation needs at least one time step".to_string(),
            ));
        }

        let half = num_paths / 2;
        let cols = self.path_len();
        Self::checked_cells(num_paths, cols)?;
        let mut prices = PathMatrix::<f64>::new(num_paths, cols);
        let mut draws = PathMatrix::<f64>::new(half, self.steps);

        let (base_rows, anti_rows) = prices.as_mut_slice().split_at_mut(half * cols);
        let draw_rows = draws.as_mut_slice();

        if rng_kind.is_single_stream() {
            let mut rng = FastRng::from_seed(rng_kind, seed);
            base_rows
                .chunks_exact_mut(cols)
                .zip(anti_rows.chunks_exact_mut(cols))
                .zip(draw_rows.chunks_exact_mut(self.steps))
                .try_for_each(|((base, anti), z)| self.simulate_pair_from(&mut rng, z, base, anti))?;
            return Ok((prices, draws));
        }

        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;
            base_rows
                .par_chunks_exact_mut(cols)
                .zip(anti_rows.par_chunks_exact_mut(cols))
                .zip(draw_rows.par_chunks_exact_mut(self.steps))
                .enumerate()
                .try_for_each(|(pair, ((base, anti), z))| {
                    self.simulate_pair(rng_kind, seed, pair, z, base, anti)
                })?;
        }
        #[cfg(not(feature = "parallel"))]
        {
            base_rows
                .chunks_exact_mut(cols)
                .zip(anti_rows.chunks_exact_mut(cols))
                .zip(draw_rows.chunks_exact_mut(self.steps))
                .enumerate()
                .try_for_each(|(pair, ((base, anti), z))| {
                    self.simulate_pair(rng_kind, seed, pair, z, base, anti)
                })?;
        }

        Ok((prices, draws))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn simulator(vol: f64, steps: usize) -> PathSimulator {
        PathSimulator::new(14.0, 0.05, vol, 1.0 / 252.0, steps)
    }

    #[test]
    fn drift_and_vol_step_follow_log_euler() {
        let sim = simulator(0.3, 10);
        let dt: f64 = 1.0 / 252.0;
        assert_eq!(sim.drift, (0.05 - 0.5 * 0.09) * dt);
        assert_eq!(sim.vol_step, 0.3 * dt.sqrt());
    }

    #[test]
    fn antithetic_rows_use_negated_shocks() {
        let sim = simulator(0.3, 40);
        let (prices, draws) = sim.simulate(8, FastRngKind::Xoshiro256PlusPlus, 1234).unwrap();
        assert_eq!(prices.rows(), 8);
        assert_eq!(prices.cols(), 41);
        assert_eq!(draws.rows(), 4);

        for i in 0..4 {
            let base = prices.row(i);
            let anti = prices.row(i + 4);
            for t in 1..=40 {
                let z = draws.get(i, t - 1);
                let base_shock = (base[t] / base[t - 1]).ln() - sim.drift;
                let anti_shock = (anti[t] / anti[t - 1]).ln() - sim.drift;
                assert!((base_shock - sim.vol_step * z).abs() < 1e-12);
                assert!((base_shock + anti_shock).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn prices_start_at_spot_and_stay_positive() {
        let sim = simulator(0.8, 252);
        let (prices, _) = sim.simulate(20, FastRngKind::Pcg64, 99).unwrap();
        for row in prices.iter_rows() {
            assert_eq!(row[0], 14.0);
            assert!(row.iter().all(|&s| s > 0.0 && s.is_finite()));
        }
    }

    #[test]
    fn same_seed_gives_identical_matrices() {
        let sim = simulator(0.3, 60);
        let a = sim.simulate(10, FastRngKind::Xoshiro256PlusPlus, 1234).unwrap();
        let b = sim.simulate(10, FastRngKind::Xoshiro256PlusPlus, 1234).unwrap();
        assert_eq!(a, b);
        let c = sim.simulate(10, FastRngKind::Xoshiro256PlusPlus, 4321).unwrap();
        assert_ne!(a.0, c.0);
    }

    #[test]
    fn pair_rows_match_standalone_pair_simulation() {
        let sim = simulator(0.3, 30);
        let (prices, _) = sim.simulate(6, FastRngKind::Xoshiro256PlusPlus, 7).unwrap();
        let mut z = vec![0.0; 30];
        let mut base = vec![0.0; 31];
        let mut anti = vec![0.0; 31];
        sim.simulate_pair(FastRngKind::Xoshiro256PlusPlus, 7, 2, &mut z, &mut base, &mut anti)
            .unwrap();
        assert_eq!(prices.row(2), base.as_slice());
        assert_eq!(prices.row(5), anti.as_slice());
    }

    #[test]
    fn zero_vol_path_is_deterministic_growth() {
        let sim = simulator(0.0, 252);
        let (prices, _) = sim.simulate(4, FastRngKind::Xoshiro256PlusPlus, 1).unwrap();
        let dt = 1.0 / 252.0;
        for row in prices.iter_rows() {
            assert_eq!(row, prices.row(0));
            for (t, &s) in row.iter().enumerate() {
                let expected = 14.0 * (0.05 * dt * t as f64).exp();
                assert!((s - expected).abs() < 1e-9 * expected);
            }
        }
    }

    #[test]
    fn rejects_odd_path_count() {
        let sim = simulator(0.3, 10);
        let err = sim.simulate(7, FastRngKind::Xoshiro256PlusPlus, 1).unwrap_err();
        assert!(matches!(err, PricingError::InvalidInput(_)));
        assert!(sim.simulate(0, FastRngKind::Xoshiro256PlusPlus, 1).is_err());
    }

    #[test]
    fn overflow_is_reported_as_numerical_error() {
        let sim = PathSimulator {
            s0: 1.0,
            drift: 800.0,
            vol_step: 0.0,
            steps: 3,
        };
        let mut out = vec![0.0; 4];
        let err = sim.evolve(&[0.0, 0.0, 0.0], 1.0, &mut out).unwrap_err();
        assert!(matches!(err, PricingError::NumericalError(_)));
    }

    #[test]
    fn single_stream_fills_draw_rows_in_order() {
        let sim = simulator(0.3, 5);
        let (prices, draws) = sim.simulate(6, FastRngKind::NumpyLegacy, 1234).unwrap();

        let mut rng = FastRng::from_seed(FastRngKind::NumpyLegacy, 1234);
        for pair in 0..3 {
            for t in 0..5 {
                assert_eq!(draws.get(pair, t), sample_standard_normal(&mut rng));
            }
        }
        // np.random.seed(1234); np.random.normal()
        assert_eq!(draws.get(0, 0), 0.471_435_163_732_493_06);

        let mut z = vec![0.0; 5];
        let mut base = vec![0.0; 6];
        let mut anti = vec![0.0; 6];
        sim.simulate_pair(FastRngKind::NumpyLegacy, 1234, 0, &mut z, &mut base, &mut anti)
            .unwrap();
        assert_eq!(prices.row(0), base.as_slice());
        assert_eq!(prices.row(3), anti.as_slice());

        let err = sim
            .simulate_pair(FastRngKind::NumpyLegacy, 1234, 1, &mut z, &mut base, &mut anti)
            .unwrap_err();
        assert!(matches!(err, PricingError::InvalidInput(_)));
    }

    #[test]
    fn oversized_matrix_is_rejected_before_allocation() {
        let sim = simulator(0.3, 252);
        let err = sim
            .simulate(usize::MAX - 1, FastRngKind::Xoshiro256PlusPlus, 1)
            .unwrap_err();
        assert!(matches!(err, PricingError::InvalidInput(_)));
        assert!(PathSimulator::checked_cells(1 << 20, 1 << 20).is_err());
        assert_eq!(PathSimulator::checked_cells(10, 253).unwrap(), 2_530);
    }
}
