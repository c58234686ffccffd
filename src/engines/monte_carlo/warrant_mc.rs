//! Module `engines::monte_carlo::warrant_mc`.
//!
//! Monte Carlo valuation of deSPAC warrants.
//!
//! Pipeline per path: antithetic GBM simulation, rolling barrier count with
//! forced redemption, backward exercise allocation, discounting. The price is
//! the mean of the per-path present values and the standard error is their
//! standard deviation over `sqrt(N)`.
//!
//! Every antithetic pair draws from its own sub-stream of the configured seed,
//! so serial and `parallel` builds produce bit-identical results and the
//! full-matrix [`WarrantMcEngine::trace`] agrees exactly with the streaming
//! [`PricingEngine::price`] path. [`FastRngKind::NumpyLegacy`] is the
//! exception: one MT19937 stream fills the draws row by row, as NumPy's
//! `normal(size=(N/2, steps))` does, so its pairs always run in order.
//!
//! References: Carrion, Imerman and Zhang (2024) for the warrant terms;
//! Glasserman (2004) for antithetic variates; Hull (11th ed.) Eq. (21.16) for
//! the GBM step.

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::core::{DiagKey, Diagnostics, PricingEngine, PricingError, PricingResult};
use crate::engines::monte_carlo::discount::Discounter;
use crate::engines::monte_carlo::exercise::ExerciseEngine;
use crate::engines::monte_carlo::redemption::RedemptionTracker;
use crate::instruments::DespacWarrant;
use crate::market::Market;
use crate::math::fast_rng::{FastRng, FastRngKind, stream_seed};
use crate::math::stats::RunningStats;
use crate::mc::{PathMatrix, PathSimulator};

/// Default number of simulated paths (50,000 base + 50,000 antithetic).
pub const DEFAULT_NUM_PATHS: usize = 100_000;
/// Default time steps per year (daily trading steps).
pub const DEFAULT_STEPS_PER_YEAR: usize = 252;
/// Default RNG seed.
pub const DEFAULT_SEED: u64 = 1234;
/// Most time steps a single path may take.
pub const MAX_STEPS: usize = 1 << 24;

/// Simulation settings for [`WarrantMcEngine`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WarrantMcConfig {
    /// Total number of paths; must be even.
    pub num_paths: usize,
    /// Time steps per year; `dt = 1 / steps_per_year`.
    pub steps_per_year: usize,
    /// RNG seed.
    ///
    /// Pair `i` draws from the sub-stream seeded with `seed + 7919 * i`, so
    /// seeds that differ by a multiple `k * 7919` share pair streams, shifted
    /// by `k` pairs. `NumpyLegacy` takes the seed as-is and accepts only
    /// values below `2^32`.
    pub seed: u64,
    /// Generator family.
    pub rng_kind: FastRngKind,
}

impl Default for WarrantMcConfig {
    fn default() -> Self {
        Self {
            num_paths: DEFAULT_NUM_PATHS,
            steps_per_year: DEFAULT_STEPS_PER_YEAR,
            seed: DEFAULT_SEED,
            rng_kind: FastRngKind::default(),
        }
    }
}

impl WarrantMcConfig {
    pub fn validate(&self) -> Result<(), PricingError> {
        if self.num_paths == 0 || self.num_paths % 2 != 0 {
            return Err(PricingError::InvalidInput(format!(
                "num_paths must be a positive even number for antithetic sampling, got {}",
                self.num_paths
            )));
        }
        if self.steps_per_year == 0 {
            return Err(PricingError::InvalidInput(
                "steps_per_year must be > 0".to_string(),
            ));
        }
        if self.rng_kind == FastRngKind::NumpyLegacy && u32::try_from(self.seed).is_err() {
            return Err(PricingError::InvalidInput(format!(
                "numpy_legacy seeds must be below 2^32, got {}",
                self.seed
            )));
        }
        Ok(())
    }
}

/// Monte Carlo engine for [`DespacWarrant`].
#[derive(Debug, Clone, Default)]
pub struct WarrantMcEngine {
    pub config: WarrantMcConfig,
}

impl WarrantMcEngine {
    pub fn new(config: WarrantMcConfig) -> Self {
        Self { config }
    }

    pub fn with_num_paths(mut self, num_paths: usize) -> Self {
        self.config.num_paths = num_paths;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.config.seed = seed;
        self
    }

    pub fn with_steps_per_year(mut self, steps_per_year: usize) -> Self {
        self.config.steps_per_year = steps_per_year;
        self
    }

    pub fn with_rng_kind(mut self, rng_kind: FastRngKind) -> Self {
        self.config.rng_kind = rng_kind;
        self
    }

    /// Validates all inputs and derives the per-run kernels.
    fn prepare(&self, warrant: &DespacWarrant, market: &Market) -> Result<Valuation, PricingError> {
        self.config.validate()?;
        warrant.validate()?;
        market.validate()?;

        let dt = 1.0 / self.config.steps_per_year as f64;
        let steps_f = (warrant.expiry / dt).round();
        if !steps_f.is_finite() || steps_f > MAX_STEPS as f64 {
            return Err(PricingError::InvalidInput(format!(
                "expiry {} needs {steps_f} time steps, more than the {MAX_STEPS} allowed",
                warrant.expiry
            )));
        }
        let steps = steps_f as usize;
        if steps == 0 {
            return Err(PricingError::InvalidInput(format!(
                "expiry {} is shorter than half a time step",
                warrant.expiry
            )));
        }
        let cols = steps.checked_add(1).ok_or_else(|| {
            PricingError::InvalidInput(format!("{steps} time steps overflow a path row"))
        })?;
        PathSimulator::checked_cells(self.config.num_paths, cols)?;

        Ok(Valuation {
            simulator: PathSimulator::new(market.spot, market.rate, market.vol, dt, steps),
            tracker: RedemptionTracker::new(&warrant.redemption, warrant.lockout_days),
            exercise: ExerciseEngine::new(warrant.strike, warrant.lockout_days),
            discounter: Discounter::per_step(market.rate, dt),
            rng_kind: self.config.rng_kind,
            seed: self.config.seed,
        })
    }

    /// Runs the full pipeline keeping every intermediate matrix.
    ///
    /// Memory grows as `num_paths * steps`; intended for inspection and
    /// testing with modest path counts. The embedded result is bit-identical
    /// to [`PricingEngine::price`] under the same configuration.
    pub fn trace(&self, warrant: &DespacWarrant, market: &Market) -> Result<SimulationTrace, PricingError> {
        let valuation = self.prepare(warrant, market)?;
        let num_paths = self.config.num_paths;
        let cols = valuation.simulator.path_len();

        let (mut prices, draws) =
            valuation
                .simulator
                .simulate(num_paths, valuation.rng_kind, valuation.seed)?;
        let mut barrier_counts = PathMatrix::<u32>::new(num_paths, cols);
        let mut cash_flows = PathMatrix::<f64>::new(num_paths, cols);
        let mut stop_rule = PathMatrix::<u8>::new(num_paths, cols);
        let mut redeemed_at = vec![None; num_paths];
        let mut exercised_at = vec![None; num_paths];

        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;
            prices
                .par_rows_mut()
                .zip(barrier_counts.par_rows_mut())
                .zip(cash_flows.par_rows_mut())
                .zip(stop_rule.par_rows_mut())
                .zip(redeemed_at.par_iter_mut())
                .zip(exercised_at.par_iter_mut())
                .for_each(|(((((s, b), w), sr), red), ex)| {
                    (*red, *ex) = valuation.settle(s, b, w, sr);
                });
        }
        #[cfg(not(feature = "parallel"))]
        {
            prices
                .iter_rows_mut()
                .zip(barrier_counts.iter_rows_mut())
                .zip(cash_flows.iter_rows_mut())
                .zip(stop_rule.iter_rows_mut())
                .zip(redeemed_at.iter_mut())
                .zip(exercised_at.iter_mut())
                .for_each(|(((((s, b), w), sr), red), ex)| {
                    (*red, *ex) = valuation.settle(s, b, w, sr);
                });
        }

        let present_values: Vec<f64> = cash_flows
            .iter_rows()
            .map(|row| valuation.discounter.present_value(&row[1..]))
            .collect();
        let stats = checked_stats(present_values.iter().copied())?;
        let outcome = RunSummary {
            stats,
            redeemed_paths: redeemed_at.iter().flatten().count(),
            early_exercises: exercised_at
                .iter()
                .flatten()
                .filter(|&&t| t < valuation.simulator.steps)
                .count(),
        };
        let result = self.build_result(&valuation, market, &outcome);

        Ok(SimulationTrace {
            prices,
            draws,
            barrier_counts,
            cash_flows,
            stop_rule,
            redeemed_at,
            exercised_at,
            present_values,
            result,
        })
    }

    /// Prices the same warrant terms over many `(spot, expiry, vol)` points.
    ///
    /// `template` supplies strike, lockout and redemption terms; its expiry is
    /// replaced by each point's.
    pub fn price_grid(
        &self,
        template: &DespacWarrant,
        rate: f64,
        points: &[GridPoint],
    ) -> Result<Vec<GridValuation>, PricingError> {
        let price_point = |point: &GridPoint| -> Result<GridValuation, PricingError> {
            let warrant = DespacWarrant {
                expiry: point.expiry,
                ..*template
            };
            let market = Market {
                spot: point.spot,
                rate,
                vol: point.vol,
            };
            let result = self.price(&warrant, &market)?;
            Ok(GridValuation {
                point: *point,
                price: result.price,
                stderr: result.stderr.unwrap_or(0.0),
            })
        };

        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;
            points.par_iter().map(price_point).collect()
        }
        #[cfg(not(feature = "parallel"))]
        {
            points.iter().map(price_point).collect()
        }
    }

    fn build_result(&self, valuation: &Valuation, market: &Market, summary: &RunSummary) -> PricingResult {
        let mut diagnostics = Diagnostics::new();
        diagnostics.insert_key(DiagKey::NumPaths, self.config.num_paths as f64);
        diagnostics.insert_key(DiagKey::NumSteps, valuation.simulator.steps as f64);
        diagnostics.insert_key(DiagKey::Vol, market.vol);
        diagnostics.insert_key(DiagKey::DiscountFactor, valuation.discounter.factor);
        diagnostics.insert_key(DiagKey::RedeemedPaths, summary.redeemed_paths as f64);
        diagnostics.insert_key(DiagKey::EarlyExercises, summary.early_exercises as f64);

        PricingResult {
            price: summary.stats.mean(),
            stderr: Some(summary.stats.standard_error()),
            diagnostics,
        }
    }
}

impl PricingEngine<DespacWarrant> for WarrantMcEngine {
    #[instrument(level = "debug", skip(self), fields(num_paths = self.config.num_paths, seed = self.config.seed))]
    fn price(&self, instrument: &DespacWarrant, market: &Market) -> Result<PricingResult, PricingError> {
        let valuation = self.prepare(instrument, market)?;
        let half = self.config.num_paths / 2;
        debug!(
            steps = valuation.simulator.steps,
            drift = valuation.simulator.drift,
            vol_step = valuation.simulator.vol_step,
            discount_factor = valuation.discounter.factor,
            "starting warrant simulation"
        );

        let pairs: Vec<PairOutcome> = if valuation.rng_kind.is_single_stream() {
            let mut rng = FastRng::from_seed(valuation.rng_kind, valuation.seed);
            let mut scratch = PathScratch::new(valuation.simulator.steps);
            (0..half)
                .map(|_| valuation.run_pair_from(&mut rng, &mut scratch))
                .collect::<Result<_, _>>()?
        } else {
            valuation.run_substreams(half)?
        };

        // Base paths first, then their antithetic partners.
        let ordered = pairs
            .iter()
            .map(|p| p.paths[0])
            .chain(pairs.iter().map(|p| p.paths[1]));
        let stats = checked_stats(ordered.clone().map(|p| p.present_value))?;
        let summary = RunSummary {
            stats,
            redeemed_paths: ordered.clone().filter(|p| p.redeemed).count(),
            early_exercises: ordered.filter(|p| p.early_exercise).count(),
        };

        debug!(
            paths = summary.stats.count(),
            price = summary.stats.mean(),
            stderr = summary.stats.standard_error(),
            redeemed_paths = summary.redeemed_paths,
            early_exercises = summary.early_exercises,
            "warrant simulation complete"
        );
        Ok(self.build_result(&valuation, market, &summary))
    }
}

/// Values a standard deSPAC warrant (strike 11.50, no lockout, 18.00 barrier
/// on 20 of 30 days, 22-day notice) at a 5% risk-free rate with the default
/// engine settings.
///
/// Returns `(price, standard_error)`.
///
/// # Examples
/// ```no_run
/// let (price, stderr) = despac_warrant::price_warrant(14.0, 2.0, 0.3).unwrap();
/// assert!(price > 0.0 && stderr > 0.0);
/// ```
pub fn price_warrant(spot: f64, expiry: f64, vol: f64) -> Result<(f64, f64), PricingError> {
    let warrant = DespacWarrant::builder().expiry(expiry).build()?;
    let market = Market::builder().spot(spot).flat_vol(vol).build()?;
    let result = WarrantMcEngine::default().price(&warrant, &market)?;
    Ok((result.price, result.stderr.unwrap_or(0.0)))
}

/// One `(spot, expiry, vol)` scenario for [`WarrantMcEngine::price_grid`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridPoint {
    pub spot: f64,
    pub expiry: f64,
    pub vol: f64,
}

/// Price and standard error at one [`GridPoint`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridValuation {
    #[serde(flatten)]
    pub point: GridPoint,
    pub price: f64,
    pub stderr: f64,
}

/// Every intermediate matrix of one valuation run.
///
/// Rows `0..N/2` are base paths and rows `N/2..N` their antithetic partners.
#[derive(Debug, Clone)]
pub struct SimulationTrace {
    /// Underlying prices after redemption zeroing.
    pub prices: PathMatrix<f64>,
    /// Base standard normal draws, `(N/2) x steps`.
    pub draws: PathMatrix<f64>,
    /// Rolling barrier-crossing counts.
    pub barrier_counts: PathMatrix<u32>,
    /// Warrant cash flows.
    pub cash_flows: PathMatrix<f64>,
    /// 1 where the warrant is exercised, else 0.
    pub stop_rule: PathMatrix<u8>,
    /// First zeroed step per path.
    pub redeemed_at: Vec<Option<usize>>,
    /// Exercise step per path.
    pub exercised_at: Vec<Option<usize>>,
    /// Present value per path.
    pub present_values: Vec<f64>,
    pub result: PricingResult,
}

/// Kernels and constants for one validated run.
#[derive(Debug, Clone, Copy)]
struct Valuation {
    simulator: PathSimulator,
    tracker: RedemptionTracker,
    exercise: ExerciseEngine,
    discounter: Discounter,
    rng_kind: FastRngKind,
    seed: u64,
}

impl Valuation {
    /// Redemption then exercise for one path row; returns the first zeroed
    /// step and the exercise step.
    #[inline]
    fn settle(
        &self,
        prices: &mut [f64],
        counts: &mut [u32],
        cash_flows: &mut [f64],
        stop_rule: &mut [u8],
    ) -> (Option<usize>, Option<usize>) {
        let redeemed_at = self.tracker.apply(prices, counts);
        let exercised_at = self.exercise.allocate(prices, cash_flows, stop_rule);
        (redeemed_at, exercised_at)
    }

    /// Pairs `0..half`, each on its own sub-stream.
    fn run_substreams(&self, half: usize) -> Result<Vec<PairOutcome>, PricingError> {
        let run_pair = |pair: usize, scratch: &mut PathScratch| {
            let mut rng = FastRng::from_seed(self.rng_kind, stream_seed(self.seed, pair));
            self.run_pair_from(&mut rng, scratch)
        };

        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;
            (0..half)
                .into_par_iter()
                .map_init(|| PathScratch::new(self.simulator.steps), |scratch, pair| {
                    run_pair(pair, scratch)
                })
                .collect()
        }
        #[cfg(not(feature = "parallel"))]
        {
            let mut scratch = PathScratch::new(self.simulator.steps);
            (0..half).map(|pair| run_pair(pair, &mut scratch)).collect()
        }
    }

    /// Simulates and settles the next antithetic pair drawn from `rng`.
    fn run_pair_from(&self, rng: &mut FastRng, scratch: &mut PathScratch) -> Result<PairOutcome, PricingError> {
        let PathScratch {
            draws,
            prices,
            counts,
            cash_flows,
            stop_rule,
        } = scratch;
        let [base, antithetic] = prices;
        self.simulator.simulate_pair_from(rng, draws, base, antithetic)?;

        let steps = self.simulator.steps;
        let mut path_outcome = |row: &mut [f64]| {
            let (redeemed_at, exercised_at) = self.settle(row, counts, cash_flows, stop_rule);
            PathOutcome {
                present_value: self.discounter.present_value(&cash_flows[1..]),
                redeemed: redeemed_at.is_some(),
                early_exercise: exercised_at.is_some_and(|t| t < steps),
            }
        };

        let first = path_outcome(base.as_mut_slice());
        let second = path_outcome(antithetic.as_mut_slice());
        Ok(PairOutcome {
            paths: [first, second],
        })
    }
}

/// Per-worker buffers reused across pairs.
struct PathScratch {
    draws: Vec<f64>,
    prices: [Vec<f64>; 2],
    counts: Vec<u32>,
    cash_flows: Vec<f64>,
    stop_rule: Vec<u8>,
}

impl PathScratch {
    fn new(steps: usize) -> Self {
        Self {
            draws: vec![0.0; steps],
            prices: [vec![0.0; steps + 1], vec![0.0; steps + 1]],
            counts: vec![0; steps + 1],
            cash_flows: vec![0.0; steps + 1],
            stop_rule: vec![0; steps + 1],
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct PathOutcome {
    present_value: f64,
    redeemed: bool,
    early_exercise: bool,
}

#[derive(Debug, Clone, Copy)]
struct PairOutcome {
    paths: [PathOutcome; 2],
}

struct RunSummary {
    stats: RunningStats,
    redeemed_paths: usize,
    early_exercises: usize,
}

fn checked_stats(values: impl Iterator<Item = f64>) -> Result<RunningStats, PricingError> {
    let mut stats = RunningStats::new();
    for v in values {
        if !v.is_finite() {
            return Err(PricingError::NumericalError(format!(
                "non-finite path present value {v}"
            )));
        }
        stats.push(v);
    }
    Ok(stats)
}
