//! Numerical building blocks: random streams, normal inversion and estimator statistics.

pub mod fast_norm;
pub mod fast_rng;
pub mod stats;

pub use fast_norm::acklam_inv_cdf;
pub use fast_rng::{FastRng, FastRngKind, sample_standard_normal, stream_seed};
pub use stats::{RunningStats, mean_and_stderr};
