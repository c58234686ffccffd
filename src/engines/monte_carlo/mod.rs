//! Monte Carlo pricing engines.

pub mod discount;
pub mod exercise;
pub mod redemption;
pub mod warrant_mc;

pub use discount::Discounter;
pub use exercise::ExerciseEngine;
pub use redemption::RedemptionTracker;
pub use warrant_mc::{
    GridPoint, GridValuation, SimulationTrace, WarrantMcConfig, WarrantMcEngine, price_warrant,
};
