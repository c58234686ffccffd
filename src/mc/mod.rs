//! Path storage and simulation.

pub mod matrix;
pub mod paths;

pub use matrix::PathMatrix;
pub use paths::PathSimulator;
