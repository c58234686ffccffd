//! Core traits, common domain types, and library-wide result/error structures.

use crate::market::Market;

pub mod serialization;
pub mod types;

pub use serialization::{ValuationConfig, from_json, to_json_pretty};
pub use types::*;

/// Common trait implemented by every priceable instrument.
pub trait Instrument: std::fmt::Debug {
    /// Returns a short type identifier for diagnostics and logging.
    fn instrument_type(&self) -> &str;
}

/// Pricing engine abstraction over an instrument type.
pub trait PricingEngine<I: Instrument> {
    /// Prices an instrument under the provided market state.
    fn price(&self, instrument: &I, market: &Market) -> Result<PricingResult, PricingError>;
}
