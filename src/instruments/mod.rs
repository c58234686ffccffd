//! Instrument definitions.

pub mod despac_warrant;

pub use despac_warrant::{DespacWarrant, DespacWarrantBuilder, RedemptionTerms};
