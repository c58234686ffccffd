//! Monte Carlo valuation of deSPAC warrants.
//!
//! A deSPAC warrant is a long-dated call on the post-merger stock of a former
//! special purpose acquisition company. The issuer may force redemption once
//! the stock has closed at or above a barrier (18.00) on 20 of the last 30
//! trading days; holders then have a notice period (22 trading days) to
//! exercise before the warrant is extinguished.
//!
//! The valuation simulates antithetic GBM paths, tracks the rolling barrier
//! count, zeroes each path from its effective redemption date, allocates at
//! most one exercise per path by backward induction and discounts the
//! resulting cash flows. The price is the path mean; the standard error is
//! the population standard deviation over `sqrt(N)`.
//!
//! References:
//! - Carrion, Imerman and Zhang (2024), valuation of SPAC warrants.
//! - Glasserman (2004) for antithetic variates and Monte Carlo estimators.
//! - Hull, *Options, Futures, and Other Derivatives* (11th ed.), Ch. 21.
//!
//! # Feature Flags
//! - `parallel`: simulates antithetic pairs and grid points on the Rayon pool.
//!   Each pair has its own RNG sub-stream, so results are bit-identical to a
//!   serial run.
//!
//! # Quick Start
//! ```no_run
//! let (price, stderr) = despac_warrant::price_warrant(14.0, 2.0, 0.3).unwrap();
//! println!("{price:.4} +/- {stderr:.4}");
//! ```
//!
//! Custom terms and engine settings:
//! ```rust
//! use ::despac_warrant::prelude::*;
//!
//! let warrant = DespacWarrant::builder()
//!     .expiry(1.0)
//!     .lockout_days(10)
//!     .build()
//!     .unwrap();
//! let market = Market::builder().spot(15.0).flat_vol(0.4).build().unwrap();
//! let engine = WarrantMcEngine::default().with_num_paths(2_000).with_seed(7);
//!
//! let result = engine.price(&warrant, &market).unwrap();
//! assert!(result.price > 0.0);
//! assert_eq!(result.diagnostics.get("num_steps"), Some(252.0));
//! ```

pub mod core;
pub mod engines;
pub mod instruments;
pub mod market;
pub mod math;
pub mod mc;

pub use engines::monte_carlo::price_warrant;

/// Common imports for ergonomic usage.
pub mod prelude {
    pub use crate::core::*;
    pub use crate::engines::monte_carlo::*;
    pub use crate::instruments::*;
    pub use crate::market::*;
}
