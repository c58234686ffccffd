//! Instrument definition for deSPAC warrants.
//!
//! Module despac_warrant::instruments::despac_warrant contains the contract terms,
//! the mechanical redemption provision, and validation logic.
//!
//! A typical deSPAC warrant struck at 11.50 becomes redeemable by the issuer once
//! the common stock has closed at or above 18.00 on 20 of any 30 consecutive
//! trading days. The redemption notice period (modelled as a fixed 22 trading
//! days) gives holders a last chance to exercise before the warrant is
//! extinguished.

use serde::{Deserialize, Serialize};

use crate::core::{Instrument, PricingError};

/// Standard deSPAC warrant strike.
pub const DEFAULT_STRIKE: f64 = 11.5;
/// Standard redemption barrier on the common stock price.
pub const DEFAULT_BARRIER: f64 = 18.0;
/// Trailing window, in trading days, over which barrier closes are counted.
pub const DEFAULT_WINDOW: usize = 30;
/// Number of barrier closes inside the window that triggers redemption.
pub const DEFAULT_TRIGGER_COUNT: usize = 20;
/// Trading days between the trigger and the redemption becoming effective.
pub const DEFAULT_REDEMPTION_DELAY: usize = 22;

/// Issuer redemption provision.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RedemptionTerms {
    /// Stock price at or above which a close counts as a barrier crossing.
    pub barrier: f64,
    /// Length of the trailing observation window, in steps.
    pub window: usize,
    /// Crossing count inside the window that triggers redemption.
    pub trigger_count: usize,
    /// Delay, in steps, from trigger to the warrant being extinguished.
    pub delay: usize,
}

impl Default for RedemptionTerms {
    fn default() -> Self {
        Self {
            barrier: DEFAULT_BARRIER,
            window: DEFAULT_WINDOW,
            trigger_count: DEFAULT_TRIGGER_COUNT,
            delay: DEFAULT_REDEMPTION_DELAY,
        }
    }
}

impl RedemptionTerms {
    /// Validates the provision.
    pub fn validate(&self) -> Result<(), PricingError> {
        if !self.barrier.is_finite() || self.barrier <= 0.0 {
            return Err(PricingError::InvalidInput(
                "redemption barrier must be finite and > 0".to_string(),
            ));
        }
        if self.window == 0 {
            return Err(PricingError::InvalidInput(
                "redemption window must be > 0".to_string(),
            ));
        }
        if self.trigger_count == 0 {
            return Err(PricingError::InvalidInput(
                "redemption trigger_count must be > 0".to_string(),
            ));
        }
        if self.delay == 0 {
            return Err(PricingError::InvalidInput(
                "redemption delay must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// deSPAC warrant: a long-dated call on the post-merger common stock with a
/// mechanical issuer redemption feature.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DespacWarrant {
    /// Exercise price.
    pub strike: f64,
    /// Remaining time to expiry in years.
    pub expiry: f64,
    /// Remaining trading days during which the warrant can be neither
    /// exercised nor redeemed.
    pub lockout_days: usize,
    /// Redemption provision.
    pub redemption: RedemptionTerms,
}

impl Default for DespacWarrant {
    fn default() -> Self {
        Self::standard(1.0)
    }
}

impl DespacWarrant {
    /// Warrant with market-standard terms and the given expiry.
    pub fn standard(expiry: f64) -> Self {
        Self {
            strike: DEFAULT_STRIKE,
            expiry,
            lockout_days: 0,
            redemption: RedemptionTerms::default(),
        }
    }

    /// Starts a warrant builder.
    pub fn builder() -> DespacWarrantBuilder {
        DespacWarrantBuilder::default()
    }

    /// Validates instrument fields.
    pub fn validate(&self) -> Result<(), PricingError> {
        if !self.strike.is_finite() || self.strike <= 0.0 {
            return Err(PricingError::InvalidInput(
                "warrant strike must be finite and > 0".to_string(),
            ));
        }
        if !self.expiry.is_finite() || self.expiry <= 0.0 {
            return Err(PricingError::InvalidInput(format!(
                "warrant expiry must be finite and > 0, got {}",
                self.expiry
            )));
        }
        self.redemption.validate()
    }
}

impl Instrument for DespacWarrant {
    fn instrument_type(&self) -> &str {
        "DespacWarrant"
    }
}

/// Builder for [`DespacWarrant`].
#[derive(Debug, Clone, Default)]
pub struct DespacWarrantBuilder {
    strike: Option<f64>,
    expiry: Option<f64>,
    lockout_days: Option<usize>,
    redemption: Option<RedemptionTerms>,
}

impl DespacWarrantBuilder {
    /// Sets strike.
    pub fn strike(mut self, strike: f64) -> Self {
        self.strike = Some(strike);
        self
    }

    /// Sets expiry in years.
    pub fn expiry(mut self, expiry: f64) -> Self {
        self.expiry = Some(expiry);
        self
    }

    /// Sets the remaining lockout in trading days.
    pub fn lockout_days(mut self, lockout_days: usize) -> Self {
        self.lockout_days = Some(lockout_days);
        self
    }

    /// Sets the redemption provision.
    pub fn redemption(mut self, redemption: RedemptionTerms) -> Self {
        self.redemption = Some(redemption);
        self
    }

    /// Validates and builds a warrant. Unset terms take the standard values.
    pub fn build(self) -> Result<DespacWarrant, PricingError> {
        let expiry = self
            .expiry
            .ok_or_else(|| PricingError::InvalidInput("warrant expiry is required".to_string()))?;

        let warrant = DespacWarrant {
            strike: self.strike.unwrap_or(DEFAULT_STRIKE),
            expiry,
            lockout_days: self.lockout_days.unwrap_or(0),
            redemption: self.redemption.unwrap_or_default(),
        };
        warrant.validate()?;
        Ok(warrant)
    }
}
