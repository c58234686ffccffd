//! Market data container for warrant valuation.

use serde::{Deserialize, Serialize};

use crate::core::PricingError;

/// Risk-free rate assumed for deSPAC warrant valuation when none is supplied.
pub const DEFAULT_RISK_FREE_RATE: f64 = 0.05;

/// Market snapshot used by the pricing engines.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Market {
    /// Spot price of the underlying common stock.
    pub spot: f64,
    /// Continuously compounded risk-free rate.
    pub rate: f64,
    /// Flat lognormal volatility.
    pub vol: f64,
}

impl Market {
    /// Starts a market builder.
    ///
    /// # Examples
    /// ```
    /// use despac_warrant::market::Market;
    ///
    /// let market = Market::builder()
    ///     .spot(14.0)
    ///     .flat_vol(0.30)
    ///     .build()
    ///     .unwrap();
    ///
    /// assert_eq!(market.spot(), 14.0);
    /// assert_eq!(market.rate(), 0.05);
    /// ```
    #[inline]
    pub fn builder() -> MarketBuilder {
        MarketBuilder::default()
    }

    /// Returns spot price.
    #[inline]
    pub fn spot(&self) -> f64 {
        self.spot
    }

    /// Returns risk-free rate.
    #[inline]
    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Returns the flat volatility.
    #[inline]
    pub fn vol(&self) -> f64 {
        self.vol
    }

    /// Checks the snapshot fields.
    ///
    /// # Errors
    /// Returns [`PricingError::InvalidInput`] for a non-positive spot, a negative
    /// volatility, or any non-finite field.
    pub fn validate(&self) -> Result<(), PricingError> {
        if !self.spot.is_finite() || self.spot <= 0.0 {
            return Err(PricingError::InvalidInput(format!(
                "market spot must be finite and > 0, got {}",
                self.spot
            )));
        }
        if !self.vol.is_finite() || self.vol < 0.0 {
            return Err(PricingError::InvalidInput(format!(
                "market vol must be finite and >= 0, got {}",
                self.vol
            )));
        }
        if !self.rate.is_finite() {
            return Err(PricingError::InvalidInput(
                "market rate must be finite".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for [`Market`].
#[derive(Debug, Clone, Default)]
pub struct MarketBuilder {
    spot: Option<f64>,
    rate: Option<f64>,
    flat_vol: Option<f64>,
}

impl MarketBuilder {
    /// Sets the spot price.
    #[inline]
    pub fn spot(mut self, spot: f64) -> Self {
        self.spot = Some(spot);
        self
    }

    /// Sets the flat risk-free rate.
    #[inline]
    pub fn rate(mut self, rate: f64) -> Self {
        self.rate = Some(rate);
        self
    }

    /// Sets a flat volatility.
    #[inline]
    pub fn flat_vol(mut self, vol: f64) -> Self {
        self.flat_vol = Some(vol);
        self
    }

    /// Validates and builds a [`Market`].
    ///
    /// The rate defaults to [`DEFAULT_RISK_FREE_RATE`].
    ///
    /// # Errors
    /// Returns [`PricingError::InvalidInput`] when spot or volatility is missing
    /// or fails [`Market::validate`].
    pub fn build(self) -> Result<Market, PricingError> {
        let spot = self
            .spot
            .ok_or_else(|| PricingError::InvalidInput("market spot is required".to_string()))?;
        let vol = self
            .flat_vol
            .ok_or_else(|| PricingError::InvalidInput("market flat_vol is required".to_string()))?;

        let market = Market {
            spot,
            rate: self.rate.unwrap_or(DEFAULT_RISK_FREE_RATE),
            vol,
        };
        market.validate()?;
        Ok(market)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults_rate() {
        let market = Market::builder().spot(20.0).flat_vol(0.0).build().unwrap();
        assert_eq!(market.rate(), DEFAULT_RISK_FREE_RATE);
        assert_eq!(market.vol(), 0.0);
    }

    #[test]
    fn builder_rejects_non_positive_spot() {
        let err = Market::builder().spot(0.0).flat_vol(0.2).build().unwrap_err();
        assert!(matches!(err, PricingError::InvalidInput(_)));
        assert!(Market::builder().spot(-1.0).flat_vol(0.2).build().is_err());
    }

    #[test]
    fn builder_rejects_negative_or_nan_vol() {
        assert!(Market::builder().spot(10.0).flat_vol(-0.1).build().is_err());
        assert!(Market::builder().spot(10.0).flat_vol(f64::NAN).build().is_err());
    }

    #[test]
    fn builder_requires_vol() {
        let err = Market::builder().spot(10.0).build().unwrap_err();
        assert_eq!(
            err,
            PricingError::InvalidInput("market flat_vol is required".to_string())
        );
    }
}
