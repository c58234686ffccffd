//! JSON payloads for valuation runs.
//!
//! A [`ValuationConfig`] bundles engine settings, warrant terms and the
//! risk-free rate so a run can be persisted and replayed. Every field has a
//! default, so partial documents are accepted.
//!
//! # Examples
//! ```rust
//! use despac_warrant::core::{ValuationConfig, from_json, to_json_pretty};
//!
//! let cfg: ValuationConfig = from_json(r#"{ "engine": { "num_paths": 2000 } }"#).unwrap();
//! assert_eq!(cfg.engine.num_paths, 2000);
//! assert_eq!(cfg.engine.seed, 1234);
//! assert_eq!(cfg.warrant.strike, 11.5);
//! assert_eq!(cfg.rate, 0.05);
//!
//! let json = to_json_pretty(&cfg).unwrap();
//! let decoded: ValuationConfig = from_json(&json).unwrap();
//! assert_eq!(decoded, cfg);
//! ```

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::core::PricingError;
use crate::engines::monte_carlo::WarrantMcConfig;
use crate::instruments::DespacWarrant;
use crate::market::{DEFAULT_RISK_FREE_RATE, Market};

/// Persistable description of a valuation run, minus the scenario inputs
/// (spot, expiry, vol) that vary per call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValuationConfig {
    pub engine: WarrantMcConfig,
    /// Warrant terms; `expiry` is overridden by the scenario.
    pub warrant: DespacWarrant,
    pub rate: f64,
}

impl Default for ValuationConfig {
    fn default() -> Self {
        Self {
            engine: WarrantMcConfig::default(),
            warrant: DespacWarrant::default(),
            rate: DEFAULT_RISK_FREE_RATE,
        }
    }
}

impl ValuationConfig {
    /// Warrant with the configured terms and the given expiry.
    pub fn warrant_for(&self, expiry: f64) -> DespacWarrant {
        DespacWarrant {
            expiry,
            ..self.warrant
        }
    }

    /// Market at the configured rate.
    pub fn market_for(&self, spot: f64, vol: f64) -> Market {
        Market {
            spot,
            rate: self.rate,
            vol,
        }
    }
}

/// Serialize a value to pretty-printed JSON.
pub fn to_json_pretty<T: Serialize>(value: &T) -> Result<String, PricingError> {
    serde_json::to_string_pretty(value).map_err(|e| PricingError::Serialization(e.to_string()))
}

/// Deserialize a value from JSON.
pub fn from_json<T: DeserializeOwned>(payload: &str) -> Result<T, PricingError> {
    serde_json::from_str(payload).map_err(|e| PricingError::Serialization(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::FastRngKind;

    #[test]
    fn empty_document_gives_defaults() {
        let cfg: ValuationConfig = from_json("{}").unwrap();
        assert_eq!(cfg, ValuationConfig::default());
    }

    #[test]
    fn nested_partial_overrides() {
        let cfg: ValuationConfig = from_json(
            r#"{
                "engine": { "seed": 7, "rng_kind": "pcg64" },
                "warrant": { "lockout_days": 5, "redemption": { "barrier": 20.0 } },
                "rate": 0.03
            }"#,
        )
        .unwrap();
        assert_eq!(cfg.engine.seed, 7);
        assert_eq!(cfg.engine.rng_kind, FastRngKind::Pcg64);
        assert_eq!(cfg.engine.num_paths, 100_000);
        assert_eq!(cfg.warrant.lockout_days, 5);
        assert_eq!(cfg.warrant.redemption.barrier, 20.0);
        assert_eq!(cfg.warrant.redemption.window, 30);
        assert_eq!(cfg.rate, 0.03);
    }

    #[test]
    fn malformed_payload_is_a_serialization_error() {
        let err = from_json::<ValuationConfig>("{ \"rate\": \"high\" }").unwrap_err();
        assert!(matches!(err, PricingError::Serialization(_)));
    }

    #[test]
    fn scenario_helpers_keep_configured_terms() {
        let cfg = ValuationConfig {
            rate: 0.02,
            ..ValuationConfig::default()
        };
        let warrant = cfg.warrant_for(3.0);
        assert_eq!(warrant.expiry, 3.0);
        assert_eq!(warrant.strike, 11.5);
        let market = cfg.market_for(15.0, 0.4);
        assert_eq!(market.rate, 0.02);
        assert_eq!(market.spot, 15.0);
    }
}
