//! Result payloads, diagnostics and the library error type.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use thiserror::Error;

/// Compact key set for engine diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagKey {
    DiscountFactor,
    EarlyExercises,
    NumPaths,
    NumSteps,
    RedeemedPaths,
    Vol,
}

impl DiagKey {
    #[inline]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::DiscountFactor => "discount_factor",
            Self::EarlyExercises => "early_exercises",
            Self::NumPaths => "num_paths",
            Self::NumSteps => "num_steps",
            Self::RedeemedPaths => "redeemed_paths",
            Self::Vol => "vol",
        }
    }
}

impl std::str::FromStr for DiagKey {
    type Err = ();

    fn from_str(key: &str) -> Result<Self, Self::Err> {
        match key {
            "discount_factor" => Ok(Self::DiscountFactor),
            "early_exercises" => Ok(Self::EarlyExercises),
            "num_paths" => Ok(Self::NumPaths),
            "num_steps" => Ok(Self::NumSteps),
            "redeemed_paths" => Ok(Self::RedeemedPaths),
            "vol" => Ok(Self::Vol),
            _ => Err(()),
        }
    }
}

/// Inline diagnostics storage used in [`PricingResult`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Diagnostics {
    entries: [Option<(DiagKey, f64)>; 8],
}

impl Diagnostics {
    pub const CAPACITY: usize = 8;

    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.iter().flatten().count()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries[0].is_none()
    }

    /// Inserts a value, replacing and returning any previous value for `key`.
    ///
    /// Returns `None` without storing anything once all slots are taken.
    #[inline]
    pub fn insert_key(&mut self, key: DiagKey, value: f64) -> Option<f64> {
        for (entry_key, existing) in self.entries.iter_mut().flatten() {
            if *entry_key == key {
                let prev = *existing;
                *existing = value;
                return Some(prev);
            }
        }

        if let Some(slot) = self.entries.iter_mut().find(|e| e.is_none()) {
            *slot = Some((key, value));
        }
        None
    }

    #[inline]
    fn iter_entries(&self) -> impl Iterator<Item = &(DiagKey, f64)> {
        self.entries.iter().filter_map(Option::as_ref)
    }

    #[inline]
    pub fn get_key(&self, key: DiagKey) -> Option<f64> {
        self.iter_entries()
            .find_map(|(entry_key, value)| (*entry_key == key).then_some(*value))
    }

    #[inline]
    pub fn get(&self, key: &str) -> Option<f64> {
        let key: DiagKey = key.parse().ok()?;
        self.get_key(key)
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, f64)> {
        self.iter_entries().map(|(k, v)| (k.as_str(), *v))
    }
}

impl Serialize for Diagnostics {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (key, value) in self.iter() {
            map.serialize_entry(key, &value)?;
        }
        map.end()
    }
}

/// Unified engine result payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PricingResult {
    /// Present value.
    pub price: f64,
    /// Monte Carlo standard error of `price`.
    pub stderr: Option<f64>,
    /// Engine-specific scalar diagnostics.
    pub diagnostics: Diagnostics,
}

/// Engine and model errors surfaced by the API.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PricingError {
    /// Input validation error, raised before any simulation work.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// Numerical issue (NaN, overflow) detected during simulation.
    #[error("numerical error: {0}")]
    NumericalError(String),
    /// Configuration payload could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnostics_replace_existing_key() {
        let mut diag = Diagnostics::new();
        assert!(diag.is_empty());
        assert_eq!(diag.insert_key(DiagKey::NumPaths, 10.0), None);
        assert_eq!(diag.insert_key(DiagKey::NumPaths, 20.0), Some(10.0));
        assert_eq!(diag.len(), 1);
        assert_eq!(diag.get("num_paths"), Some(20.0));
        assert_eq!(diag.get("vol"), None);
        assert_eq!(diag.get("not_a_key"), None);
    }

    #[test]
    fn diagnostics_serialize_as_map() {
        let mut diag = Diagnostics::new();
        diag.insert_key(DiagKey::Vol, 0.3);
        diag.insert_key(DiagKey::RedeemedPaths, 4.0);
        let json = serde_json::to_string(&diag).unwrap();
        assert_eq!(json, r#"{"vol":0.3,"redeemed_paths":4.0}"#);
    }

    #[test]
    fn error_messages_carry_category() {
        let err = PricingError::InvalidInput("spot must be > 0".to_string());
        assert_eq!(err.to_string(), "invalid input: spot must be > 0");
        let err = PricingError::NumericalError("nan".to_string());
        assert_eq!(err.to_string(), "numerical error: nan");
    }
}
