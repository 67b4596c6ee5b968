use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Default contour length of a tether when neither the call nor the prototype gives one.
pub const DEFAULT_TETHER_LENGTH: f64 = 20.0;

/// The plate a tether is grafted onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Plate {
    Lower,
    Upper,
}

impl Plate {
    pub fn opposite(self) -> Self {
        match self {
            Plate::Lower => Plate::Upper,
            Plate::Upper => Plate::Lower,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Plate::Lower => "lower",
            Plate::Upper => "upper",
        }
    }
}

impl fmt::Display for Plate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Invalid plate label '{0}'. Expected 'upper' or 'lower'.")]
pub struct ParsePlateError(pub String);

impl FromStr for Plate {
    type Err = ParsePlateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lower" => Ok(Plate::Lower),
            "upper" => Ok(Plate::Upper),
            _ => Err(ParsePlateError(s.to_string())),
        }
    }
}

/// A class of identical tethers grafted on one plate.
///
/// Once registered, only the areal density `sigma` may change; plate, sticky end and
/// contour length are fixed for the lifetime of the model.
#[derive(Debug, Clone, PartialEq)]
pub struct TetherType {
    pub(crate) plate: Plate,
    pub(crate) sticky_end: String,
    pub(crate) sigma: f64,
    pub(crate) length: f64,
}

impl TetherType {
    pub fn new(plate: Plate, sticky_end: impl Into<String>, sigma: f64, length: f64) -> Self {
        Self {
            plate,
            sticky_end: sticky_end.into(),
            sigma,
            length,
        }
    }

    pub fn plate(&self) -> Plate {
        self.plate
    }

    pub fn sticky_end(&self) -> &str {
        &self.sticky_end
    }

    /// Areal density of grafted tethers (length⁻²).
    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    /// Contour length of the tether.
    pub fn length(&self) -> f64 {
        self.length
    }
}

/// Optional per-tether parameters, used both when adding a tether type and as the model's
/// prototype supplying defaults for the fields a call leaves out.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TetherParams {
    pub sigma: Option<f64>,
    pub length: Option<f64>,
}

impl TetherParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sigma(mut self, sigma: f64) -> Self {
        self.sigma = Some(sigma);
        self
    }

    pub fn length(mut self, length: f64) -> Self {
        self.length = Some(length);
        self
    }

    /// Fills the fields missing from `self` with those of `prototype`.
    pub fn or(self, prototype: &TetherParams) -> Self {
        Self {
            sigma: self.sigma.or(prototype.sigma),
            length: self.length.or(prototype.length),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plate_parses_known_labels_case_insensitively() {
        assert_eq!("lower".parse::<Plate>(), Ok(Plate::Lower));
        assert_eq!(" Upper ".parse::<Plate>(), Ok(Plate::Upper));
    }

    #[test]
    fn plate_rejects_malformed_labels() {
        let err = "middle".parse::<Plate>().unwrap_err();
        assert_eq!(err, ParsePlateError("middle".to_string()));
        assert!("".parse::<Plate>().is_err());
    }

    #[test]
    fn plate_opposite_swaps_sides() {
        assert_eq!(Plate::Lower.opposite(), Plate::Upper);
        assert_eq!(Plate::Upper.opposite(), Plate::Lower);
    }

    #[test]
    fn params_fall_back_to_prototype_fields() {
        let prototype = TetherParams::new().sigma(0.5).length(10.0);
        let merged = TetherParams::new().length(3.0).or(&prototype);
        assert_eq!(merged.sigma, Some(0.5));
        assert_eq!(merged.length, Some(3.0));
    }

    #[test]
    fn params_keep_explicit_values_over_prototype() {
        let prototype = TetherParams::new().sigma(0.5);
        let merged = TetherParams::new().sigma(0.0).or(&prototype);
        assert_eq!(merged.sigma, Some(0.0));
        assert_eq!(merged.length, None);
    }
}
