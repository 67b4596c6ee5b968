use std::collections::BTreeMap;
use thiserror::Error;

/// An unordered pair of sticky-end labels, stored sorted so that `(a, b)` and `(b, a)` are the
/// same key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StickyEndPair {
    first: String,
    second: String,
}

impl StickyEndPair {
    pub fn new(a: &str, b: &str) -> Self {
        let (first, second) = if a <= b { (a, b) } else { (b, a) };
        Self {
            first: first.to_string(),
            second: second.to_string(),
        }
    }

    pub fn labels(&self) -> (&str, &str) {
        (&self.first, &self.second)
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
#[error("Invalid binding free energy {value} for sticky ends '{a}' and '{b}'")]
pub struct InvalidFreeEnergy {
    pub a: String,
    pub b: String,
    pub value: f64,
}

/// Dimensionless binding free energies β·ΔG₀ between pairs of sticky ends.
///
/// `+∞` is accepted and marks a pair that is explicitly never allowed to bind.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BindingFreeEnergies {
    entries: BTreeMap<StickyEndPair, f64>,
}

impl BindingFreeEnergies {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(
        &mut self,
        a: &str,
        b: &str,
        beta_delta_g0: f64,
    ) -> Result<Option<f64>, InvalidFreeEnergy> {
        if beta_delta_g0.is_nan() || beta_delta_g0 == f64::NEG_INFINITY {
            return Err(InvalidFreeEnergy {
                a: a.to_string(),
                b: b.to_string(),
                value: beta_delta_g0,
            });
        }
        Ok(self.entries.insert(StickyEndPair::new(a, b), beta_delta_g0))
    }

    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        self.entries.get(&StickyEndPair::new(a, b)).copied()
    }

    pub fn remove(&mut self, a: &str, b: &str) -> Option<f64> {
        self.entries.remove(&StickyEndPair::new(a, b))
    }

    pub fn contains(&self, a: &str, b: &str) -> bool {
        self.entries.contains_key(&StickyEndPair::new(a, b))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&StickyEndPair, f64)> {
        self.entries.iter().map(|(pair, value)| (pair, *value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
