use super::{PlateGeometry, REFERENCE_CONCENTRATION_PER_NM3, TetherStatistics};
use crate::core::models::tether::TetherType;
use std::f64::consts::PI;

/// Beyond this many standard deviations an end density is treated as zero.
const CUTOFF_SIGMAS: f64 = 12.0;
/// Number of Simpson intervals used for bridge and loop overlap integrals (must be even).
const QUADRATURE_INTERVALS: usize = 256;
const SERIES_EPSILON: f64 = 1e-17;

/// Tethers modelled as ideal Gaussian chains grafted on absorbing plates.
///
/// A chain of contour length `L` and persistence length `lp` has an end-to-end variance of
/// `2 L lp / 3` per axis. The second plate is handled with the method of images.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaussianChains {
    pub persistence_length: f64,
    pub reference_concentration: f64,
}

impl GaussianChains {
    pub fn new(persistence_length: f64) -> Self {
        Self {
            persistence_length,
            reference_concentration: REFERENCE_CONCENTRATION_PER_NM3,
        }
    }

    pub fn with_reference_concentration(mut self, reference_concentration: f64) -> Self {
        self.reference_concentration = reference_concentration;
        self
    }

    fn std_dev(&self, tether: &TetherType) -> f64 {
        (2.0 * tether.length * self.persistence_length / 3.0).sqrt()
    }
}

impl TetherStatistics for GaussianChains {
    fn boltz_binding_bridge(&self, system: &PlateGeometry, i: &TetherType, j: &TetherType) -> f64 {
        self.ln_boltz_binding_bridge(system, i, j).exp()
    }

    fn boltz_binding_loop(&self, system: &PlateGeometry, i: &TetherType, j: &TetherType) -> f64 {
        self.ln_boltz_binding_loop(system, i, j).exp()
    }

    fn boltz_exclusion(&self, system: &PlateGeometry, i: &TetherType) -> f64 {
        self.ln_boltz_exclusion(system, i)
            .exp()
            .clamp(f64::MIN_POSITIVE, 1.0)
    }

    fn ln_boltz_binding_bridge(
        &self,
        system: &PlateGeometry,
        i: &TetherType,
        j: &TetherType,
    ) -> f64 {
        let h = system.separation;
        let (s_i, s_j) = (self.std_dev(i), self.std_dev(j));
        let (d_i, d_j) = (EndDensity::new(h, s_i), EndDensity::new(h, s_j));
        let lo = (h - CUTOFF_SIGMAS * s_j).max(0.0);
        let hi = h.min(CUTOFF_SIGMAS * s_i);
        let overlap = simpson(lo, hi, |z| d_i.scaled(z) * d_j.scaled(h - z));
        d_i.ln_scale + d_j.ln_scale + overlap.max(0.0).ln() - self.reference_concentration.ln()
    }

    fn ln_boltz_binding_loop(&self, system: &PlateGeometry, i: &TetherType, j: &TetherType) -> f64 {
        let h = system.separation;
        let (s_i, s_j) = (self.std_dev(i), self.std_dev(j));
        let (d_i, d_j) = (EndDensity::new(h, s_i), EndDensity::new(h, s_j));
        let hi = h.min(CUTOFF_SIGMAS * s_i.min(s_j));
        let overlap = simpson(0.0, hi, |z| d_i.scaled(z) * d_j.scaled(z));
        d_i.ln_scale + d_j.ln_scale + overlap.max(0.0).ln() - self.reference_concentration.ln()
    }

    fn ln_boltz_exclusion(&self, system: &PlateGeometry, i: &TetherType) -> f64 {
        let s = self.std_dev(i);
        let t = system.separation * system.separation / (2.0 * s * s);
        ln_alternating_theta(t).min(0.0)
    }
}

/// End-height density of a chain grafted at `z = 0` between absorbing plates at `0` and `h`,
/// normalised to the unconfined single-plate partition function.
///
/// The density is `exp(ln_scale) · scaled(z)`. Wide gaps (`h² ≥ 2s²`) sum a few image
/// charges; narrow gaps use the sine eigenfunction series, whose leading decay
/// `exp(-π² s² / 2h²)` is carried in `ln_scale`.
struct EndDensity {
    h: f64,
    s: f64,
    ln_scale: f64,
    narrow: bool,
}

impl EndDensity {
    fn new(h: f64, s: f64) -> Self {
        let narrow = h * h < 2.0 * s * s;
        let ln_scale = if narrow {
            -PI * PI * s * s / (2.0 * h * h)
        } else {
            0.0
        };
        Self {
            h,
            s,
            ln_scale,
            narrow,
        }
    }

    fn scaled(&self, z: f64) -> f64 {
        if self.narrow {
            self.sine_series(z)
        } else {
            self.image_series(z)
        }
    }

    /// `(s √(2π) π / h²) Σ_k k sin(πkz/h) exp(-a (k² − 1))`, `a = π² s² / 2h²`.
    fn sine_series(&self, z: f64) -> f64 {
        let (h, s) = (self.h, self.s);
        let a = -self.ln_scale;
        let mut sum = 0.0;
        for k in 1.. {
            let k = k as f64;
            let decay = (-a * (k * k - 1.0)).exp();
            if decay < SERIES_EPSILON {
                break;
            }
            sum += k * (PI * k * z / h).sin() * decay;
        }
        s * (2.0 * PI).sqrt() * PI / (h * h) * sum
    }

    /// `Σ_n u/s² exp(-u²/2s²)`, `u = z + 2nh`. Only used for `h ≥ √2 s`, so at most a handful
    /// of images fall inside the cutoff.
    fn image_series(&self, z: f64) -> f64 {
        let (h, s) = (self.h, self.s);
        let s2 = s * s;
        let cutoff = CUTOFF_SIGMAS * s;
        let n_min = ((-cutoff - z) / (2.0 * h)).ceil() as i64;
        let n_max = ((cutoff - z) / (2.0 * h)).floor() as i64;
        (n_min..=n_max)
            .map(|n| {
                let u = z + 2.0 * n as f64 * h;
                u / s2 * (-u * u / (2.0 * s2)).exp()
            })
            .sum()
    }
}

/// `ln Σ_k (-1)^k exp(-k² t)` over all integers `k`.
///
/// Below `t = 1` the Jacobi-transformed series `2 √(π/t) Σ_m exp(-π² (2m+1)² / 4t)` is used,
/// with its leading exponential taken out so narrow gaps do not underflow.
fn ln_alternating_theta(t: f64) -> f64 {
    if t >= 1.0 {
        let mut sum = 1.0;
        for k in 1.. {
            let term = (-(k as f64).powi(2) * t).exp();
            if term < SERIES_EPSILON {
                break;
            }
            sum += if k % 2 == 0 { 2.0 * term } else { -2.0 * term };
        }
        sum.ln()
    } else {
        let lead = PI * PI / (4.0 * t);
        let mut sum = 1.0;
        for m in 1.. {
            let odd = (2 * m + 1) as f64;
            let term = (-lead * (odd * odd - 1.0)).exp();
            if term < SERIES_EPSILON {
                break;
            }
            sum += term;
        }
        (2.0 * (PI / t).sqrt()).ln() - lead + sum.ln()
    }
}

fn simpson<F>(a: f64, b: f64, f: F) -> f64
where
    F: Fn(f64) -> f64,
{
    if b <= a {
        return 0.0;
    }
    let n = QUADRATURE_INTERVALS;
    let dz = (b - a) / n as f64;
    let interior: f64 = (1..n)
        .map(|k| {
            let weight = if k % 2 == 1 { 4.0 } else { 2.0 };
            weight * f(a + k as f64 * dz)
        })
        .sum();
    (f(a) + f(b) + interior) * dz / 3.0
}
