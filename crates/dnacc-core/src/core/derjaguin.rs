//! Derjaguin approximation: curved-surface potentials from flat-plate potentials.
//!
//! For surfaces whose radii of curvature are much larger than the range of the interaction,
//! the potential between curved bodies at closest separation `h` is
//! `W(h) = 2π R_eff ∫_h^∞ V(h') dh'`, with `V` the free energy per unit area between plates.
//! The integral is evaluated with the trapezoidal rule over the tabulated tail of `V`, so the
//! last sample always maps to zero. Callers should tabulate `V` out to where it vanishes.
//!
//! The precondition `R ≫ max(h)` is documented, not checked.
//!
//! [`GaussianBlur`] smooths a sphere potential over the finite roughness of real colloids by
//! averaging Boltzmann factors `exp(-βW)` with a Gaussian kernel.

use std::f64::consts::PI;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum DerjaguinError {
    #[error("Separation and potential arrays differ in length ({separations} vs {potentials})")]
    LengthMismatch {
        separations: usize,
        potentials: usize,
    },

    #[error("Separations must be strictly increasing (violated at index {index})")]
    NonIncreasingSeparations { index: usize },

    #[error("Invalid radius: {0}")]
    InvalidRadius(f64),

    #[error("Non-finite sample at index {index}")]
    NonFiniteSample { index: usize },

    #[error("Invalid blur width: {0}")]
    InvalidBlurWidth(f64),

    #[error("Blur kernel size must be odd and at least 3, got {0}")]
    InvalidKernelSize(usize),
}

/// Potential between two identical spheres of radius `radius` (`R_eff = R / 2`).
pub fn calc_spheres_potential(
    separations: &[f64],
    plate_potential: &[f64],
    radius: f64,
) -> Result<Vec<f64>, DerjaguinError> {
    check_radius(radius)?;
    tail_integrals(separations, plate_potential, PI * radius)
}

/// Potential between a sphere of radius `radius` and a flat plate (`R_eff = R`).
pub fn calc_sphere_plate_potential(
    separations: &[f64],
    plate_potential: &[f64],
    radius: f64,
) -> Result<Vec<f64>, DerjaguinError> {
    check_radius(radius)?;
    tail_integrals(separations, plate_potential, 2.0 * PI * radius)
}

/// Potential between spheres of radii `r1` and `r2` (`R_eff = r1 r2 / (r1 + r2)`).
pub fn calc_unequal_spheres_potential(
    separations: &[f64],
    plate_potential: &[f64],
    r1: f64,
    r2: f64,
) -> Result<Vec<f64>, DerjaguinError> {
    check_radius(r1)?;
    check_radius(r2)?;
    tail_integrals(separations, plate_potential, 2.0 * PI * r1 * r2 / (r1 + r2))
}

fn check_radius(radius: f64) -> Result<(), DerjaguinError> {
    if radius > 0.0 && radius.is_finite() {
        Ok(())
    } else {
        Err(DerjaguinError::InvalidRadius(radius))
    }
}

fn check_samples(separations: &[f64], potential: &[f64]) -> Result<(), DerjaguinError> {
    if separations.len() != potential.len() {
        return Err(DerjaguinError::LengthMismatch {
            separations: separations.len(),
            potentials: potential.len(),
        });
    }
    if let Some(index) = separations
        .iter()
        .zip(potential)
        .position(|(h, v)| !h.is_finite() || !v.is_finite())
    {
        return Err(DerjaguinError::NonFiniteSample { index });
    }
    if let Some(index) = separations.windows(2).position(|w| w[1] <= w[0]) {
        return Err(DerjaguinError::NonIncreasingSeparations { index: index + 1 });
    }
    Ok(())
}

fn tail_integrals(
    separations: &[f64],
    plate_potential: &[f64],
    prefactor: f64,
) -> Result<Vec<f64>, DerjaguinError> {
    check_samples(separations, plate_potential)?;

    let n = separations.len();
    let mut result = vec![0.0; n];
    let mut tail = 0.0;
    for k in (0..n.saturating_sub(1)).rev() {
        let dh = separations[k + 1] - separations[k];
        tail += 0.5 * dh * (plate_potential[k] + plate_potential[k + 1]);
        result[k] = prefactor * tail;
    }
    Ok(result)
}

/// Gaussian average of a potential over separations.
///
/// The kernel has `kernel_size` points spanning `±3 width`, shifted by half a spacing and
/// normalised to unit sum. The potential is resampled at the kernel spacing from the first
/// separation up to (excluding) the last one, then `exp(-βW)` is convolved with the kernel.
/// Below the grid the Boltzmann factor is padded with 0 (hard contact), above it with 1 (no
/// interaction). The result is `-ln` of the convolution, computed in log space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaussianBlur {
    width: f64,
    kernel_size: usize,
}

impl Default for GaussianBlur {
    fn default() -> Self {
        Self {
            width: Self::DEFAULT_WIDTH,
            kernel_size: Self::DEFAULT_KERNEL_SIZE,
        }
    }
}

impl GaussianBlur {
    pub const DEFAULT_WIDTH: f64 = 3.0;
    pub const DEFAULT_KERNEL_SIZE: usize = 201;

    pub fn new(width: f64, kernel_size: usize) -> Result<Self, DerjaguinError> {
        if !(width > 0.0 && width.is_finite()) {
            return Err(DerjaguinError::InvalidBlurWidth(width));
        }
        if kernel_size < 3 || kernel_size % 2 == 0 {
            return Err(DerjaguinError::InvalidKernelSize(kernel_size));
        }
        Ok(Self { width, kernel_size })
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn kernel_size(&self) -> usize {
        self.kernel_size
    }

    /// Distance between kernel points, which is also the resampling step.
    pub fn spacing(&self) -> f64 {
        6.0 * self.width / (self.kernel_size - 1) as f64
    }

    pub fn kernel(&self) -> Vec<f64> {
        let dx = self.spacing();
        let raw: Vec<f64> = (0..self.kernel_size)
            .map(|k| {
                let x = -3.0 * self.width + k as f64 * dx + 0.5 * dx;
                (-x * x / (2.0 * self.width * self.width)).exp()
            })
            .collect();
        let total: f64 = raw.iter().sum();
        raw.into_iter().map(|y| y / total).collect()
    }

    /// `first, first + dx, …` strictly below the last separation.
    pub fn resampled_separations(&self, separations: &[f64]) -> Vec<f64> {
        let (Some(&first), Some(&last)) = (separations.first(), separations.last()) else {
            return Vec::new();
        };
        let dx = self.spacing();
        let count = ((last - first) / dx).ceil().max(0.0) as usize;
        (0..count).map(|k| first + k as f64 * dx).collect()
    }

    /// Blurs `potential`, sampled at `separations`, onto
    /// [`resampled_separations`](Self::resampled_separations).
    pub fn apply(
        &self,
        separations: &[f64],
        potential: &[f64],
    ) -> Result<Vec<f64>, DerjaguinError> {
        check_samples(separations, potential)?;
        let grid = self.resampled_separations(separations);
        let resampled: Vec<f64> = grid
            .iter()
            .map(|&h| interpolate(separations, potential, h))
            .collect();

        let ln_kernel: Vec<f64> = self.kernel().iter().map(|w| w.ln()).collect();
        let n = self.kernel_size;
        let half = n / 2;
        let len = resampled.len();
        let ln_boltzmann = |padded: usize| -> Option<f64> {
            if padded < half {
                None
            } else if padded >= half + len {
                Some(0.0)
            } else {
                Some(-resampled[padded - half])
            }
        };

        let blurred = (0..len)
            .map(|i| {
                let terms: Vec<f64> = (0..n)
                    .filter_map(|m| ln_boltzmann(i + m).map(|ln_p| ln_p + ln_kernel[n - 1 - m]))
                    .collect();
                -log_sum_exp(&terms)
            })
            .collect();
        Ok(blurred)
    }
}

fn interpolate(xs: &[f64], ys: &[f64], x: f64) -> f64 {
    let upper = xs.partition_point(|&xi| xi <= x);
    if upper == 0 {
        return ys[0];
    }
    if upper == xs.len() {
        return ys[xs.len() - 1];
    }
    let (x0, x1) = (xs[upper - 1], xs[upper]);
    let (y0, y1) = (ys[upper - 1], ys[upper]);
    y0 + (y1 - y0) * (x - x0) / (x1 - x0)
}

fn log_sum_exp(terms: &[f64]) -> f64 {
    let max = terms.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if max == f64::NEG_INFINITY {
        return max;
    }
    max + terms.iter().map(|t| (t - max).exp()).sum::<f64>().ln()
}
