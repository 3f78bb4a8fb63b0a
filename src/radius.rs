//! Certified radius in a perturbation's native parameter metric.
//!
//! Gaussian noise with scale `s` certifies `s · Φ⁻¹(pA)`; uniform noise on
//! `[-s, s]` certifies `2 · s · (pA - 1/2)`. For rotations `s` is the
//! π-scaled angle, so radii come out in radians.

use crate::perturbation::{NoiseDistribution, Perturbation, PerturbationSpec};
use crate::stats::normal_ppf;
use serde::{Deserialize, Serialize};

/// Which certificate formula applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Certificate {
    /// `scale · Φ⁻¹(pA)`
    Gaussian,
    /// `2 · scale · (pA - 1/2)`
    Uniform,
}

impl From<NoiseDistribution> for Certificate {
    fn from(d: NoiseDistribution) -> Self {
        match d {
            NoiseDistribution::Gaussian => Self::Gaussian,
            NoiseDistribution::Uniform => Self::Uniform,
        }
    }
}

/// Radius formula bound to one perturbation kind and noise scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RadiusMapper {
    kind: Perturbation,
    scale: f64,
    certificate: Certificate,
}

impl RadiusMapper {
    /// Mapper for a validated spec.
    #[must_use]
    pub fn new(spec: &PerturbationSpec, certificate: Certificate) -> Self {
        Self {
            kind: spec.kind(),
            scale: spec.scale(),
            certificate,
        }
    }

    /// Perturbation kind the radius is measured for.
    #[must_use]
    pub fn kind(&self) -> Perturbation {
        self.kind
    }

    /// Certificate formula in use.
    #[must_use]
    pub fn certificate(&self) -> Certificate {
        self.certificate
    }

    /// Certified radius for lower bound `p_a`; zero when `p_a <= 1/2`.
    #[must_use]
    pub fn radius(&self, p_a: f64) -> f64 {
        certified_radius(p_a, self.scale, self.certificate)
    }
}

/// Certified radius for lower bound `p_a` at noise `scale`.
///
/// Non-negative, zero for `p_a <= 1/2`, strictly increasing in `p_a` above
/// one half.
///
/// # Examples
///
/// ```
/// use smoothflow::radius::{certified_radius, Certificate};
///
/// let r = certified_radius(0.975, 0.5, Certificate::Gaussian);
/// assert!((r - 0.5 * 1.959_964).abs() < 1e-6);
///
/// let r = certified_radius(0.75, 0.5, Certificate::Uniform);
/// assert!((r - 0.25).abs() < 1e-12);
/// ```
#[must_use]
pub fn certified_radius(p_a: f64, scale: f64, certificate: Certificate) -> f64 {
    if !(p_a > 0.5) {
        return 0.0;
    }
    let r = match certificate {
        Certificate::Gaussian => scale * normal_ppf(p_a),
        Certificate::Uniform => 2.0 * scale * (p_a - 0.5),
    };
    r.max(0.0)
}
