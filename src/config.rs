//! Certification configuration.
//!
//! [`CertifyConfig`] is a plain serializable record with builder methods.
//! [`CertifyConfig::validate`] checks every field before any sample is drawn
//! and produces the [`PerturbationSpec`] the sampler runs on.

use crate::error::{Result, SmoothFlowError};
use crate::perturbation::{NoiseDistribution, Perturbation, PerturbationSpec};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Numeric settings for one certification run.
///
/// # Examples
///
/// ```
/// use smoothflow::config::CertifyConfig;
/// use smoothflow::perturbation::Perturbation;
///
/// let config = CertifyConfig::new(Perturbation::RotationZ, 0.5)
///     .with_n0(50)
///     .with_n(200)
///     .with_seed(7);
/// let spec = config.validate().unwrap();
/// assert!((spec.scale() - 0.5 * std::f64::consts::PI).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CertifyConfig {
    /// Perturbation family
    pub perturbation: Perturbation,
    /// Noise level (fraction of π for rotations)
    pub sigma: f64,
    /// Selection-phase sample count
    #[serde(default = "default_n0")]
    pub n0: usize,
    /// Estimation-phase sample count
    #[serde(default = "default_n")]
    pub n: usize,
    /// Failure probability of the certificate
    #[serde(default = "default_alpha")]
    pub alpha: f64,
    /// Maximum clouds per classifier call
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Noise distribution and matching certificate
    #[serde(default)]
    pub distribution: NoiseDistribution,
    /// Base seed; `None` draws from OS entropy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

fn default_n0() -> usize {
    100
}

fn default_n() -> usize {
    1000
}

fn default_alpha() -> f64 {
    0.001
}

fn default_batch_size() -> usize {
    128
}

impl CertifyConfig {
    /// Configuration with default sample counts for `perturbation` at `sigma`.
    #[must_use]
    pub fn new(perturbation: Perturbation, sigma: f64) -> Self {
        Self {
            perturbation,
            sigma,
            n0: default_n0(),
            n: default_n(),
            alpha: default_alpha(),
            batch_size: default_batch_size(),
            distribution: NoiseDistribution::default(),
            seed: None,
        }
    }

    /// Set the selection-phase sample count.
    #[must_use]
    pub fn with_n0(mut self, n0: usize) -> Self {
        self.n0 = n0;
        self
    }

    /// Set the estimation-phase sample count.
    #[must_use]
    pub fn with_n(mut self, n: usize) -> Self {
        self.n = n;
        self
    }

    /// Set the failure probability.
    #[must_use]
    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    /// Set the classifier batch ceiling.
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Set the noise distribution.
    #[must_use]
    pub fn with_distribution(mut self, distribution: NoiseDistribution) -> Self {
        self.distribution = distribution;
        self
    }

    /// Fix the base seed for reproducible runs.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Check every field and build the sampler spec.
    ///
    /// # Errors
    ///
    /// Returns `InvalidHyperparameter` if `sigma <= 0`, `n0` or `n` is zero,
    /// `alpha` is outside `(0, 1)` or `batch_size` is zero.
    pub fn validate(&self) -> Result<PerturbationSpec> {
        if self.n0 == 0 {
            return Err(SmoothFlowError::invalid("n0", self.n0, ">= 1"));
        }
        if self.n == 0 {
            return Err(SmoothFlowError::invalid("n", self.n, ">= 1"));
        }
        if !(self.alpha > 0.0 && self.alpha < 1.0) {
            return Err(SmoothFlowError::invalid("alpha", self.alpha, "in (0, 1)"));
        }
        if self.batch_size == 0 {
            return Err(SmoothFlowError::invalid(
                "batch_size",
                self.batch_size,
                ">= 1",
            ));
        }
        PerturbationSpec::new(self.perturbation, self.sigma)
    }

    /// Write the configuration as pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns an error on I/O or serialization failure.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Read a configuration written by [`save`](Self::save).
    ///
    /// The result is not validated; call [`validate`](Self::validate).
    ///
    /// # Errors
    ///
    /// Returns an error on I/O or deserialization failure.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> CertifyConfig {
        CertifyConfig::new(Perturbation::Translation, 0.1)
    }

    #[test]
    fn test_defaults() {
        let c = base();
        assert_eq!(c.n0, 100);
        assert_eq!(c.n, 1000);
        assert!((c.alpha - 0.001).abs() < f64::EPSILON);
        assert_eq!(c.batch_size, 128);
        assert_eq!(c.distribution, NoiseDistribution::Gaussian);
        assert_eq!(c.seed, None);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_each_bad_field() {
        let bad = [
            base().with_n0(0),
            base().with_n(0),
            base().with_alpha(0.0),
            base().with_alpha(1.0),
            base().with_alpha(f64::NAN),
            base().with_batch_size(0),
            CertifyConfig::new(Perturbation::Translation, 0.0),
            CertifyConfig::new(Perturbation::Translation, -1.0),
        ];
        for config in bad {
            let err = config.validate().unwrap_err();
            assert!(err.is_configuration(), "{config:?} -> {err}");
        }
    }

    #[test]
    fn test_rotation_sigma_clamped_on_validate() {
        let spec = CertifyConfig::new(Perturbation::RotationX, 1.5)
            .validate()
            .expect("clamped, not rejected");
        assert!(spec.sigma_clamped());
        assert!((spec.sigma() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_json_defaults_fill_missing_fields() {
        let c: CertifyConfig =
            serde_json::from_str(r#"{"perturbation":"Shearing","sigma":0.05}"#).expect("parse");
        assert_eq!(c, CertifyConfig::new(Perturbation::Shearing, 0.05));
    }

    #[test]
    fn test_save_load() {
        let c = base()
            .with_seed(3)
            .with_distribution(NoiseDistribution::Uniform);
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.json");
        c.save(&path).expect("save");
        assert_eq!(CertifyConfig::load(&path).expect("load"), c);
    }
}
