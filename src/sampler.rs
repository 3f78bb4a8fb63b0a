//! Perturbation sampler.
//!
//! Draws independent parameter vectors for a perturbation kind and applies
//! them to an input cloud. Each draw is fresh; nothing is reused between
//! calls.

use crate::error::{Result, SmoothFlowError};
use crate::perturbation::{NoiseDistribution, Perturbation, PerturbationSpec};
use crate::point_cloud::PointCloud;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, StandardNormal, Uniform};

/// Produces noisy variants of a point cloud.
///
/// # Examples
///
/// ```
/// use smoothflow::perturbation::{NoiseDistribution, Perturbation, PerturbationSpec};
/// use smoothflow::point_cloud::PointCloud;
/// use smoothflow::sampler::PerturbationSampler;
///
/// let spec = PerturbationSpec::new(Perturbation::Translation, 0.1).unwrap();
/// let mut sampler = PerturbationSampler::seeded(&spec, NoiseDistribution::Gaussian, 7);
/// let cloud = PointCloud::new(vec![[0.0, 0.0, 0.0], [1.0, 1.0, 1.0]]);
/// let noisy = sampler.sample(&cloud, 4);
/// assert_eq!(noisy.len(), 4);
/// ```
#[derive(Debug)]
pub struct PerturbationSampler {
    kind: Perturbation,
    scale: f64,
    distribution: NoiseDistribution,
    rng: StdRng,
}

impl PerturbationSampler {
    /// Sampler for a validated spec using the given generator.
    #[must_use]
    pub fn new(spec: &PerturbationSpec, distribution: NoiseDistribution, rng: StdRng) -> Self {
        Self {
            kind: spec.kind(),
            scale: spec.scale(),
            distribution,
            rng,
        }
    }

    /// Sampler seeded for reproducible draws.
    #[must_use]
    pub fn seeded(spec: &PerturbationSpec, distribution: NoiseDistribution, seed: u64) -> Self {
        Self::new(spec, distribution, StdRng::seed_from_u64(seed))
    }

    /// Sampler with a raw scale in the kind's native metric.
    ///
    /// Unlike [`PerturbationSpec::new`] this accepts `scale = 0`, which makes
    /// every sample equal to the input.
    ///
    /// # Errors
    ///
    /// Returns `InvalidHyperparameter` if `scale` is negative or not finite.
    pub fn with_scale(
        kind: Perturbation,
        scale: f64,
        distribution: NoiseDistribution,
        rng: StdRng,
    ) -> Result<Self> {
        if !scale.is_finite() || scale < 0.0 {
            return Err(SmoothFlowError::invalid("scale", scale, "finite and >= 0"));
        }
        Ok(Self {
            kind,
            scale,
            distribution,
            rng,
        })
    }

    /// Perturbation kind.
    #[must_use]
    pub fn kind(&self) -> Perturbation {
        self.kind
    }

    /// Noise scale in the kind's native metric.
    #[must_use]
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Draw one parameter vector for a cloud of `n_points` points.
    pub fn draw_parameters(&mut self, n_points: usize) -> Vec<f64> {
        let n = self.kind.parameter_count(n_points);
        let scale = self.scale;
        match self.distribution {
            NoiseDistribution::Gaussian => (0..n)
                .map(|_| {
                    let z: f64 = StandardNormal.sample(&mut self.rng);
                    z * scale
                })
                .collect(),
            NoiseDistribution::Uniform => {
                let unit = Uniform::new_inclusive(-1.0, 1.0);
                (0..n).map(|_| unit.sample(&mut self.rng) * scale).collect()
            }
        }
    }

    /// One noisy realization of `input`.
    pub fn sample_one(&mut self, input: &PointCloud) -> PointCloud {
        let theta = self.draw_parameters(input.len());
        self.kind.apply_unchecked(input, &theta)
    }

    /// `count` independent noisy realizations of `input`.
    pub fn sample(&mut self, input: &PointCloud, count: usize) -> Vec<PointCloud> {
        (0..count).map(|_| self.sample_one(input)).collect()
    }
}
