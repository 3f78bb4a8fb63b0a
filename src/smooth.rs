//! Smoothed classifier: two-phase certification and smoothed prediction.
//!
//! `certify` draws `n0` selection samples to pick a candidate class, then a
//! fresh batch of `n` estimation samples to count how often the candidate
//! wins. The Clopper–Pearson lower bound on that rate decides between a
//! certified prediction and abstention.

use crate::classifier::PointCloudClassifier;
use crate::config::CertifyConfig;
use crate::error::{Result, SmoothFlowError};
use crate::inference::{BatchRunner, VoteCounts};
use crate::observer::SampleObserver;
use crate::perturbation::PerturbationSpec;
use crate::point_cloud::PointCloud;
use crate::radius::{Certificate, RadiusMapper};
use crate::sampler::PerturbationSampler;
use crate::stats::{binomial_test_half, clopper_pearson_lower};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::fmt;

/// Outcome of a smoothed decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prediction {
    /// The smoothed classifier commits to this class.
    Class(usize),
    /// Not enough evidence to commit.
    Abstain,
}

impl Prediction {
    /// Predicted class, `None` on abstention.
    #[must_use]
    pub fn class(self) -> Option<usize> {
        match self {
            Prediction::Class(c) => Some(c),
            Prediction::Abstain => None,
        }
    }
}

impl fmt::Display for Prediction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Prediction::Class(c) => write!(f, "{c}"),
            Prediction::Abstain => write!(f, "abstain"),
        }
    }
}

/// Result of certifying one input.
#[derive(Debug, Clone, PartialEq)]
pub struct Certification {
    /// Certified class or abstention
    pub prediction: Prediction,
    /// Certified radius in the perturbation's native metric; zero on abstention
    pub radius: f64,
    /// Lower confidence bound on the candidate's probability
    pub p_a: f64,
    /// Candidate chosen in the selection phase
    pub candidate: usize,
    /// Estimation-phase votes for the candidate
    pub n_a: usize,
    /// Estimation-phase sample count
    pub n: usize,
}

impl Certification {
    /// True if the smoothed classifier abstained.
    #[must_use]
    pub fn is_abstain(&self) -> bool {
        self.prediction == Prediction::Abstain
    }

    /// Certified class, `None` on abstention.
    #[must_use]
    pub fn predicted_class(&self) -> Option<usize> {
        self.prediction.class()
    }

    /// True if the certified class equals `label`. Abstentions are never correct.
    #[must_use]
    pub fn is_correct(&self, label: usize) -> bool {
        self.predicted_class() == Some(label)
    }
}

/// A base classifier wrapped with randomized smoothing.
///
/// The configuration is validated once at construction and never changes.
/// Certification only borrows the classifier, so a `Sync` classifier can be
/// certified from several threads at once.
///
/// # Examples
///
/// ```
/// use smoothflow::prelude::*;
///
/// struct AlwaysZero;
///
/// impl PointCloudClassifier for AlwaysZero {
///     fn num_classes(&self) -> usize {
///         3
///     }
///
///     fn predict_batch(&self, batch: &[PointCloud]) -> std::result::Result<Vec<Vec<f32>>, BoxError> {
///         Ok(vec![vec![1.0, 0.0, 0.0]; batch.len()])
///     }
/// }
///
/// let config = CertifyConfig::new(Perturbation::RotationZ, 0.5)
///     .with_n0(50)
///     .with_n(200)
///     .with_seed(0);
/// let smoothed = SmoothedClassifier::new(AlwaysZero, config).unwrap();
/// let cert = smoothed.certify(0, &PointCloud::new(vec![[1.0, 0.0, 0.0]])).unwrap();
///
/// assert_eq!(cert.prediction, Prediction::Class(0));
/// assert!(cert.radius > 0.0);
/// ```
#[derive(Debug)]
pub struct SmoothedClassifier<C> {
    classifier: C,
    config: CertifyConfig,
    spec: PerturbationSpec,
    mapper: RadiusMapper,
}

impl<C: PointCloudClassifier> SmoothedClassifier<C> {
    /// Wrap `classifier` with a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `config` is invalid or the classifier
    /// reports zero classes.
    pub fn new(classifier: C, config: CertifyConfig) -> Result<Self> {
        let spec = config.validate()?;
        if classifier.num_classes() == 0 {
            return Err(SmoothFlowError::invalid(
                "num_classes",
                classifier.num_classes(),
                ">= 1",
            ));
        }
        let mapper = RadiusMapper::new(&spec, Certificate::from(config.distribution));
        Ok(Self {
            classifier,
            config,
            spec,
            mapper,
        })
    }

    /// The wrapped classifier.
    pub fn classifier(&self) -> &C {
        &self.classifier
    }

    /// The configuration this classifier was built with.
    pub fn config(&self) -> &CertifyConfig {
        &self.config
    }

    /// Validated perturbation spec (sigma after clamping).
    pub fn spec(&self) -> &PerturbationSpec {
        &self.spec
    }

    /// Certify `input`. `index` identifies the input for seeding and logs.
    ///
    /// # Errors
    ///
    /// Classifier failures are returned as `Inference`; abstention is not an
    /// error.
    pub fn certify(&self, index: usize, input: &PointCloud) -> Result<Certification> {
        self.run_certify(index, input, None)
    }

    /// [`certify`](Self::certify), handing the first estimation-phase sample
    /// to `observer`.
    ///
    /// Observer failures are logged and do not affect the result.
    ///
    /// # Errors
    ///
    /// See [`certify`](Self::certify).
    pub fn certify_with_observer(
        &self,
        index: usize,
        input: &PointCloud,
        observer: &mut dyn SampleObserver,
    ) -> Result<Certification> {
        self.run_certify(index, input, Some(observer))
    }

    fn run_certify(
        &self,
        index: usize,
        input: &PointCloud,
        observer: Option<&mut dyn SampleObserver>,
    ) -> Result<Certification> {
        let runner = BatchRunner::new(&self.classifier, self.config.batch_size)?;
        let mut sampler = self.sampler(index);

        let selection = runner.count_votes(&mut sampler, input, self.config.n0)?;
        let candidate = selection.top().unwrap_or(0);
        tracing::debug!(
            index,
            candidate,
            votes = selection.get(candidate),
            n0 = self.config.n0,
            "selection phase"
        );

        let kind = self.spec.kind();
        let mut pending = observer;
        let estimation = runner.count_votes_with(&mut sampler, input, self.config.n, |chunk| {
            let (Some(obs), Some(first)) = (pending.take(), chunk.first()) else {
                return;
            };
            if let Err(e) = obs.observe(index, kind, first) {
                tracing::warn!(index, error = %e, "sample observer failed");
            }
        })?;

        let n_a = estimation.get(candidate);
        let n = self.config.n;
        let p_a = clopper_pearson_lower(n_a, n, self.config.alpha);
        debug_assert!((0.0..=1.0).contains(&p_a), "bound {p_a} outside [0, 1]");
        tracing::debug!(index, candidate, n_a, n, p_a, "estimation phase");

        let (prediction, radius) = if p_a <= 0.5 {
            (Prediction::Abstain, 0.0)
        } else {
            (Prediction::Class(candidate), self.mapper.radius(p_a))
        };
        Ok(Certification {
            prediction,
            radius,
            p_a,
            candidate,
            n_a,
            n,
        })
    }

    /// Monte-Carlo prediction from `n` samples.
    ///
    /// Abstains unless a two-sided binomial test rejects, at `alpha`, that the
    /// top two classes are equally likely.
    ///
    /// # Errors
    ///
    /// Returns `InvalidHyperparameter` if `n` is zero; classifier failures are
    /// returned as `Inference`.
    pub fn predict(&self, index: usize, input: &PointCloud, n: usize) -> Result<Prediction> {
        if n == 0 {
            return Err(SmoothFlowError::invalid("n", n, ">= 1"));
        }
        let runner = BatchRunner::new(&self.classifier, self.config.batch_size)?;
        let mut sampler = self.sampler(index);
        let votes = runner.count_votes(&mut sampler, input, n)?;
        Ok(self.decide(&votes))
    }

    fn decide(&self, votes: &VoteCounts) -> Prediction {
        let Some((top, second)) = votes.top_two() else {
            return Prediction::Abstain;
        };
        let n_top = votes.get(top);
        let n_second = if second == top { 0 } else { votes.get(second) };
        let p_value = binomial_test_half(n_top, n_top + n_second);
        tracing::debug!(top, n_top, second, n_second, p_value, "smoothed prediction");
        if p_value > self.config.alpha {
            Prediction::Abstain
        } else {
            Prediction::Class(top)
        }
    }

    fn sampler(&self, index: usize) -> PerturbationSampler {
        let rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(stream_seed(seed, index)),
            None => StdRng::from_entropy(),
        };
        PerturbationSampler::new(&self.spec, self.config.distribution, rng)
    }
}

/// SplitMix64 finalizer.
fn splitmix64(x: u64) -> u64 {
    let mut z = x.wrapping_add(0x9e37_79b9_7f4a_7c15);
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

/// Per-input seed. The base seed is mixed before the index is folded in, so
/// `(seed, i + 1)` and `(seed + 1, i)` land on unrelated streams.
fn stream_seed(seed: u64, index: usize) -> u64 {
    splitmix64(splitmix64(seed) ^ index as u64)
}
