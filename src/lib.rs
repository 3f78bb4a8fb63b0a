//! SmoothFlow: randomized-smoothing certification for point-cloud classifiers.
//!
//! A base classifier is wrapped in a smoothed classifier that votes over
//! randomly perturbed copies of an input. For a perturbation family (rigid
//! rotations, translations, smooth deformations, affine maps, per-point
//! noise) the smoothed classifier either commits to a class together with a
//! certified radius in that family's parameter space, or abstains.
//!
//! # Quick Start
//!
//! ```
//! use smoothflow::prelude::*;
//!
//! struct Fixed;
//!
//! impl PointCloudClassifier for Fixed {
//!     fn num_classes(&self) -> usize {
//!         2
//!     }
//!
//!     fn predict_batch(&self, batch: &[PointCloud]) -> std::result::Result<Vec<Vec<f32>>, BoxError> {
//!         Ok(vec![vec![0.1, 0.9]; batch.len()])
//!     }
//! }
//!
//! let config = CertifyConfig::new(Perturbation::Translation, 0.25)
//!     .with_n0(20)
//!     .with_n(500)
//!     .with_seed(1);
//! let smoothed = SmoothedClassifier::new(Fixed, config).unwrap();
//! let cert = smoothed.certify(0, &PointCloud::new(vec![[0.0, 0.0, 0.0]])).unwrap();
//!
//! assert_eq!(cert.prediction, Prediction::Class(1));
//! assert!(cert.radius > 0.0);
//! ```
//!
//! # Modules
//!
//! - [`point_cloud`]: Point clouds and labeled inputs
//! - [`perturbation`]: Perturbation kinds, their transforms and noise specs
//! - [`sampler`]: Random perturbation draws
//! - [`classifier`]: Base classifier trait and a reference model
//! - [`inference`]: Batched inference and vote counting
//! - [`stats`]: Clopper–Pearson bound, binomial test, normal quantile
//! - [`radius`]: Certified radius per noise distribution
//! - [`config`]: Certification settings
//! - [`smooth`]: The smoothed classifier (`certify`, `predict`)
//! - [`observer`]: Side channel for emitted noisy samples
//! - [`driver`]: Chunked dataset runs and result rows

pub mod classifier;
pub mod config;
pub mod driver;
pub mod error;
pub mod inference;
pub mod observer;
pub mod perturbation;
pub mod point_cloud;
pub mod prelude;
pub mod radius;
pub mod sampler;
pub mod smooth;
pub mod stats;

pub use error::{Result, SmoothFlowError};
pub use point_cloud::PointCloud;
pub use smooth::{Certification, Prediction, SmoothedClassifier};
