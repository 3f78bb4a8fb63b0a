//! Convenience re-exports for common usage.
//!
//! # Usage
//!
//! ```
//! use smoothflow::prelude::*;
//! ```

pub use crate::classifier::{PointCloudClassifier, RadialProfileClassifier};
pub use crate::config::CertifyConfig;
pub use crate::driver::{certify_dataset, CertificationRecord, ChunkPlan};
pub use crate::error::{BoxError, Result, SmoothFlowError};
pub use crate::observer::{JsonSampleWriter, SampleObserver};
pub use crate::perturbation::{NoiseDistribution, Perturbation, PerturbationSpec};
pub use crate::point_cloud::{LabeledCloud, PointCloud};
pub use crate::smooth::{Certification, Prediction, SmoothedClassifier};
