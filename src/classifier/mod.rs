//! Classifier boundary.
//!
//! The certification engine treats the base classifier as an opaque,
//! read-only scoring function over batches of point clouds. It is only ever
//! borrowed immutably, so one instance can back concurrent certifications.
//!
//! [`RadialProfileClassifier`] is a small reference model so the pipeline can
//! run end to end without a deep-learning stack.

pub mod radial;

pub use radial::RadialProfileClassifier;

use crate::error::BoxError;
use crate::point_cloud::PointCloud;

/// Base classifier scored by the smoothing engine.
///
/// # Examples
///
/// ```
/// use smoothflow::classifier::PointCloudClassifier;
/// use smoothflow::error::BoxError;
/// use smoothflow::point_cloud::PointCloud;
///
/// /// Votes for class 1 when the cloud sits above the xy-plane.
/// struct AboveOrBelow;
///
/// impl PointCloudClassifier for AboveOrBelow {
///     fn num_classes(&self) -> usize {
///         2
///     }
///
///     fn predict_batch(&self, batch: &[PointCloud]) -> Result<Vec<Vec<f32>>, BoxError> {
///         Ok(batch
///             .iter()
///             .map(|c| if c.centroid()[2] > 0.0 { vec![0.0, 1.0] } else { vec![1.0, 0.0] })
///             .collect())
///     }
/// }
///
/// let scores = AboveOrBelow
///     .predict_batch(&[PointCloud::new(vec![[0.0, 0.0, 1.0]])])
///     .unwrap();
/// assert_eq!(scores, vec![vec![0.0, 1.0]]);
/// ```
pub trait PointCloudClassifier {
    /// Number of output classes.
    fn num_classes(&self) -> usize;

    /// Per-class scores for every cloud in `batch`, one row per cloud.
    ///
    /// Only the argmax of each row is used. Errors (for example device
    /// memory exhaustion) are passed through to the caller untouched.
    ///
    /// # Errors
    ///
    /// Any failure of the underlying model.
    fn predict_batch(&self, batch: &[PointCloud]) -> Result<Vec<Vec<f32>>, BoxError>;
}

impl<C: PointCloudClassifier + ?Sized> PointCloudClassifier for &C {
    fn num_classes(&self) -> usize {
        (**self).num_classes()
    }

    fn predict_batch(&self, batch: &[PointCloud]) -> Result<Vec<Vec<f32>>, BoxError> {
        (**self).predict_batch(batch)
    }
}

impl<C: PointCloudClassifier + ?Sized> PointCloudClassifier for Box<C> {
    fn num_classes(&self) -> usize {
        (**self).num_classes()
    }

    fn predict_batch(&self, batch: &[PointCloud]) -> Result<Vec<Vec<f32>>, BoxError> {
        (**self).predict_batch(batch)
    }
}

impl<C: PointCloudClassifier + ?Sized> PointCloudClassifier for std::sync::Arc<C> {
    fn num_classes(&self) -> usize {
        (**self).num_classes()
    }

    fn predict_batch(&self, batch: &[PointCloud]) -> Result<Vec<Vec<f32>>, BoxError> {
        (**self).predict_batch(batch)
    }
}

/// Index of the largest score; ties resolve to the lowest index and NaN
/// never wins. Returns `None` for an empty row.
#[must_use]
pub fn argmax(scores: &[f32]) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (i, &s) in scores.iter().enumerate() {
        match best {
            None => best = Some((i, s)),
            Some((_, b)) if s > b || (b.is_nan() && !s.is_nan()) => best = Some((i, s)),
            Some(_) => {}
        }
    }
    best.map(|(i, _)| i)
}
