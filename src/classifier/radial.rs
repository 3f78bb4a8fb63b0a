//! Nearest-centroid classifier over radial point-density profiles.
//!
//! Each cloud is summarized by a normalized histogram of point distances from
//! its centroid. The profile is invariant to rotation and translation, which
//! makes the model a convenient base classifier for exercising the
//! certification pipeline.

use super::PointCloudClassifier;
use crate::error::{BoxError, Result, SmoothFlowError};
use crate::point_cloud::{LabeledCloud, PointCloud};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Nearest-centroid classifier on radial histograms.
///
/// # Examples
///
/// ```
/// use smoothflow::classifier::{PointCloudClassifier, RadialProfileClassifier};
/// use smoothflow::point_cloud::{LabeledCloud, PointCloud};
///
/// let tight = PointCloud::new(vec![[0.1, 0.0, 0.0], [-0.1, 0.0, 0.0]]);
/// let wide = PointCloud::new(vec![[1.0, 0.0, 0.0], [-1.0, 0.0, 0.0]]);
/// let data = vec![LabeledCloud::new(tight.clone(), 0), LabeledCloud::new(wide, 1)];
///
/// let model = RadialProfileClassifier::fit(&data, 2, 8).unwrap();
/// assert_eq!(model.predict(&tight), 0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "StoredModel")]
pub struct RadialProfileClassifier {
    bins: usize,
    max_radius: f64,
    /// Mean profile per class; `None` for classes absent from training data
    centroids: Vec<Option<Vec<f32>>>,
}

/// Unchecked on-disk form; every deserialized model passes through
/// [`TryFrom`] so that `profile` and `scores` can index without checks.
#[derive(Deserialize)]
struct StoredModel {
    bins: usize,
    max_radius: f64,
    centroids: Vec<Option<Vec<f32>>>,
}

impl TryFrom<StoredModel> for RadialProfileClassifier {
    type Error = SmoothFlowError;

    fn try_from(raw: StoredModel) -> Result<Self> {
        if raw.bins == 0 {
            return Err(SmoothFlowError::invalid("bins", raw.bins, ">= 1"));
        }
        if !(raw.max_radius.is_finite() && raw.max_radius > 0.0) {
            return Err(SmoothFlowError::invalid(
                "max_radius",
                raw.max_radius,
                "finite and > 0",
            ));
        }
        if raw.centroids.is_empty() {
            return Err(SmoothFlowError::invalid("centroids", 0, "at least one class"));
        }
        for (class, centroid) in raw.centroids.iter().enumerate() {
            if let Some(c) = centroid {
                if c.len() != raw.bins {
                    return Err(SmoothFlowError::dimension_mismatch(
                        &format!("centroid {class}"),
                        raw.bins,
                        c.len(),
                    ));
                }
            }
        }
        Ok(Self {
            bins: raw.bins,
            max_radius: raw.max_radius,
            centroids: raw.centroids,
        })
    }
}

impl RadialProfileClassifier {
    /// Fit class centroids from labeled clouds.
    ///
    /// # Errors
    ///
    /// Returns an error if `bins` or `num_classes` is zero, `data` is empty,
    /// or a label is out of range.
    pub fn fit(data: &[LabeledCloud], num_classes: usize, bins: usize) -> Result<Self> {
        if bins == 0 {
            return Err(SmoothFlowError::invalid("bins", bins, ">= 1"));
        }
        if num_classes == 0 {
            return Err(SmoothFlowError::invalid("num_classes", num_classes, ">= 1"));
        }
        if data.is_empty() {
            return Err(SmoothFlowError::Other(
                "cannot fit on an empty dataset".to_string(),
            ));
        }
        if let Some(bad) = data.iter().find(|d| d.label >= num_classes) {
            return Err(SmoothFlowError::invalid(
                "label",
                bad.label,
                &format!("< num_classes ({num_classes})"),
            ));
        }

        let max_radius = data
            .iter()
            .flat_map(|d| radial_distances(&d.cloud))
            .fold(0.0_f64, f64::max);
        let max_radius = if max_radius > 0.0 { max_radius } else { 1.0 };

        let mut model = Self {
            bins,
            max_radius,
            centroids: vec![None; num_classes],
        };

        let mut sums = vec![vec![0.0_f64; bins]; num_classes];
        let mut counts = vec![0usize; num_classes];
        for d in data {
            for (acc, v) in sums[d.label].iter_mut().zip(model.profile(&d.cloud)) {
                *acc += f64::from(v);
            }
            counts[d.label] += 1;
        }
        for (class, (sum, count)) in sums.into_iter().zip(counts).enumerate() {
            if count > 0 {
                model.centroids[class] =
                    Some(sum.into_iter().map(|v| (v / count as f64) as f32).collect());
            }
        }
        Ok(model)
    }

    /// Number of histogram bins.
    #[must_use]
    pub fn bins(&self) -> usize {
        self.bins
    }

    /// Normalized radial histogram of `cloud`.
    #[must_use]
    pub fn profile(&self, cloud: &PointCloud) -> Vec<f32> {
        let mut hist = vec![0.0_f32; self.bins];
        if cloud.is_empty() {
            return hist;
        }
        let weight = 1.0 / cloud.len() as f32;
        for d in radial_distances(cloud) {
            let bin = ((d / self.max_radius) * self.bins as f64) as usize;
            hist[bin.min(self.bins - 1)] += weight;
        }
        hist
    }

    /// Negative squared distance from the cloud's profile to each class centroid.
    #[must_use]
    pub fn scores(&self, cloud: &PointCloud) -> Vec<f32> {
        let profile = self.profile(cloud);
        self.centroids
            .iter()
            .map(|c| match c {
                Some(centroid) => -centroid
                    .iter()
                    .zip(&profile)
                    .map(|(a, b)| (a - b) * (a - b))
                    .sum::<f32>(),
                None => f32::NEG_INFINITY,
            })
            .collect()
    }

    /// Hard prediction for one cloud.
    #[must_use]
    pub fn predict(&self, cloud: &PointCloud) -> usize {
        super::argmax(&self.scores(cloud)).unwrap_or(0)
    }

    /// Save the model as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error on I/O or serialization failure.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load a model saved with [`save`](Self::save).
    ///
    /// # Errors
    ///
    /// Returns an error on I/O or deserialization failure, or if the stored
    /// model has no bins, no classes, or a centroid of the wrong length.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }
}

fn radial_distances(cloud: &PointCloud) -> impl Iterator<Item = f64> + '_ {
    let c = cloud.centroid();
    cloud.points().iter().map(move |p| {
        let d = [p[0] - c[0], p[1] - c[1], p[2] - c[2]];
        (d[0] * d[0] + d[1] * d[1] + d[2] * d[2]).sqrt()
    })
}

impl PointCloudClassifier for RadialProfileClassifier {
    fn num_classes(&self) -> usize {
        self.centroids.len()
    }

    fn predict_batch(&self, batch: &[PointCloud]) -> std::result::Result<Vec<Vec<f32>>, BoxError> {
        Ok(batch.iter().map(|c| self.scores(c)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::perturbation::Perturbation;

    fn ring(radius: f64, n: usize) -> PointCloud {
        PointCloud::new(
            (0..n)
                .map(|i| {
                    let t = i as f64 / n as f64 * std::f64::consts::TAU;
                    [radius * t.cos(), radius * t.sin(), 0.0]
                })
                .collect(),
        )
    }

    fn dataset() -> Vec<LabeledCloud> {
        vec![
            LabeledCloud::new(ring(0.2, 32), 0),
            LabeledCloud::new(ring(0.25, 32), 0),
            LabeledCloud::new(ring(0.9, 32), 1),
            LabeledCloud::new(ring(1.0, 32), 1),
        ]
    }

    #[test]
    fn test_fit_and_predict() {
        let model = RadialProfileClassifier::fit(&dataset(), 2, 10).expect("valid data");
        assert_eq!(model.num_classes(), 2);
        assert_eq!(model.predict(&ring(0.22, 16)), 0);
        assert_eq!(model.predict(&ring(0.95, 16)), 1);
    }

    #[test]
    fn test_profile_sums_to_one() {
        let model = RadialProfileClassifier::fit(&dataset(), 2, 10).expect("valid data");
        let total: f32 = model.profile(&ring(0.5, 20)).iter().sum();
        assert!((total - 1.0).abs() < 1e-5);
        assert!(model.profile(&PointCloud::new(vec![])).iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_rotation_does_not_change_scores() {
        let model = RadialProfileClassifier::fit(&dataset(), 2, 10).expect("valid data");
        let cloud = ring(0.85, 24);
        let rotated = Perturbation::RotationXYZ
            .apply(&cloud, &[0.4, 1.3, -2.2])
            .expect("3 angles");
        let a = model.scores(&cloud);
        let b = model.scores(&rotated);
        for (x, y) in a.iter().zip(&b) {
            assert!((x - y).abs() < 1e-5);
        }
    }

    #[test]
    fn test_missing_class_never_wins() {
        let model = RadialProfileClassifier::fit(&dataset(), 3, 10).expect("valid data");
        let scores = model.scores(&ring(0.5, 8));
        assert_eq!(scores[2], f32::NEG_INFINITY);
    }

    #[test]
    fn test_fit_rejects_bad_input() {
        assert!(RadialProfileClassifier::fit(&dataset(), 2, 0).is_err());
        assert!(RadialProfileClassifier::fit(&[], 2, 4).is_err());
        assert!(RadialProfileClassifier::fit(&dataset(), 1, 4).is_err());
    }

    #[test]
    fn test_save_load_json() {
        let model = RadialProfileClassifier::fit(&dataset(), 2, 6).expect("valid data");
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("model.json");
        model.save(&path).expect("save");
        let back = RadialProfileClassifier::load(&path).expect("load");
        assert_eq!(back, model);
    }

    #[test]
    fn test_deserialize_rejects_zero_bins() {
        let json = r#"{"bins":0,"max_radius":1.0,"centroids":[[]]}"#;
        let err = serde_json::from_str::<RadialProfileClassifier>(json).unwrap_err();
        assert!(err.to_string().contains("bins"), "{err}");
    }

    #[test]
    fn test_deserialize_rejects_wrong_length_centroid() {
        let json = r#"{"bins":4,"max_radius":1.0,"centroids":[[0.25,0.25,0.25,0.25],[1.0,0.0]]}"#;
        assert!(serde_json::from_str::<RadialProfileClassifier>(json).is_err());
    }

    #[test]
    fn test_deserialize_rejects_bad_radius_and_no_classes() {
        for json in [
            r#"{"bins":2,"max_radius":0.0,"centroids":[[0.5,0.5]]}"#,
            r#"{"bins":2,"max_radius":1.0,"centroids":[]}"#,
        ] {
            assert!(serde_json::from_str::<RadialProfileClassifier>(json).is_err(), "{json}");
        }
    }

    #[test]
    fn test_load_malformed_file_is_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("model.json");
        std::fs::write(&path, r#"{"bins":0,"max_radius":1.0,"centroids":[null]}"#).expect("write");
        assert!(RadialProfileClassifier::load(&path).is_err());
    }

    #[test]
    fn test_deserialize_accepts_missing_class() {
        let json = r#"{"bins":2,"max_radius":1.0,"centroids":[[0.5,0.5],null]}"#;
        let model: RadialProfileClassifier = serde_json::from_str(json).expect("valid model");
        assert_eq!(model.num_classes(), 2);
        assert_eq!(model.scores(&PointCloud::new(vec![[0.0; 3]]))[1], f32::NEG_INFINITY);
    }
}
