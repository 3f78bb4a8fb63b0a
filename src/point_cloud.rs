//! Point-cloud input type.
//!
//! A [`PointCloud`] is an ordered list of 3D coordinates with optional
//! per-point feature rows. Perturbations only ever touch the coordinates;
//! features ride along unchanged.

use crate::error::{Result, SmoothFlowError};
use serde::{Deserialize, Serialize};

/// A single 3D point.
pub type Point3 = [f64; 3];

/// Ordered point coordinates plus optional per-point features.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointCloud {
    points: Vec<Point3>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    features: Option<PointFeatures>,
}

/// Row-major per-point feature matrix (`n_points x dim`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointFeatures {
    /// Features per point
    pub dim: usize,
    /// Flattened values, `dim` per point
    pub values: Vec<f32>,
}

impl PointCloud {
    /// Create a point cloud from coordinates only.
    #[must_use]
    pub fn new(points: Vec<Point3>) -> Self {
        Self {
            points,
            features: None,
        }
    }

    /// Attach per-point features.
    ///
    /// # Errors
    ///
    /// Returns `DimensionMismatch` if `values.len() != len() * dim`.
    pub fn with_features(mut self, dim: usize, values: Vec<f32>) -> Result<Self> {
        let expected = self.points.len() * dim;
        if values.len() != expected {
            return Err(SmoothFlowError::dimension_mismatch(
                "n_points*feature_dim",
                expected,
                values.len(),
            ));
        }
        self.features = Some(PointFeatures { dim, values });
        Ok(self)
    }

    /// Number of points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// True if the cloud has no points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Point coordinates.
    #[must_use]
    pub fn points(&self) -> &[Point3] {
        &self.points
    }

    /// Per-point features, if any.
    #[must_use]
    pub fn features(&self) -> Option<&PointFeatures> {
        self.features.as_ref()
    }

    /// Mean of all points (origin for an empty cloud).
    #[must_use]
    pub fn centroid(&self) -> Point3 {
        if self.points.is_empty() {
            return [0.0; 3];
        }
        let n = self.points.len() as f64;
        let mut c = [0.0; 3];
        for p in &self.points {
            for (acc, v) in c.iter_mut().zip(p) {
                *acc += v;
            }
        }
        c.map(|v| v / n)
    }

    /// Apply `f` to every point, keeping features and point order.
    #[must_use]
    pub fn map_points<F>(&self, mut f: F) -> Self
    where
        F: FnMut(&Point3) -> Point3,
    {
        Self {
            points: self.points.iter().map(&mut f).collect(),
            features: self.features.clone(),
        }
    }

    /// Largest absolute coordinate difference to `other`.
    ///
    /// Returns `f64::INFINITY` when the point counts differ.
    #[must_use]
    pub fn max_abs_diff(&self, other: &Self) -> f64 {
        if self.len() != other.len() {
            return f64::INFINITY;
        }
        self.points
            .iter()
            .zip(&other.points)
            .flat_map(|(a, b)| a.iter().zip(b).map(|(x, y)| (x - y).abs()))
            .fold(0.0, f64::max)
    }
}

impl From<Vec<Point3>> for PointCloud {
    fn from(points: Vec<Point3>) -> Self {
        Self::new(points)
    }
}

/// A point cloud together with its ground-truth class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledCloud {
    /// Input coordinates
    pub cloud: PointCloud,
    /// Ground-truth class index
    pub label: usize,
}

impl LabeledCloud {
    /// Pair a cloud with its label.
    #[must_use]
    pub fn new(cloud: PointCloud, label: usize) -> Self {
        Self { cloud, label }
    }
}
