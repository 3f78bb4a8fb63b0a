//! Perturbation kinds and their noise specification.
//!
//! [`Perturbation`] is a closed set. Each kind knows how many parameters it
//! draws, how to apply a parameter vector to a cloud, and in which metric its
//! certified radius is expressed. A zero parameter vector is always the
//! identity.

pub mod transforms;

use crate::error::{Result, SmoothFlowError};
use crate::point_cloud::PointCloud;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;
use transforms::{
    affine_point, identity_plus, mat_mul, rotation_x, rotation_y, rotation_z, IDENTITY,
};

/// Parametrized perturbation family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Perturbation {
    /// Rotation about x by one angle
    RotationX,
    /// Rotation about y by one angle
    RotationY,
    /// Rotation about z by one angle
    RotationZ,
    /// Rotation about x then z
    RotationXZ,
    /// Rotation about x, then y, then z
    RotationXYZ,
    /// Rigid translation
    Translation,
    /// Shear of x and y along z
    Shearing,
    /// Height-dependent scaling of the xy-plane
    Tapering,
    /// Height-dependent rotation about z
    Twisting,
    /// Area-preserving squeeze of the xy-plane
    Squeezing,
    /// Scaling along z
    Stretching,
    /// Independent per-coordinate noise
    GaussianNoise,
    /// General affine map with translation
    Affine,
    /// General linear map
    AffineNoTranslation,
}

impl Perturbation {
    /// Every kind, in declaration order.
    pub const ALL: [Perturbation; 14] = [
        Self::RotationX,
        Self::RotationY,
        Self::RotationZ,
        Self::RotationXZ,
        Self::RotationXYZ,
        Self::Translation,
        Self::Shearing,
        Self::Tapering,
        Self::Twisting,
        Self::Squeezing,
        Self::Stretching,
        Self::GaussianNoise,
        Self::Affine,
        Self::AffineNoTranslation,
    ];

    /// Canonical name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::RotationX => "RotationX",
            Self::RotationY => "RotationY",
            Self::RotationZ => "RotationZ",
            Self::RotationXZ => "RotationXZ",
            Self::RotationXYZ => "RotationXYZ",
            Self::Translation => "Translation",
            Self::Shearing => "Shearing",
            Self::Tapering => "Tapering",
            Self::Twisting => "Twisting",
            Self::Squeezing => "Squeezing",
            Self::Stretching => "Stretching",
            Self::GaussianNoise => "GaussianNoise",
            Self::Affine => "Affine",
            Self::AffineNoTranslation => "AffineNoTranslation",
        }
    }

    /// Rotation kinds measure sigma in half-turns (`sigma = 1` spans ±π).
    #[must_use]
    pub fn is_rotation(self) -> bool {
        matches!(
            self,
            Self::RotationX
                | Self::RotationY
                | Self::RotationZ
                | Self::RotationXZ
                | Self::RotationXYZ
        )
    }

    /// Number of random parameters drawn per sample for a cloud of
    /// `n_points` points.
    #[must_use]
    pub fn parameter_count(self, n_points: usize) -> usize {
        match self {
            Self::RotationX | Self::RotationY | Self::RotationZ => 1,
            Self::Twisting | Self::Squeezing | Self::Stretching => 1,
            Self::RotationXZ | Self::Shearing | Self::Tapering => 2,
            Self::RotationXYZ | Self::Translation => 3,
            Self::AffineNoTranslation => 9,
            Self::Affine => 12,
            Self::GaussianNoise => 3 * n_points,
        }
    }

    /// Unit of the certified radius.
    #[must_use]
    pub fn radius_unit(self) -> &'static str {
        match self {
            k if k.is_rotation() => "radians",
            Self::Translation | Self::GaussianNoise => "coordinate units",
            Self::Twisting => "radians per unit height",
            Self::Squeezing | Self::Stretching => "log-scale",
            _ => "deformation parameter",
        }
    }

    /// Directory name under `output/samples/` for emitted samples.
    #[must_use]
    pub fn sample_dir(self) -> &'static str {
        match self {
            k if k.is_rotation() => "rotation",
            Self::Translation => "translation",
            Self::Shearing => "shearing",
            Self::Tapering => "tapering",
            Self::Twisting => "twisting",
            Self::Squeezing => "squeezing",
            Self::Stretching => "stretching",
            Self::GaussianNoise => "gaussianNoise",
            Self::Affine => "affine",
            _ => "affineNoTranslation",
        }
    }

    /// Apply a drawn parameter vector to `cloud`.
    ///
    /// # Errors
    ///
    /// Returns `DimensionMismatch` if `theta` does not have
    /// [`parameter_count`](Self::parameter_count) entries.
    pub fn apply(self, cloud: &PointCloud, theta: &[f64]) -> Result<PointCloud> {
        let expected = self.parameter_count(cloud.len());
        if theta.len() != expected {
            return Err(SmoothFlowError::dimension_mismatch(
                self.as_str(),
                expected,
                theta.len(),
            ));
        }
        Ok(self.apply_unchecked(cloud, theta))
    }

    /// [`apply`](Self::apply) for a `theta` already sized by
    /// [`parameter_count`](Self::parameter_count).
    pub(crate) fn apply_unchecked(self, cloud: &PointCloud, theta: &[f64]) -> PointCloud {
        debug_assert_eq!(theta.len(), self.parameter_count(cloud.len()));
        match self {
            Self::RotationX => linear(cloud, &rotation_x(theta[0])),
            Self::RotationY => linear(cloud, &rotation_y(theta[0])),
            Self::RotationZ => linear(cloud, &rotation_z(theta[0])),
            Self::RotationXZ => {
                linear(cloud, &mat_mul(&rotation_z(theta[1]), &rotation_x(theta[0])))
            }
            Self::RotationXYZ => {
                let m = mat_mul(
                    &rotation_z(theta[2]),
                    &mat_mul(&rotation_y(theta[1]), &rotation_x(theta[0])),
                );
                linear(cloud, &m)
            }
            Self::Translation => {
                let t = [theta[0], theta[1], theta[2]];
                cloud.map_points(|p| affine_point(&IDENTITY, &t, p))
            }
            Self::Shearing => cloud.map_points(|p| transforms::shear(p, theta[0], theta[1])),
            Self::Tapering => cloud.map_points(|p| transforms::taper(p, theta[0], theta[1])),
            Self::Twisting => cloud.map_points(|p| transforms::twist(p, theta[0])),
            Self::Squeezing => cloud.map_points(|p| transforms::squeeze(p, theta[0])),
            Self::Stretching => cloud.map_points(|p| transforms::stretch(p, theta[0])),
            Self::GaussianNoise => {
                let mut offsets = theta.chunks_exact(3);
                cloud.map_points(|p| match offsets.next() {
                    Some(e) => [p[0] + e[0], p[1] + e[1], p[2] + e[2]],
                    None => *p,
                })
            }
            Self::AffineNoTranslation => linear(cloud, &identity_plus(theta)),
            Self::Affine => {
                let m = identity_plus(&theta[..9]);
                let t = [theta[9], theta[10], theta[11]];
                cloud.map_points(|p| affine_point(&m, &t, p))
            }
        }
    }
}

fn linear(cloud: &PointCloud, m: &transforms::Mat3) -> PointCloud {
    let zero = [0.0; 3];
    cloud.map_points(|p| affine_point(m, &zero, p))
}

impl fmt::Display for Perturbation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Perturbation {
    type Err = SmoothFlowError;

    /// Exact, case-insensitive match on the full kind name.
    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|k| k.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| SmoothFlowError::UnknownPerturbation {
                name: s.to_string(),
            })
    }
}

/// Distribution the perturbation parameters are drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NoiseDistribution {
    /// Zero-mean normal with standard deviation `scale`
    #[default]
    Gaussian,
    /// Uniform on `[-scale, scale]`
    Uniform,
}

/// A perturbation kind with a validated noise level.
///
/// For rotation kinds `sigma` is expressed in half-turns, clamped to 1, and
/// the angular [`scale`](Self::scale) is `sigma * π` radians.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerturbationSpec {
    kind: Perturbation,
    sigma: f64,
    sigma_clamped: bool,
}

impl PerturbationSpec {
    /// Validate `sigma` for `kind`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidHyperparameter` unless `sigma` is finite and positive.
    pub fn new(kind: Perturbation, sigma: f64) -> Result<Self> {
        if !sigma.is_finite() || sigma <= 0.0 {
            return Err(SmoothFlowError::invalid("sigma", sigma, "finite and > 0"));
        }
        let mut spec = Self {
            kind,
            sigma,
            sigma_clamped: false,
        };
        if kind.is_rotation() && sigma > 1.0 {
            tracing::warn!(
                kind = %kind,
                requested = sigma,
                "sigma above 1 is redundant for rotations (1 spans ±π radians), using sigma = 1"
            );
            spec.sigma = 1.0;
            spec.sigma_clamped = true;
        }
        Ok(spec)
    }

    /// Perturbation kind.
    #[must_use]
    pub fn kind(&self) -> Perturbation {
        self.kind
    }

    /// Noise level after clamping.
    #[must_use]
    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    /// True if the requested sigma was clamped to 1 for a rotation kind.
    #[must_use]
    pub fn sigma_clamped(&self) -> bool {
        self.sigma_clamped
    }

    /// Noise scale in the kind's native metric (radians for rotations).
    #[must_use]
    pub fn scale(&self) -> f64 {
        if self.kind.is_rotation() {
            self.sigma * PI
        } else {
            self.sigma
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tetra() -> PointCloud {
        PointCloud::new(vec![
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.0, 0.0, 1.0],
            [-0.5, -0.5, -0.5],
        ])
    }

    #[test]
    fn test_parse_exact_names() {
        for kind in Perturbation::ALL {
            assert_eq!(kind.as_str().parse::<Perturbation>().ok(), Some(kind));
        }
        assert_eq!(
            "rotationxyz".parse::<Perturbation>().ok(),
            Some(Perturbation::RotationXYZ)
        );
    }

    #[test]
    fn test_parse_rejects_prefixes() {
        // "Rotation" alone must not fall through to some rotation kind.
        for name in ["Rotation", "RotationW", "Shear", "", "Affine2"] {
            let err = name.parse::<Perturbation>().unwrap_err();
            assert!(matches!(err, SmoothFlowError::UnknownPerturbation { .. }));
        }
    }

    #[test]
    fn test_zero_parameters_identity_for_every_kind() {
        let cloud = tetra();
        for kind in Perturbation::ALL {
            let theta = vec![0.0; kind.parameter_count(cloud.len())];
            let out = kind.apply(&cloud, &theta).expect("correct parameter count");
            assert!(out.max_abs_diff(&cloud) < 1e-12, "{kind} is not identity at 0");
        }
    }

    #[test]
    fn test_apply_checks_parameter_count() {
        let err = Perturbation::Shearing.apply(&tetra(), &[0.1]).unwrap_err();
        assert!(matches!(err, SmoothFlowError::DimensionMismatch { .. }));
    }

    #[test]
    fn test_rotation_preserves_norms() {
        let cloud = tetra();
        let out = Perturbation::RotationXYZ
            .apply(&cloud, &[0.3, -1.1, 2.0])
            .expect("3 angles");
        for (a, b) in cloud.points().iter().zip(out.points()) {
            let na = a.iter().map(|v| v * v).sum::<f64>().sqrt();
            let nb = b.iter().map(|v| v * v).sum::<f64>().sqrt();
            assert!((na - nb).abs() < 1e-12);
        }
    }

    #[test]
    fn test_affine_translation_component() {
        let cloud = tetra();
        let mut theta = vec![0.0; 12];
        theta[9] = 1.0;
        theta[11] = -2.0;
        let out = Perturbation::Affine.apply(&cloud, &theta).expect("12 params");
        assert!((out.points()[0][0] - 2.0).abs() < 1e-12);
        assert!((out.points()[0][2] + 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_spec_rejects_nonpositive_sigma() {
        for sigma in [0.0, -0.1, f64::NAN, f64::INFINITY] {
            let err = PerturbationSpec::new(Perturbation::Translation, sigma).unwrap_err();
            assert!(err.is_configuration());
        }
    }

    #[test]
    fn test_rotation_sigma_clamped_and_scaled() {
        let spec = PerturbationSpec::new(Perturbation::RotationZ, 2.5).expect("valid");
        assert!(spec.sigma_clamped());
        assert_eq!(spec.sigma(), 1.0);
        assert!((spec.scale() - PI).abs() < 1e-12);

        let spec = PerturbationSpec::new(Perturbation::RotationZ, 0.5).expect("valid");
        assert!(!spec.sigma_clamped());
        assert!((spec.scale() - 0.5 * PI).abs() < 1e-12);
    }

    #[test]
    fn test_non_rotation_sigma_not_clamped() {
        let spec = PerturbationSpec::new(Perturbation::Translation, 2.5).expect("valid");
        assert!(!spec.sigma_clamped());
        assert_eq!(spec.scale(), 2.5);
    }

    #[test]
    fn test_sample_dirs() {
        assert_eq!(Perturbation::RotationXZ.sample_dir(), "rotation");
        assert_eq!(Perturbation::GaussianNoise.sample_dir(), "gaussianNoise");
        assert_eq!(
            Perturbation::AffineNoTranslation.sample_dir(),
            "affineNoTranslation"
        );
    }
}
