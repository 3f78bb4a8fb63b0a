//! Deterministic geometric transforms.
//!
//! Every transform here is parametrized so that the all-zero parameter
//! vector is the identity map. The sampler draws the parameters; this
//! module only applies them.

use crate::point_cloud::Point3;

/// Row-major 3x3 matrix.
pub type Mat3 = [[f64; 3]; 3];

/// Identity matrix.
pub const IDENTITY: Mat3 = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];

/// Rotation about the x axis by `angle` radians.
#[must_use]
pub fn rotation_x(angle: f64) -> Mat3 {
    let (s, c) = angle.sin_cos();
    [[1.0, 0.0, 0.0], [0.0, c, -s], [0.0, s, c]]
}

/// Rotation about the y axis by `angle` radians.
#[must_use]
pub fn rotation_y(angle: f64) -> Mat3 {
    let (s, c) = angle.sin_cos();
    [[c, 0.0, s], [0.0, 1.0, 0.0], [-s, 0.0, c]]
}

/// Rotation about the z axis by `angle` radians.
#[must_use]
pub fn rotation_z(angle: f64) -> Mat3 {
    let (s, c) = angle.sin_cos();
    [[c, -s, 0.0], [s, c, 0.0], [0.0, 0.0, 1.0]]
}

/// Matrix product `a · b`.
#[must_use]
pub fn mat_mul(a: &Mat3, b: &Mat3) -> Mat3 {
    let mut out = [[0.0; 3]; 3];
    for (i, row) in out.iter_mut().enumerate() {
        for (j, cell) in row.iter_mut().enumerate() {
            *cell = (0..3).map(|k| a[i][k] * b[k][j]).sum();
        }
    }
    out
}

/// `m · p + t`.
#[must_use]
pub fn affine_point(m: &Mat3, t: &[f64; 3], p: &Point3) -> Point3 {
    let mut out = *t;
    for (i, o) in out.iter_mut().enumerate() {
        *o += m[i][0] * p[0] + m[i][1] * p[1] + m[i][2] * p[2];
    }
    out
}

/// `I + E` where `e` holds the nine entries of `E` row by row.
#[must_use]
pub fn identity_plus(e: &[f64]) -> Mat3 {
    let mut m = IDENTITY;
    for (k, v) in e.iter().take(9).enumerate() {
        m[k / 3][k % 3] += v;
    }
    m
}

/// Shear x and y proportionally to z: `(x + a z, y + b z, z)`.
#[must_use]
pub fn shear(p: &Point3, a: f64, b: f64) -> Point3 {
    [p[0] + a * p[2], p[1] + b * p[2], p[2]]
}

/// Taper the xy-plane along z with scale `½ a² z + b z + 1`.
#[must_use]
pub fn taper(p: &Point3, a: f64, b: f64) -> Point3 {
    let s = 0.5 * a * a * p[2] + b * p[2] + 1.0;
    [s * p[0], s * p[1], p[2]]
}

/// Twist about z: rotate `(x, y)` by the height-dependent angle `a · z`.
#[must_use]
pub fn twist(p: &Point3, a: f64) -> Point3 {
    let (s, c) = (a * p[2]).sin_cos();
    [c * p[0] - s * p[1], s * p[0] + c * p[1], p[2]]
}

/// Area-preserving squeeze of the xy-plane: `(eᵏ x, e⁻ᵏ y, z)`.
#[must_use]
pub fn squeeze(p: &Point3, k: f64) -> Point3 {
    let s = k.exp();
    [s * p[0], p[1] / s, p[2]]
}

/// Stretch along z: `(x, y, eᵏ z)`.
#[must_use]
pub fn stretch(p: &Point3, k: f64) -> Point3 {
    [p[0], p[1], k.exp() * p[2]]
}
