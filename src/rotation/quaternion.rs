//! Quaternion value type with Hamilton-product algebra.
//!
//! `Quaternion` is a plain value: no operation mutates in place and nothing
//! canonicalizes behind your back. Since q and −q encode the same rotation,
//! [`Quaternion::canonicalize`] picks the representative whose first nonzero
//! component is positive; comparisons that should treat q ≡ −q go through
//! [`Quaternion::approx_eq`], which canonicalizes both sides first.

use rkyv::{Archive, Deserialize, Serialize};

use crate::reciprocal::acos_clamped;
use crate::{Matrix3, Vector3};

#[derive(Debug, Clone, Copy, PartialEq, Archive, Serialize, Deserialize)]
pub struct Quaternion {
    pub w: f64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Quaternion {
    pub fn new(w: f64, x: f64, y: f64, z: f64) -> Self {
        Self { w, x, y, z }
    }

    pub fn identity() -> Self {
        Self::new(1.0, 0.0, 0.0, 0.0)
    }

    /// Rotation of `angle` radians about `axis` (normalized internally).
    pub fn from_axis_angle(axis: Vector3, angle: f64) -> Self {
        let axis = axis.normalize();
        let (sin, cos) = (0.5 * angle).sin_cos();
        Self::new(cos, axis.x * sin, axis.y * sin, axis.z * sin)
    }

    /// A pure (scalar-free) quaternion wrapping a vector.
    pub fn pure(v: Vector3) -> Self {
        Self::new(0.0, v.x, v.y, v.z)
    }

    /// The vector part.
    pub fn vector(&self) -> Vector3 {
        Vector3::new(self.x, self.y, self.z)
    }

    pub fn conjugate(&self) -> Self {
        Self::new(self.w, -self.x, -self.y, -self.z)
    }

    pub fn norm(&self) -> f64 {
        self.dot(self).sqrt()
    }

    pub fn normalize(&self) -> Self {
        let n = self.norm();
        Self::new(self.w / n, self.x / n, self.y / n, self.z / n)
    }

    /// Four-component dot product.
    pub fn dot(&self, other: &Self) -> f64 {
        self.w * other.w + self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// The representative of {q, −q} whose first nonzero component is
    /// positive.
    pub fn canonicalize(&self) -> Self {
        let first = [self.w, self.x, self.y, self.z]
            .into_iter()
            .find(|c| c.abs() > 1e-12)
            .unwrap_or(0.0);
        if first < 0.0 {
            Self::new(-self.w, -self.x, -self.y, -self.z)
        } else {
            *self
        }
    }

    /// Component-wise equality within `tolerance`, after canonicalizing
    /// both sides (so q and −q compare equal).
    pub fn approx_eq(&self, other: &Self, tolerance: f64) -> bool {
        let a = self.canonicalize();
        let b = other.canonicalize();
        (a.w - b.w).abs() < tolerance
            && (a.x - b.x).abs() < tolerance
            && (a.y - b.y).abs() < tolerance
            && (a.z - b.z).abs() < tolerance
    }

    /// Apply the rotation to a vector: q·v·q⁻¹.
    pub fn rotate_vector(&self, v: Vector3) -> Vector3 {
        let q = self.normalize();
        (q * Self::pure(v) * q.conjugate()).vector()
    }

    /// The special-orthogonal matrix of this rotation.
    pub fn to_matrix(&self) -> Matrix3 {
        let q = self.normalize();
        let (w, x, y, z) = (q.w, q.x, q.y, q.z);
        let m = Matrix3::new(
            1.0 - 2.0 * y * y - 2.0 * z * z,
            2.0 * x * y - 2.0 * z * w,
            2.0 * x * z + 2.0 * y * w,
            2.0 * x * y + 2.0 * z * w,
            1.0 - 2.0 * x * x - 2.0 * z * z,
            2.0 * y * z - 2.0 * x * w,
            2.0 * x * z - 2.0 * y * w,
            2.0 * y * z + 2.0 * x * w,
            1.0 - 2.0 * x * x - 2.0 * y * y,
        );
        debug_assert!(
            (m.determinant() - 1.0).abs() < 1e-9,
            "rotation matrix is not special orthogonal"
        );
        m
    }

    /// Recover a quaternion from a special-orthogonal matrix.
    ///
    /// Uses `w = 0.5·sqrt(1 + tr)` when the trace term is well away from
    /// zero; otherwise falls back to extracting the dominant axis component
    /// from the diagonal, with the signs of the remaining components
    /// recovered from the off-diagonal terms.
    pub fn from_matrix(m: &Matrix3) -> Self {
        let trace = 1.0 + m[(0, 0)] + m[(1, 1)] + m[(2, 2)];

        let q = if trace > 1e-8 {
            let s = 0.5 / trace.sqrt();
            Self::new(
                0.25 / s,
                (m[(2, 1)] - m[(1, 2)]) * s,
                (m[(0, 2)] - m[(2, 0)]) * s,
                (m[(1, 0)] - m[(0, 1)]) * s,
            )
        } else if m[(0, 0)] > m[(1, 1)] && m[(0, 0)] > m[(2, 2)] {
            let s = (1.0 + m[(0, 0)] - m[(1, 1)] - m[(2, 2)]).sqrt() * 2.0;
            Self::new(
                (m[(2, 1)] - m[(1, 2)]) / s,
                0.25 * s,
                (m[(0, 1)] + m[(1, 0)]) / s,
                (m[(0, 2)] + m[(2, 0)]) / s,
            )
        } else if m[(1, 1)] > m[(2, 2)] {
            let s = (1.0 + m[(1, 1)] - m[(0, 0)] - m[(2, 2)]).sqrt() * 2.0;
            Self::new(
                (m[(0, 2)] - m[(2, 0)]) / s,
                (m[(0, 1)] + m[(1, 0)]) / s,
                0.25 * s,
                (m[(1, 2)] + m[(2, 1)]) / s,
            )
        } else {
            let s = (1.0 + m[(2, 2)] - m[(0, 0)] - m[(1, 1)]).sqrt() * 2.0;
            Self::new(
                (m[(1, 0)] - m[(0, 1)]) / s,
                (m[(0, 2)] + m[(2, 0)]) / s,
                (m[(1, 2)] + m[(2, 1)]) / s,
                0.25 * s,
            )
        };
        q.normalize()
    }

    /// Axis-angle form (φ, n̂) of the rotation.
    pub fn to_axis_angle(&self) -> (f64, Vector3) {
        let q = self.normalize();
        let angle = 2.0 * acos_clamped(q.w);
        let denominator = (1.0 - q.w * q.w).sqrt();
        if denominator < 1e-12 {
            (angle, Vector3::new(q.x, q.y, q.z))
        } else {
            (angle, q.vector() / denominator)
        }
    }

    /// Bunge Euler angles of this rotation.
    pub fn to_euler_angles(&self) -> super::EulerAngles {
        super::EulerAngles::from_quaternion(self)
    }
}

impl std::ops::Mul for Quaternion {
    type Output = Quaternion;

    /// Hamilton product (non-commutative).
    fn mul(self, other: Quaternion) -> Quaternion {
        Quaternion::new(
            self.w * other.w - self.x * other.x - self.y * other.y - self.z * other.z,
            self.w * other.x + other.w * self.x + self.y * other.z - self.z * other.y,
            self.w * other.y + other.w * self.y + self.z * other.x - self.x * other.z,
            self.w * other.z + other.w * self.z + self.x * other.y - self.y * other.x,
        )
    }
}

/// Apply a list of rotations to `q_in` in order: q_i · q · q_i⁻¹.
///
/// Quaternion conjugation is non-commutative, so the list order matters and
/// is preserved.
pub fn rotate(q_in: Quaternion, rotations: &[Quaternion]) -> Quaternion {
    let mut out = q_in;
    for q in rotations {
        out = *q * out * q.conjugate();
    }
    out
}

/// Misorientation angle between two unit quaternions:
/// `2·acos(|q1·q2|)`, in [0, π].
pub fn misorientation(q1: &Quaternion, q2: &Quaternion) -> f64 {
    2.0 * acos_clamped(q1.dot(q2).abs())
}
