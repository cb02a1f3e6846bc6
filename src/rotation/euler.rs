//! Bunge-convention Euler angles.
//!
//! The rotation is `R(φ2·ẑ) · R(Φ·x̂) · R(φ1·ẑ)`, applied φ1 → Φ → φ2,
//! which is the convention of texture analysis and EBSD mapping software.
//!
//! The quaternion↔Euler conversions handle the gimbal-locked orientations
//! explicitly: at Φ ≈ 0 only φ1 + φ2 is defined and at Φ ≈ π only φ1 − φ2;
//! in both cases the recoverable sum/difference is reported in φ1 with
//! φ2 = 0.

use super::Quaternion;

const GIMBAL_EPS: f64 = 1e-7;
const TAU: f64 = 2.0 * std::f64::consts::PI;

/// Bunge Euler angle triple (radians).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EulerAngles {
    pub phi1: f64,
    pub phi: f64,
    pub phi2: f64,
}

impl EulerAngles {
    pub fn new(phi1: f64, phi: f64, phi2: f64) -> Self {
        Self { phi1, phi, phi2 }
    }

    pub fn from_degrees(phi1: f64, phi: f64, phi2: f64) -> Self {
        Self::new(phi1.to_radians(), phi.to_radians(), phi2.to_radians())
    }

    pub fn to_degrees(&self) -> (f64, f64, f64) {
        (
            self.phi1.to_degrees(),
            self.phi.to_degrees(),
            self.phi2.to_degrees(),
        )
    }

    /// The quaternion of `R(φ2·ẑ)·R(Φ·x̂)·R(φ1·ẑ)`.
    pub fn to_quaternion(&self) -> Quaternion {
        let (s1, c1) = (0.5 * self.phi1).sin_cos();
        let (s2, c2) = (0.5 * self.phi).sin_cos();
        let (s3, c3) = (0.5 * self.phi2).sin_cos();

        Quaternion::new(
            c1 * c2 * c3 - s1 * c2 * s3,
            c1 * s2 * c3 + s1 * s2 * s3,
            c1 * s2 * s3 - s1 * s2 * c3,
            c1 * c2 * s3 + s1 * c2 * c3,
        )
    }

    /// Recover Bunge angles from a (not necessarily unit) quaternion.
    pub fn from_quaternion(q: &Quaternion) -> Self {
        let q = q.normalize();

        // x² + y² = sin²(Φ/2) and w² + z² = cos²(Φ/2); the half sum and
        // half difference of φ1 and φ2 live in the (w, z) and (x, y)
        // planes respectively.
        let sin_half = (q.x * q.x + q.y * q.y).sqrt();
        let cos_half = (q.w * q.w + q.z * q.z).sqrt();
        let phi = 2.0 * sin_half.atan2(cos_half);

        if sin_half < GIMBAL_EPS {
            // Φ ≈ 0: only φ1 + φ2 is recoverable
            let sum = 2.0 * q.z.atan2(q.w);
            Self::new(sum.rem_euclid(TAU), 0.0, 0.0)
        } else if cos_half < GIMBAL_EPS {
            // Φ ≈ π: only φ1 − φ2 is recoverable
            let difference = 2.0 * (-q.y).atan2(q.x);
            Self::new(difference.rem_euclid(TAU), std::f64::consts::PI, 0.0)
        } else {
            let half_sum = q.z.atan2(q.w);
            let half_difference = (-q.y).atan2(q.x);
            Self::new(
                (half_sum + half_difference).rem_euclid(TAU),
                phi,
                (half_sum - half_difference).rem_euclid(TAU),
            )
        }
    }
}
