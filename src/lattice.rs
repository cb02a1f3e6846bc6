//! Unit-cell geometry: direct and reciprocal lattice parameters, cartesian
//! frames, and the atom basis decorating the cell.
//!
//! A [`Lattice`] is built once per material and is immutable afterwards; the
//! reflector catalog and all geometry functions read it concurrently without
//! locking. Reciprocal quantities are derived eagerly at construction:
//!
//! - reciprocal angles: `cos α* = (cos β cos γ − cos α) / (sin β sin γ)` (cyclic)
//! - cell volume: `V = abc · sin α* · sin β · sin γ`
//! - reciprocal lengths: `a* = bc · sin α / V` (cyclic)
//! - reciprocal volume: `V* = 1 / V`

use rkyv::{Archive, Deserialize, Serialize};
use thiserror::Error;

use crate::plane::Plane;
use crate::reciprocal::acos_clamped;
use crate::Vector3;

/// Rejected lattice parameters.
#[derive(Debug, Error, PartialEq)]
pub enum LatticeError {
    #[error("lattice lengths must be positive and finite (a={0}, b={1}, c={2})")]
    InvalidLength(f64, f64, f64),
    #[error("lattice angle {0} rad is outside (0, \u{3c0})")]
    AngleOutOfRange(f64),
    #[error("lattice angles are not geometrically consistent (|cos| = {0} > 1)")]
    InconsistentAngles(f64),
    #[error("computed cell volume is not positive ({0})")]
    NonPositiveVolume(f64),
}

/// Unit-cell parameters with derived reciprocal-cell geometry.
///
/// Lengths in angstroms, angles in radians.
#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
pub struct Lattice {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
    pub a_star: f64,
    pub b_star: f64,
    pub c_star: f64,
    pub alpha_star: f64,
    pub beta_star: f64,
    pub gamma_star: f64,
    pub volume: f64,
    pub volume_star: f64,
}

impl Lattice {
    /// Build a lattice from the six cell parameters, deriving the
    /// reciprocal basis and volumes.
    pub fn new(
        a: f64,
        b: f64,
        c: f64,
        alpha: f64,
        beta: f64,
        gamma: f64,
    ) -> Result<Self, LatticeError> {
        if !(a > 0.0 && b > 0.0 && c > 0.0)
            || !(a.is_finite() && b.is_finite() && c.is_finite())
        {
            return Err(LatticeError::InvalidLength(a, b, c));
        }
        for &angle in &[alpha, beta, gamma] {
            if !(angle > 0.0 && angle < std::f64::consts::PI) {
                return Err(LatticeError::AngleOutOfRange(angle));
            }
        }

        // Reciprocal angles. The arccos argument can only leave [-1, 1] by
        // round-off for a valid cell; a genuinely impossible angle triple
        // pushes it well outside and is rejected.
        let cos_alpha_star = (beta.cos() * gamma.cos() - alpha.cos()) / (beta.sin() * gamma.sin());
        let cos_beta_star = (alpha.cos() * gamma.cos() - beta.cos()) / (alpha.sin() * gamma.sin());
        let cos_gamma_star = (alpha.cos() * beta.cos() - gamma.cos()) / (alpha.sin() * beta.sin());
        for &cosine in &[cos_alpha_star, cos_beta_star, cos_gamma_star] {
            if cosine.abs() > 1.0 + 1e-9 {
                return Err(LatticeError::InconsistentAngles(cosine.abs()));
            }
        }
        let alpha_star = acos_clamped(cos_alpha_star);
        let beta_star = acos_clamped(cos_beta_star);
        let gamma_star = acos_clamped(cos_gamma_star);

        let volume = a * b * c * alpha_star.sin() * beta.sin() * gamma.sin();
        if !(volume > 0.0) {
            return Err(LatticeError::NonPositiveVolume(volume));
        }

        Ok(Self {
            a,
            b,
            c,
            alpha,
            beta,
            gamma,
            a_star: b * c * alpha.sin() / volume,
            b_star: a * c * beta.sin() / volume,
            c_star: a * b * gamma.sin() / volume,
            alpha_star,
            beta_star,
            gamma_star,
            volume,
            volume_star: 1.0 / volume,
        })
    }

    /// Cubic cell: a = b = c, all angles 90°.
    pub fn cubic(a: f64) -> Result<Self, LatticeError> {
        let half_pi = std::f64::consts::FRAC_PI_2;
        Self::new(a, a, a, half_pi, half_pi, half_pi)
    }

    /// Tetragonal cell: a = b, all angles 90°.
    pub fn tetragonal(a: f64, c: f64) -> Result<Self, LatticeError> {
        let half_pi = std::f64::consts::FRAC_PI_2;
        Self::new(a, a, c, half_pi, half_pi, half_pi)
    }

    /// Hexagonal cell: a = b, γ = 120°.
    pub fn hexagonal(a: f64, c: f64) -> Result<Self, LatticeError> {
        let half_pi = std::f64::consts::FRAC_PI_2;
        Self::new(a, a, c, half_pi, half_pi, 2.0 * std::f64::consts::FRAC_PI_3)
    }

    /// The direct basis vectors in the conventional cartesian setting:
    /// x along a, y in the a-b plane, z completing the right-handed frame.
    pub fn direct_basis(&self) -> [Vector3; 3] {
        let av = Vector3::new(self.a, 0.0, 0.0);
        let bv = Vector3::new(self.b * self.gamma.cos(), self.b * self.gamma.sin(), 0.0);
        let cx = self.c * self.beta.cos();
        let cy = self.c * (self.alpha.cos() - self.beta.cos() * self.gamma.cos())
            / self.gamma.sin();
        let cz = self.volume / (self.a * self.b * self.gamma.sin());
        [av, bv, Vector3::new(cx, cy, cz)]
    }

    /// The reciprocal basis vectors in the same cartesian setting:
    /// a* = (b × c)/V (cyclic).
    pub fn reciprocal_basis(&self) -> [Vector3; 3] {
        let [av, bv, cv] = self.direct_basis();
        [
            bv.cross(&cv) * self.volume_star,
            cv.cross(&av) * self.volume_star,
            av.cross(&bv) * self.volume_star,
        ]
    }

    /// Cartesian normal direction of a plane: h·a* + k·b* + l·c*.
    ///
    /// Unnormalized; its length is 1/d(hkl). For cubic cells this is
    /// parallel to (h, k, l).
    pub fn plane_normal(&self, plane: &Plane) -> Vector3 {
        let [asv, bsv, csv] = self.reciprocal_basis();
        asv * plane.h as f64 + bsv * plane.k as f64 + csv * plane.l as f64
    }
}

/// An atom of the basis: fractional cell coordinates plus atomic number.
#[derive(Debug, Clone, PartialEq)]
pub struct AtomSite {
    /// Fractional coordinates, each wrapped to [0, 1).
    pub position: [f64; 3],
    pub atomic_number: u32,
}

impl AtomSite {
    pub fn new(atomic_number: u32, u: f64, v: f64, w: f64) -> Self {
        Self {
            position: [u.rem_euclid(1.0), v.rem_euclid(1.0), w.rem_euclid(1.0)],
            atomic_number,
        }
    }
}

/// The set of atom sites decorating one unit cell.
///
/// Space-group expansion of a CIF asymmetric unit happens upstream; this
/// type only holds the already-expanded sites.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AtomBasis {
    pub sites: Vec<AtomSite>,
}

impl AtomBasis {
    pub fn new(sites: Vec<AtomSite>) -> Self {
        Self { sites }
    }

    /// Single atom at the origin.
    pub fn primitive(atomic_number: u32) -> Self {
        Self::new(vec![AtomSite::new(atomic_number, 0.0, 0.0, 0.0)])
    }

    /// Origin plus cell center.
    pub fn body_centered(atomic_number: u32) -> Self {
        Self::new(vec![
            AtomSite::new(atomic_number, 0.0, 0.0, 0.0),
            AtomSite::new(atomic_number, 0.5, 0.5, 0.5),
        ])
    }

    /// Origin plus the three face centers.
    pub fn face_centered(atomic_number: u32) -> Self {
        Self::new(vec![
            AtomSite::new(atomic_number, 0.0, 0.0, 0.0),
            AtomSite::new(atomic_number, 0.5, 0.5, 0.0),
            AtomSite::new(atomic_number, 0.5, 0.0, 0.5),
            AtomSite::new(atomic_number, 0.0, 0.5, 0.5),
        ])
    }

    /// Two-atom hexagonal close-packed basis.
    pub fn hexagonal_close_packed(atomic_number: u32) -> Self {
        Self::new(vec![
            AtomSite::new(atomic_number, 0.0, 0.0, 0.0),
            AtomSite::new(atomic_number, 1.0 / 3.0, 2.0 / 3.0, 0.5),
        ])
    }

    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }
}
