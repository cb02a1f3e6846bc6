//! Integer Miller-index planes and index-notation conversions.
//!
//! A `Plane` is the (h, k, l) triple identifying a lattice plane. Since a
//! diffracting plane and its negative are the same physical band, planes are
//! reduced to a canonical sign form (first nonzero index positive) wherever
//! a unique representative is needed.

use std::fmt;

use rkyv::{Archive, Deserialize, Serialize};

use crate::Vector3;

/// A lattice plane identified by its Miller indices.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Archive, Serialize, Deserialize,
)]
pub struct Plane {
    pub h: i32,
    pub k: i32,
    pub l: i32,
}

impl Plane {
    pub fn new(h: i32, k: i32, l: i32) -> Self {
        Self { h, k, l }
    }

    /// True for the null plane (0, 0, 0), which never diffracts.
    pub fn is_zero(&self) -> bool {
        self.h == 0 && self.k == 0 && self.l == 0
    }

    /// Canonical sign form: the first nonzero index is positive.
    ///
    /// (h, k, l) and (-h, -k, -l) describe the same plane; this picks a
    /// unique representative of the pair.
    pub fn canonical(self) -> Self {
        let first = if self.h != 0 {
            self.h
        } else if self.k != 0 {
            self.k
        } else {
            self.l
        };
        if first < 0 {
            -self
        } else {
            self
        }
    }

    /// Reduce the indices so their greatest common divisor is 1.
    pub fn simplify(self) -> Self {
        let g = gcd(self.h.unsigned_abs(), gcd(self.k.unsigned_abs(), self.l.unsigned_abs()));
        if g <= 1 {
            return self;
        }
        let g = g as i32;
        Self::new(self.h / g, self.k / g, self.l / g)
    }

    /// The indices as |h|, |k|, |l| sorted descending.
    ///
    /// Two planes of the same family share this signature (together with
    /// their plane spacing).
    pub fn abs_sorted(&self) -> [i32; 3] {
        let mut a = [self.h.abs(), self.k.abs(), self.l.abs()];
        a.sort_unstable_by(|x, y| y.cmp(x));
        a
    }

    /// h·u + k·v + l·w for a fractional atom position (u, v, w).
    pub fn dot_position(&self, position: &[f64; 3]) -> f64 {
        self.h as f64 * position[0] + self.k as f64 * position[1] + self.l as f64 * position[2]
    }

    /// The indices as a float vector (lattice-basis coordinates, not cartesian).
    pub fn to_vector(&self) -> Vector3 {
        Vector3::new(self.h as f64, self.k as f64, self.l as f64)
    }
}

impl std::ops::Neg for Plane {
    type Output = Plane;

    fn neg(self) -> Plane {
        Plane::new(-self.h, -self.k, -self.l)
    }
}

impl fmt::Display for Plane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({} {} {})", self.h, self.k, self.l)
    }
}

/// Convert three-index Miller notation (u, v, w) to the four-index
/// Bravais-Miller notation (U, V, T, W) used for hexagonal lattices.
///
/// U = (2u − v)/3, V = (2v − u)/3, T = −(u + v)/3, W = w. The result is
/// fractional in general; multiply through to clear denominators when an
/// integer four-index form is wanted.
pub fn miller_to_bravais(u: i32, v: i32, w: i32) -> [f64; 4] {
    let (u, v, w) = (u as f64, v as f64, w as f64);
    [
        (2.0 * u - v) / 3.0,
        (2.0 * v - u) / 3.0,
        -(u + v) / 3.0,
        w,
    ]
}

/// Convert four-index Bravais-Miller notation back to three-index Miller
/// notation: u = U − T, v = V − T, w = W.
pub fn bravais_to_miller(indices: [f64; 4]) -> [f64; 3] {
    let [cap_u, cap_v, t, w] = indices;
    [cap_u - t, cap_v - t, w]
}

fn gcd(a: u32, b: u32) -> u32 {
    let (mut a, mut b) = (a, b);
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_sign() {
        assert_eq!(Plane::new(-1, 1, 1).canonical(), Plane::new(1, -1, -1));
        assert_eq!(Plane::new(0, -2, 1).canonical(), Plane::new(0, 2, -1));
        assert_eq!(Plane::new(0, 0, -1).canonical(), Plane::new(0, 0, 1));
        assert_eq!(Plane::new(1, 1, 1).canonical(), Plane::new(1, 1, 1));
    }

    #[test]
    fn test_simplify() {
        assert_eq!(Plane::new(2, 2, 2).simplify(), Plane::new(1, 1, 1));
        assert_eq!(Plane::new(4, -2, 0).simplify(), Plane::new(2, -1, 0));
        assert_eq!(Plane::new(1, 2, 3).simplify(), Plane::new(1, 2, 3));
        assert_eq!(Plane::new(0, 0, 3).simplify(), Plane::new(0, 0, 1));
    }

    #[test]
    fn test_abs_sorted() {
        assert_eq!(Plane::new(-1, 2, 0).abs_sorted(), [2, 1, 0]);
        assert_eq!(Plane::new(1, -1, 1).abs_sorted(), [1, 1, 1]);
    }

    #[test]
    fn test_bravais_round_trip() {
        for &(u, v, w) in &[(1, 0, 0), (1, 1, 0), (2, -1, 3), (0, 1, -2)] {
            let four = miller_to_bravais(u, v, w);
            // The auxiliary index is redundant: U + V + T = 0
            assert!((four[0] + four[1] + four[2]).abs() < 1e-12);
            let [u2, v2, w2] = bravais_to_miller(four);
            assert!((u2 - u as f64).abs() < 1e-12);
            assert!((v2 - v as f64).abs() < 1e-12);
            assert!((w2 - w as f64).abs() < 1e-12);
        }
    }

    #[test]
    fn test_basal_plane_bravais() {
        // (0001) basal plane in hexagonal notation
        let four = miller_to_bravais(0, 0, 1);
        assert_eq!(four, [0.0, 0.0, -0.0, 1.0]);
    }
}
