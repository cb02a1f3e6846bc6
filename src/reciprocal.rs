//! Pure reciprocal-space geometry over a [`Lattice`]: plane spacings,
//! interplanar angles, zone axes.
//!
//! Everything here uses the quadratic form of the reciprocal metric
//!
//! `r1·r2 = h1h2·a*² + k1k2·b*² + l1l2·c*² + (h1k2 + h2k1)·a*b*·cos γ* + ...`
//!
//! so the same coefficients serve both the spacing and the angle.

use crate::lattice::Lattice;
use crate::plane::Plane;
use crate::Vector3;

/// Arccosine that forgives round-off: arguments beyond ±1 clamp to 0 or π
/// instead of returning NaN.
pub fn acos_clamped(value: f64) -> f64 {
    if value >= 1.0 {
        0.0
    } else if value <= -1.0 {
        std::f64::consts::PI
    } else {
        value.acos()
    }
}

/// Reciprocal-metric dot product r1·r2 between two planes.
fn reciprocal_dot(p1: &Plane, p2: &Plane, lat: &Lattice) -> f64 {
    let (h1, k1, l1) = (p1.h as f64, p1.k as f64, p1.l as f64);
    let (h2, k2, l2) = (p2.h as f64, p2.k as f64, p2.l as f64);

    h1 * h2 * lat.a_star * lat.a_star
        + k1 * k2 * lat.b_star * lat.b_star
        + l1 * l2 * lat.c_star * lat.c_star
        + (h1 * k2 + h2 * k1) * lat.a_star * lat.b_star * lat.gamma_star.cos()
        + (h1 * l2 + h2 * l1) * lat.a_star * lat.c_star * lat.beta_star.cos()
        + (k1 * l2 + k2 * l1) * lat.b_star * lat.c_star * lat.alpha_star.cos()
}

/// Spacing d between adjacent (hkl) planes, in the units of the lattice
/// parameters.
pub fn plane_spacing(plane: &Plane, lat: &Lattice) -> f64 {
    1.0 / reciprocal_dot(plane, plane, lat).sqrt()
}

/// Angle in radians between two planes (i.e. between their normals).
///
/// Symmetric in its arguments; round-off beyond ±1 in the cosine clamps to
/// 0 or π.
pub fn interplanar_angle(p1: &Plane, p2: &Plane, lat: &Lattice) -> f64 {
    let dot = reciprocal_dot(p1, p2, lat);
    let r1 = 1.0 / plane_spacing(p1, lat);
    let r2 = 1.0 / plane_spacing(p2, lat);
    acos_clamped(dot / (r1 * r2))
}

/// Zone axis of two planes: the direction common to both, as a cartesian
/// vector. Zero when the planes are parallel.
pub fn zone_axis(p1: &Plane, p2: &Plane, lat: &Lattice) -> Vector3 {
    lat.plane_normal(p1).cross(&lat.plane_normal(p2))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acos_clamped() {
        assert_eq!(acos_clamped(1.0 + 1e-12), 0.0);
        assert_eq!(acos_clamped(-1.0 - 1e-12), std::f64::consts::PI);
        assert!((acos_clamped(0.0) - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
    }

    #[test]
    fn test_cubic_plane_spacing() {
        let lat = Lattice::cubic(2.87).unwrap();
        // d(hkl) = a / sqrt(h² + k² + l²)
        let d = plane_spacing(&Plane::new(1, 0, 1), &lat);
        assert!((d - 2.87 / 2.0_f64.sqrt()).abs() < 1e-9);
        let d = plane_spacing(&Plane::new(2, 0, 0), &lat);
        assert!((d - 1.435).abs() < 1e-9);
    }

    #[test]
    fn test_hexagonal_plane_spacing() {
        let lat = Lattice::hexagonal(3.21, 5.21).unwrap();
        let d = plane_spacing(&Plane::new(0, 0, 2), &lat);
        assert!((d - 2.605).abs() < 1e-9);
    }

    #[test]
    fn test_cubic_interplanar_angles() {
        let lat = Lattice::cubic(5.43).unwrap();
        let angle = interplanar_angle(&Plane::new(1, 0, 0), &Plane::new(1, 1, 0), &lat);
        assert!((angle.to_degrees() - 45.0).abs() < 1e-9);
        let angle = interplanar_angle(&Plane::new(1, 0, 0), &Plane::new(1, 1, 1), &lat);
        assert!((angle.to_degrees() - 54.735610317245346).abs() < 1e-9);
        let angle = interplanar_angle(&Plane::new(1, 1, 1), &Plane::new(-1, -1, -1), &lat);
        assert!((angle - std::f64::consts::PI).abs() < 1e-9);
    }

    #[test]
    fn test_interplanar_angle_symmetry() {
        let lat = Lattice::new(5.0, 6.0, 7.0, 1.3, 1.6, 1.9).unwrap();
        let pairs = [
            (Plane::new(1, 0, 0), Plane::new(0, 1, 0)),
            (Plane::new(1, 1, 1), Plane::new(2, -1, 0)),
            (Plane::new(0, 2, 1), Plane::new(1, 0, -3)),
        ];
        for (p, q) in pairs {
            let forward = interplanar_angle(&p, &q, &lat);
            let backward = interplanar_angle(&q, &p, &lat);
            assert!((forward - backward).abs() < 1e-12);
        }
    }

    #[test]
    fn test_zone_axis_perpendicular_to_both() {
        let lat = Lattice::cubic(4.05).unwrap();
        let p1 = Plane::new(1, 1, 1);
        let p2 = Plane::new(1, -1, 0);
        let zone = zone_axis(&p1, &p2, &lat);
        assert!(zone.dot(&lat.plane_normal(&p1)).abs() < 1e-9);
        assert!(zone.dot(&lat.plane_normal(&p2)).abs() < 1e-9);
    }
}
