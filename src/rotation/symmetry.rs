//! Proper-rotation point groups as quaternion operator lists.
//!
//! The consensus voter compares candidate orientations modulo the lattice
//! point symmetry; the operator list for a phase is generated once at
//! database build time and reused for every pattern.

use rkyv::{Archive, Deserialize, Serialize};

use super::Quaternion;
use crate::Vector3;

/// Proper-rotation point group of a lattice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Archive, Serialize, Deserialize)]
pub enum PointGroup {
    /// 1 — identity only.
    Triclinic,
    /// 222 — three two-fold axes.
    Orthorhombic,
    /// 422 — four-fold about z plus two-folds.
    Tetragonal,
    /// 622 — six-fold about z plus two-folds.
    Hexagonal,
    /// 432 — the 24 rotations of the cube.
    Cubic,
}

impl PointGroup {
    /// Number of proper rotations in the group.
    pub fn order(&self) -> usize {
        match self {
            PointGroup::Triclinic => 1,
            PointGroup::Orthorhombic => 4,
            PointGroup::Tetragonal => 8,
            PointGroup::Hexagonal => 12,
            PointGroup::Cubic => 24,
        }
    }

    /// The rotation operators of the group as unit quaternions.
    pub fn operators(&self) -> Vec<Quaternion> {
        match self {
            PointGroup::Triclinic => vec![Quaternion::identity()],
            PointGroup::Orthorhombic => vec![
                Quaternion::identity(),
                Quaternion::new(0.0, 1.0, 0.0, 0.0),
                Quaternion::new(0.0, 0.0, 1.0, 0.0),
                Quaternion::new(0.0, 0.0, 0.0, 1.0),
            ],
            PointGroup::Tetragonal => {
                let mut ops = PointGroup::Orthorhombic.operators();
                let sr2 = std::f64::consts::FRAC_1_SQRT_2;
                ops.push(Quaternion::new(sr2, 0.0, 0.0, sr2));
                ops.push(Quaternion::new(sr2, 0.0, 0.0, -sr2));
                ops.push(Quaternion::new(0.0, sr2, sr2, 0.0));
                ops.push(Quaternion::new(0.0, sr2, -sr2, 0.0));
                ops
            }
            PointGroup::Hexagonal => {
                let mut ops = Vec::with_capacity(12);
                for step in 0..6 {
                    let angle = step as f64 * std::f64::consts::FRAC_PI_3;
                    ops.push(Quaternion::from_axis_angle(Vector3::z(), angle));
                }
                for step in 0..6 {
                    let axis_angle = step as f64 * std::f64::consts::FRAC_PI_6;
                    let axis = Vector3::new(axis_angle.cos(), axis_angle.sin(), 0.0);
                    ops.push(Quaternion::from_axis_angle(axis, std::f64::consts::PI));
                }
                ops
            }
            PointGroup::Cubic => {
                let sr2 = std::f64::consts::FRAC_1_SQRT_2;
                let mut ops = vec![
                    Quaternion::identity(),
                    // Three-fold axes along the cube diagonals
                    Quaternion::new(0.5, 0.5, 0.5, 0.5),
                    Quaternion::new(0.5, -0.5, -0.5, 0.5),
                    Quaternion::new(0.5, 0.5, -0.5, -0.5),
                    Quaternion::new(0.5, -0.5, 0.5, -0.5),
                    Quaternion::new(0.5, -0.5, -0.5, -0.5),
                    Quaternion::new(0.5, -0.5, 0.5, 0.5),
                    Quaternion::new(0.5, 0.5, -0.5, 0.5),
                    Quaternion::new(0.5, 0.5, 0.5, -0.5),
                    // Two-fold axes along the cube edges
                    Quaternion::new(0.0, 0.0, 1.0, 0.0),
                    Quaternion::new(0.0, 0.0, 0.0, 1.0),
                    Quaternion::new(0.0, 1.0, 0.0, 0.0),
                ];
                // Four-fold axes and the face-diagonal two-folds
                ops.push(Quaternion::new(0.0, -sr2, 0.0, sr2));
                ops.push(Quaternion::new(0.0, sr2, 0.0, sr2));
                ops.push(Quaternion::new(sr2, 0.0, sr2, 0.0));
                ops.push(Quaternion::new(sr2, 0.0, -sr2, 0.0));
                ops.push(Quaternion::new(0.0, 0.0, -sr2, sr2));
                ops.push(Quaternion::new(sr2, sr2, 0.0, 0.0));
                ops.push(Quaternion::new(sr2, -sr2, 0.0, 0.0));
                ops.push(Quaternion::new(0.0, 0.0, sr2, sr2));
                ops.push(Quaternion::new(0.0, -sr2, sr2, 0.0));
                ops.push(Quaternion::new(sr2, 0.0, 0.0, -sr2));
                ops.push(Quaternion::new(0.0, sr2, sr2, 0.0));
                ops.push(Quaternion::new(sr2, 0.0, 0.0, sr2));
                ops
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contains(ops: &[Quaternion], q: &Quaternion) -> bool {
        ops.iter().any(|op| op.approx_eq(q, 1e-9))
    }

    #[test]
    fn test_group_orders() {
        for group in [
            PointGroup::Triclinic,
            PointGroup::Orthorhombic,
            PointGroup::Tetragonal,
            PointGroup::Hexagonal,
            PointGroup::Cubic,
        ] {
            let ops = group.operators();
            assert_eq!(ops.len(), group.order());
            // All unit, all distinct modulo sign
            for (i, a) in ops.iter().enumerate() {
                assert!((a.norm() - 1.0).abs() < 1e-12);
                for b in &ops[i + 1..] {
                    assert!(!a.approx_eq(b, 1e-6), "{group:?}: duplicate operator");
                }
            }
        }
    }

    #[test]
    fn test_groups_closed_under_multiplication() {
        for group in [
            PointGroup::Orthorhombic,
            PointGroup::Tetragonal,
            PointGroup::Hexagonal,
            PointGroup::Cubic,
        ] {
            let ops = group.operators();
            for a in &ops {
                for b in &ops {
                    let product = *a * *b;
                    assert!(
                        contains(&ops, &product),
                        "{group:?} not closed: {a:?} * {b:?}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_cubic_maps_axes_to_axes() {
        // Every cubic operator permutes the coordinate axes (up to sign)
        let ops = PointGroup::Cubic.operators();
        let axes = [Vector3::x(), Vector3::y(), Vector3::z()];
        for op in &ops {
            for axis in &axes {
                let image = op.rotate_vector(*axis);
                let aligned = axes
                    .iter()
                    .any(|reference| (image.dot(reference).abs() - 1.0).abs() < 1e-9);
                assert!(aligned, "{op:?} does not preserve the axis frame");
            }
        }
    }
}
