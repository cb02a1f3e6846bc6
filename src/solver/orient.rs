//! Orientation from two matched band/plane pairs.
//!
//! Two non-parallel plane normals fix a rotation completely: build the
//! same Gram-Schmidt frame from the detected normals (pattern space) and
//! from the assigned plane normals (crystal space), then compose the frame
//! rotations. The result is the sample→crystal rotation `g`, the
//! orientation convention of EBSD mapping: `g` maps the sample-frame
//! coordinates of a direction to its crystal-frame coordinates, and it is
//! independent of which band pair of the triplet produced it — the
//! property consensus voting relies on.

use crate::rotation::Quaternion;
use crate::{Matrix3, Vector3};

/// Compose a rotation from the pattern-space pair (n1, n2) and the
/// crystal-space pair (u1, u2).
///
/// Frames are `e1 = v1/|v1|`, `e2 = v1 × v2` normalized, `e3 = e1 × e2`.
/// Returns `None` when either pair is (anti)parallel — the frame
/// degenerates and the triplet should be skipped.
pub fn calculate_orientation(
    n1: &Vector3,
    n2: &Vector3,
    u1: &Vector3,
    u2: &Vector3,
) -> Option<Quaternion> {
    let pattern = frame(n1, n2)?;
    let crystal = frame(u1, u2)?;

    let q_pattern = Quaternion::from_matrix(&pattern);
    let q_crystal = Quaternion::from_matrix(&crystal);

    // g = qC · qP⁻¹: R(g) = mC · mPᵀ sends each pattern frame vector to
    // its crystal counterpart, so g is the same for every band pair of a
    // correctly indexed triplet.
    Some((q_crystal * q_pattern.conjugate()).canonicalize())
}

/// Right-handed orthonormal frame spanned by two directions, as a
/// column matrix. `None` when the directions are (anti)parallel.
fn frame(v1: &Vector3, v2: &Vector3) -> Option<Matrix3> {
    let e1 = v1.normalize();
    let cross = v1.cross(v2);
    let norm = cross.norm();
    if norm < 1e-9 {
        return None;
    }
    let e2 = cross / norm;
    let e3 = e1.cross(&e2);
    Some(Matrix3::from_columns(&[e1, e2, e3]))
}
