//! Triplet matching: from three detected band normals to concrete (hkl)
//! assignments.
//!
//! A triplet's geometric signature is its three pairwise angles, folded
//! into [0, π/2] with a sign flag (the table only stores acute angles),
//! plus the signed triple product of the normals, which captures the
//! triplet's chirality. Matching proceeds in three stages:
//!
//! 1. Look up each folded angle in the [`AngleLut`] to get candidate
//!    family pairs per band pair
//! 2. Keep combinations whose family assignment is cyclically consistent
//!    across the three pairs
//! 3. Search the ± members of the assigned families for concrete planes
//!    whose signed direction cosines and chirality reproduce the observed
//!    geometry
//!
//! Trying both signs of every family member is what resolves the two-fold
//! sign ambiguity of the band normals: no upstream sign heuristic is
//! needed, inconsistent sign combinations simply fail the cosine and
//! triple-product tests.

use crate::lattice::Lattice;
use crate::plane::Plane;
use crate::reciprocal::acos_clamped;
use crate::reflectors::ReflectorCatalog;
use crate::solver::lut::{AngleLut, LutEntry, ReflectorRef};
use crate::solver::IndexConfig;
use crate::Vector3;

/// A pairwise band angle folded into [0, π/2].
///
/// `sign` is −1 when the raw angle was obtuse, so
/// `sign · cos(angle)` recovers the original direction cosine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FoldedAngle {
    pub angle: f64,
    pub sign: f64,
}

/// The observed geometry of one band triplet.
#[derive(Debug, Clone, PartialEq)]
pub struct TripletGeometry {
    /// Folded angles for the pairs (0,1), (1,2), (2,0).
    pub angles: [FoldedAngle; 3],
    /// Raw direction cosines for the same pairs.
    pub signed_cosines: [f64; 3],
    /// Chirality indicator (n0 × n2) · n1.
    pub triple_product: f64,
}

impl TripletGeometry {
    /// Measure three unit band normals.
    pub fn compute(n0: &Vector3, n1: &Vector3, n2: &Vector3) -> Self {
        let cosines = [n0.dot(n1), n1.dot(n2), n2.dot(n0)];
        let angles = cosines.map(|cosine| {
            let raw = acos_clamped(cosine);
            if raw > std::f64::consts::FRAC_PI_2 {
                FoldedAngle {
                    angle: std::f64::consts::PI - raw,
                    sign: -1.0,
                }
            } else {
                FoldedAngle { angle: raw, sign: 1.0 }
            }
        });
        Self {
            angles,
            signed_cosines: cosines,
            triple_product: n0.cross(n2).dot(n1),
        }
    }
}

/// One concrete (hkl) assignment for a band triplet.
///
/// `planes[i]` is the signed plane assigned to band i;
/// `catalog_indices[i]` is the canonical catalog entry it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct TripletMatch {
    pub planes: [Plane; 3],
    pub catalog_indices: [u32; 3],
}

/// Find every consistent (hkl) assignment for an observed triplet.
pub fn find_band(
    geometry: &TripletGeometry,
    lut: &AngleLut,
    catalog: &ReflectorCatalog,
    lattice: &Lattice,
    config: &IndexConfig,
) -> Vec<TripletMatch> {
    let tolerance = config.angular_precision_rad;
    let candidates: [&[LutEntry]; 3] = [
        lut.lookup(geometry.angles[0].angle, tolerance),
        lut.lookup(geometry.angles[1].angle, tolerance),
        lut.lookup(geometry.angles[2].angle, tolerance),
    ];

    let mut matches = Vec::new();
    for e0 in candidates[0] {
        for e1 in candidates[1] {
            for e2 in candidates[2] {
                if let Some(assignment) = check_band_consistency(e0, e1, e2) {
                    exact_hkl(&assignment, geometry, catalog, lattice, config, &mut matches);
                }
            }
        }
    }
    matches
}

/// Check that three table entries admit a cyclic family assignment.
///
/// Entry 0 covers bands (0, 1), entry 1 covers (1, 2), entry 2 covers
/// (2, 0); each entry must hand one family to each of its bands such that
/// neighbouring entries agree on the shared band. Returns the per-band
/// references [band0, band1, band2] of the first consistent assignment.
pub fn check_band_consistency(
    e0: &LutEntry,
    e1: &LutEntry,
    e2: &LutEntry,
) -> Option<[ReflectorRef; 3]> {
    for i in 0..2 {
        for j in 0..2 {
            for k in 0..2 {
                if e0.other(i).family == e1.refs()[j].family
                    && e1.other(j).family == e2.refs()[k].family
                    && e2.other(k).family == e0.refs()[i].family
                {
                    return Some([*e0.refs()[i], *e1.refs()[j], *e2.refs()[k]]);
                }
            }
        }
    }
    None
}

/// The ± members of a family with their unit cartesian normals.
fn family_directions(
    catalog: &ReflectorCatalog,
    lattice: &Lattice,
    family: u32,
) -> Vec<(Plane, u32, Vector3)> {
    let members = catalog.family_members(family);
    let mut directions = Vec::with_capacity(2 * members.len());
    for &index in members {
        let plane = catalog.get(index as usize).plane;
        let unit = lattice.plane_normal(&plane).normalize();
        directions.push((plane, index, unit));
        directions.push((-plane, index, -unit));
    }
    directions
}

/// Exhaustive search of the assigned families for concrete signed planes
/// matching the observed direction cosines and chirality.
///
/// When the observed triplet is coplanar (triple product ≈ 0) the
/// chirality test cannot discriminate, so the sign-flipped degenerate
/// variants are emitted as well.
fn exact_hkl(
    assignment: &[ReflectorRef; 3],
    geometry: &TripletGeometry,
    catalog: &ReflectorCatalog,
    lattice: &Lattice,
    config: &IndexConfig,
    matches: &mut Vec<TripletMatch>,
) {
    // Direction cosines the concrete planes must reproduce:
    // (A,B) observes n0·n1, (B,C) observes n1·n2, (C,A) observes n2·n0
    let [dp_ab, dp_bc, dp_ca] = geometry.signed_cosines;
    let cos_tolerance = config.angular_precision_rad;

    let a_members = family_directions(catalog, lattice, assignment[0].family);
    let b_members = family_directions(catalog, lattice, assignment[1].family);
    let c_members = family_directions(catalog, lattice, assignment[2].family);

    for &(plane_a, index_a, ua) in &a_members {
        for &(plane_c, index_c, uc) in &c_members {
            if (ua.dot(&uc) - dp_ca).abs() > cos_tolerance {
                continue;
            }
            for &(plane_b, index_b, ub) in &b_members {
                if (ua.dot(&ub) - dp_ab).abs() > cos_tolerance {
                    continue;
                }
                if (ub.dot(&uc) - dp_bc).abs() > cos_tolerance {
                    continue;
                }

                let chirality = ua.cross(&uc).dot(&ub);
                if chirality * geometry.triple_product < 0.0 {
                    continue;
                }

                let indices = [index_a, index_b, index_c];
                matches.push(TripletMatch {
                    planes: [plane_a, plane_b, plane_c],
                    catalog_indices: indices,
                });
                if chirality.abs() < config.zero_precision {
                    matches.push(TripletMatch {
                        planes: [-plane_a, -plane_b, plane_c],
                        catalog_indices: indices,
                    });
                    matches.push(TripletMatch {
                        planes: [plane_a, -plane_b, plane_c],
                        catalog_indices: indices,
                    });
                }
            }
        }
    }
}
