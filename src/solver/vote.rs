//! Consensus voting over symmetry-equivalent orientation candidates.
//!
//! Each triplet solution proposes one orientation. Two proposals that
//! differ only by a lattice symmetry operator (or by less than the voting
//! tolerance) describe the same physical orientation and must pool their
//! votes; everything else accumulates separately. The best-supported
//! candidate wins, and a tie at the top is reported as ambiguous rather
//! than silently picking one.

use crate::rotation::Quaternion;
use crate::solver::OrientationCandidate;

/// True when `q1` and `q2` are the same orientation modulo the symmetry
/// operators.
///
/// For each operator S the product `S·q1·q2⁻¹` is the residual rotation;
/// its matrix trace is 3 exactly when the residual is the identity, so the
/// test accepts when `|trace − 3| < trace_tolerance` for any operator.
pub fn are_orientations_equivalent(
    q1: &Quaternion,
    q2: &Quaternion,
    trace_tolerance: f64,
    symmetry: &[Quaternion],
) -> bool {
    let relative = *q1 * q2.conjugate();
    for op in symmetry {
        let residual = (*op * relative).normalize();
        // trace(R(q)) = 3 − 4(x² + y² + z²) for a unit quaternion
        let trace =
            3.0 - 4.0 * (residual.x * residual.x + residual.y * residual.y + residual.z * residual.z);
        if (trace - 3.0).abs() < trace_tolerance {
            return true;
        }
    }
    false
}

/// Convert a misorientation-angle tolerance (radians) to the matrix-trace
/// tolerance used by the equivalence test: |trace − 3| = 4·sin²(θ/2).
pub fn trace_tolerance(angle_rad: f64) -> f64 {
    let s = (0.5 * angle_rad).sin();
    4.0 * s * s
}

/// Accumulates and ranks orientation candidates for one pattern.
pub struct OrientationVoter<'a> {
    symmetry: &'a [Quaternion],
    trace_tolerance: f64,
    candidates: Vec<OrientationCandidate>,
}

impl<'a> OrientationVoter<'a> {
    pub fn new(symmetry: &'a [Quaternion], vote_tolerance_rad: f64) -> Self {
        Self {
            symmetry,
            trace_tolerance: trace_tolerance(vote_tolerance_rad),
            candidates: Vec::new(),
        }
    }

    /// Add one triplet solution: merge into an equivalent candidate when
    /// there is one, otherwise open a new candidate.
    pub fn add(&mut self, orientation: Quaternion, reflectors: &[u32]) {
        let orientation = orientation.canonicalize();
        for candidate in &mut self.candidates {
            if are_orientations_equivalent(
                &orientation,
                &candidate.orientation,
                self.trace_tolerance,
                self.symmetry,
            ) {
                candidate.votes += 1;
                for &reflector in reflectors {
                    if !candidate.reflectors.contains(&reflector) {
                        candidate.reflectors.push(reflector);
                    }
                }
                return;
            }
        }
        self.candidates.push(OrientationCandidate {
            orientation,
            votes: 1,
            reflectors: reflectors.to_vec(),
        });
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Rank candidates by vote count, best first. The second value flags a
    /// tie for the top spot.
    pub fn into_ranked(mut self) -> (Vec<OrientationCandidate>, bool) {
        self.candidates
            .sort_by(|a, b| b.votes.cmp(&a.votes));
        for candidate in &mut self.candidates {
            candidate.reflectors.sort_unstable();
        }
        let ambiguous =
            self.candidates.len() >= 2 && self.candidates[0].votes == self.candidates[1].votes;
        (self.candidates, ambiguous)
    }
}
