//! Pattern indexing: band normals → voted orientation.
//!
//! The solve loop follows the triplet voting scheme:
//! 1. Keep the strongest bands (brightest first).
//! 2. For each band triplet (brightest-first enumeration), measure its
//!    angle triangle and chirality, collect consistent (hkl) assignments
//!    from the angle table, and turn each assignment into an orientation.
//! 3. Accumulate orientations in the symmetry-aware voter; the
//!    best-supported candidate is the answer.
//!
//! The loop is bounded by an optional triplet budget and wall-clock
//! timeout; hitting either yields [`IndexStatus::BudgetExceeded`] with
//! whatever candidates had accumulated, never an error.

use std::time::Instant;

use tracing::debug;

use crate::detector::{peaks_to_normals, BandNormal, DetectorGeometry};
use crate::hough::{HoughConfig, HoughMap, HoughPeak};

use super::matcher::{find_band, TripletGeometry};
use super::orient::calculate_orientation;
use super::triplets::BreadthFirstTriplets;
use super::vote::OrientationVoter;
use super::{IndexConfig, IndexResult, IndexStatus, PhaseDatabase};

fn elapsed_ms(t0: Instant) -> f32 {
    t0.elapsed().as_secs_f32() * 1000.0
}

impl PhaseDatabase {
    /// Index a pattern from its detected band normals.
    ///
    /// Bands beyond `config.max_bands` (by intensity) are ignored. Fewer
    /// than three usable bands cannot form a triplet and report
    /// [`IndexStatus::InsufficientBands`].
    pub fn index_pattern(&self, bands: &[BandNormal], config: &IndexConfig) -> IndexResult {
        let t0 = Instant::now();

        // Strongest bands first; the triplet enumeration then naturally
        // prioritizes reliable bands.
        let mut selected: Vec<&BandNormal> = bands.iter().collect();
        selected.sort_by(|a, b| {
            b.intensity
                .partial_cmp(&a.intensity)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        selected.truncate(config.max_bands);
        let num_bands = selected.len();

        if num_bands < 3 {
            let mut result = IndexResult::failure(IndexStatus::InsufficientBands, elapsed_ms(t0));
            result.num_bands = num_bands;
            return result;
        }

        debug!(
            "indexing with {} bands, up to {} triplets",
            num_bands,
            BreadthFirstTriplets::total(num_bands)
        );

        let mut voter = OrientationVoter::new(&self.symmetry, config.vote_tolerance_rad);
        let mut num_triplets = 0usize;
        let mut num_matches = 0usize;
        let mut budget_exceeded = false;

        for [i, j, k] in BreadthFirstTriplets::new(num_bands) {
            if let Some(max) = config.max_triplets {
                if num_triplets >= max {
                    budget_exceeded = true;
                    break;
                }
            }
            if let Some(timeout) = config.solve_timeout_ms {
                if elapsed_ms(t0) > timeout as f32 {
                    debug!("budget exhausted after {num_triplets} triplets");
                    budget_exceeded = true;
                    break;
                }
            }
            num_triplets += 1;

            let n0 = &selected[i].normal;
            let n1 = &selected[j].normal;
            let n2 = &selected[k].normal;
            let geometry = TripletGeometry::compute(n0, n1, n2);

            let matches = find_band(&geometry, &self.lut, &self.catalog, &self.lattice, config);
            for triplet_match in &matches {
                let u1 = self.lattice.plane_normal(&triplet_match.planes[0]).normalize();
                let u2 = self.lattice.plane_normal(&triplet_match.planes[1]).normalize();
                // Degenerate frames are skipped, not fatal
                if let Some(orientation) = calculate_orientation(n0, n1, &u1, &u2) {
                    num_matches += 1;
                    voter.add(orientation, &triplet_match.catalog_indices);
                }
            }
        }

        let (candidates, ambiguous) = voter.into_ranked();
        let status = if budget_exceeded {
            IndexStatus::BudgetExceeded
        } else if candidates.is_empty() {
            IndexStatus::NoSolution
        } else {
            IndexStatus::OrientationFound
        };

        debug!(
            "{num_triplets} triplets, {num_matches} solutions, {} candidates, status {status:?}",
            candidates.len()
        );

        IndexResult {
            status,
            candidates,
            ambiguous,
            num_bands,
            num_triplets,
            num_matches,
            solve_time_ms: elapsed_ms(t0),
        }
    }

    /// Index a pattern from detected Hough peaks.
    pub fn index_from_peaks(
        &self,
        peaks: &[HoughPeak],
        pattern_size: (u32, u32),
        geometry: &DetectorGeometry,
        config: &IndexConfig,
    ) -> IndexResult {
        let bands = peaks_to_normals(peaks, pattern_size, geometry);
        self.index_pattern(&bands, config)
    }

    /// Index a pattern straight from raw grayscale pixels.
    ///
    /// Runs the full pipeline: Hough transform, peak detection, band
    /// geometry, triplet matching, and voting.
    #[allow(clippy::too_many_arguments)]
    pub fn index_from_raw(
        &self,
        pixels: &[f32],
        width: u32,
        height: u32,
        mask: Option<&[bool]>,
        hough_config: &HoughConfig,
        geometry: &DetectorGeometry,
        config: &IndexConfig,
    ) -> IndexResult {
        let map = HoughMap::transform(pixels, width, height, mask, hough_config);
        let peaks = map.find_peaks(hough_config);
        debug!("detected {} hough peaks", peaks.len());
        self.index_from_peaks(&peaks, (width, height), geometry, config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detector::canonical_direction;
    use crate::lattice::{AtomBasis, Lattice};
    use crate::rotation::{EulerAngles, Quaternion};
    use crate::scattering::ScatteringTable;
    use crate::solver::vote::are_orientations_equivalent;
    use crate::solver::PhaseConfig;
    use crate::Vector3;

    fn bcc_database() -> PhaseDatabase {
        let lattice = Lattice::cubic(2.87).unwrap();
        let basis = AtomBasis::body_centered(26);
        let config = PhaseConfig {
            max_indice: 2,
            ..Default::default()
        };
        PhaseDatabase::build(lattice, &basis, &ScatteringTable::default(), &config).unwrap()
    }

    /// Band normals a grain with orientation `g` would produce for the
    /// given planes, sign-canonicalized like real detected bands.
    fn synthetic_bands(db: &PhaseDatabase, g: &Quaternion, planes: &[(i32, i32, i32)]) -> Vec<BandNormal> {
        planes
            .iter()
            .enumerate()
            .map(|(index, &(h, k, l))| {
                let u = db
                    .lattice
                    .plane_normal(&crate::plane::Plane::new(h, k, l))
                    .normalize();
                let normal = canonical_direction(g.conjugate().rotate_vector(u));
                BandNormal {
                    normal,
                    intensity: 100.0 - index as f64,
                    peak_index: index,
                }
            })
            .collect()
    }

    fn assert_recovers(db: &PhaseDatabase, g: &Quaternion, result: &IndexResult) {
        assert_eq!(result.status, IndexStatus::OrientationFound);
        let best = result.best().unwrap();
        let tolerance = crate::solver::vote::trace_tolerance(2.0_f64.to_radians());
        assert!(
            are_orientations_equivalent(&best.orientation, g, tolerance, &db.symmetry),
            "recovered {:?} not equivalent to truth {:?}",
            best.orientation,
            g
        );
    }

    #[test]
    fn test_index_identity_orientation() {
        let db = bcc_database();
        let g = Quaternion::identity();
        let bands = synthetic_bands(
            &db,
            &g,
            &[(1, 0, 1), (1, 1, 0), (0, 1, 1), (1, -1, 0), (1, 0, -1)],
        );
        let result = db.index_pattern(&bands, &IndexConfig::default());
        assert_recovers(&db, &g, &result);
        assert!(result.best().unwrap().votes >= 3);
        assert!(!result.best().unwrap().reflectors.is_empty());
    }

    #[test]
    fn test_index_rotated_orientation() {
        let db = bcc_database();
        let g = EulerAngles::from_degrees(24.0, 37.0, 12.0).to_quaternion();
        let bands = synthetic_bands(
            &db,
            &g,
            &[(1, 0, 1), (1, 1, 0), (0, 1, 1), (2, 0, 0), (1, -1, 0), (0, 0, 2)],
        );
        let result = db.index_pattern(&bands, &IndexConfig::default());
        assert_recovers(&db, &g, &result);
    }

    #[test]
    fn test_noise_bands_do_not_steal_votes() {
        let db = bcc_database();
        let g = EulerAngles::from_degrees(80.0, 20.0, 45.0).to_quaternion();
        let mut bands = synthetic_bands(
            &db,
            &g,
            &[(1, 0, 1), (1, 1, 0), (0, 1, 1), (1, -1, 0), (0, 1, -1)],
        );
        // Two spurious dim bands at angles unrelated to the lattice
        bands.push(BandNormal {
            normal: canonical_direction(Vector3::new(0.9, 0.13, 0.4).normalize()),
            intensity: 10.0,
            peak_index: 90,
        });
        bands.push(BandNormal {
            normal: canonical_direction(Vector3::new(0.2, 0.95, 0.23).normalize()),
            intensity: 9.0,
            peak_index: 91,
        });

        let clean = db.index_pattern(&bands[..5], &IndexConfig::default());
        let noisy = db.index_pattern(&bands, &IndexConfig::default());

        assert_recovers(&db, &g, &noisy);
        // The true orientation never loses votes to unrelated bands
        assert!(noisy.best().unwrap().votes >= clean.best().unwrap().votes);
    }

    #[test]
    fn test_insufficient_bands() {
        let db = bcc_database();
        let g = Quaternion::identity();
        let bands = synthetic_bands(&db, &g, &[(1, 0, 1), (1, 1, 0)]);
        let result = db.index_pattern(&bands, &IndexConfig::default());
        assert_eq!(result.status, IndexStatus::InsufficientBands);
        assert!(result.candidates.is_empty());
        assert_eq!(result.num_bands, 2);
    }

    #[test]
    fn test_no_solution_for_garbage_normals() {
        let db = bcc_database();
        // Angles that match nothing in a cubic table
        let bands: Vec<BandNormal> = [
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(1.0, 0.1, 0.0),
            Vector3::new(1.0, 0.0, 0.13),
        ]
        .iter()
        .enumerate()
        .map(|(index, v)| BandNormal {
            normal: v.normalize(),
            intensity: 50.0,
            peak_index: index,
        })
        .collect();

        let result = db.index_pattern(&bands, &IndexConfig::default());
        assert_eq!(result.status, IndexStatus::NoSolution);
        assert!(result.candidates.is_empty());
        assert_eq!(result.num_triplets, 1);
    }

    #[test]
    fn test_triplet_budget() {
        let db = bcc_database();
        let g = Quaternion::identity();
        let bands = synthetic_bands(
            &db,
            &g,
            &[(1, 0, 1), (1, 1, 0), (0, 1, 1), (1, -1, 0), (1, 0, -1)],
        );
        let config = IndexConfig {
            max_triplets: Some(0),
            ..Default::default()
        };
        let result = db.index_pattern(&bands, &config);
        assert_eq!(result.status, IndexStatus::BudgetExceeded);
        assert_eq!(result.num_triplets, 0);
    }

    #[test]
    fn test_max_bands_truncation() {
        let db = bcc_database();
        let g = Quaternion::identity();
        let bands = synthetic_bands(
            &db,
            &g,
            &[(1, 0, 1), (1, 1, 0), (0, 1, 1), (1, -1, 0), (1, 0, -1)],
        );
        let config = IndexConfig {
            max_bands: 3,
            ..Default::default()
        };
        let result = db.index_pattern(&bands, &config);
        assert_eq!(result.num_bands, 3);
        // The three strongest bands are kept, so one triplet exists
        assert_eq!(result.num_triplets, 1);
        assert_recovers(&db, &g, &result);
    }
}
