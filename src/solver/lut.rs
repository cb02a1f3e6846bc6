//! The interplanar-angle lookup table.
//!
//! For the top-N reflectors by intensity, every pairwise interplanar angle
//! in (0, π/2] becomes one table entry keyed by the unordered pair of
//! reflector families. Angles closer than the deduplication tolerance for
//! the same family pair collapse into a single entry, so the table stays
//! compact: for a cubic material it is a few dozen entries.

use rkyv::{Archive, Deserialize, Serialize};

use crate::lattice::Lattice;
use crate::plane::Plane;
use crate::reciprocal;
use crate::reflectors::ReflectorCatalog;

const ZERO_PRECISION: f64 = 1e-5;

/// A reflector as referenced from the angle table.
#[derive(Debug, Clone, Copy, PartialEq, Archive, Serialize, Deserialize)]
pub struct ReflectorRef {
    /// Family id in the catalog.
    pub family: u32,
    /// Index of the representative reflector in the catalog.
    pub catalog_index: u32,
    /// The representative's canonical Miller indices.
    pub plane: Plane,
}

/// One tabulated interplanar angle between two reflector families.
#[derive(Debug, Clone, Copy, PartialEq, Archive, Serialize, Deserialize)]
pub struct LutEntry {
    /// Interplanar angle in radians, in (0, π/2].
    pub angle: f64,
    pub ref1: ReflectorRef,
    pub ref2: ReflectorRef,
}

impl LutEntry {
    /// The two references as a pair, for symmetric iteration.
    pub fn refs(&self) -> [&ReflectorRef; 2] {
        [&self.ref1, &self.ref2]
    }

    /// The reference that is not `index`.
    pub fn other(&self, index: usize) -> &ReflectorRef {
        if index == 0 {
            &self.ref2
        } else {
            &self.ref1
        }
    }
}

/// Angle lookup table, sorted ascending by angle.
#[derive(Debug, Clone, Archive, Serialize, Deserialize)]
pub struct AngleLut {
    entries: Vec<LutEntry>,
}

impl AngleLut {
    /// Tabulate the pairwise angles of the `num_reflectors` strongest
    /// catalog entries.
    ///
    /// `tolerance_rad` deduplicates same-family-pair entries; one entry per
    /// (family, family, angle) bucket survives.
    pub fn build(
        catalog: &ReflectorCatalog,
        lattice: &Lattice,
        num_reflectors: usize,
        tolerance_rad: f64,
    ) -> Self {
        let strongest: Vec<u32> = catalog
            .intensity_order()
            .iter()
            .copied()
            .take(num_reflectors)
            .collect();

        let mut entries: Vec<LutEntry> = Vec::new();

        for &i in &strongest {
            for &j in &strongest {
                if i == j {
                    continue;
                }
                let first = catalog.get(i as usize);
                let second = catalog.get(j as usize);
                let angle =
                    reciprocal::interplanar_angle(&first.plane, &second.plane, lattice);
                // Acute-angle convention: parallel pairs carry no
                // information and obtuse pairs mirror an acute entry
                if angle <= ZERO_PRECISION
                    || angle > std::f64::consts::FRAC_PI_2 + ZERO_PRECISION
                {
                    continue;
                }

                let duplicate = entries.iter().any(|entry| {
                    let families = (entry.ref1.family, entry.ref2.family);
                    let same_pair = families == (first.family, second.family)
                        || families == (second.family, first.family);
                    same_pair && (entry.angle - angle).abs() < tolerance_rad
                });
                if !duplicate {
                    entries.push(LutEntry {
                        angle,
                        ref1: ReflectorRef {
                            family: first.family,
                            catalog_index: i,
                            plane: first.plane,
                        },
                        ref2: ReflectorRef {
                            family: second.family,
                            catalog_index: j,
                            plane: second.plane,
                        },
                    });
                }
            }
        }

        entries.sort_by(|a, b| {
            a.angle
                .partial_cmp(&b.angle)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[LutEntry] {
        &self.entries
    }

    /// All entries whose angle lies within `tolerance_rad` of `angle_rad`.
    pub fn lookup(&self, angle_rad: f64, tolerance_rad: f64) -> &[LutEntry] {
        let low = self
            .entries
            .partition_point(|e| e.angle < angle_rad - tolerance_rad);
        let high = self
            .entries
            .partition_point(|e| e.angle <= angle_rad + tolerance_rad);
        &self.entries[low..high]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lattice::AtomBasis;
    use crate::scattering::ScatteringTable;

    fn bcc_lut() -> (AngleLut, ReflectorCatalog, Lattice) {
        let lattice = Lattice::cubic(2.87).unwrap();
        let basis = AtomBasis::body_centered(26);
        let catalog =
            ReflectorCatalog::build(&lattice, &basis, &ScatteringTable::default(), 2).unwrap();
        let lut = AngleLut::build(&catalog, &lattice, 32, 1.0_f64.to_radians());
        (lut, catalog, lattice)
    }

    #[test]
    fn test_angles_sorted_and_acute() {
        let (lut, _, _) = bcc_lut();
        assert!(!lut.is_empty());
        for pair in lut.entries().windows(2) {
            assert!(pair[0].angle <= pair[1].angle);
        }
        for entry in lut.entries() {
            assert!(entry.angle > 0.0);
            assert!(entry.angle <= std::f64::consts::FRAC_PI_2 + 1e-9);
        }
    }

    #[test]
    fn test_contains_cubic_landmark_angles() {
        // {110}^{110} includes 60° and 90°; {110}^{200} includes 45°
        let (lut, _, _) = bcc_lut();
        let hits = |angle_deg: f64| {
            lut.lookup(angle_deg.to_radians(), 0.1_f64.to_radians())
                .len()
        };
        assert!(hits(60.0) > 0, "missing 60°");
        assert!(hits(90.0) > 0, "missing 90°");
        assert!(hits(45.0) > 0, "missing 45°");
    }

    #[test]
    fn test_family_pair_deduplicated() {
        let (lut, _, _) = bcc_lut();
        for (index, entry) in lut.entries().iter().enumerate() {
            for other in &lut.entries()[index + 1..] {
                let same_pair = (entry.ref1.family == other.ref1.family
                    && entry.ref2.family == other.ref2.family)
                    || (entry.ref1.family == other.ref2.family
                        && entry.ref2.family == other.ref1.family);
                if same_pair {
                    assert!(
                        (entry.angle - other.angle).abs() >= 1.0_f64.to_radians(),
                        "duplicate entry for family pair at {:.3} rad",
                        entry.angle
                    );
                }
            }
        }
    }

    #[test]
    fn test_lookup_window() {
        let (lut, _, _) = bcc_lut();
        let tolerance = 1.0_f64.to_radians();
        let target = 60.0_f64.to_radians();
        for entry in lut.lookup(target, tolerance) {
            assert!((entry.angle - target).abs() <= tolerance + 1e-12);
        }
        // Out-of-band angle finds nothing
        assert!(lut.lookup(0.001, 0.0005).is_empty());
    }
}
