//! Symmetry-reduced catalog of diffracting planes with kinematic
//! intensities.
//!
//! The catalog enumerates every integer (h, k, l) up to a maximum index,
//! keeps one canonical representative per ± pair, discards planes whose
//! structure factor vanishes (systematic absences), and groups the
//! survivors into families of crystallographically equivalent planes.
//!
//! Built once per material from a [`Lattice`], an [`AtomBasis`] and a
//! [`ScatteringTable`], then shared read-only.

use num_complex::Complex64;
use rkyv::{Archive, Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::lattice::{AtomBasis, Lattice};
use crate::plane::Plane;
use crate::reciprocal;
use crate::scattering::ScatteringTable;

/// Intensities below this fraction of the maximum possible intensity are
/// treated as systematic absences.
const DIFFRACTING_FRACTION: f64 = 1e-14;

/// Relative plane-spacing tolerance when grouping families.
const FAMILY_SPACING_TOLERANCE: f64 = 1e-6;

/// Rejected catalog construction.
#[derive(Debug, Error, PartialEq)]
pub enum CatalogError {
    #[error("no diffracting planes within the index limit")]
    Empty,
    #[error("atom basis has no sites")]
    EmptyBasis,
    #[error("no scattering coefficients for element Z = {0}")]
    UnknownElement(u32),
}

/// One diffracting plane of the catalog.
#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
pub struct Reflector {
    /// Canonical (first nonzero index positive) Miller indices.
    pub plane: Plane,
    /// Plane spacing d in the lattice-parameter units.
    pub spacing: f64,
    /// Kinematic intensity |F(hkl)|².
    pub intensity: f64,
    /// Intensity divided by the catalog maximum, in [0, 1].
    pub normalized_intensity: f64,
    /// Family id; 0 is the most intense family.
    pub family: u32,
}

/// The full reflector catalog of one phase.
///
/// Reflectors are stored sorted ascending by (h, k, l) so catalog contents
/// are deterministic; a separate index orders them by descending intensity
/// for consumers that want the strongest reflectors first.
#[derive(Debug, Clone, Archive, Serialize, Deserialize)]
pub struct ReflectorCatalog {
    reflectors: Vec<Reflector>,
    /// Indices into `reflectors`, strongest first.
    by_intensity: Vec<u32>,
    /// Family id → indices of the member reflectors.
    families: Vec<Vec<u32>>,
}

impl ReflectorCatalog {
    /// Enumerate and classify all diffracting planes with
    /// |h|, |k|, |l| ≤ `max_indice`.
    pub fn build(
        lattice: &Lattice,
        basis: &AtomBasis,
        table: &ScatteringTable,
        max_indice: i32,
    ) -> Result<Self, CatalogError> {
        if basis.is_empty() {
            return Err(CatalogError::EmptyBasis);
        }
        for site in &basis.sites {
            if !table.contains(site.atomic_number) {
                return Err(CatalogError::UnknownElement(site.atomic_number));
            }
        }

        // Largest attainable intensity: every atom scattering in phase at
        // s = 0. Sets the scale of the systematic-absence cutoff.
        let max_form_factor: f64 = basis
            .sites
            .iter()
            .map(|site| table.factor(site.atomic_number, 0.0).unwrap_or(0.0))
            .sum();
        let absence_cutoff = DIFFRACTING_FRACTION * max_form_factor * max_form_factor;

        let mut seen = std::collections::BTreeSet::new();
        let mut kept: Vec<(Plane, f64, f64)> = Vec::new();

        for h in -max_indice..=max_indice {
            for k in -max_indice..=max_indice {
                for l in -max_indice..=max_indice {
                    let plane = Plane::new(h, k, l);
                    if plane.is_zero() {
                        continue;
                    }
                    // (hkl) and (-h-k-l) are the same physical band
                    let plane = plane.canonical();
                    if !seen.insert(plane) {
                        continue;
                    }

                    let spacing = reciprocal::plane_spacing(&plane, lattice);
                    let intensity = diffraction_intensity(&plane, spacing, basis, table);
                    if intensity > absence_cutoff {
                        kept.push((plane, spacing, intensity));
                    }
                }
            }
        }

        if kept.is_empty() {
            return Err(CatalogError::Empty);
        }

        kept.sort_by(|a, b| a.0.cmp(&b.0));

        let max_intensity = kept
            .iter()
            .map(|&(_, _, i)| i)
            .fold(f64::MIN, f64::max);

        let mut reflectors: Vec<Reflector> = kept
            .into_iter()
            .map(|(plane, spacing, intensity)| Reflector {
                plane,
                spacing,
                intensity,
                normalized_intensity: intensity / max_intensity,
                family: 0,
            })
            .collect();

        // Strongest-first ordering, plane order breaking intensity ties so
        // the result stays deterministic.
        let mut by_intensity: Vec<u32> = (0..reflectors.len() as u32).collect();
        by_intensity.sort_by(|&i, &j| {
            let a = &reflectors[i as usize];
            let b = &reflectors[j as usize];
            b.intensity
                .partial_cmp(&a.intensity)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.plane.cmp(&b.plane))
        });

        // Family grouping: equivalent planes share their spacing and the
        // multiset of absolute indices. Ids are assigned strongest-first so
        // family 0 is the most intense.
        let mut families: Vec<Vec<u32>> = Vec::new();
        let mut signatures: Vec<([i32; 3], f64)> = Vec::new();
        for &idx in &by_intensity {
            let signature = reflectors[idx as usize].plane.abs_sorted();
            let spacing = reflectors[idx as usize].spacing;
            let existing = signatures.iter().position(|&(sig, d)| {
                sig == signature && (d - spacing).abs() < FAMILY_SPACING_TOLERANCE * d
            });
            let family = match existing {
                Some(family) => family,
                None => {
                    signatures.push((signature, spacing));
                    families.push(Vec::new());
                    signatures.len() - 1
                }
            };
            reflectors[idx as usize].family = family as u32;
            families[family].push(idx);
        }
        for members in &mut families {
            members.sort_unstable();
        }

        debug!(
            "reflector catalog: {} planes in {} families (max index {})",
            reflectors.len(),
            families.len(),
            max_indice
        );

        Ok(Self {
            reflectors,
            by_intensity,
            families,
        })
    }

    pub fn len(&self) -> usize {
        self.reflectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reflectors.is_empty()
    }

    /// All reflectors, sorted ascending by (h, k, l).
    pub fn reflectors(&self) -> &[Reflector] {
        &self.reflectors
    }

    pub fn get(&self, index: usize) -> &Reflector {
        &self.reflectors[index]
    }

    /// Look up a plane; the argument is canonicalized first.
    pub fn find(&self, plane: &Plane) -> Option<&Reflector> {
        let canonical = plane.canonical();
        self.reflectors
            .binary_search_by(|r| r.plane.cmp(&canonical))
            .ok()
            .map(|i| &self.reflectors[i])
    }

    /// Catalog indices sorted by descending intensity.
    pub fn intensity_order(&self) -> &[u32] {
        &self.by_intensity
    }

    /// Reflectors sorted by descending intensity.
    pub fn by_intensity(&self) -> impl Iterator<Item = &Reflector> {
        self.by_intensity
            .iter()
            .map(move |&i| &self.reflectors[i as usize])
    }

    pub fn num_families(&self) -> usize {
        self.families.len()
    }

    /// Catalog indices of the canonical members of a family.
    ///
    /// The triplet matcher iterates these together with their negatives to
    /// cover every symmetric variant of the family.
    pub fn family_members(&self, family: u32) -> &[u32] {
        &self.families[family as usize]
    }
}

/// Kinematic intensity |F|² of a plane for the given atom basis.
///
/// `F(hkl) = Σ_atoms f(Z, 2π/d) · exp(2πi · (hkl)·(uvw))`
fn diffraction_intensity(
    plane: &Plane,
    spacing: f64,
    basis: &AtomBasis,
    table: &ScatteringTable,
) -> f64 {
    let mut form_factor = Complex64::new(0.0, 0.0);
    for site in &basis.sites {
        let f = table
            .factor_for_spacing(site.atomic_number, spacing)
            .unwrap_or(0.0);
        let phase = 2.0 * std::f64::consts::PI * plane.dot_position(&site.position);
        form_factor += f * Complex64::from_polar(1.0, phase);
    }
    form_factor.norm_sqr()
}
