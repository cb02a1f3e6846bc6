//! Orientation solving: angle-table lookup, triplet matching, and
//! symmetry-aware consensus voting.
//!
//! This module implements the classic EBSD indexing scheme:
//!
//! 1. **Database generation**: per material, enumerate the diffracting
//!    planes, tabulate the interplanar angles between the strongest
//!    reflector families, and precompute the lattice point-group operators.
//! 2. **Solving**: given detected band normals, look up every band
//!    triplet's angle triangle in the table, recover concrete (hkl)
//!    assignments by searching the family members, convert each assignment
//!    into an orientation, and let the candidates vote.

pub mod lut;
pub mod matcher;
pub mod orient;
pub mod solve;
pub mod triplets;
pub mod vote;

use rkyv::{Archive, Deserialize, Serialize};
use tracing::info;

use crate::lattice::{AtomBasis, Lattice};
use crate::reflectors::{CatalogError, ReflectorCatalog};
use crate::rotation::{PointGroup, Quaternion};
use crate::scattering::ScatteringTable;

use lut::AngleLut;

// ── Status codes ────────────────────────────────────────────────────────────

/// Outcome of an indexing attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexStatus {
    /// A best-supported orientation was found.
    OrientationFound,
    /// Every triplet was tried without a consistent table match.
    NoSolution,
    /// Fewer than three usable bands were detected.
    InsufficientBands,
    /// The triplet budget or time budget ran out. Indexing is a pure
    /// function of its inputs, so retrying with the same inputs cannot
    /// succeed; raise the budget or improve the pattern instead.
    BudgetExceeded,
}

// ── Database properties ─────────────────────────────────────────────────────

/// Metadata describing how a phase database was built.
#[derive(Debug, Clone, Archive, Serialize, Deserialize)]
pub struct PhaseProperties {
    /// Maximum |h|, |k|, |l| enumerated into the reflector catalog.
    pub max_indice: i32,
    /// Number of strongest reflectors fed into the angle table.
    pub num_lut_reflectors: usize,
    /// Angle tolerance used to deduplicate table entries (radians).
    pub lut_tolerance_rad: f64,
    /// Point group whose operators deduplicate orientations.
    pub point_group: PointGroup,
}

// ── Configuration for database generation ───────────────────────────────────

/// Parameters controlling phase-database generation.
#[derive(Debug, Clone)]
pub struct PhaseConfig {
    /// Maximum |h|, |k|, |l| of catalog planes. Default: 4.
    pub max_indice: i32,
    /// How many of the strongest reflectors enter the angle table.
    /// Default: 32.
    pub num_lut_reflectors: usize,
    /// Angle tolerance for table deduplication (radians). Default: 1°.
    pub lut_tolerance_rad: f64,
    /// Proper-rotation point group of the phase. Default: cubic.
    pub point_group: PointGroup,
}

impl Default for PhaseConfig {
    fn default() -> Self {
        Self {
            max_indice: 4,
            num_lut_reflectors: 32,
            lut_tolerance_rad: 1.0_f64.to_radians(),
            point_group: PointGroup::Cubic,
        }
    }
}

// ── The phase database ──────────────────────────────────────────────────────

/// Everything the solver needs about one material, serializable with rkyv.
///
/// Built once, then shared read-only: batch indexing hands the same
/// database to any number of worker tasks.
#[derive(Debug, Clone, Archive, Serialize, Deserialize)]
pub struct PhaseDatabase {
    /// The unit cell.
    pub lattice: Lattice,
    /// Diffracting planes with intensities and family grouping.
    pub catalog: ReflectorCatalog,
    /// Pairwise interplanar angles between the strongest families.
    pub lut: AngleLut,
    /// Point-group rotation operators, precomputed at build time.
    pub symmetry: Vec<Quaternion>,
    /// Generation parameters.
    pub props: PhaseProperties,
}

impl PhaseDatabase {
    /// Build the database for one material.
    pub fn build(
        lattice: Lattice,
        basis: &AtomBasis,
        table: &ScatteringTable,
        config: &PhaseConfig,
    ) -> Result<Self, CatalogError> {
        let catalog = ReflectorCatalog::build(&lattice, basis, table, config.max_indice)?;
        info!(
            "reflector catalog: {} planes, {} families",
            catalog.len(),
            catalog.num_families()
        );

        let lut = AngleLut::build(
            &catalog,
            &lattice,
            config.num_lut_reflectors,
            config.lut_tolerance_rad,
        );
        info!("angle table: {} entries", lut.len());

        let symmetry = config.point_group.operators();

        Ok(Self {
            lattice,
            catalog,
            lut,
            symmetry,
            props: PhaseProperties {
                max_indice: config.max_indice,
                num_lut_reflectors: config.num_lut_reflectors,
                lut_tolerance_rad: config.lut_tolerance_rad,
                point_group: config.point_group,
            },
        })
    }

    /// Serialize the database to bytes using rkyv.
    pub fn to_rkyv_bytes(&self) -> Vec<u8> {
        rkyv::to_bytes::<rkyv::rancor::Error>(self)
            .expect("rkyv serialization failed")
            .to_vec()
    }

    /// Save the database to a file using rkyv.
    pub fn save_to_file(&self, path: &str) -> anyhow::Result<()> {
        let bytes = self.to_rkyv_bytes();
        std::fs::write(path, bytes)?;
        Ok(())
    }

    /// Load a database from an rkyv file.
    pub fn load_from_file(path: &str) -> anyhow::Result<Self> {
        let bytes = std::fs::read(path)?;
        let db = rkyv::from_bytes::<Self, rkyv::rancor::Error>(&bytes)
            .map_err(|e| anyhow::anyhow!("rkyv deserialization failed: {}", e))?;
        Ok(db)
    }
}

// ── Configuration for indexing ──────────────────────────────────────────────

/// Parameters controlling one pattern's indexing attempt.
#[derive(Debug, Clone)]
pub struct IndexConfig {
    /// Use at most this many of the strongest detected bands. Default: 10.
    pub max_bands: usize,
    /// Angular tolerance for table lookups and hkl assignment (radians).
    /// Default: 1°.
    pub angular_precision_rad: f64,
    /// Numeric zero for degeneracy decisions (triple products, cross
    /// norms). Default: 1e-5.
    pub zero_precision: f64,
    /// Misorientation below which two candidates vote together (radians).
    /// Default: 2°.
    pub vote_tolerance_rad: f64,
    /// Evaluate at most this many band triplets. `None` = all. The triplet
    /// search is O(bands³ × family size³), so pathological many-peak
    /// patterns need a cap to bound latency.
    pub max_triplets: Option<usize>,
    /// Wall-clock budget in milliseconds. `None` = no limit.
    /// Default: 5000.
    pub solve_timeout_ms: Option<u64>,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            max_bands: 10,
            angular_precision_rad: 1.0_f64.to_radians(),
            zero_precision: 1e-5,
            vote_tolerance_rad: 2.0_f64.to_radians(),
            max_triplets: None,
            solve_timeout_ms: Some(5000),
        }
    }
}

// ── Index result ────────────────────────────────────────────────────────────

/// One orientation hypothesis with its accumulated support.
#[derive(Debug, Clone)]
pub struct OrientationCandidate {
    /// Sample-to-crystal rotation, canonical form.
    pub orientation: Quaternion,
    /// Number of triplet solutions that landed on this orientation.
    pub votes: u32,
    /// Catalog indices of every reflector matched by a supporting triplet.
    pub reflectors: Vec<u32>,
}

impl OrientationCandidate {
    /// The orientation as Bunge Euler angles.
    pub fn euler_angles(&self) -> crate::rotation::EulerAngles {
        self.orientation.to_euler_angles()
    }
}

/// Result of one pattern's indexing attempt.
#[derive(Debug, Clone)]
pub struct IndexResult {
    /// Outcome status.
    pub status: IndexStatus,
    /// Candidates ranked by vote count, best first.
    pub candidates: Vec<OrientationCandidate>,
    /// True when the top vote count is shared by several candidates.
    pub ambiguous: bool,
    /// Number of usable bands that entered the triplet search.
    pub num_bands: usize,
    /// Number of band triplets evaluated.
    pub num_triplets: usize,
    /// Number of consistent (hkl) assignments found across all triplets.
    pub num_matches: usize,
    /// Wall-clock time spent, in milliseconds.
    pub solve_time_ms: f32,
}

impl IndexResult {
    /// An unsuccessful result with the given status and elapsed time.
    pub(crate) fn failure(status: IndexStatus, solve_time_ms: f32) -> Self {
        Self {
            status,
            candidates: Vec::new(),
            ambiguous: false,
            num_bands: 0,
            num_triplets: 0,
            num_matches: 0,
            solve_time_ms,
        }
    }

    /// The best-supported orientation, when one exists.
    pub fn best(&self) -> Option<&OrientationCandidate> {
        self.candidates.first()
    }
}
