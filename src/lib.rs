//! # kikuchi
//!
//! A fast, robust **EBSD pattern indexer** written in Rust.
//!
//! Given a single electron-backscatter-diffraction (EBSD) pattern image,
//! `kikuchi` detects the Kikuchi bands, identifies the diffracting crystal
//! planes against a precomputed interplanar-angle table, and returns the
//! 3-D crystallographic orientation of the grain as a quaternion — no prior
//! orientation estimate required.
//!
//! ## Example
//!
//! ```no_run
//! use kikuchi::{
//!     AtomBasis, DetectorGeometry, HoughConfig, IndexConfig, IndexStatus, Lattice,
//!     PhaseConfig, PhaseDatabase, ScatteringTable,
//! };
//!
//! // Build a phase database for BCC iron (done once per material)
//! let lattice = Lattice::cubic(2.87).unwrap();
//! let basis = AtomBasis::body_centered(26);
//! let table = ScatteringTable::default();
//! let db = PhaseDatabase::build(lattice, &basis, &table, &PhaseConfig::default()).unwrap();
//!
//! // Save for fast loading later, or load a previously saved database
//! db.save_to_file("data/iron_bcc.rkyv").unwrap();
//! let db = PhaseDatabase::load_from_file("data/iron_bcc.rkyv").unwrap();
//!
//! // Index a pattern from raw grayscale pixels (row-major, any intensity scale)
//! let pixels: Vec<f32> = vec![0.0; 336 * 256];
//! let result = db.index_from_raw(
//!     &pixels,
//!     336,
//!     256,
//!     None,
//!     &HoughConfig::default(),
//!     &DetectorGeometry::new((0.0, 0.0), 0.3),
//!     &IndexConfig::default(),
//! );
//!
//! if result.status == IndexStatus::OrientationFound {
//!     let best = &result.candidates[0];
//!     println!("Orientation: {:?}", best.orientation.to_euler_angles());
//!     println!("{} votes from {} triplets", best.votes, result.num_triplets);
//! }
//! ```
//!
//! ## Algorithm overview
//!
//! 1. **Band detection** — Hough transform of the pattern (median filter +
//!    contrast expansion first), peak detection by thresholding and
//!    connected-component labeling of the accumulator
//! 2. **Band geometry** — each Hough peak becomes a line on the detector
//!    plane, lifted to the 3-D normal of the diffracting plane using the
//!    pattern center and detector distance
//! 3. **Triplet matching** — the three pairwise angles of each band triplet
//!    are looked up in a precomputed interplanar-angle table; candidate
//!    (hkl) assignments must be cyclically consistent and chirality-matched
//! 4. **Orientation** — each consistent assignment yields a crystal
//!    orientation from two band-normal / plane-normal pairs
//! 5. **Voting** — candidates are deduplicated under the lattice point
//!    group and the best-supported orientation wins
//!
//! ## Credits
//!
//! The indexing approach follows the classic Hough/triplet voting scheme of
//! Wright & Adams ("Automatic analysis of electron backscatter diffraction
//! patterns", 1992) as popularized by commercial EBSD systems.

pub mod detector;
pub mod hough;
pub mod lattice;
pub mod plane;
pub mod reciprocal;
pub mod reflectors;
pub mod rotation;
pub mod scattering;
pub mod solver;

pub use detector::{BandNormal, DetectorGeometry, KikuchiLine};
pub use hough::{HoughConfig, HoughMap, HoughPeak};
pub use lattice::{AtomBasis, AtomSite, Lattice, LatticeError};
pub use plane::Plane;
pub use reflectors::{CatalogError, Reflector, ReflectorCatalog};
pub use rotation::{misorientation, rotate, EulerAngles, PointGroup, Quaternion};
pub use scattering::ScatteringTable;
pub use solver::{
    IndexConfig, IndexResult, IndexStatus, OrientationCandidate, PhaseConfig, PhaseDatabase,
};

// Commonly used types
// Note: the crystallographic math runs in 64-bit throughout. Interplanar
// angle tolerances are ~1e-5 rad, which 32-bit floats cannot hold through
// the quadratic forms involved.
pub type Vector3 = nalgebra::Vector3<f64>;
pub type Matrix3 = nalgebra::Matrix3<f64>;
