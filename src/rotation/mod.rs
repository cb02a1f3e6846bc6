//! Rotation algebra: quaternions, Bunge Euler angles, and the
//! point-symmetry rotation groups used to deduplicate orientations.

mod euler;
mod quaternion;
mod symmetry;

pub use euler::EulerAngles;
pub use quaternion::{misorientation, rotate, Quaternion};
pub use symmetry::PointGroup;
