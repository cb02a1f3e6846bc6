//! Detector geometry: lifting Hough peaks to 3-D Kikuchi-band normals.
//!
//! The detector frame has +X right, +Z up, and +Y pointing from the sample
//! toward the phosphor screen, which sits at `y = detector_distance`. All
//! lengths are fractions of the pattern width, matching the convention of
//! the pattern-center calibration.
//!
//! A Kikuchi band's center line, together with the projection origin, spans
//! the diffracting plane; the plane normal is the cross product of two line
//! points taken as vectors from the origin. The two-fold sign ambiguity of
//! a band normal is not resolved here: normals are reported in canonical
//! sign form and the triplet matcher tries both signs of every candidate
//! plane, so no per-band heuristic is needed.

use crate::hough::HoughPeak;
use crate::Vector3;

/// Numeric zero for slope/intercept branching.
const ZERO_PRECISION: f64 = 1e-5;

/// Calibrated detector geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectorGeometry {
    /// Pattern center (x, z) as fractions of the pattern width, relative to
    /// the image center.
    pub pattern_center: (f64, f64),
    /// Sample-to-screen distance as a fraction of the pattern width.
    pub detector_distance: f64,
    /// Specimen tilt about the detector x-axis, radians.
    pub tilt_rad: f64,
}

impl DetectorGeometry {
    pub fn new(pattern_center: (f64, f64), detector_distance: f64) -> Self {
        Self {
            pattern_center,
            detector_distance,
            tilt_rad: 0.0,
        }
    }

    pub fn with_tilt(mut self, tilt_rad: f64) -> Self {
        self.tilt_rad = tilt_rad;
        self
    }
}

/// A band's center line on the detector, in slope/intercept form
/// `Z = m·X + k` with X and Z in pattern-width fractions.
///
/// `slope = None` encodes a vertical line `X = k`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KikuchiLine {
    pub slope: Option<f64>,
    pub intercept: f64,
}

impl KikuchiLine {
    /// Two points (X, Z) on the line, chosen to stay well-conditioned for
    /// the cross product in [`kikuchi_line_to_normal`].
    pub fn endpoints(&self) -> [(f64, f64); 2] {
        match self.slope {
            None => [(self.intercept, 0.0), (self.intercept, 0.1)],
            Some(m) if m.abs() < ZERO_PRECISION => {
                [(0.0, self.intercept), (0.1, self.intercept)]
            }
            Some(m) => {
                let k = self.intercept;
                let first = (0.0, k);
                // Prefer the Z-axis crossing; when the intercept is ~0 that
                // collapses onto the first point, so take Z = 1 instead.
                let second = if k.abs() > ZERO_PRECISION {
                    (-k / m, 0.0)
                } else {
                    ((1.0 - k) / m, 1.0)
                };
                [first, second]
            }
        }
    }
}

/// Convert a Hough peak to its Kikuchi line on the detector.
///
/// θ ≈ 0 is a vertical line. The intercept is normalized by the pattern
/// width so it composes with the pattern-center calibration units.
pub fn peak_to_line(rho: f64, theta: f64, pattern_size: (u32, u32)) -> KikuchiLine {
    let width = pattern_size.0 as f64;
    if theta.sin().abs() < ZERO_PRECISION {
        KikuchiLine {
            slope: None,
            intercept: rho / width,
        }
    } else {
        // Image rows grow downward while detector Z grows upward, so the
        // slope is +cot θ in the detector frame.
        KikuchiLine {
            slope: Some(theta.cos() / theta.sin()),
            intercept: -rho / (width * theta.sin()),
        }
    }
}

/// Lift two detector-plane points to 3-D and return the unit normal of the
/// plane they span with the projection origin: `n = p2 × p1`, normalized
/// and sign-canonicalized.
///
/// `None` when the cross product degenerates (the two points and the
/// origin are collinear).
pub fn kikuchi_line_to_normal(
    p1: (f64, f64),
    p2: (f64, f64),
    detector_distance: f64,
) -> Option<Vector3> {
    let v1 = Vector3::new(p1.0, detector_distance, p1.1);
    let v2 = Vector3::new(p2.0, detector_distance, p2.1);
    let normal = v2.cross(&v1);
    let norm = normal.norm();
    if norm < ZERO_PRECISION {
        return None;
    }
    Some(normal / norm)
}

/// Full peak-to-normal conversion: shift the line to a pattern-center
/// origin, lift it to the detector plane, apply the specimen tilt, and
/// canonicalize the sign.
pub fn line_to_normal(line: &KikuchiLine, geometry: &DetectorGeometry) -> Option<Vector3> {
    let (pcx, pcz) = geometry.pattern_center;
    let shifted = match line.slope {
        None => KikuchiLine {
            slope: None,
            intercept: line.intercept - pcx,
        },
        Some(m) => KikuchiLine {
            slope: Some(m),
            intercept: line.intercept + m * pcx - pcz,
        },
    };

    let [p1, p2] = shifted.endpoints();
    let normal = kikuchi_line_to_normal(p1, p2, geometry.detector_distance)?;

    let tilted = if geometry.tilt_rad != 0.0 {
        let tilt =
            crate::rotation::Quaternion::from_axis_angle(Vector3::x(), geometry.tilt_rad);
        tilt.rotate_vector(normal)
    } else {
        normal
    };

    Some(canonical_direction(tilted))
}

/// A detected band lifted to 3-D, still tied to its source peak.
#[derive(Debug, Clone, PartialEq)]
pub struct BandNormal {
    /// Unit normal of the diffracting plane, canonical sign.
    pub normal: Vector3,
    /// Mean Hough intensity of the source peak.
    pub intensity: f64,
    /// Index of the source peak in the detected-peak list.
    pub peak_index: usize,
}

/// Convert detected peaks to band normals, dropping degenerate lines.
pub fn peaks_to_normals(
    peaks: &[HoughPeak],
    pattern_size: (u32, u32),
    geometry: &DetectorGeometry,
) -> Vec<BandNormal> {
    peaks
        .iter()
        .enumerate()
        .filter_map(|(peak_index, peak)| {
            let line = peak_to_line(peak.rho, peak.theta, pattern_size);
            line_to_normal(&line, geometry).map(|normal| BandNormal {
                normal,
                intensity: peak.intensity,
                peak_index,
            })
        })
        .collect()
}

/// Flip the vector so its first component above the zero threshold is
/// positive; (v and −v name the same undirected band normal).
pub fn canonical_direction(v: Vector3) -> Vector3 {
    for component in [v.x, v.y, v.z] {
        if component.abs() > ZERO_PRECISION {
            return if component < 0.0 { -v } else { v };
        }
    }
    v
}
