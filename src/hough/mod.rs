//! Band detection: Hough transform of a pattern image and peak extraction.
//!
//! The pipeline mirrors classic EBSD practice:
//!
//! 1. Median filter and contrast expansion of the grayscale pattern
//! 2. Hough transform: every unmasked pixel votes along its sinusoid
//!    `ρ = x·cos θ + y·sin θ`, θ ∈ [0, π), accumulating mean intensity
//! 3. Peak detection: threshold the accumulator, label connected
//!    components, and measure each component's (ρ, θ) centroid, intensity
//!    statistics, and area
//!
//! Coordinates are centered: the image origin is at (width/2, height/2),
//! +x right, +y down, so ρ is in pixels from the pattern center.

mod peaks;
mod transform;

pub use peaks::HoughPeak;
pub use transform::{contrast_expansion, median_filter_3x3, HoughMap};

/// Configuration for the Hough transform and its peak detection.
#[derive(Debug, Clone)]
pub struct HoughConfig {
    /// Angle increment of the accumulator, in radians.
    /// Default: 0.5°.
    pub angle_step_rad: f64,

    /// Apply a 3×3 median filter before transforming.
    /// Default: true
    pub median_filter: bool,

    /// Stretch the intensity range to [0, 255] before transforming.
    /// Default: true
    pub contrast_expansion: bool,

    /// Accumulator threshold in standard deviations above the mean bin
    /// value. Bins above `mean + sigma_threshold * stddev` seed peaks.
    /// Default: 3.0
    pub sigma_threshold: f64,

    /// Minimum accumulator-bin area of a peak. Smaller blobs are noise.
    /// Default: 4
    pub min_peak_area: usize,

    /// Bins with fewer votes than this fraction of the best-populated bin
    /// are ignored. A bin fed by only a few pixels (its line barely clips
    /// the image or the mask) has a meaningless mean intensity.
    /// Default: 0.1
    pub min_bin_votes_fraction: f64,

    /// Keep at most this many peaks (strongest first). `None` keeps all.
    /// Default: None
    pub max_peaks: Option<usize>,
}

impl Default for HoughConfig {
    fn default() -> Self {
        Self {
            angle_step_rad: 0.5_f64.to_radians(),
            median_filter: true,
            contrast_expansion: true,
            sigma_threshold: 3.0,
            min_peak_area: 4,
            min_bin_votes_fraction: 0.1,
            max_peaks: None,
        }
    }
}

/// Load a pattern image file as row-major grayscale f32 pixels.
///
/// Returns (pixels, width, height). Requires the `image` feature.
#[cfg(feature = "image")]
pub fn load_pattern(
    path: impl AsRef<std::path::Path>,
) -> anyhow::Result<(Vec<f32>, u32, u32)> {
    use anyhow::Context;

    let img = image::open(path.as_ref())
        .with_context(|| format!("Failed to open pattern image: {}", path.as_ref().display()))?;
    let gray = img.to_luma8();
    let (width, height) = (gray.width(), gray.height());
    let pixels = gray.as_raw().iter().map(|&v| v as f32).collect();
    Ok((pixels, width, height))
}
