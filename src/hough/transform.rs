//! The Hough accumulator and the image preprocessing that feeds it.

use super::HoughConfig;

/// Hough accumulator over (θ, ρ) space.
///
/// Bins store the *mean* intensity of the pixels voting for the bin rather
/// than the raw vote sum, so long and short lines compete on brightness
/// instead of length.
#[derive(Debug, Clone)]
pub struct HoughMap {
    /// Mean intensity per bin, row-major with θ as the row index.
    values: Vec<f32>,
    /// Number of pixel votes per bin.
    counts: Vec<u32>,
    num_theta: usize,
    num_rho: usize,
    theta_step: f64,
    rho_step: f64,
    rho_max: f64,
}

impl HoughMap {
    /// Transform a grayscale pattern into Hough space.
    ///
    /// `pixels` is row-major with `width * height` entries; `mask`, when
    /// given, must have the same length and selects the pixels that vote
    /// (EBSD patterns are usually masked to the phosphor disc).
    pub fn transform(
        pixels: &[f32],
        width: u32,
        height: u32,
        mask: Option<&[bool]>,
        config: &HoughConfig,
    ) -> Self {
        let w = width as usize;
        let h = height as usize;
        assert_eq!(pixels.len(), w * h, "pixel data does not match dimensions");
        if let Some(m) = mask {
            assert_eq!(m.len(), w * h, "mask does not match dimensions");
        }

        // ── Preprocessing ──
        let mut gray: Vec<f32>;
        if config.median_filter {
            gray = median_filter_3x3(pixels, width, height);
        } else {
            gray = pixels.to_vec();
        }
        if config.contrast_expansion {
            gray = contrast_expansion(&gray);
        }

        // ── Accumulator geometry ──
        let cx = w as f64 / 2.0;
        let cy = h as f64 / 2.0;
        let rho_max = (cx * cx + cy * cy).sqrt();
        let num_rho = 2 * rho_max.ceil() as usize + 1;
        let rho_step = 2.0 * rho_max / (num_rho - 1) as f64;
        let num_theta = (std::f64::consts::PI / config.angle_step_rad).ceil() as usize;
        let theta_step = config.angle_step_rad;

        // Precompute the sinusoid bases once per θ column
        let trig: Vec<(f64, f64)> = (0..num_theta)
            .map(|t| {
                let theta = t as f64 * theta_step;
                theta.sin_cos()
            })
            .collect();

        let mut sums = vec![0.0f64; num_theta * num_rho];
        let mut counts = vec![0u32; num_theta * num_rho];

        // ── Accumulation ──
        // Each pixel votes along ρ(θ) = x·cosθ + y·sinθ. Addition is
        // associative and commutative, so partial accumulators over θ
        // ranges could be merged if this ever needs to be parallel.
        for row in 0..h {
            let y = row as f64 + 0.5 - cy;
            for col in 0..w {
                let idx = row * w + col;
                if let Some(m) = mask {
                    if !m[idx] {
                        continue;
                    }
                }
                let value = gray[idx] as f64;
                let x = col as f64 + 0.5 - cx;
                for (t, &(sin, cos)) in trig.iter().enumerate() {
                    let rho = x * cos + y * sin;
                    let r = ((rho + rho_max) / rho_step).round() as usize;
                    let bin = t * num_rho + r.min(num_rho - 1);
                    sums[bin] += value;
                    counts[bin] += 1;
                }
            }
        }

        let values = sums
            .iter()
            .zip(counts.iter())
            .map(|(&sum, &count)| {
                if count > 0 {
                    (sum / count as f64) as f32
                } else {
                    0.0
                }
            })
            .collect();

        Self {
            values,
            counts,
            num_theta,
            num_rho,
            theta_step,
            rho_step,
            rho_max,
        }
    }

    pub fn num_theta(&self) -> usize {
        self.num_theta
    }

    pub fn num_rho(&self) -> usize {
        self.num_rho
    }

    /// Mean voted intensity of the bin at (θ index, ρ index).
    pub fn value(&self, theta_index: usize, rho_index: usize) -> f32 {
        self.values[theta_index * self.num_rho + rho_index]
    }

    /// Number of votes in the bin at (θ index, ρ index).
    pub fn count(&self, theta_index: usize, rho_index: usize) -> u32 {
        self.counts[theta_index * self.num_rho + rho_index]
    }

    pub fn theta_at(&self, theta_index: usize) -> f64 {
        theta_index as f64 * self.theta_step
    }

    pub fn rho_at(&self, rho_index: usize) -> f64 {
        -self.rho_max + rho_index as f64 * self.rho_step
    }

    pub(super) fn values(&self) -> &[f32] {
        &self.values
    }

    pub(super) fn counts(&self) -> &[u32] {
        &self.counts
    }
}

/// 3×3 median filter; the border pixels keep their original values.
pub fn median_filter_3x3(pixels: &[f32], width: u32, height: u32) -> Vec<f32> {
    let w = width as usize;
    let h = height as usize;
    let mut out = pixels.to_vec();
    if w < 3 || h < 3 {
        return out;
    }
    let mut window = [0.0f32; 9];
    for row in 1..h - 1 {
        for col in 1..w - 1 {
            let mut n = 0;
            for dr in 0..3 {
                for dc in 0..3 {
                    window[n] = pixels[(row + dr - 1) * w + (col + dc - 1)];
                    n += 1;
                }
            }
            window.sort_unstable_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
            out[row * w + col] = window[4];
        }
    }
    out
}

/// Linear contrast expansion to the [0, 255] range.
///
/// A flat image comes back unchanged (no range to expand).
pub fn contrast_expansion(pixels: &[f32]) -> Vec<f32> {
    let mut min = f32::INFINITY;
    let mut max = f32::NEG_INFINITY;
    for &v in pixels {
        if v.is_finite() {
            min = min.min(v);
            max = max.max(v);
        }
    }
    if !(max > min) {
        return pixels.to_vec();
    }
    let scale = 255.0 / (max - min);
    pixels.iter().map(|&v| (v - min) * scale).collect()
}
