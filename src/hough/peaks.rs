//! Peak detection in the Hough accumulator.
//!
//! Bins above `mean + kσ` of the populated accumulator are grouped into
//! 8-connected components; each component becomes one [`HoughPeak`] with an
//! intensity-weighted (ρ, θ) centroid, intensity statistics, and area.
//! Components touching the accumulator border are discarded — a truncated
//! peak's centroid is unreliable.

use super::transform::HoughMap;
use super::HoughConfig;

/// One detected band in Hough space.
#[derive(Debug, Clone, PartialEq)]
pub struct HoughPeak {
    /// Centroid ρ in pixels from the pattern center.
    pub rho: f64,
    /// Centroid θ in radians, in [0, π).
    pub theta: f64,
    /// Mean accumulator intensity over the peak's bins.
    pub intensity: f64,
    /// Standard deviation of the accumulator intensity over the peak's bins.
    pub intensity_stddev: f64,
    /// Number of accumulator bins in the peak.
    pub area: usize,
}

impl HoughMap {
    /// Detect band peaks, strongest (by mean intensity) first.
    pub fn find_peaks(&self, config: &HoughConfig) -> Vec<HoughPeak> {
        let num_theta = self.num_theta();
        let num_rho = self.num_rho();
        let values = self.values();
        let counts = self.counts();

        // ── Threshold over the well-populated bins ──
        // Bins whose line barely clips the image (or the mask) carry a
        // handful of votes and a meaningless mean; they are left out of
        // both the statistics and the peak mask.
        let max_count = counts.iter().copied().max().unwrap_or(0);
        let min_votes =
            ((max_count as f64 * config.min_bin_votes_fraction).ceil() as u32).max(1);
        let mut sum = 0.0f64;
        let mut populated = 0usize;
        for (v, &c) in values.iter().zip(counts.iter()) {
            if c >= min_votes {
                sum += *v as f64;
                populated += 1;
            }
        }
        if populated == 0 {
            return Vec::new();
        }
        let mean = sum / populated as f64;
        let variance = values
            .iter()
            .zip(counts.iter())
            .filter(|&(_, &c)| c >= min_votes)
            .map(|(v, _)| (*v as f64 - mean).powi(2))
            .sum::<f64>()
            / populated as f64;
        let threshold = mean + config.sigma_threshold * variance.sqrt();

        let mask: Vec<bool> = values
            .iter()
            .zip(counts.iter())
            .map(|(v, &c)| c >= min_votes && *v as f64 > threshold)
            .collect();

        // ── Label 8-connected components ──
        let labels = label_components(&mask, num_rho, num_theta);
        let num_labels = labels.iter().copied().max().unwrap_or(0) as usize;
        if num_labels == 0 {
            return Vec::new();
        }

        // ── Measure each component ──
        struct Accumulator {
            sum_rho: f64,
            sum_theta: f64,
            sum_value: f64,
            sum_value_sq: f64,
            area: usize,
            touches_edge: bool,
        }
        let mut accumulators: Vec<Accumulator> = (0..num_labels)
            .map(|_| Accumulator {
                sum_rho: 0.0,
                sum_theta: 0.0,
                sum_value: 0.0,
                sum_value_sq: 0.0,
                area: 0,
                touches_edge: false,
            })
            .collect();

        for t in 0..num_theta {
            for r in 0..num_rho {
                let label = labels[t * num_rho + r];
                if label == 0 {
                    continue;
                }
                let acc = &mut accumulators[label as usize - 1];
                let value = self.value(t, r) as f64;
                acc.sum_rho += self.rho_at(r) * value;
                acc.sum_theta += self.theta_at(t) * value;
                acc.sum_value += value;
                acc.sum_value_sq += value * value;
                acc.area += 1;
                if t == 0 || t == num_theta - 1 || r == 0 || r == num_rho - 1 {
                    acc.touches_edge = true;
                }
            }
        }

        let mut peaks: Vec<HoughPeak> = accumulators
            .into_iter()
            .filter(|acc| {
                !acc.touches_edge && acc.area >= config.min_peak_area && acc.sum_value > 0.0
            })
            .map(|acc| {
                let mean_value = acc.sum_value / acc.area as f64;
                let variance = (acc.sum_value_sq / acc.area as f64 - mean_value * mean_value)
                    .max(0.0);
                HoughPeak {
                    rho: acc.sum_rho / acc.sum_value,
                    theta: acc.sum_theta / acc.sum_value,
                    intensity: mean_value,
                    intensity_stddev: variance.sqrt(),
                    area: acc.area,
                }
            })
            .collect();

        peaks.sort_by(|a, b| {
            b.intensity
                .partial_cmp(&a.intensity)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        if let Some(max) = config.max_peaks {
            peaks.truncate(max);
        }
        peaks
    }
}

/// Two-pass union-find connected-component labeling (8-connectivity).
/// Returns one label per bin; 0 is background.
fn label_components(mask: &[bool], num_rho: usize, num_theta: usize) -> Vec<u32> {
    let w = num_rho;
    let h = num_theta;
    let mut labels = vec![0u32; w * h];
    let mut parent: Vec<u32> = vec![0];
    let mut next_label = 1u32;

    fn find(parent: &mut [u32], mut x: u32) -> u32 {
        while parent[x as usize] != x {
            parent[x as usize] = parent[parent[x as usize] as usize];
            x = parent[x as usize];
        }
        x
    }

    fn union(parent: &mut [u32], a: u32, b: u32) {
        let ra = find(parent, a);
        let rb = find(parent, b);
        if ra != rb {
            if ra < rb {
                parent[rb as usize] = ra;
            } else {
                parent[ra as usize] = rb;
            }
        }
    }

    for row in 0..h {
        for col in 0..w {
            let idx = row * w + col;
            if !mask[idx] {
                continue;
            }

            let mut neighbors = [0u32; 4];
            let mut n = 0;
            if col > 0 && labels[idx - 1] > 0 {
                neighbors[n] = labels[idx - 1];
                n += 1;
            }
            if row > 0 {
                if labels[idx - w] > 0 {
                    neighbors[n] = labels[idx - w];
                    n += 1;
                }
                if col > 0 && labels[idx - w - 1] > 0 {
                    neighbors[n] = labels[idx - w - 1];
                    n += 1;
                }
                if col + 1 < w && labels[idx - w + 1] > 0 {
                    neighbors[n] = labels[idx - w + 1];
                    n += 1;
                }
            }

            if n == 0 {
                parent.push(next_label);
                labels[idx] = next_label;
                next_label += 1;
            } else {
                let minimum = neighbors[..n].iter().copied().min().unwrap();
                labels[idx] = minimum;
                for &neighbor in &neighbors[..n] {
                    union(&mut parent, minimum, neighbor);
                }
            }
        }
    }

    // Flatten to sequential labels
    let mut remap = std::collections::HashMap::new();
    let mut sequential = 1u32;
    for label in labels.iter_mut() {
        if *label > 0 {
            let root = find(&mut parent, *label);
            let mapped = *remap.entry(root).or_insert_with(|| {
                let s = sequential;
                sequential += 1;
                s
            });
            *label = mapped;
        }
    }
    labels
}
