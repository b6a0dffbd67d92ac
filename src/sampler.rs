//! Bubble fill-score kernels.
//!
//! The orchestrator picks one kernel per decode call based on
//! [`crate::tuning::ImageSource`] and calls it directly through the rest of
//! the pipeline — no trait object in the inner sampling loop.

use crate::normalize::Gray;
use crate::threshold::Binary;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sampler {
    /// Ink fraction of an ellipse in the binary image. Used for uploads.
    Binary,
    /// Local grayscale contrast between bubble interior and surround. Used
    /// for camera-sourced images after document scanning.
    Gray,
}

/// Fraction of sampled points inside an ellipse whose binary value is 1.
/// The ellipse is shrunk by 0.75 so the printed outline doesn't bias the
/// count.
pub fn sample_binary(binary: &Binary, cx: f64, cy: f64, rx: f64, ry: f64) -> f64 {
    let (rx, ry) = (rx * 0.75, ry * 0.75);
    let step = (rx.min(ry) / 6.0).max(1.0);

    let mut total = 0u32;
    let mut ink = 0u32;
    let mut y = -ry;
    while y <= ry {
        let mut x = -rx;
        while x <= rx {
            if (x * x) / (rx * rx) + (y * y) / (ry * ry) <= 1.0 {
                let px = (cx + x).round();
                let py = (cy + y).round();
                if px >= 0.0 && py >= 0.0 && (px as u32) < binary.width && (py as u32) < binary.height {
                    total += 1;
                    ink += binary.get(px as u32, py as u32) as u32;
                }
            }
            x += step;
        }
        y += step;
    }

    if total == 0 {
        0.0
    } else {
        ink as f64 / total as f64
    }
}

/// Offsets (in units of `(rx, ry)`) of the six off-bubble probe spots.
const OFFSETS: [(f64, f64); 6] =
    [(0.0, -1.6), (0.0, 1.6), (-1.4, -1.0), (1.4, -1.0), (-1.4, 1.0), (1.4, 1.0)];

/// Contrast between the bubble's inner region and six surrounding patches.
/// Robust to uneven camera lighting because it measures local darkening
/// rather than an absolute threshold.
pub fn sample_gray(gray: &Gray, cx: f64, cy: f64, rx: f64, ry: f64) -> f64 {
    let inner_mean = ellipse_mean(gray, cx, cy, rx * 0.50, ry * 0.50);

    let patch_r = (rx.min(ry) * 0.30).max(2.0);
    let outer_samples: Vec<f64> = OFFSETS
        .iter()
        .map(|&(ox, oy)| {
            let px = cx + ox * rx;
            let py = cy + oy * ry;
            ellipse_mean(gray, px, py, patch_r, patch_r)
        })
        .collect();
    let outer_mean = outer_samples.iter().sum::<f64>() / outer_samples.len() as f64;

    if outer_mean > 10.0 {
        ((outer_mean - inner_mean) / outer_mean).max(0.0)
    } else {
        0.0
    }
}

fn ellipse_mean(gray: &Gray, cx: f64, cy: f64, rx: f64, ry: f64) -> f64 {
    let step = (rx.min(ry) / 6.0).max(1.0);
    let mut total = 0u32;
    let mut sum = 0f64;
    let mut y = -ry;
    while y <= ry {
        let mut x = -rx;
        while x <= rx {
            if (x * x) / (rx * rx).max(1e-6) + (y * y) / (ry * ry).max(1e-6) <= 1.0 {
                let px = (cx + x).round();
                let py = (cy + y).round();
                if px >= 0.0 && py >= 0.0 && (px as u32) < gray.width && (py as u32) < gray.height {
                    total += 1;
                    sum += gray.get(px as u32, py as u32) as f64;
                }
            }
            x += step;
        }
        y += step;
    }
    if total == 0 {
        0.0
    } else {
        sum / total as f64
    }
}
