//! Otsu global thresholding and integral-image adaptive local thresholding.
//!
//! Integral sums are kept as `i64`: a naive `u32` accumulator overflows well
//! inside the resolution range a phone camera produces, which is why this is
//! hand-rolled rather than reached for off the shelf.

use log::trace;
use rayon::prelude::*;

use crate::normalize::Gray;

/// Dense `width x height` array of `{0,1}` ink values (1 = ink).
#[derive(Debug, Clone)]
pub struct Binary {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl Binary {
    #[inline]
    pub fn get(&self, x: u32, y: u32) -> u8 {
        self.data[(y as usize) * (self.width as usize) + x as usize]
    }
}

/// Prefix sums of a [`Gray`], stride `width + 1`, zero-padded on the
/// top/left edge so `sum(x0,y0,x1,y1)` needs no special-casing.
#[derive(Debug, Clone)]
pub struct Integral {
    pub width: u32,
    pub height: u32,
    stride: usize,
    sum: Vec<i64>,
}

impl Integral {
    pub fn build(gray: &Gray) -> Self {
        let w = gray.width as usize;
        let h = gray.height as usize;
        let stride = w + 1;
        let mut sum = vec![0i64; stride * (h + 1)];
        for y in 0..h {
            for x in 0..w {
                let v = gray.data[y * w + x] as i64;
                sum[(y + 1) * stride + (x + 1)] =
                    sum[y * stride + (x + 1)] + sum[(y + 1) * stride + x] - sum[y * stride + x] + v;
            }
        }
        Integral { width: gray.width, height: gray.height, stride, sum }
    }

    /// Sum over the inclusive pixel rectangle `[x0,x1] x [y0,y1]`, clipped to
    /// the image bounds.
    pub fn rect_sum(&self, x0: i64, y0: i64, x1: i64, y1: i64) -> i64 {
        let w = self.width as i64;
        let h = self.height as i64;
        let x0 = x0.clamp(0, w - 1);
        let y0 = y0.clamp(0, h - 1);
        let x1 = x1.clamp(0, w - 1);
        let y1 = y1.clamp(0, h - 1);
        let s = self.stride as i64;
        let at = |x: i64, y: i64| self.sum[(y * s + x) as usize];
        at(x1 + 1, y1 + 1) - at(x0, y1 + 1) - at(x1 + 1, y0) + at(x0, y0)
    }

    pub fn window_mean(&self, cx: i64, cy: i64, half: i64) -> f64 {
        let x0 = cx - half;
        let y0 = cy - half;
        let x1 = cx + half;
        let y1 = cy + half;
        let cx0 = x0.clamp(0, self.width as i64 - 1);
        let cy0 = y0.clamp(0, self.height as i64 - 1);
        let cx1 = x1.clamp(0, self.width as i64 - 1);
        let cy1 = y1.clamp(0, self.height as i64 - 1);
        let area = ((cx1 - cx0 + 1) * (cy1 - cy0 + 1)).max(1);
        self.rect_sum(x0, y0, x1, y1) as f64 / area as f64
    }
}

/// Maximizes between-class variance over the luma histogram. Ties are
/// broken toward the lower threshold.
pub fn otsu_threshold(gray: &Gray) -> u8 {
    let mut hist = [0u64; 256];
    for &v in &gray.data {
        hist[v as usize] += 1;
    }
    let total = gray.data.len() as f64;
    if total == 0.0 {
        return 128;
    }

    let sum_total: f64 = hist.iter().enumerate().map(|(i, &c)| i as f64 * c as f64).sum();

    let mut sum_bg = 0.0;
    let mut weight_bg = 0.0;
    let mut best_variance = -1.0;
    let mut best_threshold = 0u8;

    for t in 0..256 {
        weight_bg += hist[t] as f64;
        if weight_bg == 0.0 {
            continue;
        }
        let weight_fg = total - weight_bg;
        if weight_fg <= 0.0 {
            break;
        }
        sum_bg += t as f64 * hist[t] as f64;
        let mean_bg = sum_bg / weight_bg;
        let mean_fg = (sum_total - sum_bg) / weight_fg;
        let between = weight_bg * weight_fg * (mean_bg - mean_fg).powi(2);
        if between > best_variance {
            best_variance = between;
            best_threshold = t as u8;
        }
    }
    trace!("otsu_threshold: {best_threshold}");
    best_threshold
}

/// Parameters for the adaptive local threshold, one set per image source
/// (see [`crate::tuning::TuningProfile`]).
pub struct AdaptiveParams {
    pub half_block: i64,
    /// Fixed offset subtracted from the local mean. When `None`, the offset
    /// is derived from whole-image brightness (the camera path).
    pub fixed_offset: Option<i64>,
    /// Cap the adaptive threshold at the Otsu value (upload path).
    pub otsu_cap: bool,
}

pub fn adaptive_binarize(gray: &Gray, integral: &Integral, params: &AdaptiveParams) -> Binary {
    let w = gray.width;
    let h = gray.height;
    let otsu = if params.otsu_cap { Some(otsu_threshold(gray) as f64) } else { None };
    let offset = params.fixed_offset.unwrap_or_else(|| {
        let mean_brightness = gray.mean();
        (mean_brightness * 0.06).floor().max(5.0) as i64
    });
    trace!("adaptive_binarize: half_block={} offset={offset} otsu_cap={:?}", params.half_block, otsu);

    let data: Vec<u8> = (0..h)
        .into_par_iter()
        .flat_map_iter(|y| {
            (0..w)
                .map(move |x| {
                    let local_mean = integral.window_mean(x as i64, y as i64, params.half_block);
                    let mut limit = local_mean - offset as f64;
                    if let Some(otsu) = otsu {
                        limit = limit.min(otsu);
                    }
                    if (gray.get(x, y) as f64) < limit {
                        1u8
                    } else {
                        0u8
                    }
                })
                .collect::<Vec<u8>>()
        })
        .collect();

    Binary { width: w, height: h, data }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checkerboard(w: u32, h: u32) -> Gray {
        let mut data = vec![0u8; (w as usize) * (h as usize)];
        for y in 0..h {
            for x in 0..w {
                data[(y as usize) * (w as usize) + x as usize] = if (x + y) % 2 == 0 { 255 } else { 0 };
            }
        }
        Gray { width: w, height: h, data }
    }

    #[test]
    fn integral_matches_brute_force_sum() {
        let gray = checkerboard(20, 20);
        let integral = Integral::build(&gray);
        let (x0, y0, x1, y1) = (3i64, 4i64, 10i64, 12i64);
        let mut expected = 0i64;
        for y in y0..=y1 {
            for x in x0..=x1 {
                expected += gray.get(x as u32, y as u32) as i64;
            }
        }
        assert_eq!(integral.rect_sum(x0, y0, x1, y1), expected);
    }

    #[test]
    fn otsu_splits_bimodal_histogram() {
        let mut data = vec![10u8; 5000];
        data.extend(vec![240u8; 5000]);
        let gray = Gray { width: 100, height: 100, data };
        let t = otsu_threshold(&gray);
        assert!(t > 10 && t < 240, "t={t}");
    }

    #[test]
    fn adaptive_binarize_marks_dark_region() {
        let mut data = vec![230u8; 40 * 40];
        for y in 10..20 {
            for x in 10..20 {
                data[y * 40 + x] = 20;
            }
        }
        let gray = Gray { width: 40, height: 40, data };
        let integral = Integral::build(&gray);
        let params = AdaptiveParams { half_block: 8, fixed_offset: Some(8), otsu_cap: false };
        let binary = adaptive_binarize(&gray, &integral, &params);
        assert_eq!(binary.get(15, 15), 1);
        assert_eq!(binary.get(2, 2), 0);
    }
}
