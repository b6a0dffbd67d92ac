//! Grayscale extraction and percentile contrast stretch.

use crate::image_surface::ImageSurface;
use log::trace;

/// Dense `width x height` array of 8-bit luma.
#[derive(Debug, Clone)]
pub struct Gray {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl Gray {
    #[inline]
    pub fn get(&self, x: u32, y: u32) -> u8 {
        self.data[(y as usize) * (self.width as usize) + x as usize]
    }

    #[inline]
    pub fn set(&mut self, x: u32, y: u32, v: u8) {
        let idx = (y as usize) * (self.width as usize) + x as usize;
        self.data[idx] = v;
    }

    pub fn mean(&self) -> f64 {
        if self.data.is_empty() {
            return 0.0;
        }
        self.data.iter().map(|&v| v as u64).sum::<u64>() as f64 / self.data.len() as f64
    }
}

/// BT.601 luma weights, rounded half-up.
const LUMA_R: f64 = 0.299;
const LUMA_G: f64 = 0.587;
const LUMA_B: f64 = 0.114;

pub fn to_grayscale(image: &ImageSurface) -> Gray {
    let (w, h) = (image.width(), image.height());
    let mut data = Vec::with_capacity((w as usize) * (h as usize));
    for y in 0..h {
        for x in 0..w {
            let [r, g, b, _a] = image.pixel(x, y);
            let luma = LUMA_R * r as f64 + LUMA_G * g as f64 + LUMA_B * b as f64;
            data.push((luma + 0.5).floor().clamp(0.0, 255.0) as u8);
        }
    }
    Gray { width: w, height: h, data }
}

/// Percentile (2nd/98th) contrast stretch. Samples ~10,000 values at a
/// uniform stride so the cost stays flat for very large images.
pub fn normalize_contrast(gray: &Gray) -> Gray {
    const SAMPLE_TARGET: usize = 10_000;
    let total = gray.data.len();
    let stride = (total / SAMPLE_TARGET).max(1);

    let mut sample: Vec<u8> = gray.data.iter().step_by(stride).copied().collect();
    sample.sort_unstable();

    let (g_min, g_max) = if sample.is_empty() {
        (0u8, 255u8)
    } else {
        let p2 = percentile_index(sample.len(), 0.02);
        let p98 = percentile_index(sample.len(), 0.98);
        (sample[p2], sample[p98])
    };
    trace!("normalize_contrast: gMin={g_min} gMax={g_max}");

    let denom = (g_max as i32 - g_min as i32).max(1) as f64;
    let data = gray
        .data
        .iter()
        .map(|&v| {
            let stretched = (v as f64 - g_min as f64) / denom * 255.0;
            (stretched.round()).clamp(0.0, 255.0) as u8
        })
        .collect();

    Gray { width: gray.width, height: gray.height, data }
}

fn percentile_index(len: usize, p: f64) -> usize {
    ((len as f64 - 1.0) * p).round().clamp(0.0, (len - 1) as f64) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat_image(w: u32, h: u32, val: u8) -> ImageSurface {
        ImageSurface::new(w, h, vec![val; (w as usize) * (h as usize) * 4]).unwrap()
    }

    #[test]
    fn grayscale_of_white_is_white() {
        let img = flat_image(200, 200, 255);
        let gray = to_grayscale(&img);
        assert!(gray.data.iter().all(|&v| v == 255));
    }

    #[test]
    fn contrast_stretch_spans_full_range_on_gradient() {
        let w = 256u32;
        let h = 200u32;
        let mut rgba = vec![0u8; (w as usize) * (h as usize) * 4];
        for y in 0..h {
            for x in 0..w {
                let idx = ((y as usize) * (w as usize) + x as usize) * 4;
                let v = x as u8;
                rgba[idx] = v;
                rgba[idx + 1] = v;
                rgba[idx + 2] = v;
                rgba[idx + 3] = 255;
            }
        }
        let img = ImageSurface::new(w, h, rgba).unwrap();
        let gray = to_grayscale(&img);
        let stretched = normalize_contrast(&gray);
        let min = *stretched.data.iter().min().unwrap();
        let max = *stretched.data.iter().max().unwrap();
        assert!(min < 10, "min={min}");
        assert!(max > 245, "max={max}");
    }
}
