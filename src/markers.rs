//! Corner alignment-square search.

use log::{trace, warn};

use crate::coords::{Corners, Point};
use crate::normalize::Gray;
use crate::threshold::Binary;
use crate::tuning::MarkerParams;

#[derive(Debug, Clone, Copy)]
struct Candidate {
    center: Point,
    size: f64,
    density: f64,
}

/// Search region corner tag, used to decide which direction a candidate's
/// surrounding ring probes outward from the paper.
#[derive(Debug, Clone, Copy)]
enum CornerTag {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

const SIZE_SCALES: [f64; 4] = [0.7, 1.0, 1.3, 1.6];

/// Locates the four corner markers within `paper_bounds` (or the full
/// image when no paper bounds were established). Returns the resulting
/// corners and whether every geometric validation passed.
pub fn locate_markers(
    gray: &Gray,
    binary: &Binary,
    paper_bounds: (f64, f64, f64, f64),
    params: &MarkerParams,
) -> (Corners, bool) {
    let (px0, py0, px1, py1) = paper_bounds;
    let paper_w = px1 - px0;
    let paper_h = py1 - py0;
    let region_side = params.search_fraction * paper_w.min(paper_h);

    let tl = search_region(gray, binary, px0, py0, region_side, params, CornerTag::TopLeft);
    let tr = search_region(gray, binary, px1 - region_side, py0, region_side, params, CornerTag::TopRight);
    let bl = search_region(gray, binary, px0, py1 - region_side, region_side, params, CornerTag::BottomLeft);
    let br = search_region(gray, binary, px1 - region_side, py1 - region_side, region_side, params, CornerTag::BottomRight);

    let corners = Corners { tl: tl.center, tr: tr.center, bl: bl.center, br: br.center };

    let densities_ok =
        [tl, tr, bl, br].iter().all(|c| c.density >= params.min_density);
    let geometry_ok = corners.is_plausible(params);
    let found = densities_ok && geometry_ok;

    if !found {
        warn!(
            "locate_markers: validation failed (densities_ok={densities_ok} geometry_ok={geometry_ok} \
             densities=[{:.2},{:.2},{:.2},{:.2}])",
            tl.density, tr.density, bl.density, br.density
        );
    }

    (corners, found)
}

fn search_region(
    gray: &Gray,
    binary: &Binary,
    x0: f64,
    y0: f64,
    side: f64,
    params: &MarkerParams,
    tag: CornerTag,
) -> Candidate {
    // `side` is `search_fraction * paperDim`; recover paperDim to get the
    // nominal marker size `max(10, paperDim * 0.035)`.
    let paper_dim = side / params.search_fraction;
    let s0 = (paper_dim * 0.035).max(10.0);

    let step = (side / 8.0).max(1.0);
    let mut best = Candidate { center: Point::new(x0 + side / 2.0, y0 + side / 2.0), size: s0, density: 0.0 };

    let mut cy = y0;
    while cy <= y0 + side {
        let mut cx = x0;
        while cx <= x0 + side {
            for &scale in &SIZE_SCALES {
                let s = s0 * scale;
                let density = patch_density(binary, cx, cy, s);
                if params.reject_dark_surround && surround_mean(gray, cx, cy, s, tag) < 120.0 {
                    continue;
                }
                if density > best.density {
                    best = Candidate { center: Point::new(cx, cy), size: s, density };
                }
            }
            cx += step;
        }
        cy += step;
    }

    trace!("search_region: best density={:.3} size={:.1}", best.density, best.size);
    best
}

fn patch_density(binary: &Binary, cx: f64, cy: f64, s: f64) -> f64 {
    let half = s / 2.0;
    let sample_step = (s / 4.0).max(1.0);
    let mut total = 0u32;
    let mut ink = 0u32;
    let mut y = cy - half;
    while y <= cy + half {
        let mut x = cx - half;
        while x <= cx + half {
            if x >= 0.0 && y >= 0.0 && (x as u32) < binary.width && (y as u32) < binary.height {
                total += 1;
                ink += binary.get(x as u32, y as u32) as u32;
            }
            x += sample_step;
        }
        y += sample_step;
    }
    if total == 0 {
        0.0
    } else {
        ink as f64 / total as f64
    }
}

/// Mean luma at 8 probe points on a ring of radius `1.5*s` around the
/// candidate, restricted to the side that faces away from the paper
/// interior (a true marker sits on bright paper; a shadow or table edge
/// does not).
fn surround_mean(gray: &Gray, cx: f64, cy: f64, s: f64, tag: CornerTag) -> f64 {
    let r = 1.5 * s;
    let (dx_sign, dy_sign): (f64, f64) = match tag {
        CornerTag::TopLeft => (-1.0, -1.0),
        CornerTag::TopRight => (1.0, -1.0),
        CornerTag::BottomLeft => (-1.0, 1.0),
        CornerTag::BottomRight => (1.0, 1.0),
    };
    let mut sum = 0.0;
    let mut count = 0u32;
    for i in 0..8 {
        let angle = std::f64::consts::PI * 2.0 * (i as f64) / 8.0;
        let px = cx + dx_sign * r * angle.cos().abs();
        let py = cy + dy_sign * r * angle.sin().abs();
        if px >= 0.0 && py >= 0.0 && (px as u32) < gray.width && (py as u32) < gray.height {
            sum += gray.get(px as u32, py as u32) as f64;
            count += 1;
        }
    }
    if count == 0 {
        255.0
    } else {
        sum / count as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(w: u32, h: u32, v: u8) -> Gray {
        Gray { width: w, height: h, data: vec![v; (w as usize) * (h as usize)] }
    }

    #[test]
    fn finds_dense_square_in_corner() {
        let w = 200u32;
        let h = 200u32;
        let gray = solid(w, h, 230);
        let mut binary = Binary { width: w, height: h, data: vec![0; (w as usize) * (h as usize)] };
        for y in 5..20 {
            for x in 5..20 {
                binary.data[(y as usize) * (w as usize) + x as usize] = 1;
            }
        }
        let params = MarkerParams {
            search_fraction: 0.30,
            min_density: 0.3,
            min_aspect_ratio: 0.85,
            max_aspect_ratio: 2.0,
            reject_dark_surround: false,
        };
        let (corners, _found) =
            locate_markers(&gray, &binary, (0.0, 0.0, w as f64, h as f64), &params);
        assert!(corners.tl.x < 40.0 && corners.tl.y < 40.0);
    }
}
