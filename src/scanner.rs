//! Paper-quadrilateral detection, perspective rectification, and grid-local
//! brightness equalization for handheld camera photos.

use log::{debug, trace, warn};

use crate::coords::{Corners, Point};
use crate::normalize::Gray;

const EDGE_LUMA_THRESHOLD: f64 = 160.0;
const EDGE_SAMPLE_COUNT: u32 = 60;
const EDGE_BAND_FRACTION: f64 = 0.40;
const CORNER_SEARCH_FRACTION: f64 = 0.05;
const CORNER_PROBE_LEN: f64 = 5.0;
const EQUALIZE_CELL: u32 = 32;

pub struct ScannedPage {
    pub gray: Gray,
    pub width: u32,
    pub height: u32,
}

/// Straightens a handheld photo: locates the paper edges, refines the four
/// corners, warps to a flat rectangle, and equalizes brightness per cell.
/// Returns the input grayscale unchanged (wrapped) if paper edges cannot be
/// localized — downstream stages fall back to full-image corners.
pub fn scan(gray: &Gray) -> ScannedPage {
    match find_paper_corners(gray) {
        Some(corners) => {
            let (out_w, out_h) = output_size(&corners);
            let warped = warp(gray, &corners, out_w, out_h);
            let equalized = equalize_grid(&warped);
            ScannedPage { gray: equalized, width: out_w, height: out_h }
        }
        None => {
            warn!("scan: paper edges not found, passing input through unchanged");
            ScannedPage { gray: gray.clone(), width: gray.width, height: gray.height }
        }
    }
}

fn find_paper_corners(gray: &Gray) -> Option<Corners> {
    let w = gray.width as f64;
    let h = gray.height as f64;

    let mut lefts = Vec::new();
    let mut rights = Vec::new();
    for i in 0..EDGE_SAMPLE_COUNT {
        let y = ((i as f64 + 0.5) / EDGE_SAMPLE_COUNT as f64 * h) as u32;
        if y >= gray.height {
            continue;
        }
        if let Some(x) = scan_row_left(gray, y, (w * EDGE_BAND_FRACTION) as u32) {
            lefts.push(x as f64);
        }
        if let Some(x) = scan_row_right(gray, y, (w * (1.0 - EDGE_BAND_FRACTION)) as u32) {
            rights.push(x as f64);
        }
    }

    let mut tops = Vec::new();
    let mut bottoms = Vec::new();
    for i in 0..EDGE_SAMPLE_COUNT {
        let x = ((i as f64 + 0.5) / EDGE_SAMPLE_COUNT as f64 * w) as u32;
        if x >= gray.width {
            continue;
        }
        if let Some(y) = scan_col_top(gray, x, (h * EDGE_BAND_FRACTION) as u32) {
            tops.push(y as f64);
        }
        if let Some(y) = scan_col_bottom(gray, x, (h * (1.0 - EDGE_BAND_FRACTION)) as u32) {
            bottoms.push(y as f64);
        }
    }

    if lefts.len() < 4 || rights.len() < 4 || tops.len() < 4 || bottoms.len() < 4 {
        return None;
    }

    let left = percentile(&mut lefts, 0.30);
    let right = percentile(&mut rights, 0.70);
    let top = percentile(&mut tops, 0.30);
    let bottom = percentile(&mut bottoms, 0.70);

    debug!("find_paper_corners: bounds left={left:.0} right={right:.0} top={top:.0} bottom={bottom:.0}");

    let radius = (gray.width.min(gray.height) as f64) * CORNER_SEARCH_FRACTION;
    let tl = refine_corner(gray, Point::new(left, top), radius, (1.0, 1.0));
    let tr = refine_corner(gray, Point::new(right, top), radius, (-1.0, 1.0));
    let bl = refine_corner(gray, Point::new(left, bottom), radius, (1.0, -1.0));
    let br = refine_corner(gray, Point::new(right, bottom), radius, (-1.0, -1.0));

    Some(Corners { tl, tr, bl, br })
}

fn scan_row_left(gray: &Gray, y: u32, limit: u32) -> Option<u32> {
    (0..limit.min(gray.width)).find(|&x| gray.get(x, y) as f64 > EDGE_LUMA_THRESHOLD)
}

fn scan_row_right(gray: &Gray, y: u32, start: u32) -> Option<u32> {
    (start..gray.width).rev().find(|&x| gray.get(x, y) as f64 > EDGE_LUMA_THRESHOLD)
}

fn scan_col_top(gray: &Gray, x: u32, limit: u32) -> Option<u32> {
    (0..limit.min(gray.height)).find(|&y| gray.get(x, y) as f64 > EDGE_LUMA_THRESHOLD)
}

fn scan_col_bottom(gray: &Gray, x: u32, start: u32) -> Option<u32> {
    (start..gray.height).rev().find(|&y| gray.get(x, y) as f64 > EDGE_LUMA_THRESHOLD)
}

fn percentile(values: &mut [f64], p: f64) -> f64 {
    values.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let idx = ((values.len() as f64 - 1.0) * p).round().clamp(0.0, (values.len() - 1) as f64) as usize;
    values[idx]
}

/// Searches a window around `approx` for the pixel that maximizes
/// `inner_luma - outer_luma` along a probe pointing toward the paper
/// interior (`inward`), the point where paper-inside is brightest relative
/// to just-outside.
fn refine_corner(gray: &Gray, approx: Point, radius: f64, inward: (f64, f64)) -> Point {
    let mut best = approx;
    let mut best_score = f64::MIN;
    let step = (radius / 6.0).max(1.0);

    let mut dy = -radius;
    while dy <= radius {
        let mut dx = -radius;
        while dx <= radius {
            let x = approx.x + dx;
            let y = approx.y + dy;
            if x < 0.0 || y < 0.0 || x as u32 >= gray.width || y as u32 >= gray.height {
                dx += step;
                continue;
            }
            let inner_x = (x + inward.0 * CORNER_PROBE_LEN).clamp(0.0, gray.width as f64 - 1.0);
            let inner_y = (y + inward.1 * CORNER_PROBE_LEN).clamp(0.0, gray.height as f64 - 1.0);
            let outer_x = (x - inward.0 * CORNER_PROBE_LEN).clamp(0.0, gray.width as f64 - 1.0);
            let outer_y = (y - inward.1 * CORNER_PROBE_LEN).clamp(0.0, gray.height as f64 - 1.0);
            let inner = gray.get(inner_x as u32, inner_y as u32) as f64;
            let outer = gray.get(outer_x as u32, outer_y as u32) as f64;
            let score = inner - outer;
            if score > best_score {
                best_score = score;
                best = Point::new(x, y);
            }
            dx += step;
        }
        dy += step;
    }
    best
}

fn output_size(corners: &Corners) -> (u32, u32) {
    let top_len = dist(corners.tl, corners.tr);
    let bottom_len = dist(corners.bl, corners.br);
    let left_len = dist(corners.tl, corners.bl);
    let right_len = dist(corners.tr, corners.br);
    let w = top_len.max(bottom_len).max(800.0) as u32;
    let h = left_len.max(right_len).max(1000.0) as u32;
    (w, h)
}

fn dist(a: Point, b: Point) -> f64 {
    ((a.x - b.x).powi(2) + (a.y - b.y).powi(2)).sqrt()
}

fn warp(gray: &Gray, corners: &Corners, out_w: u32, out_h: u32) -> Gray {
    let mut data = vec![0u8; (out_w as usize) * (out_h as usize)];
    for oy in 0..out_h {
        let ty = oy as f64 / out_h as f64;
        for ox in 0..out_w {
            let tx = ox as f64 / out_w as f64;
            let src = corners.map(tx, ty);
            let sx = (src.x.round()).clamp(0.0, gray.width as f64 - 1.0) as u32;
            let sy = (src.y.round()).clamp(0.0, gray.height as f64 - 1.0) as u32;
            data[(oy as usize) * (out_w as usize) + ox as usize] = gray.get(sx, sy);
        }
    }
    Gray { width: out_w, height: out_h, data }
}

/// Scales every pixel in each `EQUALIZE_CELL`-sided cell by
/// `250 / max(100, local_p90)`, making paper white independent of
/// illumination while leaving dark pencil marks mostly untouched since the
/// scale factor comes from the bright end of the local histogram.
fn equalize_grid(gray: &Gray) -> Gray {
    let w = gray.width;
    let h = gray.height;
    let cells_x = (w + EQUALIZE_CELL - 1) / EQUALIZE_CELL;
    let cells_y = (h + EQUALIZE_CELL - 1) / EQUALIZE_CELL;
    let mut scale = vec![1.0f64; (cells_x as usize) * (cells_y as usize)];

    for cy in 0..cells_y {
        for cx in 0..cells_x {
            let x0 = cx * EQUALIZE_CELL;
            let y0 = cy * EQUALIZE_CELL;
            let x1 = (x0 + EQUALIZE_CELL).min(w);
            let y1 = (y0 + EQUALIZE_CELL).min(h);
            let mut values = Vec::new();
            for y in y0..y1 {
                for x in x0..x1 {
                    values.push(gray.get(x, y));
                }
            }
            let p90 = percentile_u8(&mut values, 0.90);
            scale[(cy as usize) * (cells_x as usize) + cx as usize] = 250.0 / (p90 as f64).max(100.0);
        }
    }

    let mut data = vec![0u8; (w as usize) * (h as usize)];
    for y in 0..h {
        let cy = (y / EQUALIZE_CELL).min(cells_y - 1);
        for x in 0..w {
            let cx = (x / EQUALIZE_CELL).min(cells_x - 1);
            let s = scale[(cy as usize) * (cells_x as usize) + cx as usize];
            let v = gray.get(x, y) as f64 * s;
            data[(y as usize) * (w as usize) + x as usize] = v.clamp(0.0, 255.0).round() as u8;
        }
    }
    trace!("equalize_grid: {cells_x}x{cells_y} cells");
    Gray { width: w, height: h, data }
}

fn percentile_u8(values: &mut [u8], p: f64) -> u8 {
    if values.is_empty() {
        return 255;
    }
    values.sort_unstable();
    let idx = ((values.len() as f64 - 1.0) * p).round().clamp(0.0, (values.len() - 1) as f64) as usize;
    values[idx]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bordered_page(w: u32, h: u32) -> Gray {
        let mut data = vec![40u8; (w as usize) * (h as usize)];
        let margin = w.min(h) / 10;
        for y in margin..(h - margin) {
            for x in margin..(w - margin) {
                data[(y as usize) * (w as usize) + x as usize] = 240;
            }
        }
        Gray { width: w, height: h, data }
    }

    #[test]
    fn locates_paper_edges_on_bordered_page() {
        let gray = bordered_page(400, 500);
        let corners = find_paper_corners(&gray).expect("should find paper");
        assert!(corners.tl.x < corners.tr.x);
        assert!(corners.tl.y < corners.bl.y);
    }

    #[test]
    fn scan_passes_through_when_no_paper_found() {
        let flat = Gray { width: 400, height: 400, data: vec![128; 400 * 400] };
        let scanned = scan(&flat);
        assert_eq!(scanned.width, 400);
        assert_eq!(scanned.height, 400);
    }

    #[test]
    fn equalize_grid_whitens_bright_cells() {
        let gray = Gray { width: 64, height: 64, data: vec![200u8; 64 * 64] };
        let eq = equalize_grid(&gray);
        assert!(eq.data.iter().all(|&v| v >= 200));
    }
}
