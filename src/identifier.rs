//! Column-wise digit decoding for the student-identifier grid.

use log::warn;

use crate::coords::Corners;
use crate::normalize::Gray;
use crate::sampler::{sample_binary, sample_gray};
use crate::template::{IdGrid, TemplateLayout};
use crate::threshold::Binary;
use crate::tuning::TuningProfile;

pub struct IdDecode {
    pub student_id: String,
    pub double_shade_columns: Vec<u32>,
}

pub enum SampleSurface<'a> {
    Binary(&'a Binary),
    Gray(&'a Gray),
}

pub fn decode_identifier(
    surface: &SampleSurface,
    corners: &Corners,
    layout: &TemplateLayout,
    profile: &TuningProfile,
) -> IdDecode {
    let grid: &IdGrid = &layout.id_grid;
    let num_columns = layout.kind.id_columns();

    let mut digits = String::with_capacity(num_columns as usize);
    let mut double_shade_columns = Vec::new();

    for col in 0..num_columns {
        let nx = grid.first_nx + col as f64 * grid.col_spacing;
        let mut fills = [0.0f64; 10];
        for (row, fill) in fills.iter_mut().enumerate() {
            let ny = grid.first_ny + row as f64 * grid.row_spacing;
            *fill = sample_at(surface, corners, nx, ny, layout.bubble_dx, layout.bubble_dy);
        }

        let (best_row, max_fill) = argmax(&fills);
        let digit = if max_fill > profile.id_fill_threshold {
            digits.push(std::char::from_digit(best_row as u32, 10).unwrap());
            best_row as u32
        } else {
            digits.push('0');
            0
        };

        let shade_count = fills
            .iter()
            .filter(|&&f| f > profile.id_fill_threshold && f > max_fill * profile.id_double_shade_ratio)
            .count();
        if shade_count >= 2 {
            warn!("decode_identifier: double shade in column {} (digit read as {digit})", col + 1);
            double_shade_columns.push(col + 1);
        }
    }

    IdDecode { student_id: digits, double_shade_columns }
}

pub(crate) fn sample_at(
    surface: &SampleSurface,
    corners: &Corners,
    nx: f64,
    ny: f64,
    bubble_dx: f64,
    bubble_dy: f64,
) -> f64 {
    let center = corners.map(nx, ny);
    let edge = corners.map(nx + bubble_dx / 2.0, ny);
    let rx = (edge.x - center.x).abs().max(1.0);
    let edge_y = corners.map(nx, ny + bubble_dy / 2.0);
    let ry = (edge_y.y - center.y).abs().max(1.0);

    match surface {
        SampleSurface::Binary(binary) => sample_binary(binary, center.x, center.y, rx, ry),
        SampleSurface::Gray(gray) => sample_gray(gray, center.x, center.y, rx, ry),
    }
}

fn argmax(fills: &[f64; 10]) -> (usize, f64) {
    let mut best_idx = 0;
    let mut best_val = fills[0];
    for (i, &v) in fills.iter().enumerate().skip(1) {
        if v > best_val {
            best_val = v;
            best_idx = i;
        }
    }
    (best_idx, best_val)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::Point;
    use crate::template::{registry, TemplateKind};
    use crate::tuning::ImageSource;

    #[test]
    fn unfilled_grid_decodes_to_all_zero() {
        let layout = registry(TemplateKind::Mini20);
        let corners = Corners {
            tl: Point::new(0.0, 0.0),
            tr: Point::new(910.0, 0.0),
            bl: Point::new(0.0, 1070.0),
            br: Point::new(910.0, 1070.0),
        };
        let binary = Binary { width: 910, height: 1070, data: vec![0; 910 * 1070] };
        let profile = TuningProfile::for_source(ImageSource::Upload);
        let decode = decode_identifier(&SampleSurface::Binary(&binary), &corners, &layout, &profile);
        assert_eq!(decode.student_id, "0".repeat(layout.kind.id_columns() as usize));
        assert!(decode.double_shade_columns.is_empty());
    }
}
