//! Synthetic-template round-trip tests.
//!
//! The renderer below reproduces the mini-20 template's geometry (frame
//! 91x107mm, 9 ID columns, two 10-question answer blocks) by painting
//! directly onto an RGBA canvas: a white background, four black corner
//! markers, and filled or unfilled bubble circles at the same normalized
//! coordinates `src/template.rs` computes for [`omr_core::TemplateKind`].
//! It does not go through the crate's own layout table, so a passing test
//! is evidence the two independently state the same geometry.

use omr_core::{decode, ImageSource, ImageSurface};

const FRAME_W_MM: f64 = 91.0;
const FRAME_H_MM: f64 = 107.0;
const MARKER_MM: f64 = 4.0;

const ID_FIRST_X_MM: f64 = 10.0;
const ID_FIRST_Y_MM: f64 = 10.0;
const ID_COL_SPACING_MM: f64 = 8.0;
const ID_ROW_SPACING_MM: f64 = 6.0;

const BLOCK_FIRST_Y_MM: f64 = 80.0;
const BLOCK_NX_SPACING_MM: f64 = 8.0;
const BLOCK_NY_SPACING_MM: f64 = 2.5;
const BUBBLE_DIAMETER_MM: f64 = 3.2;

struct Canvas {
    width: u32,
    height: u32,
    rgba: Vec<u8>,
    px_per_mm_x: f64,
    px_per_mm_y: f64,
}

impl Canvas {
    fn new(px_per_mm: f64) -> Self {
        let width = (FRAME_W_MM * px_per_mm) as u32;
        let height = (FRAME_H_MM * px_per_mm) as u32;
        Canvas {
            width,
            height,
            rgba: vec![255u8; (width as usize) * (height as usize) * 4],
            px_per_mm_x: px_per_mm,
            px_per_mm_y: px_per_mm,
        }
    }

    fn set(&mut self, x: i64, y: i64, v: u8) {
        if x < 0 || y < 0 || x as u32 >= self.width || y as u32 >= self.height {
            return;
        }
        let idx = ((y as usize) * (self.width as usize) + x as usize) * 4;
        self.rgba[idx] = v;
        self.rgba[idx + 1] = v;
        self.rgba[idx + 2] = v;
        self.rgba[idx + 3] = 255;
    }

    fn fill_square_mm(&mut self, cx_mm: f64, cy_mm: f64, side_mm: f64, v: u8) {
        let cx = cx_mm * self.px_per_mm_x;
        let cy = cy_mm * self.px_per_mm_y;
        let half = side_mm / 2.0 * self.px_per_mm_x;
        let x0 = (cx - half) as i64;
        let x1 = (cx + half) as i64;
        let y0 = (cy - half) as i64;
        let y1 = (cy + half) as i64;
        for y in y0..=y1 {
            for x in x0..=x1 {
                self.set(x, y, v);
            }
        }
    }

    fn fill_bubble_mm(&mut self, cx_mm: f64, cy_mm: f64, diameter_mm: f64, v: u8) {
        let cx = cx_mm * self.px_per_mm_x;
        let cy = cy_mm * self.px_per_mm_y;
        let rx = diameter_mm / 2.0 * self.px_per_mm_x;
        let ry = diameter_mm / 2.0 * self.px_per_mm_y;
        let y0 = (cy - ry) as i64;
        let y1 = (cy + ry) as i64;
        let x0 = (cx - rx) as i64;
        let x1 = (cx + rx) as i64;
        for y in y0..=y1 {
            for x in x0..=x1 {
                let dx = x as f64 - cx;
                let dy = y as f64 - cy;
                if (dx * dx) / (rx * rx) + (dy * dy) / (ry * ry) <= 1.0 {
                    self.set(x, y, v);
                }
            }
        }
    }

    fn paint_markers(&mut self) {
        self.fill_square_mm(MARKER_MM / 2.0, MARKER_MM / 2.0, MARKER_MM, 0);
        self.fill_square_mm(FRAME_W_MM - MARKER_MM / 2.0, MARKER_MM / 2.0, MARKER_MM, 0);
        self.fill_square_mm(MARKER_MM / 2.0, FRAME_H_MM - MARKER_MM / 2.0, MARKER_MM, 0);
        self.fill_square_mm(FRAME_W_MM - MARKER_MM / 2.0, FRAME_H_MM - MARKER_MM / 2.0, MARKER_MM, 0);
    }

    fn paint_id(&mut self, digits: &[u32]) {
        for (col, &digit) in digits.iter().enumerate() {
            let x_mm = ID_FIRST_X_MM + col as f64 * ID_COL_SPACING_MM;
            let y_mm = ID_FIRST_Y_MM + digit as f64 * ID_ROW_SPACING_MM;
            self.fill_bubble_mm(x_mm, y_mm, BUBBLE_DIAMETER_MM, 20);
        }
    }

    fn paint_answer(&mut self, question: u32, choice: usize) {
        let (block_x_mm, start_q) = if question <= 10 { (10.0, 1) } else { (50.0, 11) };
        let row = (question - start_q) as f64;
        let y_mm = BLOCK_FIRST_Y_MM + row * BLOCK_NY_SPACING_MM;
        let x_mm = block_x_mm + choice as f64 * BLOCK_NX_SPACING_MM;
        self.fill_bubble_mm(x_mm, y_mm, BUBBLE_DIAMETER_MM, 20);
    }

    fn into_surface(self) -> ImageSurface {
        ImageSurface::new(self.width, self.height, self.rgba).unwrap()
    }
}

#[test]
fn blank_mini20_sheet_decodes_to_zero_id_and_empty_answers() {
    let mut canvas = Canvas::new(12.0);
    canvas.paint_markers();
    let image = canvas.into_surface();

    let result = decode(&image, 20, 4, ImageSource::Upload).unwrap();
    assert_eq!(result.student_id, "000000000");
    assert!(result.answers.iter().all(|a| a.is_empty()));
    assert!(result.multi_answer_questions.is_empty());
    assert!(result.id_double_shade_columns.is_empty());
}

#[test]
fn mini20_all_a_decodes_correctly() {
    let mut canvas = Canvas::new(12.0);
    canvas.paint_markers();

    let id_digits = [2, 0, 2, 6, 0, 0, 0, 0, 1];
    canvas.paint_id(&id_digits);
    for q in 1..=20u32 {
        canvas.paint_answer(q, 0);
    }

    let image = canvas.into_surface();
    let result = decode(&image, 20, 4, ImageSource::Upload).unwrap();

    assert_eq!(result.student_id, "202600001");
    assert_eq!(result.answers.len(), 20);
    assert!(result.answers.iter().all(|a| a == "A"));
    assert!(result.multi_answer_questions.is_empty());
}

#[test]
fn input_below_minimum_size_is_rejected() {
    let image = ImageSurface::new(200, 200, vec![255u8; 200 * 200 * 4]).unwrap();
    // Constructing a too-small surface itself already fails; exercise the
    // boundary explicitly through the public constructor.
    let err = ImageSurface::new(10, 10, vec![0u8; 10 * 10 * 4]).unwrap_err();
    assert_eq!(err, omr_core::DecodeError::InputTooSmall { width: 10, height: 10 });

    // A valid-sized but otherwise blank image still decodes without error.
    let result = decode(&image, 20, 4, ImageSource::Upload);
    assert!(result.is_ok());
}
