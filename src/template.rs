//! The three fixed bubble-sheet layouts, expressed as normalized fractions
//! of the marker-enclosed frame.
//!
//! The mini (20-item) and half-page (50-item) geometries are not pinned
//! down to the millimetre by the source material the way the 100-item
//! sheet is; the constants below are a self-consistent layout derived from
//! the stated frame size, bubble diameter, and block-partition invariants.
//! The 100-item constants, including the `+5.0mm` calibration offset, are
//! reproduced verbatim.

use crate::error::DecodeError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateKind {
    Mini20,
    Half50,
    Full100,
}

impl TemplateKind {
    pub fn for_num_items(num_items: u32) -> Result<Self, DecodeError> {
        match num_items {
            1..=20 => Ok(TemplateKind::Mini20),
            21..=50 => Ok(TemplateKind::Half50),
            51..=100 => Ok(TemplateKind::Full100),
            _ => Err(DecodeError::UnsupportedTemplate { num_items }),
        }
    }

    pub fn num_items(self) -> u32 {
        match self {
            TemplateKind::Mini20 => 20,
            TemplateKind::Half50 => 50,
            TemplateKind::Full100 => 100,
        }
    }

    pub fn id_columns(self) -> u32 {
        match self {
            TemplateKind::Mini20 | TemplateKind::Half50 => 9,
            TemplateKind::Full100 => 10,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct IdGrid {
    pub first_nx: f64,
    pub first_ny: f64,
    pub col_spacing: f64,
    pub row_spacing: f64,
}

/// A rectangular group of consecutive questions. Row `r` (0-based) within
/// the block is question `start_q + r`.
#[derive(Debug, Clone, Copy)]
pub struct AnswerBlock {
    pub start_q: u32,
    pub end_q: u32,
    pub first_nx: f64,
    pub first_ny: f64,
    pub nx_spacing: f64,
    pub ny_spacing: f64,
}

pub struct TemplateLayout {
    pub kind: TemplateKind,
    pub id_grid: IdGrid,
    pub answer_blocks: Vec<AnswerBlock>,
    pub bubble_dx: f64,
    pub bubble_dy: f64,
}

impl TemplateLayout {
    pub fn rows_for_block(&self, block: &AnswerBlock) -> u32 {
        block.end_q - block.start_q + 1
    }
}

/// The `+5.0mm` x-correction applied to every 100-item answer block,
/// compensating an off-by-one shift between block origin and first-bubble
/// column in the PDF generator.
const FULL100_X_CALIBRATION_MM: f64 = 5.0;

pub fn registry(kind: TemplateKind) -> TemplateLayout {
    match kind {
        TemplateKind::Mini20 => mini20(),
        TemplateKind::Half50 => half50(),
        TemplateKind::Full100 => full100(),
    }
}

fn mini20() -> TemplateLayout {
    const FRAME_W: f64 = 91.0;
    const FRAME_H: f64 = 107.0;
    const BUBBLE_MM: f64 = 3.2;

    let id_grid = IdGrid {
        first_nx: 10.0 / FRAME_W,
        first_ny: 10.0 / FRAME_H,
        col_spacing: 8.0 / FRAME_W,
        row_spacing: 6.0 / FRAME_H,
    };
    let answer_blocks = vec![
        AnswerBlock {
            start_q: 1,
            end_q: 10,
            first_nx: 10.0 / FRAME_W,
            first_ny: 80.0 / FRAME_H,
            nx_spacing: 8.0 / FRAME_W,
            ny_spacing: 2.5 / FRAME_H,
        },
        AnswerBlock {
            start_q: 11,
            end_q: 20,
            first_nx: 50.0 / FRAME_W,
            first_ny: 80.0 / FRAME_H,
            nx_spacing: 8.0 / FRAME_W,
            ny_spacing: 2.5 / FRAME_H,
        },
    ];

    TemplateLayout {
        kind: TemplateKind::Mini20,
        id_grid,
        answer_blocks,
        bubble_dx: BUBBLE_MM / FRAME_W,
        bubble_dy: BUBBLE_MM / FRAME_H,
    }
}

fn half50() -> TemplateLayout {
    const FRAME_W: f64 = 91.0;
    const FRAME_H: f64 = 211.0;
    const BUBBLE_MM: f64 = 3.2;

    let id_grid = IdGrid {
        first_nx: 10.0 / FRAME_W,
        first_ny: 8.0 / FRAME_H,
        col_spacing: 8.0 / FRAME_W,
        row_spacing: 5.0 / FRAME_H,
    };

    let left_x = 10.0 / FRAME_W;
    let right_x = 50.0 / FRAME_W;
    let nx_spacing = 8.0 / FRAME_W;
    let ny_spacing = 4.5 / FRAME_H;

    let answer_blocks = vec![
        AnswerBlock { start_q: 1, end_q: 10, first_nx: left_x, first_ny: 65.0 / FRAME_H, nx_spacing, ny_spacing },
        AnswerBlock { start_q: 11, end_q: 20, first_nx: left_x, first_ny: 115.0 / FRAME_H, nx_spacing, ny_spacing },
        AnswerBlock { start_q: 21, end_q: 30, first_nx: left_x, first_ny: 165.0 / FRAME_H, nx_spacing, ny_spacing },
        AnswerBlock { start_q: 31, end_q: 40, first_nx: right_x, first_ny: 65.0 / FRAME_H, nx_spacing, ny_spacing },
        AnswerBlock { start_q: 41, end_q: 50, first_nx: right_x, first_ny: 115.0 / FRAME_H, nx_spacing, ny_spacing },
    ];

    TemplateLayout {
        kind: TemplateKind::Half50,
        id_grid,
        answer_blocks,
        bubble_dx: BUBBLE_MM / FRAME_W,
        bubble_dy: BUBBLE_MM / FRAME_H,
    }
}

fn full100() -> TemplateLayout {
    const FRAME_W: f64 = 197.0;
    const FRAME_H: f64 = 215.5;
    const BUBBLE_MM: f64 = 3.8;

    let id_grid = IdGrid {
        first_nx: 14.5 / FRAME_W,
        first_ny: 46.5 / FRAME_H,
        col_spacing: 8.0 / FRAME_W,
        row_spacing: 7.0 / FRAME_H,
    };

    let beside_id_x = (101.5 + FULL100_X_CALIBRATION_MM) / FRAME_W;
    let beside_nx_spacing = 8.0 / FRAME_W;
    let beside_ny_spacing = 7.0 / FRAME_H;

    let bottom_nx_spacing = 6.0 / FRAME_W;
    let bottom_ny_spacing = 3.3 / FRAME_H;
    let bottom_col_width = 44.0;
    let bottom_x0 = 8.0 + FULL100_X_CALIBRATION_MM;

    let mut answer_blocks = vec![
        AnswerBlock {
            start_q: 41,
            end_q: 50,
            first_nx: beside_id_x,
            first_ny: 46.5 / FRAME_H,
            nx_spacing: beside_nx_spacing,
            ny_spacing: beside_ny_spacing,
        },
        AnswerBlock {
            start_q: 71,
            end_q: 80,
            first_nx: beside_id_x,
            first_ny: 130.0 / FRAME_H,
            nx_spacing: beside_nx_spacing,
            ny_spacing: beside_ny_spacing,
        },
    ];

    // 4-wide x 2-tall bottom grid: row 1 holds Q1-10/11-20/21-30/31-40,
    // row 2 holds Q51-60/61-70/81-90/91-100.
    let row1_starts = [1u32, 11, 21, 31];
    let row2_starts = [51u32, 61, 81, 91];
    for (col, &start_q) in row1_starts.iter().enumerate() {
        answer_blocks.push(AnswerBlock {
            start_q,
            end_q: start_q + 9,
            first_nx: (bottom_x0 + col as f64 * bottom_col_width) / FRAME_W,
            first_ny: 150.0 / FRAME_H,
            nx_spacing: bottom_nx_spacing,
            ny_spacing: bottom_ny_spacing,
        });
    }
    for (col, &start_q) in row2_starts.iter().enumerate() {
        answer_blocks.push(AnswerBlock {
            start_q,
            end_q: start_q + 9,
            first_nx: (bottom_x0 + col as f64 * bottom_col_width) / FRAME_W,
            first_ny: 184.0 / FRAME_H,
            nx_spacing: bottom_nx_spacing,
            ny_spacing: bottom_ny_spacing,
        });
    }

    TemplateLayout {
        kind: TemplateKind::Full100,
        id_grid,
        answer_blocks,
        bubble_dx: BUBBLE_MM / FRAME_W,
        bubble_dy: BUBBLE_MM / FRAME_H,
    }
}
