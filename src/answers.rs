//! Per-question answer decoding.

use log::warn;

use crate::coords::Corners;
use crate::identifier::{sample_at, SampleSurface};
use crate::template::TemplateLayout;
use crate::tuning::TuningProfile;

pub struct AnswerDecode {
    pub answers: Vec<String>,
    pub multi_answer_questions: Vec<u32>,
}

const WEAK_SIGNAL_FLOOR: f64 = 0.15;
const WEAK_SIGNAL_RATIO: f64 = 2.0;

pub fn decode_answers(
    surface: &SampleSurface,
    corners: &Corners,
    layout: &TemplateLayout,
    choices: u32,
    profile: &TuningProfile,
) -> AnswerDecode {
    let num_items = layout.kind.num_items();
    let mut answers = vec![String::new(); num_items as usize];
    let mut multi_answer_questions = Vec::new();

    for block in &layout.answer_blocks {
        for q in block.start_q..=block.end_q {
            let row = (q - block.start_q) as f64;
            let ny = block.first_ny + row * block.ny_spacing;

            let mut fills = vec![0.0f64; choices as usize];
            for (c, fill) in fills.iter_mut().enumerate() {
                let nx = block.first_nx + c as f64 * block.nx_spacing;
                *fill = sample_at(surface, corners, nx, ny, layout.bubble_dx, layout.bubble_dy);
            }

            let mut order: Vec<usize> = (0..fills.len()).collect();
            order.sort_by(|&a, &b| fills[b].partial_cmp(&fills[a]).unwrap());
            let best = order[0];
            let max_fill = fills[best];

            if max_fill > profile.answer_fill_threshold {
                let rejected = profile.weak_signal_rejection && is_weak_signal(&fills, best, max_fill);
                if !rejected {
                    answers[(q - 1) as usize] = choice_letter(best);
                } else {
                    warn!("decode_answers: weak signal rejected for question {q}");
                }
            }

            if fills.len() >= 2 {
                let second = fills[order[1]];
                if second > profile.answer_fill_threshold && second >= profile.multi_answer_ratio * max_fill {
                    multi_answer_questions.push(q);
                }
            }
        }
    }

    multi_answer_questions.sort_unstable();
    AnswerDecode { answers, multi_answer_questions }
}

fn is_weak_signal(fills: &[f64], best: usize, max_fill: f64) -> bool {
    if max_fill >= WEAK_SIGNAL_FLOOR {
        return false;
    }
    let others_sum: f64 = fills.iter().enumerate().filter(|&(i, _)| i != best).map(|(_, &f)| f).sum();
    let others_count = (fills.len() - 1).max(1);
    let others_avg = others_sum / others_count as f64;
    max_fill < WEAK_SIGNAL_RATIO * others_avg.max(1e-9)
}

fn choice_letter(index: usize) -> String {
    ((b'A' + index as u8) as char).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::Point;
    use crate::template::{registry, TemplateKind};
    use crate::threshold::Binary;
    use crate::tuning::ImageSource;

    #[test]
    fn blank_sheet_decodes_to_all_empty() {
        let layout = registry(TemplateKind::Mini20);
        let corners = Corners {
            tl: Point::new(0.0, 0.0),
            tr: Point::new(910.0, 0.0),
            bl: Point::new(0.0, 1070.0),
            br: Point::new(910.0, 1070.0),
        };
        let binary = Binary { width: 910, height: 1070, data: vec![0; 910 * 1070] };
        let profile = TuningProfile::for_source(ImageSource::Upload);
        let decode = decode_answers(&SampleSurface::Binary(&binary), &corners, &layout, 4, &profile);
        assert!(decode.answers.iter().all(|a| a.is_empty()));
        assert!(decode.multi_answer_questions.is_empty());
    }
}
