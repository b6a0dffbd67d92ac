//! Dispatches the upload / camera-live / camera-final decode paths and
//! assembles the final [`DecodeResult`]. Never raises beyond input
//! validation: every algorithmic failure mode degrades in place.

use log::debug;

use crate::coords::Corners;
use crate::error::DecodeError;
use crate::identifier::{decode_identifier, SampleSurface};
use crate::image_surface::ImageSurface;
use crate::answers::decode_answers;
use crate::markers::locate_markers;
use crate::normalize::{normalize_contrast, to_grayscale};
use crate::result::DecodeResult;
use crate::scanner::scan;
use crate::template::{registry, TemplateKind};
use crate::threshold::{adaptive_binarize, AdaptiveParams, Integral};
use crate::tuning::{ImageSource, TuningProfile};

const MIN_CHOICES: u32 = 2;
const MAX_CHOICES: u32 = 8;

pub fn decode(
    image: &ImageSurface,
    num_items: u32,
    choices: u32,
    source: ImageSource,
) -> Result<DecodeResult, DecodeError> {
    debug!(
        "decode: width={} height={} num_items={num_items} choices={choices} source={source:?}",
        image.width(),
        image.height()
    );

    if !(MIN_CHOICES..=MAX_CHOICES).contains(&choices) {
        return Err(DecodeError::UnsupportedChoices { choices });
    }
    let kind = TemplateKind::for_num_items(num_items)?;
    let profile = TuningProfile::for_source(source);

    match source {
        ImageSource::CameraLive => Ok(decode_camera_live(image, &profile)),
        ImageSource::Upload => Ok(decode_upload(image, kind, choices, &profile)),
        ImageSource::CameraFinal => Ok(decode_camera_final(image, kind, choices, &profile)),
    }
}

fn decode_upload(
    image: &ImageSurface,
    kind: TemplateKind,
    choices: u32,
    profile: &TuningProfile,
) -> DecodeResult {
    let gray = normalize_contrast(&to_grayscale(image));
    let integral = Integral::build(&gray);
    let adaptive = AdaptiveParams {
        half_block: (gray.width.min(gray.height) as i64 / 40).max(8),
        fixed_offset: Some(8),
        otsu_cap: true,
    };
    let binary = adaptive_binarize(&gray, &integral, &adaptive);

    let bounds = (0.0, 0.0, gray.width as f64, gray.height as f64);
    let (corners, markers_found) = locate_markers(&gray, &binary, bounds, &profile.marker);
    let corners = effective_corners(corners, markers_found, gray.width, gray.height, 0.02);

    let layout = registry(kind);
    let surface = SampleSurface::Binary(&binary);
    assemble(&surface, &corners, &layout, choices, profile, markers_found)
}

fn decode_camera_final(
    image: &ImageSurface,
    kind: TemplateKind,
    choices: u32,
    profile: &TuningProfile,
) -> DecodeResult {
    let raw_gray = to_grayscale(image);
    let scanned = scan(&raw_gray);
    let gray = normalize_contrast(&scanned.gray);
    let integral = Integral::build(&gray);

    let mean_brightness = gray.mean();
    let adaptive = AdaptiveParams {
        half_block: (gray.width.min(gray.height) as i64 / 20).max(15),
        fixed_offset: Some((mean_brightness * 0.06).floor().max(5.0) as i64),
        otsu_cap: false,
    };
    let binary = adaptive_binarize(&gray, &integral, &adaptive);

    let bounds = (0.0, 0.0, gray.width as f64, gray.height as f64);
    let (corners, markers_found) = locate_markers(&gray, &binary, bounds, &profile.marker);
    let corners = effective_corners(corners, markers_found, gray.width, gray.height, 0.04);

    let layout = registry(kind);
    let surface = SampleSurface::Gray(&gray);
    assemble(&surface, &corners, &layout, choices, profile, markers_found)
}

fn decode_camera_live(image: &ImageSurface, profile: &TuningProfile) -> DecodeResult {
    let gray = to_grayscale(image);
    let integral = Integral::build(&gray);
    let mean_brightness = gray.mean();
    let adaptive = AdaptiveParams {
        half_block: (gray.width.min(gray.height) as i64 / 20).max(15),
        fixed_offset: Some((mean_brightness * 0.06).floor().max(5.0) as i64),
        otsu_cap: false,
    };
    let binary = adaptive_binarize(&gray, &integral, &adaptive);
    let bounds = (0.0, 0.0, gray.width as f64, gray.height as f64);
    let (_corners, markers_found) = locate_markers(&gray, &binary, bounds, &profile.marker);

    // Live preview only reports marker locations for UI overlay; no
    // bubble decoding is performed.
    DecodeResult {
        student_id: String::new(),
        id_double_shade_columns: Vec::new(),
        answers: Vec::new(),
        multi_answer_questions: Vec::new(),
        markers_found,
    }
}

fn effective_corners(corners: Corners, found: bool, width: u32, height: u32, margin: f64) -> Corners {
    if found {
        corners
    } else {
        Corners::from_image_bounds(width, height, margin)
    }
}

fn assemble(
    surface: &SampleSurface,
    corners: &Corners,
    layout: &crate::template::TemplateLayout,
    choices: u32,
    profile: &TuningProfile,
    markers_found: bool,
) -> DecodeResult {
    let id = decode_identifier(surface, corners, layout, profile);
    let ans = decode_answers(surface, corners, layout, choices, profile);
    DecodeResult {
        student_id: id.student_id,
        id_double_shade_columns: id.double_shade_columns,
        answers: ans.answers,
        multi_answer_questions: ans.multi_answer_questions,
        markers_found,
    }
}
