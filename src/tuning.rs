//! Per-[`ImageSource`] table of numeric constants.
//!
//! Every stage reads its thresholds and search fractions from here instead
//! of an inline literal, so the whole calibration surface is visible in one
//! place.

use serde::{Deserialize, Serialize};

use crate::sampler::Sampler;

/// Where the image being decoded came from. Determines which path the
/// orchestrator runs and which tuning constants apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageSource {
    /// An already-rectified scan or flatbed upload.
    Upload,
    /// A low-resolution handheld camera preview frame (overlay only).
    CameraLive,
    /// A handheld camera photo taken for final decoding.
    CameraFinal,
}

#[derive(Debug, Clone, Copy)]
pub struct MarkerParams {
    pub search_fraction: f64,
    pub min_density: f64,
    pub min_aspect_ratio: f64,
    pub max_aspect_ratio: f64,
    pub reject_dark_surround: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct TuningProfile {
    pub sampler: Sampler,
    pub marker: MarkerParams,
    pub id_fill_threshold: f64,
    pub id_double_shade_ratio: f64,
    pub answer_fill_threshold: f64,
    pub multi_answer_ratio: f64,
    pub weak_signal_rejection: bool,
}

impl TuningProfile {
    pub const fn for_source(source: ImageSource) -> Self {
        match source {
            ImageSource::Upload => TuningProfile {
                sampler: Sampler::Binary,
                marker: MarkerParams {
                    search_fraction: 0.30,
                    min_density: 0.45,
                    min_aspect_ratio: 0.85,
                    max_aspect_ratio: 2.0,
                    reject_dark_surround: false,
                },
                id_fill_threshold: 0.25,
                id_double_shade_ratio: 0.55,
                answer_fill_threshold: 0.20,
                multi_answer_ratio: 0.45,
                weak_signal_rejection: false,
            },
            ImageSource::CameraLive => TuningProfile {
                sampler: Sampler::Gray,
                marker: MarkerParams {
                    search_fraction: 0.35,
                    min_density: 0.30,
                    min_aspect_ratio: 0.85,
                    max_aspect_ratio: 2.0,
                    reject_dark_surround: true,
                },
                id_fill_threshold: 0.10,
                id_double_shade_ratio: 0.65,
                answer_fill_threshold: 0.08,
                multi_answer_ratio: 0.45,
                weak_signal_rejection: false,
            },
            ImageSource::CameraFinal => TuningProfile {
                sampler: Sampler::Gray,
                marker: MarkerParams {
                    search_fraction: 0.25,
                    min_density: 0.40,
                    min_aspect_ratio: 0.85,
                    max_aspect_ratio: 2.0,
                    reject_dark_surround: true,
                },
                id_fill_threshold: 0.15,
                id_double_shade_ratio: 0.65,
                answer_fill_threshold: 0.15,
                multi_answer_ratio: 0.70,
                weak_signal_rejection: true,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upload_uses_binary_sampler_and_camera_paths_use_gray() {
        assert_eq!(TuningProfile::for_source(ImageSource::Upload).sampler, Sampler::Binary);
        assert_eq!(TuningProfile::for_source(ImageSource::CameraFinal).sampler, Sampler::Gray);
        assert_eq!(TuningProfile::for_source(ImageSource::CameraLive).sampler, Sampler::Gray);
    }
}
