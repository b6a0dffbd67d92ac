//! Deterministic optical mark recognition for bubble-form answer sheets.
//!
//! [`decode`] is the single entry point: given a raw RGBA image, a template
//! size, a choice count, and where the image came from, it returns a
//! [`DecodeResult`] with the student identifier, per-question answers, and
//! diagnostic flags. The pipeline never panics and only raises
//! [`DecodeError`] for the three input-validation failures; every other
//! failure mode (markers not found, a weak or doubled bubble signal) is
//! recovered in place and surfaced through the result's flag fields.

mod answers;
mod coords;
mod error;
mod identifier;
mod image_surface;
mod markers;
mod normalize;
mod pipeline;
mod result;
mod sampler;
mod scanner;
mod template;
mod threshold;
mod tuning;

pub use error::DecodeError;
pub use image_surface::ImageSurface;
pub use result::DecodeResult;
pub use template::TemplateKind;
pub use tuning::ImageSource;

/// Decodes a single answer-sheet image.
pub fn decode(
    image: &ImageSurface,
    num_items: u32,
    choices: u32,
    source: ImageSource,
) -> Result<DecodeResult, DecodeError> {
    pipeline::decode(image, num_items, choices, source)
}
