use std::fmt;

/// Errors that abort a decode outright.
///
/// Every other failure mode in the pipeline (markers not found, weak bubble
/// signal, double shading, a scanner that can't find paper edges) is
/// recovered in place and folded into the returned [`crate::result::DecodeResult`]
/// instead of raised here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The input image is smaller than the minimum usable size.
    InputTooSmall { width: u32, height: u32 },
    /// `num_items` did not match one of the three registered templates.
    UnsupportedTemplate { num_items: u32 },
    /// `choices` fell outside the supported `2..=8` range.
    UnsupportedChoices { choices: u32 },
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::InputTooSmall { width, height } => write!(
                f,
                "input image {width}x{height} is smaller than the minimum decodable size (200x200)"
            ),
            DecodeError::UnsupportedTemplate { num_items } => {
                write!(f, "no template registered for {num_items} items")
            }
            DecodeError::UnsupportedChoices { choices } => {
                write!(f, "{choices} choices per question is outside the supported range 2..=8")
            }
        }
    }
}

impl std::error::Error for DecodeError {}
