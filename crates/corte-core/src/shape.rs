//! Face shape classification from the bounding-box aspect ratio.
//!
//! The ratio is `height / width` of the detected face box. Two fixed
//! thresholds split it into three bands:
//!
//! | ratio               | category |
//! |---------------------|----------|
//! | `> 1.25`            | Oval     |
//! | `1.0 < r <= 1.25`   | Square   |
//! | `<= 1.0`            | Round    |
//!
//! Degenerate boxes (zero or negative sides) and non-finite ratios are
//! classified as [`ShapeCategory::Unknown`].

use serde::Serialize;
use std::fmt;

/// Ratio above which a face is considered oval.
pub const OVAL_MIN_RATIO: f32 = 1.25;

/// Ratio above which a face is considered square (up to [`OVAL_MIN_RATIO`]).
pub const SQUARE_MIN_RATIO: f32 = 1.0;

/// Coarse face shape category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeCategory {
    Oval,
    Square,
    Round,
    Unknown,
}

impl ShapeCategory {
    /// All categories with a recommendation block, in display order.
    pub const DEFINED: [ShapeCategory; 3] = [Self::Oval, Self::Square, Self::Round];

    /// Label shown to the user.
    pub fn label(self) -> &'static str {
        match self {
            Self::Oval => "Ovalado",
            Self::Square => "Cuadrado",
            Self::Round => "Redondo",
            Self::Unknown => "Desconocida",
        }
    }

    /// Reverse of [`ShapeCategory::label`]. Unrecognised labels yield `None`.
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "Ovalado" => Some(Self::Oval),
            "Cuadrado" => Some(Self::Square),
            "Redondo" => Some(Self::Round),
            "Desconocida" => Some(Self::Unknown),
            _ => None,
        }
    }
}

impl fmt::Display for ShapeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Bucket a `height / width` ratio into a shape category.
pub fn classify_ratio(ratio: f32) -> ShapeCategory {
    if !ratio.is_finite() {
        return ShapeCategory::Unknown;
    }

    if ratio > OVAL_MIN_RATIO {
        ShapeCategory::Oval
    } else if ratio > SQUARE_MIN_RATIO {
        ShapeCategory::Square
    } else {
        ShapeCategory::Round
    }
}

/// Classify a face from its bounding-box size in pixels.
pub fn classify(width: f32, height: f32) -> ShapeCategory {
    if !(width > 0.0 && height > 0.0) {
        tracing::debug!(width, height, "degenerate face box");
        return ShapeCategory::Unknown;
    }

    let ratio = height / width;
    tracing::debug!(width, height, ratio, "face shape ratio");
    classify_ratio(ratio)
}
