//! Turn detector output into the shape label and recommendation shown to the user.

use serde::Serialize;

use crate::detector::DetectedFace;
use crate::recommend::recommend;
use crate::shape::{classify, ShapeCategory};

/// Shape line shown when the detector found nothing.
pub const NO_FACE_MESSAGE: &str = "No se detectó rostro";

/// Recommendation line shown when the detector found nothing.
pub const NO_FACE_PLACEHOLDER: &str = "-";

/// Result of analysing one image.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Analysis {
    FaceFound {
        face: DetectedFace,
        /// Total number of faces the detector reported; only the first is used.
        faces_detected: usize,
        shape: ShapeCategory,
        /// `height / width`; absent for a degenerate box.
        ratio: Option<f32>,
        recommendation: &'static str,
    },
    NoFace,
}

impl Analysis {
    /// Classify the first detected face, or report that there was none.
    pub fn from_faces(faces: &[DetectedFace]) -> Self {
        let Some(face) = faces.first() else {
            tracing::info!("no face detected");
            return Self::NoFace;
        };

        let width = face.bbox.width as f32;
        let height = face.bbox.height as f32;
        let shape = classify(width, height);

        tracing::info!(
            faces = faces.len(),
            width,
            height,
            shape = shape.label(),
            "face classified"
        );

        Self::FaceFound {
            face: face.clone(),
            faces_detected: faces.len(),
            shape,
            ratio: (shape != ShapeCategory::Unknown).then(|| height / width),
            recommendation: recommend(shape),
        }
    }

    /// First display line: the shape label.
    pub fn shape_text(&self) -> &'static str {
        match self {
            Self::FaceFound { shape, .. } => shape.label(),
            Self::NoFace => NO_FACE_MESSAGE,
        }
    }

    /// Second display line: the recommendation block.
    pub fn recommendation_text(&self) -> &'static str {
        match self {
            Self::FaceFound { recommendation, .. } => *recommendation,
            Self::NoFace => NO_FACE_PLACEHOLDER,
        }
    }
}
