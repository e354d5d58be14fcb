//! Face detection seam and the SeetaFace (`rustface`) backend.

use serde::Serialize;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use thiserror::Error;

use crate::acquire::GrayFrame;

/// Smallest face size the SeetaFace cascade accepts.
pub const MIN_FACE_SIZE_FLOOR: u32 = 20;

#[derive(Error, Debug)]
pub enum DetectorError {
    #[error("failed to open detector model {path}: {source}")]
    ModelOpen {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse detector model {path}: {source}")]
    ModelParse {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid detector setting: {0}")]
    InvalidSetting(String),
    #[error("frame is empty ({width}x{height})")]
    EmptyFrame { width: u32, height: u32 },
    #[error("detection failed: {0}")]
    Failed(String),
}

/// Bounding box of a detected face in image pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FaceBox {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

/// One face reported by a detector.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectedFace {
    pub bbox: FaceBox,
    /// Detector-specific confidence score.
    pub score: f64,
}

/// Pluggable face detection backend.
///
/// Faces are returned in detector order; callers use the first one.
pub trait FaceDetector: Send {
    fn detect(&mut self, frame: &GrayFrame) -> Result<Vec<DetectedFace>, DetectorError>;
}

/// Tuning knobs passed to the SeetaFace cascade.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectorSettings {
    pub min_face_size: u32,
    pub score_thresh: f64,
    pub pyramid_scale_factor: f32,
    pub slide_window_step: u32,
}

impl Default for DetectorSettings {
    fn default() -> Self {
        Self {
            min_face_size: MIN_FACE_SIZE_FLOOR,
            score_thresh: 2.0,
            pyramid_scale_factor: 0.8,
            slide_window_step: 4,
        }
    }
}

impl DetectorSettings {
    /// Reject values rustface would panic on.
    pub fn validate(&self) -> Result<(), DetectorError> {
        if self.min_face_size < MIN_FACE_SIZE_FLOOR {
            return Err(DetectorError::InvalidSetting(format!(
                "min_face_size must be >= {MIN_FACE_SIZE_FLOOR}, got {}",
                self.min_face_size
            )));
        }
        if !(self.score_thresh > 0.0) {
            return Err(DetectorError::InvalidSetting(format!(
                "score_thresh must be > 0, got {}",
                self.score_thresh
            )));
        }
        if !(0.01..=0.99).contains(&self.pyramid_scale_factor) {
            return Err(DetectorError::InvalidSetting(format!(
                "pyramid_scale_factor must be within 0.01..=0.99, got {}",
                self.pyramid_scale_factor
            )));
        }
        if self.slide_window_step == 0 {
            return Err(DetectorError::InvalidSetting(
                "slide_window_step must be > 0".into(),
            ));
        }
        Ok(())
    }
}

/// Face detector backed by the `rustface` crate (SeetaFace engine).
pub struct RustfaceDetector {
    model: rustface::Model,
    settings: DetectorSettings,
}

impl RustfaceDetector {
    /// Load the SeetaFace model from disk.
    pub fn load(model_path: &Path, settings: DetectorSettings) -> Result<Self, DetectorError> {
        settings.validate()?;

        let path = model_path.display().to_string();
        let file = File::open(model_path).map_err(|source| DetectorError::ModelOpen {
            path: path.clone(),
            source,
        })?;
        let model = rustface::read_model(BufReader::new(file))
            .map_err(|source| DetectorError::ModelParse { path, source })?;

        Ok(Self { model, settings })
    }
}

impl FaceDetector for RustfaceDetector {
    fn detect(&mut self, frame: &GrayFrame) -> Result<Vec<DetectedFace>, DetectorError> {
        check_frame(frame)?;

        let s = &self.settings;
        let mut detector = rustface::create_detector_with_model(self.model.clone());
        detector.set_min_face_size(s.min_face_size);
        detector.set_score_thresh(s.score_thresh);
        detector.set_pyramid_scale_factor(s.pyramid_scale_factor);
        detector.set_slide_window_step(s.slide_window_step, s.slide_window_step);

        let faces = detector.detect(&rustface::ImageData::new(
            &frame.data,
            frame.width,
            frame.height,
        ));

        Ok(faces
            .iter()
            .map(|face| {
                let bbox = face.bbox();
                DetectedFace {
                    bbox: FaceBox {
                        x: bbox.x(),
                        y: bbox.y(),
                        width: bbox.width(),
                        height: bbox.height(),
                    },
                    score: face.score(),
                }
            })
            .collect())
    }
}

/// Reject frames rustface would panic on or read out of bounds.
fn check_frame(frame: &GrayFrame) -> Result<(), DetectorError> {
    if frame.width == 0 || frame.height == 0 {
        return Err(DetectorError::EmptyFrame {
            width: frame.width,
            height: frame.height,
        });
    }
    let expected = frame.width as usize * frame.height as usize;
    if frame.data.len() != expected {
        return Err(DetectorError::Failed(format!(
            "frame buffer holds {} bytes, expected {expected}",
            frame.data.len()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(width: u32, height: u32, len: usize) -> GrayFrame {
        GrayFrame {
            data: vec![0; len],
            width,
            height,
        }
    }

    #[test]
    fn test_check_frame_accepts_matching_buffer() {
        check_frame(&frame(4, 3, 12)).unwrap();
    }

    #[test]
    fn test_check_frame_rejects_empty() {
        let err = check_frame(&frame(0, 3, 0)).unwrap_err();
        assert!(matches!(
            err,
            DetectorError::EmptyFrame {
                width: 0,
                height: 3
            }
        ));
        assert!(matches!(
            check_frame(&frame(4, 0, 0)),
            Err(DetectorError::EmptyFrame { .. })
        ));
    }

    #[test]
    fn test_check_frame_rejects_short_buffer() {
        let err = check_frame(&frame(4, 3, 11)).unwrap_err();
        assert!(matches!(err, DetectorError::Failed(_)));
        assert!(check_frame(&frame(4, 3, 13)).is_err());
    }

    #[test]
    fn test_default_settings_valid() {
        DetectorSettings::default().validate().unwrap();
    }

    #[test]
    fn test_rejects_small_min_face() {
        let s = DetectorSettings {
            min_face_size: 10,
            ..Default::default()
        };
        assert!(matches!(s.validate(), Err(DetectorError::InvalidSetting(_))));
    }

    #[test]
    fn test_rejects_bad_scale_and_thresh() {
        let s = DetectorSettings {
            pyramid_scale_factor: 1.0,
            ..Default::default()
        };
        assert!(s.validate().is_err());

        let s = DetectorSettings {
            score_thresh: 0.0,
            ..Default::default()
        };
        assert!(s.validate().is_err());

        let s = DetectorSettings {
            score_thresh: f64::NAN,
            ..Default::default()
        };
        assert!(s.validate().is_err());

        let s = DetectorSettings {
            slide_window_step: 0,
            ..Default::default()
        };
        assert!(s.validate().is_err());
    }

    #[test]
    fn test_load_missing_model() {
        let path = std::env::temp_dir().join(format!(
            "corte-detector-test-missing-{}.bin",
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ));
        let err = RustfaceDetector::load(&path, DetectorSettings::default())
            .err()
            .unwrap();
        assert!(matches!(err, DetectorError::ModelOpen { .. }));
    }
}
