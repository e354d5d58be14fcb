//! Corte core: acquire a face image, detect the face, classify its shape
//! from the bounding-box ratio and look up haircut recommendations.

pub mod acquire;
pub mod analysis;
pub mod detector;
pub mod engine;
pub mod recommend;
pub mod shape;

use std::path::PathBuf;

pub use acquire::{acquire, AcquireError, GrayFrame, ImageSource};
pub use analysis::{Analysis, NO_FACE_MESSAGE, NO_FACE_PLACEHOLDER};
pub use detector::{
    DetectedFace, DetectorError, DetectorSettings, FaceBox, FaceDetector, RustfaceDetector,
};
pub use engine::{spawn_engine, EngineError, EngineHandle};
pub use recommend::{recommend, recommend_for_label};
pub use shape::{classify, classify_ratio, ShapeCategory};

/// Determine the default model directory.
///
/// When running as root (UID 0), defaults to `/var/lib/corte/models` (system-wide).
/// Otherwise defaults to `$XDG_DATA_HOME/corte/models` (~/.local/share/corte/models).
pub fn default_model_dir() -> PathBuf {
    if is_root() {
        PathBuf::from("/var/lib/corte/models")
    } else {
        let data_home = std::env::var("XDG_DATA_HOME").unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            format!("{home}/.local/share")
        });
        PathBuf::from(data_home).join("corte/models")
    }
}

fn is_root() -> bool {
    // SAFETY: geteuid is always safe to call.
    unsafe { libc::geteuid() == 0 }
}
