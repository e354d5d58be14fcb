use sha2::{Digest, Sha256};
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Model file descriptor: URL, expected filename, human-readable size.
pub struct ModelFile {
    pub name: &'static str,
    pub url: &'static str,
    pub size_display: &'static str,
}

/// SeetaFace frontal face detector, as distributed with the rustface crate.
pub const DETECTOR_MODEL: ModelFile = ModelFile {
    name: "seeta_fd_frontal_v1.0.bin",
    url: "https://github.com/atomashpolskiy/rustface/raw/master/model/seeta_fd_frontal_v1.0.bin",
    size_display: "1.2 MB",
};

pub const MODELS: &[ModelFile] = &[DETECTOR_MODEL];

/// Extension of the sidecar file holding a model's pinned SHA-256.
pub const PIN_EXTENSION: &str = "sha256";

#[derive(Error, Debug)]
pub enum ModelIntegrityError {
    #[error("model file not found: {name} ({path})")]
    MissingModel { name: &'static str, path: PathBuf },

    #[error("failed to open model file: {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read model file: {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write checksum pin: {path}: {source}")]
    WritePin {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed checksum pin: {path}")]
    MalformedPin { path: PathBuf },

    #[error(
        "model checksum mismatch for {name} ({path})\n  expected: {expected}\n  got:      {got}"
    )]
    ChecksumMismatch {
        name: &'static str,
        path: PathBuf,
        expected: String,
        got: String,
    },
}

/// Outcome of verifying one model file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelStatus {
    /// Digest matches the pinned checksum.
    Verified { sha256: String },
    /// File present but no pin recorded yet.
    Unpinned { sha256: String },
}

/// Compute SHA-256 hex digest of a file.
pub fn sha256_file_hex(path: &Path) -> Result<String, ModelIntegrityError> {
    let mut file = fs::File::open(path).map_err(|source| ModelIntegrityError::Open {
        path: path.to_path_buf(),
        source,
    })?;

    let mut hasher = Sha256::new();
    let mut buf = [0u8; 8192];

    loop {
        let n = file
            .read(&mut buf)
            .map_err(|source| ModelIntegrityError::Read {
                path: path.to_path_buf(),
                source,
            })?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}

/// Path of the checksum pin for a model file: `<model>.sha256`.
pub fn pin_path(model_path: &Path) -> PathBuf {
    let mut name = model_path.as_os_str().to_os_string();
    name.push(".");
    name.push(PIN_EXTENSION);
    PathBuf::from(name)
}

/// Read a model's pinned checksum, if one was recorded.
pub fn read_pin(model_path: &Path) -> Result<Option<String>, ModelIntegrityError> {
    let path = pin_path(model_path);
    let contents = match fs::read_to_string(&path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => return Err(ModelIntegrityError::Read { path, source }),
    };

    let digest = contents.split_whitespace().next().unwrap_or("");
    if digest.len() != 64 || !digest.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(ModelIntegrityError::MalformedPin { path });
    }
    Ok(Some(digest.to_ascii_lowercase()))
}

/// Record `sha256` as the pinned checksum of a model file.
pub fn write_pin(model_path: &Path, sha256: &str) -> Result<(), ModelIntegrityError> {
    let path = pin_path(model_path);
    fs::write(&path, format!("{sha256}\n"))
        .map_err(|source| ModelIntegrityError::WritePin { path, source })
}

fn ensure_present(name: &'static str, path: &Path) -> Result<(), ModelIntegrityError> {
    if !path.exists() {
        return Err(ModelIntegrityError::MissingModel {
            name,
            path: path.to_path_buf(),
        });
    }
    Ok(())
}

pub fn verify_file_sha256(
    name: &'static str,
    path: &Path,
    expected_sha256: &str,
) -> Result<(), ModelIntegrityError> {
    ensure_present(name, path)?;

    let digest = sha256_file_hex(path)?;
    if digest != expected_sha256 {
        return Err(ModelIntegrityError::ChecksumMismatch {
            name,
            path: path.to_path_buf(),
            expected: expected_sha256.to_string(),
            got: digest,
        });
    }

    Ok(())
}

/// Verify a model file against its pin. A missing pin is reported, not rejected.
pub fn verify_model(model: &ModelFile, model_dir: &Path) -> Result<ModelStatus, ModelIntegrityError> {
    let path = model_dir.join(model.name);

    match read_pin(&path)? {
        Some(expected) => {
            verify_file_sha256(model.name, &path, &expected)?;
            Ok(ModelStatus::Verified { sha256: expected })
        }
        None => {
            ensure_present(model.name, &path)?;
            Ok(ModelStatus::Unpinned {
                sha256: sha256_file_hex(&path)?,
            })
        }
    }
}

pub fn verify_models_dir(model_dir: &Path) -> Result<Vec<ModelStatus>, ModelIntegrityError> {
    MODELS
        .iter()
        .map(|model| verify_model(model, model_dir))
        .collect()
}
