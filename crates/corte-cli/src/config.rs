use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use corte_core::DetectorSettings;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// On-disk configuration. Every key is optional.
#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub model_dir: Option<PathBuf>,
    pub min_face_size: Option<u32>,
    pub score_thresh: Option<f64>,
    pub pyramid_scale_factor: Option<f32>,
    pub slide_window_step: Option<u32>,
}

/// Resolved CLI configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Directory containing the detector model file.
    pub model_dir: PathBuf,
    /// SeetaFace cascade tuning.
    pub detector: DetectorSettings,
}

impl Config {
    /// Load the config file (if any), then apply `CORTE_*` environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let file = match config_path() {
            Some(path) if path.exists() => read_file(&path)?,
            _ => FileConfig::default(),
        };
        Ok(Self::resolve(file, |key| std::env::var(key).ok()))
    }

    /// Merge file values with environment lookups. Environment wins; malformed
    /// environment values are ignored.
    fn resolve(file: FileConfig, env: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = DetectorSettings::default();

        let model_dir = env("CORTE_MODEL_DIR")
            .map(PathBuf::from)
            .or(file.model_dir)
            .unwrap_or_else(corte_core::default_model_dir);

        let detector = DetectorSettings {
            min_face_size: parse_env(&env, "CORTE_MIN_FACE_SIZE")
                .or(file.min_face_size)
                .unwrap_or(defaults.min_face_size),
            score_thresh: parse_env(&env, "CORTE_SCORE_THRESH")
                .or(file.score_thresh)
                .unwrap_or(defaults.score_thresh),
            pyramid_scale_factor: parse_env(&env, "CORTE_PYRAMID_SCALE_FACTOR")
                .or(file.pyramid_scale_factor)
                .unwrap_or(defaults.pyramid_scale_factor),
            slide_window_step: parse_env(&env, "CORTE_SLIDE_WINDOW_STEP")
                .or(file.slide_window_step)
                .unwrap_or(defaults.slide_window_step),
        };

        Self {
            model_dir,
            detector,
        }
    }

    /// Path to the SeetaFace detection model.
    pub fn detector_model_path(&self) -> PathBuf {
        self.model_dir.join(corte_models::DETECTOR_MODEL.name)
    }
}

/// `$CORTE_CONFIG`, else `$XDG_CONFIG_HOME/corte/config.toml`, else `~/.config/corte/config.toml`.
fn config_path() -> Option<PathBuf> {
    if let Ok(p) = std::env::var("CORTE_CONFIG") {
        return Some(PathBuf::from(p));
    }
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|_| std::env::var("HOME").map(|h| PathBuf::from(h).join(".config")))
        .ok()?;
    Some(base.join("corte/config.toml"))
}

fn read_file(path: &Path) -> Result<FileConfig, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_file(&text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn parse_file(text: &str) -> Result<FileConfig, toml::de::Error> {
    toml::from_str(text)
}

fn parse_env<T: std::str::FromStr>(env: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    env(key).and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let cfg = Config::resolve(FileConfig::default(), env_of(&[]));
        assert_eq!(cfg.detector, DetectorSettings::default());
        assert!(cfg.model_dir.ends_with("corte/models"));
    }

    #[test]
    fn test_file_values() {
        let file = parse_file(
            r#"
            model_dir = "/opt/corte"
            min_face_size = 40
            score_thresh = 3.5
            "#,
        )
        .unwrap();
        let cfg = Config::resolve(file, env_of(&[]));
        assert_eq!(cfg.model_dir, PathBuf::from("/opt/corte"));
        assert_eq!(cfg.detector.min_face_size, 40);
        assert_eq!(cfg.detector.score_thresh, 3.5);
        assert_eq!(cfg.detector.pyramid_scale_factor, 0.8);
        assert_eq!(
            cfg.detector_model_path(),
            PathBuf::from("/opt/corte/seeta_fd_frontal_v1.0.bin")
        );
    }

    #[test]
    fn test_env_overrides_file() {
        let file = FileConfig {
            model_dir: Some(PathBuf::from("/opt/corte")),
            min_face_size: Some(40),
            ..Default::default()
        };
        let cfg = Config::resolve(
            file,
            env_of(&[
                ("CORTE_MODEL_DIR", "/srv/models"),
                ("CORTE_MIN_FACE_SIZE", "64"),
                ("CORTE_SLIDE_WINDOW_STEP", "2"),
            ]),
        );
        assert_eq!(cfg.model_dir, PathBuf::from("/srv/models"));
        assert_eq!(cfg.detector.min_face_size, 64);
        assert_eq!(cfg.detector.slide_window_step, 2);
    }

    #[test]
    fn test_malformed_env_ignored() {
        let cfg = Config::resolve(
            FileConfig::default(),
            env_of(&[("CORTE_SCORE_THRESH", "lots")]),
        );
        assert_eq!(cfg.detector.score_thresh, 2.0);
    }

    #[test]
    fn test_unknown_key_rejected() {
        assert!(parse_file("colour = \"red\"").is_err());
    }
}
