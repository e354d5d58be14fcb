use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use corte_core::{
    acquire, spawn_engine, AcquireError, Analysis, DetectorError, EngineError, ImageSource,
    RustfaceDetector, ShapeCategory,
};

mod config;
mod setup;

use config::Config;

#[derive(Parser)]
#[command(name = "corte", version, about = "Face shape analysis and haircut recommendations")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Detect the face in an image and recommend haircuts
    Analyze {
        /// Image file, or `-` to read a capture from stdin
        image: String,
        /// Print a JSON report instead of text
        #[arg(long)]
        json: bool,
        /// Override the model directory
        #[arg(long)]
        model_dir: Option<PathBuf>,
    },
    /// Classify a face bounding box given its size in pixels
    Classify {
        #[arg(long)]
        width: f32,
        #[arg(long)]
        height: f32,
    },
    /// List shape categories and their recommendations
    Shapes,
    /// Download the face detector model
    Setup {
        #[arg(long)]
        model_dir: Option<PathBuf>,
    },
    /// Check the integrity of installed models
    VerifyModels {
        #[arg(long)]
        model_dir: Option<PathBuf>,
    },
}

#[derive(Serialize)]
struct Report<'a> {
    source: String,
    shape: &'static str,
    recommendation: &'static str,
    analysis: &'a Analysis,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("command failed: {e:#}");
            eprintln!("{}", user_message(&e));
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Analyze {
            image,
            json,
            model_dir,
        } => {
            let config = load_config(model_dir)?;
            analyze(&config, ImageSource::from_arg(&image), json).await
        }
        Command::Classify { width, height } => {
            let shape = corte_core::classify(width, height);
            print_result(shape.label(), corte_core::recommend(shape));
            Ok(())
        }
        Command::Shapes => {
            for shape in ShapeCategory::DEFINED {
                println!("{}", shape.label());
                println!("{}", corte_core::recommend(shape));
                println!();
            }
            Ok(())
        }
        Command::Setup { model_dir } => setup::run(&load_config(model_dir)?.model_dir),
        Command::VerifyModels { model_dir } => setup::verify(&load_config(model_dir)?.model_dir),
    }
}

fn load_config(model_dir: Option<PathBuf>) -> Result<Config> {
    let mut config = Config::load()?;
    if let Some(dir) = model_dir {
        config.model_dir = dir;
    }
    Ok(config)
}

async fn analyze(config: &Config, source: ImageSource, json: bool) -> Result<()> {
    let model_path = config.detector_model_path();
    match corte_models::verify_model(&corte_models::DETECTOR_MODEL, &config.model_dir) {
        Ok(status) => tracing::debug!(?status, "detector model checked"),
        Err(e) => {
            return Err(e).context("detector model unavailable; run `corte setup` first");
        }
    }

    let detector = RustfaceDetector::load(&model_path, config.detector.clone())?;
    tracing::info!(path = %model_path.display(), "SeetaFace detector loaded");

    let frame = acquire(&source)?;
    let engine = spawn_engine(detector)?;
    let analysis = engine.analyze(frame).await?;

    if json {
        let report = Report {
            source: match &source {
                ImageSource::Gallery(p) => p.display().to_string(),
                ImageSource::Capture => "-".to_string(),
            },
            shape: analysis.shape_text(),
            recommendation: analysis.recommendation_text(),
            analysis: &analysis,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_result(analysis.shape_text(), analysis.recommendation_text());
    }
    Ok(())
}

fn print_result(shape: &str, recommendation: &str) {
    println!("Forma de rostro: {shape}");
    println!("Recomendaciones:");
    println!("{recommendation}");
}

/// Short message for the user; the full error chain goes to the log.
fn user_message(err: &anyhow::Error) -> String {
    for cause in err.chain() {
        if let Some(e) = cause.downcast_ref::<AcquireError>() {
            return match e {
                AcquireError::Cancelled => "Captura de cámara cancelada".to_string(),
                AcquireError::PermissionDenied(_) => {
                    "Permiso denegado para leer la imagen.".to_string()
                }
                _ => "No se pudo cargar la imagen.".to_string(),
            };
        }
        if cause.is::<EngineError>() || cause.is::<DetectorError>() {
            return "Error al procesar la imagen".to_string();
        }
    }
    format!("error: {err:#}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_cli_parses() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_analyze_args() {
        let cli = Cli::try_parse_from(["corte", "analyze", "-", "--json"]).unwrap();
        match cli.command {
            Command::Analyze { image, json, .. } => {
                assert_eq!(image, "-");
                assert!(json);
            }
            _ => panic!("expected analyze"),
        }
    }

    #[test]
    fn test_empty_gallery_file_message() {
        let dir = std::env::temp_dir().join(format!(
            "corte-cli-test-empty-{}",
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("empty.jpg");
        std::fs::write(&path, b"").unwrap();

        let err = acquire(&ImageSource::Gallery(path)).unwrap_err();
        assert!(!matches!(err, AcquireError::Cancelled));
        assert_eq!(
            user_message(&anyhow::Error::new(err)),
            "No se pudo cargar la imagen."
        );

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_user_messages() {
        let e = anyhow::Error::new(AcquireError::PermissionDenied(Path::new("/x").into()));
        assert_eq!(user_message(&e), "Permiso denegado para leer la imagen.");

        let e = anyhow::Error::new(AcquireError::Cancelled).context("reading capture");
        assert_eq!(user_message(&e), "Captura de cámara cancelada");

        let e = anyhow::Error::new(AcquireError::ZeroDimensions);
        assert_eq!(user_message(&e), "No se pudo cargar la imagen.");

        let e = anyhow::Error::new(EngineError::ChannelClosed);
        assert_eq!(user_message(&e), "Error al procesar la imagen");

        let e = anyhow::anyhow!("something else");
        assert_eq!(user_message(&e), "error: something else");
    }
}
