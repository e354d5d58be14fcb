//! `corte setup`: downloads the face detector model and pins its checksum.

use anyhow::{bail, Context, Result};
use corte_models::{ModelFile, ModelIntegrityError, ModelStatus, MODELS};
use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;

/// Download a single model file with progress output. Returns its SHA-256.
fn download_model(model: &ModelFile, dest: &Path) -> Result<String> {
    let tmp_path = dest.with_extension("bin.part");

    println!("  downloading {} ({})...", model.name, model.size_display);

    let resp = ureq::get(model.url)
        .call()
        .with_context(|| format!("failed to download {}", model.url))?;

    let content_length = resp
        .headers()
        .get("Content-Length")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok());

    let mut reader = resp.into_body().into_reader();
    let mut file = fs::File::create(&tmp_path)
        .with_context(|| format!("failed to create {}", tmp_path.display()))?;

    let mut buf = [0u8; 65536];
    let mut total: u64 = 0;
    let mut last_pct: u64 = 0;

    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        file.write_all(&buf[..n])?;
        total += n as u64;

        if let Some(len) = content_length.filter(|&l| l > 0) {
            let pct = (total * 100) / len;
            if pct / 10 > last_pct / 10 {
                print!("  {pct}%\r");
                io::stdout().flush().ok();
                last_pct = pct;
            }
        }
    }

    file.flush()?;
    drop(file);

    if total == 0 {
        fs::remove_file(&tmp_path).ok();
        bail!("download of {} returned no data", model.name);
    }

    let digest = corte_models::sha256_file_hex(&tmp_path)?;

    fs::rename(&tmp_path, dest).with_context(|| {
        format!(
            "failed to rename {} -> {}",
            tmp_path.display(),
            dest.display()
        )
    })?;

    Ok(digest)
}

/// Run the setup command: download missing or corrupt models and pin them.
pub fn run(dir: &Path) -> Result<()> {
    println!("Model directory: {}", dir.display());

    fs::create_dir_all(dir)
        .with_context(|| format!("failed to create directory {}", dir.display()))?;

    let mut downloaded = 0;
    let mut skipped = 0;

    for model in MODELS {
        let dest = dir.join(model.name);
        match corte_models::verify_model(model, dir) {
            Ok(ModelStatus::Verified { .. }) => {
                println!("  {} already present (checksum ok)", model.name);
                skipped += 1;
                continue;
            }
            Ok(ModelStatus::Unpinned { sha256 }) => {
                corte_models::write_pin(&dest, &sha256)?;
                println!("  {} already present (checksum pinned)", model.name);
                skipped += 1;
                continue;
            }
            Err(ModelIntegrityError::MissingModel { .. }) => {}
            Err(e) => {
                tracing::warn!(model = model.name, error = %e, "model failed verification");
                println!("  {} failed verification — re-downloading", model.name);
            }
        }

        let digest = download_model(model, &dest)?;
        corte_models::write_pin(&dest, &digest)?;
        println!("  pinned sha256 {digest}");
        downloaded += 1;
    }

    println!();
    if downloaded > 0 {
        println!("Setup complete: {downloaded} model(s) downloaded, {skipped} already present.");
    } else {
        println!("All models already present. Nothing to download.");
    }

    Ok(())
}

/// Run the verify-models command: report each model's integrity status.
pub fn verify(dir: &Path) -> Result<()> {
    let statuses = corte_models::verify_models_dir(dir)
        .with_context(|| format!("model verification failed in {}", dir.display()))?;

    for (model, status) in MODELS.iter().zip(statuses) {
        match status {
            ModelStatus::Verified { sha256 } => println!("  {} ok ({sha256})", model.name),
            ModelStatus::Unpinned { sha256 } => println!(
                "  {} present but unpinned ({sha256}); run `corte setup` to pin",
                model.name
            ),
        }
    }
    Ok(())
}
