//! Model downloading and caching adapter.

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};
use tracing::{debug, info};

/// Placeholder checksum indicating verification should be skipped.
const PLACEHOLDER_CHECKSUM: &str =
    "0000000000000000000000000000000000000000000000000000000000000000";

const CHUNK_SIZE: usize = 64 * 1024;

static MODELS_DIR_OVERRIDE: RwLock<Option<PathBuf>> = RwLock::new(None);

/// Model metadata.
#[derive(Debug, Clone)]
pub struct ModelInfo {
    /// Model name/identifier.
    pub name: &'static str,
    /// Download URL (GitHub releases).
    pub url: &'static str,
    /// Expected SHA256 hash. All zeros skips verification.
    pub sha256: &'static str,
    /// Filename in models directory.
    pub filename: &'static str,
}

/// Name of the face detector model.
pub const FACE_DETECTOR: &str = "blazeface";

/// Known models.
pub const MODELS: &[ModelInfo] = &[ModelInfo {
    name: FACE_DETECTOR,
    url: "https://github.com/cwygoda/photo-qa/releases/download/models-v1/blazeface.safetensors",
    sha256: PLACEHOLDER_CHECKSUM,
    filename: "blazeface.safetensors",
}];

/// Download progress callback: `(model name, bytes downloaded, total bytes)`.
pub type ProgressCallback = Box<dyn Fn(&str, u64, Option<u64>) + Send + Sync>;

/// Overrides the models directory for this process; `None` restores the default.
pub fn set_models_dir(dir: Option<PathBuf>) {
    *MODELS_DIR_OVERRIDE
        .write()
        .unwrap_or_else(PoisonError::into_inner) = dir;
}

/// Returns the models directory path.
///
/// Uses the override from [`set_models_dir`], else
/// `XDG_DATA_HOME/photo-cull/models` or `~/.local/share/photo-cull/models`.
#[must_use]
pub fn models_dir() -> PathBuf {
    if let Some(dir) = MODELS_DIR_OVERRIDE
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
    {
        return dir;
    }
    default_models_dir()
}

/// Models directory ignoring any override.
#[must_use]
pub fn default_models_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("photo-cull")
        .join("models")
}

/// Ensures all required models are downloaded, reporting progress to `progress`.
///
/// # Errors
///
/// Returns an error if:
/// - The models directory cannot be created
/// - A model download fails
/// - A model's checksum doesn't match
pub fn ensure_models_with_progress(progress: Option<&ProgressCallback>) -> Result<()> {
    let dir = models_dir();
    fs::create_dir_all(&dir).context("Failed to create models directory")?;

    for model in MODELS {
        let path = dir.join(model.filename);
        if path.exists() {
            debug!("Model {} already exists", model.name);
        } else {
            download_model(model, &path, progress)?;
        }
    }

    Ok(())
}

/// Streams a model to `<path>.part`, verifies it and moves it into place.
fn download_model(model: &ModelInfo, path: &Path, progress: Option<&ProgressCallback>) -> Result<()> {
    info!("Downloading model: {}", model.name);

    let mut response = reqwest::blocking::get(model.url)
        .with_context(|| format!("Failed to download {}", model.name))?;

    if !response.status().is_success() {
        anyhow::bail!("Download failed with status: {}", response.status());
    }

    let total = response.content_length();
    let partial = path.with_extension("part");
    let mut writer = BufWriter::new(
        File::create(&partial).with_context(|| format!("Failed to create {}", partial.display()))?,
    );
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; CHUNK_SIZE];
    let mut downloaded = 0u64;

    loop {
        let n = response
            .read(&mut buf)
            .with_context(|| format!("Failed to read response for {}", model.name))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
        writer
            .write_all(&buf[..n])
            .with_context(|| format!("Failed to write {}", model.name))?;
        downloaded += n as u64;
        if let Some(cb) = progress {
            cb(model.name, downloaded, total);
        }
    }
    writer
        .flush()
        .with_context(|| format!("Failed to write {}", model.name))?;
    drop(writer);

    let hash = format!("{:x}", hasher.finalize());
    if let Err(e) = verify_checksum(model, &hash) {
        let _ = fs::remove_file(&partial);
        return Err(e);
    }

    fs::rename(&partial, path).with_context(|| format!("Failed to install {}", model.name))?;

    info!("Downloaded {} ({downloaded} bytes)", model.name);
    Ok(())
}

fn verify_checksum(model: &ModelInfo, hash: &str) -> Result<()> {
    if model.sha256 == PLACEHOLDER_CHECKSUM {
        debug!(
            "Skipping checksum verification for {} (placeholder checksum)",
            model.name
        );
        return Ok(());
    }
    if hash != model.sha256 {
        anyhow::bail!(
            "Checksum mismatch for {}: expected {}, got {hash}. \
             Re-run `photo-cull models fetch` to download a fresh copy.",
            model.name,
            model.sha256,
        );
    }
    Ok(())
}

/// Returns the path to a specific model file.
#[must_use]
pub fn model_path(name: &str) -> Option<PathBuf> {
    MODELS
        .iter()
        .find(|m| m.name == name)
        .map(|m| models_dir().join(m.filename))
}

/// Checks if all models are installed.
#[must_use]
pub fn all_models_installed() -> bool {
    let dir = models_dir();
    MODELS.iter().all(|m| dir.join(m.filename).exists())
}

/// Lists known models with their installation status.
#[must_use]
pub fn list_models() -> Vec<(String, bool)> {
    let dir = models_dir();
    MODELS
        .iter()
        .map(|m| (m.name.to_string(), dir.join(m.filename).exists()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_models_dir() {
        assert!(default_models_dir().ends_with("photo-cull/models"));
    }

    #[test]
    fn test_model_path() {
        let path = model_path(FACE_DETECTOR).unwrap_or_else(|| panic!("should have path"));
        assert!(path.ends_with("blazeface.safetensors"));
        assert!(model_path("unknown").is_none());
    }

    #[test]
    fn test_checksum_verification() {
        let placeholder = &MODELS[0];
        assert!(verify_checksum(placeholder, "abc").is_ok());

        let pinned = ModelInfo {
            sha256: "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad",
            ..placeholder.clone()
        };
        let digest = format!("{:x}", Sha256::digest(b"abc"));
        assert!(verify_checksum(&pinned, &digest).is_ok());
        assert!(verify_checksum(&pinned, PLACEHOLDER_CHECKSUM).is_err());
    }
}
