//! Model management for the OCR engine
//!
//! Handles downloading, caching, and locating the `ocrs` models.

use anyhow::{Context, Result};
use futures_util::StreamExt;
use sha2::{Digest, Sha256};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::runtime::Runtime;
use tracing::{debug, info};

const MODEL_BASE_URL: &str = "https://ocrs-models.s3-accelerate.amazonaws.com";

/// Model identifier for the OCR pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelType {
    /// Text detection model
    Detection,
    /// Text recognition model
    Recognition,
}

impl ModelType {
    /// All models the engine needs
    pub const ALL: [ModelType; 2] = [ModelType::Detection, ModelType::Recognition];

    /// Get the filename for this model type
    pub fn filename(&self) -> &'static str {
        match self {
            ModelType::Detection => "text-detection.rten",
            ModelType::Recognition => "text-recognition.rten",
        }
    }

    /// Get the download URL for this model
    pub fn download_url(&self) -> String {
        format!("{}/{}", MODEL_BASE_URL, self.filename())
    }

    /// Display name for progress reporting
    pub fn display_name(&self) -> &'static str {
        match self {
            ModelType::Detection => "Text Detection",
            ModelType::Recognition => "Text Recognition",
        }
    }
}

/// Model manifest tracking downloaded models
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ModelManifest {
    pub version: String,
    pub models: Vec<ModelInfo>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ModelInfo {
    pub model_type: String,
    pub filename: String,
    pub size_bytes: u64,
    pub sha256: Option<String>,
    pub downloaded_at: String,
}

impl Default for ModelManifest {
    fn default() -> Self {
        Self {
            version: "1.0.0".to_string(),
            models: Vec::new(),
        }
    }
}

/// Model manager for downloading and caching OCR models
pub struct ModelManager {
    models_dir: PathBuf,
    auto_download: bool,
    timeout: Duration,
}

impl ModelManager {
    /// Create a model manager under the application data directory
    pub fn new() -> Result<Self> {
        let data_dir = crate::storage::get_data_dir()?;
        Self::with_dir(data_dir.join("models"))
    }

    /// Create model manager with custom directory
    pub fn with_dir(models_dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&models_dir)
            .with_context(|| format!("Failed to create models directory {:?}", models_dir))?;
        Ok(Self {
            models_dir,
            auto_download: true,
            timeout: Duration::from_secs(300),
        })
    }

    /// Enable or disable downloading of missing models
    pub fn with_auto_download(mut self, auto_download: bool) -> Self {
        self.auto_download = auto_download;
        self
    }

    /// Set the per-download timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Get the models directory path
    pub fn models_dir(&self) -> &Path {
        &self.models_dir
    }

    /// Get the path to a specific model file
    pub fn model_path(&self, model_type: ModelType) -> PathBuf {
        self.models_dir.join(model_type.filename())
    }

    /// Check if a model is already downloaded
    pub fn is_model_available(&self, model_type: ModelType) -> bool {
        std::fs::metadata(self.model_path(model_type))
            .map(|m| m.is_file() && m.len() > 0)
            .unwrap_or(false)
    }

    /// Check if all required models are available
    pub fn are_models_ready(&self) -> bool {
        ModelType::ALL.iter().all(|&m| self.is_model_available(m))
    }

    /// Get status of all models
    pub fn get_model_status(&self) -> Vec<(ModelType, bool, Option<u64>)> {
        ModelType::ALL
            .iter()
            .map(|&model_type| {
                let path = self.model_path(model_type);
                let available = self.is_model_available(model_type);
                let size = std::fs::metadata(&path).ok().map(|m| m.len());
                (model_type, available, size)
            })
            .collect()
    }

    /// Download a model if not already available.
    /// Returns the path to the model file.
    pub fn ensure_model(&self, model_type: ModelType) -> Result<PathBuf> {
        let path = self.model_path(model_type);

        if self.is_model_available(model_type) {
            debug!("Model {:?} already available at {:?}", model_type, path);
            return Ok(path);
        }

        if !self.auto_download {
            anyhow::bail!(
                "{} model missing and downloads are disabled. Download it from {} and place it at {:?}",
                model_type.display_name(),
                model_type.download_url(),
                path
            );
        }

        self.download_model(model_type)?;
        Ok(path)
    }

    /// Ensure both models exist, returning (detection, recognition) paths
    pub fn ensure_all_models(&self) -> Result<(PathBuf, PathBuf)> {
        let detection = self.ensure_model(ModelType::Detection)?;
        let recognition = self.ensure_model(ModelType::Recognition)?;
        Ok((detection, recognition))
    }

    /// Download a specific model (blocking)
    fn download_model(&self, model_type: ModelType) -> Result<()> {
        let url = model_type.download_url();
        let path = self.model_path(model_type);

        info!("Downloading {} model from {}", model_type.display_name(), url);

        let rt = Runtime::new().context("Failed to create tokio runtime")?;
        let hash = rt.block_on(self.download_file_async(&url, &path, model_type))?;

        if !self.is_model_available(model_type) {
            anyhow::bail!("Download completed but model verification failed");
        }

        self.update_manifest_for_model(model_type, hash)?;

        info!("Successfully downloaded {} model", model_type.display_name());
        Ok(())
    }

    /// Async download implementation, returns the SHA256 of the file
    async fn download_file_async(
        &self,
        url: &str,
        path: &Path,
        model_type: ModelType,
    ) -> Result<String> {
        let client = reqwest::Client::builder()
            .timeout(self.timeout)
            .build()
            .context("Failed to create HTTP client")?;

        let response = client
            .get(url)
            .send()
            .await
            .context("Failed to send download request")?;

        if !response.status().is_success() {
            anyhow::bail!("Download failed with status {}: {}", response.status(), url);
        }

        let total_size = response.content_length();
        debug!("Download size: {:?} bytes", total_size);

        let temp_path = path.with_extension("tmp");
        let mut file = std::fs::File::create(&temp_path).context("Failed to create temp file")?;

        let mut hasher = Sha256::new();
        let mut downloaded: u64 = 0;
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.context("Error reading download stream")?;
            file.write_all(&chunk).context("Failed to write to temp file")?;
            hasher.update(&chunk);
            downloaded += chunk.len() as u64;
        }

        file.flush().context("Failed to flush temp file")?;
        drop(file);
        debug!("{:?}: received {} / {:?} bytes", model_type, downloaded, total_size);

        // Recorded in the manifest; the model host publishes no checksums to pin
        let hash = format!("{:x}", hasher.finalize());

        std::fs::rename(&temp_path, path)
            .context("Failed to move downloaded file to final location")?;

        Ok(hash)
    }

    /// Update manifest after successful download
    fn update_manifest_for_model(&self, model_type: ModelType, sha256: String) -> Result<()> {
        let mut manifest = self.load_manifest().unwrap_or_default();
        let metadata = std::fs::metadata(self.model_path(model_type))?;

        let model_info = ModelInfo {
            model_type: format!("{:?}", model_type),
            filename: model_type.filename().to_string(),
            size_bytes: metadata.len(),
            sha256: Some(sha256),
            downloaded_at: unix_timestamp(),
        };

        if let Some(existing) = manifest
            .models
            .iter_mut()
            .find(|m| m.filename == model_info.filename)
        {
            *existing = model_info;
        } else {
            manifest.models.push(model_info);
        }

        self.save_manifest(&manifest)
    }

    /// Load the model manifest
    pub fn load_manifest(&self) -> Result<ModelManifest> {
        let manifest_path = self.models_dir.join("manifest.json");
        if manifest_path.exists() {
            let content = std::fs::read_to_string(&manifest_path)?;
            let manifest: ModelManifest = serde_json::from_str(&content)?;
            Ok(manifest)
        } else {
            Ok(ModelManifest::default())
        }
    }

    /// Save the model manifest
    pub fn save_manifest(&self, manifest: &ModelManifest) -> Result<()> {
        let manifest_path = self.models_dir.join("manifest.json");
        let content = serde_json::to_string_pretty(manifest)?;
        std::fs::write(manifest_path, content)?;
        Ok(())
    }
}

fn unix_timestamp() -> String {
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    now.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_model_type_filenames() {
        assert_eq!(ModelType::Detection.filename(), "text-detection.rten");
        assert_eq!(ModelType::Recognition.filename(), "text-recognition.rten");
        assert!(ModelType::Recognition
            .download_url()
            .ends_with("/text-recognition.rten"));
    }

    #[test]
    fn test_model_availability() {
        let dir = TempDir::new().unwrap();
        let manager = ModelManager::with_dir(dir.path().join("models")).unwrap();
        assert!(manager.models_dir().exists());
        assert!(!manager.are_models_ready());

        std::fs::write(manager.model_path(ModelType::Detection), b"det").unwrap();
        assert!(manager.is_model_available(ModelType::Detection));
        assert!(!manager.are_models_ready());

        // Empty files do not count
        std::fs::write(manager.model_path(ModelType::Recognition), b"").unwrap();
        assert!(!manager.is_model_available(ModelType::Recognition));

        std::fs::write(manager.model_path(ModelType::Recognition), b"rec").unwrap();
        assert!(manager.are_models_ready());
    }

    #[test]
    fn test_model_status() {
        let dir = TempDir::new().unwrap();
        let manager = ModelManager::with_dir(dir.path().to_path_buf()).unwrap();
        std::fs::write(manager.model_path(ModelType::Detection), b"abcd").unwrap();

        let status = manager.get_model_status();
        assert_eq!(status.len(), 2);
        assert_eq!(status[0], (ModelType::Detection, true, Some(4)));
        assert_eq!(status[1], (ModelType::Recognition, false, None));
    }

    #[test]
    fn test_ensure_model_offline_reports_url() {
        let dir = TempDir::new().unwrap();
        let manager = ModelManager::with_dir(dir.path().to_path_buf())
            .unwrap()
            .with_auto_download(false);

        let err = manager.ensure_model(ModelType::Detection).unwrap_err();
        assert!(err.to_string().contains("text-detection.rten"));

        std::fs::write(manager.model_path(ModelType::Detection), b"det").unwrap();
        std::fs::write(manager.model_path(ModelType::Recognition), b"rec").unwrap();
        let (det, rec) = manager.ensure_all_models().unwrap();
        assert_eq!(det, manager.model_path(ModelType::Detection));
        assert_eq!(rec, manager.model_path(ModelType::Recognition));
    }

    #[test]
    fn test_manifest_roundtrip() {
        let dir = TempDir::new().unwrap();
        let manager = ModelManager::with_dir(dir.path().to_path_buf()).unwrap();
        assert!(manager.load_manifest().unwrap().models.is_empty());

        let mut manifest = ModelManifest::default();
        manifest.models.push(ModelInfo {
            model_type: "Detection".to_string(),
            filename: "text-detection.rten".to_string(),
            size_bytes: 42,
            sha256: Some("00ff".to_string()),
            downloaded_at: "0".to_string(),
        });
        manager.save_manifest(&manifest).unwrap();

        let loaded = manager.load_manifest().unwrap();
        assert_eq!(loaded.models.len(), 1);
        assert_eq!(loaded.models[0].size_bytes, 42);
    }
}
