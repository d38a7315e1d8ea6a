//! Detector weight storage and download.

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use tracing::{debug, info};

/// File name of the detector weights inside the models directory.
pub const DETECTOR_FILENAME: &str = "detector.safetensors";

/// Where to download a weights file from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSource {
    /// Download URL.
    pub url: String,
    /// File name to store the weights under.
    pub filename: String,
    /// Expected SHA-256 as lowercase hex. Verification is skipped when absent.
    pub sha256: Option<String>,
}

/// A weights file present in the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledModel {
    /// File name.
    pub filename: String,
    /// Size in bytes.
    pub size: u64,
}

/// Directory of downloaded model weights.
#[derive(Debug, Clone)]
pub struct ModelStore {
    dir: PathBuf,
}

impl ModelStore {
    /// Creates a store rooted at `dir`.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Returns the default models directory.
    ///
    /// Uses `XDG_DATA_HOME/roofscan/models` or `~/.local/share/roofscan/models`.
    #[must_use]
    pub fn default_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("roofscan")
            .join("models")
    }

    /// Returns the store directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Returns the path a weights file would have in this store.
    #[must_use]
    pub fn path(&self, filename: &str) -> PathBuf {
        self.dir.join(filename)
    }

    /// Returns the path of the detector weights.
    #[must_use]
    pub fn detector_path(&self) -> PathBuf {
        self.path(DETECTOR_FILENAME)
    }

    /// Lists installed `.safetensors` files, sorted by name.
    ///
    /// A missing store directory is treated as empty.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory exists but cannot be read.
    pub fn list(&self) -> Result<Vec<InstalledModel>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let entries = fs::read_dir(&self.dir)
            .with_context(|| format!("Failed to read {}", self.dir.display()))?;
        let mut models: Vec<InstalledModel> = entries
            .flatten()
            .filter(|e| e.path().extension().is_some_and(|ext| ext == "safetensors"))
            .filter_map(|e| {
                let size = e.metadata().ok()?.len();
                Some(InstalledModel {
                    filename: e.file_name().to_string_lossy().into_owned(),
                    size,
                })
            })
            .collect();
        models.sort_by(|a, b| a.filename.cmp(&b.filename));
        Ok(models)
    }

    /// Downloads weights into the store.
    ///
    /// `progress` is called with `(downloaded, total)` as bytes arrive; `total`
    /// is `None` when the server does not send a length.
    ///
    /// # Errors
    ///
    /// Returns an error if the download fails, the checksum does not match or
    /// the file cannot be written.
    pub fn fetch(
        &self,
        source: &ModelSource,
        progress: &mut dyn FnMut(u64, Option<u64>),
    ) -> Result<PathBuf> {
        info!("Downloading {} from {}", source.filename, source.url);

        let mut response = reqwest::blocking::get(&source.url)
            .with_context(|| format!("Failed to download {}", source.filename))?;
        if !response.status().is_success() {
            anyhow::bail!("Download failed with status: {}", response.status());
        }

        let total = response.content_length();
        let mut bytes = Vec::with_capacity(
            total
                .and_then(|t| usize::try_from(t).ok())
                .unwrap_or_default(),
        );
        let mut chunk = [0_u8; 64 * 1024];
        loop {
            let read = response
                .read(&mut chunk)
                .with_context(|| format!("Failed to read response for {}", source.filename))?;
            if read == 0 {
                break;
            }
            bytes.extend_from_slice(&chunk[..read]);
            progress(bytes.len() as u64, total);
        }

        self.install(&source.filename, &bytes, source.sha256.as_deref())
    }

    /// Verifies and writes weights into the store.
    ///
    /// The file is written next to its final name and renamed into place, so
    /// a failed write never leaves a truncated model behind.
    ///
    /// # Errors
    ///
    /// Returns an error on checksum mismatch or if the file cannot be written.
    pub fn install(&self, filename: &str, bytes: &[u8], sha256: Option<&str>) -> Result<PathBuf> {
        let path = self.path(filename);

        match sha256 {
            Some(expected) => {
                let actual = sha256_hex(bytes);
                if !actual.eq_ignore_ascii_case(expected) {
                    anyhow::bail!(
                        "Checksum mismatch for {filename}: expected {expected}, got {actual}"
                    );
                }
                debug!("Checksum verified for {filename}");
            }
            None => debug!("No checksum given for {filename}; skipping verification"),
        }

        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create {}", self.dir.display()))?;
        let partial = path.with_extension("part");
        fs::write(&partial, bytes).with_context(|| format!("Failed to write {filename}"))?;
        fs::rename(&partial, &path).with_context(|| format!("Failed to install {filename}"))?;

        info!("Installed {filename} ({} bytes)", bytes.len());
        Ok(path)
    }
}

impl Default for ModelStore {
    fn default() -> Self {
        Self::new(Self::default_dir())
    }
}

/// Lowercase hex SHA-256 of `bytes`.
#[must_use]
pub fn sha256_hex(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_default_dir() {
        assert!(ModelStore::default_dir().ends_with("roofscan/models"));
    }

    #[test]
    fn test_sha256_hex() {
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_install_and_list() {
        let dir = TempDir::new().unwrap();
        let store = ModelStore::new(dir.path().join("models"));
        assert!(store.list().unwrap().is_empty());

        let digest = sha256_hex(b"weights");
        let path = store
            .install(DETECTOR_FILENAME, b"weights", Some(&digest.to_uppercase()))
            .unwrap();

        assert_eq!(path, store.detector_path());
        assert_eq!(fs::read(&path).unwrap(), b"weights");
        assert_eq!(
            store.list().unwrap(),
            vec![InstalledModel {
                filename: DETECTOR_FILENAME.to_string(),
                size: 7,
            }]
        );
    }

    #[test]
    fn test_checksum_mismatch_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let store = ModelStore::new(dir.path());
        let err = store
            .install(DETECTOR_FILENAME, b"weights", Some("00"))
            .unwrap_err();

        assert!(err.to_string().contains("Checksum mismatch"));
        assert!(!store.detector_path().exists());
    }

    #[test]
    fn test_fetch_unreachable() {
        let dir = TempDir::new().unwrap();
        let store = ModelStore::new(dir.path());
        let source = ModelSource {
            url: "http://127.0.0.1:9/detector.safetensors".into(),
            filename: DETECTOR_FILENAME.into(),
            sha256: None,
        };
        let mut calls = 0;
        assert!(store.fetch(&source, &mut |_, _| calls += 1).is_err());
        assert_eq!(calls, 0);
    }
}
