//! Temporary files with guaranteed cleanup.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::MediaError;

/// A temp file that is deleted when dropped.
///
/// Removal failures are logged and swallowed.
#[derive(Debug)]
pub struct ScratchFile {
    path: PathBuf,
}

impl ScratchFile {
    /// Create an empty scratch file ending in `suffix` (e.g. ".ogg").
    pub fn with_suffix(suffix: &str) -> Result<Self, MediaError> {
        let path = tempfile::Builder::new()
            .prefix("atlas-")
            .suffix(suffix)
            .tempfile()?
            .into_temp_path()
            .keep()
            .map_err(|e| MediaError::Io(e.to_string()))?;
        Ok(Self { path })
    }

    /// Create a scratch file holding `bytes`.
    pub async fn write(suffix: &str, bytes: &[u8]) -> Result<Self, MediaError> {
        let file = Self::with_suffix(suffix)?;
        tokio::fs::write(&file.path, bytes).await?;
        Ok(file)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn read(&self) -> Result<Vec<u8>, MediaError> {
        Ok(tokio::fs::read(&self.path).await?)
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!("Removed scratch file {}", self.path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to remove scratch file {}: {}", self.path.display(), e),
        }
    }
}
