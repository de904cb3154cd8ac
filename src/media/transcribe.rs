//! Speech-to-text seam.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{info, warn};

use super::MediaError;

#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe audio bytes in any format ffmpeg can decode.
    async fn transcribe(&self, audio: &[u8]) -> Result<String, MediaError>;
}

/// Transcriber for deployments without a speech model.
pub struct NoTranscriber;

#[async_trait]
impl Transcriber for NoTranscriber {
    async fn transcribe(&self, _audio: &[u8]) -> Result<String, MediaError> {
        Err(MediaError::Unavailable("speech transcription is not configured".to_string()))
    }
}

/// Pick the transcriber for this build and configuration.
pub fn from_model_path(model_path: Option<&Path>, timeout: Duration) -> Arc<dyn Transcriber> {
    let Some(path) = model_path else {
        info!("No Whisper model configured, transcription disabled");
        return Arc::new(NoTranscriber);
    };
    load(path, timeout)
}

#[cfg(feature = "whisper")]
fn load(path: &Path, timeout: Duration) -> Arc<dyn Transcriber> {
    match super::whisper::Whisper::new(path, timeout) {
        Ok(whisper) => Arc::new(whisper),
        Err(e) => {
            warn!("Whisper unavailable: {e}");
            Arc::new(NoTranscriber)
        }
    }
}

#[cfg(not(feature = "whisper"))]
fn load(path: &Path, _timeout: Duration) -> Arc<dyn Transcriber> {
    warn!(
        "Whisper model {} configured but this build lacks the `whisper` feature",
        path.display()
    );
    Arc::new(NoTranscriber)
}
