//! Speech-to-text transcription using whisper-rs.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info};
use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

use super::transcribe::Transcriber;
use super::{audio, preview, MediaError};

/// Whisper transcription engine.
pub struct Whisper {
    ctx: Arc<WhisperContext>,
    timeout: Duration,
}

impl Whisper {
    /// Load a Whisper model from a .bin file.
    pub fn new(model_path: &Path, timeout: Duration) -> Result<Self, MediaError> {
        info!("Loading Whisper model from {:?}", model_path);

        if !model_path.exists() {
            return Err(MediaError::Unavailable(format!("model file not found: {:?}", model_path)));
        }

        let path = model_path
            .to_str()
            .ok_or_else(|| MediaError::Unavailable("invalid model path".to_string()))?;
        let ctx = WhisperContext::new_with_params(path, WhisperContextParameters::default())
            .map_err(|e| MediaError::Unavailable(format!("failed to load Whisper model: {e}")))?;

        info!("Whisper model loaded successfully");
        Ok(Self { ctx: Arc::new(ctx), timeout })
    }
}

fn run_model(ctx: &WhisperContext, pcm: &[f32]) -> Result<String, MediaError> {
    let mut state = ctx
        .create_state()
        .map_err(|e| MediaError::Process(format!("failed to create Whisper state: {e}")))?;

    // Language auto-detection: voice notes arrive in many languages.
    let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });
    params.set_language(Some("auto"));
    params.set_translate(false);
    params.set_no_timestamps(true);
    params.set_single_segment(false);

    state
        .full(params, pcm)
        .map_err(|e| MediaError::Process(format!("Whisper transcription failed: {e}")))?;

    let mut text = String::new();
    for segment in state.as_iter() {
        if let Ok(s) = segment.to_str() {
            text.push_str(s);
            text.push(' ');
        }
    }
    Ok(text.trim().to_string())
}

#[async_trait]
impl Transcriber for Whisper {
    async fn transcribe(&self, audio_data: &[u8]) -> Result<String, MediaError> {
        debug!("Transcribing {} bytes of audio", audio_data.len());
        let pcm = audio::to_pcm_16k(audio_data, self.timeout).await?;

        let ctx = self.ctx.clone();
        let job = tokio::task::spawn_blocking(move || run_model(&ctx, &pcm));
        let text = tokio::time::timeout(self.timeout, job)
            .await
            .map_err(|_| MediaError::Timeout)?
            .map_err(|e| MediaError::Process(format!("transcription task failed: {e}")))??;

        info!("Transcribed: \"{}\"", preview(&text, 100));
        Ok(text)
    }
}
