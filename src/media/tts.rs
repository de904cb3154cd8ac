//! Text-to-speech.
//!
//! Uses an HTTP TTS server (Fish Speech style `/v1/tts`) when one is
//! configured, otherwise the local `espeak-ng` binary. Either way the WAV
//! output is converted to OGG Opus for Telegram voice messages.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info};

use super::{audio, Artifact, MediaError};

/// A language a voice command can ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoiceLanguage {
    /// ISO 639-1 code; also the suffix of the `/voice<code>` command.
    pub code: &'static str,
    pub name: &'static str,
}

pub const DEFAULT_LANGUAGE: VoiceLanguage = VoiceLanguage { code: "en", name: "English" };

/// Languages with their own `/voice<code>` command.
pub const VOICE_LANGUAGES: &[VoiceLanguage] = &[
    VoiceLanguage { code: "en", name: "English" },
    VoiceLanguage { code: "hi", name: "Hindi" },
    VoiceLanguage { code: "ta", name: "Tamil" },
    VoiceLanguage { code: "te", name: "Telugu" },
    VoiceLanguage { code: "kn", name: "Kannada" },
    VoiceLanguage { code: "ml", name: "Malayalam" },
    VoiceLanguage { code: "bn", name: "Bengali" },
    VoiceLanguage { code: "mr", name: "Marathi" },
    VoiceLanguage { code: "gu", name: "Gujarati" },
    VoiceLanguage { code: "pa", name: "Punjabi" },
    VoiceLanguage { code: "ur", name: "Urdu" },
];

/// Longest text we hand to the speech engine.
pub const MAX_TTS_CHARS: usize = 1000;

#[async_trait]
pub trait Synthesizer: Send + Sync {
    /// Speak `text` in `language`, returning an OGG Opus voice note.
    async fn synthesize(&self, text: &str, language: VoiceLanguage) -> Result<Artifact, MediaError>;
}

/// TTS client.
pub struct TtsClient {
    endpoint: Option<String>,
    espeak: String,
    client: reqwest::Client,
    timeout: Duration,
}

impl TtsClient {
    /// `endpoint` is the base URL of the TTS server, e.g. "http://localhost:8880".
    /// `None` selects local espeak-ng.
    pub fn new(endpoint: Option<String>, timeout: Duration) -> Self {
        Self {
            endpoint: endpoint.map(|e| e.trim_end_matches('/').to_string()),
            espeak: "espeak-ng".to_string(),
            client: reqwest::Client::new(),
            timeout,
        }
    }

    /// Use a different espeak-ng binary than the one on PATH.
    pub fn with_espeak(mut self, program: impl Into<String>) -> Self {
        self.espeak = program.into();
        self
    }

    async fn remote_wav(&self, endpoint: &str, text: &str, language: VoiceLanguage) -> Result<Vec<u8>, MediaError> {
        let response = self
            .client
            .post(format!("{endpoint}/v1/tts"))
            .timeout(self.timeout)
            .json(&serde_json::json!({
                "text": text,
                "format": "wav",
                "language": language.code,
            }))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    MediaError::Timeout
                } else {
                    MediaError::Http(format!("TTS request failed: {e}"))
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(MediaError::Http(format!("TTS error {}: {}", status, body)));
        }

        let wav = response
            .bytes()
            .await
            .map_err(|e| MediaError::Http(format!("Failed to read TTS response: {e}")))?;
        Ok(wav.to_vec())
    }

    async fn local_wav(&self, text: &str, language: VoiceLanguage) -> Result<Vec<u8>, MediaError> {
        // Text after "--" is never read as an option.
        audio::run_tool(&self.espeak, ["-v", language.code, "--stdout", "--", text], self.timeout).await
    }
}

#[async_trait]
impl Synthesizer for TtsClient {
    async fn synthesize(&self, text: &str, language: VoiceLanguage) -> Result<Artifact, MediaError> {
        let text: String = text.chars().take(MAX_TTS_CHARS).collect();
        let preview: String = text.chars().take(50).collect();
        info!("🔊 TTS ({}): \"{}\"", language.code, preview);

        let wav = match &self.endpoint {
            Some(endpoint) => self.remote_wav(endpoint, &text, language).await?,
            None => self.local_wav(&text, language).await?,
        };
        if wav.is_empty() {
            return Err(MediaError::Format("speech engine returned no audio".to_string()));
        }
        debug!("Got {} bytes of WAV audio", wav.len());

        let file = audio::wav_to_ogg(&wav, self.timeout).await?;
        Ok(Artifact {
            file_name: "voice.ogg".to_string(),
            file,
        })
    }
}

/// Find a language by its code, case-insensitively.
pub fn language_by_code(code: &str) -> Option<VoiceLanguage> {
    VOICE_LANGUAGES
        .iter()
        .copied()
        .find(|lang| lang.code.eq_ignore_ascii_case(code))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tts_client_creation() {
        let client = TtsClient::new(Some("http://localhost:8880/".to_string()), Duration::from_secs(5));
        assert_eq!(client.endpoint.as_deref(), Some("http://localhost:8880"));
        let local = TtsClient::new(None, Duration::from_secs(5));
        assert!(local.endpoint.is_none());
    }

    #[test]
    fn test_language_codes_are_unique_and_lowercase() {
        for (i, lang) in VOICE_LANGUAGES.iter().enumerate() {
            assert_eq!(lang.code, lang.code.to_lowercase());
            assert!(VOICE_LANGUAGES[i + 1..].iter().all(|other| other.code != lang.code));
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_local_voice_text_is_never_an_option() {
        use crate::relay::{route, Command, Update};
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let fake = dir.path().join("espeak-ng");
        std::fs::write(&fake, "#!/bin/sh\nfor a in \"$@\"; do printf '[%s]' \"$a\"; done\n").unwrap();
        std::fs::set_permissions(&fake, std::fs::Permissions::from_mode(0o755)).unwrap();

        let Command::Voice { language, text } = route(&Update::text(1, 1, "/voice -f/etc/hostname")) else {
            panic!("expected a voice command");
        };
        let client = TtsClient::new(None, Duration::from_secs(5)).with_espeak(fake.to_string_lossy());
        let argv = client.local_wav(&text, language).await.unwrap();
        assert_eq!(String::from_utf8(argv).unwrap(), "[-v][en][--stdout][--][-f/etc/hostname]");
    }

    #[test]
    fn test_language_by_code() {
        assert_eq!(language_by_code("HI").map(|l| l.name), Some("Hindi"));
        assert!(language_by_code("xx").is_none());
    }
}
