use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::session::Identity;

pub const DEFAULT_ASSISTANT_NAME: &str = "ATLAS";
pub const DEFAULT_CREATOR_NAME: &str = "K.V.SARVESH";

/// Errors that can occur when loading configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// Failed to read the config file.
    ReadFile { path: PathBuf, source: std::io::Error },
    /// Failed to parse JSON.
    ParseJson { path: PathBuf, source: serde_json::Error },
    /// A required credential is absent or empty.
    Missing(&'static str),
    /// Validation error.
    Validation(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReadFile { path, source } => {
                write!(f, "failed to read config file '{}': {}", path.display(), source)
            }
            Self::ParseJson { path, source } => {
                write!(f, "failed to parse config file '{}': {}", path.display(), source)
            }
            Self::Missing(name) => write!(f, "missing required setting: {}", name),
            Self::Validation(msg) => write!(f, "config validation error: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ReadFile { source, .. } => Some(source),
            Self::ParseJson { source, .. } => Some(source),
            Self::Missing(_) | Self::Validation(_) => None,
        }
    }
}

/// Optional JSON file with tunables. Every field may be omitted.
#[derive(Deserialize, Default)]
struct ConfigFile {
    telegram_bot_token: Option<String>,
    groq_api_key: Option<String>,
    assistant_name: Option<String>,
    creator_name: Option<String>,
    port: Option<u16>,
    bind: Option<String>,
    /// Long-poll timeout handed to getUpdates.
    poll_timeout_secs: Option<u64>,
    /// Delay before retrying a failed poll.
    retry_delay_secs: Option<u64>,
    /// Upper bound for every other outbound call.
    request_timeout_secs: Option<u64>,
    groq_model: Option<String>,
    groq_base_url: Option<String>,
    /// HTTP TTS server (e.g. "http://localhost:8880"). Local espeak-ng when unset.
    tts_endpoint: Option<String>,
    /// Path to Whisper model file (.bin) for voice transcription.
    whisper_model_path: Option<String>,
    /// Directory for logs. Defaults to current directory.
    data_dir: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub telegram_bot_token: String,
    pub groq_api_key: String,
    pub assistant_name: String,
    pub creator_name: String,
    pub bind: String,
    pub port: u16,
    pub poll_timeout: Duration,
    pub retry_delay: Duration,
    pub request_timeout: Duration,
    pub groq_model: String,
    pub groq_base_url: String,
    pub tts_endpoint: Option<String>,
    pub whisper_model_path: Option<PathBuf>,
    pub data_dir: PathBuf,
}

impl Config {
    /// Load from the process environment, optionally layered over a JSON file.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::from_sources(path, |key| std::env::var(key).ok())
    }

    /// Build a config from a file (if any) and a variable lookup.
    ///
    /// Variables win over file values for credentials, identity and port.
    pub fn from_sources<F>(path: Option<&Path>, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let file = match path {
            Some(path) => read_file(path)?,
            None => ConfigFile::default(),
        };
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let telegram_bot_token = var("TELEGRAM_BOT_TOKEN")
            .or(file.telegram_bot_token)
            .filter(|v| !v.is_empty())
            .ok_or(ConfigError::Missing("TELEGRAM_BOT_TOKEN"))?;
        let groq_api_key = var("GroqAPIKey")
            .or(file.groq_api_key)
            .filter(|v| !v.is_empty())
            .ok_or(ConfigError::Missing("GroqAPIKey"))?;

        // Telegram tokens are formatted as {bot_id}:{secret} where bot_id is numeric
        let token_parts: Vec<&str> = telegram_bot_token.split(':').collect();
        if token_parts.len() != 2 || token_parts[0].parse::<u64>().is_err() || token_parts[1].is_empty() {
            return Err(ConfigError::Validation(
                "TELEGRAM_BOT_TOKEN appears invalid (expected format: 123456789:ABCdefGHI...)".into(),
            ));
        }

        let port = match var("PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|_| ConfigError::Validation(format!("PORT is not a valid port: {raw}")))?,
            None => file.port.unwrap_or(8000),
        };

        let poll_timeout_secs = file.poll_timeout_secs.unwrap_or(30);
        if poll_timeout_secs == 0 {
            return Err(ConfigError::Validation("poll_timeout_secs must be positive".into()));
        }

        Ok(Self {
            telegram_bot_token,
            groq_api_key,
            assistant_name: var("AssistantName")
                .or(file.assistant_name)
                .unwrap_or_else(|| DEFAULT_ASSISTANT_NAME.to_string()),
            creator_name: var("Creator")
                .or(file.creator_name)
                .unwrap_or_else(|| DEFAULT_CREATOR_NAME.to_string()),
            bind: file.bind.unwrap_or_else(|| "0.0.0.0".to_string()),
            port,
            poll_timeout: Duration::from_secs(poll_timeout_secs),
            retry_delay: Duration::from_secs(file.retry_delay_secs.unwrap_or(5)),
            request_timeout: Duration::from_secs(file.request_timeout_secs.unwrap_or(30).max(1)),
            groq_model: file.groq_model.unwrap_or_else(|| "llama3-70b-8192".to_string()),
            groq_base_url: file
                .groq_base_url
                .unwrap_or_else(|| "https://api.groq.com/openai/v1".to_string()),
            tts_endpoint: file.tts_endpoint.filter(|e| !e.is_empty()),
            whisper_model_path: file.whisper_model_path.map(PathBuf::from),
            data_dir: file.data_dir.map(PathBuf::from).unwrap_or_else(|| PathBuf::from(".")),
        })
    }

    pub fn identity(&self) -> Identity {
        Identity {
            assistant_name: self.assistant_name.clone(),
            creator_name: self.creator_name.clone(),
        }
    }

    /// Token with the secret half hidden, safe for logs.
    pub fn masked_token(&self) -> String {
        match self.telegram_bot_token.split_once(':') {
            Some((id, secret)) if secret.chars().count() > 4 => {
                let tail: String = secret.chars().skip(secret.chars().count() - 4).collect();
                format!("{id}:***{tail}")
            }
            Some((id, _)) => format!("{id}:***"),
            None => "***".to_string(),
        }
    }
}

fn read_file(path: &Path) -> Result<ConfigFile, ConfigError> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::ReadFile { path: path.to_path_buf(), source: e })?;
    serde_json::from_str(&content)
        .map_err(|e| ConfigError::ParseJson { path: path.to_path_buf(), source: e })
}
