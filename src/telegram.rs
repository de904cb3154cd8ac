//! Chat transport: the contract the relay needs and a Telegram client using teloxide.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use teloxide::net::Download;
use teloxide::prelude::*;
use teloxide::types::{AllowedUpdate, ChatAction, FileId, InputFile, UpdateKind};
use tracing::{debug, info, warn};

use crate::media::Artifact;
use crate::relay::update::{AudioRef, DocumentRef, IncomingMessage, Update, VoiceRef};

/// Telegram rejects messages longer than 4096 characters.
pub const MAX_MESSAGE_CHARS: usize = 4000;

/// Headroom added to the long-poll timeout before the HTTP client gives up.
const POLL_GRACE: Duration = Duration::from_secs(10);

#[derive(Debug)]
pub enum TransportError {
    /// The API call failed (network error or an error status).
    Request(String),
    /// Fetching file contents failed.
    Download(String),
    Timeout,
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::Request(e) => write!(f, "request failed: {e}"),
            TransportError::Download(e) => write!(f, "download failed: {e}"),
            TransportError::Timeout => write!(f, "request timed out"),
        }
    }
}

impl std::error::Error for TransportError {}

/// File metadata returned by `getFile`.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteFile {
    pub path: String,
    pub size: u64,
}

/// The bot's own account, used as a connectivity probe.
#[derive(Debug, Clone, PartialEq)]
pub struct BotIdentity {
    pub id: u64,
    pub username: Option<String>,
    pub first_name: String,
}

/// Chat status indicator shown while a reply is being prepared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activity {
    Typing,
    UploadVoice,
    UploadDocument,
}

/// Everything the relay needs from the chat platform.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Long-poll for updates with id >= `offset`, ordered by id.
    async fn get_updates(&self, offset: i64, timeout: Duration) -> Result<Vec<Update>, TransportError>;

    async fn send_text(&self, chat_id: i64, text: &str) -> Result<(), TransportError>;

    async fn send_voice(&self, chat_id: i64, voice: &Artifact) -> Result<(), TransportError>;

    async fn send_document(&self, chat_id: i64, document: &Artifact, caption: &str) -> Result<(), TransportError>;

    async fn get_file(&self, file_id: &str) -> Result<RemoteFile, TransportError>;

    async fn download_file(&self, path: &str) -> Result<Vec<u8>, TransportError>;

    async fn get_me(&self) -> Result<BotIdentity, TransportError>;

    /// Best effort; failures are only logged.
    async fn send_activity(&self, chat_id: i64, activity: Activity);
}

/// Telegram API client.
pub struct TelegramClient {
    bot: Bot,
    request_timeout: Duration,
}

impl TelegramClient {
    /// Build a client whose HTTP layer outlives a long poll of `poll_timeout`.
    pub fn new(token: &str, poll_timeout: Duration, request_timeout: Duration) -> Result<Self, TransportError> {
        let http = teloxide::net::default_reqwest_settings()
            .timeout(poll_timeout.max(request_timeout) + POLL_GRACE)
            .build()
            .map_err(|e| TransportError::Request(format!("failed to build HTTP client: {e}")))?;
        Ok(Self::with_bot(Bot::with_client(token, http), request_timeout))
    }

    pub fn with_bot(bot: Bot, request_timeout: Duration) -> Self {
        Self { bot, request_timeout }
    }

    async fn bounded<T, E, F>(&self, limit: Duration, what: &str, call: F) -> Result<T, TransportError>
    where
        F: std::future::Future<Output = Result<T, E>>,
        E: fmt::Display,
    {
        match tokio::time::timeout(limit, call).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => {
                let msg = format!("{what}: {e}");
                warn!("{}", msg);
                Err(TransportError::Request(msg))
            }
            Err(_) => {
                warn!("{what}: timed out after {}s", limit.as_secs());
                Err(TransportError::Timeout)
            }
        }
    }
}

#[async_trait]
impl Transport for TelegramClient {
    async fn get_updates(&self, offset: i64, timeout: Duration) -> Result<Vec<Update>, TransportError> {
        let offset_i32 = poll_offset(offset)?;
        let request = self
            .bot
            .get_updates()
            .offset(offset_i32)
            .timeout(timeout.as_secs() as u32)
            .allowed_updates(vec![AllowedUpdate::Message]);
        let updates = self
            .bounded(timeout + POLL_GRACE, "Failed to get updates", request.send())
            .await?;
        debug!("Polled {} updates at offset {}", updates.len(), offset);
        Ok(updates.into_iter().map(convert_update).collect())
    }

    async fn send_text(&self, chat_id: i64, text: &str) -> Result<(), TransportError> {
        for chunk in split_message(text, MAX_MESSAGE_CHARS) {
            let request = self.bot.send_message(ChatId(chat_id), chunk);
            self.bounded(self.request_timeout, "Failed to send", request.send()).await?;
        }
        Ok(())
    }

    async fn send_voice(&self, chat_id: i64, voice: &Artifact) -> Result<(), TransportError> {
        info!("🎤 Sending voice {} to chat {}", voice.file_name, chat_id);
        let file = InputFile::file(voice.path()).file_name(voice.file_name.clone());
        let request = self.bot.send_voice(ChatId(chat_id), file);
        self.bounded(self.request_timeout, "Failed to send voice", request.send()).await?;
        Ok(())
    }

    async fn send_document(&self, chat_id: i64, document: &Artifact, caption: &str) -> Result<(), TransportError> {
        info!("📎 Sending document {} to chat {}", document.file_name, chat_id);
        let file = InputFile::file(document.path()).file_name(document.file_name.clone());
        let request = self.bot.send_document(ChatId(chat_id), file).caption(caption);
        self.bounded(self.request_timeout, "Failed to send document", request.send()).await?;
        Ok(())
    }

    async fn get_file(&self, file_id: &str) -> Result<RemoteFile, TransportError> {
        let request = self.bot.get_file(FileId(file_id.to_string()));
        let file = self.bounded(self.request_timeout, "Failed to get file", request.send()).await?;
        Ok(RemoteFile {
            path: file.path,
            size: u64::from(file.meta.size),
        })
    }

    async fn download_file(&self, path: &str) -> Result<Vec<u8>, TransportError> {
        let mut data = Vec::new();
        let result = tokio::time::timeout(self.request_timeout, self.bot.download_file(path, &mut data)).await;
        match result {
            Ok(Ok(())) => {
                info!("Downloaded {} ({} bytes)", path, data.len());
                Ok(data)
            }
            Ok(Err(e)) => {
                warn!("Failed to download {}: {}", path, e);
                Err(TransportError::Download(e.to_string()))
            }
            Err(_) => Err(TransportError::Timeout),
        }
    }

    async fn get_me(&self) -> Result<BotIdentity, TransportError> {
        let me = self.bounded(self.request_timeout, "getMe failed", self.bot.get_me().send()).await?;
        Ok(BotIdentity {
            id: me.user.id.0,
            username: me.user.username.clone(),
            first_name: me.user.first_name.clone(),
        })
    }

    async fn send_activity(&self, chat_id: i64, activity: Activity) {
        let action = match activity {
            Activity::Typing => ChatAction::Typing,
            Activity::UploadVoice => ChatAction::UploadVoice,
            Activity::UploadDocument => ChatAction::UploadDocument,
        };
        let request = self.bot.send_chat_action(ChatId(chat_id), action);
        if let Err(e) = self.bounded(self.request_timeout, "Failed to send chat action", request.send()).await {
            debug!("Ignoring chat action failure: {e}");
        }
    }
}

/// Map a teloxide update onto the relay's model. Non-message updates keep
/// their id so the offset still advances past them.
/// Telegram takes a 32-bit offset; refuse to wrap a larger one.
fn poll_offset(offset: i64) -> Result<i32, TransportError> {
    i32::try_from(offset).map_err(|_| TransportError::Request(format!("update offset {offset} is out of range")))
}

pub fn convert_update(update: teloxide::types::Update) -> Update {
    let update_id = i64::from(update.id.0);
    let UpdateKind::Message(msg) = update.kind else {
        return Update::service(update_id);
    };

    let sender_display_name = msg
        .from
        .as_ref()
        .map(|u| u.first_name.clone())
        .or_else(|| msg.chat.first_name().map(str::to_string))
        .unwrap_or_else(|| "User".to_string());

    let document = msg.document().map(|d| DocumentRef {
        file_id: d.file.id.0.clone(),
        file_name: d.file_name.clone(),
        file_size: u64::from(d.file.size),
        mime_type: d.mime_type.as_ref().map(|m| m.to_string()),
    });
    let voice = msg.voice().map(|v| VoiceRef {
        file_id: v.file.id.0.clone(),
        duration_secs: v.duration.seconds(),
        file_size: u64::from(v.file.size),
        mime_type: v.mime_type.as_ref().map(|m| m.to_string()),
    });
    let audio = msg.audio().map(|a| AudioRef {
        file_id: a.file.id.0.clone(),
        file_name: a.file_name.clone(),
        title: a.title.clone(),
        performer: a.performer.clone(),
        duration_secs: a.duration.seconds(),
        file_size: u64::from(a.file.size),
        mime_type: a.mime_type.as_ref().map(|m| m.to_string()),
    });

    Update::with_message(
        update_id,
        IncomingMessage {
            chat_id: msg.chat.id.0,
            sender_display_name,
            text: msg.text().or(msg.caption()).map(str::to_string),
            document,
            voice,
            audio,
        },
    )
}

/// Split text into chunks of at most `max_chars` characters, preferring
/// line breaks, then spaces.
pub fn split_message(text: &str, max_chars: usize) -> Vec<String> {
    if text.chars().count() <= max_chars {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut rest = text;
    while rest.chars().count() > max_chars {
        let hard_end = rest
            .char_indices()
            .nth(max_chars)
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        let window = &rest[..hard_end];
        let cut = window
            .rfind('\n')
            .or_else(|| window.rfind(' '))
            .filter(|&i| i > 0)
            .unwrap_or(hard_end);
        chunks.push(rest[..cut].to_string());
        rest = rest[cut..].trim_start_matches(['\n', ' ']);
    }
    if !rest.is_empty() {
        chunks.push(rest.to_string());
    }
    chunks
}
