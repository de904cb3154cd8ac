//! Inbound events as the relay sees them, independent of the chat API types.

/// One event from the long-poll feed.
#[derive(Debug, Clone, PartialEq)]
pub struct Update {
    pub update_id: i64,
    /// `None` for service updates the relay does not handle.
    pub message: Option<IncomingMessage>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct IncomingMessage {
    pub chat_id: i64,
    pub sender_display_name: String,
    /// Message text, or the caption of an attachment.
    pub text: Option<String>,
    pub document: Option<DocumentRef>,
    pub voice: Option<VoiceRef>,
    pub audio: Option<AudioRef>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentRef {
    pub file_id: String,
    pub file_name: Option<String>,
    /// Size reported by the platform; 0 when unknown.
    pub file_size: u64,
    pub mime_type: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct VoiceRef {
    pub file_id: String,
    pub duration_secs: u32,
    pub file_size: u64,
    pub mime_type: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AudioRef {
    pub file_id: String,
    pub file_name: Option<String>,
    pub title: Option<String>,
    pub performer: Option<String>,
    pub duration_secs: u32,
    pub file_size: u64,
    pub mime_type: Option<String>,
}

impl Update {
    /// Plain text message in `chat_id`.
    pub fn text(update_id: i64, chat_id: i64, text: &str) -> Self {
        Self::with_message(
            update_id,
            IncomingMessage {
                chat_id,
                sender_display_name: "User".to_string(),
                text: Some(text.to_string()),
                ..Default::default()
            },
        )
    }

    pub fn with_message(update_id: i64, message: IncomingMessage) -> Self {
        Self {
            update_id,
            message: Some(message),
        }
    }

    /// An update without a message (edited message, member change and the like).
    pub fn service(update_id: i64) -> Self {
        Self {
            update_id,
            message: None,
        }
    }

    pub fn chat_id(&self) -> Option<i64> {
        self.message.as_ref().map(|m| m.chat_id)
    }
}
