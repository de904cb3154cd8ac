//! Per-update handling: run the command, then deliver every outbound message.
//!
//! Handlers never fail. Collaborator errors become explanatory replies, and
//! each outbound send is attempted on its own so one failed send does not
//! stop the rest.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use futures::FutureExt;
use tracing::{debug, error, info, warn};

use super::command::{route, Command};
use super::replies;
use super::update::{IncomingMessage, Update};
use crate::groq::{self, Completion};
use crate::media::analysis::{self, AudioFacts};
use crate::media::tts::DEFAULT_LANGUAGE;
use crate::media::{
    preview, Artifact, DocumentGenerator, DocumentKind, DocumentRequest, MediaError, Synthesizer, Transcriber,
    VoiceLanguage,
};
use crate::session::Session;
use crate::telegram::{Activity, Transport, TransportError};

/// Bots may only download files up to 20 MiB.
pub const MAX_DOWNLOAD_BYTES: u64 = 20 * 1024 * 1024;

/// Upper bound for any single collaborator call made by a handler.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(120);

/// One message or file to send back.
#[derive(Debug)]
pub enum Outbound {
    Text(String),
    Voice(Artifact),
    Document { artifact: Artifact, caption: String },
}

/// Everything a handler wants sent for one update.
#[derive(Debug, Default)]
pub struct HandlerResult {
    pub outbound: Vec<Outbound>,
}

impl HandlerResult {
    fn text(text: impl Into<String>) -> Self {
        Self {
            outbound: vec![Outbound::Text(text.into())],
        }
    }

    fn texts<I: IntoIterator<Item = String>>(texts: I) -> Self {
        Self {
            outbound: texts.into_iter().map(Outbound::Text).collect(),
        }
    }

    fn single(outbound: Outbound) -> Self {
        Self {
            outbound: vec![outbound],
        }
    }
}

/// Outcome of delivering a [`HandlerResult`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Delivery {
    pub sent: usize,
    pub failed: usize,
}

#[derive(Debug)]
pub(super) enum Fetched {
    Data(Vec<u8>),
    TooLarge(u64),
}

pub struct Dispatcher {
    session: Arc<Session>,
    transport: Arc<dyn Transport>,
    ai: Arc<dyn Completion>,
    synthesizer: Arc<dyn Synthesizer>,
    generator: Arc<dyn DocumentGenerator>,
    transcriber: Arc<dyn Transcriber>,
    call_timeout: Duration,
}

impl Dispatcher {
    pub fn new(
        session: Arc<Session>,
        transport: Arc<dyn Transport>,
        ai: Arc<dyn Completion>,
        synthesizer: Arc<dyn Synthesizer>,
        generator: Arc<dyn DocumentGenerator>,
        transcriber: Arc<dyn Transcriber>,
    ) -> Self {
        Self {
            session,
            transport,
            ai,
            synthesizer,
            generator,
            transcriber,
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }

    pub fn with_call_timeout(mut self, call_timeout: Duration) -> Self {
        self.call_timeout = call_timeout;
        self
    }

    /// Route and handle one update, then deliver the result.
    pub async fn dispatch(&self, update: &Update) -> Delivery {
        let command = route(update);
        let Some(message) = update.message.as_ref().filter(|_| command != Command::NoOp) else {
            debug!("Update {} has nothing to handle", update.update_id);
            return Delivery::default();
        };

        info!(
            "📩 [{}] {} in chat {}: {}",
            update.update_id,
            message.sender_display_name,
            message.chat_id,
            command.name()
        );

        let result = match AssertUnwindSafe(self.handle(message, command)).catch_unwind().await {
            Ok(result) => result,
            Err(panic) => {
                let reason = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                error!("💥 Handler panicked on update {}: {}", update.update_id, reason);
                HandlerResult::text(replies::INTERNAL_ERROR)
            }
        };

        self.deliver(message.chat_id, result).await
    }

    /// Send each outbound item. Artifacts are removed right after their send attempt.
    pub async fn deliver(&self, chat_id: i64, result: HandlerResult) -> Delivery {
        let mut delivery = Delivery::default();
        for outbound in result.outbound {
            let sent = match &outbound {
                Outbound::Text(text) => self.transport.send_text(chat_id, text).await,
                Outbound::Voice(artifact) => self.transport.send_voice(chat_id, artifact).await,
                Outbound::Document { artifact, caption } => {
                    self.transport.send_document(chat_id, artifact, caption).await
                }
            };
            match sent {
                Ok(()) => delivery.sent += 1,
                Err(e) => {
                    warn!("Failed to deliver to chat {}: {}", chat_id, e);
                    delivery.failed += 1;
                }
            }
            drop(outbound);
        }
        delivery
    }

    async fn handle(&self, message: &IncomingMessage, command: Command) -> HandlerResult {
        let identity = self.session.identity();
        let chat_id = message.chat_id;
        match command {
            Command::Start => HandlerResult::text(replies::welcome(identity, &message.sender_display_name)),
            Command::Help => HandlerResult::text(replies::help(identity)),
            Command::Voice { language, text } => self.voice(chat_id, language, &text).await,
            Command::Pdf(title) => self.document(chat_id, DocumentKind::Pdf, &title).await,
            Command::Word(title) => self.document(chat_id, DocumentKind::Word, &title).await,
            Command::Excel(title) => self.document(chat_id, DocumentKind::Excel, &title).await,
            Command::AnalyzeDocument(doc) => {
                let file_name = doc.file_name.clone().unwrap_or_else(|| "document".to_string());
                info!("📄 Document received: {} ({} bytes)", file_name, doc.file_size);
                self.transport.send_activity(chat_id, Activity::Typing).await;
                match self.fetch(&doc.file_id, doc.file_size).await {
                    Ok(Fetched::Data(data)) => {
                        let report = tokio::task::spawn_blocking(move || analysis::analyze_document(&data, &file_name))
                            .await
                            .unwrap_or_else(|e| format!("❌ Analysis failed: {e}"));
                        HandlerResult::text(report)
                    }
                    Ok(Fetched::TooLarge(size)) => {
                        info!("📦 {} is over the download limit, sending guidance", file_name);
                        HandlerResult::texts(replies::large_file_guidance(&file_name, size))
                    }
                    Err(e) => {
                        warn!("❌ Download of {} failed: {}", file_name, e);
                        HandlerResult::text(replies::DOWNLOAD_FAILED)
                    }
                }
            }
            Command::AnalyzeVoice(voice) => {
                let facts = AudioFacts {
                    label: "Voice Message".to_string(),
                    duration_secs: voice.duration_secs,
                    size: voice.file_size,
                    mime_type: voice.mime_type.clone(),
                    ..Default::default()
                };
                self.audio(chat_id, &voice.file_id, facts).await
            }
            Command::AnalyzeAudio(audio) => {
                let facts = AudioFacts {
                    label: "Audio".to_string(),
                    file_name: audio.file_name.clone(),
                    duration_secs: audio.duration_secs,
                    size: audio.file_size,
                    mime_type: audio.mime_type.clone(),
                    performer: audio.performer.clone(),
                    title: audio.title.clone(),
                };
                self.audio(chat_id, &audio.file_id, facts).await
            }
            Command::CloudLink(_) => HandlerResult::text(replies::cloud_link(identity)),
            Command::FileAnalysisHint(_) => HandlerResult::text(replies::FILE_HINT),
            Command::FreeText(text) => self.chat(chat_id, &text).await,
            Command::NoOp => HandlerResult::default(),
        }
    }

    async fn chat(&self, chat_id: i64, text: &str) -> HandlerResult {
        debug!("AI prompt: {}", preview(text, 80));
        self.transport.send_activity(chat_id, Activity::Typing).await;
        let system = groq::system_prompt(self.session.identity());
        let reply = self
            .bounded("AI completion", self.ai.complete(&system, text), |_| groq::Error::Timeout)
            .await;
        match reply {
            Ok(reply) => HandlerResult::text(reply),
            Err(e) => {
                warn!("❌ AI call failed: {}", e);
                HandlerResult::text(groq::UNAVAILABLE_REPLY)
            }
        }
    }

    async fn voice(&self, chat_id: i64, language: VoiceLanguage, text: &str) -> HandlerResult {
        if text.is_empty() {
            let command = if language == DEFAULT_LANGUAGE {
                "/voice".to_string()
            } else {
                format!("/voice{}", language.code)
            };
            return HandlerResult::text(replies::voice_usage(&command));
        }

        self.transport.send_activity(chat_id, Activity::UploadVoice).await;
        let synthesized = self
            .bounded("speech synthesis", self.synthesizer.synthesize(text, language), |_| MediaError::Timeout)
            .await;
        match synthesized {
            Ok(artifact) => HandlerResult::single(Outbound::Voice(artifact)),
            Err(e) => {
                warn!("❌ TTS failed ({}): {}", language.code, e);
                HandlerResult::text(replies::VOICE_FAILED)
            }
        }
    }

    async fn document(&self, chat_id: i64, kind: DocumentKind, title: &str) -> HandlerResult {
        let (usage, failed, caption) = match kind {
            DocumentKind::Pdf => (replies::PDF_USAGE, replies::PDF_FAILED, replies::pdf_caption(title)),
            DocumentKind::Word => (replies::WORD_USAGE, replies::WORD_FAILED, replies::word_caption(title)),
            DocumentKind::Excel => (replies::EXCEL_USAGE, replies::EXCEL_FAILED, replies::excel_caption(title)),
        };
        if title.is_empty() {
            return HandlerResult::text(usage);
        }

        self.transport.send_activity(chat_id, Activity::UploadDocument).await;
        let request = self.document_request(kind, title);
        let generated = self
            .bounded("document generation", self.generator.generate(request), |_| MediaError::Timeout)
            .await;
        match generated {
            Ok(artifact) => HandlerResult::single(Outbound::Document { artifact, caption }),
            Err(e) => {
                warn!("❌ {} generation failed: {}", kind.extension(), e);
                HandlerResult::text(failed)
            }
        }
    }

    fn document_request(&self, kind: DocumentKind, title: &str) -> DocumentRequest {
        let identity = self.session.identity();
        let (paragraphs, rows) = match kind {
            DocumentKind::Pdf => (vec![replies::document_body(identity, "PDF")], Vec::new()),
            DocumentKind::Word => (vec![replies::document_body(identity, "Word")], Vec::new()),
            DocumentKind::Excel => (
                Vec::new(),
                vec![
                    ("Title".to_string(), title.to_string()),
                    ("Generated By".to_string(), format!("{} AI", identity.assistant_name)),
                    ("Creator".to_string(), identity.creator_name.clone()),
                    ("Date".to_string(), Local::now().format("%Y-%m-%d %H:%M:%S").to_string()),
                    ("Type".to_string(), "AI Generated Document".to_string()),
                    ("Deployment".to_string(), "Web Service".to_string()),
                ],
            ),
        };
        DocumentRequest {
            kind,
            title: title.to_string(),
            paragraphs,
            rows,
        }
    }

    async fn audio(&self, chat_id: i64, file_id: &str, facts: AudioFacts) -> HandlerResult {
        info!("🎧 {} received ({}s, {} bytes)", facts.label, facts.duration_secs, facts.size);
        self.transport.send_activity(chat_id, Activity::Typing).await;
        match self.fetch(file_id, facts.size).await {
            Ok(Fetched::Data(data)) => {
                let transcript = self
                    .bounded("transcription", self.transcriber.transcribe(&data), |_| MediaError::Timeout)
                    .await;
                if let Err(e) = &transcript {
                    warn!("Transcription failed: {}", e);
                }
                HandlerResult::text(analysis::describe_audio(&facts, &transcript))
            }
            Ok(Fetched::TooLarge(size)) => {
                let name = facts.file_name.as_deref().unwrap_or("This recording");
                HandlerResult::texts(replies::large_file_guidance(name, size))
            }
            Err(e) => {
                warn!("❌ Download of {} {} failed: {}", facts.label, file_id, e);
                HandlerResult::text(replies::DOWNLOAD_FAILED)
            }
        }
    }

    /// Download a file unless the platform reports it above the limit.
    pub(super) async fn fetch(&self, file_id: &str, reported_size: u64) -> Result<Fetched, TransportError> {
        if reported_size > MAX_DOWNLOAD_BYTES {
            return Ok(Fetched::TooLarge(reported_size));
        }
        let remote = self.transport.get_file(file_id).await?;
        if remote.size > MAX_DOWNLOAD_BYTES {
            return Ok(Fetched::TooLarge(remote.size));
        }
        let data = self.transport.download_file(&remote.path).await?;
        Ok(Fetched::Data(data))
    }

    /// Run a collaborator call under the dispatcher's timeout.
    async fn bounded<T, E, F>(&self, what: &str, call: F, on_timeout: impl FnOnce(Duration) -> E) -> Result<T, E>
    where
        F: Future<Output = Result<T, E>>,
    {
        match tokio::time::timeout(self.call_timeout, call).await {
            Ok(result) => result,
            Err(_) => {
                warn!("⏱️ {} timed out after {:?}", what, self.call_timeout);
                Err(on_timeout(self.call_timeout))
            }
        }
    }
}
