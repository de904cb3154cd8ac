//! Command routing: one [`Command`] per update, decided from message shape and text.

use std::sync::LazyLock;

use regex::Regex;

use super::update::{AudioRef, DocumentRef, Update, VoiceRef};
use crate::media::tts::{DEFAULT_LANGUAGE, VOICE_LANGUAGES};
use crate::media::VoiceLanguage;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Start,
    Help,
    /// `/voice <text>` or `/voice<lang> <text>`. `text` may be empty.
    Voice { language: VoiceLanguage, text: String },
    Pdf(String),
    Word(String),
    Excel(String),
    AnalyzeVoice(VoiceRef),
    AnalyzeAudio(AudioRef),
    AnalyzeDocument(DocumentRef),
    /// Text mentioning a file-hosting service.
    CloudLink(String),
    /// Text that asks for a file to be analyzed without attaching one.
    FileAnalysisHint(String),
    FreeText(String),
    /// Nothing to handle; the update is acknowledged without a reply.
    NoOp,
}

impl Command {
    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Start => "start",
            Command::Help => "help",
            Command::Voice { .. } => "voice",
            Command::Pdf(_) => "pdf",
            Command::Word(_) => "word",
            Command::Excel(_) => "excel",
            Command::AnalyzeVoice(_) => "analyze_voice",
            Command::AnalyzeAudio(_) => "analyze_audio",
            Command::AnalyzeDocument(_) => "analyze_document",
            Command::CloudLink(_) => "cloud_link",
            Command::FileAnalysisHint(_) => "file_analysis_hint",
            Command::FreeText(_) => "free_text",
            Command::NoOp => "noop",
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Verb {
    Voice(VoiceLanguage),
    Pdf,
    Word,
    Excel,
}

/// Commands that take an argument, longest verb first so `/voicehi`
/// is tried before `/voice`.
static VERBS: LazyLock<Vec<(String, Verb)>> = LazyLock::new(|| {
    let mut verbs: Vec<(String, Verb)> = VOICE_LANGUAGES
        .iter()
        .map(|lang| (format!("/voice{}", lang.code), Verb::Voice(*lang)))
        .collect();
    verbs.push(("/voice".to_string(), Verb::Voice(DEFAULT_LANGUAGE)));
    verbs.push(("/pdf".to_string(), Verb::Pdf));
    verbs.push(("/word".to_string(), Verb::Word));
    verbs.push(("/excel".to_string(), Verb::Excel));
    verbs.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
    verbs
});

/// File-hosting services whose links we explain instead of fetching.
pub const CLOUD_DOMAINS: &[&str] = &[
    "drive.google.com",
    "docs.google.com",
    "dropbox.com",
    "onedrive.live.com",
    "1drv.ms",
    "sharepoint.com",
    "mega.nz",
    "wetransfer.com",
    "box.com",
    "mediafire.com",
    "icloud.com",
];

static FILE_HINT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(analy[sz]e|analysis|check|read|review|summari[sz]e|open|scan)\b.*\b(file|document|doc|pdf|docx|xlsx|spreadsheet|attachment|audio|recording)s?\b",
    )
    .expect("valid regex")
});

/// Classify an update. First match wins: voice, audio, document, command
/// verbs, cloud links, file-analysis hints, then free text.
pub fn route(update: &Update) -> Command {
    let Some(message) = &update.message else {
        return Command::NoOp;
    };

    if let Some(voice) = &message.voice {
        return Command::AnalyzeVoice(voice.clone());
    }
    if let Some(audio) = &message.audio {
        return Command::AnalyzeAudio(audio.clone());
    }
    if let Some(document) = &message.document {
        return Command::AnalyzeDocument(document.clone());
    }

    let text = message.text.as_deref().unwrap_or("").trim();
    if text.is_empty() {
        return Command::NoOp;
    }
    route_text(text)
}

fn route_text(text: &str) -> Command {
    if let Some(rest) = strip_verb(text, "/start") {
        if rest.is_empty() {
            return Command::Start;
        }
    }
    if let Some(rest) = strip_verb(text, "/help") {
        if rest.is_empty() {
            return Command::Help;
        }
    }

    for (verb, kind) in VERBS.iter() {
        if let Some(argument) = strip_verb(text, verb) {
            let argument = argument.to_string();
            return match *kind {
                Verb::Voice(language) => Command::Voice { language, text: argument },
                Verb::Pdf => Command::Pdf(argument),
                Verb::Word => Command::Word(argument),
                Verb::Excel => Command::Excel(argument),
            };
        }
    }

    let lowered = text.to_lowercase();
    if CLOUD_DOMAINS.iter().any(|domain| lowered.contains(domain)) {
        return Command::CloudLink(text.to_string());
    }
    if FILE_HINT_RE.is_match(text) {
        return Command::FileAnalysisHint(text.to_string());
    }
    Command::FreeText(text.to_string())
}

/// If `text` starts with `verb` (case-insensitive) as a whole word, return
/// the trimmed argument. A `@botname` suffix on the verb is skipped.
fn strip_verb<'a>(text: &'a str, verb: &str) -> Option<&'a str> {
    let head = text.get(..verb.len())?;
    if !head.eq_ignore_ascii_case(verb) {
        return None;
    }
    let rest = &text[verb.len()..];
    match rest.chars().next() {
        None => Some(""),
        Some(c) if c.is_whitespace() => Some(rest.trim()),
        Some('@') => {
            let after_mention = rest.find(char::is_whitespace).map(|i| &rest[i..]).unwrap_or("");
            Some(after_mention.trim())
        }
        Some(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relay::update::IncomingMessage;

    fn text(t: &str) -> Command {
        route(&Update::text(1, 42, t))
    }

    #[test]
    fn test_start_and_help_exact() {
        assert_eq!(text("/start"), Command::Start);
        assert_eq!(text("/START"), Command::Start);
        assert_eq!(text("/help"), Command::Help);
        assert_eq!(text("/help@atlas_bot"), Command::Help);
        assert!(matches!(text("/start now"), Command::FreeText(_)));
        assert!(matches!(text("/helpme"), Command::FreeText(_)));
    }

    #[test]
    fn test_generic_voice() {
        assert_eq!(
            text("/voice Hello world"),
            Command::Voice {
                language: DEFAULT_LANGUAGE,
                text: "Hello world".to_string()
            }
        );
    }

    #[test]
    fn test_language_voice_beats_generic_prefix() {
        match text("/voicehi Namaste") {
            Command::Voice { language, text } => {
                assert_eq!(language.code, "hi");
                assert_eq!(text, "Namaste");
            }
            other => panic!("expected voice command, got {other:?}"),
        }
        match text("/VOICETA Vanakkam") {
            Command::Voice { language, .. } => assert_eq!(language.code, "ta"),
            other => panic!("expected voice command, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_voice_suffix_is_free_text() {
        assert!(matches!(text("/voicexx hello"), Command::FreeText(_)));
    }

    #[test]
    fn test_verbs_require_word_boundary() {
        assert!(matches!(text("/pdfs please"), Command::FreeText(_)));
        assert_eq!(text("/pdf@atlas_bot Plan"), Command::Pdf("Plan".to_string()));
    }

    #[test]
    fn test_document_commands_keep_argument() {
        assert_eq!(text("/pdf Quarterly Report"), Command::Pdf("Quarterly Report".to_string()));
        assert_eq!(text("/Word  Meeting Notes "), Command::Word("Meeting Notes".to_string()));
        assert_eq!(text("/excel Project Data"), Command::Excel("Project Data".to_string()));
    }

    #[test]
    fn test_empty_argument_still_routes() {
        assert_eq!(text("/pdf"), Command::Pdf(String::new()));
        assert_eq!(
            text("/voice   "),
            Command::Voice {
                language: DEFAULT_LANGUAGE,
                text: String::new()
            }
        );
    }

    #[test]
    fn test_cloud_link() {
        assert!(matches!(
            text("can you analyze https://drive.google.com/file/d/abc"),
            Command::CloudLink(_)
        ));
        assert!(matches!(text("https://www.Dropbox.com/s/x"), Command::CloudLink(_)));
    }

    #[test]
    fn test_file_analysis_hint() {
        assert!(matches!(text("Please analyze my PDF file"), Command::FileAnalysisHint(_)));
        assert!(matches!(text("what's the weather"), Command::FreeText(_)));
    }

    #[test]
    fn test_blank_and_service_updates_are_noop() {
        assert_eq!(text("   "), Command::NoOp);
        assert_eq!(route(&Update::service(9)), Command::NoOp);
    }

    #[test]
    fn test_document_beats_text() {
        let update = Update::with_message(
            3,
            IncomingMessage {
                chat_id: 42,
                text: Some("/pdf Quarterly Report".to_string()),
                document: Some(DocumentRef {
                    file_id: "doc".to_string(),
                    file_name: Some("a.pdf".to_string()),
                    file_size: 10,
                    mime_type: None,
                }),
                ..Default::default()
            },
        );
        assert!(matches!(route(&update), Command::AnalyzeDocument(_)));
    }

    #[test]
    fn test_voice_beats_audio_beats_document() {
        let mut message = IncomingMessage {
            chat_id: 42,
            voice: Some(VoiceRef::default()),
            audio: Some(AudioRef::default()),
            document: Some(DocumentRef::default()),
            ..Default::default()
        };
        assert!(matches!(route(&Update::with_message(1, message.clone())), Command::AnalyzeVoice(_)));
        message.voice = None;
        assert!(matches!(route(&Update::with_message(2, message.clone())), Command::AnalyzeAudio(_)));
        message.audio = None;
        assert!(matches!(route(&Update::with_message(3, message)), Command::AnalyzeDocument(_)));
    }

    #[test]
    fn test_verb_table_longest_first() {
        let lengths: Vec<usize> = VERBS.iter().map(|(v, _)| v.len()).collect();
        assert!(lengths.windows(2).all(|w| w[0] >= w[1]));
    }
}
