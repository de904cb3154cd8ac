//! Media collaborators: speech, transcription, document generation and analysis.
//!
//! Each collaborator is independently failable and reports a [`MediaError`];
//! the relay turns those into user-facing explanations.

pub mod analysis;
pub mod audio;
pub mod docx;
pub mod generate;
pub mod pdf;
pub mod scratch;
pub mod transcribe;
pub mod tts;
#[cfg(feature = "whisper")]
pub mod whisper;
pub mod xlsx;

use std::fmt;
use std::io::{Read, Seek};

use zip::ZipArchive;

pub use generate::{DocumentGenerator, DocumentKind, DocumentRequest, OfficeGenerator};
pub use scratch::ScratchFile;
pub use transcribe::Transcriber;
pub use tts::{Synthesizer, TtsClient, VoiceLanguage};

/// A generated file waiting to be sent. The backing file is removed on drop.
#[derive(Debug)]
pub struct Artifact {
    pub file_name: String,
    pub file: ScratchFile,
}

impl Artifact {
    pub fn path(&self) -> &std::path::Path {
        self.file.path()
    }
}

#[derive(Debug)]
pub enum MediaError {
    Io(String),
    /// External tool (ffmpeg, espeak-ng) failed or is missing.
    Process(String),
    Http(String),
    /// Input or output bytes were not in the expected format.
    Format(String),
    /// The collaborator is not configured on this deployment.
    Unavailable(String),
    Timeout,
}

impl fmt::Display for MediaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaError::Io(e) => write!(f, "I/O error: {e}"),
            MediaError::Process(e) => write!(f, "tool error: {e}"),
            MediaError::Http(e) => write!(f, "HTTP error: {e}"),
            MediaError::Format(e) => write!(f, "format error: {e}"),
            MediaError::Unavailable(e) => write!(f, "unavailable: {e}"),
            MediaError::Timeout => write!(f, "timed out"),
        }
    }
}

impl std::error::Error for MediaError {}

impl From<std::io::Error> for MediaError {
    fn from(e: std::io::Error) -> Self {
        MediaError::Io(e.to_string())
    }
}

impl From<zip::result::ZipError> for MediaError {
    fn from(e: zip::result::ZipError) -> Self {
        MediaError::Format(e.to_string())
    }
}

/// Largest uncompressed archive entry we will read.
pub(crate) const MAX_ENTRY_BYTES: u64 = 16 * 1024 * 1024;

/// Read one XML part of an office archive as text, refusing entries that
/// inflate past `limit` bytes.
pub(crate) fn read_entry<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    name: &str,
    format: &str,
    limit: u64,
) -> Result<String, MediaError> {
    let entry = archive
        .by_name(name)
        .map_err(|_| MediaError::Format(format!("invalid {format}: missing {name}")))?;
    let mut bytes = Vec::new();
    entry.take(limit + 1).read_to_end(&mut bytes)?;
    if bytes.len() as u64 > limit {
        return Err(MediaError::Format(format!(
            "invalid {format}: {name} inflates past {limit} bytes"
        )));
    }
    String::from_utf8(bytes).map_err(|e| MediaError::Format(format!("invalid {format}: {name} is not UTF-8: {e}")))
}

/// Cut `text` to at most `max_chars` characters, appending "..." when cut.
pub fn preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => format!("{}...", &text[..end]),
        None => text.to_string(),
    }
}

/// Escape text for XML element content and attribute values.
pub(crate) fn xml_escape(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '&' => result.push_str("&amp;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&apos;"),
            _ => result.push(c),
        }
    }
    result
}

/// Turn a user-supplied title into a safe file name stem.
pub(crate) fn file_stem(title: &str) -> String {
    let stem: String = title
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    let stem = stem.trim_matches('_');
    if stem.is_empty() {
        "document".to_string()
    } else {
        stem.chars().take(60).collect()
    }
}
