//! File analysis reports for uploaded documents, audio and voice notes.

use super::{audio::format_duration, docx, pdf, preview, xlsx, MediaError};

/// Characters of content shown in previews.
const PREVIEW_CHARS: usize = 500;

const TEXT_EXTENSIONS: &[&str] = &[
    "txt", "md", "log", "csv", "json", "xml", "py", "js", "html", "css", "yaml", "yml", "toml", "rs",
];

/// MIME type for a file extension.
pub fn mime_type(extension: &str) -> String {
    mime_guess::from_ext(extension).first_or_octet_stream().to_string()
}

/// Lowercased extension of `file_name`, or "unknown".
pub fn extension(file_name: &str) -> String {
    match file_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => ext.to_lowercase(),
        _ => "unknown".to_string(),
    }
}

fn size_line(size: u64) -> String {
    format!("📏 Size: {:.2} MB ({} bytes)", size as f64 / (1024.0 * 1024.0), size)
}

/// Build the analysis report for a downloaded document.
pub fn analyze_document(data: &[u8], file_name: &str) -> String {
    let ext = extension(file_name);
    let mut report = vec![
        "📄 File Analysis".to_string(),
        String::new(),
        format!("📁 Name: {file_name}"),
        size_line(data.len() as u64),
        format!("🔧 Extension: .{ext}"),
        format!("📋 MIME type: {}", mime_type(&ext)),
    ];

    let details = match ext.as_str() {
        "pdf" => pdf_details(data),
        "docx" => docx_details(data),
        "xlsx" => xlsx_details(data),
        "png" | "jpg" | "jpeg" | "gif" => image_details(data),
        e if TEXT_EXTENSIONS.contains(&e) => Ok(text_details(data)),
        _ => Ok(vec!["📝 Basic file information available".to_string()]),
    };

    report.push(String::new());
    match details {
        Ok(lines) => report.extend(lines),
        Err(e) => report.push(format!("❌ Detailed analysis failed: {e}")),
    }
    report.join("\n")
}

fn pdf_details(data: &[u8]) -> Result<Vec<String>, MediaError> {
    let info = pdf::inspect(data).ok_or_else(|| MediaError::Format("missing PDF header".to_string()))?;
    let mut lines = vec!["📄 PDF Analysis".to_string(), format!("📋 Pages: {}", info.pages)];
    if let Some(version) = info.version {
        lines.push(format!("🏷️ Version: {version}"));
    }
    if let Some(title) = info.title {
        lines.push(format!("📝 Title: {title}"));
    }
    if let Some(author) = info.author {
        lines.push(format!("👤 Author: {author}"));
    }
    if info.encrypted {
        lines.push("🔒 Encrypted".to_string());
    }
    Ok(lines)
}

fn docx_details(data: &[u8]) -> Result<Vec<String>, MediaError> {
    let text = docx::extract_text(data)?;
    if text.trim().is_empty() {
        return Ok(vec!["📝 Word Analysis".to_string(), "Document contains no text".to_string()]);
    }
    Ok(vec![
        "📝 Word Analysis".to_string(),
        format!("📋 Paragraphs: {}", text.lines().count()),
        format!("🔤 Words: {}", text.split_whitespace().count()),
        String::new(),
        "📖 Content Preview:".to_string(),
        preview(&text, PREVIEW_CHARS),
    ])
}

fn xlsx_details(data: &[u8]) -> Result<Vec<String>, MediaError> {
    let sheets = xlsx::sheet_names(data)?;
    Ok(vec![
        "📊 Excel Analysis".to_string(),
        format!("📋 Sheets: {}", sheets.len()),
        format!("🗂️ Names: {}", sheets.join(", ")),
    ])
}

fn text_details(data: &[u8]) -> Vec<String> {
    let content = String::from_utf8_lossy(data);
    vec![
        "📄 Text File Analysis".to_string(),
        format!("📏 Characters: {}", content.chars().count()),
        format!("📋 Lines: {}", content.lines().count()),
        String::new(),
        "📖 Content Preview:".to_string(),
        preview(&content, PREVIEW_CHARS),
    ]
}

fn image_details(data: &[u8]) -> Result<Vec<String>, MediaError> {
    let (format, width, height) =
        image_dimensions(data).ok_or_else(|| MediaError::Format("unrecognized image header".to_string()))?;
    Ok(vec![
        "🖼️ Image Analysis".to_string(),
        format!("🎨 Format: {format}"),
        format!("📐 Dimensions: {width} x {height} px"),
    ])
}

/// Read pixel dimensions from PNG, GIF or JPEG headers.
pub fn image_dimensions(data: &[u8]) -> Option<(&'static str, u32, u32)> {
    if data.len() >= 24 && data.starts_with(b"\x89PNG\r\n\x1a\n") {
        let width = u32::from_be_bytes(data[16..20].try_into().ok()?);
        let height = u32::from_be_bytes(data[20..24].try_into().ok()?);
        return Some(("PNG", width, height));
    }
    if data.len() >= 10 && (data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a")) {
        let width = u16::from_le_bytes([data[6], data[7]]) as u32;
        let height = u16::from_le_bytes([data[8], data[9]]) as u32;
        return Some(("GIF", width, height));
    }
    if data.starts_with(&[0xFF, 0xD8]) {
        return jpeg_dimensions(data).map(|(w, h)| ("JPEG", w, h));
    }
    None
}

fn jpeg_dimensions(data: &[u8]) -> Option<(u32, u32)> {
    let mut i = 2;
    while i + 4 <= data.len() {
        if data[i] != 0xFF {
            return None;
        }
        let marker = data[i + 1];
        // Standalone markers carry no length.
        if marker == 0xD8 || marker == 0x01 || (0xD0..=0xD7).contains(&marker) {
            i += 2;
            continue;
        }
        let len = u16::from_be_bytes([data[i + 2], data[i + 3]]) as usize;
        let is_sof = matches!(marker, 0xC0..=0xCF) && !matches!(marker, 0xC4 | 0xC8 | 0xCC);
        if is_sof {
            if i + 9 > data.len() {
                return None;
            }
            let height = u16::from_be_bytes([data[i + 5], data[i + 6]]) as u32;
            let width = u16::from_be_bytes([data[i + 7], data[i + 8]]) as u32;
            return Some((width, height));
        }
        i += 2 + len;
    }
    None
}

/// What the chat platform tells us about an audio attachment.
#[derive(Debug, Clone, Default)]
pub struct AudioFacts {
    pub label: String,
    pub file_name: Option<String>,
    pub duration_secs: u32,
    pub size: u64,
    pub mime_type: Option<String>,
    pub performer: Option<String>,
    pub title: Option<String>,
}

/// Report for a voice note or audio file plus its transcription outcome.
pub fn describe_audio(facts: &AudioFacts, transcript: &Result<String, MediaError>) -> String {
    let mut report = vec![format!("🎧 {} Analysis", facts.label), String::new()];
    if let Some(name) = &facts.file_name {
        report.push(format!("📁 Name: {name}"));
    }
    if let Some(title) = &facts.title {
        report.push(format!("🎵 Title: {title}"));
    }
    if let Some(performer) = &facts.performer {
        report.push(format!("👤 Performer: {performer}"));
    }
    report.push(format!("⏱️ Duration: {}", format_duration(facts.duration_secs)));
    report.push(size_line(facts.size));
    if let Some(mime) = &facts.mime_type {
        report.push(format!("📋 MIME type: {mime}"));
    }

    report.push(String::new());
    match transcript {
        Ok(text) if text.trim().is_empty() => report.push("🗣️ No speech detected".to_string()),
        Ok(text) => {
            report.push("🗣️ Transcription:".to_string());
            report.push(preview(text, 3000));
        }
        Err(MediaError::Unavailable(_)) => {
            report.push("⚠️ Speech transcription is not available on this deployment".to_string())
        }
        Err(e) => report.push(format!("❌ Transcription failed: {e}")),
    }
    report.join("\n")
}
