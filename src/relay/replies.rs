//! Fixed reply texts.

use crate::media::tts::VOICE_LANGUAGES;
use crate::session::Identity;

fn voice_command_list() -> String {
    VOICE_LANGUAGES
        .iter()
        .map(|lang| format!("/voice{} <text> - {} voice", lang.code, lang.name))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn welcome(identity: &Identity, user_name: &str) -> String {
    format!(
        "🚀 Welcome to {name} AI!\n\n\
         Hello {user_name}! I'm {name}, your AI assistant with media capabilities, created by {creator}.\n\n\
         🎯 Commands:\n\
         /start - Welcome message\n\
         /help - Show all capabilities\n\
         /voice <text> - Convert text to voice\n\
         /pdf <title> - Generate a PDF document\n\
         /word <title> - Create a Word document\n\
         /excel <title> - Generate an Excel sheet\n\n\
         📋 Send a document, audio file or voice note and I'll analyze it.\n\n\
         💡 Examples:\n\
         • /voice Hello world\n\
         • /pdf Business Plan\n\n\
         Ask me anything! 🔥 Created by {creator}",
        name = identity.assistant_name,
        creator = identity.creator_name,
    )
}

pub fn help(identity: &Identity) -> String {
    format!(
        "🧠 {name} AI - Help\n\n\
         📋 Basic commands:\n\
         /start - Welcome message\n\
         /help - Show this help\n\n\
         🎵 Media commands:\n\
         /voice <text> - Convert text to a voice message\n\
         {voices}\n\
         /pdf <title> - Generate a PDF document\n\
         /word <title> - Create a Word document\n\
         /excel <title> - Generate an Excel sheet\n\n\
         📋 Analysis:\n\
         Send a document (PDF, Word, Excel, images, text and code files) up to 20 MB,\n\
         an audio file or a voice note.\n\n\
         🧠 Anything else goes to the AI: questions, writing, research, code.\n\n\
         👨‍💻 Created by: {creator}",
        name = identity.assistant_name,
        creator = identity.creator_name,
        voices = voice_command_list(),
    )
}

pub fn voice_usage(command: &str) -> String {
    format!("❌ Please provide text to convert to voice\nExample: {command} Hello world")
}

pub const PDF_USAGE: &str = "❌ Please provide a title for the PDF\nExample: /pdf Business Plan";
pub const WORD_USAGE: &str = "❌ Please provide a title for the Word document\nExample: /word Meeting Notes";
pub const EXCEL_USAGE: &str = "❌ Please provide a title for the Excel sheet\nExample: /excel Project Data";

pub const VOICE_FAILED: &str = "❌ Failed to generate voice message";
pub const PDF_FAILED: &str = "❌ Failed to generate PDF";
pub const WORD_FAILED: &str = "❌ Failed to generate Word document";
pub const EXCEL_FAILED: &str = "❌ Failed to generate Excel sheet";
pub const DOWNLOAD_FAILED: &str = "❌ Failed to download the file for analysis";
pub const INTERNAL_ERROR: &str = "❌ Something went wrong while handling your message. Please try again.";

pub fn pdf_caption(title: &str) -> String {
    format!("📄 Your PDF: {title}")
}

pub fn word_caption(title: &str) -> String {
    format!("📝 Your Word document: {title}")
}

pub fn excel_caption(title: &str) -> String {
    format!("📊 Your Excel sheet: {title}")
}

/// Body of generated PDF and Word documents.
pub fn document_body(identity: &Identity, kind: &str) -> String {
    format!(
        "This is your personalized {kind} document generated by {} AI.",
        identity.assistant_name
    )
}

/// Sent instead of downloading an attachment above the size limit.
pub fn large_file_guidance(file_name: &str, size: u64) -> [String; 3] {
    [
        format!(
            "📄 {file_name} is {:.1} MB, above the 20 MB limit for downloads by bots, so I can't open it directly.",
            size as f64 / (1024.0 * 1024.0)
        ),
        "✂️ Option 1: split the file into parts under 20 MB (for PDFs, split by page range) and send them one by one.".to_string(),
        "🗜️ Option 2: compress it or export only the relevant pages or sheets.\n\
         📝 Option 3: paste the key text into the chat and I'll analyze it directly."
            .to_string(),
    ]
}

pub fn cloud_link(identity: &Identity) -> String {
    format!(
        "🔗 I can't open files from cloud storage links.\n\n\
         Download the file and send it here as an attachment (up to 20 MB), \
         and {} will analyze it for you.",
        identity.assistant_name
    )
}

pub const FILE_HINT: &str = "📎 Please attach the file you'd like me to analyze.\n\
     I can read PDF, Word, Excel, images, text and code files up to 20 MB, as well as audio and voice notes.";
