//! Document generation: PDF, Word and Excel files for the `/pdf`, `/word`
//! and `/excel` commands.

use std::time::Duration;

use async_trait::async_trait;
use tracing::info;

use super::{docx, file_stem, pdf, xlsx, Artifact, MediaError, ScratchFile};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Word,
    Excel,
}

impl DocumentKind {
    pub fn extension(self) -> &'static str {
        match self {
            DocumentKind::Pdf => "pdf",
            DocumentKind::Word => "docx",
            DocumentKind::Excel => "xlsx",
        }
    }
}

/// What to put in a generated document.
#[derive(Debug, Clone)]
pub struct DocumentRequest {
    pub kind: DocumentKind,
    pub title: String,
    /// Body text (PDF, Word).
    pub paragraphs: Vec<String>,
    /// Key/value rows (Excel).
    pub rows: Vec<(String, String)>,
}

#[async_trait]
pub trait DocumentGenerator: Send + Sync {
    async fn generate(&self, request: DocumentRequest) -> Result<Artifact, MediaError>;
}

/// Builds documents on the blocking pool and writes them to scratch files.
pub struct OfficeGenerator {
    timeout: Duration,
}

impl OfficeGenerator {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

/// Render a request to bytes.
pub fn render(request: &DocumentRequest) -> Result<Vec<u8>, MediaError> {
    match request.kind {
        DocumentKind::Pdf => Ok(pdf::render(&request.title, &request.paragraphs.join("\n"))),
        DocumentKind::Word => docx::render(&request.title, &request.paragraphs),
        DocumentKind::Excel => xlsx::render(&request.title, &request.rows),
    }
}

#[async_trait]
impl DocumentGenerator for OfficeGenerator {
    async fn generate(&self, request: DocumentRequest) -> Result<Artifact, MediaError> {
        let kind = request.kind;
        let file_name = format!("{}.{}", file_stem(&request.title), kind.extension());

        let job = tokio::task::spawn_blocking(move || render(&request));
        let bytes = tokio::time::timeout(self.timeout, job)
            .await
            .map_err(|_| MediaError::Timeout)?
            .map_err(|e| MediaError::Io(format!("generator task failed: {e}")))??;

        let file = ScratchFile::write(&format!(".{}", kind.extension()), &bytes).await?;
        info!("📄 Generated {} ({} bytes)", file_name, bytes.len());
        Ok(Artifact { file_name, file })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(kind: DocumentKind) -> DocumentRequest {
        DocumentRequest {
            kind,
            title: "Quarterly Report".to_string(),
            paragraphs: vec!["Generated by ATLAS AI.".to_string()],
            rows: vec![("Title".to_string(), "Quarterly Report".to_string())],
        }
    }

    #[tokio::test]
    async fn test_generates_each_kind_into_scratch_file() {
        let generator = OfficeGenerator::new(Duration::from_secs(10));
        for (kind, magic) in [
            (DocumentKind::Pdf, &b"%PDF"[..]),
            (DocumentKind::Word, &b"PK"[..]),
            (DocumentKind::Excel, &b"PK"[..]),
        ] {
            let artifact = generator.generate(request(kind)).await.unwrap();
            assert_eq!(artifact.file_name, format!("Quarterly_Report.{}", kind.extension()));
            let bytes = artifact.file.read().await.unwrap();
            assert!(bytes.starts_with(magic), "{kind:?} output has wrong magic");
            let path = artifact.path().to_path_buf();
            drop(artifact);
            assert!(!path.exists());
        }
    }
}
