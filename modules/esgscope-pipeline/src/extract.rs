//! Document extraction seam.
//!
//! Format readers are adapters behind `DocumentExtractor`. The in-tree
//! implementation covers text-like uploads; PDF/DOCX/spreadsheet readers and
//! OCR-backed image reading plug in behind the same trait and report
//! `ocr_used` themselves.

use async_trait::async_trait;

use esgscope_common::EsgError;

/// One uploaded file, buffered in memory for the duration of a run.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub data: Vec<u8>,
    pub content_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedDocument {
    pub filename: String,
    pub text: String,
}

/// Extraction result, preserving upload order — downstream source
/// resolution and dedup depend on it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedDocuments {
    pub documents: Vec<ExtractedDocument>,
    pub ocr_used: bool,
}

impl ExtractedDocuments {
    pub fn filenames(&self) -> Vec<String> {
        self.documents.iter().map(|d| d.filename.clone()).collect()
    }

    /// All documents' text joined for the raw-text preview.
    pub fn combined_text(&self) -> String {
        self.documents
            .iter()
            .map(|d| d.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
            .trim()
            .to_string()
    }
}

#[async_trait]
pub trait DocumentExtractor: Send + Sync {
    async fn extract(&self, files: &[UploadedFile]) -> Result<ExtractedDocuments, EsgError>;
}

const SUPPORTED_EXTENSIONS: [&str; 3] = [".txt", ".md", ".csv"];

fn extension(filename: &str) -> String {
    filename
        .rfind('.')
        .map(|dot| filename[dot..].to_lowercase())
        .unwrap_or_default()
}

/// Extractor for plain-text uploads. Rejects anything it cannot read rather
/// than passing garbage downstream.
pub struct PlainTextExtractor;

#[async_trait]
impl DocumentExtractor for PlainTextExtractor {
    async fn extract(&self, files: &[UploadedFile]) -> Result<ExtractedDocuments, EsgError> {
        let mut documents = Vec::with_capacity(files.len());
        for file in files {
            let ext = extension(&file.filename);
            if !SUPPORTED_EXTENSIONS.contains(&ext.as_str()) {
                return Err(EsgError::UnsupportedFormat(file.filename.clone()));
            }
            documents.push(ExtractedDocument {
                filename: file.filename.clone(),
                text: String::from_utf8_lossy(&file.data).into_owned(),
            });
        }
        Ok(ExtractedDocuments {
            documents,
            ocr_used: false,
        })
    }
}
