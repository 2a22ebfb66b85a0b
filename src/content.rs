//! Payload and template classification.
//!
//! Every extension check in the crate goes through the two enums here, so
//! the dispatch is decided once per file instead of being re-derived from
//! the filename at each use site.

use std::path::Path;

/// What a template file is, decided from its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateKind {
    /// A word-processor flow document (`.docx`): paragraphs plus tables.
    Docx,
    /// A slide deck (`.pptx`): slides holding shapes with text frames.
    Pptx,
}

impl TemplateKind {
    /// Classifies a template path, `None` when the extension is neither
    /// supported kind. Matching is case-insensitive.
    pub fn from_path(path: &Path) -> Option<Self> {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            Some("docx") => Some(TemplateKind::Docx),
            Some("pptx") => Some(TemplateKind::Pptx),
            _ => None,
        }
    }
}

/// How an uploaded payload is substituted into a document, decided once
/// from its filename.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    /// Raster image, inserted as an inline picture.
    Image,
    /// Spreadsheet, inserted as a table.
    Spreadsheet,
    /// A document we can pull text out of (`.docx`, `.pptx`).
    TextDocument,
    /// Plain text.
    PlainText,
    /// Anything else; handled as best-effort text.
    Unknown,
}

impl ContentKind {
    pub fn from_filename(filename: &str) -> Self {
        match extension_of(filename).as_deref() {
            Some("png") | Some("jpg") | Some("jpeg") | Some("gif") | Some("bmp") => {
                ContentKind::Image
            }
            Some("xlsx") => ContentKind::Spreadsheet,
            Some("docx") | Some("pptx") => ContentKind::TextDocument,
            Some("txt") => ContentKind::PlainText,
            _ => ContentKind::Unknown,
        }
    }
}

/// Lowercased extension of a filename, without the dot.
pub(crate) fn extension_of(filename: &str) -> Option<String> {
    let (stem, ext) = filename.rsplit_once('.')?;
    if stem.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// An uploaded file payload bound to a placeholder name.
///
/// The bytes are held fully in memory so the payload can be re-read by every
/// consumer (classification, content parse, text extraction) without any
/// stream rewinding.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            bytes,
        }
    }

    pub fn kind(&self) -> ContentKind {
        ContentKind::from_filename(&self.filename)
    }

    pub fn extension(&self) -> Option<String> {
        extension_of(&self.filename)
    }
}
