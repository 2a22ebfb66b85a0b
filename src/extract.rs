//! Shared text extraction from uploaded payloads.
//!
//! Both fill paths insert the text of a non-image payload somewhere in the
//! output; this routine is the single place that knows how to get that text
//! out. Dispatch is by the payload's [`ContentKind`]:
//!
//! - plain text decodes with invalid byte sequences replaced, never fatally;
//! - flow documents contribute every paragraph, newline separated;
//! - slide decks contribute every text frame, newline separated;
//! - anything else falls back to best-effort text decoding of the raw
//!   bytes (garbled output for binary payloads is acceptable by contract).

use crate::content::{ContentKind, UploadedFile};
use crate::docx::Document;
use crate::error::Result;
use crate::pptx::Presentation;

/// Extracts the full text of an uploaded payload.
///
/// Only a structurally broken document payload produces an error; callers
/// in the fill paths turn that into an inline marker rather than failing
/// the operation.
pub fn extract_text(file: &UploadedFile) -> Result<String> {
    match file.kind() {
        ContentKind::PlainText => Ok(lossy_text(&file.bytes)),
        ContentKind::TextDocument => match file.extension().as_deref() {
            Some("docx") => {
                let document = Document::from_bytes(&file.bytes)?;
                Ok(document.paragraph_texts().join("\n"))
            }
            Some("pptx") => {
                let deck = Presentation::from_bytes(&file.bytes)?;
                Ok(deck.all_text())
            }
            _ => Ok(lossy_text(&file.bytes)),
        },
        _ => Ok(lossy_text(&file.bytes)),
    }
}

fn lossy_text(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}
