//! # Template Filling
//!
//! The fill operation takes a template, a map of placeholder name to string
//! value and a map of placeholder name to uploaded file, and writes a copy
//! of the template with every bound placeholder resolved. Dispatch is by
//! template kind; each kind has its own substitution procedure.
//!
//! ## Sub-modules:
//! - `docx`: the flow-document procedure. A read-only pass over the body
//!   plans one edit per paragraph (text rewrite, inline image, extracted
//!   text lines, table insertion or inline error marker); a second pass
//!   applies the edits, including table insertion at the placeholder's
//!   position and removal of consumed paragraphs; a final pass substitutes
//!   string values inside table cells.
//! - `pptx`: the slide-deck procedure. Every scanner-discovered name is
//!   resolved to one replacement string (image bindings become a fixed
//!   notice, spreadsheets a pipe-delimited text table, other files their
//!   extracted text) and substituted across all text frames.
//!
//! Per-placeholder content failures never abort the operation: they degrade
//! to an inline `[Error reading ...]` marker at the placeholder's location.
//! Only an unsupported template extension, or a template that cannot be
//! read or rewritten at all, fails the call, and then nothing is written
//! to the output path.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use crate::content::{TemplateKind, UploadedFile};
use crate::error::{FillError, Result};

mod docx;
mod pptx;

const EMU_PER_INCH: u64 = 914_400;
/// Inserted images are displayed at a fixed 4-inch width.
const IMAGE_DISPLAY_WIDTH_EMU: u64 = 4 * EMU_PER_INCH;
/// Slide decks get a literal notice instead of an in-place image.
const IMAGE_NOTICE: &str = "[IMAGE PLACEHOLDER - INSERT MANUALLY]";

/// Fills a template and writes the result to `out_path`.
///
/// `file_inputs` wins over `text_inputs` when both bind the same name. The
/// template is never modified; an unsupported template extension fails
/// before any output is written.
pub fn fill_template(
    template: &Path,
    file_inputs: &HashMap<String, UploadedFile>,
    text_inputs: &HashMap<String, String>,
    out_path: &Path,
) -> Result<()> {
    match TemplateKind::from_path(template) {
        Some(TemplateKind::Docx) => docx::fill(template, file_inputs, text_inputs, out_path),
        Some(TemplateKind::Pptx) => pptx::fill(template, file_inputs, text_inputs, out_path),
        None => {
            let extension = template
                .extension()
                .and_then(|e| e.to_str())
                .unwrap_or("")
                .to_ascii_lowercase();
            Err(FillError::UnsupportedFormat(extension))
        }
    }
}

/// The literal tag text for a placeholder name.
pub(crate) fn placeholder_tag(name: &str) -> String {
    format!("{{{}}}", name)
}

/// The inline marker written where a placeholder's content could not be
/// resolved.
pub(crate) fn error_marker(what: &str, name: &str, reason: &str) -> String {
    format!("[Error reading {} for {}: {}]", what, name, reason)
}

/// Replaces every bound tag in `text`, repeating until no bound tag
/// remains. The earliest-occurring tag is handled first and each name is
/// processed at most once, so a substituted value that itself contains a
/// tag cannot loop forever.
pub(crate) fn substitute_tags(text: &str, bindings: &HashMap<String, String>) -> String {
    let mut out = text.to_string();
    let mut done: HashSet<&str> = HashSet::new();
    loop {
        let next = bindings
            .iter()
            .filter(|(name, _)| !done.contains(name.as_str()))
            .filter_map(|(name, value)| {
                out.find(&placeholder_tag(name))
                    .map(|position| (position, name, value))
            })
            .min_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(b.1)));
        let Some((_, name, value)) = next else {
            break;
        };
        out = out.replace(&placeholder_tag(name), value);
        done.insert(name.as_str());
    }
    out
}
