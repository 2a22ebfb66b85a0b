//! Placeholder scanning.
//!
//! Walks a template's text-bearing content and returns the placeholder
//! names found, first-seen order preserved, duplicates dropped. For flow
//! documents only body-level paragraph text is scanned; table-cell text is
//! deliberately excluded, even though the filler does substitute inside
//! cells. Callers building input forms rely on that exact behavior.

use std::collections::HashSet;
use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;

use crate::content::TemplateKind;
use crate::docx::Document;
use crate::error::Result;
use crate::pptx::Presentation;

/// Returns the ordered, de-duplicated placeholder names of a template.
///
/// Unsupported extensions yield an empty list rather than an error, so
/// arbitrary uploads can be probed before validation.
pub fn extract_placeholders(path: &Path) -> Result<Vec<String>> {
    let text = match TemplateKind::from_path(path) {
        Some(TemplateKind::Docx) => Document::open(path)?.paragraph_texts().join("\n"),
        Some(TemplateKind::Pptx) => Presentation::open(path)?.all_text(),
        None => {
            log::debug!("not scanning {}: unsupported extension", path.display());
            return Ok(Vec::new());
        }
    };
    let names = placeholder_names(&text);
    log::debug!("{}: {} placeholder(s) found", path.display(), names.len());
    Ok(names)
}

fn placeholder_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\{([^{}]+)\}").expect("placeholder pattern is valid"))
}

/// `{NAME}` captures in a flat text blob, names trimmed, first occurrence
/// wins.
pub(crate) fn placeholder_names(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut ordered = Vec::new();
    for capture in placeholder_pattern().captures_iter(text) {
        let name = capture[1].trim().to_string();
        if seen.insert(name.clone()) {
            ordered.push(name);
        }
    }
    ordered
}
