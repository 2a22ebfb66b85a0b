//! Slide-deck filling.
//!
//! Slide shapes only hold flat text, so every binding resolves to one
//! replacement string which is substituted wherever the tag appears across
//! the deck's text frames. True in-place image insertion into a shape is
//! not attempted; image bindings become a fixed literal notice.

use std::collections::HashMap;
use std::path::Path;

use crate::content::{ContentKind, UploadedFile};
use crate::error::Result;
use crate::extract;
use crate::pptx::Presentation;
use crate::scan;
use crate::xlsx;

use super::{error_marker, placeholder_tag, IMAGE_NOTICE};

pub(super) fn fill(
    template: &Path,
    file_inputs: &HashMap<String, UploadedFile>,
    text_inputs: &HashMap<String, String>,
    out_path: &Path,
) -> Result<()> {
    let mut deck = Presentation::open(template)?;
    log::info!("filling slide deck {}", template.display());

    let names = scan::placeholder_names(&deck.all_text());
    for name in names {
        let tag = placeholder_tag(&name);
        let replacement = match file_inputs.get(&name) {
            Some(upload) => file_replacement(&name, upload),
            // Names with no binding at all substitute as empty strings.
            None => text_inputs.get(&name).cloned().unwrap_or_default(),
        };
        for slide in deck.slides_mut() {
            for index in slide.frame_indices() {
                let text = slide.frame_text(index);
                if text.contains(&tag) {
                    slide.set_frame_text(index, &text.replace(&tag, &replacement));
                }
            }
        }
    }

    deck.save(out_path)
}

fn file_replacement(name: &str, upload: &UploadedFile) -> String {
    match upload.kind() {
        ContentKind::Image => IMAGE_NOTICE.to_string(),
        ContentKind::Spreadsheet => match xlsx::read_sheet_table(&upload.bytes) {
            Ok(grid) if grid.column_count() > 0 => xlsx::render_text_table(&grid),
            Ok(_) => degraded(name, "spreadsheet", "worksheet has no columns"),
            Err(e) => degraded(name, "spreadsheet", &e.to_string()),
        },
        _ => match extract::extract_text(upload) {
            Ok(text) => text,
            Err(e) => degraded(name, "file", &e.to_string()),
        },
    }
}

fn degraded(name: &str, what: &str, reason: &str) -> String {
    log::warn!(
        "placeholder {} degraded to an inline marker: {}",
        name,
        reason
    );
    error_marker(what, name, reason)
}
