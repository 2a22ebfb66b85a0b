//! Flow-document filling.
//!
//! The body is never mutated while it is being read. A first pass walks the
//! paragraphs and plans at most one edit per paragraph; a second pass
//! rebuilds the body applying those edits (which is where spreadsheet
//! tables take the place of their placeholder paragraphs); a third pass
//! substitutes string values inside table cells, including cells of tables
//! inserted by the second pass, matching how the document reads after the
//! paragraph edits.

use std::collections::HashMap;
use std::path::Path;

use image::GenericImageView;

use crate::content::{ContentKind, UploadedFile};
use crate::docx::{self, Document};
use crate::error::Result;
use crate::extract;
use crate::ooxml::xml::{Element, Node};
use crate::xlsx::{self, SheetTable};

use super::{error_marker, placeholder_tag, substitute_tags, IMAGE_DISPLAY_WIDTH_EMU};

/// One planned paragraph edit, produced by the read-only pass.
enum ParaEdit {
    /// Rewrite the paragraph text (string substitution or an inline error
    /// marker).
    Rewrite(String),
    /// Replace the paragraph content with an inline image.
    Image {
        filename: String,
        bytes: Vec<u8>,
        width_px: u32,
        height_px: u32,
    },
    /// Replace the paragraph content with extracted text, line by line.
    Lines(String),
    /// Replace the paragraph itself with a table built from the grid.
    Table(SheetTable),
}

/// A planned edit with its media already registered in the package.
enum ParaAction {
    Rewrite(String),
    Image {
        relationship_id: String,
        filename: String,
        height_emu: u64,
        drawing_id: u32,
    },
    Lines(String),
    Table(SheetTable),
}

pub(super) fn fill(
    template: &Path,
    file_inputs: &HashMap<String, UploadedFile>,
    text_inputs: &HashMap<String, String>,
    out_path: &Path,
) -> Result<()> {
    let mut document = Document::open(template)?;
    log::info!("filling flow document {}", template.display());

    // 1) Read-only traversal: one planned edit per affected paragraph.
    let plans = plan_paragraph_edits(document.body()?, file_inputs, text_inputs);

    // 2) Register image media parts; the tree itself is still untouched.
    let mut drawing_id = document.next_drawing_id();
    let mut actions: HashMap<usize, ParaAction> = HashMap::new();
    for (index, edit) in plans {
        let action = match edit {
            ParaEdit::Rewrite(text) => ParaAction::Rewrite(text),
            ParaEdit::Lines(text) => ParaAction::Lines(text),
            ParaEdit::Table(grid) => ParaAction::Table(grid),
            ParaEdit::Image {
                filename,
                bytes,
                width_px,
                height_px,
            } => {
                let relationship_id = document.add_image_part(&filename, &bytes)?;
                let action = ParaAction::Image {
                    relationship_id,
                    filename,
                    height_emu: display_height_emu(width_px, height_px),
                    drawing_id,
                };
                drawing_id += 1;
                action
            }
        };
        actions.insert(index, action);
    }

    // 3) Apply the paragraph edits in one body rebuild.
    apply_paragraph_actions(document.body_mut()?, actions);

    // 4) Table cells get string substitution only.
    apply_cell_edits(document.body_mut()?, text_inputs);

    document.save(out_path)
}

/// Display height for a fixed 4-inch display width, keeping the source
/// aspect ratio.
fn display_height_emu(width_px: u32, height_px: u32) -> u64 {
    let ratio = height_px as f64 / width_px.max(1) as f64;
    ((IMAGE_DISPLAY_WIDTH_EMU as f64 * ratio).round() as u64).max(1)
}

fn plan_paragraph_edits(
    body: &Element,
    file_inputs: &HashMap<String, UploadedFile>,
    text_inputs: &HashMap<String, String>,
) -> Vec<(usize, ParaEdit)> {
    let mut plans = Vec::new();
    for (index, node) in body.children.iter().enumerate() {
        let Node::Element(paragraph) = node else {
            continue;
        };
        if paragraph.name != "w:p" {
            continue;
        }
        let text = docx::paragraph_text(paragraph);
        if let Some((name, upload)) = earliest_file_binding(&text, file_inputs) {
            plans.push((index, plan_file_edit(name, upload)));
        } else {
            let replaced = substitute_tags(&text, text_inputs);
            if replaced != text {
                plans.push((index, ParaEdit::Rewrite(replaced)));
            }
        }
    }
    plans
}

/// The file-bound tag occurring earliest in the paragraph text, if any. A
/// file binding claims the whole paragraph, so only one can apply.
fn earliest_file_binding<'a>(
    text: &str,
    file_inputs: &'a HashMap<String, UploadedFile>,
) -> Option<(&'a str, &'a UploadedFile)> {
    file_inputs
        .iter()
        .filter_map(|(name, upload)| {
            text.find(&placeholder_tag(name))
                .map(|position| (position, name, upload))
        })
        .min_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(b.1)))
        .map(|(_, name, upload)| (name.as_str(), upload))
}

fn plan_file_edit(name: &str, upload: &UploadedFile) -> ParaEdit {
    match upload.kind() {
        ContentKind::Image => match image::load_from_memory(&upload.bytes) {
            Ok(decoded) => {
                let (width_px, height_px) = decoded.dimensions();
                ParaEdit::Image {
                    filename: upload.filename.clone(),
                    bytes: upload.bytes.clone(),
                    width_px,
                    height_px,
                }
            }
            Err(e) => degraded(name, "image", &e.to_string()),
        },
        ContentKind::Spreadsheet => match xlsx::read_sheet_table(&upload.bytes) {
            Ok(grid) if grid.column_count() > 0 => ParaEdit::Table(grid),
            Ok(_) => degraded(name, "spreadsheet", "worksheet has no columns"),
            Err(e) => degraded(name, "spreadsheet", &e.to_string()),
        },
        // Text documents, plain text and unknown payloads all insert their
        // extracted text.
        _ => match extract::extract_text(upload) {
            Ok(text) => ParaEdit::Lines(text),
            Err(e) => degraded(name, "file", &e.to_string()),
        },
    }
}

fn degraded(name: &str, what: &str, reason: &str) -> ParaEdit {
    log::warn!(
        "placeholder {} degraded to an inline marker: {}",
        name,
        reason
    );
    ParaEdit::Rewrite(error_marker(what, name, reason))
}

fn apply_paragraph_actions(body: &mut Element, mut actions: HashMap<usize, ParaAction>) {
    let old = std::mem::take(&mut body.children);
    let mut rebuilt = Vec::with_capacity(old.len());
    for (index, node) in old.into_iter().enumerate() {
        let Some(action) = actions.remove(&index) else {
            rebuilt.push(node);
            continue;
        };
        let mut paragraph = match node {
            Node::Element(el) if el.name == "w:p" => el,
            other => {
                rebuilt.push(other);
                continue;
            }
        };
        match action {
            ParaAction::Rewrite(text) => {
                docx::set_paragraph_text(&mut paragraph, &text);
                rebuilt.push(Node::Element(paragraph));
            }
            ParaAction::Lines(text) => {
                docx::clear_runs(&mut paragraph);
                docx::append_text_lines(&mut paragraph, &text);
                rebuilt.push(Node::Element(paragraph));
            }
            ParaAction::Image {
                relationship_id,
                filename,
                height_emu,
                drawing_id,
            } => {
                docx::clear_runs(&mut paragraph);
                docx::append_image_run(
                    &mut paragraph,
                    &relationship_id,
                    IMAGE_DISPLAY_WIDTH_EMU,
                    height_emu,
                    drawing_id,
                    &filename,
                );
                rebuilt.push(Node::Element(paragraph));
            }
            // The table takes the paragraph's position; the emptied
            // placeholder paragraph is dropped with the same rebuild.
            ParaAction::Table(grid) => {
                rebuilt.push(Node::Element(docx::table_from_grid(&grid)));
            }
        }
    }
    body.children = rebuilt;
}

fn apply_cell_edits(body: &mut Element, text_inputs: &HashMap<String, String>) {
    if text_inputs.is_empty() {
        return;
    }
    for table in body.children_named_mut("w:tbl") {
        for row in table.children_named_mut("w:tr") {
            for cell in row.children_named_mut("w:tc") {
                let text = docx::cell_text(cell);
                let replaced = substitute_tags(&text, text_inputs);
                if replaced != text {
                    docx::set_cell_text(cell, &replaced);
                }
            }
        }
    }
}
