//! # Flow-Document Model
//!
//! Read/mutate/write access to word-processor templates. The model exposes
//! exactly what the filling algorithm needs: body-level paragraph iteration
//! (table content excluded), per-paragraph full text, whole-paragraph
//! rewrites, inline image insertion, table construction, and body-level
//! table/row/cell access. Everything else in the document (section
//! properties, styles, headers, numbering) flows through untouched.

use std::io::Cursor;
use std::path::Path;

use uuid::Uuid;

use crate::content::extension_of;
use crate::error::{FillError, Result};
use crate::ooxml::package::{rels_part_for, Package};
use crate::ooxml::xml::{Element, Node};
use crate::xlsx::SheetTable;

const DEFAULT_MAIN_PART: &str = "word/document.xml";
const IMAGE_REL_TYPE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";
const WP_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing";
const A_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
const PIC_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/picture";
const R_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

/// A parsed flow document backed by its OOXML package.
pub struct Document {
    package: Package,
    part_name: String,
    root: Element,
}

impl Document {
    pub fn open(path: &Path) -> Result<Self> {
        Self::from_package(Package::open(path)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::from_package(Package::from_reader(Cursor::new(bytes))?)
    }

    fn from_package(package: Package) -> Result<Self> {
        let part_name = match package.main_part() {
            Ok(name) => name,
            Err(_) if package.part(DEFAULT_MAIN_PART).is_some() => DEFAULT_MAIN_PART.to_string(),
            Err(e) => return Err(e),
        };
        let root = package.xml_part(&part_name)?;
        if root.child("w:body").is_none() {
            return Err(FillError::Xml(format!("{} has no w:body", part_name)));
        }
        Ok(Self {
            package,
            part_name,
            root,
        })
    }

    /// Full text of every body-level paragraph, in document order. Text
    /// inside table cells is not included.
    pub fn paragraph_texts(&self) -> Vec<String> {
        match self.root.child("w:body") {
            Some(body) => body.children_named("w:p").map(paragraph_text).collect(),
            None => Vec::new(),
        }
    }

    /// Cell texts of every body-level table: tables -> rows -> cells.
    pub fn table_texts(&self) -> Vec<Vec<Vec<String>>> {
        let Some(body) = self.root.child("w:body") else {
            return Vec::new();
        };
        body.children_named("w:tbl")
            .map(|table| {
                table
                    .children_named("w:tr")
                    .map(|row| row.children_named("w:tc").map(cell_text).collect())
                    .collect()
            })
            .collect()
    }

    /// Number of inline drawings anywhere in the document body.
    pub fn image_count(&self) -> usize {
        self.root.count_descendants("w:drawing")
    }

    pub fn save(&mut self, path: &Path) -> Result<()> {
        self.package.set_xml_part(&self.part_name, &self.root)?;
        self.package.save(path)
    }

    pub(crate) fn body(&self) -> Result<&Element> {
        self.root
            .child("w:body")
            .ok_or_else(|| FillError::Xml("document has no w:body".to_string()))
    }

    pub(crate) fn body_mut(&mut self) -> Result<&mut Element> {
        self.root
            .child_mut("w:body")
            .ok_or_else(|| FillError::Xml("document has no w:body".to_string()))
    }

    /// Highest drawing id currently in use, so inserted images get fresh
    /// ids.
    pub(crate) fn next_drawing_id(&self) -> u32 {
        let mut max = 0;
        max_docpr_id(&self.root, &mut max);
        max + 1
    }

    /// Stores image bytes as a media part, registers its content type and
    /// relationship, and returns the relationship id to embed.
    pub(crate) fn add_image_part(&mut self, filename: &str, bytes: &[u8]) -> Result<String> {
        let ext = extension_of(filename).unwrap_or_else(|| "bin".to_string());
        let mime = mime_guess::from_path(filename).first_or_octet_stream();
        self.package.ensure_default_content_type(&ext, mime.as_ref())?;

        let media_file = format!("{}.{}", Uuid::new_v4(), ext);
        let dir = self
            .part_name
            .rsplit_once('/')
            .map(|(dir, _)| dir)
            .unwrap_or("word");
        self.package
            .set_part(&format!("{}/media/{}", dir, media_file), bytes.to_vec());

        let rels = rels_part_for(&self.part_name);
        self.package
            .add_relationship(&rels, IMAGE_REL_TYPE, &format!("media/{}", media_file))
    }
}

fn max_docpr_id(element: &Element, max: &mut u32) {
    for node in &element.children {
        if let Node::Element(el) = node {
            if el.name == "wp:docPr" {
                if let Some(id) = el.attr("id").and_then(|v| v.parse::<u32>().ok()) {
                    *max = (*max).max(id);
                }
            }
            max_docpr_id(el, max);
        }
    }
}

/// Full text of one paragraph: run text concatenated, tabs as TAB and
/// breaks as newlines.
pub(crate) fn paragraph_text(paragraph: &Element) -> String {
    let mut out = String::new();
    for run in paragraph.children_named("w:r") {
        for node in &run.children {
            if let Node::Element(el) = node {
                match el.name.as_str() {
                    "w:t" => out.push_str(&el.text_content()),
                    "w:tab" => out.push('\t'),
                    "w:br" | "w:cr" => out.push('\n'),
                    _ => {}
                }
            }
        }
    }
    out
}

/// Replaces the paragraph's entire content with a single plain run,
/// keeping the paragraph properties. Run-level formatting is not preserved.
pub(crate) fn set_paragraph_text(paragraph: &mut Element, text: &str) {
    paragraph.retain_named(&["w:pPr"]);
    if !text.is_empty() {
        paragraph.push_element(text_run(text));
    }
}

/// Removes every run from the paragraph, keeping the paragraph properties.
pub(crate) fn clear_runs(paragraph: &mut Element) {
    paragraph.retain_named(&["w:pPr"]);
}

/// Appends each line as its own run followed by an explicit line break.
pub(crate) fn append_text_lines(paragraph: &mut Element, text: &str) {
    for line in text.lines() {
        paragraph.push_element(text_run(line));
        paragraph.push_element(Element::new("w:r").with_child(Element::new("w:br")));
    }
}

/// Appends an inline picture run referencing an already-registered media
/// relationship, sized in EMU.
pub(crate) fn append_image_run(
    paragraph: &mut Element,
    relationship_id: &str,
    width_emu: u64,
    height_emu: u64,
    drawing_id: u32,
    name: &str,
) {
    let cx = width_emu.to_string();
    let cy = height_emu.to_string();
    let id = drawing_id.to_string();

    let blip = Element::new("a:blip")
        .with_attr("xmlns:r", R_NS)
        .with_attr("r:embed", relationship_id);
    let blip_fill = Element::new("pic:blipFill")
        .with_child(blip)
        .with_child(Element::new("a:stretch").with_child(Element::new("a:fillRect")));
    let nv_pic_pr = Element::new("pic:nvPicPr")
        .with_child(
            Element::new("pic:cNvPr")
                .with_attr("id", &id)
                .with_attr("name", name),
        )
        .with_child(Element::new("pic:cNvPicPr"));
    let sp_pr = Element::new("pic:spPr")
        .with_child(
            Element::new("a:xfrm")
                .with_child(Element::new("a:off").with_attr("x", "0").with_attr("y", "0"))
                .with_child(
                    Element::new("a:ext")
                        .with_attr("cx", &cx)
                        .with_attr("cy", &cy),
                ),
        )
        .with_child(
            Element::new("a:prstGeom")
                .with_attr("prst", "rect")
                .with_child(Element::new("a:avLst")),
        );
    let pic = Element::new("pic:pic")
        .with_attr("xmlns:pic", PIC_NS)
        .with_child(nv_pic_pr)
        .with_child(blip_fill)
        .with_child(sp_pr);
    let graphic = Element::new("a:graphic")
        .with_attr("xmlns:a", A_NS)
        .with_child(
            Element::new("a:graphicData")
                .with_attr("uri", PIC_NS)
                .with_child(pic),
        );
    let inline = Element::new("wp:inline")
        .with_attr("xmlns:wp", WP_NS)
        .with_attr("distT", "0")
        .with_attr("distB", "0")
        .with_attr("distL", "0")
        .with_attr("distR", "0")
        .with_child(
            Element::new("wp:extent")
                .with_attr("cx", &cx)
                .with_attr("cy", &cy),
        )
        .with_child(
            Element::new("wp:docPr")
                .with_attr("id", &id)
                .with_attr("name", name),
        )
        .with_child(graphic);

    paragraph.push_element(
        Element::new("w:r").with_child(Element::new("w:drawing").with_child(inline)),
    );
}

/// Builds a bordered table element from a parsed spreadsheet grid: one
/// header row plus one row per data row.
pub(crate) fn table_from_grid(grid: &SheetTable) -> Element {
    let mut table = Element::new("w:tbl").with_child(table_properties());

    let mut table_grid = Element::new("w:tblGrid");
    for _ in 0..grid.headers.len() {
        table_grid.push_element(Element::new("w:gridCol"));
    }
    table.push_element(table_grid);

    table.push_element(table_row(&grid.headers));
    for row in &grid.rows {
        table.push_element(table_row(row));
    }
    table
}

fn table_properties() -> Element {
    let mut borders = Element::new("w:tblBorders");
    for edge in ["w:top", "w:left", "w:bottom", "w:right", "w:insideH", "w:insideV"] {
        borders.push_element(
            Element::new(edge)
                .with_attr("w:val", "single")
                .with_attr("w:sz", "4")
                .with_attr("w:space", "0")
                .with_attr("w:color", "auto"),
        );
    }
    Element::new("w:tblPr")
        .with_child(
            Element::new("w:tblW")
                .with_attr("w:w", "0")
                .with_attr("w:type", "auto"),
        )
        .with_child(borders)
}

fn table_row(cells: &[String]) -> Element {
    let mut row = Element::new("w:tr");
    for value in cells {
        let mut paragraph = Element::new("w:p");
        if !value.is_empty() {
            paragraph.push_element(text_run(value));
        }
        row.push_element(Element::new("w:tc").with_child(paragraph));
    }
    row
}

/// Full text of a table cell: its paragraphs joined with newlines.
pub(crate) fn cell_text(cell: &Element) -> String {
    cell.children_named("w:p")
        .map(paragraph_text)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Replaces a cell's content with a single paragraph holding the text,
/// keeping the cell properties.
pub(crate) fn set_cell_text(cell: &mut Element, text: &str) {
    cell.retain_named(&["w:tcPr"]);
    let mut paragraph = Element::new("w:p");
    if !text.is_empty() {
        paragraph.push_element(text_run(text));
    }
    cell.push_element(paragraph);
}

/// A single run holding the given text, with embedded newlines and tabs
/// mapped to explicit break/tab elements so the text round-trips through
/// [`paragraph_text`].
fn text_run(text: &str) -> Element {
    let mut run = Element::new("w:r");
    let mut pending = String::new();
    for ch in text.chars() {
        match ch {
            '\n' => {
                flush_text(&mut run, &mut pending);
                run.push_element(Element::new("w:br"));
            }
            '\t' => {
                flush_text(&mut run, &mut pending);
                run.push_element(Element::new("w:tab"));
            }
            _ => pending.push(ch),
        }
    }
    flush_text(&mut run, &mut pending);
    run
}

fn flush_text(run: &mut Element, pending: &mut String) {
    if pending.is_empty() {
        return;
    }
    run.push_element(
        Element::new("w:t")
            .with_attr("xml:space", "preserve")
            .with_text(pending),
    );
    pending.clear();
}
