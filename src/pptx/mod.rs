//! # Slide-Deck Model
//!
//! Read/mutate/write access to slide-deck templates. Slides are ordered by
//! the presentation part's slide-id list (resolved through its relationship
//! part, with a numeric filename fallback); each slide exposes the text
//! frames of its shapes for reading and whole-frame rewriting.

use std::io::Cursor;
use std::path::Path;

use crate::error::{FillError, Result};
use crate::ooxml::package::{rels_part_for, Package};
use crate::ooxml::xml::{Element, Node};

const DEFAULT_MAIN_PART: &str = "ppt/presentation.xml";

pub struct Presentation {
    package: Package,
    slides: Vec<Slide>,
}

pub(crate) struct Slide {
    part_name: String,
    root: Element,
}

impl Presentation {
    pub fn open(path: &Path) -> Result<Self> {
        Self::from_package(Package::open(path)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::from_package(Package::from_reader(Cursor::new(bytes))?)
    }

    fn from_package(package: Package) -> Result<Self> {
        let main_part = match package.main_part() {
            Ok(name) => name,
            Err(_) if package.part(DEFAULT_MAIN_PART).is_some() => DEFAULT_MAIN_PART.to_string(),
            Err(e) => return Err(e),
        };
        let slide_parts = slide_part_names(&package, &main_part)?;
        let mut slides = Vec::with_capacity(slide_parts.len());
        for part_name in slide_parts {
            let root = package.xml_part(&part_name)?;
            slides.push(Slide { part_name, root });
        }
        Ok(Self { package, slides })
    }

    pub fn slide_count(&self) -> usize {
        self.slides.len()
    }

    /// Text of every shape's text frame, per slide, in slide and shape
    /// order.
    pub fn slide_texts(&self) -> Vec<Vec<String>> {
        self.slides
            .iter()
            .map(|slide| {
                slide
                    .frame_indices()
                    .into_iter()
                    .map(|i| slide.frame_text(i))
                    .collect()
            })
            .collect()
    }

    /// All text-frame content across the deck, joined with newlines.
    pub fn all_text(&self) -> String {
        self.slide_texts()
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub(crate) fn slides_mut(&mut self) -> &mut [Slide] {
        &mut self.slides
    }

    pub fn save(&mut self, path: &Path) -> Result<()> {
        for slide in &self.slides {
            self.package.set_xml_part(&slide.part_name, &slide.root)?;
        }
        self.package.save(path)
    }
}

/// Slide part names in presentation order: the `p:sldIdLst` entries resolved
/// through the presentation's relationships. Decks without a usable slide-id
/// list fall back to numeric part-name order.
fn slide_part_names(package: &Package, main_part: &str) -> Result<Vec<String>> {
    let base_dir = main_part
        .rsplit_once('/')
        .map(|(dir, _)| dir)
        .unwrap_or("ppt");
    let root = package.xml_part(main_part)?;

    let mut ordered = Vec::new();
    if let Some(id_list) = root.child("p:sldIdLst") {
        let rels = package.xml_part(&rels_part_for(main_part)).ok();
        for slide_id in id_list.children_named("p:sldId") {
            let Some(rid) = slide_id.attr("r:id") else {
                continue;
            };
            let Some(rels) = rels.as_ref() else { continue };
            let target = rels
                .children_named("Relationship")
                .find(|rel| rel.attr("Id") == Some(rid))
                .and_then(|rel| rel.attr("Target"));
            if let Some(target) = target {
                ordered.push(resolve_target(base_dir, target));
            }
        }
    }
    if !ordered.is_empty() {
        return Ok(ordered);
    }

    // Fallback: ppt/slides/slideN.xml sorted by N.
    let prefix = format!("{}/slides/slide", base_dir);
    let mut numbered: Vec<(u32, String)> = Vec::new();
    for name in package.part_names() {
        if let Some(rest) = name.strip_prefix(&prefix) {
            if let Some(number) = rest.strip_suffix(".xml").and_then(|n| n.parse::<u32>().ok()) {
                numbered.push((number, name.to_string()));
            }
        }
    }
    numbered.sort_by_key(|(number, _)| *number);
    if numbered.is_empty() {
        return Err(FillError::Package("deck has no slides".to_string()));
    }
    Ok(numbered.into_iter().map(|(_, name)| name).collect())
}

fn resolve_target(base_dir: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        absolute.to_string()
    } else {
        format!("{}/{}", base_dir, target)
    }
}

impl Slide {
    fn sp_tree(&self) -> Option<&Element> {
        self.root.child("p:cSld")?.child("p:spTree")
    }

    /// Positions (within the shape tree) of shapes that carry a text frame.
    pub(crate) fn frame_indices(&self) -> Vec<usize> {
        let Some(tree) = self.sp_tree() else {
            return Vec::new();
        };
        tree.children
            .iter()
            .enumerate()
            .filter_map(|(i, node)| match node {
                Node::Element(el)
                    if el.name == "p:sp" && el.child("p:txBody").is_some() =>
                {
                    Some(i)
                }
                _ => None,
            })
            .collect()
    }

    /// Full text of one text frame: runs concatenated per paragraph,
    /// paragraphs joined with newlines.
    pub(crate) fn frame_text(&self, index: usize) -> String {
        let Some(tree) = self.sp_tree() else {
            return String::new();
        };
        let Some(Node::Element(shape)) = tree.children.get(index) else {
            return String::new();
        };
        let Some(body) = shape.child("p:txBody") else {
            return String::new();
        };
        body.children_named("a:p")
            .map(|paragraph| {
                let mut text = String::new();
                for run in paragraph.children_named("a:r") {
                    for t in run.children_named("a:t") {
                        text.push_str(&t.text_content());
                    }
                }
                text
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Rewrites one text frame as plain paragraphs, one per line, keeping
    /// the frame's body properties and list style.
    pub(crate) fn set_frame_text(&mut self, index: usize, text: &str) {
        let Some(csld) = self.root.child_mut("p:cSld") else {
            return;
        };
        let Some(tree) = csld.child_mut("p:spTree") else {
            return;
        };
        let Some(Node::Element(shape)) = tree.children.get_mut(index) else {
            return;
        };
        let Some(body) = shape.child_mut("p:txBody") else {
            return;
        };

        body.retain_named(&["a:bodyPr", "a:lstStyle"]);
        if body.child("a:bodyPr").is_none() {
            body.children
                .insert(0, Node::Element(Element::new("a:bodyPr")));
        }
        for line in text.split('\n') {
            let mut paragraph = Element::new("a:p");
            if !line.is_empty() {
                paragraph.push_element(
                    Element::new("a:r").with_child(Element::new("a:t").with_text(line)),
                );
            }
            body.push_element(paragraph);
        }
    }
}
