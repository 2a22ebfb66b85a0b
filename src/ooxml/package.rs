//! ZIP-backed OOXML package access.
//!
//! A `.docx`/`.pptx`/`.xlsx` file is a ZIP archive of parts. The package
//! reads every entry into memory up front, lets individual parts be replaced
//! or added, and writes the archive back out in the original entry order.
//! Parts the engine never touches are carried through byte-for-byte.

use std::fs::File;
use std::io::{Read, Seek, Write};
use std::path::Path;

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::{FillError, Result};
use crate::ooxml::xml::{self, Element};

const RELS_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const OFFICE_DOCUMENT_REL: &str = "officeDocument";

struct Part {
    name: String,
    data: Vec<u8>,
}

pub(crate) struct Package {
    parts: Vec<Part>,
}

impl Package {
    pub(crate) fn open(path: &Path) -> Result<Self> {
        Self::from_reader(File::open(path)?)
    }

    pub(crate) fn from_reader<R: Read + Seek>(reader: R) -> Result<Self> {
        let mut archive =
            ZipArchive::new(reader).map_err(|e| FillError::Package(e.to_string()))?;
        let mut parts = Vec::with_capacity(archive.len());
        for index in 0..archive.len() {
            let mut entry = archive
                .by_index(index)
                .map_err(|e| FillError::Package(e.to_string()))?;
            if entry.is_dir() {
                continue;
            }
            let name = entry.name().to_string();
            let mut data = Vec::with_capacity(entry.size() as usize);
            entry.read_to_end(&mut data)?;
            parts.push(Part { name, data });
        }
        Ok(Self { parts })
    }

    pub(crate) fn part_names(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().map(|p| p.name.as_str())
    }

    pub(crate) fn part(&self, name: &str) -> Option<&[u8]> {
        self.parts
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.data.as_slice())
    }

    /// Replaces an existing part or appends a new one.
    pub(crate) fn set_part(&mut self, name: &str, data: Vec<u8>) {
        if let Some(part) = self.parts.iter_mut().find(|p| p.name == name) {
            part.data = data;
        } else {
            self.parts.push(Part {
                name: name.to_string(),
                data,
            });
        }
    }

    pub(crate) fn save(&self, path: &Path) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = ZipWriter::new(file);
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        for part in &self.parts {
            writer
                .start_file(part.name.as_str(), options)
                .map_err(|e| FillError::Package(e.to_string()))?;
            writer.write_all(&part.data)?;
        }
        writer
            .finish()
            .map_err(|e| FillError::Package(e.to_string()))?;
        Ok(())
    }

    /// Parses a part as XML, erroring when the part is missing.
    pub(crate) fn xml_part(&self, name: &str) -> Result<Element> {
        let data = self
            .part(name)
            .ok_or_else(|| FillError::Package(format!("missing part {}", name)))?;
        xml::parse(data)
    }

    pub(crate) fn set_xml_part(&mut self, name: &str, root: &Element) -> Result<()> {
        let data = xml::serialize(root)?;
        self.set_part(name, data);
        Ok(())
    }

    /// Resolves the package's main document part from the package-level
    /// relationships (`_rels/.rels`).
    pub(crate) fn main_part(&self) -> Result<String> {
        let rels = self.xml_part("_rels/.rels")?;
        for rel in rels.children_named("Relationship") {
            let rel_type = rel.attr("Type").unwrap_or_default();
            if rel_type.ends_with(OFFICE_DOCUMENT_REL) {
                if let Some(target) = rel.attr("Target") {
                    return Ok(target.trim_start_matches('/').to_string());
                }
            }
        }
        Err(FillError::Package(
            "package has no main document relationship".to_string(),
        ))
    }

    /// Registers a `<Default>` content type for a file extension unless one
    /// is already present.
    pub(crate) fn ensure_default_content_type(
        &mut self,
        extension: &str,
        content_type: &str,
    ) -> Result<()> {
        let mut types = self.xml_part("[Content_Types].xml")?;
        let exists = types.children_named("Default").any(|d| {
            d.attr("Extension")
                .map(|e| e.eq_ignore_ascii_case(extension))
                .unwrap_or(false)
        });
        if !exists {
            types.push_element(
                Element::new("Default")
                    .with_attr("Extension", extension)
                    .with_attr("ContentType", content_type),
            );
            self.set_xml_part("[Content_Types].xml", &types)?;
        }
        Ok(())
    }

    /// Appends a relationship to a part's `.rels` file (creating the file
    /// when absent) and returns the new relationship id.
    pub(crate) fn add_relationship(
        &mut self,
        rels_part: &str,
        rel_type: &str,
        target: &str,
    ) -> Result<String> {
        let mut rels = match self.part(rels_part) {
            Some(data) => xml::parse(data)?,
            None => Element::new("Relationships").with_attr("xmlns", RELS_NS),
        };

        let highest = rels
            .children_named("Relationship")
            .filter_map(|r| r.attr("Id"))
            .filter_map(|id| id.strip_prefix("rId"))
            .filter_map(|n| n.parse::<u32>().ok())
            .max()
            .unwrap_or(0);
        let id = format!("rId{}", highest + 1);

        rels.push_element(
            Element::new("Relationship")
                .with_attr("Id", &id)
                .with_attr("Type", rel_type)
                .with_attr("Target", target),
        );
        self.set_xml_part(rels_part, &rels)?;
        Ok(id)
    }
}

/// The `.rels` part that carries relationships for `part_name`
/// (`word/document.xml` -> `word/_rels/document.xml.rels`).
pub(crate) fn rels_part_for(part_name: &str) -> String {
    match part_name.rsplit_once('/') {
        Some((dir, file)) => format!("{}/_rels/{}.rels", dir, file),
        None => format!("_rels/{}.rels", part_name),
    }
}
