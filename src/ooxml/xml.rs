//! Minimal XML tree for OOXML document parts.
//!
//! Parses a part into an element/text tree and serializes it back. Namespace
//! prefixes are carried verbatim as part of the element name (`w:p`, `a:t`),
//! and elements the engine does not understand round-trip untouched, which is
//! what keeps rewritten documents structurally valid.

use std::io::Write;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::error::{FillError, Result};

#[derive(Debug, Clone)]
pub(crate) enum Node {
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone)]
pub(crate) struct Element {
    pub(crate) name: String,
    pub(crate) attrs: Vec<(String, String)>,
    pub(crate) children: Vec<Node>,
}

impl Element {
    pub(crate) fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    pub(crate) fn with_attr(mut self, name: &str, value: &str) -> Self {
        self.set_attr(name, value);
        self
    }

    pub(crate) fn with_child(mut self, child: Element) -> Self {
        self.children.push(Node::Element(child));
        self
    }

    pub(crate) fn with_text(mut self, text: &str) -> Self {
        self.children.push(Node::Text(text.to_string()));
        self
    }

    pub(crate) fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub(crate) fn set_attr(&mut self, name: &str, value: &str) {
        if let Some(entry) = self.attrs.iter_mut().find(|(k, _)| k == name) {
            entry.1 = value.to_string();
        } else {
            self.attrs.push((name.to_string(), value.to_string()));
        }
    }

    pub(crate) fn child(&self, name: &str) -> Option<&Element> {
        self.children_named(name).next()
    }

    pub(crate) fn child_mut(&mut self, name: &str) -> Option<&mut Element> {
        self.children_named_mut(name).next()
    }

    pub(crate) fn children_named<'a, 'n>(
        &'a self,
        name: &'n str,
    ) -> impl Iterator<Item = &'a Element> + use<'a, 'n> {
        self.children.iter().filter_map(move |node| match node {
            Node::Element(el) if el.name == name => Some(el),
            _ => None,
        })
    }

    pub(crate) fn children_named_mut<'a, 'n>(
        &'a mut self,
        name: &'n str,
    ) -> impl Iterator<Item = &'a mut Element> + use<'a, 'n> {
        self.children.iter_mut().filter_map(move |node| match node {
            Node::Element(el) if el.name == name => Some(el),
            _ => None,
        })
    }

    pub(crate) fn push_element(&mut self, child: Element) {
        self.children.push(Node::Element(child));
    }

    /// Drops every child except elements whose name is in `keep`. Text nodes
    /// between children are dropped too.
    pub(crate) fn retain_named(&mut self, keep: &[&str]) {
        self.children.retain(|node| match node {
            Node::Element(el) => keep.contains(&el.name.as_str()),
            Node::Text(_) => false,
        });
    }

    /// Concatenated direct text content of this element.
    pub(crate) fn text_content(&self) -> String {
        let mut out = String::new();
        for node in &self.children {
            if let Node::Text(t) = node {
                out.push_str(t);
            }
        }
        out
    }

    /// Walks the whole subtree counting elements with the given name.
    pub(crate) fn count_descendants(&self, name: &str) -> usize {
        let mut count = 0;
        for node in &self.children {
            if let Node::Element(el) = node {
                if el.name == name {
                    count += 1;
                }
                count += el.count_descendants(name);
            }
        }
        count
    }
}

/// Parses part bytes into the root element. The XML declaration, comments
/// and processing instructions are dropped; the declaration is re-emitted by
/// [`serialize`].
pub(crate) fn parse(data: &[u8]) -> Result<Element> {
    let mut reader = Reader::from_reader(data);
    let mut buf = Vec::new();
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        let event = reader
            .read_event_into(&mut buf)
            .map_err(|e| FillError::Xml(e.to_string()))?;
        match event {
            Event::Start(start) => {
                stack.push(element_from_start(&start)?);
            }
            Event::Empty(start) => {
                let el = element_from_start(&start)?;
                attach(&mut stack, &mut root, Node::Element(el));
            }
            Event::End(_) => {
                let el = stack
                    .pop()
                    .ok_or_else(|| FillError::Xml("unbalanced closing tag".to_string()))?;
                attach(&mut stack, &mut root, Node::Element(el));
            }
            Event::Text(text) => {
                let decoded = text
                    .decode()
                    .map_err(|e| FillError::Xml(e.to_string()))?;
                let value = quick_xml::escape::unescape(&decoded)
                    .map_err(|e| FillError::Xml(e.to_string()))?
                    .into_owned();
                push_text(&mut stack, value);
            }
            // quick-xml reports entity/character references (`&lt;`, `&#60;`)
            // as their own events; resolve them back into the surrounding text.
            Event::GeneralRef(reference) => {
                let decoded = reference
                    .decode()
                    .map_err(|e| FillError::Xml(e.to_string()))?;
                let value = quick_xml::escape::unescape(&format!("&{};", decoded))
                    .map_err(|e| FillError::Xml(e.to_string()))?
                    .into_owned();
                push_text(&mut stack, value);
            }
            Event::CData(data) => {
                let value = String::from_utf8_lossy(&data.into_inner()).into_owned();
                push_text(&mut stack, value);
            }
            Event::Eof => break,
            // declaration, comments, PIs, doctype
            _ => {}
        }
        buf.clear();
    }

    if !stack.is_empty() {
        return Err(FillError::Xml("unclosed element at end of part".to_string()));
    }
    root.ok_or_else(|| FillError::Xml("part has no root element".to_string()))
}

/// Appends text to the current element, merging with a preceding text node so
/// a run split across Text/GeneralRef/CData events stays one logical string.
fn push_text(stack: &mut [Element], value: String) {
    if let Some(parent) = stack.last_mut() {
        match parent.children.last_mut() {
            Some(Node::Text(existing)) => existing.push_str(&value),
            _ => parent.children.push(Node::Text(value)),
        }
    }
}

fn attach(stack: &mut Vec<Element>, root: &mut Option<Element>, node: Node) {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(node);
    } else if let Node::Element(el) = node {
        if root.is_none() {
            *root = Some(el);
        }
    }
}

fn element_from_start(start: &BytesStart<'_>) -> Result<Element> {
    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let mut element = Element::new(&name);
    for attr in start.attributes() {
        let attr = attr.map_err(|e| FillError::Xml(e.to_string()))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|e| FillError::Xml(e.to_string()))?
            .into_owned();
        element.attrs.push((key, value));
    }
    Ok(element)
}

/// Serializes a root element back to part bytes, with the standard OOXML
/// declaration up front.
pub(crate) fn serialize(root: &Element) -> Result<Vec<u8>> {
    let mut writer = Writer::new(Vec::new());
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))
        .map_err(|e| FillError::Xml(e.to_string()))?;
    write_element(&mut writer, root)?;
    Ok(writer.into_inner())
}

fn write_element<W: Write>(writer: &mut Writer<W>, element: &Element) -> Result<()> {
    let mut start = BytesStart::new(element.name.as_str());
    for (key, value) in &element.attrs {
        start.push_attribute((key.as_str(), value.as_str()));
    }

    if element.children.is_empty() {
        writer
            .write_event(Event::Empty(start))
            .map_err(|e| FillError::Xml(e.to_string()))?;
        return Ok(());
    }

    writer
        .write_event(Event::Start(start))
        .map_err(|e| FillError::Xml(e.to_string()))?;
    for child in &element.children {
        match child {
            Node::Element(el) => write_element(writer, el)?,
            Node::Text(text) => writer
                .write_event(Event::Text(BytesText::new(text)))
                .map_err(|e| FillError::Xml(e.to_string()))?,
        }
    }
    writer
        .write_event(Event::End(BytesEnd::new(element.name.as_str())))
        .map_err(|e| FillError::Xml(e.to_string()))?;
    Ok(())
}
