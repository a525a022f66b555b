//! Structured document tree.
//!
//! Model documents and generation specs are XML. They are parsed into a
//! small owned tree that keeps qualified names and attribute order, so a
//! document can be queried, rewritten by the reference resolution pass and
//! serialized back without losing information the templates rely on.

use std::{
    borrow::Cow,
    io,
    path::{Path, PathBuf},
};

use ddsgen_core::{FileProvider, Resource};
use indexmap::IndexMap;
use quick_xml::{Reader, escape::escape, events::Event};
use serde_json::{Map, Value, json};

use crate::{Error, Result};

/// Attribute carrying an element's schema type (e.g. `types:DataLib`).
pub const XSI_TYPE: &str = "xsi:type";

/// A node in an element's content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
}

/// An XML element with its attributes and content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    name: String,
    attributes: IndexMap<String, String>,
    children: Vec<Node>,
}

fn local_part(qname: &str) -> &str {
    qname.rsplit_once(':').map_or(qname, |(_, local)| local)
}

impl Element {
    /// Create an element with a (possibly prefixed) name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: IndexMap::new(),
            children: Vec::new(),
        }
    }

    /// Builder-style attribute setter.
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Builder-style child appender.
    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(Node::Element(child));
        self
    }

    /// Qualified name as written (`opendds:OpenDDSModel`).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name without its namespace prefix (`OpenDDSModel`).
    pub fn local_name(&self) -> &str {
        local_part(&self.name)
    }

    /// Look up an attribute by qualified name, falling back to local name.
    pub fn attr(&self, key: &str) -> Option<&str> {
        if let Some(value) = self.attributes.get(key) {
            return Some(value);
        }
        self.attributes
            .iter()
            .find(|(k, _)| local_part(k) == key && !k.starts_with("xmlns"))
            .map(|(_, v)| v.as_str())
    }

    pub fn set_attr(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.attributes.insert(key.into(), value.into());
    }

    pub fn attributes(&self) -> &IndexMap<String, String> {
        &self.attributes
    }

    /// Local part of the `xsi:type` attribute (`DataLib` for `types:DataLib`).
    pub fn xsi_type(&self) -> Option<&str> {
        self.attributes.get(XSI_TYPE).map(|t| local_part(t))
    }

    /// All content nodes in document order.
    pub fn nodes(&self) -> &[Node] {
        &self.children
    }

    /// Direct child elements.
    pub fn children(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|n| match n {
            Node::Element(e) => Some(e),
            Node::Text(_) => None,
        })
    }

    /// Direct child elements with the given local name.
    pub fn children_named<'a, 'b>(&'a self, local: &'b str) -> impl Iterator<Item = &'a Element> {
        self.children().filter(move |e| e.local_name() == local)
    }

    /// First direct child element with the given local name.
    pub fn child(&self, local: &str) -> Option<&Element> {
        self.children_named(local).next()
    }

    /// First direct child with the given local name, created if missing.
    pub fn child_or_insert(&mut self, name: &str) -> &mut Element {
        let local = local_part(name).to_string();
        let index = self
            .children
            .iter()
            .position(|n| matches!(n, Node::Element(e) if e.local_name() == local));
        let index = match index {
            Some(i) => i,
            None => {
                self.children.push(Node::Element(Element::new(name)));
                self.children.len() - 1
            }
        };
        match &mut self.children[index] {
            Node::Element(e) => e,
            Node::Text(_) => unreachable!("index points at an element"),
        }
    }

    pub fn push(&mut self, child: Element) {
        self.children.push(Node::Element(child));
    }

    /// Replace the content of this element.
    pub fn set_nodes(&mut self, nodes: Vec<Node>) {
        self.children = nodes;
    }

    /// Append a content node.
    pub fn push_node(&mut self, node: Node) {
        self.children.push(node);
    }

    /// Consume the element, returning its content.
    pub fn into_nodes(self) -> Vec<Node> {
        self.children
    }

    /// Copy of this element with its name and attributes but no content.
    pub fn shallow_clone(&self) -> Element {
        Element {
            name: self.name.clone(),
            attributes: self.attributes.clone(),
            children: Vec::new(),
        }
    }

    /// Concatenated direct text content.
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|n| match n {
                Node::Text(t) => Some(t.as_str()),
                Node::Element(_) => None,
            })
            .collect()
    }

    /// This element followed by every descendant, depth first.
    pub fn iter(&self) -> Descendants<'_> {
        Descendants { stack: vec![self] }
    }

    /// Every element in the subtree (including this one) with a local name.
    pub fn find_all<'a>(&'a self, local: &'a str) -> impl Iterator<Item = &'a Element> {
        self.iter().filter(move |e| e.local_name() == local)
    }

    /// JSON view of the subtree, as handed to templates.
    ///
    /// Attributes are keyed by local name; namespace declarations and
    /// `xsi:type` are left out (the latter is exposed as `kind`).
    pub fn to_json(&self) -> Value {
        let mut attrs = Map::new();
        for (key, value) in &self.attributes {
            if key.starts_with("xmlns") || key == XSI_TYPE {
                continue;
            }
            attrs.insert(local_part(key).to_string(), Value::String(value.clone()));
        }
        let children: Vec<Value> = self.children().map(Element::to_json).collect();
        json!({
            "tag": self.local_name(),
            "name": self.name,
            "kind": self.xsi_type(),
            "attrs": attrs,
            "children": children,
            "text": self.text(),
        })
    }

    fn write_xml(&self, out: &mut String, depth: usize) {
        let indent = "  ".repeat(depth);
        out.push_str(&indent);
        out.push('<');
        out.push_str(&self.name);
        for (key, value) in &self.attributes {
            out.push(' ');
            out.push_str(key);
            out.push_str("=\"");
            out.push_str(&escape(value.as_str()));
            out.push('"');
        }
        if self.children.is_empty() {
            out.push_str("/>\n");
            return;
        }
        // Text-only content stays on one line.
        if self.children().next().is_none() {
            out.push('>');
            out.push_str(&escape(self.text().as_str()));
        } else {
            out.push_str(">\n");
            for node in &self.children {
                match node {
                    Node::Element(e) => e.write_xml(out, depth + 1),
                    Node::Text(t) => {
                        out.push_str(&"  ".repeat(depth + 1));
                        out.push_str(&escape(t.as_str()));
                        out.push('\n');
                    }
                }
            }
            out.push_str(&indent);
        }
        out.push_str("</");
        out.push_str(&self.name);
        out.push_str(">\n");
    }
}

/// Depth-first iterator over an element subtree.
pub struct Descendants<'a> {
    stack: Vec<&'a Element>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a Element;

    fn next(&mut self) -> Option<Self::Item> {
        let next = self.stack.pop()?;
        let children: Vec<&Element> = next.children().collect();
        self.stack.extend(children.into_iter().rev());
        Some(next)
    }
}

/// A parsed document and the path it was read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    root: Element,
    source: Option<PathBuf>,
}

impl Document {
    pub fn new(root: Element) -> Self {
        Self { root, source: None }
    }

    /// Attach the path this document belongs to.
    pub fn with_source(mut self, source: impl Into<PathBuf>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn root(&self) -> &Element {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut Element {
        &mut self.root
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Directory of the source path, if known.
    pub fn source_dir(&self) -> Option<&Path> {
        self.source.as_deref().and_then(Path::parent)
    }

    /// Parse XML text. `path` is used for error reporting and as source.
    pub fn parse(src: &str, path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut reader = Reader::from_str(src);
        reader.config_mut().trim_text(true);

        let mut stack: Vec<Element> = Vec::new();
        let mut root: Option<Element> = None;

        loop {
            let offset = reader.buffer_position() as usize;
            let event = reader.read_event().map_err(|e| {
                Error::parse(e.to_string(), src, path, Some(reader.error_position() as usize))
            })?;
            match event {
                Event::Start(start) => {
                    stack.push(element_from_start(&start, src, path, offset)?);
                }
                Event::Empty(start) => {
                    let element = element_from_start(&start, src, path, offset)?;
                    attach(element, &mut stack, &mut root, src, path, offset)?;
                }
                Event::End(_) => {
                    let element = stack.pop().ok_or_else(|| {
                        Error::parse("unexpected closing tag", src, path, Some(offset))
                    })?;
                    attach(element, &mut stack, &mut root, src, path, offset)?;
                }
                Event::Text(text) => {
                    let text = text
                        .unescape()
                        .map_err(|e| Error::parse(e.to_string(), src, path, Some(offset)))?;
                    push_text(&mut stack, text, src, path, offset)?;
                }
                Event::CData(data) => {
                    let text = String::from_utf8_lossy(&data.into_inner()).into_owned();
                    push_text(&mut stack, Cow::Owned(text), src, path, offset)?;
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if let Some(open) = stack.last() {
            return Err(Error::parse(
                format!("unclosed element <{}>", open.name()),
                src,
                path,
                Some(src.len()),
            ));
        }
        let root = root
            .ok_or_else(|| Error::parse("document has no root element", src, path, None))?;
        Ok(Document::new(root).with_source(path))
    }

    /// Load and parse a document through a file provider.
    pub fn load(provider: &dyn FileProvider, path: &Path) -> Result<Self> {
        Self::load_resource(&provider.from_workspace(path))
    }

    /// Load and parse an already located resource.
    pub fn load_resource(resource: &Resource) -> Result<Self> {
        if !resource.exists() {
            return Err(Error::not_found(resource.path()));
        }
        let content = resource.read_to_string().map_err(|e| match e.kind() {
            io::ErrorKind::InvalidData => {
                Error::parse("document is not valid UTF-8", "", resource.path(), None)
            }
            _ => Error::io(resource.path(), e),
        })?;
        Self::parse(&content, resource.path())
    }

    /// Serialize back to XML text.
    pub fn to_xml(&self) -> String {
        let mut out = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        self.root.write_xml(&mut out, 0);
        out
    }

    pub fn to_json(&self) -> Value {
        self.root.to_json()
    }
}

fn element_from_start(
    start: &quick_xml::events::BytesStart<'_>,
    src: &str,
    path: &Path,
    offset: usize,
) -> Result<Element> {
    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let mut element = Element::new(name);
    for attr in start.attributes() {
        let attr = attr.map_err(|e| Error::parse(e.to_string(), src, path, Some(offset)))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|e| Error::parse(e.to_string(), src, path, Some(offset)))?;
        element.set_attr(key, value.into_owned());
    }
    Ok(element)
}

fn attach(
    element: Element,
    stack: &mut [Element],
    root: &mut Option<Element>,
    src: &str,
    path: &Path,
    offset: usize,
) -> Result<()> {
    match stack.last_mut() {
        Some(parent) => parent.push(element),
        None if root.is_none() => *root = Some(element),
        None => {
            return Err(Error::parse(
                "multiple root elements",
                src,
                path,
                Some(offset),
            ));
        }
    }
    Ok(())
}

fn push_text(
    stack: &mut [Element],
    text: Cow<'_, str>,
    src: &str,
    path: &Path,
    offset: usize,
) -> Result<()> {
    match stack.last_mut() {
        Some(parent) => {
            parent.children.push(Node::Text(text.into_owned()));
            Ok(())
        }
        None => Err(Error::parse(
            "text outside of the root element",
            src,
            path,
            Some(offset),
        )),
    }
}
