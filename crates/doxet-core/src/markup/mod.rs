//! Owned markup document tree
//!
//! Both the cleaned per-entity documents and the cleaned index/hierarchy
//! documents use this representation. Unlike the borrowed DOM of the raw
//! parser it is `Send + Sync`, cheap to clone, and serializes
//! deterministically: the same tree always renders to byte-identical text
//! (attributes keep insertion order, children keep document order).

use std::fmt::Write as _;

use crate::error::ConvertError;

/// A child of an element: nested element or character data
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// A nested element
    Element(Element),
    /// A run of character data
    Text(String),
}

/// An element with a name, ordered attributes, and ordered children
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<Node>,
}

impl Element {
    /// Create an empty element
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Element name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Add an attribute, builder style
    #[must_use]
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    /// Add a child element, builder style
    #[must_use]
    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(Node::Element(child));
        self
    }

    /// Add a text child, builder style
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.children.push(Node::Text(text.into()));
        self
    }

    /// Set an attribute, replacing an existing value in place
    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        if let Some(slot) = self.attributes.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = value;
        } else {
            self.attributes.push((name, value));
        }
    }

    /// Remove an attribute, returning its value if present
    pub fn remove_attr(&mut self, name: &str) -> Option<String> {
        let index = self.attributes.iter().position(|(n, _)| n == name)?;
        Some(self.attributes.remove(index).1)
    }

    /// Look up an attribute value
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// All attributes in insertion order
    pub fn attributes(&self) -> &[(String, String)] {
        &self.attributes
    }

    /// Append a child node
    pub fn add_child(&mut self, child: Node) {
        self.children.push(child);
    }

    /// Append a child element
    pub fn add_element(&mut self, child: Element) {
        self.children.push(Node::Element(child));
    }

    /// Append a text child
    pub fn add_text(&mut self, text: impl Into<String>) {
        self.children.push(Node::Text(text.into()));
    }

    /// All children in document order
    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// Child elements in document order
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(element) => Some(element),
            Node::Text(_) => None,
        })
    }

    /// First child element with the given name
    pub fn find(&self, name: &str) -> Option<&Element> {
        self.elements().find(|element| element.name == name)
    }

    /// Concatenated character data of this element and its descendants
    pub fn text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        for child in &self.children {
            match child {
                Node::Text(text) => out.push_str(text),
                Node::Element(element) => element.collect_text(out),
            }
        }
    }

    /// Visit this element and every descendant element, pre-order, mutably
    pub fn walk_mut(&mut self, visit: &mut impl FnMut(&mut Element)) {
        visit(self);
        for child in &mut self.children {
            if let Node::Element(element) = child {
                element.walk_mut(visit);
            }
        }
    }

    /// Visit this element and every descendant element, pre-order
    pub fn walk(&self, visit: &mut impl FnMut(&Element)) {
        visit(self);
        for element in self.elements() {
            element.walk(visit);
        }
    }

    fn write_xml(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.name);
        for (name, value) in &self.attributes {
            let _ = write!(out, " {}=\"{}\"", name, escape_attr(value));
        }
        if self.children.is_empty() {
            out.push_str("/>");
            return;
        }
        out.push('>');
        for child in &self.children {
            match child {
                Node::Text(text) => out.push_str(&escape_text(text)),
                Node::Element(element) => element.write_xml(out),
            }
        }
        let _ = write!(out, "</{}>", self.name);
    }

    /// Serialize this element alone, without a document declaration
    pub fn to_xml(&self) -> String {
        let mut out = String::new();
        self.write_xml(&mut out);
        out
    }
}

/// A complete markup document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    root: Element,
}

impl Document {
    /// Create a document from its root element
    pub fn new(root: Element) -> Self {
        Self { root }
    }

    /// The root element
    pub fn root(&self) -> &Element {
        &self.root
    }

    /// The root element, mutable
    pub fn root_mut(&mut self) -> &mut Element {
        &mut self.root
    }

    /// Serialize to XML text with a declaration
    ///
    /// The output is a pure function of the tree: serializing the same tree
    /// twice yields byte-identical text.
    pub fn to_xml(&self) -> String {
        let mut out = String::from("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n");
        self.root.write_xml(&mut out);
        out.push('\n');
        out
    }

    /// Parse raw XML text into an owned document
    ///
    /// The raw input is never mutated; the borrowed DOM is copied into the
    /// owned tree and dropped. `file` is only used for error reporting.
    pub fn parse(text: &str, file: &str) -> Result<Self, ConvertError> {
        let package =
            sxd_document::parser::parse(text).map_err(|e| ConvertError::MalformedInput {
                file: file.to_string(),
                detail: e.to_string(),
            })?;
        let document = package.as_document();
        let root = document
            .root()
            .children()
            .into_iter()
            .find_map(sxd_document::dom::ChildOfRoot::element)
            .ok_or_else(|| ConvertError::MalformedInput {
                file: file.to_string(),
                detail: "document has no root element".to_string(),
            })?;
        Ok(Self {
            root: convert_element(root),
        })
    }
}

fn convert_element(source: sxd_document::dom::Element<'_>) -> Element {
    let mut element = Element::new(source.name().local_part());
    let mut names: Vec<&str> = source
        .attributes()
        .iter()
        .map(|a| a.name().local_part())
        .collect();
    // The borrowed DOM does not guarantee attribute order; sort for a
    // deterministic owned tree.
    names.sort_unstable();
    for name in names {
        if let Some(value) = source.attribute_value(name) {
            element.set_attr(name, value);
        }
    }
    for child in source.children() {
        match child {
            sxd_document::dom::ChildOfElement::Element(e) => {
                element.add_element(convert_element(e));
            }
            sxd_document::dom::ChildOfElement::Text(t) => {
                element.add_text(t.text());
            }
            _ => {}
        }
    }
    element
}

/// Escape character data
pub fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Escape an attribute value
pub fn escape_attr(value: &str) -> String {
    escape_text(value).replace('"', "&quot;")
}
