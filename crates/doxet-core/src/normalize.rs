//! Markup normalizer
//!
//! Strips extractor-specific wrappers from the raw XML and produces cleaned
//! documents with a stable vocabulary:
//!
//! - per-entity: `<object name kind [parent] [owner] file>` holding an
//!   optional `<description>` and a `<members>` list of
//!   `<member name prefix>` children
//! - top-level index: `<index>` with `<entry kind>` children wrapping a
//!   cross-reference marker per documented entity
//! - hierarchy: `<hierarchy>` with nested `<node name>` elements
//!
//! Cross-reference markers are normalized to `<ref target="Entity[.member]">
//! display</ref>`; the resolver later rewrites them into concrete links.
//! Normalization is deterministic (same raw bytes, same cleaned bytes) and
//! never mutates the raw input.

use sxd_document::dom::{ChildOfElement, ChildOfRoot, Element as RawElement};
use sxd_document::Package;
use sxd_xpath::nodeset::Node as XPathNode;
use sxd_xpath::{evaluate_xpath, Value};

use crate::database::EntityKind;
use crate::error::ConvertError;
use crate::markup::{Document, Element};

/// Produces cleaned documents from raw extractor output
pub struct Normalizer;

impl Normalizer {
    /// Clean one raw per-entity document
    ///
    /// `file_name` is recorded in the cleaned document as the entity's
    /// original raw-markup file and used in error reports.
    pub fn clean_object(raw: &str, file_name: &str) -> Result<Document, ConvertError> {
        let package = parse_raw(raw, file_name)?;
        let document = package.as_document();
        let compound = evaluate_xpath(&document, "//compounddef")
            .ok()
            .and_then(first_element)
            .ok_or_else(|| malformed(file_name, "missing compounddef element"))?;

        let kind_attr = compound
            .attribute_value("kind")
            .ok_or_else(|| malformed(file_name, "compounddef has no kind"))?;
        let kind = EntityKind::from_compound_kind(kind_attr)
            .ok_or_else(|| malformed(file_name, format!("unsupported compound kind '{kind_attr}'")))?;

        let raw_name = child_text(compound, "compoundname")
            .ok_or_else(|| malformed(file_name, "compounddef has no compoundname"))?;
        let (name, owner) = match kind {
            EntityKind::Category => split_category_name(&raw_name),
            _ => (raw_name.trim().to_string(), None),
        };
        if name.is_empty() {
            return Err(malformed(file_name, "empty compoundname"));
        }

        let mut object = Element::new("object")
            .with_attr("name", &name)
            .with_attr("kind", kind.as_str());
        if kind == EntityKind::Class {
            if let Some(parent) = child_text(compound, "basecompoundref") {
                object.set_attr("parent", parent.trim());
            }
        }
        if let Some(owner) = owner {
            object.set_attr("owner", owner);
        }
        object.set_attr("file", file_name);

        if let Some(description) = clean_description(compound) {
            object.add_element(description);
        }

        let mut members = Element::new("members");
        for section in child_elements(compound, "sectiondef") {
            for memberdef in child_elements(section, "memberdef") {
                if memberdef.attribute_value("kind") != Some("function") {
                    continue;
                }
                let member_name = child_text(memberdef, "name").ok_or_else(|| {
                    malformed(file_name, "memberdef has no name")
                })?;
                let prefix = if memberdef.attribute_value("static") == Some("yes") {
                    "+"
                } else {
                    "-"
                };
                let mut member = Element::new("member")
                    .with_attr("name", member_name.trim())
                    .with_attr("prefix", prefix);
                if let Some(description) = clean_description(memberdef) {
                    member.add_element(description);
                }
                members.add_element(member);
            }
        }
        object.add_element(members);

        Ok(Document::new(object))
    }

    /// Clean the raw top-level index document
    ///
    /// Entities of unsupported kinds are dropped; entry order follows the
    /// raw document.
    pub fn clean_index(raw: &str, file_name: &str) -> Result<Document, ConvertError> {
        let package = parse_raw(raw, file_name)?;
        let document = package.as_document();
        let mut index = Element::new("index");
        let compounds = match evaluate_xpath(&document, "//compound") {
            Ok(Value::Nodeset(nodes)) => nodes.document_order(),
            _ => Vec::new(),
        };
        for node in compounds {
            let XPathNode::Element(compound) = node else {
                continue;
            };
            let Some(kind) = compound
                .attribute_value("kind")
                .and_then(EntityKind::from_compound_kind)
            else {
                continue;
            };
            let Some(raw_name) = child_text(compound, "name") else {
                continue;
            };
            let name = match kind {
                EntityKind::Category => split_category_name(&raw_name).0,
                _ => raw_name.trim().to_string(),
            };
            index.add_element(
                Element::new("entry").with_attr("kind", kind.as_str()).with_child(
                    Element::new("ref").with_attr("target", &name).with_text(&name),
                ),
            );
        }
        Ok(Document::new(index))
    }

    /// Clean the raw hierarchy document
    pub fn clean_hierarchy(raw: &str, file_name: &str) -> Result<Document, ConvertError> {
        let package = parse_raw(raw, file_name)?;
        let document = package.as_document();
        let root = document
            .root()
            .children()
            .into_iter()
            .find_map(ChildOfRoot::element)
            .ok_or_else(|| malformed(file_name, "document has no root element"))?;

        let mut hierarchy = Element::new("hierarchy");
        for child in child_elements(root, "node") {
            hierarchy.add_element(clean_hierarchy_node(child, file_name)?);
        }
        Ok(Document::new(hierarchy))
    }
}

fn clean_hierarchy_node(raw: RawElement<'_>, file_name: &str) -> Result<Element, ConvertError> {
    let name = raw
        .attribute_value("name")
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .ok_or_else(|| malformed(file_name, "hierarchy node has no name"))?;
    let mut node = Element::new("node").with_attr("name", name);
    for child in child_elements(raw, "node") {
        node.add_element(clean_hierarchy_node(child, file_name)?);
    }
    Ok(node)
}

/// Combine brief and detailed descriptions into one cleaned `<description>`
///
/// Inline `<ref>` markers survive as cleaned markers; every other wrapper
/// element is flattened to its character data.
fn clean_description(compound: RawElement<'_>) -> Option<Element> {
    let mut description = Element::new("description");
    for source in ["briefdescription", "detaileddescription"] {
        if let Some(block) = child_elements(compound, source).into_iter().next() {
            copy_inline(block, &mut description);
        }
    }
    let empty = description
        .children()
        .iter()
        .all(|node| matches!(node, crate::markup::Node::Text(t) if t.trim().is_empty()));
    if empty {
        None
    } else {
        Some(description)
    }
}

/// Copy inline content, preserving `<ref>` markers and flattening the rest
fn copy_inline(raw: RawElement<'_>, out: &mut Element) {
    for child in raw.children() {
        match child {
            ChildOfElement::Text(text) => {
                if !text.text().is_empty() {
                    out.add_text(text.text());
                }
            }
            ChildOfElement::Element(element) => {
                if element.name().local_part() == "ref" {
                    let display = text_of(element);
                    let target = element
                        .attribute_value("refid")
                        .map(str::to_string)
                        .unwrap_or_else(|| display.clone());
                    let mut marker = Element::new("ref").with_attr("target", target.trim());
                    if !display.is_empty() {
                        marker.add_text(display);
                    }
                    out.add_element(marker);
                } else {
                    copy_inline(element, out);
                }
            }
            _ => {}
        }
    }
}

/// Split an extractor category name of the `Owner(Name)` form
///
/// Falls back to the whole name with an absent owner when the convention
/// does not hold.
fn split_category_name(raw: &str) -> (String, Option<String>) {
    let raw = raw.trim();
    if let (Some(open), Some(close)) = (raw.find('('), raw.rfind(')')) {
        if open < close {
            let owner = raw[..open].trim();
            let name = raw[open + 1..close].trim();
            if !name.is_empty() {
                let owner = (!owner.is_empty()).then(|| owner.to_string());
                return (name.to_string(), owner);
            }
        }
    }
    (raw.to_string(), None)
}

fn parse_raw(raw: &str, file_name: &str) -> Result<Package, ConvertError> {
    sxd_document::parser::parse(raw).map_err(|e| malformed(file_name, e.to_string()))
}

fn malformed(file_name: &str, detail: impl Into<String>) -> ConvertError {
    ConvertError::MalformedInput {
        file: file_name.to_string(),
        detail: detail.into(),
    }
}

fn first_element(value: Value<'_>) -> Option<RawElement<'_>> {
    match value {
        Value::Nodeset(nodes) => nodes
            .document_order()
            .into_iter()
            .find_map(|node| match node {
                XPathNode::Element(element) => Some(element),
                _ => None,
            }),
        _ => None,
    }
}

fn child_elements<'d>(parent: RawElement<'d>, name: &str) -> Vec<RawElement<'d>> {
    parent
        .children()
        .into_iter()
        .filter_map(ChildOfElement::element)
        .filter(|e| e.name().local_part() == name)
        .collect()
}

fn child_text(parent: RawElement<'_>, name: &str) -> Option<String> {
    child_elements(parent, name)
        .into_iter()
        .next()
        .map(text_of)
        .filter(|t| !t.trim().is_empty())
}

fn text_of(element: RawElement<'_>) -> String {
    let mut out = String::new();
    collect_text(element, &mut out);
    out
}

fn collect_text(element: RawElement<'_>, out: &mut String) {
    for child in element.children() {
        match child {
            ChildOfElement::Text(text) => out.push_str(text.text()),
            ChildOfElement::Element(nested) => collect_text(nested, out),
            _ => {}
        }
    }
}
