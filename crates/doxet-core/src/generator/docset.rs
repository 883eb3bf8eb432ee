//! Indexed documentation-bundle generator
//!
//! Packages the rendered pages into a docset-style bundle: a property list
//! describing the bundle, a nodes file mirroring the hierarchy forest, and
//! a JSON token index with one token per entity and per member. Declares a
//! hard dependency on the `html` generator because it indexes the rendered
//! pages.

use std::fmt::Write as _;

use serde::Serialize;

use crate::config::ConverterConfig;
use crate::database::{Database, HierarchyNode};
use crate::error::ConvertError;
use crate::generator::{write_output, OutputGenerator};
use crate::markup::{Document, Element};

/// One entry of the token index
#[derive(Debug, Serialize)]
struct Token {
    /// Token name: entity name or fully formatted selector
    name: String,
    /// `class`, `category`, `protocol`, or `member`
    kind: String,
    /// Root-relative page path
    path: String,
    /// Page anchor, present for member tokens
    #[serde(skip_serializing_if = "Option::is_none")]
    anchor: Option<String>,
}

/// Produces the indexed documentation bundle
pub struct DocsetGenerator;

impl OutputGenerator for DocsetGenerator {
    fn name(&self) -> &str {
        "docset"
    }

    fn requires(&self) -> Option<&str> {
        Some("html")
    }

    fn generate(&self, database: &Database, config: &ConverterConfig) -> Result<(), ConvertError> {
        // The bundle indexes rendered pages; their absence means the html
        // stage did not actually produce output.
        let index_page = config.output_dir.join("index.html");
        std::fs::metadata(&index_page).map_err(|e| ConvertError::io(&index_page, e))?;

        let bundle = config.output_dir.join("docset");
        write_output(&bundle.join("Info.plist"), &Self::info_plist())?;
        write_output(&bundle.join("Nodes.xml"), &Self::nodes(database).to_xml())?;
        let tokens = serde_json::to_string_pretty(&Self::tokens(database)).map_err(|e| {
            ConvertError::GeneratorFailure {
                generator: "docset".to_string(),
                detail: e.to_string(),
            }
        })?;
        write_output(&bundle.join("Tokens.json"), &tokens)?;
        Ok(())
    }
}

impl DocsetGenerator {
    fn info_plist() -> String {
        let mut out = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        writeln!(out, "<plist version=\"1.0\">").unwrap();
        writeln!(out, "<dict>").unwrap();
        writeln!(out, "  <key>CFBundleIdentifier</key>").unwrap();
        writeln!(out, "  <string>org.doxet.docset</string>").unwrap();
        writeln!(out, "  <key>CFBundleName</key>").unwrap();
        writeln!(out, "  <string>API Documentation</string>").unwrap();
        writeln!(out, "  <key>DocSetPlatformFamily</key>").unwrap();
        writeln!(out, "  <string>doxet</string>").unwrap();
        writeln!(out, "</dict>").unwrap();
        writeln!(out, "</plist>").unwrap();
        out
    }

    /// The bundle's navigation tree, from the hierarchy forest
    fn nodes(database: &Database) -> Document {
        let mut root = Element::new("nodes");
        for node in &database.hierarchy {
            root.add_element(Self::node_element(node, database));
        }
        Document::new(root)
    }

    fn node_element(node: &HierarchyNode, database: &Database) -> Element {
        let mut element = Element::new("node").with_attr("name", &node.name);
        if let Some(entity) = node.entity.as_deref().and_then(|n| database.entity(n)) {
            element.set_attr("path", &entity.relative_path);
        }
        for child in &node.children {
            element.add_element(Self::node_element(child, database));
        }
        element
    }

    /// One token per entity plus one per member, in discovery order
    fn tokens(database: &Database) -> Vec<Token> {
        let mut tokens = Vec::new();
        for entity in database.entities() {
            tokens.push(Token {
                name: entity.name.clone(),
                kind: entity.kind.as_str().to_string(),
                path: entity.relative_path.clone(),
                anchor: None,
            });
            for member in entity.members() {
                tokens.push(Token {
                    name: member.selector.clone(),
                    kind: "member".to_string(),
                    path: entity.relative_path.clone(),
                    anchor: Some(member.selector.clone()),
                });
            }
        }
        tokens
    }
}
