//! XHTML documentation generator
//!
//! Renders one page per entity under the directory-layout buckets, plus an
//! index page and a hierarchy page at the output root. Member anchors use
//! the fully formatted selector, matching the anchors the resolver wrote
//! into cross-entity links.

use std::fmt::Write as _;

use crate::config::ConverterConfig;
use crate::database::{Database, Entity, HierarchyNode};
use crate::error::ConvertError;
use crate::generator::{write_output, OutputGenerator};
use crate::markup::{Element, Node};

/// Renders the database as a tree of XHTML pages
pub struct HtmlGenerator;

impl OutputGenerator for HtmlGenerator {
    fn name(&self) -> &str {
        "html"
    }

    fn generate(&self, database: &Database, config: &ConverterConfig) -> Result<(), ConvertError> {
        for entity in database.entities() {
            let page = Self::entity_page(entity);
            write_output(&config.output_dir.join(&entity.relative_path), &page)?;
        }
        write_output(
            &config.output_dir.join("index.html"),
            &Self::index_page(database),
        )?;
        write_output(
            &config.output_dir.join("hierarchy.html"),
            &Self::hierarchy_page(database),
        )?;
        Ok(())
    }
}

impl HtmlGenerator {
    /// Render one entity page
    ///
    /// Entity pages live one directory below the output root, so resolved
    /// links (which are root-relative) get a `../` prefix here.
    fn entity_page(entity: &Entity) -> String {
        let mut out = String::new();
        Self::write_header(&mut out, &entity.name);

        writeln!(out, "<header>").unwrap();
        writeln!(
            out,
            "  <p class=\"kind\">{}</p>",
            entity.kind.display_name()
        )
        .unwrap();
        writeln!(out, "  <h1>{}</h1>", escape_html(&entity.name)).unwrap();
        if let Some(owner) = &entity.owner {
            writeln!(
                out,
                "  <p class=\"owner\">Category on {}</p>",
                escape_html(owner)
            )
            .unwrap();
        }
        if let Some(parent) = &entity.parent {
            writeln!(
                out,
                "  <p class=\"parent\">Inherits from {}</p>",
                escape_html(parent)
            )
            .unwrap();
        }
        writeln!(out, "</header>").unwrap();

        if let Some(description) = entity.document.root().find("description") {
            writeln!(out, "<section class=\"description\">").unwrap();
            writeln!(out, "  <p>{}</p>", Self::render_inline(description, "../")).unwrap();
            writeln!(out, "</section>").unwrap();
        }

        if !entity.members().is_empty() {
            writeln!(out, "<section class=\"members\">").unwrap();
            writeln!(out, "  <h2>Members</h2>").unwrap();
            let member_docs = entity.document.root().find("members");
            for member in entity.members() {
                writeln!(
                    out,
                    "  <div class=\"member\" id=\"{}\">",
                    escape_html(&member.selector)
                )
                .unwrap();
                writeln!(
                    out,
                    "    <h3><code>{}</code></h3>",
                    escape_html(&member.selector)
                )
                .unwrap();
                if let Some(description) = member_docs.and_then(|docs| {
                    docs.elements()
                        .find(|e| e.attr("name") == Some(member.name.as_str()))
                        .and_then(|e| e.find("description"))
                }) {
                    writeln!(out, "    <p>{}</p>", Self::render_inline(description, "../"))
                        .unwrap();
                }
                writeln!(out, "  </div>").unwrap();
            }
            writeln!(out, "</section>").unwrap();
        }

        Self::write_footer(&mut out);
        out
    }

    /// Render the index page from the directory-layout index
    fn index_page(database: &Database) -> String {
        let mut out = String::new();
        Self::write_header(&mut out, "Index");
        writeln!(out, "<h1>Documentation</h1>").unwrap();
        writeln!(
            out,
            "<p><a href=\"hierarchy.html\">Class hierarchy</a></p>"
        )
        .unwrap();
        for (directory, names) in database.directories().iter() {
            writeln!(out, "<section>").unwrap();
            writeln!(out, "  <h2>{directory}</h2>").unwrap();
            writeln!(out, "  <ul>").unwrap();
            for name in names {
                if let Some(entity) = database.entity(name) {
                    writeln!(
                        out,
                        "    <li><a href=\"{}\">{}</a></li>",
                        escape_html(&entity.relative_path),
                        escape_html(&entity.name)
                    )
                    .unwrap();
                }
            }
            writeln!(out, "  </ul>").unwrap();
            writeln!(out, "</section>").unwrap();
        }
        Self::write_footer(&mut out);
        out
    }

    /// Render the hierarchy page from the hierarchy forest
    fn hierarchy_page(database: &Database) -> String {
        let mut out = String::new();
        Self::write_header(&mut out, "Hierarchy");
        writeln!(out, "<h1>Class Hierarchy</h1>").unwrap();
        Self::write_hierarchy_list(&mut out, &database.hierarchy, database);
        Self::write_footer(&mut out);
        out
    }

    fn write_hierarchy_list(out: &mut String, nodes: &[HierarchyNode], database: &Database) {
        if nodes.is_empty() {
            return;
        }
        writeln!(out, "<ul>").unwrap();
        for node in nodes {
            // Documented nodes link through the entity back-reference;
            // undocumented ancestors render as plain names.
            let label = node
                .entity
                .as_deref()
                .and_then(|name| database.entity(name))
                .map_or_else(
                    || escape_html(&node.name),
                    |entity| {
                        format!(
                            "<a href=\"{}\">{}</a>",
                            escape_html(&entity.relative_path),
                            escape_html(&entity.name)
                        )
                    },
                );
            writeln!(out, "<li>{label}").unwrap();
            Self::write_hierarchy_list(out, &node.children, database);
            writeln!(out, "</li>").unwrap();
        }
        writeln!(out, "</ul>").unwrap();
    }

    /// Render cleaned inline markup to HTML
    ///
    /// Resolved markers become anchors (prefixed so they work from the
    /// page's directory); dangling markers degrade to their display text.
    fn render_inline(element: &Element, link_prefix: &str) -> String {
        let mut out = String::new();
        for child in element.children() {
            match child {
                Node::Text(text) => out.push_str(&escape_html(text)),
                Node::Element(nested) => {
                    if nested.name() == "ref" {
                        if let Some(href) = nested.attr("href") {
                            let _ = write!(
                                out,
                                "<a href=\"{}{}\">{}</a>",
                                link_prefix,
                                escape_html(href),
                                escape_html(&nested.text())
                            );
                        } else {
                            out.push_str(&escape_html(&nested.text()));
                        }
                    } else {
                        out.push_str(&Self::render_inline(nested, link_prefix));
                    }
                }
            }
        }
        out
    }

    fn write_header(out: &mut String, title: &str) {
        writeln!(out, "<!DOCTYPE html>").unwrap();
        writeln!(out, "<html lang=\"en\">").unwrap();
        writeln!(out, "<head>").unwrap();
        writeln!(out, "  <meta charset=\"UTF-8\">").unwrap();
        writeln!(out, "  <title>{} - Documentation</title>", escape_html(title)).unwrap();
        writeln!(out, "  <style>").unwrap();
        writeln!(
            out,
            "    body {{ font-family: sans-serif; max-width: 800px; margin: 2rem auto; padding: 0 1rem; }}"
        )
        .unwrap();
        writeln!(out, "    .kind {{ color: #888; margin-bottom: 0; }}").unwrap();
        writeln!(out, "    .member {{ border-top: 1px solid #ddd; padding: 0.5rem 0; }}").unwrap();
        writeln!(out, "    code {{ background: #f4f4f4; padding: 0 0.2rem; }}").unwrap();
        writeln!(out, "  </style>").unwrap();
        writeln!(out, "</head>").unwrap();
        writeln!(out, "<body>").unwrap();
    }

    fn write_footer(out: &mut String) {
        writeln!(out, "</body>").unwrap();
        writeln!(out, "</html>").unwrap();
    }
}

/// Escape text for HTML output
fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
