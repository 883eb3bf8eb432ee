//! Reference resolver
//!
//! Walks every cross-reference marker in every cleaned document and
//! rewrites it into a concrete relative link validated against the
//! database. Markers look like `<ref target="Entity[.member]">text</ref>`;
//! resolved markers become `<ref href="path[#selector]">text</ref>`.
//! A marker whose entity cannot be found is left byte-identical and
//! recorded as a dangling-reference warning; a marker whose member cannot
//! be found still gets the entity-level link, just without an anchor.
//!
//! This is the single mutation point of the pipeline: only the cleaned
//! document fields change, never entity identity, membership, or the
//! hierarchy/directory structures. Resolution is deterministic.

use rayon::prelude::*;

use crate::database::{Database, Entity};
use crate::error::Warning;
use crate::markup::{Document, Element};

/// Resolve every cross-reference in the database, in place
///
/// Returns the accumulated warnings in a stable order: top-level index
/// document first, then the hierarchy document, then each entity document
/// in discovery order.
pub fn resolve(database: &mut Database) -> Vec<Warning> {
    let mut warnings = Vec::new();

    let mut index = database.index_document.clone();
    rewrite_document(&mut index, "index", database, &mut warnings);
    let mut hierarchy = database.hierarchy_document.clone();
    rewrite_document(&mut hierarchy, "hierarchy", database, &mut warnings);

    // Per-document rewriting is embarrassingly parallel: the database is
    // only read here, and each task rewrites a clone of one entity's
    // document. Results come back in discovery order, keeping warning
    // order and the final documents deterministic.
    let snapshot: &Database = database;
    let entities: Vec<&Entity> = snapshot.entities().collect();
    let rewritten: Vec<(String, Document, Vec<Warning>)> = entities
        .par_iter()
        .map(|entity| {
            let mut document = entity.document.clone();
            let mut local = Vec::new();
            rewrite_document(&mut document, &entity.name, snapshot, &mut local);
            (entity.name.clone(), document, local)
        })
        .collect();

    database.index_document = index;
    database.hierarchy_document = hierarchy;
    for (name, document, local) in rewritten {
        if let Some(entity) = database.entity_mut(&name) {
            entity.document = document;
        }
        warnings.extend(local);
    }
    warnings
}

fn rewrite_document(
    document: &mut Document,
    document_name: &str,
    database: &Database,
    warnings: &mut Vec<Warning>,
) {
    document.root_mut().walk_mut(&mut |element| {
        if element.name() == "ref" {
            rewrite_marker(element, document_name, database, warnings);
        }
    });
}

fn rewrite_marker(
    marker: &mut Element,
    document_name: &str,
    database: &Database,
    warnings: &mut Vec<Warning>,
) {
    let Some(target) = marker.attr("target").map(str::to_string) else {
        // Already resolved or not a cross-reference marker.
        return;
    };
    let (entity_name, member_name) = split_target(&target);

    let Some(entity) = database.entity(entity_name) else {
        // Target entity unknown: preserve the marker verbatim.
        warnings.push(Warning::DanglingReference {
            document: document_name.to_string(),
            target: target.clone(),
        });
        return;
    };

    let mut href = entity.relative_path.clone();
    if let Some(member_name) = member_name {
        if let Some(member) = entity.member(member_name) {
            // Cross-entity anchors always use the fully formatted selector;
            // the short form is only valid inside the member's own page.
            href.push('#');
            href.push_str(&member.selector);
        } else {
            warnings.push(Warning::DanglingReference {
                document: document_name.to_string(),
                target: target.clone(),
            });
        }
    }

    marker.remove_attr("target");
    marker.set_attr("href", href);
}

/// Split a marker target into entity name and optional member name
fn split_target(target: &str) -> (&str, Option<&str>) {
    match target.split_once('.') {
        Some((entity, member)) if !member.is_empty() => (entity, Some(member)),
        _ => (target, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::build_database;
    use crate::markup::Document;
    use crate::normalize::Normalizer;

    fn object_with_description(name: &str, kind: &str, description_xml: &str) -> Document {
        let raw = format!(
            r#"<doxygen><compounddef kind="{kind}">
                <compoundname>{name}</compoundname>
                <briefdescription><para>{description_xml}</para></briefdescription>
                <sectiondef kind="func">
                    <memberdef kind="function" static="no"><name>bar</name></memberdef>
                </sectiondef>
            </compounddef></doxygen>"#
        );
        Normalizer::clean_object(&raw, &format!("{name}.xml")).unwrap()
    }

    fn empty(root: &str) -> Document {
        Document::new(crate::markup::Element::new(root))
    }

    #[test]
    fn test_entity_only_reference() {
        let mut database = build_database(
            empty("index"),
            empty("hierarchy"),
            vec![
                object_with_description("Foo", "class", ""),
                object_with_description(
                    "Bar",
                    "class",
                    r#"See <ref refid="Foo">Foo</ref>."#,
                ),
            ],
        )
        .unwrap();

        let warnings = resolve(&mut database);
        assert!(warnings.is_empty());
        let xml = database.entity("Bar").unwrap().document.to_xml();
        assert!(xml.contains("<ref href=\"Classes/Foo.html\">Foo</ref>"), "{xml}");
    }

    #[test]
    fn test_member_reference_uses_full_selector() {
        let mut database = build_database(
            empty("index"),
            empty("hierarchy"),
            vec![
                object_with_description("Foo", "class", ""),
                object_with_description(
                    "Widgets",
                    "category",
                    r#"Calls <ref refid="Foo.bar">bar</ref>."#,
                ),
            ],
        )
        .unwrap();

        let warnings = resolve(&mut database);
        assert!(warnings.is_empty());
        let entity = database.entity("Widgets").unwrap();
        let xml = entity.document.to_xml();
        assert!(xml.contains("<ref href=\"Classes/Foo.html#-bar\">bar</ref>"), "{xml}");
    }

    #[test]
    fn test_missing_member_keeps_entity_link() {
        let mut database = build_database(
            empty("index"),
            empty("hierarchy"),
            vec![
                object_with_description("Qux", "class", ""),
                object_with_description(
                    "Caller",
                    "class",
                    r#"<ref refid="Qux.missingMethod">missing</ref>"#,
                ),
            ],
        )
        .unwrap();

        let warnings = resolve(&mut database);
        assert_eq!(
            warnings,
            [Warning::DanglingReference {
                document: "Caller".to_string(),
                target: "Qux.missingMethod".to_string(),
            }]
        );
        let xml = database.entity("Caller").unwrap().document.to_xml();
        assert!(xml.contains("<ref href=\"Classes/Qux.html\">missing</ref>"), "{xml}");
        assert!(!xml.contains('#'));
    }

    #[test]
    fn test_dangling_entity_preserved_verbatim() {
        let mut database = build_database(
            empty("index"),
            empty("hierarchy"),
            vec![object_with_description(
                "Foo",
                "class",
                r#"<ref refid="Nowhere">gone</ref>"#,
            )],
        )
        .unwrap();

        let before = database
            .entity("Foo")
            .unwrap()
            .document
            .root()
            .find("description")
            .unwrap()
            .to_xml();
        let warnings = resolve(&mut database);
        let after = database
            .entity("Foo")
            .unwrap()
            .document
            .root()
            .find("description")
            .unwrap()
            .to_xml();

        assert_eq!(before, after, "dangling marker must stay byte-identical");
        assert_eq!(
            warnings,
            [Warning::DanglingReference {
                document: "Foo".to_string(),
                target: "Nowhere".to_string(),
            }]
        );
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let build = || {
            build_database(
                empty("index"),
                empty("hierarchy"),
                vec![
                    object_with_description("Foo", "class", ""),
                    object_with_description("A", "class", r#"<ref refid="Foo.bar">x</ref>"#),
                    object_with_description("B", "class", r#"<ref refid="Gone">y</ref>"#),
                ],
            )
            .unwrap()
        };

        let mut first = build();
        let mut second = build();
        let warnings_first = resolve(&mut first);
        let warnings_second = resolve(&mut second);

        assert_eq!(warnings_first, warnings_second);
        for name in first.entity_names() {
            assert_eq!(
                first.entity(name).unwrap().document.to_xml(),
                second.entity(name).unwrap().document.to_xml()
            );
        }
    }

    #[test]
    fn test_index_document_markers_resolved() {
        let index = Normalizer::clean_index(
            r#"<doxygenindex>
                <compound kind="class"><name>Foo</name></compound>
            </doxygenindex>"#,
            "index.xml",
        )
        .unwrap();
        let mut database = build_database(
            index,
            empty("hierarchy"),
            vec![object_with_description("Foo", "class", "")],
        )
        .unwrap();

        let warnings = resolve(&mut database);
        assert!(warnings.is_empty());
        assert!(database
            .index_document
            .to_xml()
            .contains("<ref href=\"Classes/Foo.html\">Foo</ref>"));
    }

    #[test]
    fn test_split_target() {
        assert_eq!(split_target("Foo"), ("Foo", None));
        assert_eq!(split_target("Foo.bar"), ("Foo", Some("bar")));
        assert_eq!(split_target("Foo."), ("Foo.", None));
    }
}
