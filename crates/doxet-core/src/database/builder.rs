//! Object database builder
//!
//! Consumes the cleaned documents and assembles the unified database: the
//! name-keyed entity index, each entity's member index, the hierarchy
//! forest, and the directory-layout index. No cross-entity validation
//! happens here beyond name uniqueness; dangling parent/owner references
//! are the resolver's concern.

use crate::database::{Database, Entity, EntityKind, HierarchyNode, Member};
use crate::error::ConvertError;
use crate::markup::{Document, Element};

/// Build a database from cleaned documents
///
/// `objects` must be in discovery order; that order becomes the published
/// ordering of the entity index and the directory buckets. Fails with
/// [`ConvertError::DuplicateEntity`] or [`ConvertError::DuplicateMember`]
/// on naming collisions, producing no partial database.
pub fn build_database(
    index: Document,
    hierarchy: Document,
    objects: Vec<Document>,
) -> Result<Database, ConvertError> {
    let mut database = Database::new(index, hierarchy);

    for document in objects {
        let entity = entity_from_document(document)?;
        database.insert_entity(entity)?;
    }

    let roots: Vec<HierarchyNode> = database
        .hierarchy_document
        .root()
        .elements()
        .filter(|element| element.name() == "node")
        .map(|element| hierarchy_node(element, &database))
        .collect();
    database.hierarchy = roots;

    Ok(database)
}

fn entity_from_document(document: Document) -> Result<Entity, ConvertError> {
    let object = document.root();
    let file = object.attr("file").unwrap_or_default().to_string();
    let name = object
        .attr("name")
        .map(str::to_string)
        .filter(|n| !n.is_empty())
        .ok_or_else(|| ConvertError::MalformedInput {
            file: file.clone(),
            detail: "cleaned object has no name".to_string(),
        })?;
    let kind = object
        .attr("kind")
        .and_then(EntityKind::from_compound_kind)
        .ok_or_else(|| ConvertError::MalformedInput {
            file: file.clone(),
            detail: "cleaned object has no recognized kind".to_string(),
        })?;
    let owner = object.attr("owner").map(str::to_string);
    let parent = object.attr("parent").map(str::to_string);

    let members: Vec<Member> = object
        .find("members")
        .map(collect_members)
        .unwrap_or_default();

    let mut entity = Entity::new(name, kind, document, file)
        .with_owner(owner)
        .with_parent(parent);
    for member in members {
        entity.add_member(member)?;
    }
    Ok(entity)
}

fn collect_members(members: &Element) -> Vec<Member> {
    members
        .elements()
        .filter(|element| element.name() == "member")
        .filter_map(|element| {
            let name = element.attr("name")?;
            let prefix = element.attr("prefix").unwrap_or("-");
            Some(Member::new(name, prefix))
        })
        .collect()
}

/// Build one hierarchy node, linking it to the entity index by name when
/// the node's entity is documented
fn hierarchy_node(element: &Element, database: &Database) -> HierarchyNode {
    let name = element.attr("name").unwrap_or_default().to_string();
    let entity = database.entity(&name).map(|e| e.name.clone());
    let children = element
        .elements()
        .filter(|child| child.name() == "node")
        .map(|child| hierarchy_node(child, database))
        .collect();
    HierarchyNode {
        name,
        entity,
        children,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::Normalizer;

    fn object(name: &str, kind: &str, members: &[(&str, &str)]) -> Document {
        let mut root = Element::new("object")
            .with_attr("name", name)
            .with_attr("kind", kind)
            .with_attr("file", format!("{name}.xml"));
        let mut list = Element::new("members");
        for (member, prefix) in members {
            list.add_element(
                Element::new("member")
                    .with_attr("name", *member)
                    .with_attr("prefix", *prefix),
            );
        }
        root.add_element(list);
        Document::new(root)
    }

    fn empty(root: &str) -> Document {
        Document::new(Element::new(root))
    }

    #[test]
    fn test_build_indexes_entities_and_members() {
        let database = build_database(
            empty("index"),
            empty("hierarchy"),
            vec![
                object("Foo", "class", &[("bar", "-"), ("sharedFoo", "+")]),
                object("FooDelegate", "protocol", &[]),
            ],
        )
        .unwrap();

        assert_eq!(database.len(), 2);
        let foo = database.entity("Foo").unwrap();
        assert_eq!(foo.kind, EntityKind::Class);
        assert_eq!(foo.relative_path, "Classes/Foo.html");
        assert_eq!(foo.member("bar").unwrap().selector, "-bar");
        assert_eq!(foo.member("sharedFoo").unwrap().selector, "+sharedFoo");
        assert!(foo.member("missing").is_none());

        assert_eq!(database.directories().entities("Classes"), ["Foo"]);
        assert_eq!(database.directories().entities("Protocols"), ["FooDelegate"]);
    }

    #[test]
    fn test_duplicate_entity_fails_build() {
        let err = build_database(
            empty("index"),
            empty("hierarchy"),
            vec![object("Baz", "class", &[]), object("Baz", "protocol", &[])],
        )
        .unwrap_err();
        assert!(matches!(err, ConvertError::DuplicateEntity { ref name } if name == "Baz"));
    }

    #[test]
    fn test_duplicate_member_fails_build() {
        let err = build_database(
            empty("index"),
            empty("hierarchy"),
            vec![object("Foo", "class", &[("bar", "-"), ("bar", "+")])],
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ConvertError::DuplicateMember { ref entity, ref member }
                if entity == "Foo" && member == "bar"
        ));
    }

    #[test]
    fn test_hierarchy_links_documented_entities_only() {
        let hierarchy = Normalizer::clean_hierarchy(
            r#"<hierarchy>
                <node name="NSObject"><node name="Foo"/></node>
            </hierarchy>"#,
            "hierarchy.xml",
        )
        .unwrap();
        let database = build_database(
            empty("index"),
            hierarchy,
            vec![object("Foo", "class", &[])],
        )
        .unwrap();

        assert_eq!(database.hierarchy.len(), 1);
        let root = &database.hierarchy[0];
        assert_eq!(root.name, "NSObject");
        assert!(root.entity.is_none(), "undocumented ancestor keeps only a name");
        assert_eq!(root.children.len(), 1);
        assert_eq!(root.children[0].name, "Foo");
        assert_eq!(root.children[0].entity.as_deref(), Some("Foo"));
        assert!(root.children[0].children.is_empty());
    }

    #[test]
    fn test_dangling_parent_is_permitted() {
        let mut doc = object("Foo", "class", &[]);
        doc.root_mut().set_attr("parent", "Undocumented");
        let database = build_database(empty("index"), empty("hierarchy"), vec![doc]).unwrap();
        assert_eq!(
            database.entity("Foo").unwrap().parent.as_deref(),
            Some("Undocumented")
        );
    }
}
