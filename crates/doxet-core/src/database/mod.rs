//! The object database
//!
//! Typed replacement for the original nested-dictionary layout: the
//! [`Database`] owns every [`Entity`] in a name-keyed index, the hierarchy
//! forest holds name-based back-references into that index instead of owning
//! anything, and the [`DirectoryIndex`] groups entities by their output
//! bucket. All published orderings are insertion order.

use std::collections::HashMap;

use crate::error::ConvertError;
use crate::markup::Document;

pub mod builder;

pub use builder::build_database;

/// Kind of a documented entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    /// A class
    Class,
    /// A category extending a class
    Category,
    /// A protocol
    Protocol,
}

impl EntityKind {
    /// Parse an extractor compound kind
    pub fn from_compound_kind(kind: &str) -> Option<Self> {
        match kind {
            "class" => Some(EntityKind::Class),
            "category" => Some(EntityKind::Category),
            "protocol" => Some(EntityKind::Protocol),
            _ => None,
        }
    }

    /// The extractor-facing kind string
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Class => "class",
            EntityKind::Category => "category",
            EntityKind::Protocol => "protocol",
        }
    }

    /// The fixed output bucket this kind is stored under
    pub fn directory(&self) -> &'static str {
        match self {
            EntityKind::Class => "Classes",
            EntityKind::Category => "Categories",
            EntityKind::Protocol => "Protocols",
        }
    }

    /// Human-readable kind name for rendered output
    pub fn display_name(&self) -> &'static str {
        match self {
            EntityKind::Class => "Class",
            EntityKind::Category => "Category",
            EntityKind::Protocol => "Protocol",
        }
    }
}

/// A method or property belonging to an entity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    /// Member name, unique within the owning entity
    pub name: String,
    /// Selector prefix, `-` for instance members and `+` for class members
    pub prefix: String,
    /// Fully formatted selector: prefix + name
    ///
    /// Cross-entity links must use this form; the short name is only valid
    /// for anchors within the member's own document.
    pub selector: String,
}

impl Member {
    /// Create a member, computing its selector
    pub fn new(name: impl Into<String>, prefix: impl Into<String>) -> Self {
        let name = name.into();
        let prefix = prefix.into();
        let selector = format!("{prefix}{name}");
        Self {
            name,
            prefix,
            selector,
        }
    }
}

/// A documented class, category, or protocol
#[derive(Debug, Clone)]
pub struct Entity {
    /// Unique entity name, the primary key of the database
    pub name: String,
    /// Entity kind
    pub kind: EntityKind,
    /// Owning class name; categories only, absent when undeterminable
    pub owner: Option<String>,
    /// Parent entity name; classes only
    pub parent: Option<String>,
    /// Cleaned markup, mutated in place across stages so it always reflects
    /// the latest transformation
    pub document: Document,
    /// Output bucket, derived from the kind
    pub relative_directory: &'static str,
    /// Output path relative to the index, always prefixed by the bucket
    pub relative_path: String,
    /// Name of the original raw-markup file
    pub source_file: String,
    members: Vec<Member>,
    member_index: HashMap<String, usize>,
}

impl Entity {
    /// Create an entity and derive its output location from the kind
    pub fn new(
        name: impl Into<String>,
        kind: EntityKind,
        document: Document,
        source_file: impl Into<String>,
    ) -> Self {
        let name = name.into();
        let relative_directory = kind.directory();
        let relative_path = format!("{}/{}.html", relative_directory, sanitize_file_name(&name));
        Self {
            name,
            kind,
            owner: None,
            parent: None,
            document,
            relative_directory,
            relative_path,
            source_file: source_file.into(),
            members: Vec::new(),
            member_index: HashMap::new(),
        }
    }

    /// Set the owning class (categories)
    #[must_use]
    pub fn with_owner(mut self, owner: Option<String>) -> Self {
        self.owner = owner;
        self
    }

    /// Set the parent entity (classes)
    #[must_use]
    pub fn with_parent(mut self, parent: Option<String>) -> Self {
        self.parent = parent;
        self
    }

    /// Add a member, failing on a name collision within this entity
    pub fn add_member(&mut self, member: Member) -> Result<(), ConvertError> {
        if self.member_index.contains_key(&member.name) {
            return Err(ConvertError::DuplicateMember {
                entity: self.name.clone(),
                member: member.name,
            });
        }
        self.member_index
            .insert(member.name.clone(), self.members.len());
        self.members.push(member);
        Ok(())
    }

    /// Look up a member by name
    pub fn member(&self, name: &str) -> Option<&Member> {
        self.member_index.get(name).map(|&i| &self.members[i])
    }

    /// All members in discovery order
    pub fn members(&self) -> &[Member] {
        &self.members
    }
}

/// A node of the hierarchy forest
///
/// Nodes exist for every name appearing in the hierarchy document, whether or
/// not that name is documented. The back-reference into the entity index is
/// by name, so the tree never owns an entity.
#[derive(Debug, Clone)]
pub struct HierarchyNode {
    /// Display name of the node
    pub name: String,
    /// Name of the corresponding documented entity, absent for undocumented
    /// ancestors that still appear in the tree
    pub entity: Option<String>,
    /// Ordered children; empty when the node is a leaf
    pub children: Vec<HierarchyNode>,
}

/// Mapping from output bucket to the ordered entities stored there
#[derive(Debug, Clone, Default)]
pub struct DirectoryIndex {
    buckets: Vec<(&'static str, Vec<String>)>,
}

impl DirectoryIndex {
    fn insert(&mut self, directory: &'static str, entity: String) {
        if let Some((_, names)) = self.buckets.iter_mut().find(|(d, _)| *d == directory) {
            names.push(entity);
        } else {
            self.buckets.push((directory, vec![entity]));
        }
    }

    /// Entity names under a bucket, in discovery order
    pub fn entities(&self, directory: &str) -> &[String] {
        self.buckets
            .iter()
            .find(|(d, _)| *d == directory)
            .map_or(&[], |(_, names)| names.as_slice())
    }

    /// All buckets with their entity names, in discovery order
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &[String])> {
        self.buckets.iter().map(|(d, names)| (*d, names.as_slice()))
    }
}

/// The aggregate root owning everything the generators consume
///
/// Created empty at pipeline start, populated monotonically by the builder,
/// mutated in place (cleaned documents only) by the resolver, then handed
/// read-mostly to the generators. Nothing persists between runs.
#[derive(Debug, Clone)]
pub struct Database {
    /// Cleaned top-level index document
    pub index_document: Document,
    /// Cleaned hierarchy document
    pub hierarchy_document: Document,
    /// The hierarchy forest roots
    pub hierarchy: Vec<HierarchyNode>,
    entities: HashMap<String, Entity>,
    order: Vec<String>,
    directories: DirectoryIndex,
}

impl Database {
    /// Create an empty database around the cleaned top-level documents
    pub fn new(index_document: Document, hierarchy_document: Document) -> Self {
        Self {
            index_document,
            hierarchy_document,
            hierarchy: Vec::new(),
            entities: HashMap::new(),
            order: Vec::new(),
            directories: DirectoryIndex::default(),
        }
    }

    /// Insert an entity, failing on a name collision
    ///
    /// Also files the entity under its directory bucket, preserving
    /// discovery order.
    pub fn insert_entity(&mut self, entity: Entity) -> Result<(), ConvertError> {
        if self.entities.contains_key(&entity.name) {
            return Err(ConvertError::DuplicateEntity { name: entity.name });
        }
        self.order.push(entity.name.clone());
        self.directories
            .insert(entity.relative_directory, entity.name.clone());
        self.entities.insert(entity.name.clone(), entity);
        Ok(())
    }

    /// Look up an entity by name
    pub fn entity(&self, name: &str) -> Option<&Entity> {
        self.entities.get(name)
    }

    /// Look up an entity by name, mutable
    pub fn entity_mut(&mut self, name: &str) -> Option<&mut Entity> {
        self.entities.get_mut(name)
    }

    /// Entity names in discovery order
    pub fn entity_names(&self) -> &[String] {
        &self.order
    }

    /// Entities in discovery order
    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.order.iter().filter_map(|name| self.entities.get(name))
    }

    /// The directory-layout index
    pub fn directories(&self) -> &DirectoryIndex {
        &self.directories
    }

    /// Number of documented entities
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether the database holds no entities
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Sanitize a name into a filesystem-safe path segment
///
/// The same rule applies everywhere a name becomes part of a path.
pub fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '+') {
                c
            } else {
                '_'
            }
        })
        .collect()
}
