//! Declarative entity definitions: association metadata as data.
//!
//! Each mapped field states its target type and container shape, and may
//! carry a [`RelatedTo`] block naming the relationship type, direction and
//! cardinality explicitly. Definitions are built in code or loaded from a
//! TOML/JSON file:
//!
//! ```toml
//! [[entities]]
//! name = "Person"
//!
//! [[entities.fields]]
//! name = "boss"
//! target = "Person"
//! related_to = { type = "boss", direction = "INCOMING" }
//! ```

use ogm_core::{Cardinality, Direction};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Whether a definition describes node-backed or relationship-backed entities.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    #[default]
    Node,
    Relationship,
}

/// Declared container of a mapped field.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FieldShape {
    /// One optional target.
    #[default]
    Single,
    /// A mutable, assignable set of targets.
    Set,
    /// An observable sequence of targets that cannot be assigned wholesale.
    Iterable,
}

/// Explicit relationship metadata on a field.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RelatedTo {
    /// Relationship type name, used verbatim when present.
    #[serde(default, rename = "type")]
    pub rel_type: Option<String>,

    #[serde(default)]
    pub direction: Option<Direction>,

    #[serde(default)]
    pub cardinality: Option<Cardinality>,

    /// Element type of a collection; must agree with the field target.
    #[serde(default)]
    pub element_type: Option<String>,
}

impl RelatedTo {
    pub fn named(rel_type: &str) -> Self {
        Self {
            rel_type: Some(rel_type.to_string()),
            ..Default::default()
        }
    }

    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = Some(direction);
        self
    }

    pub fn incoming(self) -> Self {
        self.with_direction(Direction::Incoming)
    }

    pub fn with_cardinality(mut self, cardinality: Cardinality) -> Self {
        self.cardinality = Some(cardinality);
        self
    }

    pub fn with_element_type(mut self, element_type: &str) -> Self {
        self.element_type = Some(element_type.to_string());
        self
    }
}

/// A single mapped field of an entity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FieldDefinition {
    pub name: String,

    /// Target entity type name.
    pub target: String,

    #[serde(default)]
    pub shape: FieldShape,

    #[serde(default)]
    pub related_to: Option<RelatedTo>,

    /// Field yields relationship entities rather than far-end entities.
    #[serde(default)]
    pub relationship_entity: bool,

    #[serde(default)]
    pub allow_self_reference: bool,

    /// Node type at the far end of a relationship-entity field. Defaults to
    /// the declaring type.
    #[serde(default)]
    pub end_type: Option<String>,
}

impl FieldDefinition {
    fn new(name: &str, target: &str, shape: FieldShape) -> Self {
        Self {
            name: name.to_string(),
            target: target.to_string(),
            shape,
            related_to: None,
            relationship_entity: false,
            allow_self_reference: false,
            end_type: None,
        }
    }

    pub fn single(name: &str, target: &str) -> Self {
        Self::new(name, target, FieldShape::Single)
    }

    pub fn set(name: &str, target: &str) -> Self {
        Self::new(name, target, FieldShape::Set)
    }

    pub fn iterable(name: &str, target: &str) -> Self {
        Self::new(name, target, FieldShape::Iterable)
    }

    pub fn related_to(mut self, related_to: RelatedTo) -> Self {
        self.related_to = Some(related_to);
        self
    }

    pub fn relationship_entity(mut self) -> Self {
        self.relationship_entity = true;
        self
    }

    pub fn allow_self_reference(mut self) -> Self {
        self.allow_self_reference = true;
        self
    }

    pub fn with_end_type(mut self, end_type: &str) -> Self {
        self.end_type = Some(end_type.to_string());
        self
    }
}

/// A mapped entity type and its association fields.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EntityDefinition {
    pub name: String,

    #[serde(default)]
    pub kind: EntityKind,

    #[serde(default)]
    pub fields: Vec<FieldDefinition>,
}

impl EntityDefinition {
    /// A node-backed entity type.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: EntityKind::Node,
            fields: Vec::new(),
        }
    }

    /// A relationship-backed entity type.
    pub fn relationship(name: &str) -> Self {
        Self {
            kind: EntityKind::Relationship,
            ..Self::new(name)
        }
    }

    pub fn field(mut self, field: FieldDefinition) -> Self {
        self.fields.push(field);
        self
    }
}

/// Root of a mapping definitions file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MappingFile {
    #[serde(default)]
    pub entities: Vec<EntityDefinition>,
}

/// Load entity definitions from a TOML or JSON file.
pub fn load_definitions(path: &str) -> Result<Vec<EntityDefinition>> {
    let cfg = config::Config::builder()
        .add_source(config::File::with_name(path))
        .build()?;
    let file: MappingFile = cfg.try_deserialize()?;
    tracing::debug!(path, entities = file.entities.len(), "Mapping definitions loaded");
    Ok(file.entities)
}
