//! Error types for the ogm-mapping crate.

use std::fmt;

use ogm_core::NodeId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MappingError {
    /// Malformed or contradictory association metadata.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A mutation would violate a structural invariant. Raised before any
    /// relationship is created or deleted.
    #[error("Invalid association {declaring_type}.{field}: {violation}")]
    InvalidAssociation {
        declaring_type: String,
        field: String,
        violation: Violation,
    },

    #[error("No association mapped for {entity_type}.{field}")]
    UnknownField { entity_type: String, field: String },

    #[error("Type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },

    #[error("{entity_type} entity has no persistent state; persist it first")]
    NotPersisted { entity_type: String },

    #[error("Node {0} backing an entity no longer exists")]
    MissingNode(NodeId),

    #[error("Graph error: {0}")]
    Graph(#[from] ogm_graph::GraphError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),
}

/// The structural rule an association mutation broke.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Violation {
    /// The entity was asked to relate to itself.
    SelfReference,
    /// A whole collection was assigned to a read-only association.
    ReadOnlyReplace,
    /// A single-valued operation on a collection, or the other way round.
    CardinalityMismatch,
    /// Plain entity mutation on a field holding relationship entities.
    RelationshipEntityField,
    /// Relationship-entity creation on a field that holds plain entities.
    NotRelationshipEntity,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::SelfReference => "an entity may not relate to itself here",
            Self::ReadOnlyReplace => "read-only association cannot be replaced",
            Self::CardinalityMismatch => "operation does not match the association cardinality",
            Self::RelationshipEntityField => {
                "relationship entities are created through relate, not assigned"
            }
            Self::NotRelationshipEntity => "association does not hold relationship entities",
        };
        f.write_str(text)
    }
}

pub type Result<T> = std::result::Result<T, MappingError>;
