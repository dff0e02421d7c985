//! ogm-core: Shared types, configuration, and error handling for the object-graph mapper.
//!
//! This crate provides the foundational types used across all OGM components:
//! - Node and relationship identities backing mapped entities
//! - Relationship direction and association cardinality
//! - Lightweight node/relationship records exchanged with graph sessions
//! - Configuration management
//! - Common error types

pub mod config;
pub mod error;
pub mod types;

pub use error::OgmError;
pub use types::{
    Cardinality, Direction, NodeId, NodeRecord, RelationshipId, RelationshipRecord,
};
