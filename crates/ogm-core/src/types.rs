//! Core identity and record types for mapped entities.
//!
//! Every persisted entity is backed by exactly one graph node; associations
//! between entities are typed, directed relationships between those nodes.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ── Identities ────────────────────────────────────────────────────

/// Unique identifier of a graph node (an entity's persistent state).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub Uuid);

impl NodeId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier of a relationship.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RelationshipId(pub Uuid);

impl RelationshipId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RelationshipId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RelationshipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ── Association Shape ─────────────────────────────────────────────

/// Direction of a relationship relative to the owning entity.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    /// owner → target
    #[default]
    Outgoing,
    /// target → owner
    Incoming,
}

impl Direction {
    /// Order `(owner, target)` into `(start, end)` node ids.
    pub fn endpoints(self, owner: NodeId, target: NodeId) -> (NodeId, NodeId) {
        match self {
            Self::Outgoing => (owner, target),
            Self::Incoming => (target, owner),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Outgoing => f.write_str("OUTGOING"),
            Self::Incoming => f.write_str("INCOMING"),
        }
    }
}

/// How many targets an association may hold.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum Cardinality {
    One,
    Many,
}

impl fmt::Display for Cardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::One => f.write_str("ONE"),
            Self::Many => f.write_str("MANY"),
        }
    }
}

// ── Records ───────────────────────────────────────────────────────

/// A node as seen through a graph session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub id: NodeId,
    pub label: String,
    pub properties: serde_json::Value,
}

/// A relationship as seen through a graph session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipRecord {
    pub id: RelationshipId,
    pub rel_type: String,
    pub start: NodeId,
    pub end: NodeId,
    pub properties: serde_json::Value,
}

impl RelationshipRecord {
    /// The node at the opposite end from `node`.
    pub fn other_node(&self, node: NodeId) -> NodeId {
        if self.start == node {
            self.end
        } else {
            self.start
        }
    }
}
