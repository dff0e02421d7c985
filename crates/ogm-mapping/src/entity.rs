//! Node-backed entities and their lifecycle.
//!
//! An entity's serde representation is its node's property map. Its
//! persistent state (the backing [`NodeId`]) is assigned by [`persist`]
//! and must be skipped by serde.

use ogm_core::NodeId;
use ogm_graph::GraphSession;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{MappingError, Result};

/// A domain type mapped onto graph nodes.
pub trait NodeEntity: Serialize + DeserializeOwned {
    /// Node label, and the entity name used in mapping definitions.
    const TYPE_NAME: &'static str;

    /// The backing node, once persisted.
    fn persistent_state(&self) -> Option<NodeId>;

    /// Bind this value to its backing node.
    fn attach(&mut self, node: NodeId);
}

/// The backing node of a persisted entity.
pub fn node_of<E: NodeEntity>(entity: &E) -> Result<NodeId> {
    entity
        .persistent_state()
        .ok_or_else(|| MappingError::NotPersisted {
            entity_type: E::TYPE_NAME.to_string(),
        })
}

/// Store an entity's properties, allocating its node on first call.
pub fn persist<S, E>(session: &mut S, entity: &mut E) -> Result<NodeId>
where
    S: GraphSession + ?Sized,
    E: NodeEntity,
{
    let properties = serde_json::to_value(&*entity)?;
    match entity.persistent_state() {
        Some(node) => {
            session.update_node(node, properties)?;
            Ok(node)
        }
        None => {
            let node = session.create_node(E::TYPE_NAME, properties)?;
            entity.attach(node);
            tracing::debug!(entity = E::TYPE_NAME, node = %node, "Entity persisted");
            Ok(node)
        }
    }
}

/// Rebuild an entity from its backing node.
pub fn materialize<S, E>(session: &mut S, node: NodeId) -> Result<E>
where
    S: GraphSession + ?Sized,
    E: NodeEntity,
{
    let record = session.get_node(node)?.ok_or(MappingError::MissingNode(node))?;
    if record.label != E::TYPE_NAME {
        return Err(MappingError::TypeMismatch {
            expected: E::TYPE_NAME.to_string(),
            found: record.label,
        });
    }
    let mut entity: E = serde_json::from_value(record.properties)?;
    entity.attach(node);
    Ok(entity)
}

/// Delete an entity's node and every relationship touching it.
pub fn remove<S, E>(session: &mut S, entity: &E) -> Result<()>
where
    S: GraphSession + ?Sized,
    E: NodeEntity,
{
    let node = node_of(entity)?;
    session.delete_node(node)?;
    tracing::debug!(entity = E::TYPE_NAME, node = %node, "Entity removed");
    Ok(())
}
