//! The transactional session contract consumed by the mapper.

use ogm_core::{Direction, NodeId, NodeRecord, RelationshipId, RelationshipRecord};

use crate::client::GraphError;

/// Node and relationship operations executed against one active transaction.
///
/// A session never begins or ends a transaction on its own: the store that
/// produced it does, at the caller's request. Directions are relative to the
/// `from` node, so `create_relationship(t, Incoming, a, b)` creates `b -[t]-> a`.
pub trait GraphSession {
    /// Allocate a node with a label and a JSON object of properties.
    fn create_node(
        &mut self,
        label: &str,
        properties: serde_json::Value,
    ) -> Result<NodeId, GraphError>;

    /// Replace the properties of an existing node.
    fn update_node(&mut self, id: NodeId, properties: serde_json::Value)
        -> Result<(), GraphError>;

    fn get_node(&mut self, id: NodeId) -> Result<Option<NodeRecord>, GraphError>;

    /// Delete a node together with every relationship touching it.
    fn delete_node(&mut self, id: NodeId) -> Result<(), GraphError>;

    fn create_relationship(
        &mut self,
        rel_type: &str,
        direction: Direction,
        from: NodeId,
        to: NodeId,
    ) -> Result<RelationshipRecord, GraphError>;

    /// Delete every relationship of `rel_type` between the pair in `direction`.
    /// Returns whether anything was deleted.
    fn delete_relationship(
        &mut self,
        rel_type: &str,
        direction: Direction,
        from: NodeId,
        to: NodeId,
    ) -> Result<bool, GraphError>;

    /// The unique relationship of `rel_type` leaving `from` in `direction`.
    ///
    /// Fails with [`GraphError::NotSingle`] when more than one exists.
    fn find_relationship(
        &mut self,
        rel_type: &str,
        direction: Direction,
        from: NodeId,
    ) -> Result<Option<RelationshipRecord>, GraphError> {
        let mut found = self.find_relationships(rel_type, direction, from)?;
        if found.len() > 1 {
            return Err(GraphError::NotSingle {
                rel_type: rel_type.to_string(),
                node: from,
                count: found.len(),
            });
        }
        Ok(found.pop())
    }

    fn find_relationships(
        &mut self,
        rel_type: &str,
        direction: Direction,
        from: NodeId,
    ) -> Result<Vec<RelationshipRecord>, GraphError>;

    fn get_relationship(
        &mut self,
        id: RelationshipId,
    ) -> Result<Option<RelationshipRecord>, GraphError>;

    /// Replace the properties stored on a relationship.
    fn set_relationship_properties(
        &mut self,
        id: RelationshipId,
        properties: serde_json::Value,
    ) -> Result<(), GraphError>;
}
