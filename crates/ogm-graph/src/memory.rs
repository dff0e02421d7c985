//! In-memory transactional graph store.
//!
//! Holds nodes and relationships behind a mutex with per-node adjacency
//! indexes. A [`MemoryTransaction`] owns the lock for its whole lifetime, so
//! transactions are serialized; every mutation is journaled so that rollback
//! (explicit or on drop) restores the exact prior state.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use ogm_core::{Direction, NodeId, NodeRecord, RelationshipId, RelationshipRecord};

use crate::client::GraphError;
use crate::session::GraphSession;

#[derive(Debug, Default)]
struct GraphState {
    nodes: HashMap<NodeId, NodeRecord>,
    relationships: HashMap<RelationshipId, RelationshipRecord>,
    /// node → relationships starting at it
    outgoing: HashMap<NodeId, HashSet<RelationshipId>>,
    /// node → relationships ending at it
    incoming: HashMap<NodeId, HashSet<RelationshipId>>,
}

impl GraphState {
    fn insert_relationship(&mut self, rel: RelationshipRecord) {
        self.outgoing.entry(rel.start).or_default().insert(rel.id);
        self.incoming.entry(rel.end).or_default().insert(rel.id);
        self.relationships.insert(rel.id, rel);
    }

    fn remove_relationship(&mut self, id: RelationshipId) -> Option<RelationshipRecord> {
        let rel = self.relationships.remove(&id)?;
        unindex(&mut self.outgoing, rel.start, id);
        unindex(&mut self.incoming, rel.end, id);
        Some(rel)
    }

    fn adjacent(
        &self,
        node: NodeId,
        direction: Direction,
    ) -> impl Iterator<Item = &RelationshipRecord> {
        let index = match direction {
            Direction::Outgoing => &self.outgoing,
            Direction::Incoming => &self.incoming,
        };
        index
            .get(&node)
            .into_iter()
            .flat_map(|ids| ids.iter())
            .filter_map(move |id| self.relationships.get(id))
    }
}

fn unindex(index: &mut HashMap<NodeId, HashSet<RelationshipId>>, node: NodeId, id: RelationshipId) {
    if let Some(set) = index.get_mut(&node) {
        set.remove(&id);
        if set.is_empty() {
            index.remove(&node);
        }
    }
}

/// One reversible mutation.
#[derive(Debug)]
enum Undo {
    NodeCreated(NodeId),
    NodeReplaced(NodeRecord),
    NodeDeleted(NodeRecord),
    RelationshipCreated(RelationshipId),
    RelationshipReplaced(RelationshipRecord),
    RelationshipDeleted(RelationshipRecord),
}

/// Thread-safe in-memory graph store.
#[derive(Debug, Default)]
pub struct MemoryGraph {
    state: Mutex<GraphState>,
}

impl MemoryGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin a transaction, blocking until no other transaction is open.
    pub fn begin(&self) -> Result<MemoryTransaction<'_>, GraphError> {
        let state = self.state.lock().map_err(|_| GraphError::LockPoisoned)?;
        Ok(MemoryTransaction {
            state,
            journal: Vec::new(),
            finished: false,
        })
    }

    /// Number of committed nodes.
    pub fn node_count(&self) -> Result<usize, GraphError> {
        Ok(self.lock()?.nodes.len())
    }

    /// Number of committed relationships.
    pub fn relationship_count(&self) -> Result<usize, GraphError> {
        Ok(self.lock()?.relationships.len())
    }

    fn lock(&self) -> Result<MutexGuard<'_, GraphState>, GraphError> {
        self.state.lock().map_err(|_| GraphError::LockPoisoned)
    }
}

/// An open transaction on a [`MemoryGraph`].
pub struct MemoryTransaction<'a> {
    state: MutexGuard<'a, GraphState>,
    journal: Vec<Undo>,
    finished: bool,
}

impl MemoryTransaction<'_> {
    /// Make every mutation of this transaction permanent.
    pub fn commit(mut self) {
        tracing::debug!(mutations = self.journal.len(), "Transaction committed");
        self.journal.clear();
        self.finished = true;
    }

    /// Discard every mutation of this transaction.
    pub fn rollback(mut self) {
        self.undo_all();
        self.finished = true;
    }

    fn undo_all(&mut self) {
        let count = self.journal.len();
        while let Some(undo) = self.journal.pop() {
            match undo {
                Undo::NodeCreated(id) => {
                    self.state.nodes.remove(&id);
                }
                Undo::NodeReplaced(previous) | Undo::NodeDeleted(previous) => {
                    self.state.nodes.insert(previous.id, previous);
                }
                Undo::RelationshipCreated(id) => {
                    self.state.remove_relationship(id);
                }
                Undo::RelationshipReplaced(previous) | Undo::RelationshipDeleted(previous) => {
                    self.state.remove_relationship(previous.id);
                    self.state.insert_relationship(previous);
                }
            }
        }
        tracing::debug!(mutations = count, "Transaction rolled back");
    }

    fn require_node(&self, id: NodeId) -> Result<(), GraphError> {
        if self.state.nodes.contains_key(&id) {
            Ok(())
        } else {
            Err(GraphError::NodeNotFound(id))
        }
    }

    fn delete_relationship_by_id(&mut self, id: RelationshipId) {
        if let Some(rel) = self.state.remove_relationship(id) {
            self.journal.push(Undo::RelationshipDeleted(rel));
        }
    }
}

impl Drop for MemoryTransaction<'_> {
    fn drop(&mut self) {
        if !self.finished {
            self.undo_all();
        }
    }
}

impl GraphSession for MemoryTransaction<'_> {
    fn create_node(
        &mut self,
        label: &str,
        properties: serde_json::Value,
    ) -> Result<NodeId, GraphError> {
        let id = NodeId::new();
        self.state.nodes.insert(
            id,
            NodeRecord {
                id,
                label: label.to_string(),
                properties,
            },
        );
        self.journal.push(Undo::NodeCreated(id));
        Ok(id)
    }

    fn update_node(
        &mut self,
        id: NodeId,
        properties: serde_json::Value,
    ) -> Result<(), GraphError> {
        let node = self
            .state
            .nodes
            .get_mut(&id)
            .ok_or(GraphError::NodeNotFound(id))?;
        let previous = node.clone();
        node.properties = properties;
        self.journal.push(Undo::NodeReplaced(previous));
        Ok(())
    }

    fn get_node(&mut self, id: NodeId) -> Result<Option<NodeRecord>, GraphError> {
        Ok(self.state.nodes.get(&id).cloned())
    }

    fn delete_node(&mut self, id: NodeId) -> Result<(), GraphError> {
        self.require_node(id)?;

        let attached: Vec<RelationshipId> = self
            .state
            .adjacent(id, Direction::Outgoing)
            .chain(self.state.adjacent(id, Direction::Incoming))
            .map(|rel| rel.id)
            .collect();
        for rel_id in attached {
            self.delete_relationship_by_id(rel_id);
        }

        if let Some(node) = self.state.nodes.remove(&id) {
            self.journal.push(Undo::NodeDeleted(node));
        }
        Ok(())
    }

    fn create_relationship(
        &mut self,
        rel_type: &str,
        direction: Direction,
        from: NodeId,
        to: NodeId,
    ) -> Result<RelationshipRecord, GraphError> {
        self.require_node(from)?;
        self.require_node(to)?;

        let (start, end) = direction.endpoints(from, to);
        let rel = RelationshipRecord {
            id: RelationshipId::new(),
            rel_type: rel_type.to_string(),
            start,
            end,
            properties: serde_json::Value::Object(serde_json::Map::new()),
        };
        self.state.insert_relationship(rel.clone());
        self.journal.push(Undo::RelationshipCreated(rel.id));
        Ok(rel)
    }

    fn delete_relationship(
        &mut self,
        rel_type: &str,
        direction: Direction,
        from: NodeId,
        to: NodeId,
    ) -> Result<bool, GraphError> {
        let doomed: Vec<RelationshipId> = self
            .state
            .adjacent(from, direction)
            .filter(|rel| rel.rel_type == rel_type && rel.other_node(from) == to)
            .map(|rel| rel.id)
            .collect();

        let deleted = !doomed.is_empty();
        for rel_id in doomed {
            self.delete_relationship_by_id(rel_id);
        }
        Ok(deleted)
    }

    fn find_relationships(
        &mut self,
        rel_type: &str,
        direction: Direction,
        from: NodeId,
    ) -> Result<Vec<RelationshipRecord>, GraphError> {
        Ok(self
            .state
            .adjacent(from, direction)
            .filter(|rel| rel.rel_type == rel_type)
            .cloned()
            .collect())
    }

    fn get_relationship(
        &mut self,
        id: RelationshipId,
    ) -> Result<Option<RelationshipRecord>, GraphError> {
        Ok(self.state.relationships.get(&id).cloned())
    }

    fn set_relationship_properties(
        &mut self,
        id: RelationshipId,
        properties: serde_json::Value,
    ) -> Result<(), GraphError> {
        let rel = self
            .state
            .relationships
            .get_mut(&id)
            .ok_or(GraphError::RelationshipNotFound(id))?;
        let previous = rel.clone();
        rel.properties = properties;
        self.journal.push(Undo::RelationshipReplaced(previous));
        Ok(())
    }
}
