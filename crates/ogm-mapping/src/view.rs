//! Managed collection view over a multi-valued association.
//!
//! A [`ManagedSet`] holds no members of its own. Every read goes to the
//! session and every write is delegated to [`crate::multi`], so the view
//! always agrees with the graph inside the caller's transaction.

use std::collections::HashSet;
use std::hash::Hash;
use std::marker::PhantomData;

use ogm_core::NodeId;
use ogm_graph::GraphSession;

use crate::entity::{materialize, node_of, NodeEntity};
use crate::error::Result;
use crate::multi::{self, ReplaceSummary};
use crate::resolver::AssociationDescriptor;

/// Live, set-like view of the entities related to `owner` through one field.
pub struct ManagedSet<'a, S: GraphSession + ?Sized, T> {
    session: &'a mut S,
    owner: NodeId,
    descriptor: &'a AssociationDescriptor,
    _entity: PhantomData<fn() -> T>,
}

impl<'a, S, T> ManagedSet<'a, S, T>
where
    S: GraphSession + ?Sized,
    T: NodeEntity,
{
    /// Callers are expected to have checked `T` against the descriptor's
    /// target type; [`crate::Mapper::collection`] does.
    pub fn new(session: &'a mut S, owner: NodeId, descriptor: &'a AssociationDescriptor) -> Self {
        Self {
            session,
            owner,
            descriptor,
            _entity: PhantomData,
        }
    }

    pub fn descriptor(&self) -> &AssociationDescriptor {
        self.descriptor
    }

    pub fn owner(&self) -> NodeId {
        self.owner
    }

    /// Read-only views still accept `add` and `remove`; only
    /// [`replace_all`](Self::replace_all) is refused.
    pub fn is_read_only(&self) -> bool {
        self.descriptor.read_only
    }

    /// Returns `false` if `entity` was already a member.
    pub fn add(&mut self, entity: &T) -> Result<bool> {
        let target = node_of(entity)?;
        multi::add(self.session, self.owner, self.descriptor, target)
    }

    /// Returns `false` if `entity` was not a member.
    pub fn remove(&mut self, entity: &T) -> Result<bool> {
        let target = node_of(entity)?;
        multi::remove(self.session, self.owner, self.descriptor, target)
    }

    /// An unpersisted entity is never a member.
    pub fn contains(&mut self, entity: &T) -> Result<bool> {
        match entity.persistent_state() {
            Some(node) => Ok(self.node_ids()?.contains(&node)),
            None => Ok(false),
        }
    }

    pub fn len(&mut self) -> Result<usize> {
        Ok(multi::members(self.session, self.owner, self.descriptor)?.len())
    }

    pub fn is_empty(&mut self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    pub fn node_ids(&mut self) -> Result<HashSet<NodeId>> {
        Ok(multi::members(self.session, self.owner, self.descriptor)?
            .into_iter()
            .collect())
    }

    /// Materialize every member. Order is not meaningful.
    pub fn to_vec(&mut self) -> Result<Vec<T>> {
        let members = multi::members(self.session, self.owner, self.descriptor)?;
        members
            .into_iter()
            .map(|node| materialize(self.session, node))
            .collect()
    }

    pub fn to_set(&mut self) -> Result<HashSet<T>>
    where
        T: Eq + Hash,
    {
        Ok(self.to_vec()?.into_iter().collect())
    }

    /// Remove every member.
    pub fn clear(&mut self) -> Result<ReplaceSummary> {
        multi::replace_all(self.session, self.owner, self.descriptor, &[])
    }

    /// Make the members exactly `entities`. All of them must be persisted.
    pub fn replace_all<'e>(
        &mut self,
        entities: impl IntoIterator<Item = &'e T>,
    ) -> Result<ReplaceSummary>
    where
        T: 'e,
    {
        let targets = entities
            .into_iter()
            .map(node_of)
            .collect::<Result<Vec<NodeId>>>()?;
        multi::replace_all(self.session, self.owner, self.descriptor, &targets)
    }
}

#[cfg(test)]
mod tests {
    use ogm_graph::MemoryGraph;
    use serde::{Deserialize, Serialize};

    use super::*;
    use crate::definition::{FieldDefinition, RelatedTo};
    use crate::entity::persist;
    use crate::error::{MappingError, Violation};
    use crate::resolver::resolve_field;

    #[derive(Debug, Serialize, Deserialize)]
    struct Member {
        #[serde(skip)]
        node: Option<NodeId>,
        name: String,
    }

    impl NodeEntity for Member {
        const TYPE_NAME: &'static str = "Member";

        fn persistent_state(&self) -> Option<NodeId> {
            self.node
        }

        fn attach(&mut self, node: NodeId) {
            self.node = Some(node);
        }
    }

    impl PartialEq for Member {
        fn eq(&self, other: &Self) -> bool {
            self.node == other.node
        }
    }

    impl Eq for Member {}

    impl Hash for Member {
        fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
            self.node.hash(state);
        }
    }

    fn member(tx: &mut impl GraphSession, name: &str) -> Member {
        let mut m = Member {
            node: None,
            name: name.to_string(),
        };
        persist(tx, &mut m).unwrap();
        m
    }

    fn members_field(shape: fn(&str, &str) -> FieldDefinition) -> AssociationDescriptor {
        resolve_field(
            "Club",
            &shape("members", "Member").related_to(RelatedTo::named("member_of").incoming()),
        )
        .unwrap()
    }

    #[test]
    fn test_view_reads_through_and_writes_through() {
        let graph = MemoryGraph::new();
        let mut tx = graph.begin().unwrap();
        let club = tx.create_node("Club", serde_json::json!({})).unwrap();
        let (x, y) = (member(&mut tx, "x"), member(&mut tx, "y"));
        let d = members_field(FieldDefinition::set);

        let mut view: ManagedSet<'_, _, Member> = ManagedSet::new(&mut tx, club, &d);
        assert!(view.is_empty().unwrap());
        assert!(view.add(&x).unwrap());
        assert!(view.add(&y).unwrap());
        assert!(!view.add(&x).unwrap());
        assert_eq!(view.len().unwrap(), 2);
        assert!(view.contains(&y).unwrap());

        let names: HashSet<String> = view.to_vec().unwrap().into_iter().map(|m| m.name).collect();
        assert_eq!(names, HashSet::from(["x".to_string(), "y".to_string()]));

        assert!(view.remove(&y).unwrap());
        assert!(!view.remove(&y).unwrap());
        assert_eq!(view.to_set().unwrap(), HashSet::from([x]));
    }

    #[test]
    fn test_unpersisted_entity() {
        let graph = MemoryGraph::new();
        let mut tx = graph.begin().unwrap();
        let club = tx.create_node("Club", serde_json::json!({})).unwrap();
        let d = members_field(FieldDefinition::set);
        let loose = Member {
            node: None,
            name: "loose".to_string(),
        };

        let mut view: ManagedSet<'_, _, Member> = ManagedSet::new(&mut tx, club, &d);
        assert!(!view.contains(&loose).unwrap());
        assert!(matches!(
            view.add(&loose),
            Err(MappingError::NotPersisted { .. })
        ));
    }

    #[test]
    fn test_read_only_view_refuses_replace_all_only() {
        let graph = MemoryGraph::new();
        let mut tx = graph.begin().unwrap();
        let club = tx.create_node("Club", serde_json::json!({})).unwrap();
        let (x, y) = (member(&mut tx, "x"), member(&mut tx, "y"));
        let d = members_field(FieldDefinition::iterable);

        let mut view: ManagedSet<'_, _, Member> = ManagedSet::new(&mut tx, club, &d);
        assert!(view.is_read_only());
        view.add(&x).unwrap();

        let err = view.replace_all([&y]).unwrap_err();
        assert!(matches!(
            err,
            MappingError::InvalidAssociation {
                violation: Violation::ReadOnlyReplace,
                ..
            }
        ));
        assert!(matches!(
            view.clear(),
            Err(MappingError::InvalidAssociation { .. })
        ));
        assert_eq!(view.node_ids().unwrap(), HashSet::from([x.node.unwrap()]));
    }

    #[test]
    fn test_clear_and_replace_all() {
        let graph = MemoryGraph::new();
        let mut tx = graph.begin().unwrap();
        let club = tx.create_node("Club", serde_json::json!({})).unwrap();
        let (x, y) = (member(&mut tx, "x"), member(&mut tx, "y"));
        let d = members_field(FieldDefinition::set);

        let mut view: ManagedSet<'_, _, Member> = ManagedSet::new(&mut tx, club, &d);
        let summary = view.replace_all([&x, &y]).unwrap();
        assert_eq!(summary.added, 2);

        let summary = view.clear().unwrap();
        assert_eq!(summary.removed, 2);
        assert!(view.is_empty().unwrap());
    }
}
