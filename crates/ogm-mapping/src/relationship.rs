//! Relationship entities: typed values stored on a relationship's properties.
//!
//! They are reached through a read-only iterable field flagged
//! `relationship_entity`. New ones are created with [`relate`]; the field
//! itself can never be assigned.

use ogm_core::{NodeId, RelationshipId, RelationshipRecord};
use ogm_graph::GraphSession;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{MappingError, Result};
use crate::guard::{self, Operation};
use crate::resolver::AssociationDescriptor;

/// Where a relationship entity lives in the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RelationshipState {
    pub id: RelationshipId,
    pub start: NodeId,
    pub end: NodeId,
}

impl From<&RelationshipRecord> for RelationshipState {
    fn from(record: &RelationshipRecord) -> Self {
        Self {
            id: record.id,
            start: record.start,
            end: record.end,
        }
    }
}

/// A domain type mapped onto relationship properties.
pub trait RelationshipEntity: Serialize + DeserializeOwned {
    const TYPE_NAME: &'static str;

    fn relationship_state(&self) -> Option<RelationshipState>;

    fn attach(&mut self, state: RelationshipState);
}

/// Relate `owner` to `target` and store `entity` on the relationship.
///
/// At most one relationship exists per pair: an existing one is reused and
/// its properties overwritten.
pub fn relate<S, R>(
    session: &mut S,
    owner: NodeId,
    descriptor: &AssociationDescriptor,
    target: NodeId,
    mut entity: R,
) -> Result<R>
where
    S: GraphSession + ?Sized,
    R: RelationshipEntity,
{
    guard::validate(owner, descriptor, Operation::Relate, Some(target))?;
    guard::check_type(&descriptor.target_type, R::TYPE_NAME)?;

    let properties = serde_json::to_value(&entity)?;

    let existing = session
        .find_relationships(&descriptor.relationship_type, descriptor.direction, owner)?
        .into_iter()
        .find(|rel| rel.other_node(owner) == target);

    let record = match existing {
        Some(record) => record,
        None => {
            let record = session.create_relationship(
                &descriptor.relationship_type,
                descriptor.direction,
                owner,
                target,
            )?;
            tracing::debug!(
                rel_type = %descriptor.relationship_type,
                owner = %owner,
                target = %target,
                "Relationship entity created"
            );
            record
        }
    };

    session.set_relationship_properties(record.id, properties)?;
    entity.attach(RelationshipState::from(&record));
    Ok(entity)
}

/// Every relationship entity reachable from `owner` through `descriptor`.
pub fn relationship_entities<S, R>(
    session: &mut S,
    owner: NodeId,
    descriptor: &AssociationDescriptor,
) -> Result<Vec<R>>
where
    S: GraphSession + ?Sized,
    R: RelationshipEntity,
{
    guard::check_relationship_entity(descriptor)?;
    guard::check_type(&descriptor.target_type, R::TYPE_NAME)?;

    session
        .find_relationships(&descriptor.relationship_type, descriptor.direction, owner)?
        .into_iter()
        .map(|record| -> Result<R> {
            let state = RelationshipState::from(&record);
            let mut entity: R = serde_json::from_value(record.properties)?;
            entity.attach(state);
            Ok(entity)
        })
        .collect()
}

/// Write a relationship entity's current properties back to its relationship.
pub fn save<S, R>(session: &mut S, entity: &R) -> Result<()>
where
    S: GraphSession + ?Sized,
    R: RelationshipEntity,
{
    let state = entity
        .relationship_state()
        .ok_or_else(|| MappingError::NotPersisted {
            entity_type: R::TYPE_NAME.to_string(),
        })?;
    session.set_relationship_properties(state.id, serde_json::to_value(entity)?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use ogm_core::Direction;
    use ogm_graph::MemoryGraph;
    use serde::Deserialize;

    use super::*;
    use crate::definition::{FieldDefinition, RelatedTo};
    use crate::error::Violation;
    use crate::resolver::resolve_field;

    #[derive(Debug, Serialize, Deserialize)]
    struct Friendship {
        #[serde(skip)]
        state: Option<RelationshipState>,
        years: u32,
    }

    impl RelationshipEntity for Friendship {
        const TYPE_NAME: &'static str = "Friendship";

        fn relationship_state(&self) -> Option<RelationshipState> {
            self.state
        }

        fn attach(&mut self, state: RelationshipState) {
            self.state = Some(state);
        }
    }

    fn friendship(years: u32) -> Friendship {
        Friendship { state: None, years }
    }

    fn friendships() -> AssociationDescriptor {
        resolve_field(
            "Person",
            &FieldDefinition::iterable("friendships", "Friendship")
                .related_to(RelatedTo::named("knows"))
                .relationship_entity(),
        )
        .unwrap()
    }

    fn node(tx: &mut impl GraphSession) -> NodeId {
        tx.create_node("Person", serde_json::json!({})).unwrap()
    }

    #[test]
    fn test_relate_stores_properties() {
        let graph = MemoryGraph::new();
        let mut tx = graph.begin().unwrap();
        let (michael, david) = (node(&mut tx), node(&mut tx));

        let f = relate(&mut tx, michael, &friendships(), david, friendship(2)).unwrap();
        let state = f.relationship_state().unwrap();
        assert_eq!((state.start, state.end), (michael, david));

        let rel = tx.get_relationship(state.id).unwrap().unwrap();
        assert_eq!(rel.rel_type, "knows");
        assert_eq!(rel.properties["years"], 2);
    }

    #[test]
    fn test_relate_reuses_pair() {
        let graph = MemoryGraph::new();
        let mut tx = graph.begin().unwrap();
        let (michael, david) = (node(&mut tx), node(&mut tx));
        let d = friendships();

        let first = relate(&mut tx, michael, &d, david, friendship(2)).unwrap();
        let second = relate(&mut tx, michael, &d, david, friendship(5)).unwrap();
        assert_eq!(first.state, second.state);

        let all: Vec<Friendship> = relationship_entities(&mut tx, michael, &d).unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].years, 5);
    }

    #[test]
    fn test_save_and_read_back() {
        let graph = MemoryGraph::new();
        let mut tx = graph.begin().unwrap();
        let (michael, david) = (node(&mut tx), node(&mut tx));
        let d = friendships();

        let mut f = relate(&mut tx, michael, &d, david, friendship(2)).unwrap();
        f.years = 3;
        save(&mut tx, &f).unwrap();

        let all: Vec<Friendship> = relationship_entities(&mut tx, michael, &d).unwrap();
        assert_eq!(all[0].years, 3);
        assert_eq!(all[0].state, f.state);

        assert!(matches!(
            save(&mut tx, &friendship(1)),
            Err(MappingError::NotPersisted { .. })
        ));
    }

    #[test]
    fn test_relate_on_plain_field_rejected() {
        let graph = MemoryGraph::new();
        let mut tx = graph.begin().unwrap();
        let (a, b) = (node(&mut tx), node(&mut tx));
        let spouse = resolve_field("Person", &FieldDefinition::single("spouse", "Person")).unwrap();

        let err = relate(&mut tx, a, &spouse, b, friendship(1)).unwrap_err();
        assert!(matches!(
            err,
            MappingError::InvalidAssociation {
                violation: Violation::NotRelationshipEntity,
                ..
            }
        ));
        assert!(tx
            .find_relationships("Person.spouse", Direction::Outgoing, a)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_self_friendship_rejected() {
        let graph = MemoryGraph::new();
        let mut tx = graph.begin().unwrap();
        let a = node(&mut tx);

        let err = relate(&mut tx, a, &friendships(), a, friendship(1)).unwrap_err();
        assert!(matches!(
            err,
            MappingError::InvalidAssociation {
                violation: Violation::SelfReference,
                ..
            }
        ));
    }
}
