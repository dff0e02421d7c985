//! Single-valued associations: at most one relationship per owner.

use ogm_core::{Cardinality, NodeId};
use ogm_graph::GraphSession;

use crate::entity::{materialize, NodeEntity};
use crate::error::Result;
use crate::guard::{self, Operation};
use crate::resolver::AssociationDescriptor;

/// The far-end node of the owner's relationship, if one exists.
pub fn target_of<S>(
    session: &mut S,
    owner: NodeId,
    descriptor: &AssociationDescriptor,
) -> Result<Option<NodeId>>
where
    S: GraphSession + ?Sized,
{
    guard::check_read(descriptor, Cardinality::One)?;
    let rel = session.find_relationship(&descriptor.relationship_type, descriptor.direction, owner)?;
    Ok(rel.map(|r| r.other_node(owner)))
}

/// The entity at the far end of the owner's relationship. Never mutates.
pub fn get<S, T>(
    session: &mut S,
    owner: NodeId,
    descriptor: &AssociationDescriptor,
) -> Result<Option<T>>
where
    S: GraphSession + ?Sized,
    T: NodeEntity,
{
    guard::check_type(&descriptor.target_type, T::TYPE_NAME)?;
    match target_of(session, owner, descriptor)? {
        Some(node) => Ok(Some(materialize(session, node)?)),
        None => Ok(None),
    }
}

/// Point the association at `target`, or clear it with `None`.
///
/// Any existing relationship to a different node is deleted first, so at
/// most one survives. A relationship already pointing at `target` is kept.
pub fn set<S>(
    session: &mut S,
    owner: NodeId,
    descriptor: &AssociationDescriptor,
    target: Option<NodeId>,
) -> Result<()>
where
    S: GraphSession + ?Sized,
{
    guard::validate(owner, descriptor, Operation::Set, target)?;

    let rel_type = descriptor.relationship_type.as_str();
    let existing = session.find_relationships(rel_type, descriptor.direction, owner)?;

    let mut to_target = 0;
    let mut stale: Vec<NodeId> = Vec::new();
    for rel in existing {
        let far_end = rel.other_node(owner);
        if Some(far_end) == target {
            to_target += 1;
        } else if !stale.contains(&far_end) {
            stale.push(far_end);
        }
    }

    for far_end in stale {
        session.delete_relationship(rel_type, descriptor.direction, owner, far_end)?;
        tracing::debug!(
            rel_type,
            owner = %owner,
            previous = %far_end,
            "Replaced single-valued relationship"
        );
    }

    if let Some(target) = target {
        if to_target > 1 {
            session.delete_relationship(rel_type, descriptor.direction, owner, target)?;
            to_target = 0;
        }
        if to_target == 0 {
            session.create_relationship(rel_type, descriptor.direction, owner, target)?;
            tracing::debug!(rel_type, owner = %owner, target = %target, "Set single-valued relationship");
        }
    }

    Ok(())
}
