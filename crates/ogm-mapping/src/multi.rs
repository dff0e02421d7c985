//! Multi-valued associations: one relationship per (owner, target) pair.
//!
//! Collection reads always go to the session, so they reflect every
//! relationship of the descriptor's type and direction touching the owner,
//! including ones created outside the mapper.

use std::collections::HashSet;

use ogm_core::{Cardinality, NodeId};
use ogm_graph::GraphSession;

use crate::error::Result;
use crate::guard::{self, Operation};
use crate::resolver::AssociationDescriptor;

/// What a [`replace_all`] changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplaceSummary {
    pub added: usize,
    pub removed: usize,
    pub retained: usize,
}

/// Distinct far-end nodes of the owner's relationships, in store order.
pub fn members<S>(
    session: &mut S,
    owner: NodeId,
    descriptor: &AssociationDescriptor,
) -> Result<Vec<NodeId>>
where
    S: GraphSession + ?Sized,
{
    guard::check_read(descriptor, Cardinality::Many)?;
    let rels =
        session.find_relationships(&descriptor.relationship_type, descriptor.direction, owner)?;

    let mut seen = HashSet::with_capacity(rels.len());
    Ok(rels
        .iter()
        .map(|rel| rel.other_node(owner))
        .filter(|node| seen.insert(*node))
        .collect())
}

/// Relate `target` to the owner unless the pair is already related.
/// Returns whether a relationship was created.
pub fn add<S>(
    session: &mut S,
    owner: NodeId,
    descriptor: &AssociationDescriptor,
    target: NodeId,
) -> Result<bool>
where
    S: GraphSession + ?Sized,
{
    guard::validate(owner, descriptor, Operation::Add, Some(target))?;

    if members(session, owner, descriptor)?.contains(&target) {
        return Ok(false);
    }

    session.create_relationship(
        &descriptor.relationship_type,
        descriptor.direction,
        owner,
        target,
    )?;
    tracing::debug!(
        rel_type = %descriptor.relationship_type,
        owner = %owner,
        target = %target,
        "Added collection member"
    );
    Ok(true)
}

/// Unrelate `target` from the owner. Returns whether it was a member.
pub fn remove<S>(
    session: &mut S,
    owner: NodeId,
    descriptor: &AssociationDescriptor,
    target: NodeId,
) -> Result<bool>
where
    S: GraphSession + ?Sized,
{
    guard::validate(owner, descriptor, Operation::Remove, Some(target))?;

    let removed = session.delete_relationship(
        &descriptor.relationship_type,
        descriptor.direction,
        owner,
        target,
    )?;
    if removed {
        tracing::debug!(
            rel_type = %descriptor.relationship_type,
            owner = %owner,
            target = %target,
            "Removed collection member"
        );
    }
    Ok(removed)
}

/// Make the owner's collection exactly `targets`.
///
/// Only the difference is applied: relationships to retained targets are
/// left untouched. Every target is validated before anything is mutated.
pub fn replace_all<S>(
    session: &mut S,
    owner: NodeId,
    descriptor: &AssociationDescriptor,
    targets: &[NodeId],
) -> Result<ReplaceSummary>
where
    S: GraphSession + ?Sized,
{
    for target in targets {
        guard::validate(owner, descriptor, Operation::ReplaceAll, Some(*target))?;
    }
    // An empty replacement still has to pass the read-only check.
    guard::validate(owner, descriptor, Operation::ReplaceAll, None)?;

    let desired: HashSet<NodeId> = targets.iter().copied().collect();
    let current = members(session, owner, descriptor)?;
    let current_set: HashSet<NodeId> = current.iter().copied().collect();

    let mut summary = ReplaceSummary::default();

    for node in current.iter().filter(|n| !desired.contains(n)) {
        session.delete_relationship(
            &descriptor.relationship_type,
            descriptor.direction,
            owner,
            *node,
        )?;
        summary.removed += 1;
    }

    let mut added = HashSet::new();
    for node in targets {
        if current_set.contains(node) {
            continue;
        }
        if added.insert(*node) {
            session.create_relationship(
                &descriptor.relationship_type,
                descriptor.direction,
                owner,
                *node,
            )?;
            summary.added += 1;
        }
    }

    summary.retained = current_set.intersection(&desired).count();

    tracing::debug!(
        rel_type = %descriptor.relationship_type,
        owner = %owner,
        added = summary.added,
        removed = summary.removed,
        retained = summary.retained,
        "Replaced collection"
    );
    Ok(summary)
}
