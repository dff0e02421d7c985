//! Structural validation run before every association mutation.
//!
//! Nothing here touches the graph, so a rejection always leaves the
//! caller's transaction exactly as it was.

use ogm_core::{Cardinality, NodeId};

use crate::error::{MappingError, Result, Violation};
use crate::resolver::AssociationDescriptor;

/// The kind of association mutation being attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Assign a single-valued association.
    Set,
    /// Add one member to a collection.
    Add,
    /// Remove one member from a collection.
    Remove,
    /// Assign a whole collection.
    ReplaceAll,
    /// Create a relationship entity.
    Relate,
}

/// Validate `operation` on `owner` against `descriptor`.
///
/// Checks, in order: self-reference, read-only bulk replacement, then that
/// the operation fits the association's cardinality and kind.
pub fn validate(
    owner: NodeId,
    descriptor: &AssociationDescriptor,
    operation: Operation,
    target: Option<NodeId>,
) -> Result<()> {
    let links = matches!(
        operation,
        Operation::Set | Operation::Add | Operation::ReplaceAll | Operation::Relate
    );
    if links && target == Some(owner) && !descriptor.allow_self_reference {
        return reject(descriptor, operation, Violation::SelfReference);
    }

    if operation == Operation::ReplaceAll && descriptor.read_only {
        return reject(descriptor, operation, Violation::ReadOnlyReplace);
    }

    if descriptor.relationship_entity && operation != Operation::Relate {
        return reject(descriptor, operation, Violation::RelationshipEntityField);
    }

    let coherent = match operation {
        Operation::Set => descriptor.cardinality == Cardinality::One,
        Operation::Add | Operation::Remove | Operation::ReplaceAll => {
            descriptor.cardinality == Cardinality::Many
        }
        Operation::Relate => {
            if !descriptor.relationship_entity {
                return reject(descriptor, operation, Violation::NotRelationshipEntity);
            }
            true
        }
    };
    if !coherent {
        return reject(descriptor, operation, Violation::CardinalityMismatch);
    }

    Ok(())
}

/// Check that a read fits the association's cardinality.
pub fn check_read(descriptor: &AssociationDescriptor, expected: Cardinality) -> Result<()> {
    if descriptor.cardinality != expected {
        return Err(invalid(descriptor, Violation::CardinalityMismatch));
    }
    Ok(())
}

/// Check that the association holds relationship entities.
pub fn check_relationship_entity(descriptor: &AssociationDescriptor) -> Result<()> {
    if !descriptor.relationship_entity {
        return Err(invalid(descriptor, Violation::NotRelationshipEntity));
    }
    Ok(())
}

/// Check that an entity type name matches what the descriptor expects.
pub fn check_type(expected: &str, found: &str) -> Result<()> {
    if expected != found {
        return Err(MappingError::TypeMismatch {
            expected: expected.to_string(),
            found: found.to_string(),
        });
    }
    Ok(())
}

fn reject(descriptor: &AssociationDescriptor, operation: Operation, violation: Violation) -> Result<()> {
    tracing::warn!(
        entity = %descriptor.declaring_type,
        field = %descriptor.field,
        ?operation,
        ?violation,
        "Association mutation rejected"
    );
    Err(invalid(descriptor, violation))
}

fn invalid(descriptor: &AssociationDescriptor, violation: Violation) -> MappingError {
    MappingError::InvalidAssociation {
        declaring_type: descriptor.declaring_type.clone(),
        field: descriptor.field.clone(),
        violation,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::{FieldDefinition, RelatedTo};
    use crate::resolver::resolve_field;

    fn violation_of(result: Result<()>) -> Violation {
        match result {
            Err(MappingError::InvalidAssociation { violation, .. }) => violation,
            other => panic!("expected InvalidAssociation, got {other:?}"),
        }
    }

    fn spouse() -> AssociationDescriptor {
        resolve_field("Person", &FieldDefinition::single("spouse", "Person")).unwrap()
    }

    fn persons() -> AssociationDescriptor {
        resolve_field("Group", &FieldDefinition::set("persons", "Person")).unwrap()
    }

    fn read_only_persons() -> AssociationDescriptor {
        resolve_field("Group", &FieldDefinition::iterable("readOnlyPersons", "Person")).unwrap()
    }

    fn friendships() -> AssociationDescriptor {
        let field = FieldDefinition::iterable("friendships", "Friendship")
            .related_to(RelatedTo::named("knows"))
            .relationship_entity();
        resolve_field("Person", &field).unwrap()
    }

    #[test]
    fn test_self_reference_rejected() {
        let owner = NodeId::new();
        let violation = violation_of(validate(owner, &spouse(), Operation::Set, Some(owner)));
        assert_eq!(violation, Violation::SelfReference);
    }

    #[test]
    fn test_self_reference_allowed_when_declared() {
        let owner = NodeId::new();
        let d = resolve_field(
            "Person",
            &FieldDefinition::single("self", "Person").allow_self_reference(),
        )
        .unwrap();
        assert!(validate(owner, &d, Operation::Set, Some(owner)).is_ok());
    }

    #[test]
    fn test_removing_self_is_not_a_self_reference() {
        let owner = NodeId::new();
        assert!(validate(owner, &persons(), Operation::Remove, Some(owner)).is_ok());
    }

    #[test]
    fn test_clearing_single_value_allowed() {
        assert!(validate(NodeId::new(), &spouse(), Operation::Set, None).is_ok());
    }

    #[test]
    fn test_read_only_replace_rejected() {
        let violation = violation_of(validate(
            NodeId::new(),
            &read_only_persons(),
            Operation::ReplaceAll,
            None,
        ));
        assert_eq!(violation, Violation::ReadOnlyReplace);
    }

    #[test]
    fn test_read_only_add_and_remove_allowed() {
        let owner = NodeId::new();
        let target = Some(NodeId::new());
        assert!(validate(owner, &read_only_persons(), Operation::Add, target).is_ok());
        assert!(validate(owner, &read_only_persons(), Operation::Remove, target).is_ok());
    }

    #[test]
    fn test_cardinality_mismatch_rejected() {
        let owner = NodeId::new();
        let target = Some(NodeId::new());
        assert_eq!(
            violation_of(validate(owner, &spouse(), Operation::Add, target)),
            Violation::CardinalityMismatch
        );
        assert_eq!(
            violation_of(validate(owner, &persons(), Operation::Set, target)),
            Violation::CardinalityMismatch
        );
        assert!(check_read(&spouse(), Cardinality::Many).is_err());
        assert!(check_read(&persons(), Cardinality::Many).is_ok());
    }

    #[test]
    fn test_relationship_entity_rules() {
        let owner = NodeId::new();
        let target = Some(NodeId::new());
        assert!(validate(owner, &friendships(), Operation::Relate, target).is_ok());
        assert_eq!(
            violation_of(validate(owner, &friendships(), Operation::Add, target)),
            Violation::RelationshipEntityField
        );
        assert_eq!(
            violation_of(validate(owner, &friendships(), Operation::ReplaceAll, None)),
            Violation::ReadOnlyReplace
        );
        assert_eq!(
            violation_of(validate(owner, &persons(), Operation::Relate, target)),
            Violation::NotRelationshipEntity
        );
        assert!(check_relationship_entity(&friendships()).is_ok());
        assert_eq!(
            violation_of(check_relationship_entity(&persons())),
            Violation::NotRelationshipEntity
        );
    }

    #[test]
    fn test_check_type() {
        assert!(check_type("Person", "Person").is_ok());
        assert!(matches!(
            check_type("Person", "Group"),
            Err(MappingError::TypeMismatch { .. })
        ));
    }
}
