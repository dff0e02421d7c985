//! Relationship descriptor resolution.
//!
//! Turns a declared field into the canonical relationship type, direction
//! and cardinality it maps to. Pure: no graph access.

use ogm_core::{Cardinality, Direction};
use serde::Serialize;

use crate::definition::{FieldDefinition, FieldShape};
use crate::error::{MappingError, Result};

/// Resolved, immutable metadata for one association field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssociationDescriptor {
    pub declaring_type: String,
    pub field: String,
    pub target_type: String,
    pub relationship_type: String,
    pub direction: Direction,
    pub cardinality: Cardinality,
    pub read_only: bool,
    pub annotated_on_field: bool,
    pub allow_self_reference: bool,
    pub relationship_entity: bool,
    /// Node type at the far end, for relationship-entity fields only.
    pub end_type: Option<String>,
}

impl AssociationDescriptor {
    pub fn is_single(&self) -> bool {
        self.cardinality == Cardinality::One
    }
}

/// Resolve one field declared on `declaring_type`.
///
/// The relationship type is the explicit name when one is given, otherwise
/// `"<DeclaringType>.<field>"`. Direction defaults to outgoing.
pub fn resolve_field(declaring_type: &str, field: &FieldDefinition) -> Result<AssociationDescriptor> {
    let context = || format!("{declaring_type}.{}", field.name);

    if field.name.is_empty() {
        return Err(MappingError::Configuration(format!(
            "{declaring_type} declares a field without a name"
        )));
    }

    let cardinality = match field.shape {
        FieldShape::Single => Cardinality::One,
        FieldShape::Set | FieldShape::Iterable => Cardinality::Many,
    };

    let related = field.related_to.clone().unwrap_or_default();

    if let Some(declared) = related.cardinality {
        if declared != cardinality {
            return Err(MappingError::Configuration(format!(
                "{}: declared cardinality {declared} contradicts {:?} field shape",
                context(),
                field.shape
            )));
        }
    }

    if let Some(element) = &related.element_type {
        if element != &field.target {
            return Err(MappingError::Configuration(format!(
                "{}: element type {element} contradicts target {}",
                context(),
                field.target
            )));
        }
    }

    if field.relationship_entity && field.shape != FieldShape::Iterable {
        return Err(MappingError::Configuration(format!(
            "{}: relationship entity fields must be iterable",
            context()
        )));
    }

    if field.end_type.is_some() && !field.relationship_entity {
        return Err(MappingError::Configuration(format!(
            "{}: end type only applies to relationship entity fields",
            context()
        )));
    }

    let end_type = field.relationship_entity.then(|| {
        field
            .end_type
            .clone()
            .unwrap_or_else(|| declaring_type.to_string())
    });

    let relationship_type = match related.rel_type {
        Some(name) if name.trim().is_empty() => {
            return Err(MappingError::Configuration(format!(
                "{}: explicit relationship type is empty",
                context()
            )));
        }
        Some(name) => name,
        None => context(),
    };

    Ok(AssociationDescriptor {
        declaring_type: declaring_type.to_string(),
        field: field.name.clone(),
        target_type: field.target.clone(),
        relationship_type,
        direction: related.direction.unwrap_or_default(),
        cardinality,
        read_only: field.shape == FieldShape::Iterable || field.relationship_entity,
        annotated_on_field: field.related_to.is_some(),
        allow_self_reference: field.allow_self_reference,
        relationship_entity: field.relationship_entity,
        end_type,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::RelatedTo;

    #[test]
    fn test_unannotated_field_synthesizes_type() {
        let d = resolve_field("Person", &FieldDefinition::single("spouse", "Person")).unwrap();
        assert_eq!(d.relationship_type, "Person.spouse");
        assert_eq!(d.direction, Direction::Outgoing);
        assert_eq!(d.cardinality, Cardinality::One);
        assert!(!d.annotated_on_field);
        assert!(!d.read_only);
        assert!(d.is_single());
    }

    #[test]
    fn test_annotation_without_name_still_synthesizes() {
        let field = FieldDefinition::single("mother", "Person").related_to(RelatedTo::default());
        let d = resolve_field("Person", &field).unwrap();
        assert_eq!(d.relationship_type, "Person.mother");
        assert!(d.annotated_on_field);
    }

    #[test]
    fn test_explicit_name_and_direction_used_verbatim() {
        let field =
            FieldDefinition::single("boss", "Person").related_to(RelatedTo::named("boss").incoming());
        let d = resolve_field("Person", &field).unwrap();
        assert_eq!(d.relationship_type, "boss");
        assert_eq!(d.direction, Direction::Incoming);
    }

    #[test]
    fn test_iterable_is_read_only() {
        let set = resolve_field("Group", &FieldDefinition::set("persons", "Person")).unwrap();
        assert_eq!(set.cardinality, Cardinality::Many);
        assert!(!set.read_only);

        let iterable =
            resolve_field("Group", &FieldDefinition::iterable("readOnlyPersons", "Person")).unwrap();
        assert_eq!(iterable.cardinality, Cardinality::Many);
        assert!(iterable.read_only);
    }

    #[test]
    fn test_relationship_entity_field() {
        let field = FieldDefinition::iterable("friendships", "Friendship")
            .related_to(RelatedTo::named("knows"))
            .relationship_entity();
        let d = resolve_field("Person", &field).unwrap();
        assert!(d.relationship_entity);
        assert!(d.read_only);
        assert_eq!(d.relationship_type, "knows");
        assert_eq!(d.end_type.as_deref(), Some("Person"));

        let member_of = FieldDefinition::iterable("memberships", "Membership")
            .relationship_entity()
            .with_end_type("Group");
        let d = resolve_field("Person", &member_of).unwrap();
        assert_eq!(d.end_type.as_deref(), Some("Group"));
    }

    #[test]
    fn test_end_type_on_plain_field_rejected() {
        let field = FieldDefinition::set("persons", "Person").with_end_type("Group");
        assert!(matches!(
            resolve_field("Group", &field),
            Err(MappingError::Configuration(_))
        ));
        let plain = resolve_field("Group", &FieldDefinition::set("persons", "Person")).unwrap();
        assert!(plain.end_type.is_none());
    }

    #[test]
    fn test_conflicting_cardinality_rejected() {
        let field = FieldDefinition::single("persons", "Person")
            .related_to(RelatedTo::named("persons").with_cardinality(Cardinality::Many));
        let err = resolve_field("Group", &field).unwrap_err();
        assert!(matches!(err, MappingError::Configuration(_)));
    }

    #[test]
    fn test_conflicting_element_type_rejected() {
        let field = FieldDefinition::set("persons", "Person")
            .related_to(RelatedTo::named("persons").with_element_type("Group"));
        assert!(matches!(
            resolve_field("Group", &field),
            Err(MappingError::Configuration(_))
        ));
    }

    #[test]
    fn test_empty_relationship_name_rejected() {
        let field = FieldDefinition::single("spouse", "Person").related_to(RelatedTo::named("  "));
        assert!(matches!(
            resolve_field("Person", &field),
            Err(MappingError::Configuration(_))
        ));
    }

    #[test]
    fn test_assignable_relationship_entity_rejected() {
        let field = FieldDefinition::set("friendships", "Friendship").relationship_entity();
        assert!(matches!(
            resolve_field("Person", &field),
            Err(MappingError::Configuration(_))
        ));
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let field = FieldDefinition::set("persons", "Person");
        assert_eq!(
            resolve_field("Group", &field).unwrap(),
            resolve_field("Group", &field).unwrap()
        );
    }
}
