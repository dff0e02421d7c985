//! The descriptor table: every association of every entity, resolved once.
//!
//! A [`MappingRegistry`] is built at startup from entity definitions and is
//! immutable afterwards, so it can be shared across threads behind an `Arc`.

use std::collections::{BTreeMap, HashMap};

use crate::definition::{load_definitions, EntityDefinition, EntityKind};
use crate::error::{MappingError, Result};
use crate::resolver::{resolve_field, AssociationDescriptor};

/// Immutable table from (entity type, field name) to association descriptor.
#[derive(Debug, Default)]
pub struct MappingRegistry {
    kinds: HashMap<String, EntityKind>,
    descriptors: HashMap<String, BTreeMap<String, AssociationDescriptor>>,
}

/// Collects entity definitions before validation.
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    definitions: Vec<EntityDefinition>,
}

impl RegistryBuilder {
    pub fn entity(mut self, definition: EntityDefinition) -> Self {
        self.definitions.push(definition);
        self
    }

    pub fn build(self) -> Result<MappingRegistry> {
        MappingRegistry::from_definitions(self.definitions)
    }
}

impl MappingRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Load definitions from a TOML/JSON file and build the registry.
    pub fn from_file(path: &str) -> Result<Self> {
        Self::from_definitions(load_definitions(path)?)
    }

    /// Resolve and cross-check every field of every definition.
    pub fn from_definitions(definitions: impl IntoIterator<Item = EntityDefinition>) -> Result<Self> {
        let definitions: Vec<EntityDefinition> = definitions.into_iter().collect();

        let mut kinds = HashMap::with_capacity(definitions.len());
        for def in &definitions {
            if def.name.is_empty() {
                return Err(MappingError::Configuration(
                    "entity definition without a name".to_string(),
                ));
            }
            if kinds.insert(def.name.clone(), def.kind).is_some() {
                return Err(MappingError::Configuration(format!(
                    "entity {} is defined more than once",
                    def.name
                )));
            }
        }

        let mut descriptors = HashMap::with_capacity(definitions.len());
        for def in &definitions {
            if def.kind == EntityKind::Relationship && !def.fields.is_empty() {
                return Err(MappingError::Configuration(format!(
                    "relationship entity {} cannot declare association fields",
                    def.name
                )));
            }

            let mut fields = BTreeMap::new();
            for field in &def.fields {
                let descriptor = resolve_field(&def.name, field)?;
                check_target(&descriptor, &kinds)?;
                check_coherence(&descriptor, fields.values())?;
                if fields.insert(field.name.clone(), descriptor).is_some() {
                    return Err(MappingError::Configuration(format!(
                        "{}.{} is declared more than once",
                        def.name, field.name
                    )));
                }
            }
            descriptors.insert(def.name.clone(), fields);
        }

        let registry = Self { kinds, descriptors };
        tracing::info!(
            entities = registry.kinds.len(),
            associations = registry.len(),
            "Mapping registry built"
        );
        Ok(registry)
    }

    /// Look up the descriptor for `entity_type.field`.
    pub fn resolve(&self, entity_type: &str, field: &str) -> Result<&AssociationDescriptor> {
        self.descriptors
            .get(entity_type)
            .and_then(|fields| fields.get(field))
            .ok_or_else(|| MappingError::UnknownField {
                entity_type: entity_type.to_string(),
                field: field.to_string(),
            })
    }

    pub fn kind_of(&self, entity_type: &str) -> Option<EntityKind> {
        self.kinds.get(entity_type).copied()
    }

    /// All descriptors declared on one entity type, ordered by field name.
    pub fn fields_of(&self, entity_type: &str) -> impl Iterator<Item = &AssociationDescriptor> {
        self.descriptors
            .get(entity_type)
            .into_iter()
            .flat_map(|fields| fields.values())
    }

    /// All descriptors, ordered by entity type then field name.
    pub fn descriptors(&self) -> Vec<&AssociationDescriptor> {
        let mut all: Vec<&AssociationDescriptor> =
            self.descriptors.values().flat_map(|f| f.values()).collect();
        all.sort_by(|a, b| {
            (a.declaring_type.as_str(), a.field.as_str())
                .cmp(&(b.declaring_type.as_str(), b.field.as_str()))
        });
        all
    }

    /// Number of association descriptors.
    pub fn len(&self) -> usize {
        self.descriptors.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The field's target must be a defined type of the matching kind.
fn check_target(
    descriptor: &AssociationDescriptor,
    kinds: &HashMap<String, EntityKind>,
) -> Result<()> {
    let expected = if descriptor.relationship_entity {
        EntityKind::Relationship
    } else {
        EntityKind::Node
    };

    check_kind(descriptor, &descriptor.target_type, expected, kinds)?;
    if let Some(end_type) = &descriptor.end_type {
        check_kind(descriptor, end_type, EntityKind::Node, kinds)?;
    }
    Ok(())
}

fn check_kind(
    descriptor: &AssociationDescriptor,
    type_name: &str,
    expected: EntityKind,
    kinds: &HashMap<String, EntityKind>,
) -> Result<()> {
    match kinds.get(type_name) {
        None => Err(MappingError::Configuration(format!(
            "{}.{} targets undefined type {}",
            descriptor.declaring_type, descriptor.field, type_name
        ))),
        Some(kind) if *kind != expected => Err(MappingError::Configuration(format!(
            "{}.{} targets {} which is a {:?} entity, expected {:?}",
            descriptor.declaring_type, descriptor.field, type_name, kind, expected
        ))),
        Some(_) => Ok(()),
    }
}

/// Fields of one type sharing a relationship type and direction must agree
/// on cardinality, or they would fight over the same relationships.
fn check_coherence<'a>(
    descriptor: &AssociationDescriptor,
    siblings: impl Iterator<Item = &'a AssociationDescriptor>,
) -> Result<()> {
    for other in siblings {
        if other.relationship_type == descriptor.relationship_type
            && other.direction == descriptor.direction
            && other.cardinality != descriptor.cardinality
        {
            return Err(MappingError::Configuration(format!(
                "{}.{} and {}.{} map {} {} with conflicting cardinality",
                descriptor.declaring_type,
                descriptor.field,
                other.declaring_type,
                other.field,
                descriptor.direction,
                descriptor.relationship_type
            )));
        }
    }
    Ok(())
}
