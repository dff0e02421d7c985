//! Typed facade over the association managers.
//!
//! The mapper resolves `(entity type, field)` against its registry, checks
//! that the Rust types on both ends match the descriptor, and delegates to
//! [`crate::single`], [`crate::multi`] or [`crate::relationship`]. It never
//! opens or closes transactions: every call runs inside the session it is
//! handed.

use std::sync::Arc;

use ogm_core::config::OgmConfig;
use ogm_core::NodeId;
use ogm_graph::GraphSession;

use crate::entity::{self, node_of, NodeEntity};
use crate::error::{MappingError, Result};
use crate::guard;
use crate::multi::{self, ReplaceSummary};
use crate::registry::MappingRegistry;
use crate::relationship::{self, RelationshipEntity};
use crate::resolver::AssociationDescriptor;
use crate::single;
use crate::view::ManagedSet;

#[derive(Debug, Clone)]
pub struct Mapper {
    registry: Arc<MappingRegistry>,
}

impl Mapper {
    pub fn new(registry: impl Into<Arc<MappingRegistry>>) -> Self {
        Self {
            registry: registry.into(),
        }
    }

    /// Build from the mapping definitions file named in configuration.
    pub fn from_config(config: &OgmConfig) -> Result<Self> {
        let path = config.mapping.definitions.as_deref().ok_or_else(|| {
            MappingError::Configuration("mapping.definitions is not set".to_string())
        })?;
        Ok(Self::new(MappingRegistry::from_file(path)?))
    }

    pub fn registry(&self) -> &MappingRegistry {
        &self.registry
    }

    /// The descriptor for a field declared on `O`.
    pub fn descriptor<O: NodeEntity>(&self, field: &str) -> Result<&AssociationDescriptor> {
        self.registry.resolve(O::TYPE_NAME, field)
    }

    // ── Entity lifecycle ──────────────────────────────────────────────

    pub fn persist<S, E>(&self, session: &mut S, entity: &mut E) -> Result<NodeId>
    where
        S: GraphSession + ?Sized,
        E: NodeEntity,
    {
        entity::persist(session, entity)
    }

    pub fn materialize<S, E>(&self, session: &mut S, node: NodeId) -> Result<E>
    where
        S: GraphSession + ?Sized,
        E: NodeEntity,
    {
        entity::materialize(session, node)
    }

    pub fn remove<S, E>(&self, session: &mut S, entity: &E) -> Result<()>
    where
        S: GraphSession + ?Sized,
        E: NodeEntity,
    {
        entity::remove(session, entity)
    }

    // ── Single-valued ─────────────────────────────────────────────────

    pub fn get_single<S, O, T>(&self, session: &mut S, owner: &O, field: &str) -> Result<Option<T>>
    where
        S: GraphSession + ?Sized,
        O: NodeEntity,
        T: NodeEntity,
    {
        let descriptor = self.descriptor::<O>(field)?;
        single::get(session, node_of(owner)?, descriptor)
    }

    /// Assign a single-valued field. `None` clears it.
    pub fn set_single<S, O, T>(
        &self,
        session: &mut S,
        owner: &O,
        field: &str,
        target: Option<&T>,
    ) -> Result<()>
    where
        S: GraphSession + ?Sized,
        O: NodeEntity,
        T: NodeEntity,
    {
        let descriptor = self.descriptor::<O>(field)?;
        guard::check_type(&descriptor.target_type, T::TYPE_NAME)?;
        let owner = node_of(owner)?;
        let target = target.map(node_of).transpose()?;
        single::set(session, owner, descriptor, target)
    }

    // ── Multi-valued ──────────────────────────────────────────────────

    /// A live view of a collection field.
    pub fn collection<'a, S, O, T>(
        &'a self,
        session: &'a mut S,
        owner: &O,
        field: &str,
    ) -> Result<ManagedSet<'a, S, T>>
    where
        S: GraphSession + ?Sized,
        O: NodeEntity,
        T: NodeEntity,
    {
        let descriptor = self.descriptor::<O>(field)?;
        guard::check_type(&descriptor.target_type, T::TYPE_NAME)?;
        guard::check_read(descriptor, ogm_core::Cardinality::Many)?;
        Ok(ManagedSet::new(session, node_of(owner)?, descriptor))
    }

    /// Assign a whole collection field. Refused on read-only fields.
    pub fn replace_all<'e, S, O, T>(
        &self,
        session: &mut S,
        owner: &O,
        field: &str,
        targets: impl IntoIterator<Item = &'e T>,
    ) -> Result<ReplaceSummary>
    where
        S: GraphSession + ?Sized,
        O: NodeEntity,
        T: NodeEntity + 'e,
    {
        let descriptor = self.descriptor::<O>(field)?;
        guard::check_type(&descriptor.target_type, T::TYPE_NAME)?;
        let owner = node_of(owner)?;
        let targets = targets
            .into_iter()
            .map(node_of)
            .collect::<Result<Vec<NodeId>>>()?;
        multi::replace_all(session, owner, descriptor, &targets)
    }

    // ── Relationship entities ─────────────────────────────────────────

    /// Relate `owner` to `target` through a relationship-entity field.
    pub fn relate<S, O, T, R>(
        &self,
        session: &mut S,
        owner: &O,
        field: &str,
        target: &T,
        entity: R,
    ) -> Result<R>
    where
        S: GraphSession + ?Sized,
        O: NodeEntity,
        T: NodeEntity,
        R: RelationshipEntity,
    {
        let descriptor = self.descriptor::<O>(field)?;
        if let Some(end_type) = &descriptor.end_type {
            guard::check_type(end_type, T::TYPE_NAME)?;
        }
        relationship::relate(session, node_of(owner)?, descriptor, node_of(target)?, entity)
    }

    pub fn relationship_entities<S, O, R>(
        &self,
        session: &mut S,
        owner: &O,
        field: &str,
    ) -> Result<Vec<R>>
    where
        S: GraphSession + ?Sized,
        O: NodeEntity,
        R: RelationshipEntity,
    {
        let descriptor = self.descriptor::<O>(field)?;
        relationship::relationship_entities(session, node_of(owner)?, descriptor)
    }

    pub fn save_relationship<S, R>(&self, session: &mut S, entity: &R) -> Result<()>
    where
        S: GraphSession + ?Sized,
        R: RelationshipEntity,
    {
        relationship::save(session, entity)
    }
}
