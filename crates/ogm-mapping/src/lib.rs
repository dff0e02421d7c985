//! Association synchronization between mapped entities and graph relationships.
//!
//! Entity fields are declared as data ([`definition`]), resolved once into
//! [`AssociationDescriptor`]s held by a [`MappingRegistry`], and kept in sync
//! with the relationships of a [`ogm_graph::GraphSession`]:
//!
//! - single-valued fields map to at most one relationship ([`single`]);
//! - collection fields map to one relationship per member ([`multi`]),
//!   exposed as a live [`ManagedSet`];
//! - relationship-entity fields carry typed properties on each relationship
//!   ([`relationship`]).
//!
//! Every mutation is validated by the [`guard`] before the graph is touched.
//! Transactions belong to the caller.

pub mod definition;
pub mod entity;
pub mod error;
pub mod guard;
pub mod mapper;
pub mod multi;
pub mod registry;
pub mod relationship;
pub mod resolver;
pub mod single;
pub mod view;

pub use definition::{EntityDefinition, EntityKind, FieldDefinition, FieldShape, RelatedTo};
pub use entity::NodeEntity;
pub use error::{MappingError, Result, Violation};
pub use guard::Operation;
pub use mapper::Mapper;
pub use multi::ReplaceSummary;
pub use registry::{MappingRegistry, RegistryBuilder};
pub use relationship::{RelationshipEntity, RelationshipState};
pub use resolver::AssociationDescriptor;
pub use view::ManagedSet;
