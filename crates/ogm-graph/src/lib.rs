//! OGM Graph: the graph session boundary.
//!
//! Every node and relationship the mapper reads or writes flows through a
//! [`GraphSession`], which always represents one caller-owned transaction.
//! Two stores hand out sessions: [`MemoryGraph`] for embedded use and tests,
//! and [`Neo4jStore`] for a live Neo4j server.

pub mod client;
pub mod memory;
pub mod mutations;
pub mod queries;
pub mod session;

pub use client::{GraphConfig, GraphError, Neo4jStore, Neo4jTransaction};
pub use memory::{MemoryGraph, MemoryTransaction};
pub use session::GraphSession;
