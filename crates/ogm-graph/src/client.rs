//! Neo4j connection management and the Neo4j-backed graph session.

use neo4rs::{ConfigBuilder, Graph, Query, Txn};
use tokio::runtime::Runtime;

use ogm_core::config::Neo4jSettings;
use ogm_core::{Direction, NodeId, NodeRecord, RelationshipId, RelationshipRecord};

use crate::session::GraphSession;

/// Errors from graph operations.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    #[error("Neo4j connection error: {0}")]
    Connection(String),

    #[error("Neo4j query error: {0}")]
    Query(#[from] neo4rs::Error),

    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    #[error("Relationship not found: {0}")]
    RelationshipNotFound(RelationshipId),

    #[error("Expected at most one {rel_type} relationship on node {node}, found {count}")]
    NotSingle {
        rel_type: String,
        node: NodeId,
        count: usize,
    },

    #[error("Transaction already finished")]
    TransactionClosed,

    #[error("Graph store lock poisoned")]
    LockPoisoned,

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Configuration for connecting to Neo4j.
#[derive(Debug, Clone)]
pub struct GraphConfig {
    pub uri: String,
    pub user: String,
    pub password: String,
    pub database: Option<String>,
    pub max_connections: u32,
    pub fetch_size: usize,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Neo4jSettings::default().into()
    }
}

impl From<Neo4jSettings> for GraphConfig {
    fn from(settings: Neo4jSettings) -> Self {
        Self {
            uri: settings.uri,
            user: settings.user,
            password: settings.password,
            database: settings.database,
            max_connections: settings.max_connections,
            fetch_size: settings.fetch_size,
        }
    }
}

/// Neo4j-backed graph store.
///
/// Owns a dedicated Tokio runtime so sessions can be driven synchronously.
/// Do not call into a store from inside another async runtime.
pub struct Neo4jStore {
    runtime: Runtime,
    graph: Graph,
}

impl Neo4jStore {
    /// Connect to Neo4j with the given configuration.
    pub fn connect(config: &GraphConfig) -> Result<Self, GraphError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| GraphError::Connection(e.to_string()))?;

        let mut builder = ConfigBuilder::default()
            .uri(&config.uri)
            .user(&config.user)
            .password(&config.password)
            .max_connections(config.max_connections as usize)
            .fetch_size(config.fetch_size);
        if let Some(db) = &config.database {
            builder = builder.db(db.as_str());
        }
        let neo_config = builder
            .build()
            .map_err(|e| GraphError::Connection(e.to_string()))?;

        let graph = runtime
            .block_on(Graph::connect(neo_config))
            .map_err(|e| GraphError::Connection(e.to_string()))?;

        tracing::info!(uri = %config.uri, "Connected to Neo4j");
        Ok(Self { runtime, graph })
    }

    /// Begin a transaction. The caller decides whether to commit or roll back.
    pub fn begin(&self) -> Result<Neo4jTransaction<'_>, GraphError> {
        let txn = self.runtime.block_on(self.graph.start_txn())?;
        Ok(Neo4jTransaction {
            runtime: &self.runtime,
            txn: Some(txn),
        })
    }
}

/// A graph session bound to one open Neo4j transaction.
///
/// Dropping it without calling [`commit`](Self::commit) rolls the transaction back.
pub struct Neo4jTransaction<'a> {
    runtime: &'a Runtime,
    txn: Option<Txn>,
}

impl Neo4jTransaction<'_> {
    pub fn commit(mut self) -> Result<(), GraphError> {
        let txn = self.txn.take().ok_or(GraphError::TransactionClosed)?;
        self.runtime.block_on(txn.commit())?;
        tracing::debug!("Transaction committed");
        Ok(())
    }

    pub fn rollback(mut self) -> Result<(), GraphError> {
        let txn = self.txn.take().ok_or(GraphError::TransactionClosed)?;
        self.runtime.block_on(txn.rollback())?;
        tracing::debug!("Transaction rolled back");
        Ok(())
    }

    /// Execute a write-only statement (CREATE, MERGE, DELETE, SET).
    pub(crate) fn run(&mut self, query: Query) -> Result<(), GraphError> {
        let txn = self.txn.as_mut().ok_or(GraphError::TransactionClosed)?;
        self.runtime.block_on(txn.run(query))?;
        Ok(())
    }

    /// Execute a statement and collect all rows.
    pub(crate) fn query_rows(&mut self, query: Query) -> Result<Vec<neo4rs::Row>, GraphError> {
        let txn = self.txn.as_mut().ok_or(GraphError::TransactionClosed)?;
        self.runtime.block_on(async {
            let mut stream = txn.execute(query).await?;
            let mut rows = Vec::new();
            while let Some(row) = stream.next(txn.handle()).await? {
                rows.push(row);
            }
            Ok::<_, GraphError>(rows)
        })
    }
}

impl Drop for Neo4jTransaction<'_> {
    fn drop(&mut self) {
        if let Some(txn) = self.txn.take() {
            if let Err(e) = self.runtime.block_on(txn.rollback()) {
                tracing::warn!(error = %e, "Rollback of abandoned transaction failed");
            }
        }
    }
}

impl GraphSession for Neo4jTransaction<'_> {
    fn create_node(
        &mut self,
        label: &str,
        properties: serde_json::Value,
    ) -> Result<NodeId, GraphError> {
        self.insert_node(label, &properties)
    }

    fn update_node(
        &mut self,
        id: NodeId,
        properties: serde_json::Value,
    ) -> Result<(), GraphError> {
        self.write_node(id, &properties)
    }

    fn get_node(&mut self, id: NodeId) -> Result<Option<NodeRecord>, GraphError> {
        self.fetch_node(id)
    }

    fn delete_node(&mut self, id: NodeId) -> Result<(), GraphError> {
        self.detach_delete(id)
    }

    fn create_relationship(
        &mut self,
        rel_type: &str,
        direction: Direction,
        from: NodeId,
        to: NodeId,
    ) -> Result<RelationshipRecord, GraphError> {
        let (start, end) = direction.endpoints(from, to);
        self.insert_relationship(rel_type, start, end)
    }

    fn delete_relationship(
        &mut self,
        rel_type: &str,
        direction: Direction,
        from: NodeId,
        to: NodeId,
    ) -> Result<bool, GraphError> {
        let (start, end) = direction.endpoints(from, to);
        Ok(self.remove_relationships(rel_type, start, end)? > 0)
    }

    fn find_relationships(
        &mut self,
        rel_type: &str,
        direction: Direction,
        from: NodeId,
    ) -> Result<Vec<RelationshipRecord>, GraphError> {
        self.fetch_relationships(rel_type, direction, from)
    }

    fn get_relationship(
        &mut self,
        id: RelationshipId,
    ) -> Result<Option<RelationshipRecord>, GraphError> {
        self.fetch_relationship(id)
    }

    fn set_relationship_properties(
        &mut self,
        id: RelationshipId,
        properties: serde_json::Value,
    ) -> Result<(), GraphError> {
        self.write_relationship(id, &properties)
    }
}
