//! Read operations issued by a Neo4j session.

use neo4rs::query;
use uuid::Uuid;

use ogm_core::{Direction, NodeId, NodeRecord, RelationshipId, RelationshipRecord};

use crate::client::{GraphError, Neo4jTransaction};
use crate::mutations::{escape_identifier, ID_KEY};

impl Neo4jTransaction<'_> {
    pub(crate) fn fetch_node(&mut self, id: NodeId) -> Result<Option<NodeRecord>, GraphError> {
        let cypher = format!(
            "MATCH (n {{{ID_KEY}: $id}})
             RETURN labels(n) AS labels, apoc.convert.toJson(properties(n)) AS props"
        );

        let q = query(&cypher).param("id", id.0.to_string());

        match self.query_rows(q)?.first() {
            Some(row) => {
                let labels: Vec<String> = row.get("labels").unwrap_or_default();
                let props: String = row.get("props").map_err(|e| {
                    GraphError::Serialization(format!("Failed to read node properties: {e}"))
                })?;
                Ok(Some(NodeRecord {
                    id,
                    label: labels.first().cloned().unwrap_or_default(),
                    properties: parse_properties(&props)?,
                }))
            }
            None => Ok(None),
        }
    }

    pub(crate) fn fetch_relationships(
        &mut self,
        rel_type: &str,
        direction: Direction,
        from: NodeId,
    ) -> Result<Vec<RelationshipRecord>, GraphError> {
        let escaped = escape_identifier(rel_type);
        let pattern = match direction {
            Direction::Outgoing => format!("(a {{{ID_KEY}: $node}})-[r:{escaped}]->(b)"),
            Direction::Incoming => format!("(a {{{ID_KEY}: $node}})<-[r:{escaped}]-(b)"),
        };
        let cypher = format!("MATCH {pattern} {RETURN_RELATIONSHIP}");

        let q = query(&cypher).param("node", from.0.to_string());

        self.query_rows(q)?.iter().map(row_to_relationship).collect()
    }

    pub(crate) fn fetch_relationship(
        &mut self,
        id: RelationshipId,
    ) -> Result<Option<RelationshipRecord>, GraphError> {
        let cypher = format!("MATCH ()-[r {{{ID_KEY}: $id}}]->() {RETURN_RELATIONSHIP}");

        let q = query(&cypher).param("id", id.0.to_string());

        match self.query_rows(q)?.first() {
            Some(row) => Ok(Some(row_to_relationship(row)?)),
            None => Ok(None),
        }
    }
}

const RETURN_RELATIONSHIP: &str = "RETURN r.ogm_id AS id, type(r) AS rel_type,
        startNode(r).ogm_id AS start, endNode(r).ogm_id AS end,
        apoc.convert.toJson(properties(r)) AS props";

fn row_to_relationship(row: &neo4rs::Row) -> Result<RelationshipRecord, GraphError> {
    let column = |key: &str| -> Result<String, GraphError> {
        row.get::<String>(key).map_err(|e| {
            GraphError::Serialization(format!("Failed to read relationship column {key}: {e}"))
        })
    };

    Ok(RelationshipRecord {
        id: RelationshipId(parse_uuid(&column("id")?)?),
        rel_type: column("rel_type")?,
        start: NodeId(parse_uuid(&column("start")?)?),
        end: NodeId(parse_uuid(&column("end")?)?),
        properties: parse_properties(&column("props")?)?,
    })
}

fn parse_uuid(raw: &str) -> Result<Uuid, GraphError> {
    Uuid::parse_str(raw).map_err(|e| GraphError::Serialization(format!("Invalid id {raw}: {e}")))
}

/// Decode a JSON property map, dropping the mapper's identity key.
fn parse_properties(raw: &str) -> Result<serde_json::Value, GraphError> {
    let mut value: serde_json::Value =
        serde_json::from_str(raw).map_err(|e| GraphError::Serialization(e.to_string()))?;
    if let Some(map) = value.as_object_mut() {
        map.remove(ID_KEY);
    }
    Ok(value)
}
