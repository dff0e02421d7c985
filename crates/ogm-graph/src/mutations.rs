//! Write operations issued by a Neo4j session.
//!
//! Nodes and relationships are identified by an `ogm_id` property holding
//! their UUID. Entity properties travel as JSON maps and are expanded
//! server-side with APOC.

use neo4rs::query;

use ogm_core::{NodeId, RelationshipId, RelationshipRecord};

use crate::client::{GraphError, Neo4jTransaction};

/// Property key carrying the mapper's identity on nodes and relationships.
pub(crate) const ID_KEY: &str = "ogm_id";

impl Neo4jTransaction<'_> {
    // ── Nodes ────────────────────────────────────────────────────

    pub(crate) fn insert_node(
        &mut self,
        label: &str,
        properties: &serde_json::Value,
    ) -> Result<NodeId, GraphError> {
        let id = NodeId::new();
        let label = escape_identifier(label);
        let cypher = format!(
            "CREATE (n:{label} {{{ID_KEY}: $id}})
             SET n += apoc.convert.fromJsonMap($props)"
        );

        let q = query(&cypher)
            .param("id", id.0.to_string())
            .param("props", to_json(properties)?);

        self.run(q)?;
        tracing::debug!(node = %id, "Node created");
        Ok(id)
    }

    pub(crate) fn write_node(
        &mut self,
        id: NodeId,
        properties: &serde_json::Value,
    ) -> Result<(), GraphError> {
        let cypher = format!(
            "MATCH (n {{{ID_KEY}: $id}})
             SET n = apoc.convert.fromJsonMap($props)
             SET n.{ID_KEY} = $id
             RETURN count(n) AS cnt"
        );

        let q = query(&cypher)
            .param("id", id.0.to_string())
            .param("props", to_json(properties)?);

        if self.count(q)? == 0 {
            return Err(GraphError::NodeNotFound(id));
        }
        Ok(())
    }

    pub(crate) fn detach_delete(&mut self, id: NodeId) -> Result<(), GraphError> {
        let cypher = format!(
            "MATCH (n {{{ID_KEY}: $id}})
             DETACH DELETE n
             RETURN count(n) AS cnt"
        );

        let q = query(&cypher).param("id", id.0.to_string());

        if self.count(q)? == 0 {
            return Err(GraphError::NodeNotFound(id));
        }
        tracing::debug!(node = %id, "Node deleted");
        Ok(())
    }

    // ── Relationships ────────────────────────────────────────────

    pub(crate) fn insert_relationship(
        &mut self,
        rel_type: &str,
        start: NodeId,
        end: NodeId,
    ) -> Result<RelationshipRecord, GraphError> {
        let id = RelationshipId::new();
        let escaped = escape_identifier(rel_type);
        let cypher = format!(
            "MATCH (a {{{ID_KEY}: $start}}), (b {{{ID_KEY}: $end}})
             CREATE (a)-[r:{escaped} {{{ID_KEY}: $id}}]->(b)
             RETURN count(r) AS cnt"
        );

        let q = query(&cypher)
            .param("start", start.0.to_string())
            .param("end", end.0.to_string())
            .param("id", id.0.to_string());

        if self.count(q)? == 0 {
            return Err(GraphError::NodeNotFound(start));
        }

        tracing::debug!(rel_type, start = %start, end = %end, "Relationship created");
        Ok(RelationshipRecord {
            id,
            rel_type: rel_type.to_string(),
            start,
            end,
            properties: serde_json::Value::Object(serde_json::Map::new()),
        })
    }

    /// Delete all `rel_type` relationships from `start` to `end`.
    /// Returns the number deleted.
    pub(crate) fn remove_relationships(
        &mut self,
        rel_type: &str,
        start: NodeId,
        end: NodeId,
    ) -> Result<i64, GraphError> {
        let escaped = escape_identifier(rel_type);
        let cypher = format!(
            "MATCH (a {{{ID_KEY}: $start}})-[r:{escaped}]->(b {{{ID_KEY}: $end}})
             DELETE r
             RETURN count(r) AS cnt"
        );

        let q = query(&cypher)
            .param("start", start.0.to_string())
            .param("end", end.0.to_string());

        let deleted = self.count(q)?;
        if deleted > 0 {
            tracing::debug!(rel_type, start = %start, end = %end, deleted, "Relationship deleted");
        }
        Ok(deleted)
    }

    pub(crate) fn write_relationship(
        &mut self,
        id: RelationshipId,
        properties: &serde_json::Value,
    ) -> Result<(), GraphError> {
        let cypher = format!(
            "MATCH ()-[r {{{ID_KEY}: $id}}]->()
             SET r = apoc.convert.fromJsonMap($props)
             SET r.{ID_KEY} = $id
             RETURN count(r) AS cnt"
        );

        let q = query(&cypher)
            .param("id", id.0.to_string())
            .param("props", to_json(properties)?);

        if self.count(q)? == 0 {
            return Err(GraphError::RelationshipNotFound(id));
        }
        Ok(())
    }

    /// Run a statement returning a single `cnt` column.
    fn count(&mut self, q: neo4rs::Query) -> Result<i64, GraphError> {
        let rows = self.query_rows(q)?;
        Ok(rows
            .first()
            .and_then(|row| row.get::<i64>("cnt").ok())
            .unwrap_or(0))
    }
}

// ── Helpers ──────────────────────────────────────────────────────

/// Quote a label or relationship type for interpolation into Cypher.
pub(crate) fn escape_identifier(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

fn to_json(properties: &serde_json::Value) -> Result<String, GraphError> {
    let map = match properties {
        serde_json::Value::Null => serde_json::Value::Object(serde_json::Map::new()),
        serde_json::Value::Object(_) => properties.clone(),
        other => {
            return Err(GraphError::Serialization(format!(
                "Properties must be a JSON object, got {other}"
            )))
        }
    };
    serde_json::to_string(&map).map_err(|e| GraphError::Serialization(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_identifier() {
        assert_eq!(escape_identifier("Person.spouse"), "`Person.spouse`");
        assert_eq!(escape_identifier("odd`name"), "`odd``name`");
    }

    #[test]
    fn test_to_json_accepts_objects_and_null() {
        assert_eq!(to_json(&serde_json::json!({"age": 35})).unwrap(), "{\"age\":35}");
        assert_eq!(to_json(&serde_json::Value::Null).unwrap(), "{}");
        assert!(to_json(&serde_json::json!([1, 2])).is_err());
    }
}
