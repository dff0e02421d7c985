//! Configuration management for OGM services.
//!
//! Configuration is loaded from (in priority order):
//! 1. Environment variables (OGM__ prefix, `__` separator)
//! 2. Config file (ogm.toml)
//! 3. Defaults

use serde::Deserialize;

use crate::error::OgmError;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OgmConfig {
    #[serde(default)]
    pub neo4j: Neo4jSettings,

    #[serde(default)]
    pub mapping: MappingSettings,
}

/// Connection settings for the Neo4j-backed graph store.
#[derive(Debug, Clone, Deserialize)]
pub struct Neo4jSettings {
    #[serde(default = "default_uri")]
    pub uri: String,

    #[serde(default = "default_user")]
    pub user: String,

    #[serde(default = "default_password")]
    pub password: String,

    /// Target database name; the server default when unset.
    #[serde(default)]
    pub database: Option<String>,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    #[serde(default = "default_fetch_size")]
    pub fetch_size: usize,
}

/// Where entity mapping definitions come from.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MappingSettings {
    /// Path to a TOML/JSON file of entity definitions.
    #[serde(default)]
    pub definitions: Option<String>,
}

fn default_uri() -> String {
    "bolt://localhost:7687".to_string()
}

fn default_user() -> String {
    "neo4j".to_string()
}

fn default_password() -> String {
    "neo4j".to_string()
}

fn default_max_connections() -> u32 {
    16
}

fn default_fetch_size() -> usize {
    256
}

impl Default for Neo4jSettings {
    fn default() -> Self {
        Self {
            uri: default_uri(),
            user: default_user(),
            password: default_password(),
            database: None,
            max_connections: default_max_connections(),
            fetch_size: default_fetch_size(),
        }
    }
}

impl OgmConfig {
    /// Load configuration from `{file_prefix}.toml` (optional) and `OGM__*` variables.
    pub fn load(file_prefix: &str) -> Result<Self, OgmError> {
        let cfg = config::Config::builder()
            .add_source(config::File::with_name(file_prefix).required(false))
            .add_source(
                config::Environment::with_prefix("OGM")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let loaded: OgmConfig = cfg.try_deserialize()?;
        tracing::debug!(
            uri = %loaded.neo4j.uri,
            definitions = ?loaded.mapping.definitions,
            "Configuration loaded"
        );
        Ok(loaded)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_default_config() {
        let config = OgmConfig::default();
        assert_eq!(config.neo4j.uri, "bolt://localhost:7687");
        assert_eq!(config.neo4j.user, "neo4j");
        assert_eq!(config.neo4j.max_connections, 16);
        assert_eq!(config.neo4j.fetch_size, 256);
        assert!(config.neo4j.database.is_none());
        assert!(config.mapping.definitions.is_none());
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let config = OgmConfig::load("does-not-exist-ogm").unwrap();
        assert_eq!(config.neo4j.fetch_size, 256);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[neo4j]\nuri = \"bolt://graph:7687\"\ndatabase = \"people\"\n\n[mapping]\ndefinitions = \"mapping.toml\""
        )
        .unwrap();

        let path = file.path().to_str().unwrap().to_string();
        let config = OgmConfig::load(&path).unwrap();

        assert_eq!(config.neo4j.uri, "bolt://graph:7687");
        assert_eq!(config.neo4j.database.as_deref(), Some("people"));
        assert_eq!(config.neo4j.user, "neo4j");
        assert_eq!(config.mapping.definitions.as_deref(), Some("mapping.toml"));
    }
}
