//! CLI entry point: validate mapping definitions and check Neo4j connectivity.

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

use ogm_core::config::OgmConfig;
use ogm_graph::{GraphConfig, Neo4jStore};
use ogm_mapping::MappingRegistry;

#[derive(Parser)]
#[command(name = "ogm")]
#[command(about = "Object-graph mapping toolkit")]
struct Cli {
    /// Config file prefix (default: ogm).
    #[arg(short, long, default_value = "ogm", global = true)]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve a mapping definitions file and print its association descriptors.
    Check {
        /// Definitions file; falls back to mapping.definitions in config.
        file: Option<String>,
    },
    /// Open and roll back a transaction against the configured Neo4j server.
    Ping,
}

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).json().with_writer(std::io::stderr).init();

    let cli = Cli::parse();
    let config = OgmConfig::load(&cli.config)?;

    match cli.command {
        Command::Check { file } => {
            let path = file
                .or(config.mapping.definitions)
                .ok_or_else(|| anyhow::anyhow!("No definitions file: pass one or set mapping.definitions"))?;
            println!("{}", check(&path)?);
        }
        Command::Ping => ping(&GraphConfig::from(config.neo4j))?,
    }

    Ok(())
}

/// Build the registry from `path` and render its descriptors as JSON.
fn check(path: &str) -> anyhow::Result<String> {
    let registry = MappingRegistry::from_file(path)?;
    tracing::info!(path, associations = registry.len(), "Mapping definitions valid");
    Ok(serde_json::to_string_pretty(&registry.descriptors())?)
}

fn ping(config: &GraphConfig) -> anyhow::Result<()> {
    let store = Neo4jStore::connect(config)?;
    let txn = store.begin()?;
    txn.rollback()?;
    tracing::info!(uri = %config.uri, "Neo4j reachable");
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_check() {
        let cli = Cli::try_parse_from(["ogm", "check", "mapping.toml"]).unwrap();
        assert_eq!(cli.config, "ogm");
        assert!(matches!(cli.command, Command::Check { file: Some(ref f) } if f == "mapping.toml"));

        let cli = Cli::try_parse_from(["ogm", "--config", "prod", "ping"]).unwrap();
        assert_eq!(cli.config, "prod");
        assert!(matches!(cli.command, Command::Ping));
    }

    #[test]
    fn test_check_renders_descriptors() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        write!(
            file,
            r#"
[[entities]]
name = "Person"

[[entities.fields]]
name = "spouse"
target = "Person"
"#
        )
        .unwrap();

        let json = check(file.path().to_str().unwrap()).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed[0]["relationship_type"], "Person.spouse");
        assert_eq!(parsed[0]["direction"], "OUTGOING");
        assert_eq!(parsed[0]["cardinality"], "ONE");
    }

    #[test]
    fn test_check_rejects_invalid_definitions() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        write!(
            file,
            r#"
[[entities]]
name = "Person"

[[entities.fields]]
name = "pet"
target = "Dog"
"#
        )
        .unwrap();

        assert!(check(file.path().to_str().unwrap()).is_err());
    }
}
