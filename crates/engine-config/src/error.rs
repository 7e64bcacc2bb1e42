use crate::report::finding::Finding;
use model::error::DefinitionError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading or validating a convergence configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config document: {0}")]
    Parse(#[from] serde_json::Error),

    /// A table definition failed construction-time validation.
    #[error("Invalid definition for table `{table}`: {source}")]
    Definition {
        table: String,
        #[source]
        source: DefinitionError,
    },

    #[error("Table `{0}` is defined more than once")]
    DuplicateTable(String),

    #[error("Invalid settings: {0}")]
    InvalidSettings(String),

    #[error("No tables defined")]
    NoTables,

    #[error("No connection URL: set connection.url, DATABASE_URL or --conn-str")]
    MissingConnection,

    /// Cross-table checks found definitions that can never converge.
    #[error("Configuration has {} blocking issue(s): {}", .0.len(), describe(.0))]
    Validation(Vec<Finding>),
}

fn describe(findings: &[Finding]) -> String {
    findings
        .iter()
        .map(|finding| finding.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}
