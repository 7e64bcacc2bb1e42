use connectors::error::AdapterError;
use engine_config::error::ConfigError;
use engine_runtime::error::RuntimeError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to connect to the database: {0}")]
    Adapter(#[from] AdapterError),

    #[error("Failed to run convergence: {0}")]
    Runtime(#[from] RuntimeError),

    #[error("Failed to write output: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize data to JSON: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    #[error("{0} table(s) failed to converge")]
    TablesFailed(usize),

    #[error("Shutdown requested")]
    ShutdownRequested,
}
