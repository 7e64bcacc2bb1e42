use crate::error::CliError;
use connectors::adapter::Adapter;
use tracing::{error, info};

/// Connects to `conn_str` and runs a trivial query.
pub async fn ping(conn_str: &str) -> Result<(), CliError> {
    info!("Pinging database at '{conn_str}'");

    let adapter = Adapter::connect(conn_str).await.inspect_err(|e| {
        error!("Connection to '{conn_str}' failed: {e}");
    })?;
    adapter.ping().await.inspect_err(|e| {
        error!("Ping query on '{conn_str}' failed: {e}");
    })?;

    info!("Ping to '{conn_str}' succeeded");
    Ok(())
}
