use crate::{
    error::RuntimeError,
    execution::{executor::ConvergenceExecutor, report::ConvergenceReport},
};
use connectors::memory::MemorySchema;
use engine_core::settings::EngineSettings;
use model::definition::TableDefinition;
use serde::Serialize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Waits on objects outside the planned definitions can never resolve
/// against an empty schema, so planning always bounds them.
const PLAN_WAIT_TIMEOUT_MS: u64 = 500;

/// An empty schema never changes between attempts, so one is enough.
const PLAN_RETRY_BUDGET: usize = 1;

#[derive(Debug, Clone, Serialize)]
pub struct DryRunPlan {
    /// DDL in the order an empty database would receive it.
    pub statements: Vec<String>,
    pub report: ConvergenceReport,
}

/// Converges the definitions against an empty in-memory schema and returns
/// the statements that were issued.
pub async fn plan(
    definitions: Vec<TableDefinition>,
    settings: &EngineSettings,
) -> Result<DryRunPlan, RuntimeError> {
    let schema = Arc::new(MemorySchema::new());
    let settings = EngineSettings {
        wait_timeout_ms: Some(settings.wait_timeout_ms.unwrap_or(PLAN_WAIT_TIMEOUT_MS)),
        ..settings.clone()
    };

    let report = ConvergenceExecutor::new(schema.clone(), settings, CancellationToken::new())
        .with_retry_budget(PLAN_RETRY_BUDGET)
        .execute(definitions)
        .await?;

    Ok(DryRunPlan {
        statements: schema.statements().await,
        report,
    })
}
