use crate::{
    error::RuntimeError,
    execution::report::{ConvergenceReport, TableOutcome},
};
use connectors::sql::base::adapter::SchemaAdapter;
use engine_core::{
    event_bus::bus::{EventBus, Subscription},
    initializer::TableInitializer,
    settings::EngineSettings,
    waiter::DependencyWaiter,
};
use futures::future::join_all;
use model::{
    definition::TableDefinition,
    events::{InitializationEvent, InitializationEventKind},
};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

const EVENT_BUFFER: usize = 256;

/// Initializes every definition concurrently against `adapter`.
///
/// No ordering is imposed between tables; each initializer waits on the live
/// schema for what it needs. A table that fails does not stop the others.
pub async fn run(
    definitions: Vec<TableDefinition>,
    adapter: Arc<dyn SchemaAdapter>,
    settings: EngineSettings,
    cancel: CancellationToken,
) -> Result<ConvergenceReport, RuntimeError> {
    ConvergenceExecutor::new(adapter, settings, cancel)
        .execute(definitions)
        .await
}

pub struct ConvergenceExecutor {
    adapter: Arc<dyn SchemaAdapter>,
    settings: EngineSettings,
    cancel: CancellationToken,
    events: EventBus,
    retry_budget: Option<usize>,
}

impl ConvergenceExecutor {
    pub fn new(
        adapter: Arc<dyn SchemaAdapter>,
        settings: EngineSettings,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            adapter,
            settings,
            cancel,
            events: EventBus::new(),
            retry_budget: None,
        }
    }

    /// Applies one retry budget to every table, replacing each definition's
    /// own.
    pub fn with_retry_budget(mut self, budget: usize) -> Self {
        self.retry_budget = Some(budget);
        self
    }

    /// Bus carrying the lifecycle events of every initializer of this
    /// executor. Subscribe before calling [`ConvergenceExecutor::execute`].
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub async fn execute(
        &self,
        definitions: Vec<TableDefinition>,
    ) -> Result<ConvergenceReport, RuntimeError> {
        info!(tables = definitions.len(), "Starting convergence");
        let (subscription, logger) = self.spawn_event_logger().await;

        let waiter = DependencyWaiter::from_settings(self.adapter.clone(), &self.settings)
            .with_cancellation(self.cancel.clone());

        let (names, handles): (Vec<String>, Vec<JoinHandle<_>>) = definitions
            .into_iter()
            .map(|definition| {
                let name = definition.name().to_string();
                let mut initializer = TableInitializer::new(definition, waiter.clone())
                    .with_events(self.events.clone());
                if let Some(budget) = self.retry_budget {
                    initializer = initializer.with_retry_budget(budget);
                }
                (name, tokio::spawn(async move { initializer.init().await }))
            })
            .unzip();

        let mut report = ConvergenceReport::default();
        for (name, joined) in names.iter().zip(join_all(handles).await) {
            report.tables.push(TableOutcome::from_result(name, joined?));
        }

        // Dropping the subscription closes the channel once it is drained.
        self.events.unsubscribe(subscription).await;
        logger.await?;

        if self.cancel.is_cancelled() {
            warn!("Convergence interrupted by shutdown");
        }
        info!(
            converged = report.tables.len() - report.failed().count(),
            failed = report.failed().count(),
            "Convergence finished"
        );
        Ok(report)
    }

    /// Mirrors lifecycle events into the log.
    async fn spawn_event_logger(&self) -> (Subscription, JoinHandle<()>) {
        let (subscription, mut receiver) = self
            .events
            .subscribe::<InitializationEvent>(EVENT_BUFFER)
            .await;

        let logger = tokio::spawn(async move {
            while let Some(event) = receiver.recv().await {
                match event.kind {
                    InitializationEventKind::Error => warn!(
                        source = event.source,
                        table = %event.table,
                        attempt = event.attempt,
                        "{}",
                        event.value
                    ),
                    _ => info!(
                        source = event.source,
                        table = %event.table,
                        kind = %event.kind,
                        "{}",
                        event.value
                    ),
                }
            }
        });
        (subscription, logger)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use connectors::memory::MemorySchema;
    use model::definition::{ColumnDefinition, ColumnOption};
    use std::time::Duration;
    use tracing_test::traced_test;

    fn settings() -> EngineSettings {
        EngineSettings {
            poll_interval_ms: 5,
            retry_delay_ms: 0,
            ..EngineSettings::default()
        }
    }

    fn definition(name: &str, columns: Vec<ColumnDefinition>) -> TableDefinition {
        TableDefinition::new(name, columns, vec![], 2).unwrap()
    }

    fn dependent() -> TableDefinition {
        definition(
            "dependent",
            vec![
                ColumnDefinition::builder("id", "increments", vec![]).unwrap(),
                ColumnDefinition::builder(
                    "test_id",
                    "integer",
                    vec![
                        ColumnOption::References("test.id".parse().unwrap()),
                        ColumnOption::OnDelete("cascade".parse().unwrap()),
                    ],
                )
                .unwrap(),
            ],
        )
    }

    fn test_table() -> TableDefinition {
        definition(
            "test",
            vec![ColumnDefinition::builder("id", "increments", vec![]).unwrap()],
        )
    }

    #[tokio::test]
    #[traced_test]
    async fn test_run_converges_all_tables() {
        let schema = Arc::new(MemorySchema::new());

        let report = run(
            vec![dependent(), test_table()],
            schema.clone(),
            settings(),
            CancellationToken::new(),
        )
        .await
        .unwrap();

        assert!(report.is_success());
        assert_eq!(report.tables[0].table(), "dependent");
        assert_eq!(schema.table_names().await, vec!["dependent", "test"]);
        let table = schema.table("dependent").await.unwrap();
        assert_eq!(table.foreign_keys().count(), 1);
        assert!(logs_contain("Initializing database: dependent"));
    }

    #[tokio::test]
    async fn test_failed_table_does_not_stop_others() {
        let schema = Arc::new(MemorySchema::new());
        let orphan = definition(
            "orphan",
            vec![
                ColumnDefinition::builder(
                    "ghost_id",
                    "integer",
                    vec![ColumnOption::References("ghost.id".parse().unwrap())],
                )
                .unwrap(),
            ],
        );
        let settings = EngineSettings {
            wait_timeout_ms: Some(20),
            ..settings()
        };

        let report = run(vec![orphan, test_table()], schema, settings, CancellationToken::new())
            .await
            .unwrap();

        assert!(!report.is_success());
        assert!(matches!(
            report.get("orphan"),
            Some(TableOutcome::Failed { error, .. }) if error.contains("after 2 attempt(s)")
        ));
        assert!(matches!(
            report.get("test"),
            Some(TableOutcome::Converged { attempts: 1, .. })
        ));
        assert_eq!(report.to_string().lines().last(), Some("1 table(s) converged, 1 failed"));
    }

    #[tokio::test]
    async fn test_cancellation_ends_stalled_tables() {
        let schema = Arc::new(MemorySchema::new());
        let cancel = CancellationToken::new();
        let stalled = TableDefinition::new(
            "stalled",
            vec![ColumnDefinition::builder("id", "increments", vec![]).unwrap()],
            vec!["never".to_string()],
            5,
        )
        .unwrap();

        let task = tokio::spawn(run(vec![stalled], schema, settings(), cancel.clone()));
        tokio::time::sleep(Duration::from_millis(20)).await;
        cancel.cancel();

        let report = task.await.unwrap().unwrap();
        assert!(matches!(
            report.get("stalled"),
            Some(TableOutcome::Failed { error, .. }) if error.contains("cancelled")
        ));
    }
}
