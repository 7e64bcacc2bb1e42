use crate::{
    error::ConvergeError, event_bus::bus::EventBus, materializer::ColumnMaterializer,
    waiter::DependencyWaiter,
};
use connectors::sql::base::adapter::SchemaAdapter;
use futures::future::{join_all, try_join_all};
use model::{definition::TableDefinition, events::InitializationEvent};
use planner::{query::builder::create_table::CreateTableBuilder, table_ref};
use serde::Serialize;
use std::{fmt, sync::Arc};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum InitState {
    Pending,
    WaitingOnDependencies,
    CreatingTable,
    CreatingColumns,
    RetryingWholeSequence,
    Done,
    Failed,
}

impl InitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            InitState::Pending => "Pending",
            InitState::WaitingOnDependencies => "WaitingOnDependencies",
            InitState::CreatingTable => "CreatingTable",
            InitState::CreatingColumns => "CreatingColumns",
            InitState::RetryingWholeSequence => "RetryingWholeSequence",
            InitState::Done => "Done",
            InitState::Failed => "Failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, InitState::Done | InitState::Failed)
    }
}

impl fmt::Display for InitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InitReport {
    pub table: String,
    pub attempts: usize,
}

/// Converges one table definition against the live schema.
///
/// An attempt waits for every declared dependency, creates the table when it
/// is missing and then materializes all columns concurrently. A failed
/// attempt restarts from the dependency wait until the definition's retry
/// budget runs out. Initializers of different tables need no ordering
/// between them: every wait is resolved against the live schema.
pub struct TableInitializer {
    definition: Arc<TableDefinition>,
    waiter: DependencyWaiter,
    materializer: ColumnMaterializer,
    events: Option<EventBus>,
    state: watch::Sender<InitState>,
    retry_budget: usize,
}

impl TableInitializer {
    pub fn new(definition: TableDefinition, waiter: DependencyWaiter) -> Self {
        let (state, _) = watch::channel(InitState::Pending);
        Self {
            retry_budget: definition.retry_budget(),
            definition: Arc::new(definition),
            materializer: ColumnMaterializer::new(waiter.clone()),
            waiter,
            events: None,
            state,
        }
    }

    /// Publishes lifecycle events on `bus`.
    pub fn with_events(mut self, bus: EventBus) -> Self {
        self.events = Some(bus);
        self
    }

    /// Overrides the definition's own budget of whole-sequence attempts.
    pub fn with_retry_budget(mut self, budget: usize) -> Self {
        self.retry_budget = budget.max(1);
        self
    }

    pub fn retry_budget(&self) -> usize {
        self.retry_budget
    }

    pub fn definition(&self) -> &TableDefinition {
        &self.definition
    }

    pub fn state(&self) -> InitState {
        *self.state.borrow()
    }

    pub fn watch_state(&self) -> watch::Receiver<InitState> {
        self.state.subscribe()
    }

    pub async fn init(&self) -> Result<InitReport, ConvergeError> {
        let table = self.definition.name();
        let budget = self.retry_budget;

        self.publish(InitializationEvent::started(
            table,
            1,
            self.definition.depends(),
        ))
        .await;
        info!(table, depends = ?self.definition.depends(), "Initializing table");

        let mut attempt = 0;
        loop {
            attempt += 1;

            let err = match self.run_attempt().await {
                Ok(()) => {
                    self.set_state(InitState::Done);
                    self.publish(InitializationEvent::completed(table, attempt))
                        .await;
                    info!(table, attempt, "Table initialized");
                    return Ok(InitReport {
                        table: table.to_string(),
                        attempts: attempt,
                    });
                }
                Err(err) => err,
            };

            self.publish(InitializationEvent::failed(table, attempt, &err))
                .await;

            if err.is_cancelled() {
                self.set_state(InitState::Failed);
                warn!(table, attempt, "Initialization cancelled");
                return Err(err);
            }

            if attempt >= budget {
                self.set_state(InitState::Failed);
                error!(table, attempts = attempt, error = %err, "Initialization failed");
                return Err(ConvergeError::InitializationExhausted {
                    table: table.to_string(),
                    attempts: attempt,
                    last: Box::new(err),
                });
            }

            warn!(table, attempt, budget, error = %err, "Initialization attempt failed, retrying");
            self.set_state(InitState::RetryingWholeSequence);
        }
    }

    async fn run_attempt(&self) -> Result<(), ConvergeError> {
        self.set_state(InitState::WaitingOnDependencies);
        self.wait_for_tables().await?;

        self.set_state(InitState::CreatingTable);
        self.create_table().await?;

        self.set_state(InitState::CreatingColumns);
        self.create_columns().await
    }

    async fn wait_for_tables(&self) -> Result<(), ConvergeError> {
        let waits = self
            .definition
            .depends()
            .iter()
            .map(|dependency| self.waiter.wait_for_table(dependency));
        try_join_all(waits).await?;
        Ok(())
    }

    async fn create_table(&self) -> Result<(), ConvergeError> {
        let table = self.definition.name();
        if self.waiter.probe().has_table(table).await? {
            debug!(table, "Table already exists");
            return Ok(());
        }

        let stmt = CreateTableBuilder::new(table_ref!(table))
            .if_not_exists()
            .build();
        match self.waiter.probe().adapter().create_table(&stmt).await {
            Ok(()) => Ok(()),
            Err(err) if err.is_already_exists() => {
                debug!(table, "Table created concurrently");
                Ok(())
            }
            Err(source) => Err(ConvergeError::CreateTable {
                table: table.to_string(),
                source,
            }),
        }
    }

    async fn create_columns(&self) -> Result<(), ConvergeError> {
        let table = self.definition.name();
        let results = join_all(
            self.definition
                .columns()
                .iter()
                .map(|column| self.materializer.materialize(table, column)),
        )
        .await;

        let errors: Vec<ConvergeError> = results.into_iter().filter_map(Result::err).collect();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConvergeError::AggregateColumns {
                table: table.to_string(),
                errors,
            })
        }
    }

    fn set_state(&self, state: InitState) {
        let previous = self.state.send_replace(state);
        if previous != state {
            debug!(table = self.definition.name(), from = %previous, to = %state, "State changed");
        }
    }

    async fn publish(&self, event: InitializationEvent) {
        if let Some(bus) = &self.events {
            bus.publish(event).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{probe::SchemaProbe, retry::RetryPolicy};
    use connectors::memory::{MemoryConstraint, MemorySchema};
    use model::{
        core::{column_type::ColumnType, referential::ReferentialAction},
        definition::{ColumnDefinition, ColumnOption, TableConfig},
        events::InitializationEventKind,
    };
    use planner::query::builder::alter_table::AlterTableBuilder;
    use serde_json::json;
    use std::time::Duration;
    use tokio_util::sync::CancellationToken;
    use tracing_test::traced_test;

    fn waiter(schema: &Arc<MemorySchema>) -> DependencyWaiter {
        let probe = SchemaProbe::new(schema.clone(), RetryPolicy::immediate(2));
        DependencyWaiter::new(probe, Duration::from_millis(5))
    }

    fn initializer(schema: &Arc<MemorySchema>, definition: TableDefinition) -> TableInitializer {
        TableInitializer::new(definition, waiter(schema))
    }

    fn table(config: serde_json::Value) -> TableDefinition {
        serde_json::from_value::<TableConfig>(config)
            .unwrap()
            .try_into()
            .unwrap()
    }

    fn test_table() -> TableDefinition {
        table(json!({
            "name": "test",
            "columns": [
                { "name": "id", "type": "increments" },
                { "name": "name", "type": "text", "options": [{ "type": "notNullable" }] },
                { "name": "schema_type", "type": "text", "options": [{ "type": "notNullable" }] },
                { "name": "status", "type": "text", "options": [{ "type": "notNullable" }] },
                { "name": "shared", "type": "bool", "options": [{ "type": "notNullable" }] }
            ]
        }))
    }

    fn dependent_table() -> TableDefinition {
        table(json!({
            "name": "dependent",
            "columns": [
                { "name": "id", "type": "increments" },
                {
                    "name": "test_id",
                    "type": "integer",
                    "options": [
                        { "type": "references", "argument": "test.id" },
                        { "type": "onDelete", "argument": "CASCADE" }
                    ]
                }
            ]
        }))
    }

    #[tokio::test]
    async fn test_creates_table_with_all_columns() {
        let schema = Arc::new(MemorySchema::new());
        let init = initializer(&schema, test_table());

        let report = init.init().await.unwrap();

        assert_eq!(report, InitReport { table: "test".into(), attempts: 1 });
        assert_eq!(init.state(), InitState::Done);
        assert!(schema.table_exists("test").await.unwrap());
        for column in ["id", "name", "schema_type", "status", "shared"] {
            assert!(schema.column_exists("test", column).await.unwrap(), "{column}");
        }

        let created = schema.table("test").await.unwrap();
        assert_eq!(created.column("shared").unwrap().column_type, ColumnType::Boolean);
        assert!(!created.column("status").unwrap().nullable);
    }

    #[tokio::test]
    async fn test_init_is_idempotent() {
        let schema = Arc::new(MemorySchema::new());
        let init = initializer(&schema, dependent_table());
        let test = initializer(&schema, test_table());

        test.init().await.unwrap();
        init.init().await.unwrap();
        let before = schema.table("dependent").await.unwrap();

        let report = init.init().await.unwrap();
        test.init().await.unwrap();

        assert_eq!(report.attempts, 1);
        let after = schema.table("dependent").await.unwrap();
        assert_eq!(after.columns, before.columns);
        assert_eq!(after.constraints, before.constraints);
        assert_eq!(after.foreign_keys().count(), 1);
        assert_eq!(schema.table("test").await.unwrap().columns.len(), 5);
    }

    #[tokio::test]
    async fn test_dependent_before_referenced_table_converges() {
        let schema = Arc::new(MemorySchema::new());
        let dependent = Arc::new(initializer(&schema, dependent_table()));
        let test = initializer(&schema, test_table());

        let pending = {
            let dependent = dependent.clone();
            tokio::spawn(async move { dependent.init().await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!schema.table_exists("test").await.unwrap());

        test.init().await.unwrap();
        pending.await.unwrap().unwrap();

        let table = schema.table("dependent").await.unwrap();
        let (name, fk) = table.foreign_keys().next().unwrap();
        assert_eq!(name, "dependent_test_id_fkey");
        assert_eq!(fk.referenced_table.name, "test");
        assert_eq!(fk.referenced_column, "id");
        assert_eq!(fk.on_delete, Some(ReferentialAction::Cascade));
    }

    #[tokio::test]
    async fn test_concurrent_initialization() {
        let schema = Arc::new(MemorySchema::new());
        let dependent = initializer(&schema, dependent_table());
        let test = initializer(&schema, test_table());

        let (dependent_report, test_report) = tokio::join!(dependent.init(), test.init());
        dependent_report.unwrap();
        test_report.unwrap();

        assert_eq!(schema.table_names().await, vec!["dependent", "test"]);
        let statements = schema.statements().await;
        let fk = statements
            .iter()
            .position(|sql| sql.contains("dependent_test_id_fkey"))
            .unwrap();
        let referenced = statements
            .iter()
            .position(|sql| sql == r#"ALTER TABLE "test" ADD COLUMN "id" SERIAL PRIMARY KEY;"#)
            .unwrap();
        assert!(referenced < fk);
    }

    #[tokio::test]
    async fn test_declared_dependencies_gate_table_creation() {
        let schema = Arc::new(MemorySchema::new());
        let child = Arc::new(initializer(
            &schema,
            table(json!({
                "name": "child",
                "depends": ["parent"],
                "columns": [{ "name": "id", "type": "increments" }]
            })),
        ));
        let mut states = child.watch_state();

        let pending = {
            let child = child.clone();
            tokio::spawn(async move { child.init().await })
        };
        states
            .wait_for(|state| *state == InitState::WaitingOnDependencies)
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!schema.table_exists("child").await.unwrap());

        initializer(
            &schema,
            table(json!({ "name": "parent", "columns": [{ "name": "id", "type": "increments" }] })),
        )
        .init()
        .await
        .unwrap();

        pending.await.unwrap().unwrap();
        assert_eq!(schema.table_names().await, vec!["child", "parent"]);
    }

    #[tokio::test]
    async fn test_out_of_band_objects_are_tolerated() {
        let schema = Arc::new(MemorySchema::new());
        initializer(&schema, test_table()).init().await.unwrap();
        schema
            .create_table(&CreateTableBuilder::new(table_ref!("dependent")).build())
            .await
            .unwrap();
        schema
            .alter_table(
                &AlterTableBuilder::new(table_ref!("dependent"))
                    .add_column("test_id", ColumnType::Integer)
                    .foreign_key(
                        "test_id",
                        &model::core::identifiers::ColumnRef::new("test", "id"),
                        Some(ReferentialAction::Cascade),
                        None,
                    )
                    .build(),
            )
            .await
            .unwrap();
        let before = schema.table("dependent").await.unwrap();

        initializer(&schema, dependent_table()).init().await.unwrap();

        let after = schema.table("dependent").await.unwrap();
        assert_eq!(after.column("test_id"), before.column("test_id"));
        assert_eq!(after.foreign_keys().count(), 1);
        assert!(matches!(
            after.constraints.get("dependent_pkey"),
            Some(MemoryConstraint::PrimaryKey { column }) if column == "id"
        ));
    }

    #[tokio::test]
    async fn test_raw_type_column_gets_no_options() {
        let schema = Arc::new(MemorySchema::new());
        let definition = TableDefinition::new(
            "tagged",
            vec![
                ColumnDefinition::raw(
                    "tags",
                    "text[]",
                    vec![ColumnOption::NotNullable, ColumnOption::Unique],
                )
                .unwrap(),
            ],
            vec![],
            1,
        )
        .unwrap();

        initializer(&schema, definition).init().await.unwrap();

        let table = schema.table("tagged").await.unwrap();
        assert!(table.column("tags").unwrap().nullable);
        assert!(table.constraints.is_empty());
    }

    #[tokio::test]
    #[traced_test]
    async fn test_retry_budget_is_exhausted() {
        let schema = Arc::new(MemorySchema::new());
        schema.fail_next_queries(usize::MAX).await;
        let bus = EventBus::new();
        let (_, mut events) = bus.subscribe::<InitializationEvent>(16).await;

        let definition = TableDefinition::new(
            "test",
            vec![ColumnDefinition::builder("id", "increments", vec![]).unwrap()],
            vec![],
            3,
        )
        .unwrap();
        let init = initializer(&schema, definition).with_events(bus);

        let err = init.init().await.unwrap_err();

        assert!(matches!(
            &err,
            ConvergeError::InitializationExhausted { table, attempts: 3, .. } if table == "test"
        ));
        assert_eq!(init.state(), InitState::Failed);
        assert_eq!(schema.query_count().await, 6);
        assert!(logs_contain("Initialization attempt failed, retrying"));

        let mut kinds = Vec::new();
        while let Ok(event) = events.try_recv() {
            kinds.push(event.kind);
        }
        assert_eq!(
            kinds,
            vec![
                InitializationEventKind::Database,
                InitializationEventKind::Error,
                InitializationEventKind::Error,
                InitializationEventKind::Error,
            ]
        );
    }

    #[tokio::test]
    async fn test_lifecycle_events() {
        let schema = Arc::new(MemorySchema::new());
        let bus = EventBus::new();
        let (_, mut events) = bus.subscribe::<InitializationEvent>(16).await;

        initializer(&schema, test_table())
            .with_events(bus)
            .init()
            .await
            .unwrap();

        let started = events.recv().await.unwrap();
        assert_eq!(started.source, "initialization");
        assert_eq!(started.kind, InitializationEventKind::Database);
        assert_eq!(started.value, "Initializing database: test. Waiting on dbs: ");

        let completed = events.recv().await.unwrap();
        assert_eq!(completed.kind, InitializationEventKind::Completed);
        assert_eq!(completed.attempt, 1);
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_column_failures_are_aggregated() {
        let schema = Arc::new(MemorySchema::new());
        let definition = table(json!({
            "name": "test",
            "retries": 1,
            "columns": [
                { "name": "id", "type": "increments" },
                { "name": "a", "type": "integer",
                  "options": [{ "type": "references", "argument": "missing.id" }] },
                { "name": "b", "type": "integer",
                  "options": [{ "type": "references", "argument": "absent.id" }] }
            ]
        }));
        let waiter = waiter(&schema).with_timeout(Some(Duration::from_millis(20)));

        let err = TableInitializer::new(definition, waiter)
            .init()
            .await
            .unwrap_err();

        let ConvergeError::InitializationExhausted { attempts, last, .. } = err else {
            panic!("expected an exhausted retry budget");
        };
        assert_eq!(attempts, 1);
        assert!(matches!(
            *last,
            ConvergeError::AggregateColumns { ref errors, .. } if errors.len() == 2
        ));
        // Columns that do not depend on anything still converge.
        assert!(schema.column_exists("test", "id").await.unwrap());
    }

    #[tokio::test]
    async fn test_cancellation_is_not_retried() {
        let schema = Arc::new(MemorySchema::new());
        let token = CancellationToken::new();
        let definition = table(json!({
            "name": "orphan",
            "depends": ["ghost"],
            "columns": [{ "name": "id", "type": "increments" }]
        }));
        let init = Arc::new(TableInitializer::new(
            definition,
            waiter(&schema).with_cancellation(token.clone()),
        ));

        let pending = {
            let init = init.clone();
            tokio::spawn(async move { init.init().await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        token.cancel();

        let err = pending.await.unwrap().unwrap_err();
        assert!(matches!(err, ConvergeError::Cancelled { target } if target == "table ghost"));
        assert_eq!(init.state(), InitState::Failed);
    }

    #[tokio::test]
    async fn test_retry_budget_override() {
        let schema = Arc::new(MemorySchema::new());
        let definition = table(json!({
            "name": "orphan",
            "retries": 5,
            "columns": [{ "name": "ghost_id", "type": "integer",
                          "options": [{ "type": "references", "argument": "ghost.id" }] }]
        }));
        let bounded = waiter(&schema).with_timeout(Some(Duration::from_millis(10)));
        let init = TableInitializer::new(definition, bounded).with_retry_budget(1);
        assert_eq!(init.retry_budget(), 1);

        let err = init.init().await.unwrap_err();

        assert!(matches!(err, ConvergeError::InitializationExhausted { attempts: 1, .. }));
        assert_eq!(initializer(&schema, test_table()).retry_budget(), 5);
    }
}
