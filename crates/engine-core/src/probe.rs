use crate::{
    error::ConvergeError,
    retry::{RetryDisposition, RetryError, RetryPolicy},
};
use connectors::sql::base::{adapter::SchemaAdapter, error::DbError};
use std::sync::Arc;
use tracing::debug;

/// Existence queries against the live schema, each carrying its own bounded
/// retry for connectivity failures.
#[derive(Clone)]
pub struct SchemaProbe {
    adapter: Arc<dyn SchemaAdapter>,
    policy: RetryPolicy,
}

impl SchemaProbe {
    pub fn new(adapter: Arc<dyn SchemaAdapter>, policy: RetryPolicy) -> Self {
        Self { adapter, policy }
    }

    pub fn adapter(&self) -> &Arc<dyn SchemaAdapter> {
        &self.adapter
    }

    pub async fn has_table(&self, table: &str) -> Result<bool, ConvergeError> {
        let adapter = &self.adapter;
        self.policy
            .run(move || adapter.table_exists(table), classify)
            .await
            .map_err(escalate)
    }

    pub async fn has_column(&self, table: &str, column: &str) -> Result<bool, ConvergeError> {
        let adapter = &self.adapter;
        self.policy
            .run(move || adapter.column_exists(table, column), classify)
            .await
            .map_err(escalate)
    }
}

fn classify(err: &DbError) -> RetryDisposition {
    if err.is_transient() {
        debug!(error = %err, "Existence query failed, retrying");
        RetryDisposition::Retry
    } else {
        RetryDisposition::Stop
    }
}

fn escalate(err: RetryError<DbError>) -> ConvergeError {
    match err {
        RetryError::Fatal(source) => ConvergeError::Query(source),
        RetryError::AttemptsExceeded { attempts, last } => ConvergeError::TransientQuery {
            attempts,
            source: last,
        },
    }
}
