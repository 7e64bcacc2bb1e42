use crate::sql::base::error::DbError;
use async_trait::async_trait;
use planner::query::ast::{alter_table::AlterTable, create_table::CreateTable};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseKind {
    Postgres,
    Memory,
    Other(String),
}

/// The boundary between the convergence engine and a live schema.
///
/// Every call is a suspension point and may race with other initializers
/// working against the same engine, so callers must treat "already exists"
/// failures of mutating calls as success.
#[async_trait]
pub trait SchemaAdapter: Send + Sync {
    // Introspection
    async fn table_exists(&self, table: &str) -> Result<bool, DbError>;
    async fn column_exists(&self, table: &str, column: &str) -> Result<bool, DbError>;

    // Mutation
    async fn create_table(&self, stmt: &CreateTable) -> Result<(), DbError>;
    async fn alter_table(&self, stmt: &AlterTable) -> Result<(), DbError>;

    fn kind(&self) -> DatabaseKind;
}
