use crate::sql::{
    base::{
        adapter::{DatabaseKind, SchemaAdapter},
        error::{ConnectorError, DbError},
        query::generator::QueryGenerator,
    },
    postgres::utils::connect_client,
};
use async_trait::async_trait;
use planner::query::{
    ast::{alter_table::AlterTable, create_table::CreateTable},
    dialect,
};
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio_postgres::Client;
use tracing::debug;

/// Schema adapter over a single shared `tokio-postgres` client.
#[derive(Clone)]
pub struct PgAdapter {
    client: Arc<RwLock<Client>>,
    dialect: dialect::Postgres,
}

const QUERY_TABLE_EXISTS_SQL: &str = include_str!("sql/table_exists.sql");
const QUERY_COLUMN_EXISTS_SQL: &str = include_str!("sql/column_exists.sql");

impl PgAdapter {
    pub async fn connect(url: &str) -> Result<Self, ConnectorError> {
        let client = connect_client(url).await?;
        Ok(Self::from_client(client))
    }

    pub fn from_client(client: Client) -> Self {
        PgAdapter {
            client: Arc::new(RwLock::new(client)),
            dialect: dialect::Postgres,
        }
    }

    /// Executes one or more raw SQL statements.
    pub async fn exec(&self, sql: &str) -> Result<(), DbError> {
        debug!(%sql, "Executing schema statement");
        let client = self.client.read().await;
        client.batch_execute(sql).await?;
        Ok(())
    }

    pub async fn ping(&self) -> Result<(), DbError> {
        let client = self.client.read().await;
        client.query_one("SELECT 1", &[]).await?;
        Ok(())
    }
}

#[async_trait]
impl SchemaAdapter for PgAdapter {
    async fn table_exists(&self, table: &str) -> Result<bool, DbError> {
        let client = self.client.read().await;
        let row = client.query_one(QUERY_TABLE_EXISTS_SQL, &[&table]).await?;
        Ok(row.try_get(0)?)
    }

    async fn column_exists(&self, table: &str, column: &str) -> Result<bool, DbError> {
        let client = self.client.read().await;
        let row = client
            .query_one(QUERY_COLUMN_EXISTS_SQL, &[&table, &column])
            .await?;
        Ok(row.try_get(0)?)
    }

    async fn create_table(&self, stmt: &CreateTable) -> Result<(), DbError> {
        let sql = QueryGenerator::new(&self.dialect).create_table(stmt);
        self.exec(&sql).await
    }

    /// Runs each action as its own statement and stops at the first failure.
    async fn alter_table(&self, stmt: &AlterTable) -> Result<(), DbError> {
        let generator = QueryGenerator::new(&self.dialect);
        for sql in generator.alter_statements(stmt) {
            self.exec(&sql).await?;
        }
        Ok(())
    }

    fn kind(&self) -> DatabaseKind {
        DatabaseKind::Postgres
    }
}
