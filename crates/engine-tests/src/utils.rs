#![allow(dead_code)]

use crate::{pg_client, pg_url};
use connectors::sql::postgres::adapter::PgAdapter;
use engine_config::document::ConvergeConfig;
use engine_runtime::execution::{executor::run, report::ConvergenceReport};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Definition of the five-column `test` table.
pub const TEST_TABLE: &str = r#"{
    "name": "test",
    "columns": [
        { "name": "id", "type": "increments" },
        { "name": "name", "type": "text", "options": [{ "type": "notNullable" }] },
        { "name": "schema_type", "type": "text", "options": [{ "type": "notNullable" }] },
        { "name": "status", "type": "text", "options": [{ "type": "notNullable" }] },
        { "name": "shared", "type": "boolean", "options": [{ "type": "notNullable" }] }
    ]
}"#;

/// `dependent` only references `test` at column level; it declares no `depends`.
pub const DEPENDENT_TABLE: &str = r#"{
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
}"#;

pub const TAGGED_TABLE: &str = r#"{
    "name": "tagged",
    "columns": [
        { "name": "id", "type": "increments" },
        { "name": "name", "type": "text" },
        { "name": "tags", "type": "text[]", "specificType": true, "options": [{ "type": "notNullable" }] }
    ]
}"#;

/// Builds a config document from table JSON snippets, in the given order.
pub fn config(tables: &[&str]) -> String {
    format!(
        r#"{{ "settings": {{ "poll_interval_ms": 20, "wait_timeout_ms": 30000 }}, "tables": [{}] }}"#,
        tables.join(",")
    )
}

/// Validates the document and converges it against the test database,
/// panicking on any setup error.
pub async fn converge(document: &str) -> ConvergenceReport {
    let config = document
        .parse::<ConvergeConfig>()
        .expect("parse config")
        .validate()
        .expect("valid config");
    let adapter = PgAdapter::connect(&pg_url()).await.expect("connect adapter");
    let settings = config.settings().clone();

    run(
        config.into_definitions(),
        Arc::new(adapter),
        settings,
        CancellationToken::new(),
    )
    .await
    .expect("convergence ran")
}

/// Runs raw SQL against the test database.
pub async fn execute(sql: &str) {
    pg_client()
        .await
        .batch_execute(sql)
        .await
        .expect("execute sql");
}

/// Assert that a table exists (or not) in Postgres
pub async fn assert_table_exists(table: &str, should: bool) {
    let client = pg_client().await;
    let exists: bool = client
        .query_one(
            r#"
            SELECT EXISTS (
              SELECT 1
                FROM information_schema.tables
               WHERE table_schema = current_schema()
                 AND table_name = $1
            );
            "#,
            &[&table],
        )
        .await
        .unwrap()
        .get(0);
    assert_eq!(
        exists, should,
        "expected table '{table}' existence == {should}"
    );
}

pub async fn assert_column_exists(table: &str, column: &str, should: bool) {
    let client = pg_client().await;
    let exists: bool = client
        .query_one(
            r#"
            SELECT EXISTS (
              SELECT 1
                FROM information_schema.columns
               WHERE table_schema = current_schema()
                 AND table_name = $1
                 AND column_name = $2
            );
            "#,
            &[&table, &column],
        )
        .await
        .unwrap()
        .get(0);
    assert_eq!(
        exists, should,
        "expected column '{table}.{column}' existence == {should}"
    );
}

pub async fn get_column_names(table: &str) -> Vec<String> {
    let client = pg_client().await;
    client
        .query(
            r#"
            SELECT column_name::text
              FROM information_schema.columns
             WHERE table_schema = current_schema()
               AND table_name = $1
             ORDER BY ordinal_position;
            "#,
            &[&table],
        )
        .await
        .unwrap()
        .iter()
        .map(|row| row.get(0))
        .collect()
}

/// Whether the column is declared `NOT NULL`.
pub async fn is_not_null(table: &str, column: &str) -> bool {
    let client = pg_client().await;
    let nullable: String = client
        .query_one(
            r#"
            SELECT is_nullable::text
              FROM information_schema.columns
             WHERE table_schema = current_schema()
               AND table_name = $1
               AND column_name = $2;
            "#,
            &[&table, &column],
        )
        .await
        .unwrap()
        .get(0);
    nullable == "NO"
}

pub async fn get_constraint_names(table: &str) -> Vec<String> {
    let client = pg_client().await;
    client
        .query(
            r#"
            SELECT constraint_name::text
              FROM information_schema.table_constraints
             WHERE table_schema = current_schema()
               AND table_name = $1
               AND constraint_type IN ('PRIMARY KEY', 'UNIQUE', 'FOREIGN KEY')
             ORDER BY constraint_name;
            "#,
            &[&table],
        )
        .await
        .unwrap()
        .iter()
        .map(|row| row.get(0))
        .collect()
}

/// `ON DELETE` rule of a foreign key, if the constraint exists.
pub async fn get_delete_rule(constraint: &str) -> Option<String> {
    let client = pg_client().await;
    client
        .query_opt(
            r#"
            SELECT delete_rule::text
              FROM information_schema.referential_constraints
             WHERE constraint_schema = current_schema()
               AND constraint_name = $1;
            "#,
            &[&constraint],
        )
        .await
        .unwrap()
        .map(|row| row.get(0))
}
