//! An in-process schema engine.
//!
//! `MemorySchema` implements [`SchemaAdapter`] over plain collections and
//! reproduces the failure modes of Postgres that matter for convergence:
//! creating an object that is already there fails with an "already exists"
//! error, referencing a missing relation or column fails with "does not
//! exist". Every statement it accepts is recorded in its rendered SQL form,
//! which makes it usable both as a test double and as a dry-run planner.

use crate::sql::base::{
    adapter::{DatabaseKind, SchemaAdapter},
    error::DbError,
    query::generator::QueryGenerator,
};
use async_trait::async_trait;
use model::core::column_type::ColumnType;
use planner::query::{
    ast::{
        alter_table::{AlterAction, AlterTable, ColumnSpec, ForeignKey},
        common::Literal,
        create_table::CreateTable,
    },
    dialect,
};
use std::collections::{HashMap, HashSet};
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub struct MemoryColumn {
    pub name: String,
    pub column_type: ColumnType,
    pub nullable: bool,
    pub default: Option<Literal>,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MemoryConstraint {
    PrimaryKey { column: String },
    Unique { column: String },
    ForeignKey(ForeignKey),
}

#[derive(Debug, Clone, Default)]
pub struct MemoryTable {
    pub columns: Vec<MemoryColumn>,
    pub constraints: HashMap<String, MemoryConstraint>,
    pub indexes: HashMap<String, String>,
}

impl MemoryTable {
    pub fn column(&self, name: &str) -> Option<&MemoryColumn> {
        self.columns.iter().find(|c| c.name == name)
    }

    fn column_mut(&mut self, table: &str, name: &str) -> Result<&mut MemoryColumn, DbError> {
        self.columns
            .iter_mut()
            .find(|c| c.name == name)
            .ok_or_else(|| {
                DbError::DoesNotExist(format!(
                    r#"column "{name}" of relation "{table}" does not exist"#
                ))
            })
    }

    fn has_primary_key(&self) -> bool {
        self.constraints
            .values()
            .any(|c| matches!(c, MemoryConstraint::PrimaryKey { .. }))
    }

    pub fn foreign_keys(&self) -> impl Iterator<Item = (&String, &ForeignKey)> {
        self.constraints.iter().filter_map(|(name, c)| match c {
            MemoryConstraint::ForeignKey(fk) => Some((name, fk)),
            _ => None,
        })
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    tables: HashMap<String, MemoryTable>,
    /// Postgres keeps tables, indexes and index-backed constraints in one
    /// namespace; name collisions across them are reported the same way.
    relations: HashSet<String>,
    statements: Vec<String>,
    failing_queries: usize,
    query_count: usize,
}

#[derive(Debug, Default)]
pub struct MemorySchema {
    state: RwLock<MemoryState>,
}

impl MemorySchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `count` existence queries fail with a connection
    /// error.
    pub async fn fail_next_queries(&self, count: usize) {
        self.state.write().await.failing_queries = count;
    }

    /// Every accepted statement, rendered as Postgres SQL, in execution
    /// order.
    pub async fn statements(&self) -> Vec<String> {
        self.state.read().await.statements.clone()
    }

    /// Number of existence queries answered so far.
    pub async fn query_count(&self) -> usize {
        self.state.read().await.query_count
    }

    pub async fn table(&self, name: &str) -> Option<MemoryTable> {
        self.state.read().await.tables.get(name).cloned()
    }

    pub async fn table_names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.state.read().await.tables.keys().cloned().collect();
        names.sort();
        names
    }

    async fn answer_query(&self) -> Result<MemoryStateGuard<'_>, DbError> {
        tokio::task::yield_now().await;

        let mut state = self.state.write().await;
        state.query_count += 1;
        if state.failing_queries > 0 {
            state.failing_queries -= 1;
            return Err(DbError::Connection("connection reset by peer".into()));
        }
        Ok(state)
    }
}

type MemoryStateGuard<'a> = tokio::sync::RwLockWriteGuard<'a, MemoryState>;

#[async_trait]
impl SchemaAdapter for MemorySchema {
    async fn table_exists(&self, table: &str) -> Result<bool, DbError> {
        let state = self.answer_query().await?;
        Ok(state.tables.contains_key(table))
    }

    async fn column_exists(&self, table: &str, column: &str) -> Result<bool, DbError> {
        let state = self.answer_query().await?;
        Ok(state
            .tables
            .get(table)
            .is_some_and(|t| t.column(column).is_some()))
    }

    async fn create_table(&self, stmt: &CreateTable) -> Result<(), DbError> {
        tokio::task::yield_now().await;

        let name = stmt.table.name.clone();
        let mut state = self.state.write().await;
        if state.relations.contains(&name) {
            if stmt.if_not_exists {
                debug!(table = %name, "Table already exists, skipping");
                return Ok(());
            }
            return Err(DbError::AlreadyExists(format!(
                r#"relation "{name}" already exists"#
            )));
        }

        state.relations.insert(name.clone());
        state.tables.insert(name, MemoryTable::default());
        let sql = QueryGenerator::new(&dialect::Postgres).create_table(stmt);
        state.statements.push(sql);
        Ok(())
    }

    /// Applies the actions in order and stops at the first failure; actions
    /// applied before the failure stay applied.
    async fn alter_table(&self, stmt: &AlterTable) -> Result<(), DbError> {
        tokio::task::yield_now().await;

        let generator = QueryGenerator::new(&dialect::Postgres);
        let mut state = self.state.write().await;
        for (action, sql) in stmt.actions.iter().zip(generator.alter_statements(stmt)) {
            state.apply(&stmt.table.name, action)?;
            state.statements.push(sql);
        }
        Ok(())
    }

    fn kind(&self) -> DatabaseKind {
        DatabaseKind::Memory
    }
}

impl MemoryState {
    fn apply(&mut self, table_name: &str, action: &AlterAction) -> Result<(), DbError> {
        // Referenced objects are checked before the table is borrowed mutably.
        if let AlterAction::AddForeignKey(fk) = action {
            self.check_reference(fk)?;
        }

        let named_relation = match action {
            AlterAction::AddPrimaryKey { constraint, .. }
            | AlterAction::AddUnique { constraint, .. } => Some(constraint.clone()),
            AlterAction::CreateIndex { name, .. } => Some(name.clone()),
            _ => None,
        };
        if let Some(relation) = &named_relation
            && self.relations.contains(relation)
        {
            return Err(DbError::AlreadyExists(format!(
                r#"relation "{relation}" already exists"#
            )));
        }

        let table = self.tables.get_mut(table_name).ok_or_else(|| {
            DbError::DoesNotExist(format!(r#"relation "{table_name}" does not exist"#))
        })?;

        match action {
            AlterAction::AddColumn(spec) => add_column(table, table_name, spec)?,
            AlterAction::SetNotNull { column } => {
                table.column_mut(table_name, column)?.nullable = false;
            }
            AlterAction::DropNotNull { column } => {
                table.column_mut(table_name, column)?.nullable = true;
            }
            AlterAction::AddPrimaryKey { constraint, column } => {
                table.column_mut(table_name, column)?;
                if table.has_primary_key() {
                    return Err(DbError::AlreadyExists(format!(
                        r#"multiple primary keys for table "{table_name}" are not allowed"#
                    )));
                }
                table.column_mut(table_name, column)?.nullable = false;
                table.constraints.insert(
                    constraint.clone(),
                    MemoryConstraint::PrimaryKey {
                        column: column.clone(),
                    },
                );
            }
            AlterAction::AddUnique { constraint, column } => {
                table.column_mut(table_name, column)?;
                table.constraints.insert(
                    constraint.clone(),
                    MemoryConstraint::Unique {
                        column: column.clone(),
                    },
                );
            }
            AlterAction::AddForeignKey(fk) => {
                table.column_mut(table_name, &fk.column)?;
                if table.constraints.contains_key(&fk.name) {
                    return Err(DbError::AlreadyExists(format!(
                        r#"constraint "{}" for relation "{table_name}" already exists"#,
                        fk.name
                    )));
                }
                table
                    .constraints
                    .insert(fk.name.clone(), MemoryConstraint::ForeignKey(fk.clone()));
            }
            AlterAction::SetDefault { column, value } => {
                table.column_mut(table_name, column)?.default = Some(value.clone());
            }
            AlterAction::CreateIndex { name, column } => {
                table.column_mut(table_name, column)?;
                table.indexes.insert(name.clone(), column.clone());
            }
            AlterAction::Comment { column, text } => {
                table.column_mut(table_name, column)?.comment = Some(text.clone());
            }
        }

        if let Some(relation) = named_relation {
            self.relations.insert(relation);
        }
        Ok(())
    }

    fn check_reference(&self, fk: &ForeignKey) -> Result<(), DbError> {
        let target = &fk.referenced_table.name;
        let referenced = self.tables.get(target).ok_or_else(|| {
            DbError::DoesNotExist(format!(r#"relation "{target}" does not exist"#))
        })?;

        if referenced.column(&fk.referenced_column).is_none() {
            return Err(DbError::DoesNotExist(format!(
                r#"column "{}" referenced in foreign key constraint does not exist"#,
                fk.referenced_column
            )));
        }
        Ok(())
    }
}

fn add_column(table: &mut MemoryTable, table_name: &str, spec: &ColumnSpec) -> Result<(), DbError> {
    if table.column(&spec.name).is_some() {
        return Err(DbError::AlreadyExists(format!(
            r#"column "{}" of relation "{table_name}" already exists"#,
            spec.name
        )));
    }

    let auto_increment = spec.column_type.is_auto_increment();
    if auto_increment && table.has_primary_key() {
        return Err(DbError::AlreadyExists(format!(
            r#"multiple primary keys for table "{table_name}" are not allowed"#
        )));
    }

    table.columns.push(MemoryColumn {
        name: spec.name.clone(),
        column_type: spec.column_type.clone(),
        nullable: !auto_increment,
        default: None,
        comment: None,
    });

    if auto_increment {
        table.constraints.insert(
            format!("{table_name}_pkey"),
            MemoryConstraint::PrimaryKey {
                column: spec.name.clone(),
            },
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::core::{identifiers::ColumnRef, referential::ReferentialAction};
    use planner::{
        query::builder::{alter_table::AlterTableBuilder, create_table::CreateTableBuilder},
        table_ref,
    };

    async fn schema_with_test_table() -> MemorySchema {
        let schema = MemorySchema::new();
        schema
            .create_table(&CreateTableBuilder::new(table_ref!("test")).build())
            .await
            .unwrap();
        schema
            .alter_table(
                &AlterTableBuilder::new(table_ref!("test"))
                    .add_column("id", ColumnType::Increments)
                    .build(),
            )
            .await
            .unwrap();
        schema
    }

    #[tokio::test]
    async fn test_duplicate_table_and_column_report_already_exists() {
        let schema = schema_with_test_table().await;

        let err = schema
            .create_table(&CreateTableBuilder::new(table_ref!("test")).build())
            .await
            .unwrap_err();
        assert!(err.is_already_exists());

        schema
            .create_table(&CreateTableBuilder::new(table_ref!("test")).if_not_exists().build())
            .await
            .unwrap();

        let err = schema
            .alter_table(
                &AlterTableBuilder::new(table_ref!("test"))
                    .add_column("id", ColumnType::Integer)
                    .build(),
            )
            .await
            .unwrap_err();
        assert!(err.is_already_exists());
        assert_eq!(
            err.to_string(),
            r#"column "id" of relation "test" already exists"#
        );
    }

    #[tokio::test]
    async fn test_foreign_key_requires_target() {
        let schema = MemorySchema::new();
        schema
            .create_table(&CreateTableBuilder::new(table_ref!("dependent")).build())
            .await
            .unwrap();
        let add_fk = AlterTableBuilder::new(table_ref!("dependent"))
            .add_column("test_id", ColumnType::Integer)
            .foreign_key(
                "test_id",
                &ColumnRef::new("test", "id"),
                Some(ReferentialAction::Cascade),
                None,
            )
            .build();

        let err = schema.alter_table(&add_fk).await.unwrap_err();
        assert!(matches!(err, DbError::DoesNotExist(_)));

        // The column was added before the constraint failed.
        assert!(schema.column_exists("dependent", "test_id").await.unwrap());
    }

    #[tokio::test]
    async fn test_repeated_foreign_key_collides_on_name() {
        let schema = schema_with_test_table().await;
        schema
            .create_table(&CreateTableBuilder::new(table_ref!("dependent")).build())
            .await
            .unwrap();
        schema
            .alter_table(
                &AlterTableBuilder::new(table_ref!("dependent"))
                    .add_column("test_id", ColumnType::Integer)
                    .build(),
            )
            .await
            .unwrap();

        let fk = AlterTableBuilder::new(table_ref!("dependent"))
            .foreign_key("test_id", &ColumnRef::new("test", "id"), None, None)
            .build();
        schema.alter_table(&fk).await.unwrap();
        let err = schema.alter_table(&fk).await.unwrap_err();
        assert!(err.is_already_exists());

        let table = schema.table("dependent").await.unwrap();
        assert_eq!(table.foreign_keys().count(), 1);
    }

    #[tokio::test]
    async fn test_second_primary_key_is_reported_as_existing() {
        let schema = schema_with_test_table().await;
        let err = schema
            .alter_table(&AlterTableBuilder::new(table_ref!("test")).primary("id").build())
            .await
            .unwrap_err();
        assert!(err.is_already_exists());
    }

    #[tokio::test]
    async fn test_unique_and_index_share_relation_namespace() {
        let schema = schema_with_test_table().await;
        let unique = AlterTableBuilder::new(table_ref!("test")).unique("id").build();
        schema.alter_table(&unique).await.unwrap();
        assert!(schema.alter_table(&unique).await.unwrap_err().is_already_exists());

        let index = AlterTableBuilder::new(table_ref!("test")).index("id").build();
        schema.alter_table(&index).await.unwrap();
        assert!(schema.alter_table(&index).await.unwrap_err().is_already_exists());
    }

    #[tokio::test]
    async fn test_injected_query_failures() {
        let schema = schema_with_test_table().await;
        schema.fail_next_queries(2).await;

        assert!(schema.table_exists("test").await.unwrap_err().is_transient());
        assert!(schema.column_exists("test", "id").await.unwrap_err().is_transient());
        assert!(schema.table_exists("test").await.unwrap());
        assert_eq!(schema.query_count().await, 3);
    }

    #[tokio::test]
    async fn test_statement_log() {
        let schema = schema_with_test_table().await;
        assert_eq!(
            schema.statements().await,
            vec![
                r#"CREATE TABLE "test" ();"#.to_string(),
                r#"ALTER TABLE "test" ADD COLUMN "id" SERIAL PRIMARY KEY;"#.to_string(),
            ]
        );
    }
}
