use crate::query::ast::{
    alter_table::{AlterAction, AlterTable, ColumnSpec, ForeignKey},
    common::{Literal, TableRef},
};
use crate::table_ref;
use model::core::{
    column_type::ColumnType, identifiers::ColumnRef, referential::ReferentialAction,
};

/// Fluent builder for table alterations.
///
/// Constraint and index names are derived from table and column names so
/// that re-running the same alteration collides on the name instead of
/// creating a duplicate.
#[derive(Debug, Clone)]
pub struct AlterTableBuilder {
    ast: AlterTable,
}

impl AlterTableBuilder {
    pub fn new(table: TableRef) -> Self {
        Self {
            ast: AlterTable {
                table,
                actions: Vec::new(),
            },
        }
    }

    pub fn add_column(mut self, name: &str, column_type: ColumnType) -> Self {
        self.ast.actions.push(AlterAction::AddColumn(ColumnSpec {
            name: name.to_string(),
            column_type,
        }));
        self
    }

    pub fn set_not_null(mut self, column: &str) -> Self {
        self.ast.actions.push(AlterAction::SetNotNull {
            column: column.to_string(),
        });
        self
    }

    pub fn drop_not_null(mut self, column: &str) -> Self {
        self.ast.actions.push(AlterAction::DropNotNull {
            column: column.to_string(),
        });
        self
    }

    pub fn primary(mut self, column: &str) -> Self {
        let constraint = format!("{}_pkey", self.ast.table.name);
        self.ast.actions.push(AlterAction::AddPrimaryKey {
            constraint,
            column: column.to_string(),
        });
        self
    }

    pub fn unique(mut self, column: &str) -> Self {
        let constraint = format!("{}_{column}_unique", self.ast.table.name);
        self.ast.actions.push(AlterAction::AddUnique {
            constraint,
            column: column.to_string(),
        });
        self
    }

    pub fn foreign_key(
        mut self,
        column: &str,
        target: &ColumnRef,
        on_delete: Option<ReferentialAction>,
        on_update: Option<ReferentialAction>,
    ) -> Self {
        let name = format!(
            "{}_{}_{}_fkey",
            self.ast.table.name, target.table, target.column
        );
        self.ast.actions.push(AlterAction::AddForeignKey(ForeignKey {
            name,
            column: column.to_string(),
            referenced_table: table_ref!(target.table),
            referenced_column: target.column.clone(),
            on_delete,
            on_update,
        }));
        self
    }

    pub fn default_to(mut self, column: &str, value: Literal) -> Self {
        self.ast.actions.push(AlterAction::SetDefault {
            column: column.to_string(),
            value,
        });
        self
    }

    pub fn index(mut self, column: &str) -> Self {
        let name = format!("{}_{column}_index", self.ast.table.name);
        self.ast.actions.push(AlterAction::CreateIndex {
            name,
            column: column.to_string(),
        });
        self
    }

    pub fn comment(mut self, column: &str, text: &str) -> Self {
        self.ast.actions.push(AlterAction::Comment {
            column: column.to_string(),
            text: text.to_string(),
        });
        self
    }

    pub fn build(self) -> AlterTable {
        self.ast
    }
}
