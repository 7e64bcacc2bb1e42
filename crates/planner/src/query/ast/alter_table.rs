//! Defines the AST for alterations applied to an existing table.

use crate::query::ast::common::{Literal, TableRef};
use model::core::{column_type::ColumnType, referential::ReferentialAction};
use serde::Serialize;

/// A set of alterations against one table. Each action renders as its own
/// statement so that an "already exists" failure of one does not mask the
/// others.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlterTable {
    pub table: TableRef,
    pub actions: Vec<AlterAction>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum AlterAction {
    AddColumn(ColumnSpec),
    SetNotNull { column: String },
    DropNotNull { column: String },
    AddPrimaryKey { constraint: String, column: String },
    AddUnique { constraint: String, column: String },
    AddForeignKey(ForeignKey),
    SetDefault { column: String, value: Literal },
    CreateIndex { name: String, column: String },
    Comment { column: String, text: String },
}

impl AlterAction {
    /// The column the action operates on.
    pub fn column(&self) -> &str {
        match self {
            AlterAction::AddColumn(spec) => &spec.name,
            AlterAction::AddForeignKey(fk) => &fk.column,
            AlterAction::SetNotNull { column }
            | AlterAction::DropNotNull { column }
            | AlterAction::AddPrimaryKey { column, .. }
            | AlterAction::AddUnique { column, .. }
            | AlterAction::SetDefault { column, .. }
            | AlterAction::CreateIndex { column, .. }
            | AlterAction::Comment { column, .. } => column,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnSpec {
    pub name: String,
    pub column_type: ColumnType,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForeignKey {
    pub name: String,
    pub column: String,
    pub referenced_table: TableRef,
    pub referenced_column: String,
    pub on_delete: Option<ReferentialAction>,
    pub on_update: Option<ReferentialAction>,
}
