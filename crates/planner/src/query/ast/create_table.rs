//! Defines the AST for a CREATE TABLE statement.
//!
//! Tables are always created without columns; columns are added one by one
//! afterwards so that each can converge independently.

use crate::query::ast::common::TableRef;
use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CreateTable {
    pub table: TableRef,
    pub if_not_exists: bool,
}
