use crate::{definition::column::ColumnDefinition, error::DefinitionError};
use serde::Serialize;
use std::collections::HashSet;

/// Maximum number of full initialization attempts when none is configured.
pub const DEFAULT_RETRY_BUDGET: usize = 5;

/// A named table, its ordered columns and the tables it waits for.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableDefinition {
    name: String,
    columns: Vec<ColumnDefinition>,
    depends: Vec<String>,
    retry_budget: usize,
}

impl TableDefinition {
    /// Validates and builds a definition. Dependency names are de-duplicated
    /// (first occurrence wins) but otherwise not resolved; they only have to
    /// exist eventually.
    pub fn new(
        name: impl Into<String>,
        columns: Vec<ColumnDefinition>,
        depends: Vec<String>,
        retry_budget: usize,
    ) -> Result<Self, DefinitionError> {
        let name = name.into().trim().to_string();
        if name.is_empty() {
            return Err(DefinitionError::EmptyTableName);
        }

        if columns.is_empty() {
            return Err(DefinitionError::NoColumns(name));
        }

        if retry_budget == 0 {
            return Err(DefinitionError::InvalidRetryBudget(name));
        }

        let mut seen = HashSet::new();
        for column in &columns {
            if column.name().trim().is_empty() {
                return Err(DefinitionError::EmptyColumnName(name));
            }
            if !seen.insert(column.name()) {
                return Err(DefinitionError::DuplicateColumn {
                    table: name,
                    column: column.name().to_string(),
                });
            }
        }

        for target in columns.iter().flat_map(ColumnDefinition::references) {
            let constraint = format!("{name}_{}_{}_fkey", target.table, target.column);
            if !is_bare_identifier(&constraint) {
                return Err(DefinitionError::UnquotableConstraint {
                    table: name,
                    constraint,
                });
            }
        }

        let mut unique_depends = Vec::with_capacity(depends.len());
        for dependency in depends {
            let dependency = dependency.trim().to_string();
            if dependency.is_empty() {
                return Err(DefinitionError::EmptyDependency(name));
            }
            if !unique_depends.contains(&dependency) {
                unique_depends.push(dependency);
            }
        }

        Ok(Self {
            name,
            columns,
            depends: unique_depends,
            retry_budget,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[ColumnDefinition] {
        &self.columns
    }

    pub fn depends(&self) -> &[String] {
        &self.depends
    }

    pub fn retry_budget(&self) -> usize {
        self.retry_budget
    }

    /// Tables named by column-level `references` options, excluding self
    /// references. Informational only: the engine waits on these per column.
    pub fn referenced_tables(&self) -> Vec<&str> {
        let mut tables: Vec<&str> = Vec::new();
        for target in self.columns.iter().flat_map(ColumnDefinition::references) {
            if target.table != self.name && !tables.contains(&target.table.as_str()) {
                tables.push(&target.table);
            }
        }
        tables
    }
}

fn is_bare_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|first| first.is_ascii_alphabetic() || first == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}
