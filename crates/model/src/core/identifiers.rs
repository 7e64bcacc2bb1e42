use crate::error::DefinitionError;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// A `table.column` pair naming the target of a foreign key.
///
/// Resolution is lazy: the referenced table and column need not exist when
/// the reference is parsed, only by the time the constraint is applied.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColumnRef {
    pub table: String,
    pub column: String,
}

impl ColumnRef {
    pub fn new(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            column: column.into(),
        }
    }
}

impl FromStr for ColumnRef {
    type Err = DefinitionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || DefinitionError::InvalidReference(s.to_string());

        let (table, column) = s.trim().split_once('.').ok_or_else(invalid)?;
        let (table, column) = (table.trim(), column.trim());
        if table.is_empty() || column.is_empty() || column.contains('.') {
            return Err(invalid());
        }

        Ok(ColumnRef::new(table, column))
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.table, self.column)
    }
}
