use thiserror::Error;

/// Structural problems in a table definition. These are raised while the
/// definition is being constructed and are never retried.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DefinitionError {
    #[error("Table name must not be empty")]
    EmptyTableName,

    #[error("Table '{0}' must declare at least one column")]
    NoColumns(String),

    #[error("Column name must not be empty (table '{0}')")]
    EmptyColumnName(String),

    #[error("Column '{column}' is declared more than once on table '{table}'")]
    DuplicateColumn { table: String, column: String },

    #[error("Table '{0}' lists an empty dependency name")]
    EmptyDependency(String),

    #[error("Unknown column type: {0}")]
    UnknownColumnType(String),

    #[error("Invalid argument #{index} for column type '{column_type}': {value}")]
    InvalidColumnArgument {
        column_type: String,
        index: usize,
        value: String,
    },

    #[error("Invalid reference '{0}', expected 'table.column'")]
    InvalidReference(String),

    #[error("Invalid referential action: {0}")]
    InvalidReferentialAction(String),

    #[error("Option '{option}' on column '{column}' requires an argument")]
    MissingOptionArgument { column: String, option: String },

    /// Foreign key names are written unquoted, so they must be plain
    /// identifiers.
    #[error("Foreign key '{constraint}' on table '{table}' is not a plain identifier")]
    UnquotableConstraint { table: String, constraint: String },

    #[error("Retry budget for table '{0}' must be at least 1")]
    InvalidRetryBudget(String),
}
