//! Defines the `Dialect` trait for database-specific SQL syntax.

use model::core::column_type::ColumnType;

pub trait Dialect: Send + Sync {
    /// Wraps an identifier (like a table or column name) in the correct
    /// quotation marks for the dialect.
    ///
    /// - PostgreSQL uses double quotes: `"my_column"`
    fn quote_identifier(&self, ident: &str) -> String;

    /// Renders a string constant, escaping embedded quotes.
    fn quote_literal(&self, value: &str) -> String;

    /// Renders a column type into a database-specific SQL type string,
    /// including any implicit column constraint the type carries.
    fn render_column_type(&self, column_type: &ColumnType) -> String;

    /// Returns the name of the dialect (e.g., "PostgreSQL").
    fn name(&self) -> String;
}

#[derive(Debug, Clone)]
pub struct Postgres;

impl Dialect for Postgres {
    fn quote_identifier(&self, ident: &str) -> String {
        format!(r#""{}""#, ident.replace('"', r#""""#))
    }

    fn quote_literal(&self, value: &str) -> String {
        format!("'{}'", value.replace('\'', "''"))
    }

    fn render_column_type(&self, column_type: &ColumnType) -> String {
        let type_name = column_type.postgres_name().into_owned();
        if column_type.is_auto_increment() {
            format!("{type_name} PRIMARY KEY")
        } else {
            type_name
        }
    }

    fn name(&self) -> String {
        "PostgreSQL".into()
    }
}
