//! Declarative table, column and option definitions.
//!
//! Definitions are validated once at construction and are immutable
//! afterwards. They never reference each other: a foreign key names its
//! target as a `table.column` string which is resolved against live schema
//! state when the constraint is applied.

pub mod column;
pub mod config;
pub mod option;
pub mod table;

pub use column::ColumnDefinition;
pub use config::{ColumnConfig, OptionConfig, TableConfig};
pub use option::{BuilderMethod, ColumnOption};
pub use table::{DEFAULT_RETRY_BUDGET, TableDefinition};
