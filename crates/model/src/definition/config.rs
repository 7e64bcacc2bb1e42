use crate::{
    definition::{
        column::ColumnDefinition, option::ColumnOption, table::DEFAULT_RETRY_BUDGET,
        table::TableDefinition,
    },
    error::DefinitionError,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Caller-supplied description of a table, as read from configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TableConfig {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub depends: Vec<String>,
    #[serde(default)]
    pub columns: Vec<ColumnConfig>,
    #[serde(default)]
    pub retries: Option<usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ColumnConfig {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: String,
    #[serde(default)]
    pub args: Vec<Value>,
    #[serde(default, rename = "specificType", alias = "specific_type")]
    pub specific_type: bool,
    #[serde(default)]
    pub options: Vec<OptionConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OptionConfig {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub argument: Option<Value>,
}

impl OptionConfig {
    /// Non-string arguments (numbers, booleans) are carried in their JSON
    /// text form.
    pub fn argument_text(&self) -> Option<String> {
        match &self.argument {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(other) => Some(other.to_string()),
        }
    }
}

impl TableConfig {
    /// Builds a validated definition. `default_retries` applies when the
    /// table does not set its own budget.
    pub fn into_definition(self, default_retries: usize) -> Result<TableDefinition, DefinitionError> {
        let columns = self
            .columns
            .into_iter()
            .map(ColumnConfig::into_definition)
            .collect::<Result<Vec<_>, _>>()?;

        TableDefinition::new(
            self.name,
            columns,
            self.depends,
            self.retries.unwrap_or(default_retries),
        )
    }
}

impl TryFrom<TableConfig> for TableDefinition {
    type Error = DefinitionError;

    fn try_from(config: TableConfig) -> Result<Self, Self::Error> {
        config.into_definition(DEFAULT_RETRY_BUDGET)
    }
}

impl ColumnConfig {
    pub fn into_definition(self) -> Result<ColumnDefinition, DefinitionError> {
        let options = self
            .options
            .iter()
            .map(|option| {
                let argument = option.argument_text();
                ColumnOption::parse(&self.name, &option.kind, argument.as_deref())
            })
            .collect::<Result<Vec<_>, _>>()?;

        ColumnDefinition::new(
            self.name,
            &self.column_type,
            self.args,
            self.specific_type,
            options,
        )
    }
}
