use crate::{
    core::{column_type::ColumnType, identifiers::ColumnRef, referential::ReferentialAction},
    definition::option::ColumnOption,
    error::DefinitionError,
};
use serde::Serialize;
use serde_json::Value;

/// A named column with its builder type and ordered options.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnDefinition {
    name: String,
    builder_type: String,
    args: Vec<Value>,
    is_raw_type: bool,
    column_type: ColumnType,
    options: Vec<ColumnOption>,
}

impl ColumnDefinition {
    pub fn new(
        name: impl Into<String>,
        builder_type: &str,
        args: Vec<Value>,
        is_raw_type: bool,
        options: Vec<ColumnOption>,
    ) -> Result<Self, DefinitionError> {
        let name = name.into();
        let column_type = ColumnType::resolve(builder_type, &args, is_raw_type)?;

        Ok(Self {
            name,
            builder_type: ColumnType::normalize_type_name(builder_type),
            args,
            is_raw_type,
            column_type,
            options,
        })
    }

    /// Convenience constructor for a builder-typed column without arguments.
    pub fn builder(
        name: impl Into<String>,
        builder_type: &str,
        options: Vec<ColumnOption>,
    ) -> Result<Self, DefinitionError> {
        Self::new(name, builder_type, Vec::new(), false, options)
    }

    /// Convenience constructor for a column created from a raw engine type.
    pub fn raw(
        name: impl Into<String>,
        raw_type: &str,
        options: Vec<ColumnOption>,
    ) -> Result<Self, DefinitionError> {
        Self::new(name, raw_type, Vec::new(), true, options)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn builder_type(&self) -> &str {
        &self.builder_type
    }

    pub fn args(&self) -> &[Value] {
        &self.args
    }

    pub fn is_raw_type(&self) -> bool {
        self.is_raw_type
    }

    pub fn column_type(&self) -> &ColumnType {
        &self.column_type
    }

    pub fn options(&self) -> &[ColumnOption] {
        &self.options
    }

    /// Every `table.column` this column references, in declaration order.
    pub fn references(&self) -> impl Iterator<Item = &ColumnRef> {
        self.options.iter().filter_map(|option| match option {
            ColumnOption::References(target) => Some(target),
            _ => None,
        })
    }

    /// The `onDelete` modifier, found by scanning all options of the column.
    pub fn on_delete(&self) -> Option<ReferentialAction> {
        self.options.iter().find_map(|option| match option {
            ColumnOption::OnDelete(action) => Some(*action),
            _ => None,
        })
    }

    /// The `onUpdate` modifier, found by scanning all options of the column.
    pub fn on_update(&self) -> Option<ReferentialAction> {
        self.options.iter().find_map(|option| match option {
            ColumnOption::OnUpdate(action) => Some(*action),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modifiers_are_found_regardless_of_position() {
        let column = ColumnDefinition::builder(
            "test_id",
            "integer",
            vec![
                ColumnOption::OnUpdate(ReferentialAction::Restrict),
                ColumnOption::References(ColumnRef::new("test", "id")),
                ColumnOption::OnDelete(ReferentialAction::Cascade),
            ],
        )
        .unwrap();

        assert_eq!(column.on_delete(), Some(ReferentialAction::Cascade));
        assert_eq!(column.on_update(), Some(ReferentialAction::Restrict));
        assert_eq!(
            column.references().collect::<Vec<_>>(),
            vec![&ColumnRef::new("test", "id")]
        );
    }

    #[test]
    fn test_builder_type_is_normalized() {
        let column = ColumnDefinition::builder("count", "INT", vec![]).unwrap();
        assert_eq!(column.builder_type(), "integer");
        assert_eq!(column.column_type(), &ColumnType::Integer);
        assert!(!column.is_raw_type());
    }

    #[test]
    fn test_raw_column() {
        let column = ColumnDefinition::raw("tags", "text[]", vec![ColumnOption::NotNullable]).unwrap();
        assert!(column.is_raw_type());
        assert_eq!(column.column_type(), &ColumnType::Specific("text[]".into()));
    }
}
