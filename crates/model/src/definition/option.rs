use crate::{
    core::{identifiers::ColumnRef, referential::ReferentialAction},
    error::DefinitionError,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single constraint or action attached to a column.
///
/// `OnDelete` and `OnUpdate` are modifiers of a sibling `References` option
/// on the same column. They are looked up by scanning the column's options,
/// never applied on their own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnOption {
    NotNullable,
    Nullable,
    Primary,
    Unique,
    References(ColumnRef),
    OnDelete(ReferentialAction),
    OnUpdate(ReferentialAction),
    /// Any option that is not one of the known kinds. Applied by dispatching
    /// to the builder method of the same name, if there is one.
    Other {
        name: String,
        argument: Option<String>,
    },
}

impl ColumnOption {
    /// Parses an option from its configuration form. Option names are
    /// matched case-insensitively.
    pub fn parse(
        column: &str,
        name: &str,
        argument: Option<&str>,
    ) -> Result<Self, DefinitionError> {
        let required = || {
            argument.ok_or_else(|| DefinitionError::MissingOptionArgument {
                column: column.to_string(),
                option: name.to_string(),
            })
        };

        let option = match name.trim().to_lowercase().as_str() {
            "notnullable" => ColumnOption::NotNullable,
            "nullable" => ColumnOption::Nullable,
            "primary" => ColumnOption::Primary,
            "unique" => ColumnOption::Unique,
            "references" => ColumnOption::References(required()?.parse()?),
            "ondelete" => ColumnOption::OnDelete(required()?.parse()?),
            "onupdate" => ColumnOption::OnUpdate(required()?.parse()?),
            _ => ColumnOption::Other {
                name: name.trim().to_string(),
                argument: argument.map(str::to_string),
            },
        };

        Ok(option)
    }

    pub fn name(&self) -> &str {
        match self {
            ColumnOption::NotNullable => "notNullable",
            ColumnOption::Nullable => "nullable",
            ColumnOption::Primary => "primary",
            ColumnOption::Unique => "unique",
            ColumnOption::References(_) => "references",
            ColumnOption::OnDelete(_) => "onDelete",
            ColumnOption::OnUpdate(_) => "onUpdate",
            ColumnOption::Other { name, .. } => name,
        }
    }

    /// True for options that only modify a sibling `references` option.
    pub fn is_modifier(&self) -> bool {
        matches!(self, ColumnOption::OnDelete(_) | ColumnOption::OnUpdate(_))
    }
}

impl fmt::Display for ColumnOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnOption::References(target) => write!(f, "references({target})"),
            ColumnOption::OnDelete(action) => write!(f, "onDelete({action})"),
            ColumnOption::OnUpdate(action) => write!(f, "onUpdate({action})"),
            ColumnOption::Other {
                name,
                argument: Some(arg),
            } => write!(f, "{name}({arg})"),
            other => f.write_str(other.name()),
        }
    }
}

/// Builder methods an [`ColumnOption::Other`] option can dispatch to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuilderMethod {
    DefaultTo,
    Comment,
    Index,
}

impl BuilderMethod {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "defaultto" => Some(BuilderMethod::DefaultTo),
            "comment" => Some(BuilderMethod::Comment),
            "index" => Some(BuilderMethod::Index),
            _ => None,
        }
    }

    /// Whether the method cannot do anything useful without an argument.
    pub fn requires_argument(&self) -> bool {
        matches!(self, BuilderMethod::DefaultTo | BuilderMethod::Comment)
    }
}
