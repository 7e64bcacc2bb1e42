use crate::error::DefinitionError;
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{borrow::Cow, collections::HashMap, fmt};

const DEFAULT_STRING_LENGTH: u32 = 255;
const DEFAULT_DECIMAL_PRECISION: u32 = 8;
const DEFAULT_DECIMAL_SCALE: u32 = 2;

/// Column kinds understood by the schema builder.
///
/// Builder names are matched after normalization (trimmed, lower-cased,
/// aliases such as `int` and `bool` folded into their canonical names).
/// Columns declared with a raw engine type bypass the catalogue entirely
/// and are carried verbatim as [`ColumnType::Specific`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum ColumnType {
    Increments,
    BigIncrements,
    Integer,
    BigInteger,
    SmallInteger,
    Text,
    String { length: u32 },
    Boolean,
    Float,
    Double,
    Decimal { precision: u32, scale: u32 },
    Date,
    DateTime,
    Timestamp,
    Time,
    Uuid,
    Json,
    Jsonb,
    Binary,
    Specific(String),
}

lazy_static! {
    static ref BUILDER_ALIASES: HashMap<&'static str, &'static str> = build_alias_map();
}

impl ColumnType {
    /// Resolves a builder type name (plus optional constructor arguments)
    /// into a column type. When `is_raw` is set the name is taken as an
    /// engine type string and only lower-cased.
    pub fn resolve(type_name: &str, args: &[Value], is_raw: bool) -> Result<Self, DefinitionError> {
        let normalized = Self::normalize_type_name(type_name);
        if normalized.is_empty() {
            return Err(DefinitionError::UnknownColumnType(type_name.to_string()));
        }

        if is_raw {
            return Ok(ColumnType::Specific(normalized));
        }

        let column_type = match normalized.as_str() {
            "increments" => ColumnType::Increments,
            "bigincrements" => ColumnType::BigIncrements,
            "integer" => ColumnType::Integer,
            "biginteger" => ColumnType::BigInteger,
            "smallinteger" => ColumnType::SmallInteger,
            "text" => ColumnType::Text,
            "string" => ColumnType::String {
                length: arg_u32(&normalized, args, 0)?.unwrap_or(DEFAULT_STRING_LENGTH),
            },
            "boolean" => ColumnType::Boolean,
            "float" => ColumnType::Float,
            "double" => ColumnType::Double,
            "decimal" => ColumnType::Decimal {
                precision: arg_u32(&normalized, args, 0)?.unwrap_or(DEFAULT_DECIMAL_PRECISION),
                scale: arg_u32(&normalized, args, 1)?.unwrap_or(DEFAULT_DECIMAL_SCALE),
            },
            "date" => ColumnType::Date,
            "datetime" => ColumnType::DateTime,
            "timestamp" => ColumnType::Timestamp,
            "time" => ColumnType::Time,
            "uuid" => ColumnType::Uuid,
            "json" => ColumnType::Json,
            "jsonb" => ColumnType::Jsonb,
            "binary" => ColumnType::Binary,
            _ => return Err(DefinitionError::UnknownColumnType(type_name.to_string())),
        };

        Ok(column_type)
    }

    /// Trims and lower-cases a type name, folding known aliases.
    pub fn normalize_type_name(type_name: &str) -> String {
        let lowered = type_name.trim().to_lowercase();
        match BUILDER_ALIASES.get(lowered.as_str()) {
            Some(canonical) => (*canonical).to_string(),
            None => lowered,
        }
    }

    pub fn postgres_name(&self) -> Cow<'_, str> {
        match self {
            ColumnType::Increments => Cow::Borrowed("SERIAL"),
            ColumnType::BigIncrements => Cow::Borrowed("BIGSERIAL"),
            ColumnType::Integer => Cow::Borrowed("INTEGER"),
            ColumnType::BigInteger => Cow::Borrowed("BIGINT"),
            ColumnType::SmallInteger => Cow::Borrowed("SMALLINT"),
            ColumnType::Text => Cow::Borrowed("TEXT"),
            ColumnType::String { length } => Cow::Owned(format!("VARCHAR({length})")),
            ColumnType::Boolean => Cow::Borrowed("BOOLEAN"),
            ColumnType::Float => Cow::Borrowed("REAL"),
            ColumnType::Double => Cow::Borrowed("DOUBLE PRECISION"),
            ColumnType::Decimal { precision, scale } => {
                Cow::Owned(format!("DECIMAL({precision}, {scale})"))
            }
            ColumnType::Date => Cow::Borrowed("DATE"),
            ColumnType::DateTime | ColumnType::Timestamp => Cow::Borrowed("TIMESTAMPTZ"),
            ColumnType::Time => Cow::Borrowed("TIME"),
            ColumnType::Uuid => Cow::Borrowed("UUID"),
            ColumnType::Json => Cow::Borrowed("JSON"),
            ColumnType::Jsonb => Cow::Borrowed("JSONB"),
            ColumnType::Binary => Cow::Borrowed("BYTEA"),
            ColumnType::Specific(name) => Cow::Borrowed(name),
        }
    }

    /// Auto-incrementing kinds implicitly carry a primary key.
    pub fn is_auto_increment(&self) -> bool {
        matches!(self, ColumnType::Increments | ColumnType::BigIncrements)
    }

    pub fn is_specific(&self) -> bool {
        matches!(self, ColumnType::Specific(_))
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.postgres_name())
    }
}

fn arg_u32(type_name: &str, args: &[Value], index: usize) -> Result<Option<u32>, DefinitionError> {
    match args.get(index) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value
            .as_u64()
            .and_then(|v| u32::try_from(v).ok())
            .map(Some)
            .ok_or_else(|| DefinitionError::InvalidColumnArgument {
                column_type: type_name.to_string(),
                index,
                value: value.to_string(),
            }),
    }
}

fn build_alias_map() -> HashMap<&'static str, &'static str> {
    let entries = [
        ("int", "integer"),
        ("int4", "integer"),
        ("bigint", "biginteger"),
        ("int8", "biginteger"),
        ("smallint", "smallinteger"),
        ("bool", "boolean"),
        ("varchar", "string"),
        ("serial", "increments"),
        ("bigserial", "bigincrements"),
        ("timestamptz", "timestamp"),
        ("bytea", "binary"),
    ];

    let mut map = HashMap::new();
    for (alias, canonical) in entries {
        map.insert(alias, canonical);
    }
    map
}
