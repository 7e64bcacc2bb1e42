use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct TableRef {
    pub schema: Option<String>,
    pub name: String,
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.schema {
            Some(schema) => write!(f, "{schema}.{}", self.name),
            None => f.write_str(&self.name),
        }
    }
}

/// A constant rendered into DDL, e.g. a column default.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Literal {
    Null,
    Boolean(bool),
    Number(String),
    Text(String),
}

impl Literal {
    /// Interprets a textual option argument: `null`, booleans and numbers
    /// keep their SQL meaning, anything else becomes a string literal.
    pub fn infer(raw: &str) -> Self {
        let trimmed = raw.trim();
        match trimmed.to_lowercase().as_str() {
            "null" => return Literal::Null,
            "true" => return Literal::Boolean(true),
            "false" => return Literal::Boolean(false),
            _ => {}
        }

        if !trimmed.is_empty() && trimmed.parse::<f64>().is_ok_and(f64::is_finite) {
            Literal::Number(trimmed.to_string())
        } else {
            Literal::Text(raw.to_string())
        }
    }
}
