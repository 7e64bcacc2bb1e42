use serde::Serialize;
use std::fmt;

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "camelCase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        f.write_str(label)
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct Finding {
    pub code: String,    // stable programmatic id
    pub message: String, // human-readable
    pub severity: Severity,
    pub table: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

const CODE_UNKNOWN_DEPENDENCY: &str = "UNKNOWN_DEPENDENCY";
const CODE_UNKNOWN_REFERENCE: &str = "UNKNOWN_REFERENCE";
const CODE_SELF_DEPENDENCY: &str = "SELF_DEPENDENCY";
const CODE_DEPENDENCY_CYCLE: &str = "DEPENDENCY_CYCLE";
const CODE_REFERENCE_CYCLE: &str = "REFERENCE_CYCLE";

impl Finding {
    pub fn new(
        code: &str,
        table: &str,
        message: String,
        severity: Severity,
        suggestion: Option<String>,
    ) -> Self {
        Finding {
            code: code.to_string(),
            message,
            severity,
            table: table.to_string(),
            suggestion,
        }
    }

    /// A declared dependency names a table no definition creates.
    pub fn unknown_dependency(table: &str, dependency: &str) -> Self {
        Self::new(
            CODE_UNKNOWN_DEPENDENCY,
            table,
            format!("Table `{table}` depends on `{dependency}`, which is not defined here"),
            Severity::Warning,
            Some(format!(
                "Create `{dependency}` out of band, or `{table}` will wait for it indefinitely"
            )),
        )
    }

    /// A foreign key targets a table or column no definition creates.
    pub fn unknown_reference(table: &str, column: &str, target: &str) -> Self {
        Self::new(
            CODE_UNKNOWN_REFERENCE,
            table,
            format!("Column `{table}.{column}` references `{target}`, which is not defined here"),
            Severity::Warning,
            Some(format!("Make sure `{target}` exists before converging")),
        )
    }

    pub fn self_dependency(table: &str) -> Self {
        Self::new(
            CODE_SELF_DEPENDENCY,
            table,
            format!("Table `{table}` depends on itself"),
            Severity::Error,
            Some(format!("Remove `{table}` from its own depends list")),
        )
    }

    pub fn dependency_cycle(cycle: &[String]) -> Self {
        let table = cycle.first().map(String::as_str).unwrap_or_default();
        Self::new(
            CODE_DEPENDENCY_CYCLE,
            table,
            format!("Tables depend on each other in a cycle: {}", cycle.join(" -> ")),
            Severity::Error,
            None,
        )
    }

    pub fn reference_cycle(cycle: &[String]) -> Self {
        let table = cycle
            .first()
            .and_then(|column| column.split('.').next())
            .unwrap_or_default();
        Self::new(
            CODE_REFERENCE_CYCLE,
            table,
            format!("Columns reference each other in a cycle: {}", cycle.join(" -> ")),
            Severity::Error,
            None,
        )
    }

    pub fn is_blocking(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity, self.code, self.message)
    }
}
