use engine_core::{error::ConvergeError, initializer::InitReport};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum TableOutcome {
    Converged { table: String, attempts: usize },
    Failed { table: String, error: String },
}

impl TableOutcome {
    pub fn from_result(table: &str, result: Result<InitReport, ConvergeError>) -> Self {
        match result {
            Ok(report) => TableOutcome::Converged {
                table: report.table,
                attempts: report.attempts,
            },
            Err(err) => TableOutcome::Failed {
                table: table.to_string(),
                error: err.to_string(),
            },
        }
    }

    pub fn table(&self) -> &str {
        match self {
            TableOutcome::Converged { table, .. } | TableOutcome::Failed { table, .. } => table,
        }
    }

    pub fn is_converged(&self) -> bool {
        matches!(self, TableOutcome::Converged { .. })
    }
}

/// Outcome of every table of a run, in definition order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConvergenceReport {
    pub tables: Vec<TableOutcome>,
}

impl ConvergenceReport {
    pub fn is_success(&self) -> bool {
        self.tables.iter().all(TableOutcome::is_converged)
    }

    pub fn failed(&self) -> impl Iterator<Item = &TableOutcome> {
        self.tables.iter().filter(|outcome| !outcome.is_converged())
    }

    pub fn get(&self, table: &str) -> Option<&TableOutcome> {
        self.tables.iter().find(|outcome| outcome.table() == table)
    }
}

impl fmt::Display for ConvergenceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for outcome in &self.tables {
            match outcome {
                TableOutcome::Converged { table, attempts } => {
                    writeln!(f, "  ✔ {table} (attempts: {attempts})")?
                }
                TableOutcome::Failed { table, error } => writeln!(f, "  ✘ {table}: {error}")?,
            }
        }
        let failed = self.failed().count();
        write!(
            f,
            "{} table(s) converged, {failed} failed",
            self.tables.len() - failed
        )
    }
}
