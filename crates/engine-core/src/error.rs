use connectors::sql::base::error::DbError;
use std::time::Duration;
use thiserror::Error;

/// Failures raised while converging a table.
///
/// "Already exists" outcomes never appear here: they mean the change is in
/// place and are absorbed where the alteration is issued.
#[derive(Error, Debug)]
pub enum ConvergeError {
    /// An existence query kept failing on connectivity.
    #[error("Existence query failed after {attempts} attempt(s): {source}")]
    TransientQuery {
        attempts: usize,
        #[source]
        source: DbError,
    },

    /// An existence query failed for a reason retrying cannot fix.
    #[error("Existence query failed: {0}")]
    Query(#[source] DbError),

    #[error("Failed to create table `{table}`: {source}")]
    CreateTable {
        table: String,
        #[source]
        source: DbError,
    },

    #[error("Failed to create column `{table}.{column}`: {source}")]
    CreateColumn {
        table: String,
        column: String,
        #[source]
        source: DbError,
    },

    #[error("Failed to apply `{option}` to `{table}.{column}`: {source}")]
    Alteration {
        table: String,
        column: String,
        option: String,
        #[source]
        source: DbError,
    },

    /// Foreign key DDL failed for a reason other than the constraint being
    /// there already.
    #[error("Foreign key `{constraint}` on `{table}.{column}` failed: {source}")]
    Constraint {
        table: String,
        column: String,
        constraint: String,
        #[source]
        source: DbError,
    },

    #[error("{} column(s) of `{table}` failed: {}", .errors.len(), summarize(.errors))]
    AggregateColumns {
        table: String,
        errors: Vec<ConvergeError>,
    },

    #[error("Initialization of `{table}` failed after {attempts} attempt(s): {last}")]
    InitializationExhausted {
        table: String,
        attempts: usize,
        #[source]
        last: Box<ConvergeError>,
    },

    #[error("Gave up waiting for {target} after {elapsed:?}")]
    WaitTimeout { target: String, elapsed: Duration },

    #[error("Wait for {target} was cancelled")]
    Cancelled { target: String },
}

impl ConvergeError {
    /// Cancellation ends an initialization immediately instead of consuming
    /// another attempt.
    pub fn is_cancelled(&self) -> bool {
        match self {
            ConvergeError::Cancelled { .. } => true,
            ConvergeError::AggregateColumns { errors, .. } => {
                errors.iter().any(ConvergeError::is_cancelled)
            }
            ConvergeError::InitializationExhausted { last, .. } => last.is_cancelled(),
            _ => false,
        }
    }
}

fn summarize(errors: &[ConvergeError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aggregate_message_lists_every_column() {
        let err = ConvergeError::AggregateColumns {
            table: "dependent".into(),
            errors: vec![
                ConvergeError::Cancelled {
                    target: "test.id".into(),
                },
                ConvergeError::Query(DbError::Unknown("boom".into())),
            ],
        };

        assert_eq!(
            err.to_string(),
            "2 column(s) of `dependent` failed: Wait for test.id was cancelled; \
             Existence query failed: Unknown error: boom"
        );
        assert!(err.is_cancelled());
    }

    #[test]
    fn test_exhausted_message_names_table_and_attempts() {
        let err = ConvergeError::InitializationExhausted {
            table: "test".into(),
            attempts: 5,
            last: Box::new(ConvergeError::Query(DbError::Unknown("boom".into()))),
        };

        assert!(err.to_string().starts_with("Initialization of `test` failed after 5 attempt(s)"));
        assert!(!err.is_cancelled());
    }
}
