use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt::{self, Debug};

/// A trait for events that can be published on the EventBus.
pub trait Event: Send + Sync + Debug + 'static {
    /// Returns a unique identifier for this event type.
    fn event_type(&self) -> &'static str;
}

/// Source tag carried by every initializer lifecycle event.
pub const INITIALIZATION_SOURCE: &str = "initialization";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InitializationEventKind {
    /// Initialization (or a retry of it) is starting.
    Database,
    /// An attempt failed.
    Error,
    /// The table converged.
    Completed,
}

impl fmt::Display for InitializationEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            InitializationEventKind::Database => "database",
            InitializationEventKind::Error => "error",
            InitializationEventKind::Completed => "completed",
        };
        f.write_str(name)
    }
}

/// Emitted by a table initializer at start, on each failed attempt and on
/// completion.
#[derive(Debug, Clone, Serialize)]
pub struct InitializationEvent {
    pub source: &'static str,
    pub kind: InitializationEventKind,
    pub table: String,
    pub attempt: usize,
    pub value: String,
    pub timestamp: DateTime<Utc>,
}

impl InitializationEvent {
    pub fn started(table: &str, attempt: usize, depends: &[String]) -> Self {
        Self::new(
            InitializationEventKind::Database,
            table,
            attempt,
            format!(
                "Initializing database: {table}. Waiting on dbs: {}",
                depends.join(", ")
            ),
        )
    }

    pub fn failed(table: &str, attempt: usize, error: impl fmt::Display) -> Self {
        Self::new(
            InitializationEventKind::Error,
            table,
            attempt,
            error.to_string(),
        )
    }

    pub fn completed(table: &str, attempt: usize) -> Self {
        Self::new(
            InitializationEventKind::Completed,
            table,
            attempt,
            format!("Finished initialization of table: {table}"),
        )
    }

    fn new(kind: InitializationEventKind, table: &str, attempt: usize, value: String) -> Self {
        Self {
            source: INITIALIZATION_SOURCE,
            kind,
            table: table.to_string(),
            attempt,
            value,
            timestamp: Utc::now(),
        }
    }
}

impl Event for InitializationEvent {
    fn event_type(&self) -> &'static str {
        match self.kind {
            InitializationEventKind::Database => "initialization.database",
            InitializationEventKind::Error => "initialization.error",
            InitializationEventKind::Completed => "initialization.completed",
        }
    }
}
