use crate::{error::ConvergeError, probe::SchemaProbe, settings::EngineSettings};
use connectors::sql::base::adapter::SchemaAdapter;
use std::{
    fmt,
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Blocks until a table, or a column of a table, exists in the live schema.
///
/// Waits poll the schema rather than any in-memory registry, so they resolve
/// no matter which initializer ends up creating the awaited object. Without
/// a timeout or cancellation token a wait on an object that never appears
/// does not return.
#[derive(Clone)]
pub struct DependencyWaiter {
    probe: SchemaProbe,
    poll_interval: Duration,
    timeout: Option<Duration>,
    cancel: Option<CancellationToken>,
}

#[derive(Debug, Clone, Copy)]
enum Target<'a> {
    Table(&'a str),
    Column(&'a str, &'a str),
}

impl fmt::Display for Target<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Table(table) => write!(f, "table {table}"),
            Target::Column(table, column) => write!(f, "column {table}.{column}"),
        }
    }
}

impl DependencyWaiter {
    pub fn new(probe: SchemaProbe, poll_interval: Duration) -> Self {
        Self {
            probe,
            poll_interval,
            timeout: None,
            cancel: None,
        }
    }

    /// Waiter polling `adapter` with the interval, timeout and query retry
    /// budget of `settings`.
    pub fn from_settings(adapter: Arc<dyn SchemaAdapter>, settings: &EngineSettings) -> Self {
        let probe = SchemaProbe::new(adapter, settings.query_retry_policy());
        Self::new(probe, settings.poll_interval()).with_timeout(settings.wait_timeout())
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn probe(&self) -> &SchemaProbe {
        &self.probe
    }

    pub async fn wait_for_table(&self, table: &str) -> Result<(), ConvergeError> {
        self.poll_until(Target::Table(table)).await
    }

    pub async fn wait_for_column(&self, table: &str, column: &str) -> Result<(), ConvergeError> {
        self.poll_until(Target::Column(table, column)).await
    }

    /// Waits for the table, then for the column on it.
    pub async fn wait_for_table_column(
        &self,
        table: &str,
        column: &str,
    ) -> Result<(), ConvergeError> {
        self.wait_for_table(table).await?;
        self.wait_for_column(table, column).await
    }

    async fn poll_until(&self, target: Target<'_>) -> Result<(), ConvergeError> {
        let started = Instant::now();
        let mut polls = 0usize;

        loop {
            if let Some(token) = &self.cancel
                && token.is_cancelled()
            {
                return Err(ConvergeError::Cancelled {
                    target: target.to_string(),
                });
            }

            let present = match target {
                Target::Table(table) => self.probe.has_table(table).await?,
                Target::Column(table, column) => self.probe.has_column(table, column).await?,
            };
            if present {
                if polls > 0 {
                    debug!(%target, polls, "Dependency is available");
                }
                return Ok(());
            }

            if let Some(limit) = self.timeout
                && started.elapsed() >= limit
            {
                return Err(ConvergeError::WaitTimeout {
                    target: target.to_string(),
                    elapsed: started.elapsed(),
                });
            }

            polls += 1;
            debug!(%target, polls, "Waiting on dependency");
            self.pause(target).await?;
        }
    }

    async fn pause(&self, target: Target<'_>) -> Result<(), ConvergeError> {
        let Some(token) = &self.cancel else {
            sleep(self.poll_interval).await;
            return Ok(());
        };

        tokio::select! {
            _ = token.cancelled() => Err(ConvergeError::Cancelled {
                target: target.to_string(),
            }),
            _ = sleep(self.poll_interval) => Ok(()),
        }
    }
}
