use crate::{
    error::AdapterError,
    memory::MemorySchema,
    sql::{base::adapter::SchemaAdapter, postgres::adapter::PgAdapter},
};
use std::sync::Arc;

const MEMORY_SCHEME: &str = "memory";

#[derive(Clone)]
pub enum Adapter {
    Postgres(PgAdapter),
    Memory(Arc<MemorySchema>),
}

impl Adapter {
    /// Picks an engine from the URL scheme: `postgres://` / `postgresql://`
    /// (or a libpq key/value string) for Postgres, `memory://` for the
    /// in-process engine.
    pub async fn connect(url: &str) -> Result<Self, AdapterError> {
        match url.split_once("://").map(|(scheme, _)| scheme.to_lowercase()) {
            Some(scheme) if scheme == MEMORY_SCHEME => {
                Ok(Adapter::Memory(Arc::new(MemorySchema::new())))
            }
            Some(scheme) if scheme == "postgres" || scheme == "postgresql" => {
                Ok(Adapter::Postgres(PgAdapter::connect(url).await?))
            }
            None => Ok(Adapter::Postgres(PgAdapter::connect(url).await?)),
            Some(scheme) => Err(AdapterError::UnsupportedScheme(scheme)),
        }
    }

    pub fn schema(&self) -> Arc<dyn SchemaAdapter> {
        match self {
            Adapter::Postgres(adapter) => Arc::new(adapter.clone()),
            Adapter::Memory(schema) => schema.clone(),
        }
    }

    pub async fn ping(&self) -> Result<(), AdapterError> {
        match self {
            Adapter::Postgres(adapter) => Ok(adapter.ping().await?),
            Adapter::Memory(_) => Ok(()),
        }
    }
}
