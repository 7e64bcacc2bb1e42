use crate::{
    document::ConvergeConfig, error::ConfigError, report::finding::Finding,
    validation::dependencies::check_dependencies,
};
use engine_core::settings::EngineSettings;
use model::definition::TableDefinition;
use std::collections::HashSet;
use tracing::warn;

pub const DATABASE_URL_ENV: &str = "DATABASE_URL";

/// Immutable, validated configuration used throughout a run.
#[derive(Debug, Clone)]
pub struct ValidatedConfig {
    url: Option<String>,
    settings: EngineSettings,
    definitions: Vec<TableDefinition>,
    /// Non-blocking findings of the cross-table checks.
    findings: Vec<Finding>,
}

impl ValidatedConfig {
    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn definitions(&self) -> &[TableDefinition] {
        &self.definitions
    }

    pub fn into_definitions(self) -> Vec<TableDefinition> {
        self.definitions
    }

    pub fn findings(&self) -> &[Finding] {
        &self.findings
    }

    /// Picks the connection URL: an explicit override wins, then
    /// `DATABASE_URL`, then the document's `connection.url`.
    pub fn connection_url(&self, explicit: Option<&str>) -> Result<String, ConfigError> {
        let from_env = std::env::var(DATABASE_URL_ENV).ok();
        pick_url(explicit, from_env.as_deref(), self.url.as_deref())
    }
}

fn pick_url(
    explicit: Option<&str>,
    from_env: Option<&str>,
    from_file: Option<&str>,
) -> Result<String, ConfigError> {
    [explicit, from_env, from_file]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|url| !url.is_empty())
        .map(str::to_string)
        .ok_or(ConfigError::MissingConnection)
}

fn validate_settings(settings: &EngineSettings) -> Result<(), ConfigError> {
    if settings.retries == 0 {
        return Err(ConfigError::InvalidSettings(
            "retries must be at least 1".into(),
        ));
    }
    if settings.query_retries == 0 {
        return Err(ConfigError::InvalidSettings(
            "query_retries must be at least 1".into(),
        ));
    }
    if settings.poll_interval_ms == 0 {
        return Err(ConfigError::InvalidSettings(
            "poll_interval_ms must be positive".into(),
        ));
    }
    Ok(())
}

impl TryFrom<ConvergeConfig> for ValidatedConfig {
    type Error = ConfigError;

    fn try_from(config: ConvergeConfig) -> Result<Self, Self::Error> {
        validate_settings(&config.settings)?;
        if config.tables.is_empty() {
            return Err(ConfigError::NoTables);
        }

        let mut seen = HashSet::new();
        let mut definitions = Vec::with_capacity(config.tables.len());
        for table in config.tables {
            let name = table.name.trim().to_string();
            let definition = table
                .into_definition(config.settings.retries)
                .map_err(|source| ConfigError::Definition {
                    table: name.clone(),
                    source,
                })?;

            if !seen.insert(definition.name().to_string()) {
                return Err(ConfigError::DuplicateTable(name));
            }
            definitions.push(definition);
        }

        let (blocking, findings): (Vec<_>, Vec<_>) = check_dependencies(&definitions)
            .into_iter()
            .partition(Finding::is_blocking);
        if !blocking.is_empty() {
            return Err(ConfigError::Validation(blocking));
        }
        for finding in &findings {
            warn!(table = %finding.table, code = %finding.code, "{}", finding.message);
        }

        Ok(Self {
            url: config.connection.map(|c| c.url),
            settings: config.settings,
            definitions,
            findings,
        })
    }
}
