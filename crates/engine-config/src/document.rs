use crate::{error::ConfigError, validated::ValidatedConfig};
use engine_core::settings::EngineSettings;
use model::definition::TableConfig;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path, str::FromStr};
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    pub url: String,
}

/// The JSON document describing a convergence run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConvergeConfig {
    #[serde(default)]
    pub connection: Option<ConnectionConfig>,
    #[serde(default)]
    pub settings: EngineSettings,
    #[serde(default)]
    pub tables: Vec<TableConfig>,
}

impl ConvergeConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "Loaded config file");
        text.parse()
    }

    /// Builds every table definition and runs the cross-table checks.
    pub fn validate(self) -> Result<ValidatedConfig, ConfigError> {
        ValidatedConfig::try_from(self)
    }
}

impl FromStr for ConvergeConfig {
    type Err = ConfigError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        Ok(serde_json::from_str(text)?)
    }
}
