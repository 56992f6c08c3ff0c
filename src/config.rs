use crate::readiness::{ReadinessRequest, RequestError};
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

const ENV_PREFIX: &str = "SSM_READY";
const DEFAULT_CONFIG_FILE: &str = "config/local";

/// Settings for one readiness wait, resolved from a config file and `SSM_READY__*` variables.
#[derive(Debug, Clone, Deserialize)]
pub struct ReadyConfig {
    #[serde(default)]
    pub instance_ids: Vec<String>,
    /// Status phase timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,
    /// Seconds between status polls.
    #[serde(default = "default_interval")]
    pub interval: u64,
    #[serde(default)]
    pub script_path: Option<String>,
}

impl Default for ReadyConfig {
    fn default() -> Self {
        Self {
            instance_ids: Vec::new(),
            timeout: default_timeout(),
            interval: default_interval(),
            script_path: None,
        }
    }
}

const fn default_timeout() -> u64 {
    300
}

const fn default_interval() -> u64 {
    10
}

impl ReadyConfig {
    pub fn load() -> Result<Self, ConfigError> {
        Self::builder(File::with_name(DEFAULT_CONFIG_FILE).required(false))
    }

    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::builder(File::from(path.as_ref()).required(true))
    }

    fn builder<S>(file: S) -> Result<Self, ConfigError>
    where
        S: config::Source + Send + Sync + 'static,
    {
        Config::builder()
            .add_source(file)
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("instance_ids")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    pub fn request(&self) -> Result<ReadinessRequest, RequestError> {
        Ok(ReadinessRequest::new(self.instance_ids.iter().cloned())?
            .with_timeout(Duration::from_secs(self.timeout))
            .with_interval(Duration::from_secs(self.interval)))
    }
}
