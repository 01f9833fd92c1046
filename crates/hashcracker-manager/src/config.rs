use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Error;

#[derive(Clone, Debug, Deserialize, PartialEq, Eq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct HttpConfig {
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self { port: 8080 }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct HealthCheckConfig {
    pub period_ms: u64,
    pub max_tries: u32,
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        Self {
            period_ms: 5_000,
            max_tries: 3,
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct HashCrackerConfig {
    pub alphabet: String,
}

impl Default for HashCrackerConfig {
    fn default() -> Self {
        Self {
            alphabet: "abcdefghijklmnopqrstuvwxyz".to_string(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggerConfig {
    pub level: String,
    pub is_json: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            is_json: false,
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub http: HttpConfig,
    pub healthcheck: HealthCheckConfig,
    pub hash_cracker: HashCrackerConfig,
    pub logger: LoggerConfig,
}

impl Config {
    pub fn read(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.http.port == 0 {
            return Err(Error::InvalidInput("http.port must be non-zero".to_string()));
        }
        if self.hash_cracker.alphabet.is_empty() {
            return Err(Error::InvalidInput(
                "hash_cracker.alphabet must be non-empty".to_string(),
            ));
        }
        if self.healthcheck.max_tries == 0 {
            return Err(Error::InvalidInput(
                "healthcheck.max_tries must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
