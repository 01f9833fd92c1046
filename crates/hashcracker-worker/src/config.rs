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
        Self { port: 8081 }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct RegistererConfig {
    pub register_url: String,
    pub self_port: u16,
}

impl Default for RegistererConfig {
    fn default() -> Self {
        Self {
            register_url: "http://127.0.0.1:8080/api/hash/register-worker".to_string(),
            self_port: 8081,
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct NotifierConfig {
    pub notify_url: String,
    pub self_port: u16,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            notify_url: "http://127.0.0.1:8080/api/tasks/progress".to_string(),
            self_port: 8081,
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct WorkerConfig {
    pub max_parallel: usize,
    pub notify_period_ms: u64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            max_parallel: 4,
            notify_period_ms: 5_000,
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
    pub registerer: RegistererConfig,
    pub notifier: NotifierConfig,
    pub worker: WorkerConfig,
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
        if self.worker.max_parallel == 0 {
            return Err(Error::InvalidInput(
                "worker.max_parallel must be at least 1".to_string(),
            ));
        }
        if self.registerer.register_url.is_empty() {
            return Err(Error::InvalidInput(
                "registerer.register_url must be non-empty".to_string(),
            ));
        }
        if self.notifier.notify_url.is_empty() {
            return Err(Error::InvalidInput(
                "notifier.notify_url must be non-empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        Config::default().validate().unwrap();
    }

    #[test]
    fn rejects_zero_max_parallel() {
        let mut config = Config::default();
        config.worker.max_parallel = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn unknown_field_is_rejected_at_deserialize_time() {
        let yaml = "http:\n  port: 8081\n  bogus: true\n";
        assert!(serde_yaml::from_str::<Config>(yaml).is_err());
    }
}
