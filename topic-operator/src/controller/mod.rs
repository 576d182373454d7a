pub mod topic;

use serde::Deserialize;
use std::{collections::HashMap, time::Duration};

#[derive(Clone, Debug, Deserialize)]
pub struct ControllerConfig {
    /// Interval between re-synchronizations of a settled resource.
    #[serde(with = "humantime_serde", default = "default::sync_interval")]
    pub sync_interval: Duration,

    /// Delay before re-checking a resource we just mutated, and the requeue
    /// delay after a temporary failure.
    #[serde(with = "humantime_serde", default = "default::retry_delay")]
    pub retry_delay: Duration,

    /// Timeout for Kafka admin operations.
    #[serde(with = "humantime_serde", default = "default::timeout")]
    pub timeout: Duration,

    /// Properties applied to newly created topics.
    #[serde(default)]
    pub properties: HashMap<String, String>,
}

impl ControllerConfig {
    /// Translate the configuration from env-var style keys (with underscore) to Kafka style keys (with dots).
    pub fn translate(mut self) -> Self {
        self.properties = std::mem::take(&mut self.properties)
            .into_iter()
            .map(|(k, v)| (k.replace('_', "."), v))
            .collect();
        self
    }
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            sync_interval: default::sync_interval(),
            retry_delay: default::retry_delay(),
            timeout: default::timeout(),
            properties: Default::default(),
        }
    }
}

mod default {
    use std::time::Duration;

    pub(crate) const fn sync_interval() -> Duration {
        Duration::from_secs(5 * 60)
    }

    pub(crate) const fn retry_delay() -> Duration {
        Duration::from_secs(10)
    }

    pub(crate) const fn timeout() -> Duration {
        Duration::from_secs(30)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn translate_keys() {
        let config = ControllerConfig {
            properties: [("retention_ms".to_string(), "3600000".to_string())].into(),
            ..Default::default()
        };

        let config = config.translate();
        assert_eq!(
            config.properties.get("retention.ms").map(String::as_str),
            Some("3600000")
        );
    }

    #[test]
    fn defaults() {
        let config = ControllerConfig::default();
        assert_eq!(config.sync_interval, Duration::from_secs(300));
        assert_eq!(config.retry_delay, Duration::from_secs(10));
    }
}
