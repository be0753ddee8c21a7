// SPDX-License-Identifier: MIT OR Apache-2.0

//! Resolved operational settings
//!
//! [`Options`] is built either from the cluster config document or from the
//! process environment, never both. The values are then passed to whatever
//! needs them; [`Options::export_env`] additionally publishes the broker and
//! logging settings for libraries that only read the environment.

use std::collections::HashMap;
use std::sync::OnceLock;

use tracing::{debug, info};

use crate::error::{InventoryError, Result};

use super::clowder::ClowderConfig;
use super::{
    DEFAULT_AWS_REGION, DEFAULT_LOG_GROUP, DEFAULT_METRICS_PORT, DEFAULT_QUEUE_HOST,
    DEFAULT_QUEUE_PORT, ENV_CW_AWS_ACCESS_KEY_ID, ENV_CW_AWS_SECRET_ACCESS_KEY, ENV_METRICS_PORT,
    ENV_QUEUE_HOST, ENV_QUEUE_PORT,
};

static SHARED: OnceLock<Options> = OnceLock::new();

/// Where a set of [`Options`] was resolved from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionsSource {
    ClusterConfig,
    Environment,
}

/// Requested topic name -> physical topic name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TopicTable(HashMap<String, String>);

impl TopicTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, requested: impl Into<String>, physical: impl Into<String>) {
        self.0.insert(requested.into(), physical.into());
    }

    /// Physical name for `requested`, or `requested` itself when unmapped.
    #[must_use]
    pub fn resolve<'a>(&'a self, requested: &'a str) -> &'a str {
        self.0.get(requested).map(String::as_str).unwrap_or(requested)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for TopicTable {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Arguments operation workers are started with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationsArgs {
    pub metrics_port: u16,
    pub queue_host: String,
    pub queue_port: u16,
}

/// Broker, logging and metrics settings
#[derive(Debug, Clone, PartialEq)]
pub struct Options {
    pub source: OptionsSource,
    pub aws_access_key_id: Option<String>,
    pub aws_secret_access_key: Option<String>,
    pub aws_region: String,
    pub log_group: String,
    pub kafka_host: String,
    pub kafka_port: u16,
    /// Every known broker as `host:port`
    pub kafka_brokers: Vec<String>,
    pub kafka_topics: TopicTable,
    pub metrics_port: u16,
    /// Only provided by the cluster config
    pub metrics_path: Option<String>,
}

impl Options {
    /// Resolve options from the cluster config when `ACG_CONFIG` is set,
    /// otherwise from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the cluster config cannot be loaded or an
    /// environment value is malformed.
    pub fn load() -> Result<Self> {
        if ClowderConfig::is_enabled() {
            let config = ClowderConfig::load()?;
            Self::from_cluster_config(&config)
        } else {
            Self::from_env()
        }
    }

    /// The process-wide instance.
    ///
    /// The first call resolves the options and exports them to the
    /// environment; later calls return the cached instance untouched.
    ///
    /// # Errors
    ///
    /// Returns an error if the first resolution fails. Nothing is cached in
    /// that case.
    pub fn init_shared() -> Result<&'static Options> {
        if let Some(options) = SHARED.get() {
            return Ok(options);
        }

        let resolved = Self::load()?;
        let options = SHARED.get_or_init(|| resolved);
        options.export_env();
        Ok(options)
    }

    /// The process-wide instance, if [`Options::init_shared`] succeeded.
    pub fn shared() -> Option<&'static Options> {
        SHARED.get()
    }

    /// Build options from a cluster config document.
    ///
    /// # Errors
    ///
    /// Returns an error if the document lists no Kafka brokers.
    pub fn from_cluster_config(config: &ClowderConfig) -> Result<Self> {
        let broker = config.kafka.first_broker().ok_or_else(|| {
            InventoryError::Config("Cluster config lists no Kafka brokers".to_string())
        })?;
        let cloudwatch = config.cloudwatch().cloned().unwrap_or_default();

        let options = Self {
            source: OptionsSource::ClusterConfig,
            aws_access_key_id: cloudwatch.access_key_id,
            aws_secret_access_key: cloudwatch.secret_access_key,
            aws_region: cloudwatch
                .region
                .unwrap_or_else(|| DEFAULT_AWS_REGION.to_string()),
            log_group: cloudwatch
                .log_group
                .unwrap_or_else(|| DEFAULT_LOG_GROUP.to_string()),
            kafka_host: broker.hostname.clone(),
            kafka_port: broker.port_or_default(),
            kafka_brokers: config.kafka.brokers.iter().map(|b| b.address()).collect(),
            kafka_topics: config
                .kafka
                .topics
                .iter()
                .map(|t| (t.requested_name.clone(), t.name.clone()))
                .collect(),
            metrics_port: config.metrics_port.unwrap_or(DEFAULT_METRICS_PORT),
            metrics_path: config.metrics_path.clone(),
        };

        info!(
            kafka_host = %options.kafka_host,
            kafka_port = options.kafka_port,
            topics = options.kafka_topics.len(),
            "Resolved options from cluster config"
        );
        Ok(options)
    }

    /// Build options from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if `QUEUE_PORT` or `METRICS_PORT` is not a port number.
    pub fn from_env() -> Result<Self> {
        Self::from_env_with(|key| std::env::var(key).ok())
    }

    /// Build options from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns an error if `QUEUE_PORT` or `METRICS_PORT` is not a port number.
    pub fn from_env_with<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let kafka_host = lookup(ENV_QUEUE_HOST).unwrap_or_else(|| DEFAULT_QUEUE_HOST.to_string());
        let kafka_port = parse_port(ENV_QUEUE_PORT, lookup(ENV_QUEUE_PORT), DEFAULT_QUEUE_PORT)?;
        let metrics_port =
            parse_port(ENV_METRICS_PORT, lookup(ENV_METRICS_PORT), DEFAULT_METRICS_PORT)?;

        let options = Self {
            source: OptionsSource::Environment,
            aws_access_key_id: lookup(ENV_CW_AWS_ACCESS_KEY_ID),
            aws_secret_access_key: lookup(ENV_CW_AWS_SECRET_ACCESS_KEY),
            aws_region: DEFAULT_AWS_REGION.to_string(),
            log_group: DEFAULT_LOG_GROUP.to_string(),
            kafka_brokers: vec![format!("{}:{}", kafka_host, kafka_port)],
            kafka_host,
            kafka_port,
            kafka_topics: TopicTable::new(),
            metrics_port,
            metrics_path: None,
        };

        info!(
            kafka_host = %options.kafka_host,
            kafka_port = options.kafka_port,
            "Resolved options from environment"
        );
        Ok(options)
    }

    /// Physical topic name for a requested one; unmapped names pass through.
    #[must_use]
    pub fn kafka_topic<'a>(&'a self, name: &'a str) -> &'a str {
        self.kafka_topics.resolve(name)
    }

    #[must_use]
    pub fn operations_args(&self) -> OperationsArgs {
        OperationsArgs {
            metrics_port: self.metrics_port,
            queue_host: self.kafka_host.clone(),
            queue_port: self.kafka_port,
        }
    }

    /// Variables published by [`Options::export_env`]. `None` means the
    /// variable is removed.
    #[must_use]
    pub fn env_exports(&self) -> Vec<(&'static str, Option<String>)> {
        vec![
            (ENV_QUEUE_HOST, Some(self.kafka_host.clone())),
            (ENV_QUEUE_PORT, Some(self.kafka_port.to_string())),
            (ENV_CW_AWS_ACCESS_KEY_ID, self.aws_access_key_id.clone()),
            (
                ENV_CW_AWS_SECRET_ACCESS_KEY,
                self.aws_secret_access_key.clone(),
            ),
        ]
    }

    /// Overwrite the broker and logging variables with the resolved values.
    ///
    /// Must run before other threads read the environment. Running it again
    /// writes the same values.
    pub fn export_env(&self) {
        for (key, value) in self.env_exports() {
            match value {
                Some(value) => std::env::set_var(key, value),
                None => std::env::remove_var(key),
            }
        }
        debug!(
            queue_host = %self.kafka_host,
            queue_port = self.kafka_port,
            "Exported options to environment"
        );
    }
}

fn parse_port(key: &str, value: Option<String>, default: u16) -> Result<u16> {
    match value {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e| {
            InventoryError::Config(format!("{} is not a valid port ({:?}): {}", key, raw, e))
        }),
    }
}
