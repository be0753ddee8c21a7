// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cluster-provided application config
//!
//! When running under the managed cluster platform, the operator mounts a JSON
//! document into the pod and points `ACG_CONFIG` at it. This module models
//! the parts of that document the providers consume.
//!
//! # Example
//!
//! ```no_run
//! use inventory_providers_common::config::ClowderConfig;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! if ClowderConfig::is_enabled() {
//!     let config = ClowderConfig::load()?;
//!     if let Some(broker) = config.kafka.first_broker() {
//!         println!("Kafka at {}", broker.address());
//!     }
//! }
//! # Ok(())
//! # }
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{InventoryError, Result};

use super::{DEFAULT_QUEUE_PORT, ENV_ACG_CONFIG};

/// The cluster config document
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClowderConfig {
    /// Port the metrics exporter should listen on
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics_port: Option<u16>,

    /// Path the metrics are served under
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics_path: Option<String>,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub kafka: KafkaConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cloudwatch: Option<CloudWatchConfig>,
}

/// CloudWatch credentials handed to the logger
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CloudWatchConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_key_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_access_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_group: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct KafkaConfig {
    #[serde(default)]
    pub brokers: Vec<BrokerConfig>,

    #[serde(default)]
    pub topics: Vec<TopicConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BrokerConfig {
    pub hostname: String,
    /// Brokers may omit the port; Kafka's default applies then
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
}

/// A topic the application asked for and the name the cluster gave it
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TopicConfig {
    pub requested_name: String,
    pub name: String,
}

impl ClowderConfig {
    /// Whether a cluster config document is available.
    ///
    /// True when `ACG_CONFIG` is set to a non-empty value.
    pub fn is_enabled() -> bool {
        std::env::var(ENV_ACG_CONFIG)
            .map(|v| !v.is_empty())
            .unwrap_or(false)
    }

    /// Path of the document, taken from `ACG_CONFIG`
    ///
    /// # Errors
    ///
    /// Returns an error if `ACG_CONFIG` is unset or empty.
    pub fn config_path() -> Result<PathBuf> {
        match std::env::var(ENV_ACG_CONFIG) {
            Ok(path) if !path.is_empty() => Ok(PathBuf::from(path)),
            _ => Err(InventoryError::Config(format!(
                "{} is not set",
                ENV_ACG_CONFIG
            ))),
        }
    }

    /// Load the document pointed to by `ACG_CONFIG`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `ACG_CONFIG` is not set
    /// - The file cannot be read
    /// - The file is malformed JSON
    pub fn load() -> Result<Self> {
        Self::load_from_path(Self::config_path()?)
    }

    /// Load the document from a specific path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is malformed.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            InventoryError::Config(format!(
                "Failed to read cluster config {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;

        Self::from_json(&content)
    }

    /// Parse the document from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| InventoryError::Config(format!("Failed to parse cluster config: {}", e)))
    }

    /// Serialize the document back to JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn cloudwatch(&self) -> Option<&CloudWatchConfig> {
        self.logging.cloudwatch.as_ref()
    }
}

impl KafkaConfig {
    pub fn first_broker(&self) -> Option<&BrokerConfig> {
        self.brokers.first()
    }
}

impl BrokerConfig {
    pub fn port_or_default(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_QUEUE_PORT)
    }

    /// `host:port` form used by Kafka clients
    pub fn address(&self) -> String {
        format!("{}:{}", self.hostname, self.port_or_default())
    }
}
