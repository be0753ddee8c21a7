// SPDX-License-Identifier: MIT OR Apache-2.0

//! Helpers for testing code that reads the cluster config.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::config::{
    BrokerConfig, ClowderConfig, CloudWatchConfig, KafkaConfig, LoggingConfig, TopicConfig,
    ENV_ACG_CONFIG,
};
use crate::error::{InventoryError, Result};

/// A cluster config document written to a temporary directory.
///
/// The directory is removed when the fixture is dropped.
pub struct ClusterConfigFixture {
    _dir: TempDir,
    path: PathBuf,
}

impl ClusterConfigFixture {
    /// Write `config` as `cdappconfig.json` in a fresh temporary directory.
    pub fn write(config: &ClowderConfig) -> Result<Self> {
        let dir = TempDir::new()
            .map_err(|e| InventoryError::Config(format!("Failed to create temp dir: {e}")))?;
        let path = dir.path().join("cdappconfig.json");
        fs::write(&path, config.to_json()?).map_err(|e| {
            InventoryError::Config(format!("Failed to write {}: {e}", path.display()))
        })?;

        Ok(Self { _dir: dir, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Point `ACG_CONFIG` at this document.
    ///
    /// Mutates the process environment; callers should serialize tests that
    /// use it.
    pub fn activate(&self) {
        std::env::set_var(ENV_ACG_CONFIG, &self.path);
    }

    /// Remove `ACG_CONFIG` from the environment.
    pub fn deactivate(&self) {
        std::env::remove_var(ENV_ACG_CONFIG);
    }

    /// A document shaped like the ones the platform generates.
    pub fn sample() -> ClowderConfig {
        ClowderConfig {
            metrics_port: Some(9000),
            metrics_path: Some("/metrics".to_string()),
            logging: LoggingConfig {
                cloudwatch: Some(CloudWatchConfig {
                    access_key_id: Some("cw-access-key".to_string()),
                    secret_access_key: Some("cw-secret-key".to_string()),
                    region: Some("us-east-1".to_string()),
                    log_group: Some("platform".to_string()),
                }),
            },
            kafka: KafkaConfig {
                brokers: vec![BrokerConfig {
                    hostname: "env-kafka-bootstrap.svc".to_string(),
                    port: Some(9092),
                }],
                topics: vec![
                    TopicConfig {
                        requested_name: "platform.sources.status".to_string(),
                        name: "env-platform.sources.status".to_string(),
                    },
                    TopicConfig {
                        requested_name: "platform.topological-inventory.operations-openshift"
                            .to_string(),
                        name: "env-operations-openshift".to_string(),
                    },
                ],
            },
        }
    }
}

impl Drop for ClusterConfigFixture {
    fn drop(&mut self) {
        if std::env::var_os(ENV_ACG_CONFIG).as_deref() == Some(self.path.as_os_str()) {
            self.deactivate();
        }
    }
}
