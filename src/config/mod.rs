// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration management for inventory providers
//!
//! This module resolves the broker, logging and metrics settings a provider
//! runs with, either from the cluster config document or from the process
//! environment.
//!
//! # Environment Variables
//!
//! The following environment variables are read:
//!
//! - `ACG_CONFIG` - Path to the cluster config document. When set, every other
//!   variable below is ignored.
//! - `QUEUE_HOST` - Kafka host (default: `localhost`)
//! - `QUEUE_PORT` - Kafka port (default: `9092`)
//! - `METRICS_PORT` - Metrics exporter port (default: `9394`)
//! - `CW_AWS_ACCESS_KEY_ID` / `CW_AWS_SECRET_ACCESS_KEY` - CloudWatch credentials
//!
//! `QUEUE_HOST`, `QUEUE_PORT` and the two CloudWatch variables are written
//! back by [`Options::export_env`].
//!
//! # Example
//!
//! ```no_run
//! use inventory_providers_common::config::Options;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let options = Options::init_shared()?;
//!
//! println!("Kafka at {}:{}", options.kafka_host, options.kafka_port);
//! println!("Status topic: {}", options.kafka_topic("platform.sources.status"));
//! # Ok(())
//! # }
//! ```

mod clowder;
mod options;

pub use clowder::{
    BrokerConfig, ClowderConfig, CloudWatchConfig, KafkaConfig, LoggingConfig, TopicConfig,
};
pub use options::{OperationsArgs, Options, OptionsSource, TopicTable};

pub const ENV_ACG_CONFIG: &str = "ACG_CONFIG";
pub const ENV_QUEUE_HOST: &str = "QUEUE_HOST";
pub const ENV_QUEUE_PORT: &str = "QUEUE_PORT";
pub const ENV_METRICS_PORT: &str = "METRICS_PORT";
pub const ENV_CW_AWS_ACCESS_KEY_ID: &str = "CW_AWS_ACCESS_KEY_ID";
pub const ENV_CW_AWS_SECRET_ACCESS_KEY: &str = "CW_AWS_SECRET_ACCESS_KEY";

pub const DEFAULT_QUEUE_HOST: &str = "localhost";
pub const DEFAULT_QUEUE_PORT: u16 = 9092;
pub const DEFAULT_METRICS_PORT: u16 = 9394;
pub const DEFAULT_AWS_REGION: &str = "us-east-1";
pub const DEFAULT_LOG_GROUP: &str = "platform-dev";
