// SPDX-License-Identifier: MIT OR Apache-2.0

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod runtime;
pub mod testkit;

pub use client::{Identity, SourcesApiClient, SourcesApiConfig};
pub use config::{OperationsArgs, Options};
pub use error::InventoryError;
