// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed access to the Sources REST API.
//!
//! [`SourcesApi`] maps each REST operation to one method and decodes the
//! response into the models in [`models`]. Header policy and not-found
//! handling live one level up in [`crate::client`].

pub mod models;
mod sources;

pub use models::{
    Application, ApplicationUpdate, Authentication, Endpoint, EndpointUpdate, ListResponse,
    Source, SourceUpdate, STATUS_AVAILABLE, STATUS_UNAVAILABLE,
};
pub use sources::{ApiTarget, SourcesApi};
