// SPDX-License-Identifier: MIT OR Apache-2.0

//! Sources API client used by the providers.
//!
//! [`SourcesApiClient`] picks the authentication headers once, at
//! construction, then either delegates straight to [`SourcesApi`] (updates) or
//! composes a few list calls into the lookups the providers need.

mod identity;

#[cfg(test)]
mod tests;

pub use identity::{auth_headers, Identity, HEADER_ACCOUNT_NUMBER, HEADER_IDENTITY, HEADER_PSK};

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;
use url::Url;

use crate::api::{
    Application, ApplicationUpdate, Authentication, Endpoint, EndpointUpdate, SourceUpdate,
    SourcesApi,
};
use crate::error::{InventoryError, Result};
use crate::runtime::RequestLogger;

pub const ENV_SOURCES_SCHEME: &str = "SOURCES_SCHEME";
pub const ENV_SOURCES_HOST: &str = "SOURCES_HOST";
pub const ENV_SOURCES_PORT: &str = "SOURCES_PORT";
pub const ENV_SOURCES_PSK: &str = "SOURCES_PSK";

pub const DEFAULT_BASE_PATH: &str = "/api/sources/v3.0";
pub const INTERNAL_BASE_PATH: &str = "/internal/v1.0";

#[derive(Clone, Debug)]
pub struct SourcesApiConfig {
    /// Scheme, host and port of the Sources API, e.g. `http://sources-api:8000`
    pub base_url: String,
    pub base_path: String,
    pub internal_base_path: String,
    /// Pre-shared key; when set, replaces forwarded identity headers
    pub psk: Option<String>,
    pub timeout: Duration,
}

impl Default for SourcesApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            base_path: DEFAULT_BASE_PATH.to_string(),
            internal_base_path: INTERNAL_BASE_PATH.to_string(),
            psk: None,
            timeout: Duration::from_secs(30),
        }
    }
}

impl SourcesApiConfig {
    /// Build a config from `SOURCES_SCHEME`, `SOURCES_HOST`, `SOURCES_PORT`
    /// and `SOURCES_PSK`, falling back to the defaults.
    pub fn from_env() -> Self {
        Self::from_env_with(|key| std::env::var(key).ok())
    }

    pub fn from_env_with<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.is_empty());
        let mut config = Self::default();

        if let Some(host) = non_empty(ENV_SOURCES_HOST) {
            let scheme = non_empty(ENV_SOURCES_SCHEME).unwrap_or_else(|| "http".to_string());
            config.base_url = match non_empty(ENV_SOURCES_PORT) {
                Some(port) => format!("{}://{}:{}", scheme, host, port),
                None => format!("{}://{}", scheme, host),
            };
        }
        config.psk = non_empty(ENV_SOURCES_PSK);
        config
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    #[must_use]
    pub fn with_psk(mut self, psk: impl Into<String>) -> Self {
        self.psk = Some(psk.into());
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[derive(Clone, Debug)]
pub struct SourcesApiClient {
    api: SourcesApi,
}

impl SourcesApiClient {
    /// Create a client acting for `identity`.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid, if a PSK is configured and
    /// the identity carries no decodable account number, or if the HTTP
    /// client cannot be built.
    pub fn new(config: SourcesApiConfig, identity: Option<&Identity>) -> Result<Self> {
        Self::with_logger(config, identity, RequestLogger::new())
    }

    /// Like [`SourcesApiClient::new`], logging requests through `logger`.
    pub fn with_logger(
        config: SourcesApiConfig,
        identity: Option<&Identity>,
        logger: RequestLogger,
    ) -> Result<Self> {
        let base_url = Url::parse(&config.base_url).map_err(|e| {
            InventoryError::Config(format!("Invalid Sources API URL {:?}: {}", config.base_url, e))
        })?;
        let headers = auth_headers(identity, config.psk.as_deref())?;
        debug!(
            base_url = %base_url,
            psk = config.psk.is_some(),
            "Creating Sources API client"
        );

        let http = reqwest::Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            api: SourcesApi::new(
                http,
                base_url,
                config.base_path,
                config.internal_base_path,
                headers,
                Arc::new(logger),
            ),
        })
    }

    /// Access the underlying API
    pub fn api(&self) -> &SourcesApi {
        &self.api
    }

    pub fn default_headers(&self) -> &http::HeaderMap {
        self.api.default_headers()
    }

    pub async fn update_source(&self, source_id: &str, update: &SourceUpdate) -> Result<()> {
        self.api.update_source(source_id, update).await
    }

    pub async fn update_endpoint(&self, endpoint_id: &str, update: &EndpointUpdate) -> Result<()> {
        self.api.update_endpoint(endpoint_id, update).await
    }

    pub async fn update_application(
        &self,
        application_id: &str,
        update: &ApplicationUpdate,
    ) -> Result<()> {
        self.api.update_application(application_id, update).await
    }

    /// The source's default endpoint.
    ///
    /// Returns `None` when the source has no endpoint flagged default, or the
    /// source is unknown (404).
    ///
    /// # Errors
    ///
    /// Any failure other than 404.
    pub async fn fetch_default_endpoint(&self, source_id: &str) -> Result<Option<Endpoint>> {
        let endpoints = or_empty(self.api.list_source_endpoints(source_id).await)?;
        Ok(endpoints.into_iter().find(Endpoint::is_default))
    }

    /// The source's first application, `None` if it has none or the source is
    /// unknown (404).
    ///
    /// # Errors
    ///
    /// Any failure other than 404.
    pub async fn fetch_application(&self, source_id: &str) -> Result<Option<Application>> {
        let applications = or_empty(self.api.list_source_applications(source_id).await)?;
        Ok(applications.into_iter().next())
    }

    /// Credentials of an endpoint, with the password exposed.
    ///
    /// Uses `endpoint` when given, otherwise the source's default endpoint.
    /// Picks the first authentication of type `authtype`, or simply the first
    /// one when `authtype` is `None`, then re-reads it through the internal
    /// API to get the password.
    ///
    /// Returns `None` if there is no endpoint, no (matching) authentication.
    ///
    /// # Errors
    ///
    /// Any failure other than a 404 from a list call.
    pub async fn fetch_authentication(
        &self,
        source_id: &str,
        endpoint: Option<&Endpoint>,
        authtype: Option<&str>,
    ) -> Result<Option<Authentication>> {
        let endpoint = match endpoint {
            Some(endpoint) => endpoint.clone(),
            None => match self.fetch_default_endpoint(source_id).await? {
                Some(endpoint) => endpoint,
                None => {
                    debug!(source_id, "No default endpoint, skipping authentication lookup");
                    return Ok(None);
                }
            },
        };

        let authentications =
            or_empty(self.api.list_endpoint_authentications(&endpoint.id).await)?;
        let selected = match authtype {
            None => authentications.into_iter().next(),
            Some(authtype) => authentications
                .into_iter()
                .find(|a| a.authtype.as_deref() == Some(authtype)),
        };

        match selected {
            Some(auth) => Ok(Some(
                self.api.show_authentication_with_password(&auth.id).await?,
            )),
            None => {
                debug!(
                    source_id,
                    endpoint_id = %endpoint.id,
                    ?authtype,
                    "No matching authentication"
                );
                Ok(None)
            }
        }
    }
}

fn or_empty<T>(result: Result<crate::api::ListResponse<T>>) -> Result<Vec<T>> {
    match result {
        Ok(list) => Ok(list.data),
        Err(e) if e.is_not_found() => Ok(Vec::new()),
        Err(e) => Err(e),
    }
}
