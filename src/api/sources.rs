// SPDX-License-Identifier: MIT OR Apache-2.0

//! Low-level Sources API calls.
//!
//! One method per REST operation the providers use. Nothing here interprets
//! responses beyond decoding them: every non-success status, 404 included,
//! comes back as [`InventoryError::Api`].

use std::sync::Arc;

use http::header::{HeaderValue, ACCEPT};
use http::{HeaderMap, Method};
use serde::de::DeserializeOwned;
use serde::Serialize;
use url::Url;

use super::models::{
    Application, ApplicationUpdate, Authentication, Endpoint, EndpointUpdate, ListResponse,
    SourceUpdate,
};
use crate::error::{InventoryError, Result};
use crate::runtime::RequestLogger;

/// Which route tree a request is sent to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ApiTarget {
    /// The public, versioned API (`/api/sources/v3.0`)
    #[default]
    Public,
    /// The internal-only API (`/internal/v1.0`), which can expose secrets
    Internal,
}

#[derive(Debug, Clone)]
pub struct SourcesApi {
    http: reqwest::Client,
    base_url: Url,
    base_path: String,
    internal_base_path: String,
    headers: HeaderMap,
    logger: Arc<RequestLogger>,
}

impl SourcesApi {
    pub fn new(
        http: reqwest::Client,
        base_url: Url,
        base_path: impl Into<String>,
        internal_base_path: impl Into<String>,
        headers: HeaderMap,
        logger: Arc<RequestLogger>,
    ) -> Self {
        Self {
            http,
            base_url,
            base_path: base_path.into(),
            internal_base_path: internal_base_path.into(),
            headers,
            logger,
        }
    }

    /// Headers sent with every request
    pub fn default_headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn logger(&self) -> &RequestLogger {
        &self.logger
    }

    /// Absolute URL of `path` under the given route tree.
    ///
    /// Repeated slashes are collapsed, so `path` may or may not start with one.
    pub fn request_url(&self, target: ApiTarget, path: &str) -> Url {
        let base_path = match target {
            ApiTarget::Public => &self.base_path,
            ApiTarget::Internal => &self.internal_base_path,
        };
        let joined = normalize_path(&format!("{}/{}/{}", self.base_url.path(), base_path, path));

        let mut url = self.base_url.clone();
        url.set_path(&joined);
        url.set_query(None);
        url
    }

    /// `GET /sources/{id}/endpoints`
    pub async fn list_source_endpoints(&self, source_id: &str) -> Result<ListResponse<Endpoint>> {
        let url = self.request_url(ApiTarget::Public, &format!("/sources/{}/endpoints", source_id));
        self.get_json(url).await
    }

    /// `GET /sources/{id}/applications`
    pub async fn list_source_applications(
        &self,
        source_id: &str,
    ) -> Result<ListResponse<Application>> {
        let url = self.request_url(
            ApiTarget::Public,
            &format!("/sources/{}/applications", source_id),
        );
        self.get_json(url).await
    }

    /// `GET /endpoints/{id}/authentications`
    pub async fn list_endpoint_authentications(
        &self,
        endpoint_id: &str,
    ) -> Result<ListResponse<Authentication>> {
        let url = self.request_url(
            ApiTarget::Public,
            &format!("/endpoints/{}/authentications", endpoint_id),
        );
        self.get_json(url).await
    }

    /// `GET {internal}/authentications/{id}?expose_encrypted_attribute[]=password`
    pub async fn show_authentication_with_password(
        &self,
        authentication_id: &str,
    ) -> Result<Authentication> {
        let mut url = self.request_url(
            ApiTarget::Internal,
            &format!("/authentications/{}", authentication_id),
        );
        url.query_pairs_mut()
            .append_pair("expose_encrypted_attribute[]", "password");
        self.get_json(url).await
    }

    /// `PATCH /sources/{id}`
    pub async fn update_source(&self, source_id: &str, update: &SourceUpdate) -> Result<()> {
        let url = self.request_url(ApiTarget::Public, &format!("/sources/{}", source_id));
        self.patch(url, update).await
    }

    /// `PATCH /endpoints/{id}`
    pub async fn update_endpoint(&self, endpoint_id: &str, update: &EndpointUpdate) -> Result<()> {
        let url = self.request_url(ApiTarget::Public, &format!("/endpoints/{}", endpoint_id));
        self.patch(url, update).await
    }

    /// `PATCH /applications/{id}`
    pub async fn update_application(
        &self,
        application_id: &str,
        update: &ApplicationUpdate,
    ) -> Result<()> {
        let url = self.request_url(
            ApiTarget::Public,
            &format!("/applications/{}", application_id),
        );
        self.patch(url, update).await
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        let request = self.http.request(Method::GET, url);
        let response = self.execute(request).await?;
        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    async fn patch<B: Serialize + ?Sized>(&self, url: Url, body: &B) -> Result<()> {
        let request = self.http.request(Method::PATCH, url).json(body);
        self.execute(request).await?;
        Ok(())
    }

    async fn execute(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response> {
        let request = request
            .headers(self.headers.clone())
            .header(ACCEPT, HeaderValue::from_static("application/json"))
            .build()?;

        let span = self
            .logger
            .start(request.method().as_str(), request.url().as_str(), request.headers());

        match self.http.execute(request).await {
            Ok(response) => {
                let status = response.status();
                if status.is_success() {
                    self.logger.finish_success(span, status.as_u16());
                    Ok(response)
                } else {
                    let message = response.text().await.unwrap_or_default();
                    self.logger
                        .finish_error(span, &format!("status {}", status.as_u16()));
                    Err(InventoryError::Api {
                        status: status.as_u16(),
                        message,
                    })
                }
            }
            Err(e) => {
                self.logger.finish_error(span, &e.to_string());
                Err(e.into())
            }
        }
    }
}

fn normalize_path(raw: &str) -> String {
    let mut path = String::with_capacity(raw.len());
    for segment in raw.split('/').filter(|s| !s.is_empty()) {
        path.push('/');
        path.push_str(segment);
    }
    if path.is_empty() {
        path.push('/');
    }
    path
}
