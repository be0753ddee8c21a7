// SPDX-License-Identifier: MIT OR Apache-2.0

//! Forwarded identity and the header policy derived from it.
//!
//! Callers hand the client the identity headers of the request they are
//! acting for. With a pre-shared key (PSK) configured, those headers are not
//! forwarded; instead the PSK and the account number decoded from
//! `x-rh-identity` are sent.

use std::collections::BTreeMap;

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig, STANDARD};
use base64::engine::DecodePaddingMode;
use base64::Engine;
use http::header::{HeaderName, HeaderValue};
use http::HeaderMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{InventoryError, Result};

pub const HEADER_IDENTITY: &str = "x-rh-identity";
pub const HEADER_PSK: &str = "x-rh-sources-psk";
pub const HEADER_ACCOUNT_NUMBER: &str = "x-rh-sources-account-number";

// Gateways differ on whether the identity token is padded.
const IDENTITY_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

#[derive(Debug, Serialize, Deserialize)]
struct IdentityToken {
    identity: IdentityBody,
}

#[derive(Debug, Serialize, Deserialize)]
struct IdentityBody {
    #[serde(default)]
    account_number: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    user: Option<Value>,
}

/// Identity headers forwarded on behalf of a tenant
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Identity {
    headers: BTreeMap<String, String>,
}

impl Identity {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_headers<I, K, V>(headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            headers: headers
                .into_iter()
                .map(|(k, v)| (Into::<String>::into(k).to_ascii_lowercase(), v.into()))
                .collect(),
        }
    }

    /// Identity of an org admin of `account_number`, encoded the way the
    /// platform gateway does.
    pub fn for_account(account_number: &str) -> Self {
        let token = IdentityToken {
            identity: IdentityBody {
                account_number: Some(Value::String(account_number.to_string())),
                user: Some(serde_json::json!({ "is_org_admin": true })),
            },
        };
        // Serializing plain strings and maps cannot fail.
        let json = serde_json::to_vec(&token).unwrap_or_default();
        Self::from_headers([(HEADER_IDENTITY, STANDARD.encode(json))])
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name: String = name.into();
        self.headers.insert(name.to_ascii_lowercase(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.headers.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Account number from the base64 JSON `x-rh-identity` header.
    ///
    /// # Errors
    ///
    /// Returns an error if the header is missing, not base64, not JSON, or
    /// carries no `identity.account_number`.
    pub fn account_number(&self) -> Result<String> {
        let encoded = self.get(HEADER_IDENTITY).ok_or_else(|| {
            InventoryError::Identity(format!("{} header is missing", HEADER_IDENTITY))
        })?;
        let decoded = IDENTITY_ENGINE.decode(encoded.trim()).map_err(|e| {
            InventoryError::Identity(format!("{} is not valid base64: {}", HEADER_IDENTITY, e))
        })?;
        let token: IdentityToken = serde_json::from_slice(&decoded).map_err(|e| {
            InventoryError::Identity(format!("{} is not valid JSON: {}", HEADER_IDENTITY, e))
        })?;

        match token.identity.account_number {
            Some(Value::String(s)) => Ok(s),
            Some(Value::Number(n)) => Ok(n.to_string()),
            _ => Err(InventoryError::Identity(
                "identity has no account_number".to_string(),
            )),
        }
    }

    /// The identity as HTTP headers, verbatim.
    ///
    /// # Errors
    ///
    /// Returns an error if a name or value is not a valid HTTP header.
    pub fn to_header_map(&self) -> Result<HeaderMap> {
        let mut map = HeaderMap::new();
        for (name, value) in self.iter() {
            insert_header(&mut map, name, value)?;
        }
        Ok(map)
    }
}

/// Authentication headers for a client, chosen once at construction.
///
/// - no identity: no headers
/// - identity and PSK: exactly the PSK and the decoded account number
/// - identity without PSK: the identity headers, verbatim
///
/// # Errors
///
/// Returns an error if a PSK is set and the identity's account number cannot
/// be decoded, or if a header is not valid HTTP.
pub fn auth_headers(identity: Option<&Identity>, psk: Option<&str>) -> Result<HeaderMap> {
    let identity = match identity {
        Some(identity) if !identity.is_empty() => identity,
        _ => return Ok(HeaderMap::new()),
    };

    match psk {
        Some(psk) => {
            let account_number = identity.account_number()?;
            let mut map = HeaderMap::new();
            insert_header(&mut map, HEADER_PSK, psk)?;
            insert_header(&mut map, HEADER_ACCOUNT_NUMBER, &account_number)?;
            Ok(map)
        }
        None => identity.to_header_map(),
    }
}

fn insert_header(map: &mut HeaderMap, name: &str, value: &str) -> Result<()> {
    let name = HeaderName::from_bytes(name.as_bytes())
        .map_err(|e| InventoryError::Identity(format!("Invalid header name {:?}: {}", name, e)))?;
    let value = HeaderValue::from_str(value)
        .map_err(|e| InventoryError::Identity(format!("Invalid value for {}: {}", name, e)))?;
    map.insert(name, value);
    Ok(())
}
