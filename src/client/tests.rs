// SPDX-License-Identifier: MIT OR Apache-2.0

use super::*;
use crate::api::STATUS_AVAILABLE;
use crate::runtime::LoggingConfig;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SOURCE_ID: &str = "123";
const ENDPOINT_ID: &str = "234";
const AUTHENTICATION_ID: &str = "345";
const API: &str = "/api/sources/v3.0";

fn endpoints_body() -> serde_json::Value {
    json!({"data": [
        {"default": false, "host": "10.0.0.2", "id": "233", "source_id": SOURCE_ID},
        {"default": true, "host": "10.0.0.1", "id": ENDPOINT_ID, "path": "/", "role": "ansible",
         "scheme": "https", "source_id": SOURCE_ID, "tenant": "11001"}
    ]})
}

fn authentications_body() -> serde_json::Value {
    json!({"data": [
        {"authtype": "username_password", "id": AUTHENTICATION_ID, "resource_id": ENDPOINT_ID,
         "resource_type": "Endpoint", "username": "admin", "tenant": "11001"},
        {"authtype": "token", "id": "346", "resource_id": ENDPOINT_ID,
         "resource_type": "Endpoint", "tenant": "11001"}
    ]})
}

fn password_body(id: &str) -> serde_json::Value {
    json!({"authtype": "username_password", "id": id, "resource_id": ENDPOINT_ID,
           "resource_type": "Endpoint", "username": "admin", "tenant": "11001", "password": "xxx"})
}

fn client_for(server: &MockServer, psk: Option<&str>) -> SourcesApiClient {
    let mut config = SourcesApiConfig::default().with_base_url(server.uri());
    config.psk = psk.map(str::to_string);
    SourcesApiClient::new(config, Some(&Identity::for_account("11001"))).unwrap()
}

async fn mount_get(server: &MockServer, url_path: String, status: u16, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(url_path))
        .respond_with(ResponseTemplate::new(status).set_body_json(body))
        .mount(server)
        .await;
}

#[test]
fn test_default_config() {
    let config = SourcesApiConfig::default();
    assert_eq!(config.base_url, "http://localhost:3000");
    assert_eq!(config.base_path, "/api/sources/v3.0");
    assert_eq!(config.internal_base_path, "/internal/v1.0");
    assert!(config.psk.is_none());
    assert_eq!(config.timeout, Duration::from_secs(30));
}

#[test]
fn test_config_from_env() {
    let config = SourcesApiConfig::from_env_with(|key| match key {
        "SOURCES_SCHEME" => Some("https".to_string()),
        "SOURCES_HOST" => Some("sources-api".to_string()),
        "SOURCES_PORT" => Some("8000".to_string()),
        "SOURCES_PSK" => Some("1234".to_string()),
        _ => None,
    });

    assert_eq!(config.base_url, "https://sources-api:8000");
    assert_eq!(config.psk.as_deref(), Some("1234"));
}

#[test]
fn test_config_from_env_ignores_empty_psk() {
    let config = SourcesApiConfig::from_env_with(|key| match key {
        "SOURCES_HOST" => Some("sources-api".to_string()),
        "SOURCES_PSK" => Some(String::new()),
        _ => None,
    });

    assert_eq!(config.base_url, "http://sources-api");
    assert!(config.psk.is_none());
}

#[test]
fn test_new_client_invalid_url() {
    let config = SourcesApiConfig::default().with_base_url("not a url");
    match SourcesApiClient::new(config, None) {
        Err(InventoryError::Config(msg)) => assert!(msg.contains("Invalid Sources API URL")),
        other => panic!("Expected Config error, got {other:?}"),
    }
}

#[test]
fn test_headers_with_psk() {
    let config = SourcesApiConfig::default().with_psk("1234");
    let client = SourcesApiClient::new(config, Some(&Identity::for_account("11001"))).unwrap();

    let headers = client.default_headers();
    assert_eq!(headers.len(), 2);
    assert_eq!(headers[HEADER_PSK], "1234");
    assert_eq!(headers[HEADER_ACCOUNT_NUMBER], "11001");
}

#[test]
fn test_headers_forward_identity() {
    let identity = Identity::for_account("11001");
    let client = SourcesApiClient::new(SourcesApiConfig::default(), Some(&identity)).unwrap();

    assert_eq!(
        client.default_headers(),
        &identity.to_header_map().unwrap()
    );
}

#[tokio::test]
async fn test_psk_headers_sent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{API}/sources/{SOURCE_ID}/applications")))
        .and(header(HEADER_PSK, "1234"))
        .and(header(HEADER_ACCOUNT_NUMBER, "11001"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, Some("1234"));
    assert!(client.fetch_application(SOURCE_ID).await.unwrap().is_none());
}

#[tokio::test]
async fn test_fetch_default_endpoint() {
    let server = MockServer::start().await;
    mount_get(
        &server,
        format!("{API}/sources/{SOURCE_ID}/endpoints"),
        200,
        endpoints_body(),
    )
    .await;

    let endpoint = client_for(&server, None)
        .fetch_default_endpoint(SOURCE_ID)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(endpoint.id, ENDPOINT_ID);
    assert_eq!(endpoint.host.as_deref(), Some("10.0.0.1"));
}

#[tokio::test]
async fn test_fetch_default_endpoint_none_flagged() {
    let server = MockServer::start().await;
    mount_get(
        &server,
        format!("{API}/sources/{SOURCE_ID}/endpoints"),
        200,
        json!({"data": [{"id": "1", "default": false}, {"id": "2"}]}),
    )
    .await;

    let result = client_for(&server, None)
        .fetch_default_endpoint(SOURCE_ID)
        .await
        .unwrap();
    assert!(result.is_none());
}

#[tokio::test]
async fn test_fetch_default_endpoint_not_found() {
    let server = MockServer::start().await;
    mount_get(
        &server,
        format!("{API}/sources/{SOURCE_ID}/endpoints"),
        404,
        json!({}),
    )
    .await;

    let result = client_for(&server, None)
        .fetch_default_endpoint(SOURCE_ID)
        .await
        .unwrap();
    assert!(result.is_none());
}

#[tokio::test]
async fn test_fetch_default_endpoint_server_error() {
    let server = MockServer::start().await;
    mount_get(
        &server,
        format!("{API}/sources/{SOURCE_ID}/endpoints"),
        500,
        json!({"errors": [{"status": "500"}]}),
    )
    .await;

    let err = client_for(&server, None)
        .fetch_default_endpoint(SOURCE_ID)
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(500));
}

#[tokio::test]
async fn test_fetch_application() {
    let server = MockServer::start().await;
    mount_get(
        &server,
        format!("{API}/sources/{SOURCE_ID}/applications"),
        200,
        json!({"data": [
            {"id": "345", "availability_status": "available"},
            {"id": "346", "availability_status": "unavailable"}
        ]}),
    )
    .await;

    let application = client_for(&server, None)
        .fetch_application(SOURCE_ID)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(application.id, "345");
    assert!(application.is_available());
}

#[tokio::test]
async fn test_fetch_application_not_found() {
    let server = MockServer::start().await;
    mount_get(
        &server,
        format!("{API}/sources/{SOURCE_ID}/applications"),
        404,
        json!({}),
    )
    .await;

    let result = client_for(&server, None)
        .fetch_application(SOURCE_ID)
        .await
        .unwrap();
    assert!(result.is_none());
}

#[tokio::test]
async fn test_fetch_authentication() {
    let server = MockServer::start().await;
    mount_get(
        &server,
        format!("{API}/sources/{SOURCE_ID}/endpoints"),
        200,
        endpoints_body(),
    )
    .await;
    mount_get(
        &server,
        format!("{API}/endpoints/{ENDPOINT_ID}/authentications"),
        200,
        authentications_body(),
    )
    .await;
    Mock::given(method("GET"))
        .and(path(format!("/internal/v1.0/authentications/{AUTHENTICATION_ID}")))
        .and(query_param("expose_encrypted_attribute[]", "password"))
        .respond_with(ResponseTemplate::new(200).set_body_json(password_body(AUTHENTICATION_ID)))
        .expect(1)
        .mount(&server)
        .await;

    let auth = client_for(&server, None)
        .fetch_authentication(SOURCE_ID, None, None)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(auth.id, AUTHENTICATION_ID);
    assert_eq!(auth.username.as_deref(), Some("admin"));
    assert_eq!(auth.password.as_deref(), Some("xxx"));
}

#[tokio::test]
async fn test_fetch_authentication_by_authtype() {
    let server = MockServer::start().await;
    mount_get(
        &server,
        format!("{API}/endpoints/{ENDPOINT_ID}/authentications"),
        200,
        authentications_body(),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/internal/v1.0/authentications/346"))
        .respond_with(ResponseTemplate::new(200).set_body_json(password_body("346")))
        .expect(1)
        .mount(&server)
        .await;

    let endpoint = Endpoint {
        id: ENDPOINT_ID.to_string(),
        ..Default::default()
    };
    let auth = client_for(&server, None)
        .fetch_authentication(SOURCE_ID, Some(&endpoint), Some("token"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(auth.id, "346");
}

#[tokio::test]
async fn test_fetch_authentication_unknown_authtype() {
    let server = MockServer::start().await;
    mount_get(
        &server,
        format!("{API}/endpoints/{ENDPOINT_ID}/authentications"),
        200,
        authentications_body(),
    )
    .await;

    let endpoint = Endpoint {
        id: ENDPOINT_ID.to_string(),
        ..Default::default()
    };
    let result = client_for(&server, None)
        .fetch_authentication(SOURCE_ID, Some(&endpoint), Some("api_key"))
        .await
        .unwrap();
    assert!(result.is_none());
}

#[tokio::test]
async fn test_fetch_authentication_without_endpoint() {
    let server = MockServer::start().await;
    mount_get(
        &server,
        format!("{API}/sources/{SOURCE_ID}/endpoints"),
        404,
        json!({}),
    )
    .await;

    let result = client_for(&server, None)
        .fetch_authentication(SOURCE_ID, None, None)
        .await
        .unwrap();
    assert!(result.is_none());
}

#[tokio::test]
async fn test_fetch_authentication_empty_list() {
    let server = MockServer::start().await;
    mount_get(
        &server,
        format!("{API}/sources/{SOURCE_ID}/endpoints"),
        200,
        endpoints_body(),
    )
    .await;
    mount_get(
        &server,
        format!("{API}/endpoints/{ENDPOINT_ID}/authentications"),
        200,
        json!({"data": []}),
    )
    .await;

    let result = client_for(&server, None)
        .fetch_authentication(SOURCE_ID, None, None)
        .await
        .unwrap();
    assert!(result.is_none());
}

#[tokio::test]
async fn test_fetch_authentication_list_not_found() {
    let server = MockServer::start().await;
    mount_get(
        &server,
        format!("{API}/sources/{SOURCE_ID}/endpoints"),
        200,
        endpoints_body(),
    )
    .await;
    mount_get(
        &server,
        format!("{API}/endpoints/{ENDPOINT_ID}/authentications"),
        404,
        json!({}),
    )
    .await;

    let client = client_for(&server, None);
    let endpoint = Endpoint {
        id: ENDPOINT_ID.to_string(),
        ..Default::default()
    };

    let explicit = client
        .fetch_authentication(SOURCE_ID, Some(&endpoint), None)
        .await
        .unwrap();
    assert!(explicit.is_none());

    let via_default = client
        .fetch_authentication(SOURCE_ID, None, Some("username_password"))
        .await
        .unwrap();
    assert!(via_default.is_none());
}

#[tokio::test]
async fn test_requests_accept_json() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{API}/sources/{SOURCE_ID}/applications")))
        .and(header("accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": [{"id": "345"}]})))
        .expect(1)
        .mount(&server)
        .await;

    let application = client_for(&server, None)
        .fetch_application(SOURCE_ID)
        .await
        .unwrap();
    assert_eq!(application.map(|a| a.id).as_deref(), Some("345"));
}

#[tokio::test]
async fn test_internal_route_not_reused_after_failure() {
    let server = MockServer::start().await;
    mount_get(
        &server,
        format!("{API}/endpoints/{ENDPOINT_ID}/authentications"),
        200,
        authentications_body(),
    )
    .await;
    mount_get(
        &server,
        format!("/internal/v1.0/authentications/{AUTHENTICATION_ID}"),
        500,
        json!({}),
    )
    .await;
    Mock::given(method("GET"))
        .and(path(format!("{API}/sources/{SOURCE_ID}/applications")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": [{"id": "345"}]})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, None);
    let endpoint = Endpoint {
        id: ENDPOINT_ID.to_string(),
        ..Default::default()
    };

    let err = client
        .fetch_authentication(SOURCE_ID, Some(&endpoint), None)
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(500));

    let application = client.fetch_application(SOURCE_ID).await.unwrap();
    assert_eq!(application.map(|a| a.id).as_deref(), Some("345"));
}

#[tokio::test]
async fn test_update_source() {
    let server = MockServer::start().await;
    let update = SourceUpdate {
        availability_status: Some(STATUS_AVAILABLE.to_string()),
        last_available_at: Some("2026-10-18T10:00:00Z".to_string()),
        last_checked_at: Some("2026-10-18T10:00:00Z".to_string()),
    };
    Mock::given(method("PATCH"))
        .and(path(format!("{API}/sources/{SOURCE_ID}")))
        .and(body_json(&update))
        .and(header("content-type", "application/json"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    client_for(&server, None)
        .update_source(SOURCE_ID, &update)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_update_endpoint_and_application() {
    let server = MockServer::start().await;
    let endpoint_update = EndpointUpdate {
        availability_status: Some("unavailable".to_string()),
        availability_status_error: Some("Some connection error".to_string()),
        last_checked_at: Some("2026-10-18T10:00:00Z".to_string()),
        ..Default::default()
    };
    let application_update = ApplicationUpdate {
        last_checked_at: Some("2026-10-18T10:00:00Z".to_string()),
        ..Default::default()
    };
    Mock::given(method("PATCH"))
        .and(path(format!("{API}/endpoints/{ENDPOINT_ID}")))
        .and(body_json(json!({
            "availability_status": "unavailable",
            "availability_status_error": "Some connection error",
            "last_checked_at": "2026-10-18T10:00:00Z"
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path(format!("{API}/applications/345")))
        .and(body_json(json!({"last_checked_at": "2026-10-18T10:00:00Z"})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, None);
    client
        .update_endpoint(ENDPOINT_ID, &endpoint_update)
        .await
        .unwrap();
    client
        .update_application("345", &application_update)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_update_not_found_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path(format!("{API}/sources/999")))
        .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
        .mount(&server)
        .await;

    let err = client_for(&server, None)
        .update_source("999", &SourceUpdate::default())
        .await
        .unwrap_err();
    match err {
        InventoryError::Api { status, message } => {
            assert_eq!(status, 404);
            assert_eq!(message, "not found");
        }
        other => panic!("Expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_request_metrics() {
    let server = MockServer::start().await;
    mount_get(
        &server,
        format!("{API}/sources/{SOURCE_ID}/applications"),
        404,
        json!({}),
    )
    .await;

    let client = client_for(&server, None);
    client.fetch_application(SOURCE_ID).await.unwrap();

    let metrics = client.api().logger().metrics();
    assert_eq!(metrics.total_requests(), 1);
    assert_eq!(metrics.failed_requests(), 1);
}

#[tokio::test]
async fn test_with_logger_logs_redacted_headers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{API}/sources/{SOURCE_ID}/endpoints")))
        .and(header(HEADER_PSK, "1234"))
        .respond_with(ResponseTemplate::new(200).set_body_json(endpoints_body()))
        .expect(1)
        .mount(&server)
        .await;

    let config = SourcesApiConfig::default()
        .with_base_url(server.uri())
        .with_psk("1234");
    let logger = RequestLogger::with_config(LoggingConfig::new().with_headers(true));
    let client =
        SourcesApiClient::with_logger(config, Some(&Identity::for_account("11001")), logger)
            .unwrap();

    let logging = client.api().logger().config();
    assert!(logging.log_headers);
    let described = logging.describe_headers(client.default_headers());
    assert!(described.contains("x-rh-sources-psk=[REDACTED]"));
    assert!(!described.contains("1234"));

    let endpoint = client.fetch_default_endpoint(SOURCE_ID).await.unwrap();
    assert_eq!(endpoint.map(|e| e.id).as_deref(), Some(ENDPOINT_ID));

    let metrics = client.api().logger().metrics();
    assert_eq!(metrics.total_requests(), 1);
    assert_eq!(metrics.successful_requests(), 1);
}
