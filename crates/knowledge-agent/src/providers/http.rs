//! Shared HTTP plumbing for provider clients

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::error::{Error, Result};

/// Build a JSON client with a bounded timeout and optional bearer token
pub(crate) fn build_client(provider: &str, token: Option<&str>, timeout: Duration) -> Result<Client> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    if let Some(token) = token {
        let auth = format!("Bearer {}", token.trim());
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&auth)
                .map_err(|_| Error::Config(format!("Invalid {} API token", provider)))?,
        );
    }

    Client::builder()
        .timeout(timeout)
        .default_headers(headers)
        .pool_max_idle_per_host(5)
        .build()
        .map_err(|e| Error::Config(format!("Failed to build {} HTTP client: {}", provider, e)))
}

/// Send a request and decode the JSON body.
///
/// Timeouts become `ExternalServiceTimeout`, error statuses become
/// `Provider` errors carrying the status code.
pub(crate) async fn send_json<T: DeserializeOwned>(provider: &str, request: RequestBuilder) -> Result<T> {
    let response = request
        .send()
        .await
        .map_err(|e| Error::from_provider_request(provider, e))?;

    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<body unavailable>".to_string());
        return Err(Error::Provider {
            provider: provider.to_string(),
            status: Some(status.as_u16()),
            message: format!("request failed ({}): {}", status, body),
        });
    }

    response.json().await.map_err(|e| {
        if e.is_timeout() {
            Error::ExternalServiceTimeout {
                service: provider.to_string(),
            }
        } else {
            Error::provider(provider, format!("failed to parse response: {}", e))
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[derive(Debug, Deserialize)]
    struct Echo {
        value: String,
    }

    async fn post(server: &MockServer, client: &Client) -> Result<Echo> {
        send_json("openai", client.post(format!("{}/v1/echo", server.uri())).json(&json!({}))).await
    }

    #[tokio::test]
    async fn test_success_sends_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/echo"))
            .and(header("authorization", "Bearer sk-test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "value": "hi" })))
            .expect(1)
            .mount(&server)
            .await;

        let client = build_client("openai", Some(" sk-test "), Duration::from_secs(5)).unwrap();
        assert_eq!(post(&server, &client).await.unwrap().value, "hi");
    }

    #[tokio::test]
    async fn test_rate_limit_is_retryable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/echo"))
            .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
            .mount(&server)
            .await;

        let client = build_client("openai", None, Duration::from_secs(5)).unwrap();
        let err = post(&server, &client).await.unwrap_err();
        assert!(matches!(err, Error::Provider { status: Some(429), .. }));
        assert!(err.is_retryable());
        assert!(err.to_string().contains("slow down"));
    }

    #[tokio::test]
    async fn test_client_errors_are_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/echo"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
            .mount(&server)
            .await;

        let client = build_client("openai", None, Duration::from_secs(5)).unwrap();
        let err = post(&server, &client).await.unwrap_err();
        assert!(matches!(err, Error::Provider { status: Some(401), .. }));
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn test_timeout_is_retryable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/echo"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "value": "late" }))
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let client = build_client("openai", None, Duration::from_millis(200)).unwrap();
        let err = post(&server, &client).await.unwrap_err();
        assert!(matches!(err, Error::ExternalServiceTimeout { .. }));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_malformed_body_is_provider_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/echo"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let client = build_client("openai", None, Duration::from_secs(5)).unwrap();
        let err = post(&server, &client).await.unwrap_err();
        assert!(matches!(err, Error::Provider { status: None, .. }));
        assert!(!err.is_retryable());
    }
}
