// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Authenticated JSON transport against the Gitea REST API.

use crate::constants::gitea::{API_PATH, REQUEST_TIMEOUT_SECS, USER_AGENT};
use crate::error::{ProviderError, Result};
use async_trait::async_trait;
use bytes::Bytes;
use http::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// A fully built HTTP request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
}

impl Request {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Raw HTTP response, body fully read.
#[derive(Debug, Clone)]
pub struct Response {
    pub status: u16,
    pub body: Bytes,
}

/// Transport boundary for all Gitea I/O.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: Request) -> Result<Response>;
}

/// Transport backed by reqwest.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(insecure_skip_verify: bool) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .danger_accept_invalid_certs(insecure_skip_verify)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ProviderError::Transport(format!("cannot build HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: Request) -> Result<Response> {
        let mut builder = self.client.request(request.method, &request.url);
        for (k, v) in request.headers {
            builder = builder.header(k, v);
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let resp = builder
            .send()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;
        let status = resp.status().as_u16();
        let body = resp
            .bytes()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        Ok(Response { status, body })
    }
}

/// Authenticated request builder bound to one Gitea instance.
#[derive(Clone)]
pub struct HttpClient {
    transport: Arc<dyn Transport>,
    base_url: String,
    token: String,
}

impl HttpClient {
    /// `base_url` is the instance root; the API suffix is appended here.
    pub fn new(base_url: &str, token: &str, transport: Arc<dyn Transport>) -> Result<Self> {
        let parsed = url::Url::parse(base_url)
            .map_err(|e| ProviderError::Validation(format!("invalid base URL {:?}: {}", base_url, e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ProviderError::Validation(format!(
                "base URL {:?} must use http or https",
                base_url
            )));
        }

        let trimmed = base_url.trim_end_matches('/');
        let base_url = if trimmed.ends_with(API_PATH) {
            trimmed.to_string()
        } else {
            format!("{}{}", trimmed, API_PATH)
        };

        Ok(Self {
            transport,
            base_url,
            token: token.to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Sends one request; the body, if any, is JSON encoded.
    pub async fn do_request<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<Response> {
        let body = body.map(serde_json::to_vec).transpose()?;
        let mut headers = vec![
            ("Accept".to_string(), "application/json".to_string()),
            ("Authorization".to_string(), format!("token {}", self.token)),
        ];
        if body.is_some() {
            headers.push(("Content-Type".to_string(), "application/json".to_string()));
        }

        debug!("{} {}", method, path);
        self.transport
            .send(Request {
                method,
                url: format!("{}{}", self.base_url, path),
                headers,
                body,
            })
            .await
    }

    /// Sends a request and decodes the JSON response.
    pub async fn request<B, T>(&self, method: Method, path: &str, body: Option<&B>) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let resp = self.do_request(method.clone(), path, body).await?;
        handle_response(resp)?
            .ok_or_else(|| ProviderError::Transport(format!("empty response body from {} {}", method, path)))
    }

    /// Sends a request whose response body is ignored.
    pub async fn request_empty<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<()> {
        let resp = self.do_request(method, path, body).await?;
        handle_response::<serde_json::Value>(ignore_body(resp)?)?;
        Ok(())
    }
}

/// Classifies the status and decodes the body.
///
/// Status >= 400 becomes `ProviderError::Api` carrying the body text. A 204 or an
/// empty body yields `None`.
pub fn handle_response<T: DeserializeOwned>(resp: Response) -> Result<Option<T>> {
    if resp.status >= 400 {
        return Err(ProviderError::Api {
            status: resp.status,
            message: String::from_utf8_lossy(&resp.body).trim().to_string(),
        });
    }
    if resp.status == StatusCode::NO_CONTENT.as_u16() || resp.body.is_empty() {
        return Ok(None);
    }
    Ok(Some(serde_json::from_slice(&resp.body)?))
}

fn ignore_body(resp: Response) -> Result<Response> {
    if resp.status >= 400 {
        return Ok(resp);
    }
    Ok(Response {
        status: resp.status,
        body: Bytes::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::MockGitea;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Thing {
        id: i64,
    }

    fn resp(status: u16, body: &str) -> Response {
        Response {
            status,
            body: Bytes::from(body.to_string()),
        }
    }

    #[test]
    fn test_api_suffix_appended_once() {
        let mock = Arc::new(MockGitea::new());
        let c = HttpClient::new("https://git.example.com/", "t", mock.clone()).unwrap();
        assert_eq!(c.base_url(), "https://git.example.com/api/v1");
        let c = HttpClient::new("https://git.example.com/api/v1", "t", mock).unwrap();
        assert_eq!(c.base_url(), "https://git.example.com/api/v1");
    }

    #[test]
    fn test_invalid_base_url_is_validation_error() {
        let mock = Arc::new(MockGitea::new());
        let err = HttpClient::new("not a url", "t", mock.clone()).err().unwrap();
        assert!(err.is_terminal());
        let err = HttpClient::new("ftp://git.example.com", "t", mock).err().unwrap();
        assert!(err.is_terminal());
    }

    #[test]
    fn test_handle_response_error_carries_status() {
        let err = handle_response::<Thing>(resp(404, "{\"message\":\"not found\"}")).unwrap_err();
        assert!(err.is_not_found());
        assert!(err.to_string().contains("status 404"));

        let err = handle_response::<Thing>(resp(422, "bad")).unwrap_err();
        assert_eq!(err.status(), Some(422));
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_handle_response_no_content() {
        assert_eq!(handle_response::<Thing>(resp(204, "")).unwrap(), None);
        assert_eq!(handle_response::<Thing>(resp(200, "")).unwrap(), None);
        assert_eq!(
            handle_response::<Thing>(resp(200, "{\"id\":3}")).unwrap(),
            Some(Thing { id: 3 })
        );
    }

    #[tokio::test]
    async fn test_request_headers_and_body() {
        let mock = Arc::new(MockGitea::new().on(Method::POST, "/things", 201, r#"{"id":9}"#));
        let c = HttpClient::new("https://git.example.com", "s3cr3t", mock.clone()).unwrap();

        let thing: Thing = c
            .request(Method::POST, "/things", Some(&serde_json::json!({"name": "x"})))
            .await
            .unwrap();
        assert_eq!(thing, Thing { id: 9 });

        let requests = mock.requests();
        assert_eq!(requests.len(), 1);
        let req = &requests[0];
        assert_eq!(req.url, "https://git.example.com/api/v1/things");
        assert_eq!(req.header("authorization"), Some("token s3cr3t"));
        assert_eq!(req.header("accept"), Some("application/json"));
        assert_eq!(req.header("content-type"), Some("application/json"));
        assert_eq!(req.body.as_deref(), Some(br#"{"name":"x"}"#.as_slice()));
    }

    #[tokio::test]
    async fn test_empty_success_body_is_transport_error() {
        let mock = Arc::new(MockGitea::new().on(Method::PATCH, "/things/1", 204, ""));
        let c = HttpClient::new("https://git.example.com", "t", mock).unwrap();

        let err = c
            .request::<_, Thing>(Method::PATCH, "/things/1", Some(&serde_json::json!({})))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Transport(_)));
        assert_eq!(err.status(), None);
        assert!(err.to_string().contains("PATCH /things/1"));
    }

    #[test]
    fn test_rejected_token_is_terminal() {
        assert!(handle_response::<Thing>(resp(401, "unauthorized")).unwrap_err().is_terminal());
        assert!(handle_response::<Thing>(resp(403, "forbidden")).unwrap_err().is_terminal());
        assert!(!handle_response::<Thing>(resp(500, "boom")).unwrap_err().is_terminal());
        assert!(!handle_response::<Thing>(resp(429, "slow down")).unwrap_err().is_terminal());
    }

    #[tokio::test]
    async fn test_request_without_body_has_no_content_type() {
        let mock = Arc::new(MockGitea::new().on(Method::DELETE, "/things/1", 204, ""));
        let c = HttpClient::new("https://git.example.com", "t", mock.clone()).unwrap();

        c.request_empty::<()>(Method::DELETE, "/things/1", None)
            .await
            .unwrap();
        assert_eq!(mock.requests()[0].header("content-type"), None);
    }

    #[test]
    fn test_reqwest_transport_builds() {
        assert!(ReqwestTransport::new(false).is_ok());
        assert!(ReqwestTransport::new(true).is_ok());
    }
}
