// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Test doubles for Gitea, the secret store and the Kubernetes API.

use crate::constants::annotations::EXTERNAL_NAME;
use crate::crd::common::SecretKeySelector;
use crate::error::{ProviderError, Result as ProviderResult};
use crate::gitea::transport::{Request as GiteaRequest, Response as GiteaResponse, Transport};
use crate::gitea::GiteaClient;
use crate::reconcilers::Connection;
use crate::secrets::SecretResolver;
use async_trait::async_trait;
use bytes::Bytes;
use http::{Method, Request, Response};
use kube::client::Body;
use kube::{Client, Resource};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use tower::Service;

const GITEA_BASE: &str = "https://gitea.test";
const GITEA_NOT_FOUND: &str = r#"{"message":"The target couldn't be found."}"#;

/// In-memory Gitea answering per (method, path) and recording every request.
///
/// Responses registered for the same route are served in order; the last one
/// keeps answering. Unmatched routes answer 404.
#[derive(Default)]
pub struct MockGitea {
    routes: Mutex<HashMap<(String, String), VecDeque<(u16, String)>>>,
    requests: Mutex<Vec<GiteaRequest>>,
}

impl MockGitea {
    pub fn new() -> Self {
        Self::default()
    }

    /// `path` is relative to `/api/v1`.
    pub fn on(self, method: Method, path: &str, status: u16, body: &str) -> Self {
        self.routes
            .lock()
            .unwrap()
            .entry((method.to_string(), path.to_string()))
            .or_default()
            .push_back((status, body.to_string()));
        self
    }

    pub fn requests(&self) -> Vec<GiteaRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Requests as `METHOD /path`, in order.
    pub fn paths(&self) -> Vec<String> {
        self.requests()
            .iter()
            .map(|r| format!("{} {}", r.method, api_path(&r.url)))
            .collect()
    }

    /// JSON body of the last request to a route.
    pub fn last_body(&self, method: Method, path: &str) -> Option<serde_json::Value> {
        self.requests()
            .iter()
            .rev()
            .find(|r| r.method == method && api_path(&r.url) == path)
            .and_then(|r| r.body.as_ref())
            .and_then(|b| serde_json::from_slice(b).ok())
    }

    fn respond(&self, method: &Method, path: &str) -> (u16, String) {
        let mut routes = self.routes.lock().unwrap();
        match routes.get_mut(&(method.to_string(), path.to_string())) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap(),
            Some(queue) if !queue.is_empty() => queue[0].clone(),
            _ => (404, GITEA_NOT_FOUND.to_string()),
        }
    }
}

fn api_path(url: &str) -> String {
    let path = url::Url::parse(url)
        .map(|u| u.path().to_string())
        .unwrap_or_else(|_| url.to_string());
    path.strip_prefix("/api/v1")
        .map(String::from)
        .unwrap_or(path)
}

#[async_trait]
impl Transport for MockGitea {
    async fn send(&self, request: GiteaRequest) -> ProviderResult<GiteaResponse> {
        let (status, body) = self.respond(&request.method, &api_path(&request.url));
        self.requests.lock().unwrap().push(request);
        Ok(GiteaResponse {
            status,
            body: Bytes::from(body),
        })
    }
}

/// Client bound to the mock.
pub fn gitea_client(mock: &Arc<MockGitea>) -> GiteaClient {
    GiteaClient::with_transport(GITEA_BASE, "test-token", mock.clone()).unwrap()
}

/// Resolver backed by a fixed map of `namespace/name/key` to value.
#[derive(Default, Clone)]
pub struct StaticSecrets {
    values: HashMap<String, Vec<u8>>,
}

impl StaticSecrets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, namespace: &str, name: &str, key: &str, value: &str) -> Self {
        self.values.insert(
            format!("{}/{}/{}", namespace, name, key),
            value.as_bytes().to_vec(),
        );
        self
    }
}

#[async_trait]
impl SecretResolver for StaticSecrets {
    async fn resolve(&self, selector: &SecretKeySelector) -> ProviderResult<Vec<u8>> {
        self.values
            .get(&format!(
                "{}/{}/{}",
                selector.namespace, selector.name, selector.key
            ))
            .cloned()
            .ok_or_else(|| ProviderError::SecretNotFound {
                namespace: selector.namespace.clone(),
                name: selector.name.clone(),
            })
    }
}

/// Connection with an empty secret store.
pub fn connection(gitea: GiteaClient) -> Connection {
    connection_with(gitea, StaticSecrets::new())
}

pub fn connection_with(gitea: GiteaClient, secrets: StaticSecrets) -> Connection {
    Connection::new(gitea, Arc::new(secrets))
}

/// Sets the external-name annotation.
pub fn with_external_name<K: Resource>(mut cr: K, external_name: &str) -> K {
    cr.meta_mut()
        .annotations
        .get_or_insert_with(Default::default)
        .insert(EXTERNAL_NAME.to_string(), external_name.to_string());
    cr
}

/// Selector in the `crossplane-system` namespace.
pub fn selector(name: &str, key: &str) -> SecretKeySelector {
    SecretKeySelector {
        name: name.to_string(),
        namespace: "crossplane-system".to_string(),
        key: key.to_string(),
    }
}

/// A mock HTTP service that returns predefined responses based on request paths.
#[derive(Clone, Default)]
pub struct MockService {
    responses: Arc<Mutex<HashMap<(String, String), (u16, String)>>>,
    requests: Arc<Mutex<Vec<String>>>,
}

impl MockService {
    pub fn new() -> Self {
        Self::default()
    }

    fn on(self, method: &str, path: &str, status: u16, body: &str) -> Self {
        self.responses
            .lock()
            .unwrap()
            .insert((method.to_string(), path.to_string()), (status, body.to_string()));
        self
    }

    /// Add a response for GET requests matching the path
    pub fn on_get(self, path: &str, status: u16, body: &str) -> Self {
        self.on("GET", path, status, body)
    }

    pub fn on_patch(self, path: &str, status: u16, body: &str) -> Self {
        self.on("PATCH", path, status, body)
    }

    pub fn on_delete(self, path: &str, status: u16, body: &str) -> Self {
        self.on("DELETE", path, status, body)
    }

    /// Requests received so far as `METHOD /path`
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    /// Build a kube Client from this mock service
    pub fn into_client(self) -> Client {
        Client::new(self, "https://kubernetes.default.svc")
    }

    fn find_response(&self, method: &str, path: &str) -> Option<(u16, String)> {
        let responses = self.responses.lock().unwrap();

        if let Some(resp) = responses.get(&(method.to_string(), path.to_string())) {
            return Some(resp.clone());
        }

        // Prefix match covers subresources such as /status
        responses
            .iter()
            .filter(|((m, p), _)| m == method && path.starts_with(p.as_str()))
            .max_by_key(|((_, p), _)| p.len())
            .map(|(_, resp)| resp.clone())
    }
}

impl Service<Request<Body>> for MockService {
    type Response = Response<Body>;
    type Error = tower::BoxError;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let method = req.method().to_string();
        let path = req.uri().path().to_string();

        self.requests
            .lock()
            .unwrap()
            .push(format!("{} {}", method, path));
        let response = self.find_response(&method, &path);

        Box::pin(async move {
            let (status, body) = response.unwrap_or_else(|| (404, not_found_json("resource", &path)));
            Ok(Response::builder()
                .status(status)
                .header("content-type", "application/json")
                .body(Body::from(body.into_bytes()))
                .unwrap())
        })
    }
}

/// Create a Secret JSON response with the given string values
pub fn secret_json(name: &str, namespace: &str, data: &[(&str, &str)]) -> String {
    let data: serde_json::Map<String, serde_json::Value> = data
        .iter()
        .map(|(k, v)| (k.to_string(), serde_json::Value::String(base64(v.as_bytes()))))
        .collect();
    serde_json::json!({
        "apiVersion": "v1",
        "kind": "Secret",
        "metadata": {"name": name, "namespace": namespace, "uid": "test-uid"},
        "data": data,
        "type": "Opaque"
    })
    .to_string()
}

/// Create a 404 not found response
pub fn not_found_json(resource: &str, name: &str) -> String {
    serde_json::json!({
        "kind": "Status",
        "apiVersion": "v1",
        "status": "Failure",
        "message": format!("{} \"{}\" not found", resource, name),
        "reason": "NotFound",
        "code": 404
    })
    .to_string()
}

fn base64(input: &[u8]) -> String {
    const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";
    let mut out = String::new();
    for chunk in input.chunks(3) {
        let b = [
            chunk[0],
            chunk.get(1).copied().unwrap_or(0),
            chunk.get(2).copied().unwrap_or(0),
        ];
        let n = (u32::from(b[0]) << 16) | (u32::from(b[1]) << 8) | u32::from(b[2]);
        for i in 0..4 {
            if i <= chunk.len() {
                out.push(ALPHABET[((n >> (18 - 6 * i)) & 0x3f) as usize] as char);
            } else {
                out.push('=');
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base64() {
        assert_eq!(base64(b"abc123"), "YWJjMTIz");
        assert_eq!(base64(b"s3cr3t"), "czNjcjN0");
        assert_eq!(base64(b"ab"), "YWI=");
        assert_eq!(base64(b"a"), "YQ==");
    }

    #[test]
    fn test_mock_gitea_queue_is_sticky() {
        let mock = MockGitea::new()
            .on(Method::GET, "/x", 404, "")
            .on(Method::GET, "/x", 200, "{}");
        assert_eq!(mock.respond(&Method::GET, "/x").0, 404);
        assert_eq!(mock.respond(&Method::GET, "/x").0, 200);
        assert_eq!(mock.respond(&Method::GET, "/x").0, 200);
        assert_eq!(mock.respond(&Method::GET, "/y").0, 404);
    }
}
