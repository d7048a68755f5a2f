// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Typed Gitea API client. Operations live in the sibling modules, grouped by area.

use crate::error::{ProviderError, Result};
use crate::gitea::transport::{HttpClient, ReqwestTransport, Transport};
use crate::gitea::types::User;
use http::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;

/// Gitea API client bound to one instance and token.
///
/// Built per reconciliation by the connector and dropped afterwards.
#[derive(Clone)]
pub struct GiteaClient {
    http: HttpClient,
}

impl GiteaClient {
    pub fn new(base_url: &str, token: &str, insecure_skip_verify: bool) -> Result<Self> {
        let transport = ReqwestTransport::new(insecure_skip_verify)?;
        Self::with_transport(base_url, token, Arc::new(transport))
    }

    pub fn with_transport(base_url: &str, token: &str, transport: Arc<dyn Transport>) -> Result<Self> {
        Ok(Self {
            http: HttpClient::new(base_url, token, transport)?,
        })
    }

    pub fn base_url(&self) -> &str {
        self.http.base_url()
    }

    pub(crate) async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.http.request::<(), T>(Method::GET, path, None).await
    }

    /// GET that answers 204 on success and 404 otherwise.
    pub(crate) async fn check(&self, path: &str) -> Result<()> {
        self.http.request_empty::<()>(Method::GET, path, None).await
    }

    pub(crate) async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        self.http.request(Method::POST, path, Some(body)).await
    }

    pub(crate) async fn post_empty<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<()> {
        self.http.request_empty(Method::POST, path, Some(body)).await
    }

    pub(crate) async fn patch<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        self.http.request(Method::PATCH, path, Some(body)).await
    }

    pub(crate) async fn patch_empty<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<()> {
        self.http.request_empty(Method::PATCH, path, Some(body)).await
    }

    pub(crate) async fn put_empty<B: Serialize + ?Sized>(&self, path: &str, body: Option<&B>) -> Result<()> {
        self.http.request_empty(Method::PUT, path, body).await
    }

    pub(crate) async fn delete(&self, path: &str) -> Result<()> {
        self.http.request_empty::<()>(Method::DELETE, path, None).await
    }

    /// The user owning the token.
    pub async fn current_user(&self) -> Result<User> {
        self.get("/user").await
    }
}

/// Percent-encodes one path segment.
pub fn escape(segment: &str) -> String {
    urlencoding::encode(segment).into_owned()
}

/// `/repos/{owner}/{repo}`
pub(crate) fn repo_path(owner: &str, repo: &str) -> String {
    format!("/repos/{}/{}", escape(owner), escape(repo))
}

/// Splits a compound `owner/repo` identifier.
pub fn split_repository(repository: &str) -> Result<(String, String)> {
    let parts: Vec<&str> = repository.split('/').collect();
    match parts.as_slice() {
        [owner, repo] if !owner.is_empty() && !repo.is_empty() => {
            Ok((owner.to_string(), repo.to_string()))
        }
        _ => Err(ProviderError::Validation(format!(
            "repository must be in the form owner/repo, got {:?}",
            repository
        ))),
    }
}

/// Where an Actions runner is registered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunnerScope {
    Repository { owner: String, repo: String },
    Organization(String),
    System,
}

impl RunnerScope {
    /// Validates a `(scope, scopeValue)` pair.
    pub fn parse(scope: &str, value: &str) -> Result<Self> {
        match scope {
            "repository" => {
                let (owner, repo) = split_repository(value)?;
                Ok(RunnerScope::Repository { owner, repo })
            }
            "organization" if !value.is_empty() => Ok(RunnerScope::Organization(value.to_string())),
            "organization" => Err(ProviderError::Validation(
                "organization runner scope requires the organization name as scope value".to_string(),
            )),
            "system" => Ok(RunnerScope::System),
            other => Err(ProviderError::Validation(format!(
                "unknown runner scope {:?}, expected repository, organization or system",
                other
            ))),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            RunnerScope::Repository { .. } => "repository",
            RunnerScope::Organization(_) => "organization",
            RunnerScope::System => "system",
        }
    }

    pub fn value(&self) -> String {
        match self {
            RunnerScope::Repository { owner, repo } => format!("{}/{}", owner, repo),
            RunnerScope::Organization(org) => org.clone(),
            RunnerScope::System => String::new(),
        }
    }

    /// Collection path of the runners in this scope.
    pub fn runners_path(&self) -> String {
        match self {
            RunnerScope::Repository { owner, repo } => {
                format!("{}/actions/runners", repo_path(owner, repo))
            }
            RunnerScope::Organization(org) => format!("/orgs/{}/actions/runners", escape(org)),
            RunnerScope::System => "/admin/actions/runners".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape() {
        assert_eq!(escape("acme-lib_1.0"), "acme-lib_1.0");
        assert_eq!(escape("feature/x y"), "feature%2Fx%20y");
        assert_eq!(escape("café"), "caf%C3%A9");
    }

    #[test]
    fn test_split_repository() {
        assert_eq!(
            split_repository("acme/lib").unwrap(),
            ("acme".to_string(), "lib".to_string())
        );
        for bad in ["acme", "acme/", "/lib", "a/b/c", ""] {
            let err = split_repository(bad).unwrap_err();
            assert!(err.is_terminal(), "{} should be a validation error", bad);
        }
    }

    #[test]
    fn test_runner_scope_paths() {
        assert_eq!(
            RunnerScope::parse("repository", "acme/lib").unwrap().runners_path(),
            "/repos/acme/lib/actions/runners"
        );
        assert_eq!(
            RunnerScope::parse("organization", "acme").unwrap().runners_path(),
            "/orgs/acme/actions/runners"
        );
        assert_eq!(
            RunnerScope::parse("system", "").unwrap().runners_path(),
            "/admin/actions/runners"
        );
    }

    #[test]
    fn test_runner_scope_validation() {
        assert!(RunnerScope::parse("repository", "acme").unwrap_err().is_terminal());
        assert!(RunnerScope::parse("organization", "").unwrap_err().is_terminal());
        assert!(RunnerScope::parse("cluster", "x").unwrap_err().is_terminal());
    }
}
