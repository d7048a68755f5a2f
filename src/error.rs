// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Kubernetes API error: {0}")]
    KubeError(#[from] kube::Error),

    #[error("invalid resource: {0}")]
    Validation(String),

    #[error("cannot get credentials: {0}")]
    Credential(String),

    #[error("secret {namespace}/{name} not found")]
    SecretNotFound { namespace: String, name: String },

    #[error("key {key} not present in secret {namespace}/{name}")]
    SecretKeyNotFound {
        namespace: String,
        name: String,
        key: String,
    },

    #[error("secret store unavailable: {0}")]
    SecretStore(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("API request failed with status {status}: {message}")]
    Api { status: u16, message: String },

    #[error("HTTP transport error: {0}")]
    Transport(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{context}: {source}")]
    Context {
        context: String,
        #[source]
        source: Box<ProviderError>,
    },
}

pub type Result<T> = std::result::Result<T, ProviderError>;

impl ProviderError {
    /// Unwraps any number of context layers.
    pub fn root(&self) -> &ProviderError {
        match self {
            ProviderError::Context { source, .. } => source.root(),
            other => other,
        }
    }

    /// True for a Gitea 404 or a kind-specific "not found".
    pub fn is_not_found(&self) -> bool {
        matches!(
            self.root(),
            ProviderError::NotFound(_) | ProviderError::Api { status: 404, .. }
        )
    }

    /// Gitea rejected the token (401) or its scopes (403).
    pub fn is_unauthorized(&self) -> bool {
        matches!(self.root(), ProviderError::Api { status: 401 | 403, .. })
    }

    /// Errors the user has to fix before a retry can succeed.
    pub fn is_terminal(&self) -> bool {
        self.is_unauthorized()
            || matches!(
                self.root(),
                ProviderError::Validation(_)
                    | ProviderError::Credential(_)
                    | ProviderError::SecretNotFound { .. }
                    | ProviderError::SecretKeyNotFound { .. }
            )
    }

    /// HTTP status of the underlying API error, if any.
    pub fn status(&self) -> Option<u16> {
        match self.root() {
            ProviderError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Matches errors whose message carries a 404 status.
pub fn is_not_found(err: &ProviderError) -> bool {
    err.is_not_found() || err.to_string().contains("status 404")
}

/// Prefixes an error with what was being attempted.
pub trait ResultExt<T> {
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T, E: Into<ProviderError>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|source| ProviderError::Context {
            context: context.into(),
            source: Box::new(source.into()),
        })
    }
}

/// Collapses NotFound into `Ok(None)`.
pub fn ignore_not_found<T>(result: Result<T>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if is_not_found(&e) => Ok(None),
        Err(e) => Err(e),
    }
}
