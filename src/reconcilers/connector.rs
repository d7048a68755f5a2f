// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Builds a fresh Gitea client for every reconciliation.

use crate::crd::common::ResourceSpec;
use crate::crd::ProviderConfig;
use crate::error::{ProviderError, Result, ResultExt};
use crate::gitea::{GiteaClient, Transport};
use crate::reconcilers::Connection;
use crate::secrets::{KubeSecretResolver, SecretResolver};
use async_trait::async_trait;
use kube::{Api, Client};
use std::sync::Arc;
use tracing::{debug, instrument};

#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, spec: &ResourceSpec) -> Result<Connection>;
}

/// Reads the referenced ProviderConfig and its token Secret from Kubernetes.
pub struct KubeConnector {
    client: Client,
    secrets: Arc<dyn SecretResolver>,
    transport: Option<Arc<dyn Transport>>,
}

impl KubeConnector {
    pub fn new(client: Client) -> Self {
        let secrets = Arc::new(KubeSecretResolver::new(client.clone()));
        Self {
            client,
            secrets,
            transport: None,
        }
    }

    /// Replaces the secret store.
    pub fn with_secrets(mut self, secrets: Arc<dyn SecretResolver>) -> Self {
        self.secrets = secrets;
        self
    }

    /// Sends all Gitea traffic through `transport` instead of reqwest.
    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }
}

#[async_trait]
impl Connector for KubeConnector {
    #[instrument(skip(self, spec), fields(provider_config = %spec.provider_config_ref.name))]
    async fn connect(&self, spec: &ResourceSpec) -> Result<Connection> {
        let name = &spec.provider_config_ref.name;
        let configs: Api<ProviderConfig> = Api::all(self.client.clone());
        let config = configs
            .get_opt(name)
            .await
            .context("cannot get ProviderConfig")?
            .ok_or_else(|| ProviderError::Credential(format!("ProviderConfig {} not found", name)))?;

        let selector = config.token_selector()?;
        let token = self
            .secrets
            .resolve_string(&selector)
            .await
            .context("cannot resolve credentials")?;
        let token = token.trim();
        if token.is_empty() {
            return Err(ProviderError::Credential(format!(
                "key {} in secret {}/{} is empty",
                selector.key, selector.namespace, selector.name
            )));
        }

        let gitea = match &self.transport {
            Some(transport) => {
                GiteaClient::with_transport(&config.spec.base_url, token, transport.clone())?
            }
            None => GiteaClient::new(&config.spec.base_url, token, config.insecure_skip_verify())?,
        };
        debug!("Connected to {}", gitea.base_url());

        Ok(Connection::new(gitea, self.secrets.clone()))
    }
}
