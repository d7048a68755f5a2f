// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Per-kind reconcilers and the generic loop driving them.
//!
//! Each kind implements [`ExternalClient`] on [`Connection`]; the
//! [`managed::ManagedReconciler`] wires that to a kube-runtime controller.

pub mod connector;
pub mod managed;

mod access_token;
mod action;
mod branch_protection;
mod collaborator;
mod git_hook;
mod issue;
mod keys;
mod label;
mod org_member;
mod org_settings;
mod organization;
mod pull_request;
mod release;
mod repository;
mod runner;
mod secrets;
mod team;
mod user;
mod webhook;

use crate::crd::common::Managed;
use crate::error::Result;
use crate::gitea::GiteaClient;
use crate::secrets::SecretResolver;
use async_trait::async_trait;
use std::sync::Arc;

pub use crate::secrets::ConnectionDetails;
pub use connector::{Connector, KubeConnector};
pub use managed::ManagedReconciler;

/// Result of reading the remote counterpart of a managed resource.
#[derive(Debug, Clone, PartialEq)]
pub struct ExternalObservation<O> {
    pub resource_exists: bool,
    pub resource_up_to_date: bool,
    /// Projection for `status.atProvider`
    pub observation: Option<O>,
    pub connection_details: ConnectionDetails,
    /// Drift that Update cannot fix, such as changed key material
    pub diagnostic: Option<String>,
}

impl<O> ExternalObservation<O> {
    pub fn absent() -> Self {
        Self {
            resource_exists: false,
            resource_up_to_date: false,
            observation: None,
            connection_details: ConnectionDetails::new(),
            diagnostic: None,
        }
    }

    pub fn present(observation: O, up_to_date: bool) -> Self {
        Self {
            resource_exists: true,
            resource_up_to_date: up_to_date,
            observation: Some(observation),
            connection_details: ConnectionDetails::new(),
            diagnostic: None,
        }
    }

    pub fn with_diagnostic(mut self, diagnostic: Option<String>) -> Self {
        self.diagnostic = diagnostic;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExternalCreation {
    /// Value for the external-name annotation
    pub external_name: String,
    pub connection_details: ConnectionDetails,
}

impl ExternalCreation {
    pub fn named(external_name: impl Into<String>) -> Self {
        Self {
            external_name: external_name.into(),
            connection_details: ConnectionDetails::new(),
        }
    }

    pub fn with_detail(mut self, key: &str, value: impl Into<Vec<u8>>) -> Self {
        self.connection_details.insert(key.to_string(), value.into());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExternalUpdate {
    pub connection_details: ConnectionDetails,
}

/// The four lifecycle operations of one kind.
#[async_trait]
pub trait ExternalClient<K: Managed>: Send + Sync {
    async fn observe(&self, cr: &K) -> Result<ExternalObservation<K::Observation>>;

    async fn create(&self, cr: &K) -> Result<ExternalCreation>;

    async fn update(&self, cr: &K) -> Result<ExternalUpdate>;

    /// NotFound counts as success.
    async fn delete(&self, cr: &K) -> Result<()>;

    async fn disconnect(&self) -> Result<()> {
        Ok(())
    }
}

/// Everything a reconciliation needs to talk to Gitea. Built per reconciliation.
#[derive(Clone)]
pub struct Connection {
    pub gitea: GiteaClient,
    pub secrets: Arc<dyn SecretResolver>,
}

impl Connection {
    pub fn new(gitea: GiteaClient, secrets: Arc<dyn SecretResolver>) -> Self {
        Self { gitea, secrets }
    }
}

/// True when the desired value is set and differs from the observed one.
pub(crate) fn differs<T: PartialEq + ?Sized>(desired: Option<&T>, observed: &T) -> bool {
    desired.is_some_and(|d| d != observed)
}
