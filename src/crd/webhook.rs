// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::common::{managed, ManagedStatus, ResourceSpec, SecretKeySelector};

/// A webhook on either a repository or an organization.
#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, PartialEq, JsonSchema)]
#[kube(group = "gitea.crossplane.io", version = "v1alpha1", kind = "Webhook")]
#[kube(status = "WebhookStatus")]
#[serde(rename_all = "camelCase")]
pub struct WebhookSpec {
    #[serde(flatten)]
    pub resource: ResourceSpec,
    pub for_provider: WebhookParameters,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct WebhookParameters {
    /// Repository owner; set together with `repository`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,
    /// Organization; mutually exclusive with `owner`/`repository`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,
    /// gitea, gogs, slack, discord, msteams, ...
    #[serde(rename = "type")]
    pub hook_type: String,
    pub url: String,
    /// json or form
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_method: Option<String>,
    /// Shared secret used to sign payloads
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret_ref: Option<SecretKeySelector>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub events: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch_filter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorization_header_secret_ref: Option<SecretKeySelector>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct WebhookObservation {
    pub id: i64,
    #[serde(rename = "type")]
    pub hook_type: String,
    pub url: String,
    pub content_type: String,
    pub http_method: String,
    pub events: Vec<String>,
    pub active: bool,
    pub branch_filter: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

pub type WebhookStatus = ManagedStatus<WebhookObservation>;
managed!(Webhook, WebhookObservation);
