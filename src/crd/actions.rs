// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Gitea Actions: secrets, workflows and runners.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::common::{managed, ManagedStatus, ResourceSpec, SecretKeySelector};

#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, PartialEq, JsonSchema)]
#[kube(group = "gitea.crossplane.io", version = "v1alpha1", kind = "RepositorySecret")]
#[kube(status = "RepositorySecretStatus")]
#[serde(rename_all = "camelCase")]
pub struct RepositorySecretSpec {
    #[serde(flatten)]
    pub resource: ResourceSpec,
    pub for_provider: RepositorySecretParameters,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RepositorySecretParameters {
    pub owner: String,
    pub repository: String,
    /// Secret name as seen by workflows
    pub name: String,
    pub secret_ref: SecretKeySelector,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SecretObservation {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

pub type RepositorySecretStatus = ManagedStatus<SecretObservation>;
managed!(RepositorySecret, SecretObservation);

#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, PartialEq, JsonSchema)]
#[kube(group = "gitea.crossplane.io", version = "v1alpha1", kind = "OrganizationSecret")]
#[kube(status = "OrganizationSecretStatus")]
#[serde(rename_all = "camelCase")]
pub struct OrganizationSecretSpec {
    #[serde(flatten)]
    pub resource: ResourceSpec,
    pub for_provider: OrganizationSecretParameters,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationSecretParameters {
    pub organization: String,
    pub name: String,
    pub secret_ref: SecretKeySelector,
}

pub type OrganizationSecretStatus = ManagedStatus<SecretObservation>;
managed!(OrganizationSecret, SecretObservation);

/// A workflow file under `.gitea/workflows`.
#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, PartialEq, JsonSchema)]
#[kube(group = "gitea.crossplane.io", version = "v1alpha1", kind = "Action")]
#[kube(status = "ActionStatus")]
#[serde(rename_all = "camelCase")]
pub struct ActionSpec {
    #[serde(flatten)]
    pub resource: ResourceSpec,
    pub for_provider: ActionParameters,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ActionParameters {
    pub owner: String,
    pub repository: String,
    /// File name, e.g. `ci.yaml`
    pub workflow_name: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ActionObservation {
    pub id: String,
    pub name: String,
    pub path: String,
    pub state: String,
    pub html_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

pub type ActionStatus = ManagedStatus<ActionObservation>;
managed!(Action, ActionObservation);

#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, PartialEq, JsonSchema)]
#[kube(group = "gitea.crossplane.io", version = "v1alpha1", kind = "Runner")]
#[kube(status = "RunnerStatus")]
#[serde(rename_all = "camelCase")]
pub struct RunnerSpec {
    #[serde(flatten)]
    pub resource: ResourceSpec,
    pub for_provider: RunnerParameters,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RunnerParameters {
    /// repository, organization or system
    pub scope: String,
    /// `owner/repo` for repository scope, the organization name for organization scope
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub scope_value: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<String>>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RunnerObservation {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub status: String,
    pub busy: bool,
    pub version: String,
    pub labels: Vec<String>,
}

pub type RunnerStatus = ManagedStatus<RunnerObservation>;
managed!(Runner, RunnerObservation);
