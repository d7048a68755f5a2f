// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! SSH keys: repository deploy keys and user public keys.
//!
//! Key material is immutable; only the title follows the spec after creation.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::common::{managed, ManagedStatus, ResourceSpec};

#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, PartialEq, JsonSchema)]
#[kube(group = "gitea.crossplane.io", version = "v1alpha1", kind = "DeployKey")]
#[kube(status = "DeployKeyStatus")]
#[serde(rename_all = "camelCase")]
pub struct DeployKeySpec {
    #[serde(flatten)]
    pub resource: ResourceSpec,
    pub for_provider: RepositoryKeyParameters,
}

#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, PartialEq, JsonSchema)]
#[kube(group = "gitea.crossplane.io", version = "v1alpha1", kind = "RepositoryKey")]
#[kube(status = "RepositoryKeyStatus")]
#[serde(rename_all = "camelCase")]
pub struct RepositoryKeySpec {
    #[serde(flatten)]
    pub resource: ResourceSpec,
    pub for_provider: RepositoryKeyParameters,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryKeyParameters {
    pub owner: String,
    pub repository: String,
    pub title: String,
    /// Public key in authorized_keys format
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_only: Option<bool>,
}

#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, PartialEq, JsonSchema)]
#[kube(group = "gitea.crossplane.io", version = "v1alpha1", kind = "UserKey")]
#[kube(status = "UserKeyStatus")]
#[serde(rename_all = "camelCase")]
pub struct UserKeySpec {
    #[serde(flatten)]
    pub resource: ResourceSpec,
    pub for_provider: UserKeyParameters,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserKeyParameters {
    pub username: String,
    pub title: String,
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_only: Option<bool>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct KeyObservation {
    pub id: i64,
    pub title: String,
    pub key: String,
    pub fingerprint: String,
    pub read_only: bool,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

pub type DeployKeyStatus = ManagedStatus<KeyObservation>;
pub type RepositoryKeyStatus = ManagedStatus<KeyObservation>;
pub type UserKeyStatus = ManagedStatus<KeyObservation>;

managed!(DeployKey, KeyObservation);
managed!(RepositoryKey, KeyObservation);
managed!(UserKey, KeyObservation);
