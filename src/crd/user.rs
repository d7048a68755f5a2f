// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Users, admin users and their access tokens.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::common::{managed, ManagedStatus, ResourceSpec, SecretKeySelector};

#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, PartialEq, JsonSchema)]
#[kube(group = "gitea.crossplane.io", version = "v1alpha1", kind = "User")]
#[kube(status = "UserStatus")]
#[serde(rename_all = "camelCase")]
pub struct UserSpec {
    #[serde(flatten)]
    pub resource: ResourceSpec,
    pub for_provider: UserParameters,
}

#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, PartialEq, JsonSchema)]
#[kube(group = "gitea.crossplane.io", version = "v1alpha1", kind = "AdminUser")]
#[kube(status = "AdminUserStatus")]
#[serde(rename_all = "camelCase")]
pub struct AdminUserSpec {
    #[serde(flatten)]
    pub resource: ResourceSpec,
    pub for_provider: UserParameters,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserParameters {
    /// Login, fixed at creation
    pub username: String,
    pub email: String,
    /// Initial password; never read back
    pub password_secret_ref: SecretKeySelector,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub login_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub must_change_password: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub send_notify: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visibility: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub restricted: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prohibit_login: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_git_hook: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_import_local: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_create_organization: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_repo_creation: Option<i64>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserObservation {
    pub id: i64,
    pub username: String,
    pub login_name: String,
    pub full_name: String,
    pub email: String,
    pub avatar_url: String,
    pub is_admin: bool,
    pub active: bool,
    pub prohibit_login: bool,
    pub restricted: bool,
    pub visibility: String,
    pub website: String,
    pub location: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_login: Option<String>,
}

pub type UserStatus = ManagedStatus<UserObservation>;
pub type AdminUserStatus = ManagedStatus<UserObservation>;

managed!(User, UserObservation);
managed!(AdminUser, UserObservation);

#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, PartialEq, JsonSchema)]
#[kube(group = "gitea.crossplane.io", version = "v1alpha1", kind = "AccessToken")]
#[kube(status = "AccessTokenStatus")]
#[serde(rename_all = "camelCase")]
pub struct AccessTokenSpec {
    #[serde(flatten)]
    pub resource: ResourceSpec,
    pub for_provider: AccessTokenParameters,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AccessTokenParameters {
    pub username: String,
    pub name: String,
    /// e.g. `read:repository`, `write:issue`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scopes: Option<Vec<String>>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AccessTokenObservation {
    pub id: i64,
    pub name: String,
    pub token_last_eight: String,
    pub scopes: Vec<String>,
}

pub type AccessTokenStatus = ManagedStatus<AccessTokenObservation>;
managed!(AccessToken, AccessTokenObservation);
