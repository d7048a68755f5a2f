// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Organizations, their settings, members and teams.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::common::{managed, ManagedStatus, ResourceSpec};

#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, PartialEq, JsonSchema)]
#[kube(group = "gitea.crossplane.io", version = "v1alpha1", kind = "Organization")]
#[kube(status = "OrganizationStatus")]
#[serde(rename_all = "camelCase")]
pub struct OrganizationSpec {
    #[serde(flatten)]
    pub resource: ResourceSpec,
    pub for_provider: OrganizationParameters,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationParameters {
    /// Organization login, fixed at creation
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// public, limited or private
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visibility: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repo_admin_change_team_access: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationObservation {
    pub id: i64,
    pub name: String,
    pub full_name: String,
    pub description: String,
    pub website: String,
    pub location: String,
    pub visibility: String,
    pub repo_admin_change_team_access: bool,
    pub email: String,
    pub avatar_url: String,
}

pub type OrganizationStatus = ManagedStatus<OrganizationObservation>;
managed!(Organization, OrganizationObservation);

#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, PartialEq, JsonSchema)]
#[kube(group = "gitea.crossplane.io", version = "v1alpha1", kind = "OrganizationSettings")]
#[kube(status = "OrganizationSettingsStatus")]
#[serde(rename_all = "camelCase")]
pub struct OrganizationSettingsSpec {
    #[serde(flatten)]
    pub resource: ResourceSpec,
    pub for_provider: OrganizationSettingsParameters,
}

/// Limited to what `PATCH /orgs/{name}` accepts.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationSettingsParameters {
    pub organization: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visibility: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repo_admin_change_team_access: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

pub type OrganizationSettingsStatus = ManagedStatus<OrganizationObservation>;
managed!(OrganizationSettings, OrganizationObservation);

#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, PartialEq, JsonSchema)]
#[kube(group = "gitea.crossplane.io", version = "v1alpha1", kind = "OrganizationMember")]
#[kube(status = "OrganizationMemberStatus")]
#[serde(rename_all = "camelCase")]
pub struct OrganizationMemberSpec {
    #[serde(flatten)]
    pub resource: ResourceSpec,
    pub for_provider: OrganizationMemberParameters,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationMemberParameters {
    pub organization: String,
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Whether the membership is publicly visible
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public: Option<bool>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationMemberObservation {
    pub organization: String,
    pub username: String,
    pub public: bool,
}

pub type OrganizationMemberStatus = ManagedStatus<OrganizationMemberObservation>;
managed!(OrganizationMember, OrganizationMemberObservation);

#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, PartialEq, JsonSchema)]
#[kube(group = "gitea.crossplane.io", version = "v1alpha1", kind = "Team")]
#[kube(status = "TeamStatus")]
#[serde(rename_all = "camelCase")]
pub struct TeamSpec {
    #[serde(flatten)]
    pub resource: ResourceSpec,
    pub for_provider: TeamParameters,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TeamParameters {
    pub organization: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// read, write or admin
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permission: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub can_create_org_repo: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub includes_all_repositories: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub units: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub units_map: Option<BTreeMap<String, String>>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TeamObservation {
    pub id: i64,
    pub name: String,
    pub organization: String,
    pub description: String,
    pub permission: String,
    pub can_create_org_repo: bool,
    pub includes_all_repositories: bool,
    pub units: Vec<String>,
    pub units_map: BTreeMap<String, String>,
}

pub type TeamStatus = ManagedStatus<TeamObservation>;
managed!(Team, TeamObservation);
