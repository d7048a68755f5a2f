// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Repositories and the objects that live directly inside one.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::common::{managed, ManagedStatus, ResourceSpec};

#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, PartialEq, JsonSchema)]
#[kube(group = "gitea.crossplane.io", version = "v1alpha1", kind = "Repository")]
#[kube(status = "RepositoryStatus")]
#[serde(rename_all = "camelCase")]
pub struct RepositorySpec {
    #[serde(flatten)]
    pub resource: ResourceSpec,
    pub for_provider: RepositoryParameters,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryParameters {
    /// Repository name, fixed at creation
    pub name: String,
    /// Owning organization or user; the token owner when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_init: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gitignores: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub readme: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issue_labels: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trust_model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_branch: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_issues: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_wiki: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_pull_requests: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_projects: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_releases: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_actions: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_merge_commits: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_rebase: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_rebase_explicit: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_squash_merge: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_merge_style: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_delete_branch_after_merge: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archived: Option<bool>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryObservation {
    pub id: i64,
    pub full_name: String,
    pub owner: String,
    pub description: String,
    pub website: String,
    pub private: bool,
    pub template: bool,
    pub fork: bool,
    pub empty: bool,
    pub archived: bool,
    pub default_branch: String,
    pub html_url: String,
    pub clone_url: String,
    pub ssh_url: String,
    pub has_issues: bool,
    pub has_wiki: bool,
    pub has_pull_requests: bool,
    pub has_projects: bool,
    pub has_releases: bool,
    pub has_actions: bool,
    pub allow_merge_commits: bool,
    pub allow_rebase: bool,
    pub allow_rebase_explicit: bool,
    pub allow_squash_merge: bool,
    pub default_merge_style: String,
    pub default_delete_branch_after_merge: bool,
    pub stars_count: i64,
    pub forks_count: i64,
    pub size: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

pub type RepositoryStatus = ManagedStatus<RepositoryObservation>;
managed!(Repository, RepositoryObservation);

#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, PartialEq, JsonSchema)]
#[kube(group = "gitea.crossplane.io", version = "v1alpha1", kind = "Label")]
#[kube(status = "LabelStatus")]
#[serde(rename_all = "camelCase")]
pub struct LabelSpec {
    #[serde(flatten)]
    pub resource: ResourceSpec,
    pub for_provider: LabelParameters,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct LabelParameters {
    pub owner: String,
    pub repository: String,
    pub name: String,
    /// Hex color, with or without leading `#`
    pub color: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclusive: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_archived: Option<bool>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct LabelObservation {
    pub id: i64,
    pub name: String,
    pub color: String,
    pub description: String,
    pub exclusive: bool,
    pub is_archived: bool,
    pub url: String,
}

pub type LabelStatus = ManagedStatus<LabelObservation>;
managed!(Label, LabelObservation);

#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, PartialEq, JsonSchema)]
#[kube(group = "gitea.crossplane.io", version = "v1alpha1", kind = "RepositoryCollaborator")]
#[kube(status = "RepositoryCollaboratorStatus")]
#[serde(rename_all = "camelCase")]
pub struct RepositoryCollaboratorSpec {
    #[serde(flatten)]
    pub resource: ResourceSpec,
    pub for_provider: RepositoryCollaboratorParameters,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryCollaboratorParameters {
    pub owner: String,
    pub repository: String,
    pub username: String,
    /// read, write or admin
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permission: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryCollaboratorObservation {
    pub username: String,
    pub permission: String,
    pub role_name: String,
}

pub type RepositoryCollaboratorStatus = ManagedStatus<RepositoryCollaboratorObservation>;
managed!(RepositoryCollaborator, RepositoryCollaboratorObservation);

#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, PartialEq, JsonSchema)]
#[kube(group = "gitea.crossplane.io", version = "v1alpha1", kind = "BranchProtection")]
#[kube(status = "BranchProtectionStatus")]
#[serde(rename_all = "camelCase")]
pub struct BranchProtectionSpec {
    #[serde(flatten)]
    pub resource: ResourceSpec,
    pub for_provider: BranchProtectionParameters,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BranchProtectionParameters {
    /// Repository in the form `owner/repo`
    pub repository: String,
    /// Branch name or glob
    pub branch: String,
    /// Rule name, defaults to the branch
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_push: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_push_whitelist: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub push_whitelist_usernames: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub push_whitelist_teams: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub push_whitelist_deploy_keys: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_merge_whitelist: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merge_whitelist_usernames: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merge_whitelist_teams: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_status_check: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_check_contexts: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required_approvals: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_approvals_whitelist: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approvals_whitelist_usernames: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approvals_whitelist_teams: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_on_rejected_reviews: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_on_official_review_requests: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_on_outdated_branch: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dismiss_stale_approvals: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub require_signed_commits: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protected_file_patterns: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unprotected_file_patterns: Option<String>,
}

impl BranchProtectionParameters {
    pub fn effective_rule_name(&self) -> &str {
        self.rule_name.as_deref().unwrap_or(&self.branch)
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BranchProtectionObservation {
    pub branch_name: String,
    pub rule_name: String,
    pub enable_push: bool,
    pub enable_push_whitelist: bool,
    pub push_whitelist_usernames: Vec<String>,
    pub push_whitelist_teams: Vec<String>,
    pub push_whitelist_deploy_keys: bool,
    pub enable_merge_whitelist: bool,
    pub merge_whitelist_usernames: Vec<String>,
    pub merge_whitelist_teams: Vec<String>,
    pub enable_status_check: bool,
    pub status_check_contexts: Vec<String>,
    pub required_approvals: i64,
    pub enable_approvals_whitelist: bool,
    pub approvals_whitelist_usernames: Vec<String>,
    pub approvals_whitelist_teams: Vec<String>,
    pub block_on_rejected_reviews: bool,
    pub block_on_official_review_requests: bool,
    pub block_on_outdated_branch: bool,
    pub dismiss_stale_approvals: bool,
    pub require_signed_commits: bool,
    pub protected_file_patterns: String,
    pub unprotected_file_patterns: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

pub type BranchProtectionStatus = ManagedStatus<BranchProtectionObservation>;
managed!(BranchProtection, BranchProtectionObservation);

#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, PartialEq, JsonSchema)]
#[kube(group = "gitea.crossplane.io", version = "v1alpha1", kind = "GitHook")]
#[kube(status = "GitHookStatus")]
#[serde(rename_all = "camelCase")]
pub struct GitHookSpec {
    #[serde(flatten)]
    pub resource: ResourceSpec,
    pub for_provider: GitHookParameters,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GitHookParameters {
    /// Repository in the form `owner/repo`
    pub repository: String,
    /// pre-receive, update or post-receive
    pub hook_name: String,
    /// Script body
    pub content: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GitHookObservation {
    pub name: String,
    pub is_active: bool,
    pub content: String,
}

pub type GitHookStatus = ManagedStatus<GitHookObservation>;
managed!(GitHook, GitHookObservation);
