// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Custom resource definitions served under `gitea.crossplane.io/v1alpha1`.

pub mod actions;
pub mod common;
pub mod issue;
pub mod keys;
pub mod organization;
pub mod provider_config;
pub mod repository;
pub mod user;
pub mod webhook;

pub use actions::{Action, OrganizationSecret, RepositorySecret, Runner};
pub use common::{
    Condition, DeletionPolicy, Managed, ManagedStatus, ResourceSpec, SecretKeySelector,
    SecretReference,
};
pub use issue::{Issue, PullRequest, Release};
pub use keys::{DeployKey, RepositoryKey, UserKey};
pub use organization::{Organization, OrganizationMember, OrganizationSettings, Team};
pub use provider_config::ProviderConfig;
pub use repository::{BranchProtection, GitHook, Label, Repository, RepositoryCollaborator};
pub use user::{AccessToken, AdminUser, User};
pub use webhook::Webhook;

use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
use kube::CustomResourceExt;

/// Every definition the provider installs, ProviderConfig first.
pub fn all() -> Vec<CustomResourceDefinition> {
    vec![
        ProviderConfig::crd(),
        Repository::crd(),
        Organization::crd(),
        User::crd(),
        AdminUser::crd(),
        Team::crd(),
        Label::crd(),
        Webhook::crd(),
        DeployKey::crd(),
        RepositoryKey::crd(),
        UserKey::crd(),
        AccessToken::crd(),
        OrganizationMember::crd(),
        OrganizationSettings::crd(),
        RepositoryCollaborator::crd(),
        BranchProtection::crd(),
        GitHook::crd(),
        Issue::crd(),
        PullRequest::crd(),
        Release::crd(),
        RepositorySecret::crd(),
        OrganizationSecret::crd(),
        Action::crd(),
        Runner::crd(),
    ]
}
