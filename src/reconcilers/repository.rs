// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Repository reconciler. The external name is the repository name; the
//! owner comes from the spec or, when unset, the token owner.

use super::{differs, Connection, ExternalClient, ExternalCreation, ExternalObservation, ExternalUpdate};
use crate::crd::repository::{Repository, RepositoryObservation, RepositoryParameters};
use crate::crd::Managed;
use crate::error::{ignore_not_found, Result, ResultExt};
use crate::external_name::decode_name;
use crate::gitea::types::{self, CreateRepoOption, EditRepoOption};
use async_trait::async_trait;
use kube::ResourceExt;
use tracing::{debug, instrument};

impl Connection {
    async fn repository_owner(&self, p: &RepositoryParameters) -> Result<String> {
        match &p.owner {
            Some(owner) if !owner.is_empty() => Ok(owner.clone()),
            _ => Ok(self
                .gitea
                .current_user()
                .await
                .context("cannot get authenticated user")?
                .login),
        }
    }
}

fn observation(repo: &types::Repository) -> RepositoryObservation {
    RepositoryObservation {
        id: repo.id,
        full_name: repo.full_name.clone(),
        owner: repo.owner.as_ref().map(|o| o.login.clone()).unwrap_or_default(),
        description: repo.description.clone(),
        website: repo.website.clone(),
        private: repo.private,
        template: repo.template,
        fork: repo.fork,
        empty: repo.empty,
        archived: repo.archived,
        default_branch: repo.default_branch.clone(),
        html_url: repo.html_url.clone(),
        clone_url: repo.clone_url.clone(),
        ssh_url: repo.ssh_url.clone(),
        has_issues: repo.has_issues,
        has_wiki: repo.has_wiki,
        has_pull_requests: repo.has_pull_requests,
        has_projects: repo.has_projects,
        has_releases: repo.has_releases,
        has_actions: repo.has_actions,
        allow_merge_commits: repo.allow_merge_commits,
        allow_rebase: repo.allow_rebase,
        allow_rebase_explicit: repo.allow_rebase_explicit,
        allow_squash_merge: repo.allow_squash_merge,
        default_merge_style: repo.default_merge_style.clone(),
        default_delete_branch_after_merge: repo.default_delete_branch_after_merge,
        stars_count: repo.stars_count,
        forks_count: repo.forks_count,
        size: repo.size,
        created_at: repo.created_at.clone(),
        updated_at: repo.updated_at.clone(),
    }
}

/// Compares the fields `PATCH /repos/{o}/{n}` accepts.
fn is_up_to_date(p: &RepositoryParameters, repo: &types::Repository) -> bool {
    !(differs(p.description.as_deref(), repo.description.as_str())
        || differs(p.website.as_deref(), repo.website.as_str())
        || differs(p.private.as_ref(), &repo.private)
        || differs(p.template.as_ref(), &repo.template)
        || differs(p.default_branch.as_deref(), repo.default_branch.as_str())
        || differs(p.has_issues.as_ref(), &repo.has_issues)
        || differs(p.has_wiki.as_ref(), &repo.has_wiki)
        || differs(p.has_pull_requests.as_ref(), &repo.has_pull_requests)
        || differs(p.has_projects.as_ref(), &repo.has_projects)
        || differs(p.has_releases.as_ref(), &repo.has_releases)
        || differs(p.has_actions.as_ref(), &repo.has_actions)
        || differs(p.allow_merge_commits.as_ref(), &repo.allow_merge_commits)
        || differs(p.allow_rebase.as_ref(), &repo.allow_rebase)
        || differs(p.allow_rebase_explicit.as_ref(), &repo.allow_rebase_explicit)
        || differs(p.allow_squash_merge.as_ref(), &repo.allow_squash_merge)
        || differs(p.default_merge_style.as_deref(), repo.default_merge_style.as_str())
        || differs(
            p.default_delete_branch_after_merge.as_ref(),
            &repo.default_delete_branch_after_merge,
        )
        || differs(p.archived.as_ref(), &repo.archived))
}

fn create_option(p: &RepositoryParameters) -> CreateRepoOption {
    CreateRepoOption {
        name: p.name.clone(),
        description: p.description.clone(),
        private: p.private,
        template: p.template,
        auto_init: p.auto_init,
        gitignores: p.gitignores.clone(),
        license: p.license.clone(),
        readme: p.readme.clone(),
        issue_labels: p.issue_labels.clone(),
        default_branch: p.default_branch.clone(),
        trust_model: p.trust_model.clone(),
    }
}

fn edit_option(p: &RepositoryParameters) -> EditRepoOption {
    EditRepoOption {
        description: p.description.clone(),
        website: p.website.clone(),
        private: p.private,
        template: p.template,
        default_branch: p.default_branch.clone(),
        has_issues: p.has_issues,
        has_wiki: p.has_wiki,
        has_pull_requests: p.has_pull_requests,
        has_projects: p.has_projects,
        has_releases: p.has_releases,
        has_actions: p.has_actions,
        allow_merge_commits: p.allow_merge_commits,
        allow_rebase: p.allow_rebase,
        allow_rebase_explicit: p.allow_rebase_explicit,
        allow_squash_merge: p.allow_squash_merge,
        default_merge_style: p.default_merge_style.clone(),
        default_delete_branch_after_merge: p.default_delete_branch_after_merge,
        archived: p.archived,
    }
}

#[async_trait]
impl ExternalClient<Repository> for Connection {
    #[instrument(skip(self, cr), fields(name = %cr.name_any()))]
    async fn observe(&self, cr: &Repository) -> Result<ExternalObservation<RepositoryObservation>> {
        let Some(name) = cr.external_name().and_then(decode_name) else {
            return Ok(ExternalObservation::absent());
        };
        let p = &cr.spec.for_provider;
        let owner = self.repository_owner(p).await?;

        let repo = ignore_not_found(self.gitea.get_repository(&owner, name).await)
            .context("cannot get repository")?;
        let Some(repo) = repo else {
            debug!("Repository {}/{} not found", owner, name);
            return Ok(ExternalObservation::absent());
        };

        Ok(ExternalObservation::present(observation(&repo), is_up_to_date(p, &repo)))
    }

    #[instrument(skip(self, cr), fields(name = %cr.name_any()))]
    async fn create(&self, cr: &Repository) -> Result<ExternalCreation> {
        let p = &cr.spec.for_provider;
        let opt = create_option(p);

        let repo = match p.owner.as_deref().filter(|o| !o.is_empty()) {
            Some(owner) => {
                let me = self
                    .gitea
                    .current_user()
                    .await
                    .context("cannot get authenticated user")?;
                if me.login.eq_ignore_ascii_case(owner) {
                    self.gitea.create_user_repository(&opt).await
                } else {
                    self.gitea.create_org_repository(owner, &opt).await
                }
            }
            None => self.gitea.create_user_repository(&opt).await,
        }
        .context("cannot create repository")?;

        Ok(ExternalCreation::named(repo.name))
    }

    async fn update(&self, cr: &Repository) -> Result<ExternalUpdate> {
        let p = &cr.spec.for_provider;
        let name = cr.external_name().and_then(decode_name).unwrap_or(&p.name);
        let owner = self.repository_owner(p).await?;

        self.gitea
            .update_repository(&owner, name, &edit_option(p))
            .await
            .context("cannot update repository")?;
        Ok(ExternalUpdate::default())
    }

    async fn delete(&self, cr: &Repository) -> Result<()> {
        let Some(name) = cr.external_name().and_then(decode_name) else {
            return Ok(());
        };
        let owner = self.repository_owner(&cr.spec.for_provider).await?;

        ignore_not_found(self.gitea.delete_repository(&owner, name).await)
            .context("cannot delete repository")?;
        Ok(())
    }
}
