// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Server-side git hooks. Gitea always lists every hook; one with no content
//! counts as absent. Create and Update both set the content.

use super::{Connection, ExternalClient, ExternalCreation, ExternalObservation, ExternalUpdate};
use crate::crd::repository::{GitHook, GitHookObservation, GitHookParameters};
use crate::crd::Managed;
use crate::error::{ignore_not_found, ProviderError, Result, ResultExt};
use crate::external_name::{decode_repo_name, encode_repo_name};
use crate::gitea::split_repository;
use crate::gitea::types::EditGitHookOption;
use async_trait::async_trait;

const HOOK_NAMES: &[&str] = &["pre-receive", "update", "post-receive"];

fn validate(p: &GitHookParameters) -> Result<(String, String)> {
    if !HOOK_NAMES.contains(&p.hook_name.as_str()) {
        return Err(ProviderError::Validation(format!(
            "unsupported git hook {:?}, expected one of {}",
            p.hook_name,
            HOOK_NAMES.join(", ")
        )));
    }
    split_repository(&p.repository)
}

fn same_content(desired: &str, observed: &str) -> bool {
    desired.trim_end() == observed.trim_end()
}

impl Connection {
    async fn set_git_hook(&self, owner: &str, repo: &str, name: &str, content: &str) -> Result<()> {
        let opt = EditGitHookOption {
            content: content.to_string(),
        };
        self.gitea.edit_git_hook(owner, repo, name, &opt).await?;
        Ok(())
    }
}

#[async_trait]
impl ExternalClient<GitHook> for Connection {
    async fn observe(&self, cr: &GitHook) -> Result<ExternalObservation<GitHookObservation>> {
        let Some((owner, repo, name)) = cr.external_name().and_then(decode_repo_name) else {
            return Ok(ExternalObservation::absent());
        };

        let hook = ignore_not_found(self.gitea.get_git_hook(&owner, &repo, &name).await)
            .context("cannot get git hook")?;
        let Some(hook) = hook.filter(|h| !h.content.trim().is_empty()) else {
            return Ok(ExternalObservation::absent());
        };

        let up_to_date = same_content(&cr.spec.for_provider.content, &hook.content);
        Ok(ExternalObservation::present(
            GitHookObservation {
                name: hook.name,
                is_active: hook.is_active,
                content: hook.content,
            },
            up_to_date,
        ))
    }

    async fn create(&self, cr: &GitHook) -> Result<ExternalCreation> {
        let p = &cr.spec.for_provider;
        let (owner, repo) = validate(p)?;
        self.set_git_hook(&owner, &repo, &p.hook_name, &p.content)
            .await
            .context("cannot create git hook")?;
        Ok(ExternalCreation::named(encode_repo_name(
            &owner,
            &repo,
            &p.hook_name,
        )))
    }

    async fn update(&self, cr: &GitHook) -> Result<ExternalUpdate> {
        let p = &cr.spec.for_provider;
        let (owner, repo, name) = match cr.external_name().and_then(decode_repo_name) {
            Some(parts) => parts,
            None => {
                let (owner, repo) = validate(p)?;
                (owner, repo, p.hook_name.clone())
            }
        };
        self.set_git_hook(&owner, &repo, &name, &p.content)
            .await
            .context("cannot update git hook")?;
        Ok(ExternalUpdate::default())
    }

    async fn delete(&self, cr: &GitHook) -> Result<()> {
        let Some((owner, repo, name)) = cr.external_name().and_then(decode_repo_name) else {
            return Ok(());
        };
        ignore_not_found(self.gitea.delete_git_hook(&owner, &repo, &name).await)
            .context("cannot delete git hook")?;
        Ok(())
    }
}
