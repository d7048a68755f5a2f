// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! SSH keys: DeployKey and RepositoryKey (both repository deploy keys) and
//! UserKey. Key material is immutable; only the title can be updated. A
//! changed key is reported as a diagnostic and never recreated.

use super::{Connection, ExternalClient, ExternalCreation, ExternalObservation, ExternalUpdate};
use crate::crd::keys::{DeployKey, KeyObservation, RepositoryKey, RepositoryKeyParameters, UserKey};
use crate::crd::Managed;
use crate::error::{ignore_not_found, ProviderError, Result, ResultExt};
use crate::external_name::{decode_id, decode_repo_id, decode_scoped_id, encode_id, encode_repo_id, encode_scoped_id};
use crate::gitea::types::{CreateKeyOption, EditKeyOption, PublicKey};
use async_trait::async_trait;

fn observation(key: PublicKey) -> KeyObservation {
    KeyObservation {
        id: key.id,
        title: key.title,
        key: key.key,
        fingerprint: key.fingerprint,
        read_only: key.read_only,
        url: key.url,
        created_at: key.created_at,
    }
}

/// Compares algorithm and key data, ignoring the trailing comment.
fn same_key(desired: &str, observed: &str) -> bool {
    fn material(k: &str) -> Vec<&str> { k.split_whitespace().take(2).collect() }
    material(desired) == material(observed)
}

fn diagnostic(desired_key: &str, desired_read_only: Option<bool>, observed: &KeyObservation) -> Option<String> {
    let mut changed = Vec::new();
    if !same_key(desired_key, &observed.key) {
        changed.push("key");
    }
    if desired_read_only.is_some_and(|ro| ro != observed.read_only) {
        changed.push("readOnly");
    }
    (!changed.is_empty()).then(|| {
        format!(
            "immutable field(s) {} differ from the registered key; recreate the resource to change them",
            changed.join(", ")
        )
    })
}

fn present(title: &str, key: &str, read_only: Option<bool>, found: PublicKey) -> ExternalObservation<KeyObservation> {
    let obs = observation(found);
    let diagnostic = diagnostic(key, read_only, &obs);
    let up_to_date = obs.title == title;
    ExternalObservation::present(obs, up_to_date).with_diagnostic(diagnostic)
}

fn create_option(title: &str, key: &str, read_only: Option<bool>) -> CreateKeyOption {
    CreateKeyOption {
        title: title.to_string(),
        key: key.trim().to_string(),
        read_only,
    }
}

impl Connection {
    async fn observe_deploy_key(
        &self,
        owner: &str,
        repo: &str,
        id: i64,
        p: &RepositoryKeyParameters,
    ) -> Result<ExternalObservation<KeyObservation>> {
        let key = ignore_not_found(self.gitea.get_deploy_key(owner, repo, id).await)
            .context("cannot get deploy key")?;
        Ok(match key {
            Some(key) => present(&p.title, &p.key, p.read_only, key),
            None => ExternalObservation::absent(),
        })
    }

    async fn create_deploy_key(&self, p: &RepositoryKeyParameters) -> Result<PublicKey> {
        self.gitea
            .create_deploy_key(
                &p.owner,
                &p.repository,
                &create_option(&p.title, &p.key, p.read_only),
            )
            .await
            .context("cannot create deploy key")
    }

    async fn retitle_deploy_key(&self, owner: &str, repo: &str, id: i64, title: &str) -> Result<ExternalUpdate> {
        self.gitea
            .update_deploy_key(
                owner,
                repo,
                id,
                &EditKeyOption {
                    title: title.to_string(),
                },
            )
            .await
            .context("cannot update deploy key")?;
        Ok(ExternalUpdate::default())
    }

    async fn delete_deploy_key(&self, owner: &str, repo: &str, id: i64) -> Result<()> {
        ignore_not_found(self.gitea.delete_deploy_key(owner, repo, id).await)
            .context("cannot delete deploy key")?;
        Ok(())
    }
}

fn invalid_name(kind: &str) -> ProviderError {
    ProviderError::Validation(format!("{} has no valid external name", kind))
}

#[async_trait]
impl ExternalClient<DeployKey> for Connection {
    async fn observe(&self, cr: &DeployKey) -> Result<ExternalObservation<KeyObservation>> {
        let Some((owner, repo, id)) = cr.external_name().and_then(decode_repo_id) else {
            return Ok(ExternalObservation::absent());
        };
        self.observe_deploy_key(&owner, &repo, id, &cr.spec.for_provider)
            .await
    }

    async fn create(&self, cr: &DeployKey) -> Result<ExternalCreation> {
        let p = &cr.spec.for_provider;
        let key = self.create_deploy_key(p).await?;
        Ok(ExternalCreation::named(encode_repo_id(&p.owner, &p.repository, key.id)))
    }

    async fn update(&self, cr: &DeployKey) -> Result<ExternalUpdate> {
        let (owner, repo, id) = cr
            .external_name()
            .and_then(decode_repo_id)
            .ok_or_else(|| invalid_name("deploy key"))?;
        self.retitle_deploy_key(&owner, &repo, id, &cr.spec.for_provider.title)
            .await
    }

    async fn delete(&self, cr: &DeployKey) -> Result<()> {
        match cr.external_name().and_then(decode_repo_id) {
            Some((owner, repo, id)) => self.delete_deploy_key(&owner, &repo, id).await,
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ExternalClient<RepositoryKey> for Connection {
    async fn observe(&self, cr: &RepositoryKey) -> Result<ExternalObservation<KeyObservation>> {
        let Some(id) = cr.external_name().and_then(decode_id) else {
            return Ok(ExternalObservation::absent());
        };
        let p = &cr.spec.for_provider;
        self.observe_deploy_key(&p.owner, &p.repository, id, p).await
    }

    async fn create(&self, cr: &RepositoryKey) -> Result<ExternalCreation> {
        let key = self.create_deploy_key(&cr.spec.for_provider).await?;
        Ok(ExternalCreation::named(encode_id(key.id)))
    }

    async fn update(&self, cr: &RepositoryKey) -> Result<ExternalUpdate> {
        let id = cr
            .external_name()
            .and_then(decode_id)
            .ok_or_else(|| invalid_name("repository key"))?;
        let p = &cr.spec.for_provider;
        self.retitle_deploy_key(&p.owner, &p.repository, id, &p.title)
            .await
    }

    async fn delete(&self, cr: &RepositoryKey) -> Result<()> {
        let p = &cr.spec.for_provider;
        match cr.external_name().and_then(decode_id) {
            Some(id) => self.delete_deploy_key(&p.owner, &p.repository, id).await,
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ExternalClient<UserKey> for Connection {
    async fn observe(&self, cr: &UserKey) -> Result<ExternalObservation<KeyObservation>> {
        let Some((username, id)) = cr.external_name().and_then(decode_scoped_id) else {
            return Ok(ExternalObservation::absent());
        };

        let key = ignore_not_found(self.gitea.get_user_key(&username, id).await)
            .context("cannot get user key")?;
        let p = &cr.spec.for_provider;
        Ok(match key {
            Some(key) => present(&p.title, &p.key, None, key),
            None => ExternalObservation::absent(),
        })
    }

    async fn create(&self, cr: &UserKey) -> Result<ExternalCreation> {
        let p = &cr.spec.for_provider;
        let key = self
            .gitea
            .create_user_key(&p.username, &create_option(&p.title, &p.key, p.read_only))
            .await
            .context("cannot create user key")?;
        Ok(ExternalCreation::named(encode_scoped_id(&p.username, key.id)))
    }

    async fn update(&self, cr: &UserKey) -> Result<ExternalUpdate> {
        let (username, id) = cr
            .external_name()
            .and_then(decode_scoped_id)
            .ok_or_else(|| invalid_name("user key"))?;
        let opt = EditKeyOption {
            title: cr.spec.for_provider.title.clone(),
        };
        self.gitea
            .update_user_key(&username, id, &opt)
            .await
            .context("cannot update user key")?;
        Ok(ExternalUpdate::default())
    }

    async fn delete(&self, cr: &UserKey) -> Result<()> {
        let Some((username, id)) = cr.external_name().and_then(decode_scoped_id) else {
            return Ok(());
        };
        ignore_not_found(self.gitea.delete_user_key(&username, id).await)
            .context("cannot delete user key")?;
        Ok(())
    }
}
