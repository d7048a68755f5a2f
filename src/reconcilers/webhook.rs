// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Repository and organization webhooks. The parameters name either
//! `owner` + `repository` or `organization`; the external name records which.

use super::{differs, Connection, ExternalClient, ExternalCreation, ExternalObservation, ExternalUpdate};
use crate::crd::webhook::{Webhook, WebhookObservation, WebhookParameters};
use crate::crd::Managed;
use crate::error::{ignore_not_found, ProviderError, Result, ResultExt};
use crate::external_name::HookLocation;
use crate::gitea::types::{self, CreateHookOption, EditHookOption};
use async_trait::async_trait;
use std::collections::BTreeMap;

const DEFAULT_CONTENT_TYPE: &str = "json";
const DEFAULT_EVENTS: &[&str] = &["push"];

/// Owner of a hook that has not been created yet.
enum HookTarget<'a> {
    Repository { owner: &'a str, repo: &'a str },
    Organization(&'a str),
}

fn target(p: &WebhookParameters) -> Result<HookTarget<'_>> {
    fn present(v: &Option<String>) -> Option<&str> { v.as_deref().filter(|s| !s.is_empty()) }
    match (present(&p.owner), present(&p.repository), present(&p.organization)) {
        (Some(owner), Some(repo), None) => Ok(HookTarget::Repository { owner, repo }),
        (None, None, Some(org)) => Ok(HookTarget::Organization(org)),
        _ => Err(ProviderError::Validation(
            "webhook needs either owner and repository or organization".to_string(),
        )),
    }
}

fn observation(hook: types::Hook) -> WebhookObservation {
    let config = |key: &str| hook.config.get(key).cloned().unwrap_or_default();
    WebhookObservation {
        id: hook.id,
        hook_type: hook.hook_type.clone(),
        url: config("url"),
        content_type: config("content_type"),
        http_method: config("http_method"),
        events: hook.events.clone(),
        active: hook.active,
        branch_filter: hook.branch_filter.clone(),
        created_at: hook.created_at.clone(),
        updated_at: hook.updated_at.clone(),
    }
}

/// The secret and authorization header are write-only and not compared.
fn is_up_to_date(p: &WebhookParameters, obs: &WebhookObservation) -> bool {
    p.url == obs.url
        && !differs(p.content_type.as_deref(), obs.content_type.as_str())
        && !differs(p.http_method.as_deref(), obs.http_method.as_str())
        && !differs(p.events.as_ref(), &obs.events)
        && !differs(p.active.as_ref(), &obs.active)
        && !differs(p.branch_filter.as_deref(), obs.branch_filter.as_str())
}

impl Connection {
    async fn hook_config(&self, p: &WebhookParameters) -> Result<BTreeMap<String, String>> {
        let mut config = BTreeMap::new();
        config.insert("url".to_string(), p.url.clone());
        config.insert(
            "content_type".to_string(),
            p.content_type
                .clone()
                .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string()),
        );
        if let Some(method) = &p.http_method {
            config.insert("http_method".to_string(), method.clone());
        }
        if let Some(selector) = &p.secret_ref {
            let secret = self
                .secrets
                .resolve_string(selector)
                .await
                .context("cannot resolve webhook secret")?;
            config.insert("secret".to_string(), secret);
        }
        Ok(config)
    }

    async fn authorization_header(&self, p: &WebhookParameters) -> Result<Option<String>> {
        match &p.authorization_header_secret_ref {
            Some(selector) => Ok(Some(
                self.secrets
                    .resolve_string(selector)
                    .await
                    .context("cannot resolve webhook authorization header")?,
            )),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl ExternalClient<Webhook> for Connection {
    async fn observe(&self, cr: &Webhook) -> Result<ExternalObservation<WebhookObservation>> {
        let Some(location) = cr.external_name().and_then(HookLocation::decode) else {
            return Ok(ExternalObservation::absent());
        };

        let hook = match &location {
            HookLocation::Repository { owner, repo, id } => {
                self.gitea.get_repo_hook(owner, repo, *id).await
            }
            HookLocation::Organization { org, id } => self.gitea.get_org_hook(org, *id).await,
        };
        let Some(hook) = ignore_not_found(hook).context("cannot get webhook")? else {
            return Ok(ExternalObservation::absent());
        };

        let obs = observation(hook);
        let up_to_date = is_up_to_date(&cr.spec.for_provider, &obs);
        Ok(ExternalObservation::present(obs, up_to_date))
    }

    async fn create(&self, cr: &Webhook) -> Result<ExternalCreation> {
        let p = &cr.spec.for_provider;
        let target = target(p)?;
        let opt = CreateHookOption {
            hook_type: p.hook_type.clone(),
            config: self.hook_config(p).await?,
            events: Some(
                p.events
                    .clone()
                    .unwrap_or_else(|| DEFAULT_EVENTS.iter().map(|e| e.to_string()).collect()),
            ),
            active: Some(p.active.unwrap_or(true)),
            branch_filter: p.branch_filter.clone(),
            authorization_header: self.authorization_header(p).await?,
        };

        let location = match target {
            HookTarget::Repository { owner, repo } => {
                let hook = self
                    .gitea
                    .create_repo_hook(owner, repo, &opt)
                    .await
                    .context("cannot create webhook")?;
                HookLocation::Repository {
                    owner: owner.to_string(),
                    repo: repo.to_string(),
                    id: hook.id,
                }
            }
            HookTarget::Organization(org) => {
                let hook = self
                    .gitea
                    .create_org_hook(org, &opt)
                    .await
                    .context("cannot create webhook")?;
                HookLocation::Organization {
                    org: org.to_string(),
                    id: hook.id,
                }
            }
        };
        Ok(ExternalCreation::named(location.encode()))
    }

    async fn update(&self, cr: &Webhook) -> Result<ExternalUpdate> {
        let location = cr
            .external_name()
            .and_then(HookLocation::decode)
            .ok_or_else(|| ProviderError::Validation("webhook has no valid external name".to_string()))?;
        let p = &cr.spec.for_provider;
        let opt = EditHookOption {
            config: Some(self.hook_config(p).await?),
            events: p.events.clone(),
            active: p.active,
            branch_filter: p.branch_filter.clone(),
            authorization_header: self.authorization_header(p).await?,
        };

        let result = match &location {
            HookLocation::Repository { owner, repo, id } => {
                self.gitea.update_repo_hook(owner, repo, *id, &opt).await
            }
            HookLocation::Organization { org, id } => self.gitea.update_org_hook(org, *id, &opt).await,
        };
        result.context("cannot update webhook")?;
        Ok(ExternalUpdate::default())
    }

    async fn delete(&self, cr: &Webhook) -> Result<()> {
        let Some(location) = cr.external_name().and_then(HookLocation::decode) else {
            return Ok(());
        };
        let result = match &location {
            HookLocation::Repository { owner, repo, id } => {
                self.gitea.delete_repo_hook(owner, repo, *id).await
            }
            HookLocation::Organization { org, id } => self.gitea.delete_org_hook(org, *id).await,
        };
        ignore_not_found(result).context("cannot delete webhook")?;
        Ok(())
    }
}
