// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Actions secrets for repositories and organizations.
//!
//! Gitea never returns secret values, so both kinds are write-through: an
//! existing secret is always reported as drifted and written again on every
//! pass. Organization secrets cannot be read at all (GET answers 405); a set
//! external name is taken as proof of existence.

use super::{Connection, ExternalClient, ExternalCreation, ExternalObservation, ExternalUpdate};
use crate::constants::connection::DATA;
use crate::crd::actions::{OrganizationSecret, RepositorySecret, SecretObservation};
use crate::crd::{Managed, SecretKeySelector};
use crate::error::{ignore_not_found, ProviderError, Result, ResultExt};
use crate::external_name::{decode_pair, encode_pair};
use crate::gitea::types::CreateOrUpdateSecretOption;
use async_trait::async_trait;

impl Connection {
    async fn secret_value(&self, selector: &SecretKeySelector) -> Result<String> {
        self.secrets
            .resolve_string(selector)
            .await
            .context("cannot resolve secret value")
    }
}

fn option(data: &str) -> CreateOrUpdateSecretOption {
    CreateOrUpdateSecretOption {
        data: data.to_string(),
    }
}

fn written(data: String) -> ExternalUpdate {
    let mut update = ExternalUpdate::default();
    update
        .connection_details
        .insert(DATA.to_string(), data.into_bytes());
    update
}

#[async_trait]
impl ExternalClient<RepositorySecret> for Connection {
    async fn observe(&self, cr: &RepositorySecret) -> Result<ExternalObservation<SecretObservation>> {
        let Some((repo, name)) = cr.external_name().and_then(decode_pair) else {
            return Ok(ExternalObservation::absent());
        };
        let owner = &cr.spec.for_provider.owner;

        let secret = ignore_not_found(self.gitea.get_repo_secret(owner, &repo, &name).await)
            .context("cannot get repository secret")?;
        Ok(match secret {
            Some(secret) => ExternalObservation::present(
                SecretObservation {
                    name: secret.name,
                    created_at: secret.created_at,
                },
                false,
            ),
            None => ExternalObservation::absent(),
        })
    }

    async fn create(&self, cr: &RepositorySecret) -> Result<ExternalCreation> {
        let p = &cr.spec.for_provider;
        let data = self.secret_value(&p.secret_ref).await?;
        self.gitea
            .put_repo_secret(&p.owner, &p.repository, &p.name, &option(&data))
            .await
            .context("cannot create repository secret")?;
        Ok(ExternalCreation::named(encode_pair(&p.repository, &p.name)).with_detail(DATA, data))
    }

    async fn update(&self, cr: &RepositorySecret) -> Result<ExternalUpdate> {
        let p = &cr.spec.for_provider;
        let (repo, name) = cr
            .external_name()
            .and_then(decode_pair)
            .unwrap_or_else(|| (p.repository.clone(), p.name.clone()));
        let data = self.secret_value(&p.secret_ref).await?;
        self.gitea
            .put_repo_secret(&p.owner, &repo, &name, &option(&data))
            .await
            .context("cannot update repository secret")?;
        Ok(written(data))
    }

    async fn delete(&self, cr: &RepositorySecret) -> Result<()> {
        let Some((repo, name)) = cr.external_name().and_then(decode_pair) else {
            return Ok(());
        };
        ignore_not_found(
            self.gitea
                .delete_repo_secret(&cr.spec.for_provider.owner, &repo, &name)
                .await,
        )
        .context("cannot delete repository secret")?;
        Ok(())
    }
}

#[async_trait]
impl ExternalClient<OrganizationSecret> for Connection {
    async fn observe(&self, cr: &OrganizationSecret) -> Result<ExternalObservation<SecretObservation>> {
        let Some((_, name)) = cr.external_name().and_then(decode_pair) else {
            return Ok(ExternalObservation::absent());
        };
        Ok(ExternalObservation::present(
            SecretObservation {
                name,
                created_at: None,
            },
            false,
        ))
    }

    async fn create(&self, cr: &OrganizationSecret) -> Result<ExternalCreation> {
        let p = &cr.spec.for_provider;
        let data = self.secret_value(&p.secret_ref).await?;
        self.gitea
            .put_org_secret(&p.organization, &p.name, &option(&data))
            .await
            .context("cannot create organization secret")?;
        Ok(ExternalCreation::named(encode_pair(&p.organization, &p.name)).with_detail(DATA, data))
    }

    async fn update(&self, cr: &OrganizationSecret) -> Result<ExternalUpdate> {
        let (org, name) = cr.external_name().and_then(decode_pair).ok_or_else(|| {
            ProviderError::Validation("organization secret has no valid external name".to_string())
        })?;
        let data = self.secret_value(&cr.spec.for_provider.secret_ref).await?;
        self.gitea
            .put_org_secret(&org, &name, &option(&data))
            .await
            .context("cannot update organization secret")?;
        Ok(written(data))
    }

    async fn delete(&self, cr: &OrganizationSecret) -> Result<()> {
        let Some((org, name)) = cr.external_name().and_then(decode_pair) else {
            return Ok(());
        };
        ignore_not_found(self.gitea.delete_org_secret(&org, &name).await)
            .context("cannot delete organization secret")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::actions::{
        OrganizationSecretParameters, OrganizationSecretSpec, RepositorySecretParameters, RepositorySecretSpec,
    };
    use crate::test_utils::{connection_with, gitea_client, selector, with_external_name, MockGitea, StaticSecrets};
    use http::Method;
    use std::sync::Arc;

    fn secrets() -> StaticSecrets {
        StaticSecrets::new().with("crossplane-system", "ci", "token", "s3cr3t")
    }

    fn org_secret() -> OrganizationSecret {
        OrganizationSecret::new(
            "acme-ci-token",
            OrganizationSecretSpec {
                resource: Default::default(),
                for_provider: OrganizationSecretParameters {
                    organization: "acme".to_string(),
                    name: "CI_TOKEN".to_string(),
                    secret_ref: selector("ci", "token"),
                },
            },
        )
    }

    fn repo_secret() -> RepositorySecret {
        RepositorySecret::new(
            "lib-ci-token",
            RepositorySecretSpec {
                resource: Default::default(),
                for_provider: RepositorySecretParameters {
                    owner: "acme".to_string(),
                    repository: "lib".to_string(),
                    name: "CI_TOKEN".to_string(),
                    secret_ref: selector("ci", "token"),
                },
            },
        )
    }

    #[tokio::test]
    async fn test_organization_secret_write_through() {
        let mock = Arc::new(MockGitea::new().on(Method::PUT, "/orgs/acme/actions/secrets/CI_TOKEN", 201, ""));
        let conn = connection_with(gitea_client(&mock), secrets());

        let creation = conn.create(&org_secret()).await.unwrap();
        assert_eq!(creation.external_name, "acme/CI_TOKEN");
        assert_eq!(
            creation.connection_details.get(DATA),
            Some(&b"s3cr3t".to_vec())
        );
        assert_eq!(
            mock.last_body(Method::PUT, "/orgs/acme/actions/secrets/CI_TOKEN")
                .unwrap(),
            serde_json::json!({"data": "s3cr3t"})
        );

        let cr = with_external_name(org_secret(), "acme/CI_TOKEN");
        let obs = conn.observe(&cr).await.unwrap();
        assert!(obs.resource_exists);
        assert!(!obs.resource_up_to_date);

        let update = conn.update(&cr).await.unwrap();
        assert_eq!(
            update.connection_details.get(DATA),
            Some(&b"s3cr3t".to_vec())
        );
        assert_eq!(
            mock.paths(),
            vec![
                "PUT /orgs/acme/actions/secrets/CI_TOKEN",
                "PUT /orgs/acme/actions/secrets/CI_TOKEN"
            ]
        );
    }

    #[tokio::test]
    async fn test_repository_secret_existence_check() {
        let mock = Arc::new(
            MockGitea::new()
                .on(Method::GET, "/repos/acme/lib/actions/secrets/CI_TOKEN", 404, "")
                .on(
                    Method::GET,
                    "/repos/acme/lib/actions/secrets/CI_TOKEN",
                    200,
                    r#"{"name":"CI_TOKEN"}"#,
                ),
        );
        let conn = connection_with(gitea_client(&mock), secrets());
        let cr = with_external_name(repo_secret(), "lib/CI_TOKEN");

        assert!(!conn.observe(&cr).await.unwrap().resource_exists);

        let obs = conn.observe(&cr).await.unwrap();
        assert!(obs.resource_exists);
        assert!(!obs.resource_up_to_date);
    }

    #[tokio::test]
    async fn test_repository_secret_create() {
        let mock = Arc::new(MockGitea::new().on(Method::PUT, "/repos/acme/lib/actions/secrets/CI_TOKEN", 201, ""));
        let conn = connection_with(gitea_client(&mock), secrets());

        let creation = conn.create(&repo_secret()).await.unwrap();
        assert_eq!(creation.external_name, "lib/CI_TOKEN");
    }
}
