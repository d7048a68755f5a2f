// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

use super::{differs, Connection, ExternalClient, ExternalCreation, ExternalObservation, ExternalUpdate};
use crate::crd::repository::{RepositoryCollaborator, RepositoryCollaboratorObservation, RepositoryCollaboratorParameters};
use crate::crd::Managed;
use crate::error::{ignore_not_found, Result, ResultExt};
use crate::external_name::{decode_repo_name, encode_repo_name};
use crate::gitea::types::AddCollaboratorOption;
use async_trait::async_trait;

impl Connection {
    /// `PUT …/collaborators/{user}` both adds and changes permission.
    async fn put_collaborator(
        &self,
        owner: &str,
        repo: &str,
        user: &str,
        p: &RepositoryCollaboratorParameters,
    ) -> Result<()> {
        let opt = AddCollaboratorOption {
            permission: p.permission.clone(),
        };
        self.gitea.add_collaborator(owner, repo, user, &opt).await
    }
}

#[async_trait]
impl ExternalClient<RepositoryCollaborator> for Connection {
    async fn observe(
        &self,
        cr: &RepositoryCollaborator,
    ) -> Result<ExternalObservation<RepositoryCollaboratorObservation>> {
        let Some((owner, repo, user)) = cr.external_name().and_then(decode_repo_name) else {
            return Ok(ExternalObservation::absent());
        };

        let found = ignore_not_found(self.gitea.is_collaborator(&owner, &repo, &user).await)
            .context("cannot check collaborator")?;
        if found.is_none() {
            return Ok(ExternalObservation::absent());
        }

        let permission = self
            .gitea
            .get_collaborator_permission(&owner, &repo, &user)
            .await
            .context("cannot get collaborator permission")?;

        let up_to_date = !differs(
            cr.spec.for_provider.permission.as_deref(),
            permission.permission.as_str(),
        );
        Ok(ExternalObservation::present(
            RepositoryCollaboratorObservation {
                username: user,
                permission: permission.permission,
                role_name: permission.role_name,
            },
            up_to_date,
        ))
    }

    async fn create(&self, cr: &RepositoryCollaborator) -> Result<ExternalCreation> {
        let p = &cr.spec.for_provider;
        self.put_collaborator(&p.owner, &p.repository, &p.username, p)
            .await
            .context("cannot add collaborator")?;
        Ok(ExternalCreation::named(encode_repo_name(
            &p.owner,
            &p.repository,
            &p.username,
        )))
    }

    async fn update(&self, cr: &RepositoryCollaborator) -> Result<ExternalUpdate> {
        let p = &cr.spec.for_provider;
        let (owner, repo, user) = cr
            .external_name()
            .and_then(decode_repo_name)
            .unwrap_or_else(|| (p.owner.clone(), p.repository.clone(), p.username.clone()));
        self.put_collaborator(&owner, &repo, &user, p)
            .await
            .context("cannot update collaborator")?;
        Ok(ExternalUpdate::default())
    }

    async fn delete(&self, cr: &RepositoryCollaborator) -> Result<()> {
        let Some((owner, repo, user)) = cr.external_name().and_then(decode_repo_name) else {
            return Ok(());
        };
        ignore_not_found(self.gitea.delete_collaborator(&owner, &repo, &user).await)
            .context("cannot remove collaborator")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::repository::RepositoryCollaboratorSpec;
    use crate::test_utils::{connection, gitea_client, with_external_name, MockGitea};
    use http::Method;
    use std::sync::Arc;

    fn collaborator(permission: &str) -> RepositoryCollaborator {
        RepositoryCollaborator::new(
            "lib-bob",
            RepositoryCollaboratorSpec {
                resource: Default::default(),
                for_provider: RepositoryCollaboratorParameters {
                    owner: "acme".to_string(),
                    repository: "lib".to_string(),
                    username: "bob".to_string(),
                    permission: Some(permission.to_string()),
                },
            },
        )
    }

    #[tokio::test]
    async fn test_create_puts_permission() {
        let mock = Arc::new(MockGitea::new().on(Method::PUT, "/repos/acme/lib/collaborators/bob", 204, ""));
        let conn = connection(gitea_client(&mock));

        let creation = conn.create(&collaborator("write")).await.unwrap();
        assert_eq!(creation.external_name, "acme/lib/bob");
        assert_eq!(
            mock.last_body(Method::PUT, "/repos/acme/lib/collaborators/bob").unwrap(),
            serde_json::json!({"permission": "write"})
        );
    }

    #[tokio::test]
    async fn test_observe_permission_drift() {
        let mock = Arc::new(
            MockGitea::new()
                .on(Method::GET, "/repos/acme/lib/collaborators/bob", 204, "")
                .on(
                    Method::GET,
                    "/repos/acme/lib/collaborators/bob/permission",
                    200,
                    r#"{"permission":"read","role_name":"read"}"#,
                ),
        );
        let conn = connection(gitea_client(&mock));

        let obs = conn
            .observe(&with_external_name(collaborator("write"), "acme/lib/bob"))
            .await
            .unwrap();
        assert!(obs.resource_exists);
        assert!(!obs.resource_up_to_date);
        assert_eq!(obs.observation.unwrap().permission, "read");
    }

    #[tokio::test]
    async fn test_not_a_collaborator_is_absent() {
        let mock = Arc::new(MockGitea::new());
        let conn = connection(gitea_client(&mock));

        let obs = conn
            .observe(&with_external_name(collaborator("write"), "acme/lib/bob"))
            .await
            .unwrap();
        assert!(!obs.resource_exists);
        assert_eq!(mock.paths(), vec!["GET /repos/acme/lib/collaborators/bob"]);
    }
}
