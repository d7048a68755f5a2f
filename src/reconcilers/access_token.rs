// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Access tokens. Gitea returns the token value once, on creation; it is
//! published as the `token` connection detail.

use super::{differs, Connection, ExternalClient, ExternalCreation, ExternalObservation, ExternalUpdate};
use crate::constants::connection::TOKEN;
use crate::crd::user::{AccessToken, AccessTokenObservation};
use crate::crd::Managed;
use crate::error::{ignore_not_found, ProviderError, Result, ResultExt};
use crate::external_name::{decode_scoped_id, encode_scoped_id};
use crate::gitea::types::{CreateAccessTokenOption, EditAccessTokenOption};
use async_trait::async_trait;
use tracing::warn;

#[async_trait]
impl ExternalClient<AccessToken> for Connection {
    async fn observe(&self, cr: &AccessToken) -> Result<ExternalObservation<AccessTokenObservation>> {
        let Some((username, id)) = cr.external_name().and_then(decode_scoped_id) else {
            return Ok(ExternalObservation::absent());
        };

        let token = ignore_not_found(self.gitea.get_access_token(&username, id).await)
            .context("cannot get access token")?;
        let Some(token) = token else {
            return Ok(ExternalObservation::absent());
        };

        let p = &cr.spec.for_provider;
        let up_to_date = p.name == token.name && !differs(p.scopes.as_ref(), &token.scopes);
        Ok(ExternalObservation::present(
            AccessTokenObservation {
                id: token.id,
                name: token.name,
                token_last_eight: token.token_last_eight,
                scopes: token.scopes,
            },
            up_to_date,
        ))
    }

    async fn create(&self, cr: &AccessToken) -> Result<ExternalCreation> {
        let p = &cr.spec.for_provider;
        let opt = CreateAccessTokenOption {
            name: p.name.clone(),
            scopes: p.scopes.clone(),
        };

        let token = self
            .gitea
            .create_access_token(&p.username, &opt)
            .await
            .context("cannot create access token")?;

        let creation = ExternalCreation::named(encode_scoped_id(&p.username, token.id));
        if token.sha1.is_empty() {
            warn!("Gitea returned no value for access token {}", p.name);
            return Ok(creation);
        }
        Ok(creation.with_detail(TOKEN, token.sha1))
    }

    async fn update(&self, cr: &AccessToken) -> Result<ExternalUpdate> {
        let (username, id) = cr.external_name().and_then(decode_scoped_id).ok_or_else(|| {
            ProviderError::Validation("access token has no valid external name".to_string())
        })?;
        let p = &cr.spec.for_provider;
        let opt = EditAccessTokenOption {
            name: Some(p.name.clone()),
            scopes: p.scopes.clone(),
        };

        self.gitea
            .update_access_token(&username, id, &opt)
            .await
            .context("cannot update access token")?;
        Ok(ExternalUpdate::default())
    }

    async fn delete(&self, cr: &AccessToken) -> Result<()> {
        let Some((username, id)) = cr.external_name().and_then(decode_scoped_id) else {
            return Ok(());
        };
        ignore_not_found(self.gitea.delete_access_token(&username, id).await)
            .context("cannot delete access token")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::user::{AccessTokenParameters, AccessTokenSpec};
    use crate::test_utils::{connection, gitea_client, with_external_name, MockGitea};
    use http::Method;
    use std::sync::Arc;

    fn token() -> AccessToken {
        AccessToken::new(
            "bob-ci",
            AccessTokenSpec {
                resource: Default::default(),
                for_provider: AccessTokenParameters {
                    username: "bob".to_string(),
                    name: "ci".to_string(),
                    scopes: Some(vec!["read:repository".to_string()]),
                },
            },
        )
    }

    #[tokio::test]
    async fn test_create_publishes_token() {
        let mock = Arc::new(MockGitea::new().on(
            Method::POST,
            "/users/bob/tokens",
            201,
            r#"{"id":11,"name":"ci","sha1":"abcdef0123","token_last_eight":"ef0123"}"#,
        ));
        let conn = connection(gitea_client(&mock));

        let creation = conn.create(&token()).await.unwrap();
        assert_eq!(creation.external_name, "bob/11");
        assert_eq!(
            creation.connection_details.get(TOKEN),
            Some(&b"abcdef0123".to_vec())
        );
    }

    #[tokio::test]
    async fn test_observe_compares_scopes() {
        let mock = Arc::new(MockGitea::new().on(
            Method::GET,
            "/users/bob/tokens/11",
            200,
            r#"{"id":11,"name":"ci","token_last_eight":"ef0123","scopes":["read:repository"]}"#,
        ));
        let conn = connection(gitea_client(&mock));

        let obs = conn
            .observe(&with_external_name(token(), "bob/11"))
            .await
            .unwrap();
        assert!(obs.resource_up_to_date);
        assert_eq!(obs.observation.unwrap().token_last_eight, "ef0123");
    }

    #[tokio::test]
    async fn test_delete_by_scoped_id() {
        let mock = Arc::new(MockGitea::new().on(Method::DELETE, "/users/bob/tokens/11", 204, ""));
        let conn = connection(gitea_client(&mock));

        conn.delete(&with_external_name(token(), "bob/11")).await.unwrap();
        assert_eq!(mock.paths(), vec!["DELETE /users/bob/tokens/11"]);
    }
}
