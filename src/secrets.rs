// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Secret resolution and connection-secret publishing.

use crate::constants::OPERATOR_NAME;
use crate::crd::common::{SecretKeySelector, SecretReference};
use crate::error::{ProviderError, Result};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::ByteString;
use kube::{
    api::{DeleteParams, ObjectMeta, Patch, PatchParams},
    Api, Client,
};
use std::collections::BTreeMap;
use tracing::{debug, info, instrument};

/// Opaque values published for consumers of a managed resource.
pub type ConnectionDetails = BTreeMap<String, Vec<u8>>;

/// Secret type used for published connection details.
pub const CONNECTION_SECRET_TYPE: &str = "connection.crossplane.io/v1alpha1";

/// Label pointing a connection secret back at the managed resource that owns it.
pub const OWNER_LABEL: &str = "gitea.crossplane.io/managed-resource";

/// Fetches one value from the secret store. Never caches.
#[async_trait]
pub trait SecretResolver: Send + Sync {
    async fn resolve(&self, selector: &SecretKeySelector) -> Result<Vec<u8>>;

    /// Resolves and decodes as UTF-8.
    async fn resolve_string(&self, selector: &SecretKeySelector) -> Result<String> {
        let bytes = self.resolve(selector).await?;
        String::from_utf8(bytes).map_err(|_| {
            ProviderError::Credential(format!(
                "key {} in secret {}/{} is not valid UTF-8",
                selector.key, selector.namespace, selector.name
            ))
        })
    }
}

/// Resolver reading Kubernetes Secrets.
#[derive(Clone)]
pub struct KubeSecretResolver {
    client: Client,
}

impl KubeSecretResolver {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SecretResolver for KubeSecretResolver {
    #[instrument(skip(self), fields(secret = %format!("{}/{}", selector.namespace, selector.name)))]
    async fn resolve(&self, selector: &SecretKeySelector) -> Result<Vec<u8>> {
        let secrets: Api<Secret> = Api::namespaced(self.client.clone(), &selector.namespace);
        let secret = secrets
            .get_opt(&selector.name)
            .await
            .map_err(|e| ProviderError::SecretStore(e.to_string()))?
            .ok_or_else(|| ProviderError::SecretNotFound {
                namespace: selector.namespace.clone(),
                name: selector.name.clone(),
            })?;

        secret_value(&secret, &selector.key).ok_or_else(|| ProviderError::SecretKeyNotFound {
            namespace: selector.namespace.clone(),
            name: selector.name.clone(),
            key: selector.key.clone(),
        })
    }
}

/// Value of `key`, preferring `data` over `stringData`.
fn secret_value(secret: &Secret, key: &str) -> Option<Vec<u8>> {
    secret
        .data
        .as_ref()
        .and_then(|d| d.get(key))
        .map(|v| v.0.clone())
        .or_else(|| {
            secret
                .string_data
                .as_ref()
                .and_then(|d| d.get(key))
                .map(|v| v.as_bytes().to_vec())
        })
}

/// Builds the connection secret for `owner`.
pub fn connection_secret(reference: &SecretReference, owner: &str, details: &ConnectionDetails) -> Secret {
    Secret {
        metadata: ObjectMeta {
            name: Some(reference.name.clone()),
            namespace: Some(reference.namespace.clone()),
            labels: Some(BTreeMap::from([(OWNER_LABEL.to_string(), owner.to_string())])),
            ..Default::default()
        },
        data: Some(
            details
                .iter()
                .map(|(k, v)| (k.clone(), ByteString(v.clone())))
                .collect(),
        ),
        type_: Some(CONNECTION_SECRET_TYPE.to_string()),
        ..Default::default()
    }
}

/// Writes the connection details with server-side apply. Empty details are skipped.
#[instrument(skip(client, details), fields(secret = %format!("{}/{}", reference.namespace, reference.name)))]
pub async fn publish_connection_details(
    client: &Client,
    reference: &SecretReference,
    owner: &str,
    details: &ConnectionDetails,
) -> Result<()> {
    if details.is_empty() {
        return Ok(());
    }

    let secrets: Api<Secret> = Api::namespaced(client.clone(), &reference.namespace);
    let secret = connection_secret(reference, owner, details);
    let pp = PatchParams::apply(OPERATOR_NAME).force();
    secrets
        .patch(&reference.name, &pp, &Patch::Apply(&secret))
        .await?;

    debug!("Published {} connection detail(s)", details.len());
    Ok(())
}

/// Removes a published connection secret; a missing secret is fine.
#[instrument(skip(client), fields(secret = %format!("{}/{}", reference.namespace, reference.name)))]
pub async fn delete_connection_secret(client: &Client, reference: &SecretReference) -> Result<()> {
    let secrets: Api<Secret> = Api::namespaced(client.clone(), &reference.namespace);
    match secrets.delete(&reference.name, &DeleteParams::default()).await {
        Ok(_) => {
            info!("Deleted connection secret");
            Ok(())
        }
        Err(kube::Error::Api(ae)) if ae.code == 404 => Ok(()),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{not_found_json, secret_json, MockService};

    fn selector(key: &str) -> SecretKeySelector {
        SecretKeySelector {
            name: "gitea-creds".to_string(),
            namespace: "crossplane-system".to_string(),
            key: key.to_string(),
        }
    }

    #[tokio::test]
    async fn test_resolve_returns_key_bytes() {
        let client = MockService::new()
            .on_get(
                "/api/v1/namespaces/crossplane-system/secrets/gitea-creds",
                200,
                &secret_json("gitea-creds", "crossplane-system", &[("token", "abc123")]),
            )
            .into_client();
        let resolver = KubeSecretResolver::new(client);

        assert_eq!(resolver.resolve(&selector("token")).await.unwrap(), b"abc123");
        assert_eq!(resolver.resolve_string(&selector("token")).await.unwrap(), "abc123");
    }

    #[tokio::test]
    async fn test_resolve_missing_key() {
        let client = MockService::new()
            .on_get(
                "/api/v1/namespaces/crossplane-system/secrets/gitea-creds",
                200,
                &secret_json("gitea-creds", "crossplane-system", &[("token", "abc123")]),
            )
            .into_client();
        let resolver = KubeSecretResolver::new(client);

        let err = resolver.resolve(&selector("password")).await.unwrap_err();
        assert!(matches!(err, ProviderError::SecretKeyNotFound { ref key, .. } if key == "password"));
        assert!(err.is_terminal());
    }

    #[tokio::test]
    async fn test_resolve_missing_secret() {
        let client = MockService::new()
            .on_get(
                "/api/v1/namespaces/crossplane-system/secrets/gitea-creds",
                404,
                &not_found_json("secrets", "gitea-creds"),
            )
            .into_client();
        let resolver = KubeSecretResolver::new(client);

        let err = resolver.resolve(&selector("token")).await.unwrap_err();
        assert!(matches!(err, ProviderError::SecretNotFound { .. }));
    }

    #[tokio::test]
    async fn test_resolve_store_error() {
        let client = MockService::new()
            .on_get(
                "/api/v1/namespaces/crossplane-system/secrets/gitea-creds",
                500,
                r#"{"kind":"Status","apiVersion":"v1","status":"Failure","message":"etcd down","reason":"InternalError","code":500}"#,
            )
            .into_client();
        let resolver = KubeSecretResolver::new(client);

        let err = resolver.resolve(&selector("token")).await.unwrap_err();
        assert!(matches!(err, ProviderError::SecretStore(_)));
        assert!(!err.is_terminal());
    }

    #[test]
    fn test_secret_value_falls_back_to_string_data() {
        let secret = Secret {
            string_data: Some(BTreeMap::from([("k".to_string(), "v".to_string())])),
            ..Default::default()
        };
        assert_eq!(secret_value(&secret, "k"), Some(b"v".to_vec()));
        assert_eq!(secret_value(&secret, "missing"), None);
    }

    #[test]
    fn test_connection_secret_shape() {
        let reference = SecretReference {
            name: "ci-token".to_string(),
            namespace: "apps".to_string(),
        };
        let details = ConnectionDetails::from([("token".to_string(), b"s3cr3t".to_vec())]);

        let secret = connection_secret(&reference, "ci-token", &details);
        assert_eq!(secret.metadata.namespace.as_deref(), Some("apps"));
        assert_eq!(secret.type_.as_deref(), Some(CONNECTION_SECRET_TYPE));
        assert_eq!(
            secret.data.unwrap().get("token"),
            Some(&ByteString(b"s3cr3t".to_vec()))
        );
        assert_eq!(
            secret.metadata.labels.unwrap().get(OWNER_LABEL).map(String::as_str),
            Some("ci-token")
        );
    }

    #[tokio::test]
    async fn test_publish_applies_secret() {
        let reference = SecretReference {
            name: "ci-token".to_string(),
            namespace: "apps".to_string(),
        };
        let mock = MockService::new().on_patch(
            "/api/v1/namespaces/apps/secrets/ci-token",
            200,
            &secret_json("ci-token", "apps", &[("token", "s3cr3t")]),
        );
        let client = mock.clone().into_client();
        let details = ConnectionDetails::from([("token".to_string(), b"s3cr3t".to_vec())]);

        publish_connection_details(&client, &reference, "ci-token", &details)
            .await
            .unwrap();
        assert_eq!(
            mock.requests(),
            vec!["PATCH /api/v1/namespaces/apps/secrets/ci-token".to_string()]
        );
    }

    #[tokio::test]
    async fn test_publish_skips_empty_details() {
        let reference = SecretReference {
            name: "ci-token".to_string(),
            namespace: "apps".to_string(),
        };
        let mock = MockService::new();
        let client = mock.clone().into_client();

        publish_connection_details(&client, &reference, "x", &ConnectionDetails::new())
            .await
            .unwrap();
        assert!(mock.requests().is_empty());
    }

    #[tokio::test]
    async fn test_delete_connection_secret_ignores_missing() {
        let reference = SecretReference {
            name: "gone".to_string(),
            namespace: "apps".to_string(),
        };
        let client = MockService::new().into_client();

        delete_connection_secret(&client, &reference).await.unwrap();
    }

    #[tokio::test]
    async fn test_delete_connection_secret_removes_secret() {
        let reference = SecretReference {
            name: "ci-token".to_string(),
            namespace: "apps".to_string(),
        };
        let mock = MockService::new().on_delete(
            "/api/v1/namespaces/apps/secrets/ci-token",
            200,
            &secret_json("ci-token", "apps", &[]),
        );
        let client = mock.clone().into_client();

        delete_connection_secret(&client, &reference).await.unwrap();
        assert_eq!(
            mock.requests(),
            vec!["DELETE /api/v1/namespaces/apps/secrets/ci-token".to_string()]
        );
    }

    #[tokio::test]
    async fn test_delete_connection_secret_treats_not_found_as_deleted() {
        let reference = SecretReference {
            name: "ci-token".to_string(),
            namespace: "apps".to_string(),
        };
        let mock = MockService::new().on_delete(
            "/api/v1/namespaces/apps/secrets/ci-token",
            404,
            &not_found_json("secrets", "ci-token"),
        );
        let client = mock.clone().into_client();

        delete_connection_secret(&client, &reference).await.unwrap();
        assert_eq!(mock.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_connection_secret_surfaces_server_errors() {
        let reference = SecretReference {
            name: "ci-token".to_string(),
            namespace: "apps".to_string(),
        };
        let failure = serde_json::json!({
            "kind": "Status",
            "apiVersion": "v1",
            "status": "Failure",
            "message": "etcdserver: request timed out",
            "reason": "InternalError",
            "code": 500
        })
        .to_string();
        let client = MockService::new()
            .on_delete("/api/v1/namespaces/apps/secrets/ci-token", 500, &failure)
            .into_client();

        let err = delete_connection_secret(&client, &reference)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ProviderError::KubeError(kube::Error::Api(ref ae)) if ae.code == 500
        ));
    }
}
