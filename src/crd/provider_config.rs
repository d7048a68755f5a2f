// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::constants::provider_config::{DEFAULT_TOKEN_KEY, SOURCE_SECRET};
use crate::error::{ProviderError, Result};
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::common::SecretKeySelector;

/// How to reach one Gitea instance.
#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, PartialEq, JsonSchema)]
#[kube(group = "gitea.crossplane.io", version = "v1alpha1", kind = "ProviderConfig")]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfigSpec {
    /// Root URL of the Gitea instance, without `/api/v1`
    #[serde(rename = "baseURL")]
    pub base_url: String,
    /// Disable TLS certificate verification
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insecure_skip_verify: Option<bool>,
    pub credentials: ProviderCredentials,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProviderCredentials {
    /// Only `Secret` is supported
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret_ref: Option<TokenSecretReference>,
}

/// Secret holding the access token; the key defaults to `token`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, JsonSchema)]
pub struct TokenSecretReference {
    pub name: String,
    pub namespace: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
}

impl ProviderConfig {
    /// Selector of the token, validating the credential source.
    pub fn token_selector(&self) -> Result<SecretKeySelector> {
        let credentials = &self.spec.credentials;
        if credentials.source != SOURCE_SECRET {
            return Err(ProviderError::Credential(format!(
                "credentials source {:?} is not supported, only {:?}",
                credentials.source, SOURCE_SECRET
            )));
        }
        let secret_ref = credentials.secret_ref.as_ref().ok_or_else(|| {
            ProviderError::Credential("credentials.secretRef is required for source Secret".to_string())
        })?;

        Ok(SecretKeySelector {
            name: secret_ref.name.clone(),
            namespace: secret_ref.namespace.clone(),
            key: secret_ref
                .key
                .clone()
                .unwrap_or_else(|| DEFAULT_TOKEN_KEY.to_string()),
        })
    }

    pub fn insecure_skip_verify(&self) -> bool {
        self.spec.insecure_skip_verify.unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_config(source: &str, key: Option<&str>) -> ProviderConfig {
        ProviderConfig::new(
            "default",
            ProviderConfigSpec {
                base_url: "https://git.example.com".to_string(),
                insecure_skip_verify: None,
                credentials: ProviderCredentials {
                    source: source.to_string(),
                    secret_ref: Some(TokenSecretReference {
                        name: "gitea-creds".to_string(),
                        namespace: "crossplane-system".to_string(),
                        key: key.map(String::from),
                    }),
                },
            },
        )
    }

    #[test]
    fn test_token_selector_defaults_key() {
        let selector = make_config("Secret", None).token_selector().unwrap();
        assert_eq!(selector.key, "token");
        assert_eq!(selector.name, "gitea-creds");
    }

    #[test]
    fn test_token_selector_key_override() {
        let selector = make_config("Secret", Some("apiToken")).token_selector().unwrap();
        assert_eq!(selector.key, "apiToken");
    }

    #[test]
    fn test_unsupported_source_is_credential_error() {
        let err = make_config("InjectedIdentity", None).token_selector().unwrap_err();
        assert!(matches!(err, ProviderError::Credential(_)));
    }

    #[test]
    fn test_missing_secret_ref() {
        let mut config = make_config("Secret", None);
        config.spec.credentials.secret_ref = None;
        assert!(config.token_selector().unwrap_err().is_terminal());
    }

    #[test]
    fn test_base_url_field_name() {
        let spec: ProviderConfigSpec = serde_json::from_value(serde_json::json!({
            "baseURL": "https://git.example.com",
            "insecureSkipVerify": true,
            "credentials": {"source": "Secret", "secretRef": {"name": "s", "namespace": "n"}}
        }))
        .unwrap();
        assert_eq!(spec.base_url, "https://git.example.com");
        assert_eq!(spec.insecure_skip_verify, Some(true));
    }
}
