// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Fields and behaviour shared by every managed resource kind.

use crate::constants::{annotations, provider_config};
use kube::{Resource, ResourceExt};
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// Spec fields common to all managed resources, flattened next to `forProvider`.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResourceSpec {
    /// ProviderConfig used to reach Gitea
    #[serde(default)]
    pub provider_config_ref: ProviderConfigReference,
    /// Secret receiving connection details such as generated tokens
    #[serde(skip_serializing_if = "Option::is_none")]
    pub write_connection_secret_to_ref: Option<SecretReference>,
    #[serde(default)]
    pub deletion_policy: DeletionPolicy,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, JsonSchema)]
pub struct ProviderConfigReference {
    pub name: String,
}

impl Default for ProviderConfigReference {
    fn default() -> Self {
        Self {
            name: provider_config::DEFAULT_NAME.to_string(),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, JsonSchema)]
pub struct SecretReference {
    pub name: String,
    pub namespace: String,
}

/// Points at one key of a Kubernetes Secret.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, JsonSchema)]
pub struct SecretKeySelector {
    pub name: String,
    pub namespace: String,
    pub key: String,
}

/// What happens to the Gitea object when the managed resource is deleted.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq, JsonSchema)]
pub enum DeletionPolicy {
    #[default]
    Delete,
    Orphan,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ManagedStatus<O> {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
    /// Last observed state of the Gitea object
    #[serde(skip_serializing_if = "Option::is_none")]
    pub at_provider: Option<O>,
}

pub mod condition_types {
    pub const READY: &str = "Ready";
    pub const SYNCED: &str = "Synced";
    pub const DIVERGED: &str = "Diverged";
}

pub mod reasons {
    pub const CREATING: &str = "Creating";
    pub const AVAILABLE: &str = "Available";
    pub const DELETING: &str = "Deleting";
    pub const RECONCILE_SUCCESS: &str = "ReconcileSuccess";
    pub const RECONCILE_ERROR: &str = "ReconcileError";
    pub const IMMUTABLE_FIELD_CHANGED: &str = "ImmutableFieldChanged";
    pub const IN_SYNC: &str = "InSync";
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    #[serde(rename = "type")]
    pub condition_type: String,
    pub status: String,
    pub reason: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_transition_time: Option<String>,
}

impl Condition {
    fn new(condition_type: &str, status: bool, reason: &str, message: Option<String>) -> Self {
        Condition {
            condition_type: condition_type.to_string(),
            status: if status { "True" } else { "False" }.to_string(),
            reason: reason.to_string(),
            message,
            last_transition_time: None,
        }
    }

    pub fn creating() -> Self {
        Self::new(condition_types::READY, false, reasons::CREATING, None)
    }

    pub fn available() -> Self {
        Self::new(condition_types::READY, true, reasons::AVAILABLE, None)
    }

    pub fn deleting() -> Self {
        Self::new(condition_types::READY, false, reasons::DELETING, None)
    }

    pub fn reconcile_success() -> Self {
        Self::new(condition_types::SYNCED, true, reasons::RECONCILE_SUCCESS, None)
    }

    pub fn reconcile_error(message: impl Into<String>) -> Self {
        Self::new(
            condition_types::SYNCED,
            false,
            reasons::RECONCILE_ERROR,
            Some(message.into()),
        )
    }

    pub fn diverged(message: impl Into<String>) -> Self {
        Self::new(
            condition_types::DIVERGED,
            true,
            reasons::IMMUTABLE_FIELD_CHANGED,
            Some(message.into()),
        )
    }

    pub fn not_diverged() -> Self {
        Self::new(condition_types::DIVERGED, false, reasons::IN_SYNC, None)
    }

    pub fn is_true(&self) -> bool {
        self.status == "True"
    }
}

/// Replaces the condition of the same type. The transition time only moves
/// when the status flips.
pub fn set_condition(conditions: &mut Vec<Condition>, mut condition: Condition, now: &str) {
    match conditions
        .iter_mut()
        .find(|c| c.condition_type == condition.condition_type)
    {
        Some(existing) => {
            condition.last_transition_time = if existing.status == condition.status {
                existing
                    .last_transition_time
                    .clone()
                    .or_else(|| Some(now.to_string()))
            } else {
                Some(now.to_string())
            };
            *existing = condition;
        }
        None => {
            condition.last_transition_time = Some(now.to_string());
            conditions.push(condition);
        }
    }
}

/// Behaviour every managed kind exposes to the generic reconciler.
pub trait Managed:
    Resource<DynamicType = ()> + Clone + Debug + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// Projection written to `status.atProvider`
    type Observation: Clone + Debug + PartialEq + Serialize + Send + Sync + 'static;

    fn resource_spec(&self) -> &ResourceSpec;

    fn conditions(&self) -> &[Condition];

    /// The external-name annotation; empty values count as unset.
    fn external_name(&self) -> Option<&str> {
        self.annotations()
            .get(annotations::EXTERNAL_NAME)
            .map(|s| s.as_str())
            .filter(|s| !s.is_empty())
    }

    fn condition(&self, condition_type: &str) -> Option<&Condition> {
        self.conditions()
            .iter()
            .find(|c| c.condition_type == condition_type)
    }
}

/// Implements [`Managed`] for a kind whose spec flattens `resource` and whose
/// status is a `ManagedStatus`.
macro_rules! managed {
    ($kind:ident, $observation:ty) => {
        impl $crate::crd::common::Managed for $kind {
            type Observation = $observation;

            fn resource_spec(&self) -> &$crate::crd::common::ResourceSpec {
                &self.spec.resource
            }

            fn conditions(&self) -> &[$crate::crd::common::Condition] {
                self.status
                    .as_ref()
                    .map(|s| s.conditions.as_slice())
                    .unwrap_or(&[])
            }
        }
    };
}

pub(crate) use managed;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_condition_appends_with_time() {
        let mut conditions = vec![];
        set_condition(&mut conditions, Condition::creating(), "t1");
        assert_eq!(conditions.len(), 1);
        assert_eq!(conditions[0].last_transition_time.as_deref(), Some("t1"));
        assert_eq!(conditions[0].reason, reasons::CREATING);
    }

    #[test]
    fn test_set_condition_keeps_time_when_status_unchanged() {
        let mut conditions = vec![];
        set_condition(&mut conditions, Condition::reconcile_success(), "t1");
        set_condition(&mut conditions, Condition::reconcile_success(), "t2");
        assert_eq!(conditions[0].last_transition_time.as_deref(), Some("t1"));

        set_condition(&mut conditions, Condition::reconcile_error("boom"), "t3");
        assert_eq!(conditions.len(), 1);
        assert_eq!(conditions[0].last_transition_time.as_deref(), Some("t3"));
        assert_eq!(conditions[0].message.as_deref(), Some("boom"));
    }

    #[test]
    fn test_set_condition_ready_transitions() {
        let mut conditions = vec![];
        set_condition(&mut conditions, Condition::creating(), "t1");
        set_condition(&mut conditions, Condition::reconcile_success(), "t1");
        set_condition(&mut conditions, Condition::available(), "t2");

        assert_eq!(conditions.len(), 2);
        let ready = conditions
            .iter()
            .find(|c| c.condition_type == condition_types::READY)
            .unwrap();
        assert!(ready.is_true());
        assert_eq!(ready.reason, reasons::AVAILABLE);
    }

    #[test]
    fn test_resource_spec_defaults() {
        let spec: ResourceSpec = serde_json::from_str("{}").unwrap();
        assert_eq!(spec.provider_config_ref.name, "default");
        assert_eq!(spec.deletion_policy, DeletionPolicy::Delete);
        assert!(spec.write_connection_secret_to_ref.is_none());
    }
}
