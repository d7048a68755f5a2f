// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! The managed kinds this provider serves, and their startup.

use crate::config::Config;
use crate::crd::{self, Managed, ProviderConfig};
use crate::kubernetes::{missing_kinds, served_kinds};
use crate::reconcilers::{Connection, Connector, ExternalClient, KubeConnector, ManagedReconciler};
use futures::future::{try_join_all, BoxFuture};
use futures::FutureExt;
use kube::{Client, Resource};
use std::sync::Arc;
use tracing::info;

type Start = fn(Client, Arc<dyn Connector>, Config) -> BoxFuture<'static, anyhow::Result<()>>;

/// One managed kind and how to start its controller.
pub struct Registration {
    pub kind: String,
    start: Start,
}

impl Registration {
    fn of<K>() -> Self
    where
        K: Managed,
        Connection: ExternalClient<K>,
    {
        Registration {
            kind: K::kind(&()).to_string(),
            start: start::<K>,
        }
    }
}

fn start<K>(client: Client, connector: Arc<dyn Connector>, config: Config) -> BoxFuture<'static, anyhow::Result<()>>
where
    K: Managed,
    Connection: ExternalClient<K>,
{
    ManagedReconciler::<K>::new(client, connector, config).run().boxed()
}

/// Every managed kind, in no particular order.
pub fn registrations() -> Vec<Registration> {
    vec![
        Registration::of::<crd::Repository>(),
        Registration::of::<crd::Organization>(),
        Registration::of::<crd::OrganizationSettings>(),
        Registration::of::<crd::OrganizationMember>(),
        Registration::of::<crd::Team>(),
        Registration::of::<crd::User>(),
        Registration::of::<crd::AdminUser>(),
        Registration::of::<crd::AccessToken>(),
        Registration::of::<crd::Label>(),
        Registration::of::<crd::Webhook>(),
        Registration::of::<crd::DeployKey>(),
        Registration::of::<crd::RepositoryKey>(),
        Registration::of::<crd::UserKey>(),
        Registration::of::<crd::RepositoryCollaborator>(),
        Registration::of::<crd::BranchProtection>(),
        Registration::of::<crd::GitHook>(),
        Registration::of::<crd::Issue>(),
        Registration::of::<crd::PullRequest>(),
        Registration::of::<crd::Release>(),
        Registration::of::<crd::RepositorySecret>(),
        Registration::of::<crd::OrganizationSecret>(),
        Registration::of::<crd::Action>(),
        Registration::of::<crd::Runner>(),
    ]
}

/// Kinds that must be served before any controller starts.
pub fn required_kinds() -> Vec<String> {
    let mut kinds: Vec<String> = registrations().into_iter().map(|r| r.kind).collect();
    kinds.push(ProviderConfig::kind(&()).to_string());
    kinds
}

/// Starts one controller per kind. Returns when any of them fails.
pub async fn run(client: Client, config: Config) -> anyhow::Result<()> {
    let missing = missing_kinds(&required_kinds(), &served_kinds(&client).await?);
    if !missing.is_empty() {
        anyhow::bail!("kinds not served by the API server: {}", missing.join(", "));
    }

    let connector: Arc<dyn Connector> = Arc::new(KubeConnector::new(client.clone()));
    let registrations = registrations();
    info!("Starting {} managed resource controllers", registrations.len());

    try_join_all(
        registrations
            .iter()
            .map(|r| (r.start)(client.clone(), connector.clone(), config.clone())),
    )
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_every_crd_is_registered_once() {
        let registered: Vec<String> = registrations().into_iter().map(|r| r.kind).collect();
        let unique: HashSet<&String> = registered.iter().collect();
        assert_eq!(registered.len(), 23);
        assert_eq!(unique.len(), registered.len());

        let mut generated: Vec<String> = crd::all().into_iter().map(|c| c.spec.names.kind).collect();
        generated.sort();
        let mut required = required_kinds();
        required.sort();
        assert_eq!(generated, required);
    }

    #[test]
    fn test_provider_config_is_required() {
        assert!(required_kinds().contains(&"ProviderConfig".to_string()));
        assert!(required_kinds().contains(&"Action".to_string()));
    }
}
