// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Generic managed-resource reconciler on top of kube-runtime.
//!
//! One controller runs per kind. A pass adds the finalizer, connects, observes
//! and then deletes, creates or updates the Gitea object before writing the
//! outcome back into the object's metadata and status.

use crate::config::Config;
use crate::constants::{annotations, FINALIZER};
use crate::crd::common::{condition_types, set_condition, Condition, DeletionPolicy, Managed};
use crate::error::{ProviderError, Result, ResultExt};
use crate::reconcilers::{
    Connection, ConnectionDetails, Connector, ExternalClient, ExternalCreation, ExternalObservation,
    ExternalUpdate,
};
use crate::secrets::{delete_connection_secret, publish_connection_details};
use chrono::{SecondsFormat, Utc};
use futures::StreamExt;
use kube::{
    api::{Patch, PatchParams},
    runtime::{
        controller::{Action, Config as ControllerConfig},
        Controller,
    },
    Api, Client, ResourceExt,
};
use kube_runtime::watcher::Config as WatcherConfig;
use serde_json::json;
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};

/// What a pass decided for the external resource.
#[derive(Debug, PartialEq)]
pub enum Outcome<O> {
    /// Remote object deleted or orphaned; the finalizer can go.
    Released,
    Created(ExternalCreation),
    Synced {
        observation: ExternalObservation<O>,
        update: Option<ExternalUpdate>,
    },
}

/// Observe, then delete, create or update as the observation demands.
pub async fn drive<K, E>(cr: &K, external: &E) -> Result<Outcome<K::Observation>>
where
    K: Managed,
    E: ExternalClient<K> + ?Sized,
{
    let observation = external
        .observe(cr)
        .await
        .context("cannot observe external resource")?;

    if cr.meta().deletion_timestamp.is_some() {
        match cr.resource_spec().deletion_policy {
            DeletionPolicy::Delete if observation.resource_exists => {
                external
                    .delete(cr)
                    .await
                    .context("cannot delete external resource")?;
            }
            DeletionPolicy::Delete => debug!("External resource already gone"),
            DeletionPolicy::Orphan => debug!("Orphaning external resource"),
        }
        return Ok(Outcome::Released);
    }

    if !observation.resource_exists {
        let creation = external
            .create(cr)
            .await
            .context("cannot create external resource")?;
        return Ok(Outcome::Created(creation));
    }

    let update = if observation.resource_up_to_date {
        None
    } else {
        Some(
            external
                .update(cr)
                .await
                .context("cannot update external resource")?,
        )
    };

    Ok(Outcome::Synced { observation, update })
}

/// Runs one kind against the cluster.
pub struct ManagedReconciler<K> {
    client: Client,
    connector: Arc<dyn Connector>,
    config: Config,
    failures: Mutex<HashMap<String, u32>>,
    _kind: PhantomData<fn() -> K>,
}

impl<K> ManagedReconciler<K>
where
    K: Managed,
    Connection: ExternalClient<K>,
{
    pub fn new(client: Client, connector: Arc<dyn Connector>, config: Config) -> Self {
        Self {
            client,
            connector,
            config,
            failures: Mutex::new(HashMap::new()),
            _kind: PhantomData,
        }
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let api: Api<K> = Api::all(self.client.clone());
        let concurrency = self.config.max_concurrent_reconciles;
        let kind = K::kind(&()).to_string();
        let context = Arc::new(self);

        info!("Starting {} controller", kind);
        Controller::new(api, WatcherConfig::default())
            .with_config(ControllerConfig::default().concurrency(concurrency))
            .run(reconcile::<K>, error_policy::<K>, context)
            .for_each(|res| async move {
                match res {
                    Ok((obj, _)) => debug!("Reconciled {}", obj.name),
                    Err(e) => warn!("Reconciliation error: {}", e),
                }
            })
            .await;

        Ok(())
    }

    fn reset_failures(&self, name: &str) {
        if let Ok(mut failures) = self.failures.lock() {
            failures.remove(name);
        }
    }

    /// Counts a failure and returns the backoff for it.
    fn record_failure(&self, name: &str) -> Duration {
        let count = match self.failures.lock() {
            Ok(mut failures) => {
                let count = failures.entry(name.to_string()).or_insert(0);
                *count += 1;
                *count
            }
            Err(_) => 1,
        };
        self.config.backoff(count - 1)
    }

    async fn add_finalizer(&self, api: &Api<K>, cr: &K) -> Result<()> {
        let mut finalizers = cr.finalizers().to_vec();
        finalizers.push(FINALIZER.to_string());
        let patch = json!({"metadata": {"finalizers": finalizers}});
        api.patch(&cr.name_any(), &PatchParams::default(), &Patch::Merge(&patch))
            .await
            .context("cannot add finalizer")?;
        Ok(())
    }

    async fn remove_finalizer(&self, api: &Api<K>, cr: &K) -> Result<()> {
        let finalizers: Vec<String> = cr
            .finalizers()
            .iter()
            .filter(|f| f.as_str() != FINALIZER)
            .cloned()
            .collect();
        let patch = json!({"metadata": {"finalizers": finalizers}});
        api.patch(&cr.name_any(), &PatchParams::default(), &Patch::Merge(&patch))
            .await
            .context("cannot remove finalizer")?;
        Ok(())
    }

    async fn set_external_name(&self, api: &Api<K>, cr: &K, external_name: &str) -> Result<()> {
        let patch = json!({"metadata": {"annotations": {annotations::EXTERNAL_NAME: external_name}}});
        api.patch(&cr.name_any(), &PatchParams::default(), &Patch::Merge(&patch))
            .await
            .context("cannot set external name")?;
        Ok(())
    }

    async fn patch_status(
        &self,
        api: &Api<K>,
        cr: &K,
        conditions: Vec<Condition>,
        observation: Option<&K::Observation>,
    ) -> Result<()> {
        let patch = status_patch(cr.conditions(), conditions, observation)?;
        api.patch_status(&cr.name_any(), &PatchParams::default(), &Patch::Merge(&patch))
            .await
            .context("cannot update status")?;
        Ok(())
    }

    async fn publish(&self, cr: &K, details: &ConnectionDetails) -> Result<()> {
        match &cr.resource_spec().write_connection_secret_to_ref {
            Some(reference) => {
                publish_connection_details(&self.client, reference, &cr.name_any(), details)
                    .await
                    .context("cannot publish connection details")
            }
            None => Ok(()),
        }
    }

    async fn apply(&self, api: &Api<K>, cr: &K, outcome: Outcome<K::Observation>) -> Result<Action> {
        match outcome {
            Outcome::Released => {
                if let Some(reference) = &cr.resource_spec().write_connection_secret_to_ref {
                    delete_connection_secret(&self.client, reference)
                        .await
                        .context("cannot delete connection secret")?;
                }
                self.remove_finalizer(api, cr).await?;
                self.reset_failures(&cr.name_any());
                info!("Released {}", cr.name_any());
                Ok(Action::await_change())
            }
            Outcome::Created(creation) => {
                self.set_external_name(api, cr, &creation.external_name).await?;
                self.publish(cr, &creation.connection_details).await?;
                self.patch_status(
                    api,
                    cr,
                    vec![Condition::creating(), Condition::reconcile_success()],
                    None,
                )
                .await?;
                info!("Created {} as {}", cr.name_any(), creation.external_name);
                Ok(Action::requeue(Duration::ZERO))
            }
            Outcome::Synced { observation, update } => {
                let mut details = observation.connection_details.clone();
                if let Some(update) = &update {
                    details.extend(update.connection_details.clone());
                    info!("Updated {}", cr.name_any());
                }
                self.publish(cr, &details).await?;

                let mut conditions = vec![Condition::available(), Condition::reconcile_success()];
                match &observation.diagnostic {
                    Some(message) => {
                        warn!("{} diverged: {}", cr.name_any(), message);
                        conditions.push(Condition::diverged(message.clone()));
                    }
                    None if cr.condition(condition_types::DIVERGED).is_some() => {
                        conditions.push(Condition::not_diverged());
                    }
                    None => {}
                }
                self.patch_status(api, cr, conditions, observation.observation.as_ref())
                    .await?;
                Ok(Action::requeue(self.config.poll_interval))
            }
        }
    }

    async fn reconcile_external(&self, api: &Api<K>, cr: &K) -> Result<Action> {
        if cr.meta().deletion_timestamp.is_some() {
            self.patch_status(api, cr, vec![Condition::deleting()], None)
                .await?;
        }

        let connection = self
            .connector
            .connect(cr.resource_spec())
            .await
            .context("cannot connect to Gitea")?;
        let outcome = drive(cr, &connection).await;
        ExternalClient::<K>::disconnect(&connection).await?;

        self.apply(api, cr, outcome?).await
    }
}

/// Merge patch for `status`, folding `updates` into the current conditions.
fn status_patch<O: serde::Serialize>(
    current: &[Condition],
    updates: Vec<Condition>,
    observation: Option<&O>,
) -> Result<serde_json::Value> {
    let now = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
    let mut conditions = current.to_vec();
    for condition in updates {
        set_condition(&mut conditions, condition, &now);
    }

    let mut status = serde_json::Map::new();
    status.insert("conditions".to_string(), serde_json::to_value(&conditions)?);
    if let Some(observation) = observation {
        status.insert("atProvider".to_string(), serde_json::to_value(observation)?);
    }
    Ok(json!({ "status": status }))
}

#[instrument(skip(cr, ctx), fields(kind = %K::kind(&()), name = %cr.name_any()))]
async fn reconcile<K>(cr: Arc<K>, ctx: Arc<ManagedReconciler<K>>) -> Result<Action>
where
    K: Managed,
    Connection: ExternalClient<K>,
{
    let name = cr.name_any();
    let api: Api<K> = Api::all(ctx.client.clone());
    let deleting = cr.meta().deletion_timestamp.is_some();
    let has_finalizer = cr.finalizers().iter().any(|f| f == FINALIZER);

    if deleting && !has_finalizer {
        ctx.reset_failures(&name);
        return Ok(Action::await_change());
    }
    if !has_finalizer {
        ctx.add_finalizer(&api, &cr).await?;
    }

    match ctx.reconcile_external(&api, &cr).await {
        Ok(action) => {
            ctx.reset_failures(&name);
            Ok(action)
        }
        Err(e) => {
            let status = ctx
                .patch_status(&api, &cr, vec![Condition::reconcile_error(e.to_string())], None)
                .await;
            if let Err(status_err) = status {
                warn!("Cannot record reconcile error on {}: {}", name, status_err);
            }
            Err(e)
        }
    }
}

fn error_policy<K>(cr: Arc<K>, error: &ProviderError, ctx: Arc<ManagedReconciler<K>>) -> Action
where
    K: Managed,
    Connection: ExternalClient<K>,
{
    let name = cr.name_any();
    if error.is_terminal() {
        error!("Reconciliation of {} needs attention: {}", name, error);
        return Action::requeue(ctx.config.terminal_error_requeue);
    }

    let backoff = ctx.record_failure(&name);
    warn!(
        "Reconciliation of {} failed, retrying in {:?}: {}",
        name, backoff, error
    );
    Action::requeue(backoff)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::common::{condition_types, reasons};
    use crate::crd::repository::{RepositoryParameters, RepositorySpec};
    use crate::crd::Repository;
    use crate::reconcilers::ExternalObservation;
    use crate::test_utils::{connection, gitea_client, with_external_name, MockGitea, MockService};
    use async_trait::async_trait;
    use http::Method;
    use kube::Resource;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;

    fn repository(name: &str) -> Repository {
        Repository::new(
            name,
            RepositorySpec {
                resource: Default::default(),
                for_provider: RepositoryParameters {
                    name: name.to_string(),
                    owner: Some("acme".to_string()),
                    ..Default::default()
                },
            },
        )
    }

    fn mark_deleted(mut cr: Repository) -> Repository {
        cr.meta_mut().deletion_timestamp = Some(Time(Utc::now()));
        cr
    }

    /// Records calls and answers with a fixed observation.
    struct Scripted {
        observation: ExternalObservation<crate::crd::repository::RepositoryObservation>,
        calls: Mutex<Vec<&'static str>>,
    }

    impl Scripted {
        fn new(exists: bool, up_to_date: bool) -> Self {
            let observation = if exists {
                ExternalObservation::present(Default::default(), up_to_date)
            } else {
                ExternalObservation::absent()
            };
            Self {
                observation,
                calls: Mutex::new(vec![]),
            }
        }

        fn calls(&self) -> Vec<&'static str> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ExternalClient<Repository> for Scripted {
        async fn observe(
            &self,
            _cr: &Repository,
        ) -> Result<ExternalObservation<crate::crd::repository::RepositoryObservation>> {
            self.calls.lock().unwrap().push("observe");
            Ok(self.observation.clone())
        }

        async fn create(&self, _cr: &Repository) -> Result<ExternalCreation> {
            self.calls.lock().unwrap().push("create");
            Ok(ExternalCreation::named("created"))
        }

        async fn update(&self, _cr: &Repository) -> Result<ExternalUpdate> {
            self.calls.lock().unwrap().push("update");
            Ok(ExternalUpdate::default())
        }

        async fn delete(&self, _cr: &Repository) -> Result<()> {
            self.calls.lock().unwrap().push("delete");
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_drive_creates_when_absent() {
        let external = Scripted::new(false, false);
        let outcome = drive(&repository("lib"), &external).await.unwrap();
        assert_eq!(outcome, Outcome::Created(ExternalCreation::named("created")));
        assert_eq!(external.calls(), vec!["observe", "create"]);
    }

    #[tokio::test]
    async fn test_drive_updates_on_drift() {
        let external = Scripted::new(true, false);
        let outcome = drive(&repository("lib"), &external).await.unwrap();
        assert!(matches!(outcome, Outcome::Synced { update: Some(_), .. }));
        assert_eq!(external.calls(), vec!["observe", "update"]);
    }

    #[tokio::test]
    async fn test_drive_noop_when_up_to_date() {
        let external = Scripted::new(true, true);
        let outcome = drive(&repository("lib"), &external).await.unwrap();
        assert!(matches!(outcome, Outcome::Synced { update: None, .. }));
        assert_eq!(external.calls(), vec!["observe"]);
    }

    #[tokio::test]
    async fn test_drive_deletes_existing() {
        let external = Scripted::new(true, true);
        let outcome = drive(&mark_deleted(repository("lib")), &external).await.unwrap();
        assert_eq!(outcome, Outcome::Released);
        assert_eq!(external.calls(), vec!["observe", "delete"]);
    }

    #[tokio::test]
    async fn test_drive_skips_delete_when_absent_or_orphaned() {
        let external = Scripted::new(false, false);
        let outcome = drive(&mark_deleted(repository("lib")), &external).await.unwrap();
        assert_eq!(outcome, Outcome::Released);
        assert_eq!(external.calls(), vec!["observe"]);

        let external = Scripted::new(true, true);
        let mut cr = repository("lib");
        cr.spec.resource.deletion_policy = DeletionPolicy::Orphan;
        let outcome = drive(&mark_deleted(cr), &external).await.unwrap();
        assert_eq!(outcome, Outcome::Released);
        assert_eq!(external.calls(), vec!["observe"]);
    }

    #[tokio::test]
    async fn test_drive_against_gitea_create_then_observe() {
        let mock = Arc::new(
            MockGitea::new()
                .on(Method::GET, "/user", 200, r#"{"id":1,"login":"root"}"#)
                .on(
                    Method::POST,
                    "/orgs/acme/repos",
                    201,
                    r#"{"id":123,"name":"acme-lib","full_name":"acme/acme-lib"}"#,
                )
                .on(
                    Method::GET,
                    "/repos/acme/acme-lib",
                    200,
                    r#"{"id":123,"name":"acme-lib","full_name":"acme/acme-lib","owner":{"login":"acme"}}"#,
                ),
        );
        let conn = connection(gitea_client(&mock));
        let cr = repository("acme-lib");

        let created = drive(&cr, &conn).await.unwrap();
        let Outcome::Created(creation) = created else {
            panic!("expected creation");
        };
        assert_eq!(creation.external_name, "acme-lib");

        let cr = with_external_name(cr, &creation.external_name);
        let Outcome::Synced { observation, update } = drive(&cr, &conn).await.unwrap() else {
            panic!("expected sync");
        };
        assert!(update.is_none());
        assert_eq!(observation.observation.unwrap().id, 123);
    }

    #[test]
    fn test_status_patch_keeps_other_conditions() {
        let current = vec![Condition {
            last_transition_time: Some("2026-01-01T00:00:00Z".to_string()),
            ..Condition::reconcile_success()
        }];
        let patch = status_patch::<()>(&current, vec![Condition::available()], None).unwrap();

        let conditions = patch["status"]["conditions"].as_array().unwrap();
        assert_eq!(conditions.len(), 2);
        assert_eq!(conditions[0]["type"], condition_types::SYNCED);
        assert_eq!(conditions[0]["lastTransitionTime"], "2026-01-01T00:00:00Z");
        assert_eq!(conditions[1]["reason"], reasons::AVAILABLE);
        assert!(patch["status"].get("atProvider").is_none());
    }

    #[test]
    fn test_status_patch_includes_observation() {
        let patch = status_patch(&[], vec![], Some(&json!({"id": 7}))).unwrap();
        assert_eq!(patch["status"]["atProvider"]["id"], 7);
    }

    fn reconciler() -> ManagedReconciler<Repository> {
        let client = MockService::new().into_client();
        let connector = Arc::new(crate::reconcilers::KubeConnector::new(client.clone()));
        ManagedReconciler::new(client, connector, Config::default())
    }

    #[tokio::test]
    async fn test_error_policy_backs_off_per_object() {
        let ctx = Arc::new(reconciler());
        let cr = Arc::new(repository("lib"));
        let transient = ProviderError::Transport("connection reset".to_string());

        let first = error_policy(cr.clone(), &transient, ctx.clone());
        let second = error_policy(cr.clone(), &transient, ctx.clone());
        assert_eq!(first, Action::requeue(Duration::from_secs(5)));
        assert_eq!(second, Action::requeue(Duration::from_secs(10)));

        let other = Arc::new(repository("other"));
        assert_eq!(
            error_policy(other, &transient, ctx.clone()),
            Action::requeue(Duration::from_secs(5))
        );

        ctx.reset_failures("lib");
        assert_eq!(
            error_policy(cr, &transient, ctx),
            Action::requeue(Duration::from_secs(5))
        );
    }

    #[tokio::test]
    async fn test_error_policy_terminal_errors_wait_long() {
        let ctx = Arc::new(reconciler());
        let cr = Arc::new(repository("lib"));
        let err = ProviderError::Credential("ProviderConfig default not found".to_string());

        assert_eq!(
            error_policy(cr, &err, ctx),
            Action::requeue(Duration::from_secs(600))
        );
    }

    #[tokio::test]
    async fn test_reconcile_skips_deleted_without_finalizer() {
        let mock = MockService::new();
        let client = mock.clone().into_client();
        let connector = Arc::new(crate::reconcilers::KubeConnector::new(client.clone()));
        let ctx = Arc::new(ManagedReconciler::<Repository>::new(client, connector, Config::default()));

        let action = reconcile(Arc::new(mark_deleted(repository("lib"))), ctx)
            .await
            .unwrap();
        assert_eq!(action, Action::await_change());
        assert!(mock.requests().is_empty());
    }

    #[tokio::test]
    async fn test_release_forgets_failures() {
        let cr = mark_deleted(repository("lib"));
        let mock = MockService::new().on_patch(
            "/apis/gitea.crossplane.io/v1alpha1/repositories/lib",
            200,
            &serde_json::to_string(&cr).unwrap(),
        );
        let client = mock.clone().into_client();
        let connector = Arc::new(crate::reconcilers::KubeConnector::new(client.clone()));
        let ctx = Arc::new(ManagedReconciler::<Repository>::new(
            client.clone(),
            connector,
            Config::default(),
        ));
        let transient = ProviderError::Transport("connection reset".to_string());
        error_policy(Arc::new(cr.clone()), &transient, ctx.clone());
        error_policy(Arc::new(cr.clone()), &transient, ctx.clone());

        let api: Api<Repository> = Api::all(client);
        let action = ctx.apply(&api, &cr, Outcome::Released).await.unwrap();
        assert_eq!(action, Action::await_change());
        assert_eq!(
            mock.requests(),
            vec!["PATCH /apis/gitea.crossplane.io/v1alpha1/repositories/lib".to_string()]
        );
        assert_eq!(
            error_policy(Arc::new(cr), &transient, ctx),
            Action::requeue(Duration::from_secs(5))
        );
    }

    #[tokio::test]
    async fn test_skipped_deletion_forgets_failures() {
        let ctx = Arc::new(reconciler());
        let cr = Arc::new(mark_deleted(repository("lib")));
        let transient = ProviderError::Transport("connection reset".to_string());
        error_policy(cr.clone(), &transient, ctx.clone());

        reconcile(cr.clone(), ctx.clone()).await.unwrap();
        assert_eq!(
            error_policy(cr, &transient, ctx),
            Action::requeue(Duration::from_secs(5))
        );
    }
}
