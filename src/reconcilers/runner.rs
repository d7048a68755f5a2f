// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

use super::{differs, Connection, ExternalClient, ExternalCreation, ExternalObservation, ExternalUpdate};
use crate::crd::actions::{Runner, RunnerObservation, RunnerParameters};
use crate::crd::Managed;
use crate::error::{ignore_not_found, ProviderError, Result, ResultExt};
use crate::external_name::{decode_runner, encode_runner};
use crate::gitea::types::{ActionRunner, CreateRunnerOption, EditRunnerOption};
use crate::gitea::RunnerScope;
use async_trait::async_trait;

/// Scope and runner id from the external name. Unparseable names count as unset.
fn locate(cr: &Runner) -> Option<(RunnerScope, i64)> {
    let (scope, value, id) = cr.external_name().and_then(decode_runner)?;
    let scope = RunnerScope::parse(&scope, &value).ok()?;
    Some((scope, id))
}

fn observation(runner: &ActionRunner) -> RunnerObservation {
    RunnerObservation {
        id: runner.id,
        name: runner.name.clone(),
        description: runner.description.clone(),
        status: runner.status.clone(),
        busy: runner.busy,
        version: runner.version.clone(),
        labels: runner.label_names(),
    }
}

fn sorted(labels: &[String]) -> Vec<String> {
    let mut labels = labels.to_vec();
    labels.sort();
    labels
}

fn is_up_to_date(p: &RunnerParameters, runner: &ActionRunner) -> bool {
    let labels_differ = p
        .labels
        .as_ref()
        .is_some_and(|labels| sorted(labels) != sorted(&runner.label_names()));
    !(p.name != runner.name || differs(p.description.as_deref(), &runner.description) || labels_differ)
}

#[async_trait]
impl ExternalClient<Runner> for Connection {
    async fn observe(&self, cr: &Runner) -> Result<ExternalObservation<RunnerObservation>> {
        let Some((scope, id)) = locate(cr) else {
            return Ok(ExternalObservation::absent());
        };

        let runner = ignore_not_found(self.gitea.get_runner(&scope, id).await).context("cannot get runner")?;
        Ok(match runner {
            Some(runner) => {
                ExternalObservation::present(observation(&runner), is_up_to_date(&cr.spec.for_provider, &runner))
            }
            None => ExternalObservation::absent(),
        })
    }

    async fn create(&self, cr: &Runner) -> Result<ExternalCreation> {
        let p = &cr.spec.for_provider;
        let scope = RunnerScope::parse(&p.scope, &p.scope_value)?;
        let runner = self
            .gitea
            .create_runner(
                &scope,
                &CreateRunnerOption {
                    name: p.name.clone(),
                    description: p.description.clone(),
                    labels: p.labels.clone(),
                },
            )
            .await
            .context("cannot create runner")?;
        Ok(ExternalCreation::named(encode_runner(
            scope.name(),
            &scope.value(),
            runner.id,
        )))
    }

    async fn update(&self, cr: &Runner) -> Result<ExternalUpdate> {
        let (scope, id) = locate(cr)
            .ok_or_else(|| ProviderError::Validation("runner has no valid external name".to_string()))?;
        let p = &cr.spec.for_provider;
        self.gitea
            .update_runner(
                &scope,
                id,
                &EditRunnerOption {
                    name: Some(p.name.clone()),
                    description: p.description.clone(),
                    labels: p.labels.clone(),
                },
            )
            .await
            .context("cannot update runner")?;
        Ok(ExternalUpdate::default())
    }

    async fn delete(&self, cr: &Runner) -> Result<()> {
        let Some((scope, id)) = locate(cr) else {
            return Ok(());
        };
        ignore_not_found(self.gitea.delete_runner(&scope, id).await).context("cannot delete runner")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::actions::RunnerSpec;
    use crate::test_utils::{connection, gitea_client, with_external_name, MockGitea};
    use http::Method;
    use std::sync::Arc;

    const RUNNER_JSON: &str = r#"{"id":7,"name":"builder","description":"","status":"idle","labels":[{"id":1,"name":"ubuntu","type":"custom"},{"id":2,"name":"x64","type":"custom"}]}"#;

    fn runner(scope: &str, scope_value: &str, labels: &[&str]) -> Runner {
        Runner::new(
            "builder",
            RunnerSpec {
                resource: Default::default(),
                for_provider: RunnerParameters {
                    scope: scope.to_string(),
                    scope_value: scope_value.to_string(),
                    name: "builder".to_string(),
                    description: None,
                    labels: Some(labels.iter().map(|l| l.to_string()).collect()),
                },
            },
        )
    }

    #[tokio::test]
    async fn test_create_org_runner_then_observe() {
        let mock = Arc::new(
            MockGitea::new()
                .on(Method::POST, "/orgs/acme/actions/runners", 201, RUNNER_JSON)
                .on(Method::GET, "/orgs/acme/actions/runners/7", 200, RUNNER_JSON),
        );
        let conn = connection(gitea_client(&mock));

        let creation = conn
            .create(&runner("organization", "acme", &["ubuntu", "x64"]))
            .await
            .unwrap();
        assert_eq!(creation.external_name, "organization:acme:7");

        let cr = with_external_name(
            runner("organization", "acme", &["x64", "ubuntu"]),
            &creation.external_name,
        );
        let obs = conn.observe(&cr).await.unwrap();
        assert!(obs.resource_exists);
        assert!(obs.resource_up_to_date);
        assert_eq!(obs.observation.unwrap().status, "idle");
        assert_eq!(
            mock.paths(),
            vec![
                "POST /orgs/acme/actions/runners",
                "GET /orgs/acme/actions/runners/7"
            ]
        );
    }

    #[tokio::test]
    async fn test_label_drift() {
        let mock = Arc::new(
            MockGitea::new()
                .on(Method::GET, "/admin/actions/runners/7", 200, RUNNER_JSON)
                .on(Method::PATCH, "/admin/actions/runners/7", 200, RUNNER_JSON),
        );
        let conn = connection(gitea_client(&mock));
        let cr = with_external_name(runner("system", "", &["ubuntu"]), "system::7");

        assert!(!conn.observe(&cr).await.unwrap().resource_up_to_date);
        conn.update(&cr).await.unwrap();
        assert_eq!(
            mock.last_body(Method::PATCH, "/admin/actions/runners/7").unwrap(),
            serde_json::json!({"name": "builder", "labels": ["ubuntu"]})
        );
    }

    #[tokio::test]
    async fn test_invalid_scope_is_rejected() {
        let mock = Arc::new(MockGitea::new());
        let conn = connection(gitea_client(&mock));

        let err = conn.create(&runner("organization", "", &[])).await.unwrap_err();
        assert!(err.is_terminal());
        assert!(mock.requests().is_empty());
    }
}
