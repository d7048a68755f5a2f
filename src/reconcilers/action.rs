// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

use super::{Connection, ExternalClient, ExternalCreation, ExternalObservation, ExternalUpdate};
use crate::crd::actions::{Action, ActionObservation};
use crate::crd::Managed;
use crate::error::{ignore_not_found, Result, ResultExt};
use crate::external_name::{decode_repo_name, encode_repo_name};
use crate::gitea::types::{ActionWorkflow, CreateWorkflowOption, EditWorkflowOption};
use async_trait::async_trait;
use tracing::{debug, warn};

fn observation(workflow: &ActionWorkflow) -> ActionObservation {
    ActionObservation {
        id: workflow.id.clone(),
        name: workflow.name.clone(),
        path: workflow.path.clone(),
        state: workflow.state.clone(),
        html_url: workflow.html_url.clone(),
        updated_at: workflow.updated_at.clone(),
    }
}

fn content_differs(desired: &str, observed: &str) -> bool {
    desired.trim() != observed.trim()
}

fn enabled_differs(desired: Option<bool>, workflow: &ActionWorkflow) -> bool {
    desired.is_some_and(|enabled| enabled != workflow.is_enabled())
}

/// Falls back to the spec so a lost annotation does not orphan the file.
fn location(cr: &Action) -> (String, String, String) {
    cr.external_name().and_then(decode_repo_name).unwrap_or_else(|| {
        let p = &cr.spec.for_provider;
        (p.owner.clone(), p.repository.clone(), p.workflow_name.clone())
    })
}

#[async_trait]
impl ExternalClient<Action> for Connection {
    async fn observe(&self, cr: &Action) -> Result<ExternalObservation<ActionObservation>> {
        let Some((owner, repo, name)) = cr.external_name().and_then(decode_repo_name) else {
            return Ok(ExternalObservation::absent());
        };

        let workflow = ignore_not_found(self.gitea.get_workflow(&owner, &repo, &name).await)
            .context("cannot get workflow")?;
        let Some(workflow) = workflow else {
            return Ok(ExternalObservation::absent());
        };

        let p = &cr.spec.for_provider;
        let up_to_date =
            !content_differs(&p.content, &workflow.content) && !enabled_differs(p.enabled, &workflow);
        Ok(ExternalObservation::present(observation(&workflow), up_to_date))
    }

    async fn create(&self, cr: &Action) -> Result<ExternalCreation> {
        let p = &cr.spec.for_provider;
        self.gitea
            .create_workflow(
                &p.owner,
                &p.repository,
                &CreateWorkflowOption {
                    name: p.workflow_name.clone(),
                    content: p.content.clone(),
                },
            )
            .await
            .context("cannot create workflow")?;

        let name = encode_repo_name(&p.owner, &p.repository, &p.workflow_name);
        if p.enabled == Some(false) {
            // Observe reports the enabled drift, so Update retries this.
            if let Err(e) = self
                .gitea
                .set_workflow_enabled(&p.owner, &p.repository, &p.workflow_name, false)
                .await
            {
                warn!("Workflow {} created but not disabled: {}", name, e);
            }
        }
        Ok(ExternalCreation::named(name))
    }

    async fn update(&self, cr: &Action) -> Result<ExternalUpdate> {
        let p = &cr.spec.for_provider;
        let (owner, repo, name) = location(cr);

        let workflow = self
            .gitea
            .update_workflow(
                &owner,
                &repo,
                &name,
                &EditWorkflowOption {
                    content: p.content.clone(),
                },
            )
            .await
            .context("cannot update workflow")?;

        if let Some(enabled) = p.enabled.filter(|_| enabled_differs(p.enabled, &workflow)) {
            debug!("Setting workflow {} enabled={}", name, enabled);
            self.gitea
                .set_workflow_enabled(&owner, &repo, &name, enabled)
                .await
                .context("cannot toggle workflow")?;
        }
        Ok(ExternalUpdate::default())
    }

    async fn delete(&self, cr: &Action) -> Result<()> {
        let Some((owner, repo, name)) = cr.external_name().and_then(decode_repo_name) else {
            return Ok(());
        };
        ignore_not_found(self.gitea.delete_workflow(&owner, &repo, &name).await)
            .context("cannot delete workflow")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::actions::{ActionParameters, ActionSpec};
    use crate::test_utils::{connection, gitea_client, with_external_name, MockGitea};
    use http::Method;
    use std::sync::Arc;

    const WORKFLOW: &str = "/repos/acme/lib/actions/workflows/ci.yaml";

    fn action(enabled: Option<bool>) -> Action {
        Action::new(
            "lib-ci",
            ActionSpec {
                resource: Default::default(),
                for_provider: ActionParameters {
                    owner: "acme".to_string(),
                    repository: "lib".to_string(),
                    workflow_name: "ci.yaml".to_string(),
                    content: "on: push\n".to_string(),
                    enabled,
                },
            },
        )
    }

    fn workflow_json(content: &str, state: &str) -> String {
        serde_json::json!({
            "id": "ci.yaml",
            "name": "ci.yaml",
            "path": ".gitea/workflows/ci.yaml",
            "state": state,
            "content": content,
        })
        .to_string()
    }

    #[tokio::test]
    async fn test_create_disabled_workflow() {
        let mock = Arc::new(
            MockGitea::new()
                .on(
                    Method::POST,
                    "/repos/acme/lib/actions/workflows",
                    201,
                    &workflow_json("on: push\n", "active"),
                )
                .on(Method::PUT, &format!("{}/disable", WORKFLOW), 204, ""),
        );
        let conn = connection(gitea_client(&mock));

        let creation = conn.create(&action(Some(false))).await.unwrap();
        assert_eq!(creation.external_name, "acme/lib/ci.yaml");
        assert_eq!(
            mock.paths(),
            vec![
                "POST /repos/acme/lib/actions/workflows".to_string(),
                format!("PUT {}/disable", WORKFLOW)
            ]
        );
    }

    #[tokio::test]
    async fn test_create_is_named_when_disable_fails() {
        let mock = Arc::new(
            MockGitea::new()
                .on(
                    Method::POST,
                    "/repos/acme/lib/actions/workflows",
                    201,
                    &workflow_json("on: push\n", "active"),
                )
                .on(Method::PUT, &format!("{}/disable", WORKFLOW), 500, "boom")
                .on(Method::GET, WORKFLOW, 200, &workflow_json("on: push\n", "active")),
        );
        let conn = connection(gitea_client(&mock));

        let creation = conn.create(&action(Some(false))).await.unwrap();
        assert_eq!(creation.external_name, "acme/lib/ci.yaml");

        let cr = with_external_name(action(Some(false)), &creation.external_name);
        let obs = conn.observe(&cr).await.unwrap();
        assert!(obs.resource_exists);
        assert!(!obs.resource_up_to_date);
    }

    #[tokio::test]
    async fn test_observe_ignores_trailing_whitespace() {
        let mock = Arc::new(MockGitea::new().on(
            Method::GET,
            WORKFLOW,
            200,
            &workflow_json("on: push", "active"),
        ));
        let conn = connection(gitea_client(&mock));
        let cr = with_external_name(action(Some(true)), "acme/lib/ci.yaml");

        let obs = conn.observe(&cr).await.unwrap();
        assert!(obs.resource_exists);
        assert!(obs.resource_up_to_date);
        assert_eq!(obs.observation.unwrap().path, ".gitea/workflows/ci.yaml");
    }

    #[tokio::test]
    async fn test_enabled_drift_toggles() {
        let mock = Arc::new(
            MockGitea::new()
                .on(Method::GET, WORKFLOW, 200, &workflow_json("on: push\n", "disabled_manually"))
                .on(Method::PATCH, WORKFLOW, 200, &workflow_json("on: push\n", "disabled_manually"))
                .on(Method::PUT, &format!("{}/enable", WORKFLOW), 204, ""),
        );
        let conn = connection(gitea_client(&mock));
        let cr = with_external_name(action(Some(true)), "acme/lib/ci.yaml");

        assert!(!conn.observe(&cr).await.unwrap().resource_up_to_date);
        conn.update(&cr).await.unwrap();
        assert_eq!(
            mock.paths().last().unwrap(),
            &format!("PUT {}/enable", WORKFLOW)
        );
    }

    #[tokio::test]
    async fn test_missing_workflow_is_absent() {
        let mock = Arc::new(MockGitea::new());
        let conn = connection(gitea_client(&mock));
        let cr = with_external_name(action(None), "acme/lib/ci.yaml");

        assert!(!conn.observe(&cr).await.unwrap().resource_exists);
        conn.delete(&cr).await.unwrap();
    }
}
