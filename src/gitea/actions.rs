// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Gitea Actions: secrets, workflows and runners.

use crate::error::Result;
use crate::gitea::client::{escape, repo_path, GiteaClient, RunnerScope};
use crate::gitea::types::*;

impl GiteaClient {
    pub async fn get_repo_secret(&self, owner: &str, repo: &str, name: &str) -> Result<ActionSecret> {
        self.get(&format!(
            "{}/actions/secrets/{}",
            repo_path(owner, repo),
            escape(name)
        ))
        .await
    }

    /// Creates or overwrites; the value is write-only.
    pub async fn put_repo_secret(
        &self,
        owner: &str,
        repo: &str,
        name: &str,
        opt: &CreateOrUpdateSecretOption,
    ) -> Result<()> {
        self.put_empty(
            &format!("{}/actions/secrets/{}", repo_path(owner, repo), escape(name)),
            Some(opt),
        )
        .await
    }

    pub async fn delete_repo_secret(&self, owner: &str, repo: &str, name: &str) -> Result<()> {
        self.delete(&format!(
            "{}/actions/secrets/{}",
            repo_path(owner, repo),
            escape(name)
        ))
        .await
    }

    /// Creates or overwrites. Gitea answers 405 to GET on this path.
    pub async fn put_org_secret(&self, org: &str, name: &str, opt: &CreateOrUpdateSecretOption) -> Result<()> {
        self.put_empty(
            &format!("/orgs/{}/actions/secrets/{}", escape(org), escape(name)),
            Some(opt),
        )
        .await
    }

    pub async fn delete_org_secret(&self, org: &str, name: &str) -> Result<()> {
        self.delete(&format!(
            "/orgs/{}/actions/secrets/{}",
            escape(org),
            escape(name)
        ))
        .await
    }

    pub async fn get_workflow(&self, owner: &str, repo: &str, name: &str) -> Result<ActionWorkflow> {
        self.get(&format!(
            "{}/actions/workflows/{}",
            repo_path(owner, repo),
            escape(name)
        ))
        .await
    }

    pub async fn create_workflow(
        &self,
        owner: &str,
        repo: &str,
        opt: &CreateWorkflowOption,
    ) -> Result<ActionWorkflow> {
        self.post(&format!("{}/actions/workflows", repo_path(owner, repo)), opt)
            .await
    }

    pub async fn update_workflow(
        &self,
        owner: &str,
        repo: &str,
        name: &str,
        opt: &EditWorkflowOption,
    ) -> Result<ActionWorkflow> {
        self.patch(
            &format!("{}/actions/workflows/{}", repo_path(owner, repo), escape(name)),
            opt,
        )
        .await
    }

    pub async fn delete_workflow(&self, owner: &str, repo: &str, name: &str) -> Result<()> {
        self.delete(&format!(
            "{}/actions/workflows/{}",
            repo_path(owner, repo),
            escape(name)
        ))
        .await
    }

    pub async fn set_workflow_enabled(&self, owner: &str, repo: &str, name: &str, enabled: bool) -> Result<()> {
        let action = if enabled { "enable" } else { "disable" };
        self.put_empty::<()>(
            &format!(
                "{}/actions/workflows/{}/{}",
                repo_path(owner, repo),
                escape(name),
                action
            ),
            None,
        )
        .await
    }

    pub async fn get_runner(&self, scope: &RunnerScope, id: i64) -> Result<ActionRunner> {
        self.get(&format!("{}/{}", scope.runners_path(), id)).await
    }

    pub async fn create_runner(&self, scope: &RunnerScope, opt: &CreateRunnerOption) -> Result<ActionRunner> {
        self.post(&scope.runners_path(), opt).await
    }

    pub async fn update_runner(
        &self,
        scope: &RunnerScope,
        id: i64,
        opt: &EditRunnerOption,
    ) -> Result<ActionRunner> {
        self.patch(&format!("{}/{}", scope.runners_path(), id), opt).await
    }

    pub async fn delete_runner(&self, scope: &RunnerScope, id: i64) -> Result<()> {
        self.delete(&format!("{}/{}", scope.runners_path(), id)).await
    }
}
