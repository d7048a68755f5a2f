// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Repository-scoped operations.

use crate::error::Result;
use crate::gitea::client::{escape, repo_path, GiteaClient};
use crate::gitea::types::*;

impl GiteaClient {
    pub async fn get_repository(&self, owner: &str, name: &str) -> Result<Repository> {
        self.get(&repo_path(owner, name)).await
    }

    /// Creates a repository for the token owner.
    pub async fn create_user_repository(&self, opt: &CreateRepoOption) -> Result<Repository> {
        self.post("/user/repos", opt).await
    }

    pub async fn create_org_repository(&self, org: &str, opt: &CreateRepoOption) -> Result<Repository> {
        self.post(&format!("/orgs/{}/repos", escape(org)), opt).await
    }

    pub async fn update_repository(
        &self,
        owner: &str,
        name: &str,
        opt: &EditRepoOption,
    ) -> Result<Repository> {
        self.patch(&repo_path(owner, name), opt).await
    }

    pub async fn delete_repository(&self, owner: &str, name: &str) -> Result<()> {
        self.delete(&repo_path(owner, name)).await
    }

    pub async fn get_label(&self, owner: &str, repo: &str, id: i64) -> Result<Label> {
        self.get(&format!("{}/labels/{}", repo_path(owner, repo), id)).await
    }

    pub async fn create_label(&self, owner: &str, repo: &str, opt: &CreateLabelOption) -> Result<Label> {
        self.post(&format!("{}/labels", repo_path(owner, repo)), opt).await
    }

    pub async fn update_label(
        &self,
        owner: &str,
        repo: &str,
        id: i64,
        opt: &EditLabelOption,
    ) -> Result<Label> {
        self.patch(&format!("{}/labels/{}", repo_path(owner, repo), id), opt)
            .await
    }

    pub async fn delete_label(&self, owner: &str, repo: &str, id: i64) -> Result<()> {
        self.delete(&format!("{}/labels/{}", repo_path(owner, repo), id)).await
    }

    pub async fn get_repo_hook(&self, owner: &str, repo: &str, id: i64) -> Result<Hook> {
        self.get(&format!("{}/hooks/{}", repo_path(owner, repo), id)).await
    }

    pub async fn create_repo_hook(&self, owner: &str, repo: &str, opt: &CreateHookOption) -> Result<Hook> {
        self.post(&format!("{}/hooks", repo_path(owner, repo)), opt).await
    }

    pub async fn update_repo_hook(
        &self,
        owner: &str,
        repo: &str,
        id: i64,
        opt: &EditHookOption,
    ) -> Result<Hook> {
        self.patch(&format!("{}/hooks/{}", repo_path(owner, repo), id), opt)
            .await
    }

    pub async fn delete_repo_hook(&self, owner: &str, repo: &str, id: i64) -> Result<()> {
        self.delete(&format!("{}/hooks/{}", repo_path(owner, repo), id)).await
    }

    pub async fn get_deploy_key(&self, owner: &str, repo: &str, id: i64) -> Result<PublicKey> {
        self.get(&format!("{}/keys/{}", repo_path(owner, repo), id)).await
    }

    pub async fn create_deploy_key(&self, owner: &str, repo: &str, opt: &CreateKeyOption) -> Result<PublicKey> {
        self.post(&format!("{}/keys", repo_path(owner, repo)), opt).await
    }

    /// Only the title can change; key material is immutable.
    pub async fn update_deploy_key(
        &self,
        owner: &str,
        repo: &str,
        id: i64,
        opt: &EditKeyOption,
    ) -> Result<PublicKey> {
        self.patch(&format!("{}/keys/{}", repo_path(owner, repo), id), opt)
            .await
    }

    pub async fn delete_deploy_key(&self, owner: &str, repo: &str, id: i64) -> Result<()> {
        self.delete(&format!("{}/keys/{}", repo_path(owner, repo), id)).await
    }

    /// Succeeds when the user is a collaborator (204), 404 otherwise.
    pub async fn is_collaborator(&self, owner: &str, repo: &str, user: &str) -> Result<()> {
        self.check(&format!(
            "{}/collaborators/{}",
            repo_path(owner, repo),
            escape(user)
        ))
        .await
    }

    pub async fn get_collaborator_permission(
        &self,
        owner: &str,
        repo: &str,
        user: &str,
    ) -> Result<CollaboratorPermission> {
        self.get(&format!(
            "{}/collaborators/{}/permission",
            repo_path(owner, repo),
            escape(user)
        ))
        .await
    }

    /// Adds the collaborator or changes its permission.
    pub async fn add_collaborator(
        &self,
        owner: &str,
        repo: &str,
        user: &str,
        opt: &AddCollaboratorOption,
    ) -> Result<()> {
        self.put_empty(
            &format!("{}/collaborators/{}", repo_path(owner, repo), escape(user)),
            Some(opt),
        )
        .await
    }

    pub async fn delete_collaborator(&self, owner: &str, repo: &str, user: &str) -> Result<()> {
        self.delete(&format!(
            "{}/collaborators/{}",
            repo_path(owner, repo),
            escape(user)
        ))
        .await
    }

    pub async fn get_branch_protection(&self, owner: &str, repo: &str, name: &str) -> Result<BranchProtection> {
        self.get(&format!(
            "{}/branch_protections/{}",
            repo_path(owner, repo),
            escape(name)
        ))
        .await
    }

    pub async fn create_branch_protection(
        &self,
        owner: &str,
        repo: &str,
        opt: &BranchProtectionOption,
    ) -> Result<BranchProtection> {
        self.post(&format!("{}/branch_protections", repo_path(owner, repo)), opt)
            .await
    }

    pub async fn update_branch_protection(
        &self,
        owner: &str,
        repo: &str,
        name: &str,
        opt: &BranchProtectionOption,
    ) -> Result<BranchProtection> {
        self.patch(
            &format!("{}/branch_protections/{}", repo_path(owner, repo), escape(name)),
            opt,
        )
        .await
    }

    pub async fn delete_branch_protection(&self, owner: &str, repo: &str, name: &str) -> Result<()> {
        self.delete(&format!(
            "{}/branch_protections/{}",
            repo_path(owner, repo),
            escape(name)
        ))
        .await
    }

    pub async fn get_git_hook(&self, owner: &str, repo: &str, name: &str) -> Result<GitHook> {
        self.get(&format!("{}/hooks/git/{}", repo_path(owner, repo), escape(name)))
            .await
    }

    /// Git hooks always exist server-side; editing sets their content.
    pub async fn edit_git_hook(
        &self,
        owner: &str,
        repo: &str,
        name: &str,
        opt: &EditGitHookOption,
    ) -> Result<GitHook> {
        self.patch(
            &format!("{}/hooks/git/{}", repo_path(owner, repo), escape(name)),
            opt,
        )
        .await
    }

    /// Clears the hook content.
    pub async fn delete_git_hook(&self, owner: &str, repo: &str, name: &str) -> Result<()> {
        self.delete(&format!("{}/hooks/git/{}", repo_path(owner, repo), escape(name)))
            .await
    }

    pub async fn get_issue(&self, owner: &str, repo: &str, number: i64) -> Result<Issue> {
        self.get(&format!("{}/issues/{}", repo_path(owner, repo), number))
            .await
    }

    pub async fn create_issue(&self, owner: &str, repo: &str, opt: &CreateIssueOption) -> Result<Issue> {
        self.post(&format!("{}/issues", repo_path(owner, repo)), opt).await
    }

    pub async fn update_issue(
        &self,
        owner: &str,
        repo: &str,
        number: i64,
        opt: &EditIssueOption,
    ) -> Result<Issue> {
        self.patch(&format!("{}/issues/{}", repo_path(owner, repo), number), opt)
            .await
    }

    /// Replaces every label on an issue or pull request.
    pub async fn replace_issue_labels(
        &self,
        owner: &str,
        repo: &str,
        number: i64,
        opt: &IssueLabelsOption,
    ) -> Result<()> {
        self.put_empty(
            &format!("{}/issues/{}/labels", repo_path(owner, repo), number),
            Some(opt),
        )
        .await
    }

    pub async fn get_pull_request(&self, owner: &str, repo: &str, number: i64) -> Result<PullRequest> {
        self.get(&format!("{}/pulls/{}", repo_path(owner, repo), number))
            .await
    }

    pub async fn create_pull_request(
        &self,
        owner: &str,
        repo: &str,
        opt: &CreatePullRequestOption,
    ) -> Result<PullRequest> {
        self.post(&format!("{}/pulls", repo_path(owner, repo)), opt).await
    }

    pub async fn update_pull_request(
        &self,
        owner: &str,
        repo: &str,
        number: i64,
        opt: &EditPullRequestOption,
    ) -> Result<PullRequest> {
        self.patch(&format!("{}/pulls/{}", repo_path(owner, repo), number), opt)
            .await
    }

    pub async fn merge_pull_request(
        &self,
        owner: &str,
        repo: &str,
        number: i64,
        opt: &MergePullRequestOption,
    ) -> Result<()> {
        self.post_empty(
            &format!("{}/pulls/{}/merge", repo_path(owner, repo), number),
            opt,
        )
        .await
    }

    pub async fn get_release(&self, owner: &str, repo: &str, id: i64) -> Result<Release> {
        self.get(&format!("{}/releases/{}", repo_path(owner, repo), id))
            .await
    }

    pub async fn get_release_by_tag(&self, owner: &str, repo: &str, tag: &str) -> Result<Release> {
        self.get(&format!(
            "{}/releases/tags/{}",
            repo_path(owner, repo),
            escape(tag)
        ))
        .await
    }

    pub async fn create_release(&self, owner: &str, repo: &str, opt: &CreateReleaseOption) -> Result<Release> {
        self.post(&format!("{}/releases", repo_path(owner, repo)), opt).await
    }

    pub async fn update_release(
        &self,
        owner: &str,
        repo: &str,
        id: i64,
        opt: &EditReleaseOption,
    ) -> Result<Release> {
        self.patch(&format!("{}/releases/{}", repo_path(owner, repo), id), opt)
            .await
    }

    pub async fn delete_release(&self, owner: &str, repo: &str, id: i64) -> Result<()> {
        self.delete(&format!("{}/releases/{}", repo_path(owner, repo), id))
            .await
    }
}
