// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

use super::issue::{due_date_differs, label_ids, logins, milestone_differs, STATE_CLOSED};
use super::{differs, Connection, ExternalClient, ExternalCreation, ExternalObservation, ExternalUpdate};
use crate::crd::issue::{PullRequest, PullRequestObservation, PullRequestParameters};
use crate::crd::Managed;
use crate::error::{ignore_not_found, ProviderError, Result, ResultExt};
use crate::external_name::{decode_id, encode_id};
use crate::gitea::types::{self, CreatePullRequestOption, EditPullRequestOption, MergePullRequestOption};
use async_trait::async_trait;
use tracing::info;

const STATE_OPEN: &str = "open";

fn branch(info: &Option<types::PrBranchInfo>) -> String {
    info.as_ref().map(|b| b.git_ref.clone()).unwrap_or_default()
}

fn observation(pr: &types::PullRequest) -> PullRequestObservation {
    PullRequestObservation {
        id: pr.id,
        number: pr.number,
        title: pr.title.clone(),
        body: pr.body.clone(),
        state: pr.state.clone(),
        html_url: pr.html_url.clone(),
        head: branch(&pr.head),
        base: branch(&pr.base),
        assignees: logins(&pr.assignees),
        labels: label_ids(&pr.labels),
        milestone: pr.milestone.as_ref().map(|m| m.id),
        mergeable: pr.mergeable,
        merged: pr.merged,
        merged_at: pr.merged_at.clone(),
        merge_commit_sha: pr.merge_commit_sha.clone(),
        due_date: pr.due_date.clone(),
    }
}

/// A requested merge is pending while the pull request is open and unmerged.
fn merge_pending(p: &PullRequestParameters, pr: &types::PullRequest) -> bool {
    p.merge.is_some() && pr.state == STATE_OPEN && !pr.merged && p.state.as_deref() != Some(STATE_CLOSED)
}

fn is_up_to_date(p: &PullRequestParameters, pr: &types::PullRequest) -> bool {
    !(p.title != pr.title
        || p.base != branch(&pr.base)
        || differs(p.body.as_deref(), pr.body.as_str())
        || (!pr.merged && differs(p.state.as_deref(), pr.state.as_str()))
        || differs(p.assignees.as_ref(), &logins(&pr.assignees))
        || differs(p.labels.as_ref(), &label_ids(&pr.labels))
        || milestone_differs(p.milestone, pr.milestone.as_ref())
        || due_date_differs(p.due_date.as_deref(), pr.due_date.as_deref())
        || merge_pending(p, pr))
}

#[async_trait]
impl ExternalClient<PullRequest> for Connection {
    async fn observe(&self, cr: &PullRequest) -> Result<ExternalObservation<PullRequestObservation>> {
        let Some(number) = cr.external_name().and_then(decode_id) else {
            return Ok(ExternalObservation::absent());
        };
        let p = &cr.spec.for_provider;

        let pr = ignore_not_found(
            self.gitea
                .get_pull_request(&p.owner, &p.repository, number)
                .await,
        )
        .context("cannot get pull request")?;
        let Some(pr) = pr else {
            return Ok(ExternalObservation::absent());
        };

        Ok(ExternalObservation::present(observation(&pr), is_up_to_date(p, &pr)))
    }

    async fn create(&self, cr: &PullRequest) -> Result<ExternalCreation> {
        let p = &cr.spec.for_provider;
        let opt = CreatePullRequestOption {
            head: p.head.clone(),
            base: p.base.clone(),
            title: p.title.clone(),
            body: p.body.clone(),
            assignees: p.assignees.clone(),
            labels: p.labels.clone(),
            milestone: p.milestone,
            due_date: p.due_date.clone(),
        };

        let pr = self
            .gitea
            .create_pull_request(&p.owner, &p.repository, &opt)
            .await
            .context("cannot create pull request")?;
        Ok(ExternalCreation::named(encode_id(pr.number)))
    }

    async fn update(&self, cr: &PullRequest) -> Result<ExternalUpdate> {
        let number = cr.external_name().and_then(decode_id).ok_or_else(|| {
            ProviderError::Validation("pull request has no valid external name".to_string())
        })?;
        let p = &cr.spec.for_provider;
        let opt = EditPullRequestOption {
            title: Some(p.title.clone()),
            body: p.body.clone(),
            base: Some(p.base.clone()),
            assignees: p.assignees.clone(),
            labels: p.labels.clone(),
            milestone: p.milestone,
            state: p.state.clone(),
            due_date: p.due_date.clone(),
        };

        let pr = self
            .gitea
            .update_pull_request(&p.owner, &p.repository, number, &opt)
            .await
            .context("cannot update pull request")?;

        if let Some(merge) = p.merge.as_ref().filter(|_| merge_pending(p, &pr)) {
            info!("Merging pull request {}/{}#{}", p.owner, p.repository, number);
            let opt = MergePullRequestOption {
                style: merge.style.clone(),
                title: merge.title.clone(),
                message: merge.message.clone(),
                delete_branch_after_merge: merge.delete_branch_after_merge,
            };
            self.gitea
                .merge_pull_request(&p.owner, &p.repository, number, &opt)
                .await
                .context("cannot merge pull request")?;
        }
        Ok(ExternalUpdate::default())
    }

    /// Closes the pull request.
    async fn delete(&self, cr: &PullRequest) -> Result<()> {
        let Some(number) = cr.external_name().and_then(decode_id) else {
            return Ok(());
        };
        let p = &cr.spec.for_provider;
        let opt = EditPullRequestOption {
            state: Some(STATE_CLOSED.to_string()),
            ..Default::default()
        };
        ignore_not_found(
            self.gitea
                .update_pull_request(&p.owner, &p.repository, number, &opt)
                .await,
        )
        .context("cannot close pull request")?;
        Ok(())
    }
}
