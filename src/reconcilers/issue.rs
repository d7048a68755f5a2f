// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Issues are addressed by number within the repository named in the spec.
//! Gitea cannot delete issues through the API, so deletion closes them.

use super::{differs, Connection, ExternalClient, ExternalCreation, ExternalObservation, ExternalUpdate};
use crate::crd::issue::{Issue, IssueObservation, IssueParameters};
use crate::crd::Managed;
use crate::error::{ignore_not_found, ProviderError, Result, ResultExt};
use crate::external_name::{decode_id, encode_id};
use crate::gitea::types::{self, CreateIssueOption, EditIssueOption, IssueLabelsOption};
use async_trait::async_trait;
use chrono::DateTime;

pub(super) const STATE_CLOSED: &str = "closed";

pub(super) fn logins(users: &Option<Vec<types::User>>) -> Vec<String> {
    users
        .iter()
        .flatten()
        .map(|u| u.login.clone())
        .collect()
}

pub(super) fn label_ids(labels: &[types::Label]) -> Vec<i64> {
    labels.iter().map(|l| l.id).collect()
}

/// Due dates compare as instants; Gitea normalises the offset.
pub(super) fn due_date_differs(desired: Option<&str>, observed: Option<&str>) -> bool {
    let Some(desired) = desired else {
        return false;
    };
    let Some(observed) = observed else {
        return true;
    };
    match (
        DateTime::parse_from_rfc3339(desired),
        DateTime::parse_from_rfc3339(observed),
    ) {
        (Ok(d), Ok(o)) => d != o,
        _ => desired != observed,
    }
}

pub(super) fn milestone_differs(desired: Option<i64>, observed: Option<&types::Milestone>) -> bool {
    desired.is_some_and(|m| observed.map(|o| o.id) != Some(m))
}

fn observation(issue: &types::Issue) -> IssueObservation {
    IssueObservation {
        id: issue.id,
        number: issue.number,
        title: issue.title.clone(),
        body: issue.body.clone(),
        state: issue.state.clone(),
        html_url: issue.html_url.clone(),
        assignees: logins(&issue.assignees),
        labels: label_ids(&issue.labels),
        milestone: issue.milestone.as_ref().map(|m| m.id),
        git_ref: issue.git_ref.clone(),
        comments: issue.comments,
        due_date: issue.due_date.clone(),
        created_at: issue.created_at.clone(),
        closed_at: issue.closed_at.clone(),
    }
}

fn is_up_to_date(p: &IssueParameters, issue: &types::Issue) -> bool {
    !(p.title != issue.title
        || differs(p.body.as_deref(), issue.body.as_str())
        || differs(p.state.as_deref(), issue.state.as_str())
        || differs(p.assignees.as_ref(), &logins(&issue.assignees))
        || differs(p.labels.as_ref(), &label_ids(&issue.labels))
        || milestone_differs(p.milestone, issue.milestone.as_ref())
        || due_date_differs(p.due_date.as_deref(), issue.due_date.as_deref())
        || differs(p.git_ref.as_deref(), issue.git_ref.as_str()))
}

fn decode_number(cr: &Issue) -> Result<i64> {
    cr.external_name()
        .and_then(decode_id)
        .ok_or_else(|| ProviderError::Validation("issue has no valid external name".to_string()))
}

#[async_trait]
impl ExternalClient<Issue> for Connection {
    async fn observe(&self, cr: &Issue) -> Result<ExternalObservation<IssueObservation>> {
        let Some(number) = cr.external_name().and_then(decode_id) else {
            return Ok(ExternalObservation::absent());
        };
        let p = &cr.spec.for_provider;

        let issue = ignore_not_found(self.gitea.get_issue(&p.owner, &p.repository, number).await)
            .context("cannot get issue")?;
        let Some(issue) = issue else {
            return Ok(ExternalObservation::absent());
        };

        Ok(ExternalObservation::present(
            observation(&issue),
            is_up_to_date(p, &issue),
        ))
    }

    async fn create(&self, cr: &Issue) -> Result<ExternalCreation> {
        let p = &cr.spec.for_provider;
        let opt = CreateIssueOption {
            title: p.title.clone(),
            body: p.body.clone(),
            assignees: p.assignees.clone(),
            labels: p.labels.clone(),
            milestone: p.milestone,
            due_date: p.due_date.clone(),
            git_ref: p.git_ref.clone(),
            closed: p.state.as_deref().map(|s| s == STATE_CLOSED),
        };

        let issue = self
            .gitea
            .create_issue(&p.owner, &p.repository, &opt)
            .await
            .context("cannot create issue")?;
        Ok(ExternalCreation::named(encode_id(issue.number)))
    }

    async fn update(&self, cr: &Issue) -> Result<ExternalUpdate> {
        let number = decode_number(cr)?;
        let p = &cr.spec.for_provider;
        let opt = EditIssueOption {
            title: Some(p.title.clone()),
            body: p.body.clone(),
            assignees: p.assignees.clone(),
            milestone: p.milestone,
            state: p.state.clone(),
            due_date: p.due_date.clone(),
            git_ref: p.git_ref.clone(),
        };

        self.gitea
            .update_issue(&p.owner, &p.repository, number, &opt)
            .await
            .context("cannot update issue")?;
        if let Some(labels) = &p.labels {
            self.gitea
                .replace_issue_labels(
                    &p.owner,
                    &p.repository,
                    number,
                    &IssueLabelsOption {
                        labels: labels.clone(),
                    },
                )
                .await
                .context("cannot replace issue labels")?;
        }
        Ok(ExternalUpdate::default())
    }

    /// Closes the issue.
    async fn delete(&self, cr: &Issue) -> Result<()> {
        let Some(number) = cr.external_name().and_then(decode_id) else {
            return Ok(());
        };
        let p = &cr.spec.for_provider;
        let opt = EditIssueOption {
            state: Some(STATE_CLOSED.to_string()),
            ..Default::default()
        };
        ignore_not_found(
            self.gitea
                .update_issue(&p.owner, &p.repository, number, &opt)
                .await,
        )
        .context("cannot close issue")?;
        Ok(())
    }
}
