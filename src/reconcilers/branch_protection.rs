// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

use super::{differs, Connection, ExternalClient, ExternalCreation, ExternalObservation, ExternalUpdate};
use crate::crd::repository::{BranchProtection, BranchProtectionObservation, BranchProtectionParameters};
use crate::crd::Managed;
use crate::error::{ignore_not_found, ProviderError, Result, ResultExt};
use crate::external_name::{decode_branch_protection, encode_branch_protection};
use crate::gitea::split_repository;
use crate::gitea::types::{self, BranchProtectionOption};
use async_trait::async_trait;

/// Protection settings without the rule identity, shared by create and update.
fn settings(p: &BranchProtectionParameters) -> BranchProtectionOption {
    BranchProtectionOption {
        branch_name: None,
        rule_name: None,
        enable_push: p.enable_push,
        enable_push_whitelist: p.enable_push_whitelist,
        push_whitelist_usernames: p.push_whitelist_usernames.clone(),
        push_whitelist_teams: p.push_whitelist_teams.clone(),
        push_whitelist_deploy_keys: p.push_whitelist_deploy_keys,
        enable_merge_whitelist: p.enable_merge_whitelist,
        merge_whitelist_usernames: p.merge_whitelist_usernames.clone(),
        merge_whitelist_teams: p.merge_whitelist_teams.clone(),
        enable_status_check: p.enable_status_check,
        status_check_contexts: p.status_check_contexts.clone(),
        required_approvals: p.required_approvals,
        enable_approvals_whitelist: p.enable_approvals_whitelist,
        approvals_whitelist_usernames: p.approvals_whitelist_usernames.clone(),
        approvals_whitelist_teams: p.approvals_whitelist_teams.clone(),
        block_on_rejected_reviews: p.block_on_rejected_reviews,
        block_on_official_review_requests: p.block_on_official_review_requests,
        block_on_outdated_branch: p.block_on_outdated_branch,
        dismiss_stale_approvals: p.dismiss_stale_approvals,
        require_signed_commits: p.require_signed_commits,
        protected_file_patterns: p.protected_file_patterns.clone(),
        unprotected_file_patterns: p.unprotected_file_patterns.clone(),
    }
}

fn is_up_to_date(p: &BranchProtectionParameters, bp: &types::BranchProtection) -> bool {
    !(differs(p.enable_push.as_ref(), &bp.enable_push)
        || differs(p.enable_push_whitelist.as_ref(), &bp.enable_push_whitelist)
        || differs(p.push_whitelist_usernames.as_ref(), &bp.push_whitelist_usernames)
        || differs(p.push_whitelist_teams.as_ref(), &bp.push_whitelist_teams)
        || differs(p.push_whitelist_deploy_keys.as_ref(), &bp.push_whitelist_deploy_keys)
        || differs(p.enable_merge_whitelist.as_ref(), &bp.enable_merge_whitelist)
        || differs(p.merge_whitelist_usernames.as_ref(), &bp.merge_whitelist_usernames)
        || differs(p.merge_whitelist_teams.as_ref(), &bp.merge_whitelist_teams)
        || differs(p.enable_status_check.as_ref(), &bp.enable_status_check)
        || differs(p.status_check_contexts.as_ref(), &bp.status_check_contexts)
        || differs(p.required_approvals.as_ref(), &bp.required_approvals)
        || differs(p.enable_approvals_whitelist.as_ref(), &bp.enable_approvals_whitelist)
        || differs(
            p.approvals_whitelist_usernames.as_ref(),
            &bp.approvals_whitelist_usernames,
        )
        || differs(p.approvals_whitelist_teams.as_ref(), &bp.approvals_whitelist_teams)
        || differs(p.block_on_rejected_reviews.as_ref(), &bp.block_on_rejected_reviews)
        || differs(
            p.block_on_official_review_requests.as_ref(),
            &bp.block_on_official_review_requests,
        )
        || differs(p.block_on_outdated_branch.as_ref(), &bp.block_on_outdated_branch)
        || differs(p.dismiss_stale_approvals.as_ref(), &bp.dismiss_stale_approvals)
        || differs(p.require_signed_commits.as_ref(), &bp.require_signed_commits)
        || differs(
            p.protected_file_patterns.as_deref(),
            bp.protected_file_patterns.as_str(),
        )
        || differs(
            p.unprotected_file_patterns.as_deref(),
            bp.unprotected_file_patterns.as_str(),
        ))
}

fn observation(bp: types::BranchProtection) -> BranchProtectionObservation {
    BranchProtectionObservation {
        branch_name: bp.branch_name,
        rule_name: bp.rule_name,
        enable_push: bp.enable_push,
        enable_push_whitelist: bp.enable_push_whitelist,
        push_whitelist_usernames: bp.push_whitelist_usernames,
        push_whitelist_teams: bp.push_whitelist_teams,
        push_whitelist_deploy_keys: bp.push_whitelist_deploy_keys,
        enable_merge_whitelist: bp.enable_merge_whitelist,
        merge_whitelist_usernames: bp.merge_whitelist_usernames,
        merge_whitelist_teams: bp.merge_whitelist_teams,
        enable_status_check: bp.enable_status_check,
        status_check_contexts: bp.status_check_contexts,
        required_approvals: bp.required_approvals,
        enable_approvals_whitelist: bp.enable_approvals_whitelist,
        approvals_whitelist_usernames: bp.approvals_whitelist_usernames,
        approvals_whitelist_teams: bp.approvals_whitelist_teams,
        block_on_rejected_reviews: bp.block_on_rejected_reviews,
        block_on_official_review_requests: bp.block_on_official_review_requests,
        block_on_outdated_branch: bp.block_on_outdated_branch,
        dismiss_stale_approvals: bp.dismiss_stale_approvals,
        require_signed_commits: bp.require_signed_commits,
        protected_file_patterns: bp.protected_file_patterns,
        unprotected_file_patterns: bp.unprotected_file_patterns,
        created_at: bp.created_at,
        updated_at: bp.updated_at,
    }
}

#[async_trait]
impl ExternalClient<BranchProtection> for Connection {
    async fn observe(&self, cr: &BranchProtection) -> Result<ExternalObservation<BranchProtectionObservation>> {
        let Some((owner, repo, _, rule)) = cr.external_name().and_then(decode_branch_protection) else {
            return Ok(ExternalObservation::absent());
        };

        let bp = ignore_not_found(self.gitea.get_branch_protection(&owner, &repo, &rule).await)
            .context("cannot get branch protection")?;
        let Some(bp) = bp else {
            return Ok(ExternalObservation::absent());
        };

        let up_to_date = is_up_to_date(&cr.spec.for_provider, &bp);
        Ok(ExternalObservation::present(observation(bp), up_to_date))
    }

    async fn create(&self, cr: &BranchProtection) -> Result<ExternalCreation> {
        let p = &cr.spec.for_provider;
        let (owner, repo) = split_repository(&p.repository)?;
        let rule = p.effective_rule_name();
        let opt = BranchProtectionOption {
            branch_name: Some(p.branch.clone()),
            rule_name: Some(rule.to_string()),
            ..settings(p)
        };

        self.gitea
            .create_branch_protection(&owner, &repo, &opt)
            .await
            .context("cannot create branch protection")?;
        Ok(ExternalCreation::named(encode_branch_protection(
            &owner, &repo, &p.branch, rule,
        )))
    }

    async fn update(&self, cr: &BranchProtection) -> Result<ExternalUpdate> {
        let (owner, repo, _, rule) = cr
            .external_name()
            .and_then(decode_branch_protection)
            .ok_or_else(|| {
                ProviderError::Validation("branch protection has no valid external name".to_string())
            })?;

        self.gitea
            .update_branch_protection(&owner, &repo, &rule, &settings(&cr.spec.for_provider))
            .await
            .context("cannot update branch protection")?;
        Ok(ExternalUpdate::default())
    }

    async fn delete(&self, cr: &BranchProtection) -> Result<()> {
        let Some((owner, repo, _, rule)) = cr.external_name().and_then(decode_branch_protection) else {
            return Ok(());
        };
        ignore_not_found(self.gitea.delete_branch_protection(&owner, &repo, &rule).await)
            .context("cannot delete branch protection")?;
        Ok(())
    }
}
