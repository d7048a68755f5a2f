// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Organization, team and membership operations.

use crate::error::Result;
use crate::gitea::client::{escape, GiteaClient};
use crate::gitea::types::*;

fn org_path(org: &str) -> String {
    format!("/orgs/{}", escape(org))
}

impl GiteaClient {
    pub async fn get_organization(&self, name: &str) -> Result<Organization> {
        self.get(&org_path(name)).await
    }

    pub async fn create_organization(&self, opt: &CreateOrgOption) -> Result<Organization> {
        self.post("/orgs", opt).await
    }

    pub async fn update_organization(&self, name: &str, opt: &EditOrgOption) -> Result<Organization> {
        self.patch(&org_path(name), opt).await
    }

    pub async fn delete_organization(&self, name: &str) -> Result<()> {
        self.delete(&org_path(name)).await
    }

    pub async fn get_org_hook(&self, org: &str, id: i64) -> Result<Hook> {
        self.get(&format!("{}/hooks/{}", org_path(org), id)).await
    }

    pub async fn create_org_hook(&self, org: &str, opt: &CreateHookOption) -> Result<Hook> {
        self.post(&format!("{}/hooks", org_path(org)), opt).await
    }

    pub async fn update_org_hook(&self, org: &str, id: i64, opt: &EditHookOption) -> Result<Hook> {
        self.patch(&format!("{}/hooks/{}", org_path(org), id), opt).await
    }

    pub async fn delete_org_hook(&self, org: &str, id: i64) -> Result<()> {
        self.delete(&format!("{}/hooks/{}", org_path(org), id)).await
    }

    pub async fn get_team(&self, id: i64) -> Result<Team> {
        self.get(&format!("/teams/{}", id)).await
    }

    pub async fn create_team(&self, org: &str, opt: &CreateTeamOption) -> Result<Team> {
        self.post(&format!("{}/teams", org_path(org)), opt).await
    }

    pub async fn update_team(&self, id: i64, opt: &EditTeamOption) -> Result<Team> {
        self.patch(&format!("/teams/{}", id), opt).await
    }

    pub async fn delete_team(&self, id: i64) -> Result<()> {
        self.delete(&format!("/teams/{}", id)).await
    }

    /// Succeeds when the user is a member (204), 404 otherwise.
    pub async fn is_org_member(&self, org: &str, user: &str) -> Result<()> {
        self.check(&format!("{}/members/{}", org_path(org), escape(user)))
            .await
    }

    pub async fn add_org_member(&self, org: &str, user: &str, opt: &OrgMembershipOption) -> Result<()> {
        self.put_empty(
            &format!("{}/members/{}", org_path(org), escape(user)),
            Some(opt),
        )
        .await
    }

    pub async fn update_org_member(&self, org: &str, user: &str, opt: &OrgMembershipOption) -> Result<()> {
        self.patch_empty(&format!("{}/members/{}", org_path(org), escape(user)), opt)
            .await
    }

    pub async fn remove_org_member(&self, org: &str, user: &str) -> Result<()> {
        self.delete(&format!("{}/members/{}", org_path(org), escape(user)))
            .await
    }

    /// Succeeds when the membership is public (204), 404 otherwise.
    pub async fn is_public_org_member(&self, org: &str, user: &str) -> Result<()> {
        self.check(&format!("{}/public_members/{}", org_path(org), escape(user)))
            .await
    }

    pub async fn publicize_org_member(&self, org: &str, user: &str) -> Result<()> {
        self.put_empty::<()>(
            &format!("{}/public_members/{}", org_path(org), escape(user)),
            None,
        )
        .await
    }

    pub async fn conceal_org_member(&self, org: &str, user: &str) -> Result<()> {
        self.delete(&format!("{}/public_members/{}", org_path(org), escape(user)))
            .await
    }
}
