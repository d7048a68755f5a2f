// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

use super::{differs, Connection, ExternalClient, ExternalCreation, ExternalObservation, ExternalUpdate};
use crate::crd::organization::{OrganizationMember, OrganizationMemberObservation, OrganizationMemberParameters};
use crate::crd::Managed;
use crate::error::{ignore_not_found, Result, ResultExt};
use crate::external_name::{decode_pair, encode_pair};
use crate::gitea::types::OrgMembershipOption;
use async_trait::async_trait;
use tracing::{debug, warn};

impl Connection {
    async fn set_membership_visibility(&self, org: &str, user: &str, public: bool) -> Result<()> {
        if public {
            self.gitea
                .publicize_org_member(org, user)
                .await
                .context("cannot publicize organization membership")
        } else {
            ignore_not_found(self.gitea.conceal_org_member(org, user).await)
                .context("cannot conceal organization membership")
                .map(|_| ())
        }
    }
}

fn membership(p: &OrganizationMemberParameters) -> OrgMembershipOption {
    OrgMembershipOption {
        role: p.role.clone(),
    }
}

#[async_trait]
impl ExternalClient<OrganizationMember> for Connection {
    async fn observe(
        &self,
        cr: &OrganizationMember,
    ) -> Result<ExternalObservation<OrganizationMemberObservation>> {
        let Some((org, user)) = cr.external_name().and_then(decode_pair) else {
            return Ok(ExternalObservation::absent());
        };

        let member = ignore_not_found(self.gitea.is_org_member(&org, &user).await)
            .context("cannot check organization membership")?;
        if member.is_none() {
            debug!("{} is not a member of {}", user, org);
            return Ok(ExternalObservation::absent());
        }

        let public = ignore_not_found(self.gitea.is_public_org_member(&org, &user).await)
            .context("cannot check organization membership visibility")?
            .is_some();

        let up_to_date = !differs(cr.spec.for_provider.public.as_ref(), &public);
        Ok(ExternalObservation::present(
            OrganizationMemberObservation {
                organization: org,
                username: user,
                public,
            },
            up_to_date,
        ))
    }

    async fn create(&self, cr: &OrganizationMember) -> Result<ExternalCreation> {
        let p = &cr.spec.for_provider;
        self.gitea
            .add_org_member(&p.organization, &p.username, &membership(p))
            .await
            .context("cannot add organization member")?;
        let name = encode_pair(&p.organization, &p.username);
        if p.public == Some(true) {
            // Visibility is compared by Observe, so Update retries this.
            if let Err(e) = self
                .set_membership_visibility(&p.organization, &p.username, true)
                .await
            {
                warn!("Membership {} created but not publicized: {}", name, e);
            }
        }
        Ok(ExternalCreation::named(name))
    }

    async fn update(&self, cr: &OrganizationMember) -> Result<ExternalUpdate> {
        let p = &cr.spec.for_provider;
        let (org, user) = cr
            .external_name()
            .and_then(decode_pair)
            .unwrap_or_else(|| (p.organization.clone(), p.username.clone()));

        if p.role.is_some() {
            self.gitea
                .update_org_member(&org, &user, &membership(p))
                .await
                .context("cannot update organization member")?;
        }
        if let Some(public) = p.public {
            self.set_membership_visibility(&org, &user, public).await?;
        }
        Ok(ExternalUpdate::default())
    }

    async fn delete(&self, cr: &OrganizationMember) -> Result<()> {
        let Some((org, user)) = cr.external_name().and_then(decode_pair) else {
            return Ok(());
        };
        ignore_not_found(self.gitea.remove_org_member(&org, &user).await)
            .context("cannot remove organization member")?;
        Ok(())
    }
}
