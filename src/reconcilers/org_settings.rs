// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Organization settings are the mutable subset of an organization that
//! `PATCH /orgs/{name}` accepts. The organization itself is never created or
//! deleted here.

use super::organization::{edit_option, matches, observation};
use super::{Connection, ExternalClient, ExternalCreation, ExternalObservation, ExternalUpdate};
use crate::crd::organization::{OrganizationObservation, OrganizationSettings, OrganizationSettingsParameters};
use crate::crd::Managed;
use crate::error::{ignore_not_found, ProviderError, Result, ResultExt};
use crate::external_name::decode_name;
use crate::gitea::types::EditOrgOption;
use async_trait::async_trait;
use tracing::info;

fn desired(p: &OrganizationSettingsParameters) -> EditOrgOption {
    edit_option(
        &p.full_name,
        &p.description,
        &p.website,
        &p.location,
        &p.visibility,
        p.repo_admin_change_team_access,
        &p.email,
    )
}

impl Connection {
    async fn apply_org_settings(&self, org: &str, p: &OrganizationSettingsParameters) -> Result<()> {
        self.gitea
            .update_organization(org, &desired(p))
            .await
            .context("cannot update organization settings")?;
        Ok(())
    }
}

#[async_trait]
impl ExternalClient<OrganizationSettings> for Connection {
    async fn observe(&self, cr: &OrganizationSettings) -> Result<ExternalObservation<OrganizationObservation>> {
        let Some(name) = cr.external_name().and_then(decode_name) else {
            return Ok(ExternalObservation::absent());
        };

        let org = ignore_not_found(self.gitea.get_organization(name).await)
            .context("cannot get organization")?;
        let Some(org) = org else {
            return Ok(ExternalObservation::absent());
        };

        let up_to_date = matches(&desired(&cr.spec.for_provider), &org);
        Ok(ExternalObservation::present(observation(&org), up_to_date))
    }

    /// Applies the settings to an existing organization and adopts it.
    async fn create(&self, cr: &OrganizationSettings) -> Result<ExternalCreation> {
        let p = &cr.spec.for_provider;
        if decode_name(&p.organization).is_none() {
            return Err(ProviderError::Validation(format!(
                "invalid organization name {:?}",
                p.organization
            )));
        }

        self.apply_org_settings(&p.organization, p).await?;
        Ok(ExternalCreation::named(p.organization.clone()))
    }

    async fn update(&self, cr: &OrganizationSettings) -> Result<ExternalUpdate> {
        let p = &cr.spec.for_provider;
        let org = cr
            .external_name()
            .and_then(decode_name)
            .unwrap_or(&p.organization);
        self.apply_org_settings(org, p).await?;
        Ok(ExternalUpdate::default())
    }

    /// Settings always exist; deleting only stops managing them.
    async fn delete(&self, cr: &OrganizationSettings) -> Result<()> {
        info!(
            "Releasing settings of organization {}",
            cr.spec.for_provider.organization
        );
        Ok(())
    }
}
