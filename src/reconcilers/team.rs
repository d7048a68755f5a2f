// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

use super::{differs, Connection, ExternalClient, ExternalCreation, ExternalObservation, ExternalUpdate};
use crate::crd::organization::{Team, TeamObservation, TeamParameters};
use crate::crd::Managed;
use crate::error::{ignore_not_found, ProviderError, Result, ResultExt};
use crate::external_name::{decode_id, encode_id};
use crate::gitea::types::{self, CreateTeamOption, EditTeamOption};
use async_trait::async_trait;

fn observation(team: &types::Team, organization: &str) -> TeamObservation {
    TeamObservation {
        id: team.id,
        name: team.name.clone(),
        organization: team
            .organization
            .as_ref()
            .map(|o| o.login().to_string())
            .unwrap_or_else(|| organization.to_string()),
        description: team.description.clone(),
        permission: team.permission.clone(),
        can_create_org_repo: team.can_create_org_repo,
        includes_all_repositories: team.includes_all_repositories,
        units: team.units.clone(),
        units_map: team.units_map.clone(),
    }
}

fn is_up_to_date(p: &TeamParameters, team: &types::Team) -> bool {
    !(p.name != team.name
        || differs(p.description.as_deref(), team.description.as_str())
        || differs(p.permission.as_deref(), team.permission.as_str())
        || differs(p.can_create_org_repo.as_ref(), &team.can_create_org_repo)
        || differs(
            p.includes_all_repositories.as_ref(),
            &team.includes_all_repositories,
        )
        || differs(p.units.as_ref(), &team.units)
        || differs(p.units_map.as_ref(), &team.units_map))
}

#[async_trait]
impl ExternalClient<Team> for Connection {
    async fn observe(&self, cr: &Team) -> Result<ExternalObservation<TeamObservation>> {
        let Some(id) = cr.external_name().and_then(decode_id) else {
            return Ok(ExternalObservation::absent());
        };

        let team = ignore_not_found(self.gitea.get_team(id).await).context("cannot get team")?;
        let Some(team) = team else {
            return Ok(ExternalObservation::absent());
        };

        let p = &cr.spec.for_provider;
        Ok(ExternalObservation::present(
            observation(&team, &p.organization),
            is_up_to_date(p, &team),
        ))
    }

    async fn create(&self, cr: &Team) -> Result<ExternalCreation> {
        let p = &cr.spec.for_provider;
        let opt = CreateTeamOption {
            name: p.name.clone(),
            description: p.description.clone(),
            permission: p.permission.clone(),
            can_create_org_repo: p.can_create_org_repo,
            includes_all_repositories: p.includes_all_repositories,
            units: p.units.clone(),
            units_map: p.units_map.clone(),
        };

        let team = self
            .gitea
            .create_team(&p.organization, &opt)
            .await
            .context("cannot create team")?;
        Ok(ExternalCreation::named(encode_id(team.id)))
    }

    async fn update(&self, cr: &Team) -> Result<ExternalUpdate> {
        let id = cr
            .external_name()
            .and_then(decode_id)
            .ok_or_else(|| ProviderError::Validation("team has no valid external name".to_string()))?;
        let p = &cr.spec.for_provider;
        let opt = EditTeamOption {
            name: p.name.clone(),
            description: p.description.clone(),
            permission: p.permission.clone(),
            can_create_org_repo: p.can_create_org_repo,
            includes_all_repositories: p.includes_all_repositories,
            units: p.units.clone(),
            units_map: p.units_map.clone(),
        };

        self.gitea
            .update_team(id, &opt)
            .await
            .context("cannot update team")?;
        Ok(ExternalUpdate::default())
    }

    async fn delete(&self, cr: &Team) -> Result<()> {
        let Some(id) = cr.external_name().and_then(decode_id) else {
            return Ok(());
        };
        ignore_not_found(self.gitea.delete_team(id).await).context("cannot delete team")?;
        Ok(())
    }
}
