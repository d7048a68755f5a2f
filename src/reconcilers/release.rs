// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

use super::{differs, Connection, ExternalClient, ExternalCreation, ExternalObservation, ExternalUpdate};
use crate::crd::issue::{Release, ReleaseObservation, ReleaseParameters};
use crate::crd::Managed;
use crate::error::{ignore_not_found, ProviderError, Result, ResultExt};
use crate::external_name::{decode_id, encode_id};
use crate::gitea::types::{self, CreateReleaseOption, EditReleaseOption};
use async_trait::async_trait;
use tracing::info;

fn observation(release: types::Release) -> ReleaseObservation {
    ReleaseObservation {
        id: release.id,
        tag_name: release.tag_name,
        target_commitish: release.target_commitish,
        name: release.name,
        body: release.body,
        draft: release.draft,
        prerelease: release.prerelease,
        html_url: release.html_url,
        tarball_url: release.tarball_url,
        zipball_url: release.zipball_url,
        created_at: release.created_at,
        published_at: release.published_at,
    }
}

fn is_up_to_date(p: &ReleaseParameters, release: &types::Release) -> bool {
    p.tag_name == release.tag_name
        && !differs(p.target_commitish.as_deref(), release.target_commitish.as_str())
        && !differs(p.name.as_deref(), release.name.as_str())
        && !differs(p.body.as_deref(), release.body.as_str())
        && !differs(p.draft.as_ref(), &release.draft)
        && !differs(p.prerelease.as_ref(), &release.prerelease)
}

#[async_trait]
impl ExternalClient<Release> for Connection {
    async fn observe(&self, cr: &Release) -> Result<ExternalObservation<ReleaseObservation>> {
        let Some(id) = cr.external_name().and_then(decode_id) else {
            return Ok(ExternalObservation::absent());
        };
        let p = &cr.spec.for_provider;

        let release = ignore_not_found(self.gitea.get_release(&p.owner, &p.repository, id).await)
            .context("cannot get release")?;
        let Some(release) = release else {
            return Ok(ExternalObservation::absent());
        };

        let up_to_date = is_up_to_date(p, &release);
        Ok(ExternalObservation::present(observation(release), up_to_date))
    }

    /// Adopts a release that already exists for the tag.
    async fn create(&self, cr: &Release) -> Result<ExternalCreation> {
        let p = &cr.spec.for_provider;

        let existing = ignore_not_found(
            self.gitea
                .get_release_by_tag(&p.owner, &p.repository, &p.tag_name)
                .await,
        )
        .context("cannot look up release by tag")?;
        if let Some(release) = existing {
            info!("Adopting existing release {} for tag {}", release.id, p.tag_name);
            return Ok(ExternalCreation::named(encode_id(release.id)));
        }

        let opt = CreateReleaseOption {
            tag_name: p.tag_name.clone(),
            target_commitish: p.target_commitish.clone(),
            name: p.name.clone(),
            body: p.body.clone(),
            draft: p.draft,
            prerelease: p.prerelease,
        };
        let release = self
            .gitea
            .create_release(&p.owner, &p.repository, &opt)
            .await
            .context("cannot create release")?;
        Ok(ExternalCreation::named(encode_id(release.id)))
    }

    async fn update(&self, cr: &Release) -> Result<ExternalUpdate> {
        let id = cr
            .external_name()
            .and_then(decode_id)
            .ok_or_else(|| ProviderError::Validation("release has no valid external name".to_string()))?;
        let p = &cr.spec.for_provider;
        let opt = EditReleaseOption {
            tag_name: Some(p.tag_name.clone()),
            target_commitish: p.target_commitish.clone(),
            name: p.name.clone(),
            body: p.body.clone(),
            draft: p.draft,
            prerelease: p.prerelease,
        };

        self.gitea
            .update_release(&p.owner, &p.repository, id, &opt)
            .await
            .context("cannot update release")?;
        Ok(ExternalUpdate::default())
    }

    async fn delete(&self, cr: &Release) -> Result<()> {
        let Some(id) = cr.external_name().and_then(decode_id) else {
            return Ok(());
        };
        let p = &cr.spec.for_provider;
        ignore_not_found(self.gitea.delete_release(&p.owner, &p.repository, id).await)
            .context("cannot delete release")?;
        Ok(())
    }
}
