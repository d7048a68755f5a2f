// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

use super::{differs, Connection, ExternalClient, ExternalCreation, ExternalObservation, ExternalUpdate};
use crate::crd::repository::{Label, LabelObservation, LabelParameters};
use crate::crd::Managed;
use crate::error::{ignore_not_found, ProviderError, Result, ResultExt};
use crate::external_name::{decode_repo_id, encode_repo_id};
use crate::gitea::types::{self, CreateLabelOption, EditLabelOption};
use async_trait::async_trait;

/// Gitea accepts colors with or without `#` and in any case.
fn normalize_color(color: &str) -> String {
    color.trim().trim_start_matches('#').to_ascii_lowercase()
}

fn is_up_to_date(p: &LabelParameters, label: &types::Label) -> bool {
    p.name == label.name
        && normalize_color(&p.color) == normalize_color(&label.color)
        && !differs(p.description.as_deref(), label.description.as_str())
        && !differs(p.exclusive.as_ref(), &label.exclusive)
        && !differs(p.is_archived.as_ref(), &label.is_archived)
}

fn observation(label: types::Label) -> LabelObservation {
    LabelObservation {
        id: label.id,
        name: label.name,
        color: label.color,
        description: label.description,
        exclusive: label.exclusive,
        is_archived: label.is_archived,
        url: label.url,
    }
}

#[async_trait]
impl ExternalClient<Label> for Connection {
    async fn observe(&self, cr: &Label) -> Result<ExternalObservation<LabelObservation>> {
        let Some((owner, repo, id)) = cr.external_name().and_then(decode_repo_id) else {
            return Ok(ExternalObservation::absent());
        };

        let label = ignore_not_found(self.gitea.get_label(&owner, &repo, id).await)
            .context("cannot get label")?;
        let Some(label) = label else {
            return Ok(ExternalObservation::absent());
        };

        let up_to_date = is_up_to_date(&cr.spec.for_provider, &label);
        Ok(ExternalObservation::present(observation(label), up_to_date))
    }

    async fn create(&self, cr: &Label) -> Result<ExternalCreation> {
        let p = &cr.spec.for_provider;
        let opt = CreateLabelOption {
            name: p.name.clone(),
            color: p.color.clone(),
            description: p.description.clone(),
            exclusive: p.exclusive,
            is_archived: p.is_archived,
        };

        let label = self
            .gitea
            .create_label(&p.owner, &p.repository, &opt)
            .await
            .context("cannot create label")?;
        Ok(ExternalCreation::named(encode_repo_id(
            &p.owner,
            &p.repository,
            label.id,
        )))
    }

    async fn update(&self, cr: &Label) -> Result<ExternalUpdate> {
        let (owner, repo, id) = cr
            .external_name()
            .and_then(decode_repo_id)
            .ok_or_else(|| ProviderError::Validation("label has no valid external name".to_string()))?;
        let p = &cr.spec.for_provider;
        let opt = EditLabelOption {
            name: Some(p.name.clone()),
            color: Some(p.color.clone()),
            description: p.description.clone(),
            exclusive: p.exclusive,
            is_archived: p.is_archived,
        };

        self.gitea
            .update_label(&owner, &repo, id, &opt)
            .await
            .context("cannot update label")?;
        Ok(ExternalUpdate::default())
    }

    async fn delete(&self, cr: &Label) -> Result<()> {
        let Some((owner, repo, id)) = cr.external_name().and_then(decode_repo_id) else {
            return Ok(());
        };
        ignore_not_found(self.gitea.delete_label(&owner, &repo, id).await)
            .context("cannot delete label")?;
        Ok(())
    }
}
