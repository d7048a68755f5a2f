// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

use super::{differs, Connection, ExternalClient, ExternalCreation, ExternalObservation, ExternalUpdate};
use crate::crd::organization::{Organization, OrganizationObservation, OrganizationParameters};
use crate::crd::Managed;
use crate::error::{ignore_not_found, Result, ResultExt};
use crate::external_name::decode_name;
use crate::gitea::types::{self, CreateOrgOption, EditOrgOption};
use async_trait::async_trait;
use kube::ResourceExt;
use tracing::{debug, instrument};

pub(super) fn observation(org: &types::Organization) -> OrganizationObservation {
    OrganizationObservation {
        id: org.id,
        name: org.login().to_string(),
        full_name: org.full_name.clone(),
        description: org.description.clone(),
        website: org.website.clone(),
        location: org.location.clone(),
        visibility: org.visibility.clone(),
        repo_admin_change_team_access: org.repo_admin_change_team_access,
        email: org.email.clone(),
        avatar_url: org.avatar_url.clone(),
    }
}

/// Settings shared by Organization and OrganizationSettings.
pub(super) fn edit_option(
    full_name: &Option<String>,
    description: &Option<String>,
    website: &Option<String>,
    location: &Option<String>,
    visibility: &Option<String>,
    repo_admin_change_team_access: Option<bool>,
    email: &Option<String>,
) -> EditOrgOption {
    EditOrgOption {
        full_name: full_name.clone(),
        email: email.clone(),
        description: description.clone(),
        website: website.clone(),
        location: location.clone(),
        visibility: visibility.clone(),
        repo_admin_change_team_access,
    }
}

/// True when every set field of `desired` matches the organization.
pub(super) fn matches(desired: &EditOrgOption, org: &types::Organization) -> bool {
    !(differs(desired.full_name.as_deref(), org.full_name.as_str())
        || differs(desired.description.as_deref(), org.description.as_str())
        || differs(desired.website.as_deref(), org.website.as_str())
        || differs(desired.location.as_deref(), org.location.as_str())
        || differs(desired.visibility.as_deref(), org.visibility.as_str())
        || differs(
            desired.repo_admin_change_team_access.as_ref(),
            &org.repo_admin_change_team_access,
        )
        || differs(desired.email.as_deref(), org.email.as_str()))
}

fn desired(p: &OrganizationParameters) -> EditOrgOption {
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

#[async_trait]
impl ExternalClient<Organization> for Connection {
    #[instrument(skip(self, cr), fields(name = %cr.name_any()))]
    async fn observe(&self, cr: &Organization) -> Result<ExternalObservation<OrganizationObservation>> {
        let Some(name) = cr.external_name().and_then(decode_name) else {
            return Ok(ExternalObservation::absent());
        };

        let org = ignore_not_found(self.gitea.get_organization(name).await)
            .context("cannot get organization")?;
        let Some(org) = org else {
            debug!("Organization {} not found", name);
            return Ok(ExternalObservation::absent());
        };

        let up_to_date = matches(&desired(&cr.spec.for_provider), &org);
        Ok(ExternalObservation::present(observation(&org), up_to_date))
    }

    async fn create(&self, cr: &Organization) -> Result<ExternalCreation> {
        let p = &cr.spec.for_provider;
        let opt = CreateOrgOption {
            username: p.name.clone(),
            full_name: p.full_name.clone(),
            email: p.email.clone(),
            description: p.description.clone(),
            website: p.website.clone(),
            location: p.location.clone(),
            visibility: p.visibility.clone(),
            repo_admin_change_team_access: p.repo_admin_change_team_access,
        };

        let org = self
            .gitea
            .create_organization(&opt)
            .await
            .context("cannot create organization")?;
        let name = match org.login() {
            "" => p.name.clone(),
            login => login.to_string(),
        };
        Ok(ExternalCreation::named(name))
    }

    async fn update(&self, cr: &Organization) -> Result<ExternalUpdate> {
        let p = &cr.spec.for_provider;
        let name = cr.external_name().and_then(decode_name).unwrap_or(&p.name);

        self.gitea
            .update_organization(name, &desired(p))
            .await
            .context("cannot update organization")?;
        Ok(ExternalUpdate::default())
    }

    async fn delete(&self, cr: &Organization) -> Result<()> {
        let Some(name) = cr.external_name().and_then(decode_name) else {
            return Ok(());
        };
        ignore_not_found(self.gitea.delete_organization(name).await)
            .context("cannot delete organization")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::organization::OrganizationSpec;
    use crate::test_utils::{connection, gitea_client, with_external_name, MockGitea};
    use http::Method;
    use std::sync::Arc;

    const ACME: &str = r#"{"id":2,"name":"acme","full_name":"ACME Corp","visibility":"public","website":""}"#;

    fn organization(p: OrganizationParameters) -> Organization {
        Organization::new(
            "acme",
            OrganizationSpec {
                resource: Default::default(),
                for_provider: p,
            },
        )
    }

    fn params() -> OrganizationParameters {
        OrganizationParameters {
            name: "acme".to_string(),
            full_name: Some("ACME Corp".to_string()),
            visibility: Some("public".to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_then_observe() {
        let mock = Arc::new(
            MockGitea::new()
                .on(Method::POST, "/orgs", 201, ACME)
                .on(Method::GET, "/orgs/acme", 200, ACME),
        );
        let conn = connection(gitea_client(&mock));
        let cr = organization(params());

        let creation = conn.create(&cr).await.unwrap();
        assert_eq!(creation.external_name, "acme");
        assert_eq!(
            mock.last_body(Method::POST, "/orgs").unwrap(),
            serde_json::json!({"username": "acme", "full_name": "ACME Corp", "visibility": "public"})
        );

        let obs = conn.observe(&with_external_name(cr, "acme")).await.unwrap();
        assert!(obs.resource_exists);
        assert!(obs.resource_up_to_date);
        assert_eq!(obs.observation.unwrap().full_name, "ACME Corp");
    }

    #[tokio::test]
    async fn test_website_drift() {
        let mock = Arc::new(
            MockGitea::new()
                .on(Method::GET, "/orgs/acme", 200, ACME)
                .on(Method::PATCH, "/orgs/acme", 200, ACME),
        );
        let conn = connection(gitea_client(&mock));
        let mut p = params();
        p.website = Some("https://acme.example".to_string());
        let cr = with_external_name(organization(p), "acme");

        assert!(!conn.observe(&cr).await.unwrap().resource_up_to_date);
        conn.update(&cr).await.unwrap();
        assert_eq!(
            mock.last_body(Method::PATCH, "/orgs/acme").unwrap()["website"],
            "https://acme.example"
        );
    }

    #[tokio::test]
    async fn test_delete_missing_organization() {
        let mock = Arc::new(MockGitea::new());
        let conn = connection(gitea_client(&mock));
        let cr = with_external_name(organization(params()), "acme");

        conn.delete(&cr).await.unwrap();
        assert_eq!(mock.paths(), vec!["DELETE /orgs/acme"]);
    }
}
