// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! User and AdminUser share one parameter set. AdminUser additionally keeps
//! the admin flag set and reads through the admin endpoint.

use super::{differs, Connection, ExternalClient, ExternalCreation, ExternalObservation, ExternalUpdate};
use crate::crd::user::{AdminUser, User, UserObservation, UserParameters};
use crate::crd::Managed;
use crate::error::{ignore_not_found, Result, ResultExt};
use crate::external_name::decode_name;
use crate::gitea::types::{self, CreateUserOption, EditUserOption};
use async_trait::async_trait;
use tracing::{debug, warn};

fn observation(user: &types::User) -> UserObservation {
    UserObservation {
        id: user.id,
        username: user.login.clone(),
        login_name: user.login_name.clone(),
        full_name: user.full_name.clone(),
        email: user.email.clone(),
        avatar_url: user.avatar_url.clone(),
        is_admin: user.is_admin,
        active: user.active,
        prohibit_login: user.prohibit_login,
        restricted: user.restricted,
        visibility: user.visibility.clone(),
        website: user.website.clone(),
        location: user.location.clone(),
        description: user.description.clone(),
        created: user.created.clone(),
        last_login: user.last_login.clone(),
    }
}

/// Gitea lowercases emails, so those compare case-insensitively.
fn is_up_to_date(p: &UserParameters, user: &types::User) -> bool {
    !(!p.email.eq_ignore_ascii_case(&user.email)
        || differs(p.full_name.as_deref(), user.full_name.as_str())
        || differs(p.login_name.as_deref(), user.login_name.as_str())
        || differs(p.visibility.as_deref(), user.visibility.as_str())
        || differs(p.restricted.as_ref(), &user.restricted)
        || differs(p.website.as_deref(), user.website.as_str())
        || differs(p.location.as_deref(), user.location.as_str())
        || differs(p.description.as_deref(), user.description.as_str())
        || differs(p.active.as_ref(), &user.active)
        || differs(p.prohibit_login.as_ref(), &user.prohibit_login))
}

/// Fields `POST /admin/users` does not accept.
fn has_edit_only_fields(p: &UserParameters) -> bool {
    p.website.is_some()
        || p.location.is_some()
        || p.description.is_some()
        || p.active.is_some()
        || p.prohibit_login.is_some()
        || p.allow_git_hook.is_some()
        || p.allow_import_local.is_some()
        || p.allow_create_organization.is_some()
        || p.max_repo_creation.is_some()
}

/// The password is only sent at creation.
fn edit_option(p: &UserParameters, admin: Option<bool>) -> EditUserOption {
    EditUserOption {
        login_name: p.login_name.clone().unwrap_or_else(|| p.username.clone()),
        source_id: p.source_id,
        email: Some(p.email.clone()),
        full_name: p.full_name.clone(),
        password: None,
        must_change_password: p.must_change_password,
        website: p.website.clone(),
        location: p.location.clone(),
        description: p.description.clone(),
        active: p.active,
        admin,
        allow_git_hook: p.allow_git_hook,
        allow_import_local: p.allow_import_local,
        allow_create_organization: p.allow_create_organization,
        prohibit_login: p.prohibit_login,
        restricted: p.restricted,
        visibility: p.visibility.clone(),
        max_repo_creation: p.max_repo_creation,
    }
}

impl Connection {
    async fn observe_user(
        &self,
        external_name: Option<&str>,
        p: &UserParameters,
        admin: bool,
    ) -> Result<ExternalObservation<UserObservation>> {
        let Some(username) = external_name.and_then(decode_name) else {
            return Ok(ExternalObservation::absent());
        };

        let user = if admin {
            self.gitea.get_admin_user(username).await
        } else {
            self.gitea.get_user(username).await
        };
        let Some(user) = ignore_not_found(user).context("cannot get user")? else {
            debug!("User {} not found", username);
            return Ok(ExternalObservation::absent());
        };

        let up_to_date = is_up_to_date(p, &user) && (!admin || user.is_admin);
        Ok(ExternalObservation::present(observation(&user), up_to_date))
    }

    async fn create_user_from(&self, p: &UserParameters, admin: bool) -> Result<ExternalCreation> {
        let password = self
            .secrets
            .resolve_string(&p.password_secret_ref)
            .await
            .context("cannot resolve user password")?;

        let opt = CreateUserOption {
            username: p.username.clone(),
            email: p.email.clone(),
            password,
            full_name: p.full_name.clone(),
            login_name: p.login_name.clone(),
            source_id: p.source_id,
            must_change_password: p.must_change_password,
            send_notify: p.send_notify,
            visibility: p.visibility.clone(),
            restricted: p.restricted,
        };
        let user = self
            .gitea
            .create_user(&opt)
            .await
            .context("cannot create user")?;

        let name = if user.login.is_empty() {
            p.username.clone()
        } else {
            user.login
        };

        // The user exists from here on; a failed follow-up is left to Update.
        if admin || has_edit_only_fields(p) {
            if let Err(e) = self
                .gitea
                .update_user(&name, &edit_option(p, admin.then_some(true)))
                .await
            {
                warn!("User {} created but not configured, retrying on update: {}", name, e);
            }
        }
        Ok(ExternalCreation::named(name))
    }

    async fn update_user_from(
        &self,
        external_name: Option<&str>,
        p: &UserParameters,
        admin: bool,
    ) -> Result<ExternalUpdate> {
        let username = external_name.and_then(decode_name).unwrap_or(&p.username);
        self.gitea
            .update_user(username, &edit_option(p, admin.then_some(true)))
            .await
            .context("cannot update user")?;
        Ok(ExternalUpdate::default())
    }

    async fn delete_user_named(&self, external_name: Option<&str>) -> Result<()> {
        let Some(username) = external_name.and_then(decode_name) else {
            return Ok(());
        };
        ignore_not_found(self.gitea.delete_user(username).await).context("cannot delete user")?;
        Ok(())
    }
}

#[async_trait]
impl ExternalClient<User> for Connection {
    async fn observe(&self, cr: &User) -> Result<ExternalObservation<UserObservation>> {
        self.observe_user(cr.external_name(), &cr.spec.for_provider, false)
            .await
    }

    async fn create(&self, cr: &User) -> Result<ExternalCreation> {
        self.create_user_from(&cr.spec.for_provider, false).await
    }

    async fn update(&self, cr: &User) -> Result<ExternalUpdate> {
        self.update_user_from(cr.external_name(), &cr.spec.for_provider, false)
            .await
    }

    async fn delete(&self, cr: &User) -> Result<()> {
        self.delete_user_named(cr.external_name()).await
    }
}

#[async_trait]
impl ExternalClient<AdminUser> for Connection {
    async fn observe(&self, cr: &AdminUser) -> Result<ExternalObservation<UserObservation>> {
        self.observe_user(cr.external_name(), &cr.spec.for_provider, true)
            .await
    }

    async fn create(&self, cr: &AdminUser) -> Result<ExternalCreation> {
        self.create_user_from(&cr.spec.for_provider, true).await
    }

    async fn update(&self, cr: &AdminUser) -> Result<ExternalUpdate> {
        self.update_user_from(cr.external_name(), &cr.spec.for_provider, true)
            .await
    }

    async fn delete(&self, cr: &AdminUser) -> Result<()> {
        self.delete_user_named(cr.external_name()).await
    }
}
