// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! User, admin, SSH key and access token operations.

use crate::error::Result;
use crate::gitea::client::{escape, GiteaClient};
use crate::gitea::types::*;

impl GiteaClient {
    pub async fn get_user(&self, username: &str) -> Result<User> {
        self.get(&format!("/users/{}", escape(username))).await
    }

    /// Admin view of a user, includes admin-only fields.
    pub async fn get_admin_user(&self, username: &str) -> Result<User> {
        self.get(&format!("/admin/users/{}", escape(username))).await
    }

    pub async fn create_user(&self, opt: &CreateUserOption) -> Result<User> {
        self.post("/admin/users", opt).await
    }

    pub async fn update_user(&self, username: &str, opt: &EditUserOption) -> Result<User> {
        self.patch(&format!("/admin/users/{}", escape(username)), opt)
            .await
    }

    pub async fn delete_user(&self, username: &str) -> Result<()> {
        self.delete(&format!("/admin/users/{}", escape(username))).await
    }

    pub async fn get_user_key(&self, username: &str, id: i64) -> Result<PublicKey> {
        self.get(&format!("/users/{}/keys/{}", escape(username), id))
            .await
    }

    pub async fn create_user_key(&self, username: &str, opt: &CreateKeyOption) -> Result<PublicKey> {
        self.post(&format!("/admin/users/{}/keys", escape(username)), opt)
            .await
    }

    /// Only the title can change; key material is immutable.
    pub async fn update_user_key(&self, username: &str, id: i64, opt: &EditKeyOption) -> Result<PublicKey> {
        self.patch(&format!("/users/{}/keys/{}", escape(username), id), opt)
            .await
    }

    pub async fn delete_user_key(&self, username: &str, id: i64) -> Result<()> {
        self.delete(&format!("/admin/users/{}/keys/{}", escape(username), id))
            .await
    }

    pub async fn get_access_token(&self, username: &str, id: i64) -> Result<AccessToken> {
        self.get(&format!("/users/{}/tokens/{}", escape(username), id))
            .await
    }

    pub async fn create_access_token(
        &self,
        username: &str,
        opt: &CreateAccessTokenOption,
    ) -> Result<AccessToken> {
        self.post(&format!("/users/{}/tokens", escape(username)), opt)
            .await
    }

    pub async fn update_access_token(
        &self,
        username: &str,
        id: i64,
        opt: &EditAccessTokenOption,
    ) -> Result<AccessToken> {
        self.patch(&format!("/users/{}/tokens/{}", escape(username), id), opt)
            .await
    }

    pub async fn delete_access_token(&self, username: &str, id: i64) -> Result<()> {
        self.delete(&format!("/users/{}/tokens/{}", escape(username), id))
            .await
    }
}
