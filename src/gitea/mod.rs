// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Gitea REST API transport and typed client.

pub mod actions;
pub mod client;
pub mod orgs;
pub mod repos;
pub mod transport;
pub mod types;
pub mod users;

pub use client::{split_repository, GiteaClient, RunnerScope};
pub use transport::{ReqwestTransport, Transport};
