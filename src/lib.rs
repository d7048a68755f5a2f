// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
pub mod config;
pub mod constants;
pub mod crd;
pub mod error;
pub mod external_name;
pub mod gitea;
pub mod kubernetes;
pub mod reconcilers;
pub mod registry;
pub mod secrets;

#[cfg(test)]
mod test_utils;
