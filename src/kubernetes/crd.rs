// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! CRD availability checking utilities

use crate::constants::crd::{POLL_INTERVAL_SECS, POLL_MAX_INTERVAL_SECS};
use crate::constants::{API_GROUP, API_VERSION};
use crate::error::Result;
use kube::{discovery::Discovery, Client};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

/// Wait until every kind in `required` is served under the provider's API group.
/// This uses exponential backoff starting at POLL_INTERVAL_SECS seconds.
pub async fn wait_for_crds(client: &Client, required: &[String]) -> Result<()> {
    let mut interval = POLL_INTERVAL_SECS;

    loop {
        match served_kinds(client).await {
            Ok(served) => {
                let missing = missing_kinds(required, &served);
                if missing.is_empty() {
                    info!("All {} kinds of {}/{} are available", required.len(), API_GROUP, API_VERSION);
                    return Ok(());
                }
                info!(
                    "Kinds {} of {}/{} not yet available, waiting {} seconds...",
                    missing.join(", "),
                    API_GROUP,
                    API_VERSION,
                    interval
                );
            }
            Err(e) => {
                warn!(
                    "Error discovering {}: {}, retrying in {} seconds...",
                    API_GROUP, e, interval
                );
            }
        }

        sleep(Duration::from_secs(interval)).await;

        // Exponential backoff with max cap
        interval = (interval * 2).min(POLL_MAX_INTERVAL_SECS);
    }
}

/// Kinds the API server currently serves for the provider's group and version.
pub async fn served_kinds(client: &Client) -> Result<Vec<String>> {
    let discovery = Discovery::new(client.clone())
        .filter(&[API_GROUP])
        .run()
        .await?;

    let mut kinds = Vec::new();
    for group in discovery.groups() {
        if group.name() != API_GROUP {
            continue;
        }
        for (ar, _) in group.recommended_resources() {
            if ar.version == API_VERSION {
                kinds.push(ar.kind);
            }
        }
    }
    Ok(kinds)
}

/// Required kinds absent from `served`, in the order they were required.
pub fn missing_kinds(required: &[String], served: &[String]) -> Vec<String> {
    required
        .iter()
        .filter(|kind| !served.contains(kind))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_missing_kinds() {
        let required = kinds(&["Repository", "Team", "Runner"]);
        assert_eq!(
            missing_kinds(&required, &kinds(&["Team"])),
            kinds(&["Repository", "Runner"])
        );
        assert!(missing_kinds(&required, &kinds(&["Runner", "Team", "Repository", "User"])).is_empty());
    }

    #[test]
    fn test_nothing_served() {
        let required = kinds(&["ProviderConfig"]);
        assert_eq!(missing_kinds(&required, &[]), required);
    }
}
