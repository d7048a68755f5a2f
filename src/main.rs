// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use anyhow::Result;
use kube::Client;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use provider_gitea::config::Config;
use provider_gitea::constants::API_GROUP;
use provider_gitea::kubernetes::wait_for_crds;
use provider_gitea::registry;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing, RUST_LOG overrides the default level
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting Gitea provider");

    // Load configuration
    let config = Config::from_env()?;
    info!(
        "Configuration loaded: poll_interval={:?}, max_concurrent_reconciles={}",
        config.poll_interval, config.max_concurrent_reconciles
    );

    // Create Kubernetes client
    let client = Client::try_default().await?;
    info!("Connected to Kubernetes cluster");

    // Wait for our CRDs before starting controllers
    info!("Waiting for {} CRDs to become available...", API_GROUP);
    wait_for_crds(&client, &registry::required_kinds()).await?;

    registry::run(client, config).await?;

    // This should never be reached as controllers run forever
    warn!("All controllers stopped unexpectedly");
    Ok(())
}
