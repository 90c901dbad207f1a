// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use anyhow::Result;
use kube::Client;
use tracing::info;
use tracing_subscriber::EnvFilter;

use lightspeed_operator::config::Config;
use lightspeed_operator::kubernetes::wait_for_olsconfig_crd;
use lightspeed_operator::reconcilers::OLSConfigReconciler;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting Lightspeed operator");

    // Load configuration
    let config = Config::from_env()?;
    info!(
        "Configuration loaded: app_server_image={}, watch_namespace={}",
        config.app_server_image,
        config.watch_namespace.as_deref().unwrap_or("<all>")
    );

    // Create Kubernetes client
    let client = Client::try_default().await?;
    info!("Connected to Kubernetes cluster");

    info!("Waiting for OLSConfig CRD to become available...");
    wait_for_olsconfig_crd(&client).await?;

    // Runs until SIGTERM/SIGINT
    OLSConfigReconciler::new(client, config).run().await?;

    info!("Lightspeed operator stopped");
    Ok(())
}
