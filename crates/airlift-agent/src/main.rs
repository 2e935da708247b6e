// Copyright (c) 2026 Airlift Authors
//
// This file is part of Airlift.
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not
// use this file except in compliance with the License. You may obtain a copy
// at <https://www.apache.org/licenses/LICENSE-2.0>.
//
// This software is provided "AS IS", without warranty of any kind.

use airlift_agent::{AgentConfig, Updater};
use anyhow::Context;
use std::path::Path;
use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("airlift_agent=info")),
        )
        .init();

    let config_path = std::env::args()
        .nth(1)
        .context("usage: airlift-agent <config.json>")?;
    let config = AgentConfig::load(Path::new(&config_path))
        .with_context(|| format!("failed to load config from {config_path}"))?;
    std::fs::create_dir_all(&config.install_dir)
        .with_context(|| format!("failed to create {}", config.install_dir.display()))?;

    info!(
        server = %config.server_url,
        channel = %config.channel,
        device = %config.device_id,
        "airlift agent starting"
    );

    let interval = config.check_interval();
    let mut updater = Updater::new(config);
    if let Err(e) = updater.start_existing() {
        error!(error = %e, "failed to start installed payload");
    }

    let mut sigterm = signal(SignalKind::terminate())?;
    // First tick fires immediately, so a fresh agent checks right away.
    let mut ticker = tokio::time::interval(interval);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if let Err(e) = updater.run_cycle().await {
                    error!(error = %e, "update cycle failed");
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("interrupt received, shutting down");
                break;
            }
            _ = sigterm.recv() => {
                info!("SIGTERM received, shutting down");
                break;
            }
        }
    }

    updater.shutdown().await?;
    Ok(())
}
