// Copyright (c) 2026 Airlift Authors
//
// This file is part of Airlift.
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not
// use this file except in compliance with the License. You may obtain a copy
// at <https://www.apache.org/licenses/LICENSE-2.0>.
//
// This software is provided "AS IS", without warranty of any kind.

use std::path::Path;
use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use airlift_server::config::ServerConfig;
use airlift_server::handlers::{self, AppState};
use airlift_server::repository::ArtifactRepository;
use airlift_server::store::ReleaseStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("airlift_server=info")),
        )
        .init();

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "server_config.toml".to_owned());
    let config = if Path::new(&config_path).exists() {
        info!(path = %config_path, "Loading configuration");
        ServerConfig::from_file(&config_path)?
    } else {
        info!(path = %config_path, "No config file found, using defaults");
        ServerConfig::default()
    };

    std::fs::create_dir_all(&config.storage.data_dir)?;
    std::fs::create_dir_all(&config.storage.artifact_dir)?;

    let snapshot_path = Path::new(&config.storage.data_dir).join("releases.json");
    let store = Arc::new(ReleaseStore::open(snapshot_path)?);
    let repository = Arc::new(ArtifactRepository::new(&config.storage.artifact_dir));

    let app = handlers::router(
        AppState { store, repository },
        config.limits.max_upload_bytes,
    );

    let addr = format!("{}:{}", config.server.bind_address, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Airlift server listening on {addr}");
    axum::serve(listener, app).await?;

    Ok(())
}
