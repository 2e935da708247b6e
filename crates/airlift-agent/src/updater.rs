// Copyright (c) 2026 Airlift Authors
//
// This file is part of Airlift.
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not
// use this file except in compliance with the License. You may obtain a copy
// at <https://www.apache.org/licenses/LICENSE-2.0>.
//
// This software is provided "AS IS", without warranty of any kind.

//! The update pipeline: check, download, verify, install, restart, record.

use crate::checker::UpdateClient;
use crate::config::AgentConfig;
use crate::downloader;
use crate::error::{AgentError, Result};
use crate::installer::Installer;
use crate::state;
use crate::supervisor::Supervisor;
use std::path::PathBuf;
use tracing::{debug, info};

const VERSION_RECORD: &str = "current_version";

#[derive(Debug)]
pub struct Updater {
    config: AgentConfig,
    client: UpdateClient,
    installer: Installer,
    supervisor: Supervisor,
    record_path: PathBuf,
}

impl Updater {
    pub fn new(config: AgentConfig) -> Self {
        let client = UpdateClient::new(config.server_url.clone());
        let installer = Installer::new(&config.install_dir);
        let record_path = config.install_dir.join(VERSION_RECORD);
        Self {
            config,
            client,
            installer,
            supervisor: Supervisor::new(),
            record_path,
        }
    }

    /// Launch the payload left behind by a previous run, if one is
    /// installed. Called once at startup.
    pub fn start_existing(&mut self) -> Result<()> {
        let indicator = self.installer.indicator_path();
        if std::fs::symlink_metadata(&indicator).is_err() {
            debug!("no installed payload yet");
            return Ok(());
        }
        info!(version = %state::read_current_version(&self.record_path), "starting installed payload");
        self.supervisor.start(&indicator)
    }

    /// One poll cycle. Each step runs to completion before the next; any
    /// failure aborts the cycle and leaves the recorded version untouched,
    /// so the next cycle retries the whole pipeline.
    pub async fn run_cycle(&mut self) -> Result<()> {
        let current = state::read_current_version(&self.record_path);
        let response = self
            .client
            .check(&self.config.channel, &current, &self.config.device_id)
            .await?;

        if !response.update_available {
            debug!(%current, "payload is up to date");
            return Ok(());
        }
        let release = response.latest.ok_or_else(|| {
            AgentError::Check("server reported an update without a release".to_owned())
        })?;
        info!(%current, latest = %release.version, "update available");

        let downloaded =
            downloader::download_and_verify(&self.client, &release, &self.config.install_dir)
                .await?;
        let indicator = self.installer.install(&downloaded, &release.version).await?;
        self.supervisor.restart(&indicator).await?;

        // Only a confirmed restart advances the record; a crash before
        // this point re-runs the pipeline on the next cycle.
        state::record_current_version(&self.record_path, &release.version)?;
        info!(version = %release.version, "update complete");
        Ok(())
    }

    /// Stop the supervised payload. Called on shutdown.
    pub async fn shutdown(&mut self) -> Result<()> {
        self.supervisor.stop().await
    }
}
