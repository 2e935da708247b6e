// Copyright (c) 2026 Airlift Authors
//
// This file is part of Airlift.
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not
// use this file except in compliance with the License. You may obtain a copy
// at <https://www.apache.org/licenses/LICENSE-2.0>.
//
// This software is provided "AS IS", without warranty of any kind.

//! Payload installation and the active-version indicator.
//!
//! Installed payloads live side by side as `payload_<version>` and the
//! symlink `payload_current` names the active one. The symlink is swapped
//! by creating a temporary link and renaming it over the old one, so a
//! reader always sees either the old target or the new target, never a
//! missing indicator.

use crate::error::{AgentError, Result};
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tracing::info;

const INDICATOR_NAME: &str = "payload_current";

#[derive(Debug, Clone)]
pub struct Installer {
    install_dir: PathBuf,
}

impl Installer {
    pub fn new(install_dir: impl Into<PathBuf>) -> Self {
        Self {
            install_dir: install_dir.into(),
        }
    }

    /// Path of the installed payload for `version`.
    pub fn payload_path(&self, version: &str) -> PathBuf {
        self.install_dir.join(format!("payload_{version}"))
    }

    /// Path of the active-version symlink.
    pub fn indicator_path(&self) -> PathBuf {
        self.install_dir.join(INDICATOR_NAME)
    }

    /// Move a verified download into place as `payload_<version>`, mark it
    /// executable and point the indicator at it.
    ///
    /// Returns the indicator path, which is what the supervisor executes.
    pub async fn install(&self, downloaded: &Path, version: &str) -> Result<PathBuf> {
        let payload = self.payload_path(version);

        tokio::fs::rename(downloaded, &payload)
            .await
            .map_err(|e| AgentError::Install(format!("failed to move payload into place: {e}")))?;

        let mut perms = tokio::fs::metadata(&payload).await?.permissions();
        perms.set_mode(0o755);
        tokio::fs::set_permissions(&payload, perms)
            .await
            .map_err(|e| AgentError::Install(format!("failed to mark payload executable: {e}")))?;

        self.swap_indicator(&payload).await?;
        info!(version, payload = %payload.display(), "payload installed");
        Ok(self.indicator_path())
    }

    /// Atomically repoint `payload_current` at `target`.
    async fn swap_indicator(&self, target: &Path) -> Result<()> {
        let indicator = self.indicator_path();
        let staging = self.install_dir.join(format!("{INDICATOR_NAME}.tmp"));

        // A stale staging link from an interrupted earlier swap would make
        // symlink creation fail.
        match tokio::fs::remove_file(&staging).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        tokio::fs::symlink(target, &staging)
            .await
            .map_err(|e| AgentError::Install(format!("failed to create indicator link: {e}")))?;
        tokio::fs::rename(&staging, &indicator)
            .await
            .map_err(|e| AgentError::Install(format!("failed to swap indicator link: {e}")))?;
        Ok(())
    }
}
