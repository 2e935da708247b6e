// Copyright (c) 2026 Airlift Authors
//
// This file is part of Airlift.
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not
// use this file except in compliance with the License. You may obtain a copy
// at <https://www.apache.org/licenses/LICENSE-2.0>.
//
// This software is provided "AS IS", without warranty of any kind.

//! Agent configuration.

use crate::error::{AgentError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_CHECK_INTERVAL_SECS: i64 = 10;

fn default_channel() -> String {
    "stable".to_owned()
}

fn default_check_interval() -> i64 {
    DEFAULT_CHECK_INTERVAL_SECS
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Base URL of the Airlift server, e.g. "http://10.0.0.5:8200".
    pub server_url: String,

    /// Identifier this device reports on every check.
    pub device_id: String,

    /// Release channel to track.
    #[serde(default = "default_channel")]
    pub channel: String,

    /// Directory holding downloads, installed payloads, the active-version
    /// symlink and the current-version record. Must be one filesystem so
    /// renames within it are atomic.
    pub install_dir: PathBuf,

    /// Seconds between update checks; non-positive falls back to the
    /// default.
    #[serde(default = "default_check_interval")]
    pub check_interval_secs: i64,
}

impl AgentConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)
            .map_err(|e| AgentError::Config(format!("Failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.server_url.is_empty() {
            return Err(AgentError::Config("server_url must be set".to_owned()));
        }
        if self.install_dir.as_os_str().is_empty() {
            return Err(AgentError::Config("install_dir must be set".to_owned()));
        }
        Ok(())
    }

    /// Poll interval with the non-positive fallback applied.
    pub fn check_interval(&self) -> Duration {
        let secs = if self.check_interval_secs > 0 {
            self.check_interval_secs
        } else {
            DEFAULT_CHECK_INTERVAL_SECS
        };
        Duration::from_secs(secs.unsigned_abs())
    }
}
