// Copyright (c) 2026 Airlift Authors
//
// This file is part of Airlift.
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not
// use this file except in compliance with the License. You may obtain a copy
// at <https://www.apache.org/licenses/LICENSE-2.0>.
//
// This software is provided "AS IS", without warranty of any kind.

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct ServerConfig {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub storage: StorageSettings,
    #[serde(default)]
    pub limits: LimitSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    /// Directory holding the release-store snapshot.
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    /// Directory holding one subdirectory per published version.
    #[serde(default = "default_artifact_dir")]
    pub artifact_dir: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LimitSettings {
    /// Maximum accepted upload size for a publish request, in bytes.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

fn default_bind_address() -> String {
    "0.0.0.0".to_owned()
}

fn default_port() -> u16 {
    8200
}

fn default_data_dir() -> String {
    "./data".to_owned()
}

fn default_artifact_dir() -> String {
    "./artifacts".to_owned()
}

fn default_max_upload_bytes() -> usize {
    100 << 20 // 100 MiB
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            artifact_dir: default_artifact_dir(),
        }
    }
}

impl Default for LimitSettings {
    fn default() -> Self {
        Self {
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

impl ServerConfig {
    pub fn from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(Path::new(path))
            .with_context(|| format!("Failed to read config file: {path}"))?;
        let config: Self =
            toml::from_str(&content).with_context(|| "Failed to parse config TOML")?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.storage.data_dir.is_empty() {
            bail!("storage.data_dir must not be empty");
        }
        if self.storage.artifact_dir.is_empty() {
            bail!("storage.artifact_dir must not be empty");
        }
        if self.limits.max_upload_bytes == 0 {
            bail!("limits.max_upload_bytes must be positive");
        }
        Ok(())
    }
}
