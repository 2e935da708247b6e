// Copyright (c) 2026 Airlift Authors
//
// This file is part of Airlift.
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not
// use this file except in compliance with the License. You may obtain a copy
// at <https://www.apache.org/licenses/LICENSE-2.0>.
//
// This software is provided "AS IS", without warranty of any kind.

//! Release catalog wire types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One published payload version, as exposed over the API.
///
/// The server keeps additional bookkeeping (where the artifact lives on
/// disk); that never crosses the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Release {
    /// Version string, e.g. "1.2.0" or "1.2.0-rc1".
    pub version: String,
    /// Distribution channel, e.g. "stable" or "beta".
    pub channel: String,
    /// Download locator, relative to the server base URL.
    pub url: String,
    /// Hex SHA-256 of the artifact bytes, computed by the server.
    pub sha256: String,
    #[serde(default)]
    pub notes: String,
    pub created_at: DateTime<Utc>,
}

/// Response to an agent's update check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckResponse {
    pub update_available: bool,
    pub latest: Option<Release>,
    pub message: String,
}

impl Release {
    /// Conventional filename hint for downloads of this release.
    pub fn download_filename(&self) -> String {
        format!("payload-{}", self.version)
    }
}
