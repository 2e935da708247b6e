// Copyright (c) 2026 Airlift Authors
//
// This file is part of Airlift.
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not
// use this file except in compliance with the License. You may obtain a copy
// at <https://www.apache.org/licenses/LICENSE-2.0>.
//
// This software is provided "AS IS", without warranty of any kind.

//! The release store: version -> release metadata and channel -> latest.
//!
//! A single reader/writer lock guards both maps. `publish` holds the write
//! lock across the in-memory mutation and the snapshot write, so a check
//! never runs between a mutation and its snapshot. Invariant: every value
//! in `latest_by_channel` is a key of `releases_by_version`.

use crate::error::{ApiError, Result};
use airlift_shared::{CheckResponse, Release, is_newer};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

pub const DEFAULT_CHANNEL: &str = "stable";

/// A release plus the server-side location of its artifact. The path stays
/// out of every API response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredRelease {
    #[serde(flatten)]
    pub release: Release,
    pub artifact_path: PathBuf,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreInner {
    releases_by_version: HashMap<String, StoredRelease>,
    latest_by_channel: HashMap<String, String>,
}

#[derive(Debug)]
pub struct ReleaseStore {
    inner: RwLock<StoreInner>,
    snapshot_path: PathBuf,
}

impl ReleaseStore {
    /// Open the store, loading the last good snapshot if one exists.
    pub fn open(snapshot_path: impl Into<PathBuf>) -> Result<Self> {
        let snapshot_path = snapshot_path.into();
        let mut inner = if snapshot_path.exists() {
            let content = std::fs::read_to_string(&snapshot_path)?;
            serde_json::from_str::<StoreInner>(&content)?
        } else {
            StoreInner::default()
        };

        // A snapshot written by a buggy or older build could name a latest
        // version that has no release record; drop such entries on load.
        inner.latest_by_channel.retain(|channel, version| {
            let known = inner.releases_by_version.contains_key(version);
            if !known {
                tracing::warn!(channel, version, "Dropping dangling latest pointer");
            }
            known
        });

        Ok(Self {
            inner: RwLock::new(inner),
            snapshot_path,
        })
    }

    /// Record a published release and point the channel's latest at it.
    ///
    /// The caller has already stored the artifact and computed its digest.
    /// The latest pointer is overwritten unconditionally: republishing an
    /// older version as a channel's latest is allowed. On snapshot failure
    /// the in-memory mutation is kept; retrying the same publish is
    /// idempotent and heals the discrepancy.
    pub fn publish(
        &self,
        version: &str,
        channel: &str,
        notes: &str,
        artifact_path: PathBuf,
        sha256: String,
    ) -> Result<Release> {
        let channel = if channel.is_empty() {
            DEFAULT_CHANNEL
        } else {
            channel
        };

        let release = Release {
            version: version.to_owned(),
            channel: channel.to_owned(),
            url: format!("/download/{version}"),
            sha256,
            notes: notes.to_owned(),
            created_at: Utc::now(),
        };

        let mut inner = self.inner.write().expect("release store lock poisoned");
        inner.releases_by_version.insert(
            version.to_owned(),
            StoredRelease {
                release: release.clone(),
                artifact_path,
            },
        );
        inner
            .latest_by_channel
            .insert(channel.to_owned(), version.to_owned());

        self.persist(&inner)?;
        Ok(release)
    }

    /// Answer an update check against the channel's latest release.
    pub fn check(&self, channel: &str, current: &str) -> Result<CheckResponse> {
        let inner = self.inner.read().expect("release store lock poisoned");

        let latest_version = inner
            .latest_by_channel
            .get(channel)
            .ok_or_else(|| ApiError::NotFound(format!("no release in channel {channel}")))?;
        let latest = inner
            .releases_by_version
            .get(latest_version)
            .ok_or_else(|| {
                ApiError::Internal(format!("latest pointer {latest_version} has no release"))
            })?;

        let update_available = current.is_empty() || is_newer(&latest.release.version, current);
        Ok(CheckResponse {
            update_available,
            latest: Some(latest.release.clone()),
            message: if update_available {
                "new version available".to_owned()
            } else {
                "up to date".to_owned()
            },
        })
    }

    /// Resolve a version to its release record and artifact location.
    pub fn resolve(&self, version: &str) -> Result<(Release, PathBuf)> {
        let inner = self.inner.read().expect("release store lock poisoned");
        inner
            .releases_by_version
            .get(version)
            .map(|stored| (stored.release.clone(), stored.artifact_path.clone()))
            .ok_or_else(|| ApiError::NotFound(format!("unknown version {version}")))
    }

    /// All releases plus the channel -> latest mapping, for the catalog view.
    pub fn catalog(&self) -> (Vec<Release>, HashMap<String, String>) {
        let inner = self.inner.read().expect("release store lock poisoned");
        let mut releases: Vec<Release> = inner
            .releases_by_version
            .values()
            .map(|stored| stored.release.clone())
            .collect();
        releases.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        (releases, inner.latest_by_channel.clone())
    }

    /// Write the full snapshot via temp-file-then-rename. Called with the
    /// write lock held.
    fn persist(&self, inner: &StoreInner) -> Result<()> {
        if let Some(parent) = self.snapshot_path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let temp_path = self.snapshot_path.with_extension("tmp");
        let content = serde_json::to_string_pretty(inner)?;
        std::fs::write(&temp_path, content)?;
        std::fs::rename(&temp_path, &self.snapshot_path)?;
        Ok(())
    }

    pub fn snapshot_path(&self) -> &Path {
        &self.snapshot_path
    }
}
