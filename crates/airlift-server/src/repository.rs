// Copyright (c) 2026 Airlift Authors
//
// This file is part of Airlift.
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not
// use this file except in compliance with the License. You may obtain a copy
// at <https://www.apache.org/licenses/LICENSE-2.0>.
//
// This software is provided "AS IS", without warranty of any kind.

//! Artifact content storage.
//!
//! Uploads are streamed into a staging file while a SHA-256 digest is
//! computed over the bytes actually written - never taken from the caller.
//! Committing renames the staging file to its per-version location, so a
//! concurrent republish of the same version is last-writer-wins at the
//! rename, never a torn file.

use crate::error::{ApiError, Result};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::io::AsyncWriteExt;

const ARTIFACT_FILE_NAME: &str = "payload";

#[derive(Debug)]
pub struct ArtifactRepository {
    root: PathBuf,
    stage_counter: AtomicU64,
}

impl ArtifactRepository {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            stage_counter: AtomicU64::new(0),
        }
    }

    /// Storage location for a version's artifact.
    pub fn artifact_path(&self, version: &str) -> PathBuf {
        self.root.join(version).join(ARTIFACT_FILE_NAME)
    }

    /// Open a staging file for an incoming upload.
    pub async fn stage(&self) -> Result<StagedArtifact> {
        tokio::fs::create_dir_all(&self.root).await?;
        let seq = self.stage_counter.fetch_add(1, Ordering::Relaxed);
        let temp_path = self.root.join(format!("upload-{seq}.tmp"));
        let file = tokio::fs::File::create(&temp_path).await?;
        Ok(StagedArtifact {
            file,
            hasher: Sha256::new(),
            temp_path,
            bytes_written: 0,
        })
    }

    /// Move a fully written staging file into place for `version`.
    ///
    /// Returns the final path and the hex digest of the written bytes.
    pub async fn commit(
        &self,
        staged: StagedArtifact,
        version: &str,
    ) -> Result<(PathBuf, String)> {
        let StagedArtifact {
            mut file,
            hasher,
            temp_path,
            bytes_written,
        } = staged;

        file.flush().await?;
        file.sync_all().await?;
        drop(file);

        let final_path = self.artifact_path(version);
        if let Some(parent) = final_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        if let Err(e) = tokio::fs::rename(&temp_path, &final_path).await {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(ApiError::Persistence(format!(
                "failed to store artifact for {version}: {e}"
            )));
        }

        let digest = format!("{:x}", hasher.finalize());
        tracing::debug!(version, bytes = bytes_written, %digest, "Artifact stored");
        Ok((final_path, digest))
    }

    /// Drop an abandoned staging file.
    pub async fn discard(&self, staged: StagedArtifact) {
        let _ = tokio::fs::remove_file(&staged.temp_path).await;
    }

    /// Open a stored artifact for streaming.
    pub async fn open(&self, path: &Path) -> Result<tokio::fs::File> {
        tokio::fs::File::open(path).await.map_err(|e| {
            ApiError::Persistence(format!("artifact missing at {}: {e}", path.display()))
        })
    }
}

/// An upload in flight: bytes go to a temp file and into the digest.
#[derive(Debug)]
pub struct StagedArtifact {
    file: tokio::fs::File,
    hasher: Sha256,
    temp_path: PathBuf,
    bytes_written: u64,
}

impl StagedArtifact {
    pub async fn write_chunk(&mut self, chunk: &[u8]) -> Result<()> {
        self.file.write_all(chunk).await?;
        self.hasher.update(chunk);
        self.bytes_written += chunk.len() as u64;
        Ok(())
    }

    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }
}
