// Copyright (c) 2026 Airlift Authors
//
// This file is part of Airlift.
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not
// use this file except in compliance with the License. You may obtain a copy
// at <https://www.apache.org/licenses/LICENSE-2.0>.
//
// This software is provided "AS IS", without warranty of any kind.

//! Artifact download with streaming SHA-256 verification.

use crate::checker::UpdateClient;
use crate::error::{AgentError, Result};
use airlift_shared::Release;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

/// Name of the in-progress download for `version` inside the install dir.
pub fn download_path(install_dir: &Path, version: &str) -> PathBuf {
    install_dir.join(format!("download_{version}"))
}

/// Download a release's artifact into the install directory and verify its
/// digest.
///
/// Bytes are hashed as they are written, so the artifact is read exactly
/// once. On any failure the partial file is removed; a digest mismatch is
/// reported as [`AgentError::DigestMismatch`] and never leaves bytes on
/// disk. Returns the path of the verified temporary file, which the
/// installer moves into place.
pub async fn download_and_verify(
    client: &UpdateClient,
    release: &Release,
    install_dir: &Path,
) -> Result<PathBuf> {
    let dest = download_path(install_dir, &release.version);
    info!(version = %release.version, url = %release.url, "downloading update");

    let mut response = client.fetch_artifact(&release.url).await?;

    let mut file = tokio::fs::File::create(&dest).await?;
    let mut hasher = Sha256::new();
    let mut total: u64 = 0;

    loop {
        let chunk = match response.chunk().await {
            Ok(Some(chunk)) => chunk,
            Ok(None) => break,
            Err(e) => {
                drop(file);
                remove_partial(&dest).await;
                return Err(AgentError::Download(format!("stream failed: {e}")));
            }
        };
        hasher.update(&chunk);
        if let Err(e) = file.write_all(&chunk).await {
            drop(file);
            remove_partial(&dest).await;
            return Err(e.into());
        }
        total += chunk.len() as u64;
    }

    file.flush().await?;
    file.sync_all().await?;
    drop(file);

    let actual = format!("{:x}", hasher.finalize());
    let expected = release.sha256.to_lowercase();
    if actual != expected {
        remove_partial(&dest).await;
        return Err(AgentError::DigestMismatch { expected, actual });
    }

    debug!(version = %release.version, bytes = total, "download verified");
    Ok(dest)
}

async fn remove_partial(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        warn!(path = %path.display(), error = %e, "failed to remove partial download");
    }
}
