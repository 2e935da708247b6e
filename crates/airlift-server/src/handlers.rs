// Copyright (c) 2026 Airlift Authors
//
// This file is part of Airlift.
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not
// use this file except in compliance with the License. You may obtain a copy
// at <https://www.apache.org/licenses/LICENSE-2.0>.
//
// This software is provided "AS IS", without warranty of any kind.

//! HTTP handlers for the release API.

use std::collections::HashMap;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::{DefaultBodyLimit, Multipart, Path, Query, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tokio_util::io::ReaderStream;
use tracing::info;

use airlift_shared::{CheckResponse, Release};

use crate::error::{ApiError, Result};
use crate::repository::{ArtifactRepository, StagedArtifact};
use crate::store::{DEFAULT_CHANNEL, ReleaseStore};

#[derive(Debug, Clone)]
pub struct AppState {
    pub store: Arc<ReleaseStore>,
    pub repository: Arc<ArtifactRepository>,
}

/// Build the API router.
pub fn router(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/api/v1/check", get(check_handler))
        .route("/api/v1/publish", post(publish_handler))
        .route("/api/v1/releases", get(releases_handler))
        .route("/download/{version}", get(download_handler))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
pub struct CheckParams {
    pub channel: Option<String>,
    pub current: Option<String>,
    pub device_id: Option<String>,
}

pub async fn check_handler(
    State(state): State<AppState>,
    Query(params): Query<CheckParams>,
) -> Result<Json<CheckResponse>> {
    let channel = params
        .channel
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| DEFAULT_CHANNEL.to_owned());
    let current = params.current.unwrap_or_default();

    let response = state.store.check(&channel, &current)?;
    info!(
        channel,
        current,
        device_id = params.device_id.as_deref().unwrap_or(""),
        update_available = response.update_available,
        "Update check"
    );
    Ok(Json(response))
}

pub async fn publish_handler(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<Release>> {
    let mut version = String::new();
    let mut channel = String::new();
    let mut notes = String::new();
    let mut staged: Option<StagedArtifact> = None;

    let outcome = read_publish_fields(
        &state.repository,
        &mut multipart,
        &mut version,
        &mut channel,
        &mut notes,
        &mut staged,
    )
    .await;

    // Reject before any catalog mutation; drop whatever was staged.
    if let Err(e) = outcome {
        if let Some(staged) = staged.take() {
            state.repository.discard(staged).await;
        }
        return Err(e);
    }

    let version = version.trim().to_owned();
    if version.is_empty() {
        if let Some(staged) = staged.take() {
            state.repository.discard(staged).await;
        }
        return Err(ApiError::Validation("version is required".to_owned()));
    }
    let Some(staged) = staged.take() else {
        return Err(ApiError::Validation("missing file".to_owned()));
    };

    let (artifact_path, digest) = state.repository.commit(staged, &version).await?;
    let release = state.store.publish(
        &version,
        channel.trim(),
        notes.trim(),
        artifact_path,
        digest,
    )?;

    info!(
        version = %release.version,
        channel = %release.channel,
        sha256 = %release.sha256,
        "Release published"
    );
    Ok(Json(release))
}

async fn read_publish_fields(
    repository: &ArtifactRepository,
    multipart: &mut Multipart,
    version: &mut String,
    channel: &mut String,
    notes: &mut String,
    staged: &mut Option<StagedArtifact>,
) -> Result<()> {
    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::Validation(format!("invalid multipart request: {e}")))?
    {
        match field.name().unwrap_or("") {
            "version" => *version = read_text(field).await?,
            "channel" => *channel = read_text(field).await?,
            "notes" => *notes = read_text(field).await?,
            "file" => {
                let mut upload = repository.stage().await?;
                while let Some(chunk) = field
                    .chunk()
                    .await
                    .map_err(|e| ApiError::Validation(format!("upload aborted: {e}")))?
                {
                    upload.write_chunk(&chunk).await?;
                }
                *staged = Some(upload);
            }
            other => {
                tracing::debug!(field = other, "Ignoring unknown publish field");
            }
        }
    }
    Ok(())
}

async fn read_text(field: axum::extract::multipart::Field<'_>) -> Result<String> {
    field
        .text()
        .await
        .map_err(|e| ApiError::Validation(format!("invalid multipart field: {e}")))
}

pub async fn download_handler(
    State(state): State<AppState>,
    Path(version): Path<String>,
) -> Result<impl IntoResponse> {
    // Resolve under the read lock; stream the bytes outside any lock.
    // Artifacts are immutable once published, so the file does not change
    // under the stream (a same-version republish racing a download is an
    // accepted rarity).
    let (release, artifact_path) = state.store.resolve(&version)?;
    let file = state.repository.open(&artifact_path).await?;

    info!(version = %release.version, "Artifact download");
    let body = Body::from_stream(ReaderStream::new(file));
    Ok((
        [
            (header::CONTENT_TYPE, "application/octet-stream".to_owned()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", release.download_filename()),
            ),
        ],
        body,
    ))
}

#[derive(Debug, Serialize)]
pub struct CatalogResponse {
    pub releases: Vec<Release>,
    pub latest_by_channel: HashMap<String, String>,
}

pub async fn releases_handler(State(state): State<AppState>) -> Json<CatalogResponse> {
    let (releases, latest_by_channel) = state.store.catalog();
    Json(CatalogResponse {
        releases,
        latest_by_channel,
    })
}
