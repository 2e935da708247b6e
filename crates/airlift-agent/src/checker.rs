// Copyright (c) 2026 Airlift Authors
//
// This file is part of Airlift.
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not
// use this file except in compliance with the License. You may obtain a copy
// at <https://www.apache.org/licenses/LICENSE-2.0>.
//
// This software is provided "AS IS", without warranty of any kind.

//! HTTP client for the server's release API.

use crate::error::{AgentError, Result};
use airlift_shared::CheckResponse;

const USER_AGENT: &str = concat!("airlift-agent/", env!("CARGO_PKG_VERSION"));

/// Client for update checks and artifact downloads.
///
/// Requests carry no timeout: the poll loop is strictly sequential and a
/// stalled call stalls only the current cycle.
#[derive(Debug)]
pub struct UpdateClient {
    http: reqwest::Client,
    base_url: String,
}

impl UpdateClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_owned();
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_default();
        Self { http, base_url }
    }

    /// Ask the server whether a newer release exists on `channel`.
    pub async fn check(
        &self,
        channel: &str,
        current: &str,
        device_id: &str,
    ) -> Result<CheckResponse> {
        let url = format!("{}/api/v1/check", self.base_url);
        let response = self
            .http
            .get(&url)
            .query(&[
                ("channel", channel),
                ("current", current),
                ("device_id", device_id),
            ])
            .send()
            .await
            .map_err(|e| AgentError::Check(format!("request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "failed to read error body".to_owned());
            return Err(AgentError::Check(format!("server returned {status}: {body}")));
        }

        response
            .json()
            .await
            .map_err(|e| AgentError::Check(format!("failed to parse response: {e}")))
    }

    /// Open a download stream for a release's artifact.
    ///
    /// `locator` is the opaque `url` from the release record; relative
    /// locators are resolved against the server base URL.
    pub async fn fetch_artifact(&self, locator: &str) -> Result<reqwest::Response> {
        let url = if locator.starts_with("http://") || locator.starts_with("https://") {
            locator.to_owned()
        } else {
            format!("{}{locator}", self.base_url)
        };

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| AgentError::Download(format!("request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(AgentError::Download(format!(
                "download failed with status: {status}"
            )));
        }
        Ok(response)
    }
}
