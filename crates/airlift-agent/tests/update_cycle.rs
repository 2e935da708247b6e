// Copyright (c) 2026 Airlift Authors
//
// This file is part of Airlift.
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not
// use this file except in compliance with the License. You may obtain a copy
// at <https://www.apache.org/licenses/LICENSE-2.0>.
//
// This software is provided "AS IS", without warranty of any kind.

//! End-to-end agent pipeline tests against a mock server.

use airlift_agent::{AgentConfig, AgentError, Updater};
use airlift_shared::{CheckResponse, Release};
use chrono::Utc;
use mockito::{Matcher, Server, ServerGuard};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;

fn agent_config(server_url: &str, install_dir: &Path) -> AgentConfig {
    AgentConfig {
        server_url: server_url.to_owned(),
        device_id: "test-device".to_owned(),
        channel: "stable".to_owned(),
        install_dir: install_dir.to_owned(),
        check_interval_secs: 1,
    }
}

fn release(version: &str, payload: &[u8]) -> Release {
    Release {
        version: version.to_owned(),
        channel: "stable".to_owned(),
        url: format!("/download/{version}"),
        sha256: format!("{:x}", Sha256::digest(payload)),
        notes: String::new(),
        created_at: Utc::now(),
    }
}

fn check_body(latest: Option<Release>) -> String {
    let update_available = latest.is_some();
    serde_json::to_string(&CheckResponse {
        update_available,
        latest,
        message: if update_available {
            "new version available".to_owned()
        } else {
            "up to date".to_owned()
        },
    })
    .unwrap()
}

async fn mock_check(server: &mut ServerGuard, current: &str, latest: Option<Release>) {
    server
        .mock("GET", "/api/v1/check")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("channel".into(), "stable".into()),
            Matcher::UrlEncoded("current".into(), current.into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(check_body(latest))
        .create_async()
        .await;
}

async fn mock_artifact(server: &mut ServerGuard, version: &str, body: &[u8]) {
    server
        .mock("GET", format!("/download/{version}").as_str())
        .with_status(200)
        .with_body(body)
        .create_async()
        .await;
}

/// Payload that records its start and then idles, so tests can observe it.
fn marker_payload(install_dir: &Path) -> Vec<u8> {
    format!(
        "#!/bin/sh\ntouch {}/started\nsleep 30\n",
        install_dir.display()
    )
    .into_bytes()
}

async fn wait_for(path: &PathBuf) -> bool {
    for _ in 0..50 {
        if path.exists() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    false
}

#[tokio::test]
async fn test_full_update_cycle() {
    let mut server = Server::new_async().await;
    let dir = TempDir::new().unwrap();

    let payload = marker_payload(dir.path());
    mock_check(&mut server, "", Some(release("1.0.0", &payload))).await;
    mock_artifact(&mut server, "1.0.0", &payload).await;

    let mut updater = Updater::new(agent_config(&server.url(), dir.path()));
    updater.run_cycle().await.unwrap();

    let installed = dir.path().join("payload_1.0.0");
    assert!(installed.exists());
    assert_eq!(
        std::fs::read_link(dir.path().join("payload_current")).unwrap(),
        installed
    );
    assert_eq!(
        std::fs::read_to_string(dir.path().join("current_version")).unwrap(),
        "1.0.0"
    );
    // Temp download is gone.
    assert!(!dir.path().join("download_1.0.0").exists());
    // Payload actually ran.
    assert!(wait_for(&dir.path().join("started")).await);

    updater.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_up_to_date_cycle_is_a_no_op() {
    let mut server = Server::new_async().await;
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("current_version"), "2.0.0").unwrap();

    mock_check(&mut server, "2.0.0", None).await;

    let mut updater = Updater::new(agent_config(&server.url(), dir.path()));
    updater.run_cycle().await.unwrap();

    assert!(!dir.path().join("payload_current").exists());
    assert_eq!(
        std::fs::read_to_string(dir.path().join("current_version")).unwrap(),
        "2.0.0"
    );
}

#[tokio::test]
async fn test_tampered_artifact_is_rejected() {
    let mut server = Server::new_async().await;
    let dir = TempDir::new().unwrap();

    // Digest declared for one body, bytes served from another.
    let declared = marker_payload(dir.path());
    mock_check(&mut server, "", Some(release("1.0.0", &declared))).await;
    mock_artifact(&mut server, "1.0.0", b"#!/bin/sh\necho tampered\n").await;

    let mut updater = Updater::new(agent_config(&server.url(), dir.path()));
    let err = updater.run_cycle().await.unwrap_err();
    assert!(matches!(err, AgentError::DigestMismatch { .. }));

    // Nothing was installed, recorded or left behind.
    assert!(!dir.path().join("payload_1.0.0").exists());
    assert!(!dir.path().join("download_1.0.0").exists());
    assert!(!dir.path().join("payload_current").exists());
    assert!(!dir.path().join("current_version").exists());
}

#[tokio::test]
async fn test_failed_cycle_retries_from_scratch() {
    let mut server = Server::new_async().await;
    let dir = TempDir::new().unwrap();

    let payload = marker_payload(dir.path());
    let rel = release("1.0.0", &payload);

    // First attempt: artifact endpoint is down.
    mock_check(&mut server, "", Some(rel.clone())).await;
    let broken = server
        .mock("GET", "/download/1.0.0")
        .with_status(500)
        .expect(1)
        .create_async()
        .await;

    let mut updater = Updater::new(agent_config(&server.url(), dir.path()));
    assert!(updater.run_cycle().await.is_err());
    assert!(!dir.path().join("current_version").exists());
    broken.assert_async().await;

    // Next cycle: same check result, artifact now served.
    mock_check(&mut server, "", Some(rel)).await;
    mock_artifact(&mut server, "1.0.0", &payload).await;

    updater.run_cycle().await.unwrap();
    assert_eq!(
        std::fs::read_to_string(dir.path().join("current_version")).unwrap(),
        "1.0.0"
    );

    updater.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_upgrade_replaces_running_payload() {
    let mut server = Server::new_async().await;
    let dir = TempDir::new().unwrap();

    let v1 = format!(
        "#!/bin/sh\ntouch {}/v1_started\nsleep 30\n",
        dir.path().display()
    )
    .into_bytes();
    let v2 = format!(
        "#!/bin/sh\ntouch {}/v2_started\nsleep 30\n",
        dir.path().display()
    )
    .into_bytes();

    mock_check(&mut server, "", Some(release("1.0.0", &v1))).await;
    mock_artifact(&mut server, "1.0.0", &v1).await;
    mock_check(&mut server, "1.0.0", Some(release("1.1.0", &v2))).await;
    mock_artifact(&mut server, "1.1.0", &v2).await;

    let mut updater = Updater::new(agent_config(&server.url(), dir.path()));
    updater.run_cycle().await.unwrap();
    assert!(wait_for(&dir.path().join("v1_started")).await);

    updater.run_cycle().await.unwrap();
    assert!(wait_for(&dir.path().join("v2_started")).await);
    assert_eq!(
        std::fs::read_to_string(dir.path().join("current_version")).unwrap(),
        "1.1.0"
    );
    assert_eq!(
        std::fs::read_link(dir.path().join("payload_current")).unwrap(),
        dir.path().join("payload_1.1.0")
    );

    updater.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_stale_record_reinstalls_same_version() {
    let mut server = Server::new_async().await;
    let dir = TempDir::new().unwrap();

    // A crash after install but before the record was written: the payload
    // is on disk and linked, but the record still reads empty.
    let payload = marker_payload(dir.path());
    let installed = dir.path().join("payload_1.0.0");
    std::fs::write(&installed, &payload).unwrap();
    std::os::unix::fs::symlink(&installed, dir.path().join("payload_current")).unwrap();

    mock_check(&mut server, "", Some(release("1.0.0", &payload))).await;
    mock_artifact(&mut server, "1.0.0", &payload).await;

    let mut updater = Updater::new(agent_config(&server.url(), dir.path()));
    updater.run_cycle().await.unwrap();

    // The same version was re-verified, re-installed and finally recorded.
    assert_eq!(
        std::fs::read_to_string(dir.path().join("current_version")).unwrap(),
        "1.0.0"
    );
    assert_eq!(
        std::fs::read_link(dir.path().join("payload_current")).unwrap(),
        installed
    );
    assert!(wait_for(&dir.path().join("started")).await);

    updater.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_beta_channel_walk() {
    let mut server = Server::new_async().await;
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("current_version"), "1.5.0").unwrap();

    let payload = marker_payload(dir.path());
    let rel = Release {
        channel: "beta".to_owned(),
        ..release("2.0.0", &payload)
    };
    server
        .mock("GET", "/api/v1/check")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("channel".into(), "beta".into()),
            Matcher::UrlEncoded("current".into(), "1.5.0".into()),
        ]))
        .with_status(200)
        .with_body(check_body(Some(rel)))
        .create_async()
        .await;
    mock_artifact(&mut server, "2.0.0", &payload).await;

    let mut config = agent_config(&server.url(), dir.path());
    config.channel = "beta".to_owned();

    let mut updater = Updater::new(config);
    updater.run_cycle().await.unwrap();
    assert_eq!(
        std::fs::read_to_string(dir.path().join("current_version")).unwrap(),
        "2.0.0"
    );

    // Next poll reports up to date.
    let up_to_date = server
        .mock("GET", "/api/v1/check")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("channel".into(), "beta".into()),
            Matcher::UrlEncoded("current".into(), "2.0.0".into()),
        ]))
        .with_status(200)
        .with_body(check_body(None))
        .expect(1)
        .create_async()
        .await;

    updater.run_cycle().await.unwrap();
    up_to_date.assert_async().await;
    assert_eq!(
        std::fs::read_to_string(dir.path().join("current_version")).unwrap(),
        "2.0.0"
    );

    updater.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_start_existing_launches_installed_payload() {
    let mut server = Server::new_async().await;
    let dir = TempDir::new().unwrap();

    // A previous run installed 1.0.0 and recorded it.
    let payload = marker_payload(dir.path());
    let installed = dir.path().join("payload_1.0.0");
    std::fs::write(&installed, &payload).unwrap();
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = std::fs::metadata(&installed).unwrap().permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&installed, perms).unwrap();
    }
    std::os::unix::fs::symlink(&installed, dir.path().join("payload_current")).unwrap();
    std::fs::write(dir.path().join("current_version"), "1.0.0").unwrap();

    let mut updater = Updater::new(agent_config(&server.url(), dir.path()));
    updater.start_existing().unwrap();
    assert!(wait_for(&dir.path().join("started")).await);

    updater.shutdown().await.unwrap();
}
