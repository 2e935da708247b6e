// Copyright (c) 2026 Airlift Authors
//
// This file is part of Airlift.
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not
// use this file except in compliance with the License. You may obtain a copy
// at <https://www.apache.org/licenses/LICENSE-2.0>.
//
// This software is provided "AS IS", without warranty of any kind.

//! Lifecycle management for the supervised payload process.
//!
//! One payload process at a time. Exit is observed through a oneshot
//! channel fed by a waiter task that owns the child handle, so `stop`
//! waits for the confirmed exit instead of sleeping a fixed delay.

use crate::error::{AgentError, Result};
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use std::path::Path;
use std::process::ExitStatus;
use std::time::Duration;
use tokio::process::Command;
use tokio::sync::oneshot;
use tracing::{info, warn};

const DEFAULT_GRACE: Duration = Duration::from_secs(5);
const KILL_WAIT: Duration = Duration::from_secs(2);

#[derive(Debug)]
struct RunningPayload {
    pid: Pid,
    exit_rx: oneshot::Receiver<ExitStatus>,
}

/// Starts, stops and restarts the payload executable.
#[derive(Debug)]
pub struct Supervisor {
    grace: Duration,
    running: Option<RunningPayload>,
}

impl Supervisor {
    pub fn new() -> Self {
        Self::with_grace(DEFAULT_GRACE)
    }

    /// `grace` is how long `stop` waits after SIGTERM before escalating
    /// to SIGKILL.
    pub fn with_grace(grace: Duration) -> Self {
        Self {
            grace,
            running: None,
        }
    }

    /// Spawn the payload, inheriting the agent's stdio.
    ///
    /// Fails if a payload is already being supervised.
    pub fn start(&mut self, executable: &Path) -> Result<()> {
        if self.running.is_some() {
            return Err(AgentError::Process(
                "payload is already running".to_owned(),
            ));
        }

        let mut child = Command::new(executable)
            .spawn()
            .map_err(|e| AgentError::Process(format!("failed to start payload: {e}")))?;
        let raw_pid = child
            .id()
            .ok_or_else(|| AgentError::Process("payload exited before spawn returned".to_owned()))?;
        let pid = Pid::from_raw(raw_pid as i32);

        let (exit_tx, exit_rx) = oneshot::channel();
        tokio::spawn(async move {
            match child.wait().await {
                Ok(status) => {
                    info!(pid = raw_pid, %status, "payload exited");
                    let _ = exit_tx.send(status);
                }
                Err(e) => {
                    warn!(pid = raw_pid, error = %e, "failed to wait for payload");
                }
            }
        });

        info!(pid = raw_pid, executable = %executable.display(), "payload started");
        self.running = Some(RunningPayload { pid, exit_rx });
        Ok(())
    }

    /// Whether the supervised payload is still alive.
    ///
    /// Observing an exit clears the handle, so a later `start` succeeds.
    pub fn is_running(&mut self) -> bool {
        let Some(payload) = self.running.as_mut() else {
            return false;
        };
        match payload.exit_rx.try_recv() {
            Err(oneshot::error::TryRecvError::Empty) => true,
            Ok(_) | Err(oneshot::error::TryRecvError::Closed) => {
                self.running = None;
                false
            }
        }
    }

    /// Stop the payload and wait for its confirmed exit.
    ///
    /// SIGTERM first; if the process outlives the grace period it gets
    /// SIGKILL. A payload that already exited on its own is not an error.
    pub async fn stop(&mut self) -> Result<()> {
        let Some(mut payload) = self.running.take() else {
            return Ok(());
        };

        match signal::kill(payload.pid, Signal::SIGTERM) {
            Ok(()) => {}
            // Already gone.
            Err(nix::errno::Errno::ESRCH) => return Ok(()),
            Err(e) => {
                return Err(AgentError::Process(format!(
                    "failed to signal payload: {e}"
                )));
            }
        }

        match tokio::time::timeout(self.grace, &mut payload.exit_rx).await {
            Ok(_) => {
                info!(pid = %payload.pid, "payload stopped");
                Ok(())
            }
            Err(_) => {
                warn!(pid = %payload.pid, "payload ignored SIGTERM, killing");
                if let Err(e) = signal::kill(payload.pid, Signal::SIGKILL) {
                    if e != nix::errno::Errno::ESRCH {
                        return Err(AgentError::Process(format!(
                            "failed to kill payload: {e}"
                        )));
                    }
                }
                let _ = tokio::time::timeout(KILL_WAIT, payload.exit_rx).await;
                Ok(())
            }
        }
    }

    /// Stop the current payload (if any) and start `executable`.
    pub async fn restart(&mut self, executable: &Path) -> Result<()> {
        self.stop().await?;
        self.start(executable)
    }
}

impl Default for Supervisor {
    fn default() -> Self {
        Self::new()
    }
}
