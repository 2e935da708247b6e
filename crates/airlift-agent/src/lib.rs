// Copyright (c) 2026 Airlift Authors
//
// This file is part of Airlift.
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not
// use this file except in compliance with the License. You may obtain a copy
// at <https://www.apache.org/licenses/LICENSE-2.0>.
//
// This software is provided "AS IS", without warranty of any kind.

//! Airlift agent - device-side update pipeline.
//!
//! Polls the server for newer payload releases, downloads and verifies them,
//! installs the artifact atomically and restarts the supervised payload
//! process.

pub mod checker;
pub mod config;
pub mod downloader;
pub mod error;
pub mod installer;
pub mod state;
pub mod supervisor;
pub mod updater;

pub use config::AgentConfig;
pub use error::AgentError;
pub use updater::Updater;
