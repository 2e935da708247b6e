// Copyright (c) 2026 Airlift Authors
//
// This file is part of Airlift.
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not
// use this file except in compliance with the License. You may obtain a copy
// at <https://www.apache.org/licenses/LICENSE-2.0>.
//
// This software is provided "AS IS", without warranty of any kind.

//! Airlift server - release catalog and artifact distribution.
//!
//! Publishers upload payload binaries; devices poll `/api/v1/check`, download
//! artifacts and report nothing back. The catalog is held in memory behind a
//! reader/writer lock and persisted as an atomic JSON snapshot.

pub mod config;
pub mod error;
pub mod handlers;
pub mod repository;
pub mod store;

pub use config::ServerConfig;
pub use error::ApiError;
pub use repository::ArtifactRepository;
pub use store::ReleaseStore;
