// Copyright (c) 2026 Airlift Authors
//
// This file is part of Airlift.
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not
// use this file except in compliance with the License. You may obtain a copy
// at <https://www.apache.org/licenses/LICENSE-2.0>.
//
// This software is provided "AS IS", without warranty of any kind.

//! The on-disk current-version record.
//!
//! A plain string file naming the last version that was installed and whose
//! restart was confirmed. Absent or unreadable means "no version yet"; the
//! record is only ever written after a successful restart, so a crash
//! between install and record leaves the old value in place and the next
//! poll cycle re-runs the whole pipeline.

use crate::error::Result;
use std::path::Path;

/// Read the recorded current version; empty string if the record is absent.
pub fn read_current_version(path: &Path) -> String {
    std::fs::read_to_string(path)
        .map(|s| s.trim().to_owned())
        .unwrap_or_default()
}

/// Persist the current version, replacing any previous record atomically.
pub fn record_current_version(path: &Path, version: &str) -> Result<()> {
    let temp_path = path.with_extension("tmp");
    std::fs::write(&temp_path, version)?;
    std::fs::rename(&temp_path, path)?;
    Ok(())
}
