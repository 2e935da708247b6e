// Copyright (c) 2026 Airlift Authors
//
// This file is part of Airlift.
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not
// use this file except in compliance with the License. You may obtain a copy
// at <https://www.apache.org/licenses/LICENSE-2.0>.
//
// This software is provided "AS IS", without warranty of any kind.

//! Version parsing and comparison.
//!
//! Versions are "MAJ.MIN.PATCH" with an optional "-extra" suffix. The suffix
//! is ignored entirely and a missing or malformed component counts as 0, so
//! parsing never fails. This is deliberately looser than semver: "1.2.0-rc1"
//! and "1.2.0" compare equal.

/// Parse a version string into its (major, minor, patch) triplet.
///
/// Anything after the first `-` is dropped; missing or non-numeric
/// components become 0.
pub fn parse_version(s: &str) -> (u64, u64, u64) {
    let prefix = s.split('-').next().unwrap_or("");
    let mut parts = prefix.split('.');
    let mut next = || {
        parts
            .next()
            .and_then(|p| p.trim().parse::<u64>().ok())
            .unwrap_or(0)
    };
    (next(), next(), next())
}

/// Returns true if `a` is strictly newer than `b`.
pub fn is_newer(a: &str, b: &str) -> bool {
    parse_version(a) > parse_version(b)
}
