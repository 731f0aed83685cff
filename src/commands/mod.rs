// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//
//! Command implementations

pub mod completions;
pub mod config;
pub mod graph;
pub mod normalize;
pub mod resolve;
pub mod route;

use anyhow::{bail, Context, Result};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use trustroute::fixture::FixtureSource;

/// Global output switches
#[derive(Debug, Clone, Copy)]
pub struct Output {
    pub json: bool,
    pub color: bool,
}

/// Load the fixture named by `--fixture` / `TRUSTROUTE_FIXTURE`
pub fn load_fixture(path: Option<&Path>) -> Result<FixtureSource> {
    let Some(path) = path else {
        bail!("No fixture given. Pass --fixture <file> or set TRUSTROUTE_FIXTURE");
    };
    let file = File::open(path).with_context(|| format!("Failed to open fixture {}", path.display()))?;
    let fixture = FixtureSource::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse fixture {}", path.display()))?;
    tracing::debug!("Loaded fixture with {} user(s)", fixture.users.len());
    Ok(fixture)
}
