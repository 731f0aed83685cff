// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell

use super::Output;
use anyhow::{Context, Result};
use trustroute::config::{default_config_path, Config};

/// Print the effective configuration after all layers are applied
pub fn run(settings: &Config, output: Output) -> Result<()> {
    if output.json {
        println!("{}", serde_json::to_string_pretty(settings)?);
        return Ok(());
    }

    if let Some(path) = default_config_path() {
        println!("# user config: {}", path.display());
    }
    let text = toml::to_string_pretty(settings).context("Failed to render configuration")?;
    print!("{text}");
    Ok(())
}
