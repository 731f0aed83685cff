// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Route command - ranked introduction routes to a target

use super::Output;
use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use std::path::Path;
use trustroute::config::Config;
use trustroute::engine::TrustEngine;
use trustroute::types::RankedPath;

/// Run the route command
pub fn run(
    settings: &Config,
    fixture: Option<&Path>,
    user: &str,
    target: &str,
    max_paths: Option<usize>,
    output: Output,
) -> Result<()> {
    let source = super::load_fixture(fixture)?;
    let engine = TrustEngine::with_config(source, settings.engine);
    let routes = engine
        .find_referral_routes(user, target, max_paths)
        .with_context(|| format!("Failed to find routes from {user} to {target}"))?;

    if output.json {
        println!("{}", serde_json::to_string_pretty(&routes)?);
        return Ok(());
    }

    if routes.is_empty() {
        println!("No route from {user} to {target}");
        return Ok(());
    }
    for route in &routes {
        println!("{}", render(route, output.color));
    }
    Ok(())
}

/// One route as a human-readable block
pub fn render(route: &RankedPath, color: bool) -> String {
    let header = format!(
        "#{} {:.0}% success, ~{} days, {} hop(s), strength {:.1}",
        route.rank,
        route.success_probability * 100.0,
        route.estimated_days,
        route.hop_count,
        route.total_strength
    );
    let header = match (color, route.recommended) {
        (true, true) => format!("{} {}", header.green().bold(), "(recommended)".green()),
        (true, false) => header.bold().to_string(),
        (false, true) => format!("{header} (recommended)"),
        (false, false) => header,
    };

    let mut chain = route.path.nodes.first().cloned().unwrap_or_default();
    for hop in &route.path.hops {
        let link = format!(" -[{} {:.1}]-> ", hop.category, hop.strength);
        if color {
            chain.push_str(&link.dimmed().to_string());
        } else {
            chain.push_str(&link);
        }
        chain.push_str(&hop.to);
    }
    format!("{header}\n   {chain}")
}
