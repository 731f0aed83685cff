// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell

use super::Output;
use anyhow::Result;
use std::collections::BTreeMap;
use trustroute::normalize;
use trustroute::types::NodeId;

/// Print each name's canonical form and node id
pub fn run(names: &[String], output: Output) -> Result<()> {
    if output.json {
        let map: BTreeMap<&str, String> = names
            .iter()
            .map(|n| (n.as_str(), NodeId::organization(n)))
            .collect();
        println!("{}", serde_json::to_string_pretty(&map)?);
        return Ok(());
    }

    for name in names {
        println!("{}\t{}", name, normalize::normalize(name));
    }
    Ok(())
}
