// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Graph command - builds a user's trust graph from a fixture

use anyhow::{Context, Result};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;
use trustroute::config::Config;
use trustroute::resolver;
use trustroute::source::TemplateAvatarResolver;
use trustroute::types::CategoryCode;
use trustroute::engine::TrustEngine;

/// Supported graph formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphFormat {
    /// Graphviz DOT format
    Dot,
    /// JSON format
    Json,
}

impl GraphFormat {
    /// Parse format from string
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "dot" | "graphviz" => Some(Self::Dot),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Parse a category given as a code (`4`) or a label (`partner`, `投資家`)
pub fn parse_category(raw: &str) -> Result<CategoryCode> {
    if let Ok(code) = raw.trim().parse::<i64>() {
        return Ok(CategoryCode(code));
    }
    resolver::lookup_synonym(raw.trim())
        .map(|(category, _)| category.code())
        .ok_or_else(|| anyhow::anyhow!("Unknown category: {}", raw))
}

/// Run the graph command
pub fn run(
    settings: &Config,
    fixture: Option<&Path>,
    user: &str,
    category: Option<&str>,
    format: &str,
    output: Option<PathBuf>,
) -> Result<()> {
    let graph_format = GraphFormat::parse(format)
        .ok_or_else(|| anyhow::anyhow!("Unknown graph format: {}. Supported: dot, json", format))?;
    let filter = category.map(parse_category).transpose()?;

    let source = super::load_fixture(fixture)?;
    let engine = TrustEngine::with_config(source, settings.engine);
    info!("Building trust graph for {}", user);
    let graph = engine
        .build_trust_graph(user, filter)
        .with_context(|| format!("Failed to build trust graph for {user}"))?;

    let content = match graph_format {
        GraphFormat::Dot => graph.to_dot(),
        GraphFormat::Json => {
            let mut value = serde_json::to_value(&graph)?;
            if let Some(resolver) = settings
                .avatar_url_template
                .as_deref()
                .and_then(TemplateAvatarResolver::new)
            {
                value["image_urls"] = serde_json::to_value(graph.image_urls(&resolver))?;
            }
            serde_json::to_string_pretty(&value)?
        }
    };

    match output {
        Some(path) => {
            fs::write(&path, &content)
                .with_context(|| format!("Failed to write to {}", path.display()))?;
            println!("Wrote graph to {}", path.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(content.as_bytes())?;
            stdout.write_all(b"\n")?;
        }
    }

    for diagnostic in graph.diagnostics() {
        tracing::debug!("{}: {}", diagnostic.subject, diagnostic.reason);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use trustroute::types::Category;

    #[test]
    fn test_parse_category() {
        assert_eq!(parse_category("4").unwrap(), CategoryCode(4));
        assert_eq!(parse_category("partner").unwrap(), Category::Partner.code());
        assert!(parse_category("nonsense").is_err());
    }

    #[test]
    fn test_parse_format() {
        assert_eq!(GraphFormat::parse("DOT"), Some(GraphFormat::Dot));
        assert_eq!(GraphFormat::parse("yaml"), None);
    }
}
