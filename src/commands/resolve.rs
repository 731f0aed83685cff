// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Resolve command - shows which fields a raw record resolves from

use super::Output;
use anyhow::{Context, Result};
use serde::Serialize;
use std::io::Read;
use trustroute::normalize;
use trustroute::resolver::{self, RawRecord};

/// What a raw record resolves to
#[derive(Debug, Serialize)]
pub struct Resolution {
    pub category: String,
    pub category_code: i64,
    pub category_reason: String,
    pub strength: f64,
    pub strength_reason: String,
    pub organization: Option<String>,
    pub organization_id: Option<String>,
    pub organization_reason: String,
    pub record_id: Option<String>,
}

/// Resolve one record
pub fn resolve(record: &RawRecord) -> Resolution {
    let category = resolver::resolve_category(record);
    let strength = resolver::resolve_strength(record);
    let organization = resolver::resolve_organization_name(record);
    Resolution {
        category: category.value.to_string(),
        category_code: category.value.0,
        category_reason: category.reason,
        strength: strength.value,
        strength_reason: strength.reason,
        organization_id: organization.value.as_deref().map(normalize::normalize),
        organization: organization.value,
        organization_reason: organization.reason,
        record_id: resolver::resolve_record_id(record),
    }
}

/// Run the resolve command
pub fn run(record: Option<String>, output: Output) -> Result<()> {
    let text = match record {
        Some(text) => text,
        None => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .context("Failed to read record from stdin")?;
            buffer
        }
    };
    let value: serde_json::Value = serde_json::from_str(&text).context("Record is not valid JSON")?;
    let resolution = resolve(&RawRecord::from(value));

    if output.json {
        println!("{}", serde_json::to_string_pretty(&resolution)?);
        return Ok(());
    }

    println!("category:     {} ({})", resolution.category, resolution.category_reason);
    println!("strength:     {} ({})", resolution.strength, resolution.strength_reason);
    match &resolution.organization {
        Some(name) => println!(
            "organization: {} -> {} ({})",
            name,
            resolution.organization_id.as_deref().unwrap_or_default(),
            resolution.organization_reason
        ),
        None => println!("organization: - ({})", resolution.organization_reason),
    }
    if let Some(id) = &resolution.record_id {
        println!("record id:    {id}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_resolution_fields() {
        let record = RawRecord::from(json!({ "id": "r1", "companyName": "Acme Inc.", "relType": "投資家", "rating": "4" }));
        let resolution = resolve(&record);
        assert_eq!(resolution.category, "investment_target");
        assert_eq!(resolution.strength, 4.0);
        assert_eq!(resolution.organization_id.as_deref(), Some("acme"));
        assert_eq!(resolution.record_id.as_deref(), Some("r1"));
    }
}
