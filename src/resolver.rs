// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Schema-drift tolerant field resolution
//!
//! Relationship facts arrive in several historical shapes: the category may
//! sit under `relType`, `relationship`, `category` or a nested path, and may be
//! a number, a numeric string, a label in English or Japanese, a one-element
//! array or a `{value, label}` object. Resolution probes a fixed, ordered list
//! of field paths and runs each present value through an ordered chain of
//! typed extractors. The first field that yields a value wins.
//!
//! Resolution never fails. When nothing matches, the default value comes back
//! with a machine-readable reason for diagnostics.

use crate::types::{clamp_strength, Category, CategoryCode};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How deep list/object wrappers are unwrapped before giving up
const MAX_UNWRAP_DEPTH: usize = 4;

static MISSING: RawValue = RawValue::Missing;

// =============================================================================
// Probe tables
// =============================================================================

/// Candidate fields for the relationship category, highest priority first
pub const CATEGORY_FIELDS: &[&str] = &[
    "relationshipType",
    "relationship_type",
    "relType",
    "relationship",
    "relation",
    "category",
    "connectionType",
    "type",
    "relationship.type",
    "meta.relationship",
];

/// Candidate fields for the trust strength (review rating)
pub const STRENGTH_FIELDS: &[&str] = &[
    "rating",
    "strength",
    "score",
    "trust",
    "stars",
    "evaluation.rating",
    "review.rating",
];

/// Candidate fields naming the reviewed organization
pub const ORGANIZATION_FIELDS: &[&str] = &[
    "companyName",
    "company_name",
    "company.name",
    "company",
    "organizationName",
    "organization",
    "targetName",
    "name",
];

/// Candidate fields carrying the upstream record id
pub const RECORD_ID_FIELDS: &[&str] = &["id", "_id", "recordId", "record_id"];

/// Candidate fields carrying an organization logo reference
pub const LOGO_FIELDS: &[&str] = &["logoRef", "logo_ref", "logo", "company.logo"];

/// Label → category synonyms across both vocabularies in use upstream
pub const CATEGORY_SYNONYMS: &[(&str, Category)] = &[
    ("unset", Category::Unset),
    ("none", Category::Unset),
    ("未設定", Category::Unset),
    ("なし", Category::Unset),
    ("acquaintance", Category::Acquaintance),
    ("知り合い", Category::Acquaintance),
    ("知人", Category::Acquaintance),
    ("vendor", Category::VendorClient),
    ("client", Category::VendorClient),
    ("customer", Category::VendorClient),
    ("Vendor/Client", Category::VendorClient),
    ("取引先", Category::VendorClient),
    ("顧客", Category::VendorClient),
    ("partner", Category::Partner),
    ("business partner", Category::Partner),
    ("パートナー", Category::Partner),
    ("協業先", Category::Partner),
    ("investor", Category::InvestmentTarget),
    ("investment", Category::InvestmentTarget),
    ("investment target", Category::InvestmentTarget),
    ("投資家", Category::InvestmentTarget),
    ("投資先", Category::InvestmentTarget),
    ("shareholder", Category::Shareholder),
    ("株主", Category::Shareholder),
    ("friend", Category::Friend),
    ("友人", Category::Friend),
    ("友達", Category::Friend),
];

// =============================================================================
// Raw values
// =============================================================================

/// A loosely-typed value as found in an upstream record
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    /// Any JSON number
    Number(f64),
    /// Any JSON string
    String(String),
    /// An array
    List(Vec<RawValue>),
    /// A nested object
    Object(BTreeMap<String, RawValue>),
    /// Null, booleans, or absent
    Missing,
}

impl From<&serde_json::Value> for RawValue {
    fn from(value: &serde_json::Value) -> Self {
        use serde_json::Value;
        match value {
            Value::Number(n) => n.as_f64().map_or(Self::Missing, Self::Number),
            Value::String(s) => Self::String(s.clone()),
            Value::Array(items) => Self::List(items.iter().map(Self::from).collect()),
            Value::Object(map) => Self::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), Self::from(v)))
                    .collect(),
            ),
            Value::Null | Value::Bool(_) => Self::Missing,
        }
    }
}

impl From<&RawValue> for serde_json::Value {
    fn from(value: &RawValue) -> Self {
        match value {
            RawValue::Number(n) => serde_json::Number::from_f64(*n).map_or(Self::Null, Self::Number),
            RawValue::String(s) => Self::String(s.clone()),
            RawValue::List(items) => Self::Array(items.iter().map(Self::from).collect()),
            RawValue::Object(map) => Self::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), Self::from(v)))
                    .collect(),
            ),
            RawValue::Missing => Self::Null,
        }
    }
}

/// A relationship fact: a loosely-typed key/value map
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "serde_json::Value", into = "serde_json::Value")]
pub struct RawRecord {
    fields: BTreeMap<String, RawValue>,
}

impl From<serde_json::Value> for RawRecord {
    fn from(value: serde_json::Value) -> Self {
        match RawValue::from(&value) {
            RawValue::Object(fields) => Self { fields },
            _ => Self::default(),
        }
    }
}

impl From<RawRecord> for serde_json::Value {
    fn from(record: RawRecord) -> Self {
        serde_json::Value::from(&RawValue::Object(record.fields))
    }
}

impl RawRecord {
    /// Build a record from key/value pairs
    #[must_use]
    pub fn from_pairs<I, K>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, RawValue)>,
        K: Into<String>,
    {
        Self {
            fields: pairs.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    /// Whether the record has no fields at all
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Look up a possibly dotted path (`company.name`)
    ///
    /// Lists met on the way are entered through their first element.
    #[must_use]
    pub fn get_path(&self, path: &str) -> Option<&RawValue> {
        let mut segments = path.split('.');
        let mut current = self.fields.get(segments.next()?)?;
        for segment in segments {
            current = match first_non_list(current) {
                RawValue::Object(map) => map.get(segment)?,
                _ => return None,
            };
        }
        Some(current)
    }
}

fn first_non_list(mut value: &RawValue) -> &RawValue {
    for _ in 0..MAX_UNWRAP_DEPTH {
        match value {
            RawValue::List(items) => match items.first() {
                Some(first) => value = first,
                None => return &MISSING,
            },
            _ => return value,
        }
    }
    value
}

/// Reduce a raw value to a scalar: first element of lists, `value` or
/// `label` of objects. Returns `None` for shapes that hold no scalar.
#[must_use]
pub fn unwrap_scalar(value: &RawValue) -> Option<&RawValue> {
    let mut current = value;
    for _ in 0..=MAX_UNWRAP_DEPTH {
        current = match current {
            RawValue::Number(_) | RawValue::String(_) | RawValue::Missing => return Some(current),
            RawValue::List(items) => items.first()?,
            RawValue::Object(map) => map.get("value").or_else(|| map.get("label"))?,
        };
    }
    None
}

// =============================================================================
// Resolution
// =============================================================================

/// Outcome of probing a record
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved<T> {
    /// The resolved value, or the default
    pub value: T,
    /// Field that produced the value, `None` on no match
    pub field: Option<&'static str>,
    /// Machine-readable reason, for diagnostics only
    pub reason: String,
}

impl<T> Resolved<T> {
    /// Whether a candidate field produced the value
    #[must_use]
    pub fn is_match(&self) -> bool {
        self.field.is_some()
    }
}

/// A typed extractor: scalar in, value plus a short tag naming how it matched
pub type Extractor<T> = fn(&RawValue) -> Option<(T, &'static str)>;

/// Category extractors, tried in order
pub const CATEGORY_EXTRACTORS: &[Extractor<CategoryCode>] =
    &[category_from_number, category_from_numeric_string, category_from_synonym];

/// Strength extractors, tried in order
pub const STRENGTH_EXTRACTORS: &[Extractor<f64>] =
    &[strength_from_number, strength_from_numeric_string, strength_from_stars];

/// Text extractors, tried in order
pub const TEXT_EXTRACTORS: &[Extractor<String>] = &[text_from_string, text_from_number];

/// Probe `fields` in order, running each present value through `extractors`
pub fn probe<T>(
    record: &RawRecord,
    fields: &'static [&'static str],
    extractors: &[Extractor<T>],
    default: T,
) -> Resolved<T> {
    let mut misses = Vec::new();

    for &field in fields {
        let Some(raw) = record.get_path(field) else {
            continue;
        };
        let Some(scalar) = unwrap_scalar(raw) else {
            misses.push(format!("unsupported_shape:{field}"));
            continue;
        };
        match scalar {
            RawValue::Missing => continue,
            RawValue::String(s) if s.trim().is_empty() => {
                misses.push(format!("empty_string:{field}"));
                continue;
            }
            _ => {}
        }

        if let Some((value, how)) = extractors.iter().find_map(|extract| extract(scalar)) {
            return Resolved {
                value,
                field: Some(field),
                reason: format!("matched:{field}:{how}"),
            };
        }

        misses.push(match scalar {
            RawValue::String(s) => format!("unmatched_string:{field}:{}", s.trim()),
            RawValue::Number(n) => format!("unmatched_number:{field}:{n}"),
            _ => format!("unsupported_shape:{field}"),
        });
    }

    let reason = if misses.is_empty() {
        "no_match".to_string()
    } else {
        format!("no_match;{}", misses.join(";"))
    };
    Resolved {
        value: default,
        field: None,
        reason,
    }
}

/// Resolve the relationship category of a record
#[must_use]
pub fn resolve_category(record: &RawRecord) -> Resolved<CategoryCode> {
    probe(record, CATEGORY_FIELDS, CATEGORY_EXTRACTORS, CategoryCode::UNASSIGNED)
}

/// Resolve the trust strength (rating) of a record, clamped to the scale
#[must_use]
pub fn resolve_strength(record: &RawRecord) -> Resolved<f64> {
    probe(record, STRENGTH_FIELDS, STRENGTH_EXTRACTORS, 0.0)
}

/// Resolve the reviewed organization's raw name
#[must_use]
pub fn resolve_organization_name(record: &RawRecord) -> Resolved<Option<String>> {
    resolve_text(record, ORGANIZATION_FIELDS)
}

/// Resolve the upstream record id
#[must_use]
pub fn resolve_record_id(record: &RawRecord) -> Option<String> {
    resolve_text(record, RECORD_ID_FIELDS).value
}

/// Resolve an organization logo reference carried on the record itself
#[must_use]
pub fn resolve_logo_ref(record: &RawRecord) -> Option<String> {
    resolve_text(record, LOGO_FIELDS).value
}

fn resolve_text(record: &RawRecord, fields: &'static [&'static str]) -> Resolved<Option<String>> {
    let resolved = probe(record, fields, TEXT_EXTRACTORS, String::new());
    Resolved {
        value: resolved.field.map(|_| resolved.value),
        field: resolved.field,
        reason: resolved.reason,
    }
}

/// Look up a label in [`CATEGORY_SYNONYMS`], exact match first, then
/// case-insensitively
#[must_use]
pub fn lookup_synonym(label: &str) -> Option<(Category, &'static str)> {
    let label = label.trim();
    if let Some((_, category)) = CATEGORY_SYNONYMS.iter().find(|(s, _)| *s == label) {
        return Some((*category, "synonym"));
    }
    let folded = label.to_lowercase();
    CATEGORY_SYNONYMS
        .iter()
        .find(|(s, _)| s.to_lowercase() == folded)
        .map(|(_, category)| (*category, "synonym_casefold"))
}

fn parse_number(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}

#[allow(clippy::cast_possible_truncation)]
fn code_of(n: f64) -> Option<CategoryCode> {
    n.is_finite().then(|| CategoryCode(n.trunc() as i64))
}

fn category_from_number(value: &RawValue) -> Option<(CategoryCode, &'static str)> {
    match value {
        RawValue::Number(n) => code_of(*n).map(|c| (c, "number")),
        _ => None,
    }
}

fn category_from_numeric_string(value: &RawValue) -> Option<(CategoryCode, &'static str)> {
    match value {
        RawValue::String(s) => parse_number(s).and_then(code_of).map(|c| (c, "numeric_string")),
        _ => None,
    }
}

fn category_from_synonym(value: &RawValue) -> Option<(CategoryCode, &'static str)> {
    match value {
        RawValue::String(s) => lookup_synonym(s).map(|(c, how)| (c.code(), how)),
        _ => None,
    }
}

fn strength_from_number(value: &RawValue) -> Option<(f64, &'static str)> {
    match value {
        RawValue::Number(n) if n.is_finite() => Some((clamp_strength(*n), "number")),
        _ => None,
    }
}

fn strength_from_numeric_string(value: &RawValue) -> Option<(f64, &'static str)> {
    match value {
        RawValue::String(s) => parse_number(s).map(|n| (clamp_strength(n), "numeric_string")),
        _ => None,
    }
}

#[allow(clippy::cast_precision_loss)]
fn strength_from_stars(value: &RawValue) -> Option<(f64, &'static str)> {
    match value {
        RawValue::String(s) => {
            let stars = s.chars().filter(|c| *c == '★').count();
            (stars > 0).then(|| (clamp_strength(stars as f64), "stars"))
        }
        _ => None,
    }
}

fn text_from_string(value: &RawValue) -> Option<(String, &'static str)> {
    match value {
        RawValue::String(s) if !s.trim().is_empty() => Some((s.trim().to_string(), "string")),
        _ => None,
    }
}

fn text_from_number(value: &RawValue) -> Option<(String, &'static str)> {
    match value {
        RawValue::Number(n) if n.is_finite() => Some((n.to_string(), "number")),
        _ => None,
    }
}
