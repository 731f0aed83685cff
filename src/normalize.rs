// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Organization name canonicalization
//!
//! Two records naming "Acme Inc." and "acme inc" must land on one graph
//! node. The canonical form drops legal-entity tokens, collapses whitespace
//! and case-folds; the display form only collapses whitespace.
//!
//! Organizations are merged purely by this canonical form. Two distinct
//! companies sharing a name (after token stripping) collapse into one node.

/// Legal-entity tokens, already case-folded, longest first within a family
pub const LEGAL_TOKENS: &[&str] = &[
    "incorporated",
    "corporation",
    "limited",
    "co., ltd.",
    "co.,ltd.",
    "co., ltd",
    "co.,ltd",
    "co ltd",
    "l.l.c.",
    "inc.",
    "inc",
    "corp.",
    "corp",
    "ltd.",
    "ltd",
    "llc",
    "k.k.",
    "gmbh",
    "plc",
    "co.",
    "株式会社",
    "有限会社",
    "合同会社",
    "(株)",
    "（株）",
    "(有)",
    "（有）",
];

fn is_separator(c: char) -> bool {
    c.is_whitespace() || c == ',' || c == '、'
}

/// Trim and collapse internal whitespace, keeping the original casing
#[must_use]
pub fn display_name(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Canonical, comparison-only form of an organization name
///
/// Idempotent: `normalize(&normalize(x)) == normalize(x)`.
#[must_use]
pub fn normalize(raw: &str) -> String {
    let folded = display_name(raw).to_lowercase();
    let trimmed = folded.trim_matches(is_separator);
    let stripped = strip_legal_tokens(trimmed);

    if !stripped.is_empty() {
        stripped.to_string()
    } else if !trimmed.is_empty() {
        // the name is nothing but a legal token; keep it rather than return ""
        trimmed.to_string()
    } else {
        folded
    }
}

/// Whether two raw names refer to the same canonical organization
#[must_use]
pub fn same_identity(a: &str, b: &str) -> bool {
    normalize(a) == normalize(b)
}

fn strip_legal_tokens(mut name: &str) -> &str {
    loop {
        let before = name.len();
        for token in LEGAL_TOKENS {
            if let Some(rest) = strip_prefix_token(name, token) {
                name = rest.trim_matches(is_separator);
            }
            if let Some(rest) = strip_suffix_token(name, token) {
                name = rest.trim_matches(is_separator);
            }
        }
        if name.len() == before {
            return name;
        }
    }
}

/// ASCII-word tokens must stand apart from the rest of the name; CJK and
/// parenthesized tokens attach directly.
fn needs_word_boundary(token: &str) -> bool {
    token.chars().next().is_some_and(|c| c.is_ascii_alphabetic())
}

fn strip_prefix_token<'a>(name: &'a str, token: &str) -> Option<&'a str> {
    let rest = name.strip_prefix(token)?;
    if needs_word_boundary(token) && !rest.chars().next().map_or(true, is_separator) {
        return None;
    }
    Some(rest)
}

fn strip_suffix_token<'a>(name: &'a str, token: &str) -> Option<&'a str> {
    let rest = name.strip_suffix(token)?;
    if needs_word_boundary(token) && !rest.chars().next_back().map_or(true, is_separator) {
        return None;
    }
    Some(rest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legal_suffix_variants_collapse() {
        assert_eq!(normalize("Acme Inc."), "acme");
        assert_eq!(normalize("acme inc"), "acme");
        assert_eq!(normalize("ACME Incorporated"), "acme");
        assert_eq!(normalize("Acme, Inc."), "acme");
        assert_eq!(normalize("  Acme   Corp  "), "acme");
        assert_eq!(normalize("Acme Co., Ltd."), "acme");
    }

    #[test]
    fn test_japanese_entity_tokens() {
        assert_eq!(normalize("株式会社アクメ"), "アクメ");
        assert_eq!(normalize("アクメ株式会社"), "アクメ");
        assert_eq!(normalize("（株）アクメ"), "アクメ");
        assert_eq!(normalize("株式会社　アクメ"), "アクメ");
    }

    #[test]
    fn test_token_inside_word_is_kept() {
        assert_eq!(normalize("Incredible Foods"), "incredible foods");
        assert_eq!(normalize("Zinc"), "zinc");
        assert_eq!(normalize("Corpus Labs"), "corpus labs");
    }

    #[test]
    fn test_token_only_name_is_not_emptied() {
        assert_eq!(normalize("Inc."), "inc.");
        assert_eq!(normalize("株式会社"), "株式会社");
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn test_idempotent() {
        for raw in [
            "Acme Inc.",
            "acme inc",
            "Acme Inc Inc",
            "  Globex   Corporation ",
            "Inc.",
            ",",
            "株式会社 Initech",
            "Umbrella, LLC",
            "Stark Industries",
        ] {
            let once = normalize(raw);
            assert_eq!(normalize(&once), once, "not idempotent for {raw:?}");
        }
    }

    #[test]
    fn test_display_name_keeps_case() {
        assert_eq!(display_name("  Acme   Inc. "), "Acme Inc.");
    }

    #[test]
    fn test_same_identity() {
        assert!(same_identity("Acme Inc.", "ACME"));
        assert!(!same_identity("Acme", "Acme Labs"));
    }
}
