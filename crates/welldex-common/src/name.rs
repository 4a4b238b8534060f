//! Name normalization primitives shared by every source adapter and by the
//! deduplicator. There are two distinct normal forms and they must never be
//! confused: [`canonicalize_display_name`] produces a human-facing name,
//! [`normalize_for_matching`] produces a lossy key used only for equality
//! and fuzzy comparison.

use std::collections::HashMap;
use std::sync::LazyLock;

/// Fixed abbreviation table applied when canonicalizing a display name.
/// This set is part of the cross-source contract: two sources that spell
/// the same company suffix differently (`"RES"` vs `"Resources"`) must
/// converge on the same canonical spelling, or operator dedup's exact-match
/// strategy silently stops working.
static ABBREVIATIONS: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    HashMap::from([
        ("CO", "Co"),
        ("INC", "Inc"),
        ("LLC", "LLC"),
        ("LLP", "LLP"),
        ("LP", "LP"),
        ("LTD", "Ltd"),
        ("CORP", "Corp"),
        ("CORPORATION", "Corporation"),
        ("RES", "Resources"),
        ("RESOURCES", "Resources"),
        ("OPER", "Operating"),
        ("OPERATING", "Operating"),
        ("OPERATIONS", "Operations"),
        ("PROD", "Production"),
        ("PRODUCTION", "Production"),
        ("EXPL", "Exploration"),
        ("EXPLORATION", "Exploration"),
        ("DEV", "Development"),
        ("ENGY", "Energy"),
        ("ENERGY", "Energy"),
        ("PET", "Petroleum"),
        ("PETE", "Petroleum"),
        ("PETROLEUM", "Petroleum"),
        ("OIL", "Oil"),
        ("GAS", "Gas"),
        ("USA", "USA"),
        ("US", "US"),
        ("INTL", "International"),
        ("INTERNATIONAL", "International"),
        ("MGMT", "Management"),
        ("MGT", "Management"),
        ("SVC", "Service"),
        ("SVCS", "Services"),
        ("ASSOC", "Associates"),
        ("ASSN", "Association"),
        ("BROS", "Brothers"),
        ("AMER", "American"),
        ("NATL", "National"),
        ("HLDGS", "Holdings"),
        ("GRP", "Group"),
        ("GP", "GP"),
        ("PARTNERS", "Partners"),
    ])
});

/// Legal suffixes stripped when building a matching key. Order doesn't
/// matter — every token is checked independently.
const LEGAL_SUFFIXES: &[&str] = &[
    "inc", "llc", "llp", "lp", "ltd", "co", "corp", "company", "corporation",
];

/// Canonicalize a raw operator or asset name for display: tokenize on
/// whitespace, map known abbreviations through [`ABBREVIATIONS`], keep
/// tokens of length <= 2 upper-case (state codes, initials), and
/// title-case everything else.
pub fn canonicalize_display_name(raw: &str) -> String {
    raw.split_whitespace()
        .map(canonicalize_token)
        .collect::<Vec<_>>()
        .join(" ")
}

fn canonicalize_token(token: &str) -> String {
    let trimmed = token.trim_end_matches(['.', ',']);
    let upper = trimmed.to_uppercase();

    if let Some(mapped) = ABBREVIATIONS.get(upper.as_str()) {
        return (*mapped).to_string();
    }

    if trimmed.chars().count() <= 2 {
        return upper;
    }

    title_case(trimmed)
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => {
            first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
        }
        None => String::new(),
    }
}

/// Produce the lossy matching key for a name: lowercase, strip legal
/// suffixes, strip everything that isn't alphanumeric, collapse whitespace.
/// Used exclusively for equality/fuzzy comparison in the deduplicator and
/// linker — never for display. Idempotent: `normalize_for_matching(normalize_for_matching(x)) == normalize_for_matching(x)`.
pub fn normalize_for_matching(raw: &str) -> String {
    let lowered = raw.to_lowercase();

    let tokens: Vec<String> = lowered
        .split_whitespace()
        .filter(|tok| {
            let stripped: String = tok.chars().filter(|c| c.is_alphanumeric()).collect();
            !LEGAL_SUFFIXES.contains(&stripped.as_str())
        })
        .map(|tok| tok.chars().filter(|c| c.is_alphanumeric()).collect::<String>())
        .filter(|tok: &String| !tok.is_empty())
        .collect();

    tokens.join("")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonicalizes_known_abbreviations() {
        assert_eq!(canonicalize_display_name("pioneer res co"), "Pioneer Resources Co");
        assert_eq!(canonicalize_display_name("OXY USA INC"), "OXY USA Inc");
    }

    #[test]
    fn keeps_short_tokens_uppercase() {
        assert_eq!(canonicalize_display_name("bp tx oper"), "BP TX Operating");
    }

    #[test]
    fn normalize_for_matching_strips_suffix_and_punctuation() {
        assert_eq!(
            normalize_for_matching("Pioneer Natural Resources, Inc."),
            "pioneernaturalresources"
        );
        assert_eq!(
            normalize_for_matching("PIONEER NATURAL RESOURCES INC"),
            "pioneernaturalresources"
        );
    }

    #[test]
    fn normalize_for_matching_is_idempotent() {
        let once = normalize_for_matching("OXY USA - Andrews Unit, LLC");
        let twice = normalize_for_matching(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn normalize_for_matching_collapses_whitespace() {
        assert_eq!(normalize_for_matching("  Acme   Oil   Co  "), "acmeoil");
    }
}
