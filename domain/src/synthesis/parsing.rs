//! Artifact extraction from free-form synthesis text.
//!
//! The mediator is asked to end with two bullet-list sections (see
//! [`RECOMMENDED_HEADING`] and [`FOLLOW_UP_HEADING`]). Extraction is pure
//! pattern matching; anything that does not match the convention is
//! ignored, so malformed output yields empty lists rather than an error.

use crate::deliberation::state::RecommendedItem;
use crate::prompt::advisory::{FOLLOW_UP_HEADING, RECOMMENDED_HEADING};

/// Upper bound on items taken from each section.
pub const MAX_ITEMS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Other,
    Recommended,
    FollowUp,
}

fn heading_text(line: &str) -> Option<&str> {
    let trimmed = line.trim();
    if trimmed.starts_with('#') {
        return Some(trimmed.trim_start_matches('#').trim());
    }
    // "**Recommended Properties**" or "Recommended Properties:" on its own line
    let stripped = trimmed.trim_matches('*').trim_end_matches(':').trim();
    let lower = stripped.to_lowercase();
    if lower == RECOMMENDED_HEADING.to_lowercase() || lower == FOLLOW_UP_HEADING.to_lowercase() {
        return Some(stripped);
    }
    None
}

fn classify(heading: &str) -> Section {
    let lower = heading.to_lowercase();
    if lower.contains("recommend") {
        Section::Recommended
    } else if lower.contains("follow-up") || lower.contains("follow up") {
        Section::FollowUp
    } else {
        Section::Other
    }
}

fn bullet_text(line: &str) -> Option<&str> {
    let trimmed = line.trim_start();
    for marker in ["- ", "* ", "• "] {
        if let Some(rest) = trimmed.strip_prefix(marker) {
            return Some(rest.trim());
        }
    }
    // "1. item" / "2) item"
    let digits = trimmed.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits > 0 {
        let rest = &trimmed[digits..];
        if let Some(rest) = rest.strip_prefix(". ").or_else(|| rest.strip_prefix(") ")) {
            return Some(rest.trim());
        }
    }
    None
}

fn parse_item(text: &str) -> RecommendedItem {
    let text = text.replace("**", "");
    match text.split_once(':') {
        Some((name, rationale)) if !name.trim().is_empty() && !rationale.trim().is_empty() => {
            RecommendedItem {
                name: name.trim().to_string(),
                rationale: Some(rationale.trim().to_string()),
            }
        }
        _ => RecommendedItem {
            name: text.trim().trim_end_matches(':').trim().to_string(),
            rationale: None,
        },
    }
}

/// Extract `(recommended_items, follow_up_options)` from synthesis output.
pub fn parse_synthesis_artifacts(text: &str) -> (Vec<RecommendedItem>, Vec<String>) {
    let mut section = Section::Other;
    let mut items = Vec::new();
    let mut options = Vec::new();

    for line in text.lines() {
        if let Some(heading) = heading_text(line) {
            section = classify(heading);
            continue;
        }

        let Some(bullet) = bullet_text(line) else {
            continue;
        };
        if bullet.is_empty() || bullet.starts_with('<') {
            continue;
        }

        match section {
            Section::Recommended if items.len() < MAX_ITEMS => items.push(parse_item(bullet)),
            Section::FollowUp if options.len() < MAX_ITEMS => {
                options.push(bullet.replace("**", "").trim().to_string())
            }
            _ => {}
        }
    }

    items.retain(|i| !i.name.is_empty());
    options.retain(|o| !o.is_empty());
    (items, options)
}
