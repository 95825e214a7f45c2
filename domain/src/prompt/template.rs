//! Shared prompt fragments

use crate::core::parameters::Parameters;
use crate::core::string::ellipsize;
use crate::deliberation::state::{ReferenceSnippet, Turn};

/// Render retrieved snippets as numbered reference blocks.
pub fn format_references(docs: &[ReferenceSnippet]) -> String {
    let mut context = String::new();
    for (i, doc) in docs.iter().enumerate() {
        context.push_str(&format!("[Document {}] Source: {}", i + 1, doc.source_id));
        if let Some(section) = doc.section_label.as_deref()
            && !section.is_empty()
        {
            context.push_str(&format!(", Section: {}", section));
        }
        context.push_str(&format!("\n{}\n\n", doc.text));
    }
    context
}

/// Role-labeled rendering of the whole transcript.
pub fn full_discussion(transcript: &[Turn]) -> String {
    transcript
        .iter()
        .map(|t| format!("{}: {}", t.role.display_name(), t.content))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Numbered, role-labeled digest with each turn cut to `max_chars`.
pub fn transcript_digest(transcript: &[Turn], max_chars: usize) -> String {
    if transcript.is_empty() {
        return "No conversation yet.".to_string();
    }

    transcript
        .iter()
        .enumerate()
        .map(|(i, t)| {
            format!(
                "{}. {}: {}",
                i + 1,
                t.role.display_name(),
                ellipsize(&t.content, max_chars)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Space-joined, non-empty values of the given parameter keys.
pub fn parameter_terms(parameters: &Parameters, keys: &[&str]) -> String {
    keys.iter()
        .map(|k| parameters.text(k))
        .filter(|v| !v.trim().is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
