//! Plain-text digest rendering.

use std::collections::BTreeMap;

use crate::model::TimelineEvent;

pub const MAX_ACTIONS_SHOWN: usize = 5;
pub const MAX_EVENTS_SHOWN: usize = 10;
const MAX_LISTED: usize = 10;

/// Aggregated findings for one thread, ready to render.
#[derive(Debug, Clone, Default)]
pub struct Findings {
    pub key_decisions: Vec<String>,
    pub unresolved_questions: Vec<String>,
    pub action_items: BTreeMap<String, Vec<String>>,
    pub timeline: Vec<TimelineEvent>,
}

/// Render sections in fixed order, skipping empty ones:
///
/// ```text
/// KEY DECISIONS:
/// 1. ...
///
/// UNRESOLVED QUESTIONS:
/// 1. ...
///
/// ACTION ITEMS:
///
/// bob:
///   - ...
///
/// TIMELINE:
///   • ...
/// ```
pub fn format_digest(findings: &Findings) -> String {
    let mut parts: Vec<String> = Vec::new();

    push_numbered(&mut parts, "KEY DECISIONS:", &findings.key_decisions);
    push_numbered(
        &mut parts,
        "UNRESOLVED QUESTIONS:",
        &findings.unresolved_questions,
    );

    if !findings.action_items.is_empty() {
        parts.push("ACTION ITEMS:".into());
        for (person, items) in &findings.action_items {
            parts.push(format!("\n{person}:"));
            parts.extend(
                items
                    .iter()
                    .take(MAX_ACTIONS_SHOWN)
                    .map(|item| format!("  - {item}")),
            );
        }
        parts.push(String::new());
    }

    if !findings.timeline.is_empty() {
        parts.push("TIMELINE:".into());
        parts.extend(
            findings
                .timeline
                .iter()
                .take(MAX_EVENTS_SHOWN)
                .map(|e| format!("  • {}", e.event)),
        );
    }

    parts.join("\n")
}

fn push_numbered(parts: &mut Vec<String>, heading: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    parts.push(heading.to_string());
    parts.extend(
        items
            .iter()
            .take(MAX_LISTED)
            .enumerate()
            .map(|(i, item)| format!("{}. {item}", i + 1)),
    );
    parts.push(String::new());
}
