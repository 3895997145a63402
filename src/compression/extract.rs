//! Per-message extraction of decisions, questions, action items and dated
//! events. Every extractor works on a cleaned message and applies its own
//! per-message cap.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use super::truncate_chars;
use crate::model::{Message, TimelineEvent};

pub const MAX_DECISIONS_PER_MESSAGE: usize = 5;
pub const MAX_QUESTIONS_PER_MESSAGE: usize = 3;
pub const MAX_EVENTS_PER_MESSAGE: usize = 3;

/// Longest kept decision, question or action item, in chars.
pub const MAX_ITEM_CHARS: usize = 200;
pub const MAX_EVENT_CHARS: usize = 150;

/// Extracted text must be longer than this to count.
const MIN_ITEM_CHARS: usize = 10;

static DECISION_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile_all(&[
        r"(?i)we (decided|agreed|chose|selected) (to |that )?([^.!?]+[.!?])",
        r"(?i)decision: ([^.!?]+[.!?])",
        r"(?i)(will|going to) ([^.!?]+[.!?])",
    ])
});

static SENTENCE_BREAK: LazyLock<Regex> = LazyLock::new(|| compile(r"[.!]\s+"));

static ACTION_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile_all(&[
        r"(?i)(\w+) (will|should|need to|must) ([^.!?]+[.!?])",
        r"(?i)(\w+)'s action: ([^.!?]+[.!?])",
        r"(?i)@(\w+) ([^.!?]+[.!?])",
    ])
});

static EVENT_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile_all(&[
        r"(?i)(?:deadline|due date|by): [^.!?\n]+",
        r"(?i)(?:january|february|march|april|may|june|july|august|september|october|november|december) \d{1,2}",
        r"\d{1,2}/\d{1,2}/\d{2,4}",
    ])
});

fn compile(pattern: &str) -> Regex {
    // static literals, cannot fail
    #[allow(clippy::expect_used)]
    Regex::new(pattern).expect("extraction regex")
}

fn compile_all(patterns: &[&str]) -> Vec<Regex> {
    patterns.iter().map(|p| compile(p)).collect()
}

/// Join the non-empty capture groups from `first` onward with single spaces.
fn join_groups(caps: &Captures<'_>, first: usize) -> String {
    (first..caps.len())
        .filter_map(|i| caps.get(i))
        .map(|m| m.as_str().trim())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn long_enough(text: &str) -> bool {
    text.chars().count() > MIN_ITEM_CHARS
}

/// Decision statements, pattern by pattern, at most five per message.
pub fn extract_decisions(message: &Message) -> Vec<String> {
    let text = &message.body_text;
    DECISION_PATTERNS
        .iter()
        .flat_map(|pattern| pattern.captures_iter(text))
        .map(|caps| join_groups(&caps, 1))
        .filter(|decision| long_enough(decision))
        .map(|decision| truncate_chars(&decision, MAX_ITEM_CHARS))
        .take(MAX_DECISIONS_PER_MESSAGE)
        .collect()
}

/// Sentence fragments containing a question mark, at most three per message.
pub fn extract_questions(message: &Message) -> Vec<String> {
    SENTENCE_BREAK
        .split(&message.body_text)
        .filter(|sentence| sentence.contains('?'))
        .map(str::trim)
        .filter(|question| long_enough(question))
        .map(|question| truncate_chars(question, MAX_ITEM_CHARS))
        .take(MAX_QUESTIONS_PER_MESSAGE)
        .collect()
}

/// Action items keyed by the person named in the match. Items are kept in
/// match order; people with no surviving item are left out.
pub fn extract_action_items(message: &Message) -> BTreeMap<String, Vec<String>> {
    let text = &message.body_text;
    let mut items: BTreeMap<String, Vec<String>> = BTreeMap::new();

    for caps in ACTION_PATTERNS.iter().flat_map(|p| p.captures_iter(text)) {
        let Some(person) = caps.get(1).map(|m| m.as_str().trim()) else {
            continue;
        };
        let action = join_groups(&caps, 2);
        if long_enough(&action) {
            items
                .entry(person.to_string())
                .or_default()
                .push(truncate_chars(&action, MAX_ITEM_CHARS));
        }
    }
    items
}

/// Dated phrases, stamped with the message's received time. At most three
/// per message.
pub fn extract_timeline(message: &Message) -> Vec<TimelineEvent> {
    let text = &message.body_text;
    EVENT_PATTERNS
        .iter()
        .flat_map(|pattern| pattern.find_iter(text))
        .map(|m| TimelineEvent {
            date: message.received_at,
            event: truncate_chars(m.as_str(), MAX_EVENT_CHARS),
        })
        .take(MAX_EVENTS_PER_MESSAGE)
        .collect()
}
