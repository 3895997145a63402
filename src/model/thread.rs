//! Conversation threads and their compression digest.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::message::{Address, Category, Message, PriorityLevel};

/// Separator placed between rendered messages in [`Thread::total_text`].
const MESSAGE_SEPARATOR: &str = "\n\n---\n\n";

/// A dated event mined from thread text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineEvent {
    /// Received-at of the message the event came from.
    pub date: DateTime<Utc>,
    pub event: String,
}

/// Everything a compression backend produces for one thread.
///
/// Applied to a thread as a unit so fields never mix sources.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Digest {
    pub summary: String,
    pub key_decisions: Vec<String>,
    pub unresolved_questions: Vec<String>,
    pub action_items_by_person: BTreeMap<String, Vec<String>>,
    pub timeline: Vec<TimelineEvent>,
    pub original_token_count: usize,
    pub compressed_token_count: usize,
    pub compression_ratio: f64,
}

/// An email conversation.
///
/// `messages` stays sorted by `received_at`; `message_count` and the
/// first/last timestamps are recomputed on every mutation of the list.
#[derive(Debug, Clone, Serialize)]
pub struct Thread {
    pub thread_id: String,
    pub subject: String,
    pub participants: Vec<Address>,
    messages: Vec<Message>,
    message_count: usize,
    first_message_at: Option<DateTime<Utc>>,
    last_message_at: Option<DateTime<Utc>>,

    pub compressed_summary: Option<String>,
    pub compression_ratio: f64,
    pub original_token_count: usize,
    pub compressed_token_count: usize,
    pub key_decisions: Vec<String>,
    pub unresolved_questions: Vec<String>,
    pub action_items_by_person: BTreeMap<String, Vec<String>>,
    pub timeline: Vec<TimelineEvent>,

    pub category: Option<Category>,
    pub priority_level: Option<PriorityLevel>,
}

impl Thread {
    pub fn new(
        thread_id: impl Into<String>,
        subject: impl Into<String>,
        participants: Vec<Address>,
        messages: Vec<Message>,
    ) -> Self {
        let mut thread = Self {
            thread_id: thread_id.into(),
            subject: subject.into(),
            participants,
            messages: Vec::new(),
            message_count: 0,
            first_message_at: None,
            last_message_at: None,
            compressed_summary: None,
            compression_ratio: 0.0,
            original_token_count: 0,
            compressed_token_count: 0,
            key_decisions: Vec::new(),
            unresolved_questions: Vec::new(),
            action_items_by_person: BTreeMap::new(),
            timeline: Vec::new(),
            category: None,
            priority_level: None,
        };
        thread.set_messages(messages);
        thread
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn message_count(&self) -> usize {
        self.message_count
    }

    pub fn first_message_at(&self) -> Option<DateTime<Utc>> {
        self.first_message_at
    }

    pub fn last_message_at(&self) -> Option<DateTime<Utc>> {
        self.last_message_at
    }

    pub fn is_compressed(&self) -> bool {
        self.compressed_summary.is_some()
    }

    /// Replace the message list.
    pub fn set_messages(&mut self, messages: Vec<Message>) {
        self.messages = messages;
        self.refresh();
    }

    /// Append a message, keeping the list ordered.
    pub fn add_message(&mut self, message: Message) {
        self.messages.push(message);
        self.refresh();
    }

    /// Mutate every message in place, then restore ordering.
    pub fn update_messages(&mut self, mut f: impl FnMut(&mut Message)) {
        for message in &mut self.messages {
            f(message);
        }
        self.refresh();
    }

    fn refresh(&mut self) {
        // stable: equal timestamps keep arrival order
        self.messages.sort_by_key(|m| m.received_at);
        self.message_count = self.messages.len();
        self.first_message_at = self.messages.first().map(|m| m.received_at);
        self.last_message_at = self.messages.last().map(|m| m.received_at);
    }

    /// Full thread text: each message as sender, date and body.
    pub fn total_text(&self) -> String {
        self.messages
            .iter()
            .map(|m| {
                format!(
                    "From: {}\nDate: {}\n\n{}",
                    m.sender.email,
                    m.received_at.format("%Y-%m-%d %H:%M:%S"),
                    m.body_text
                )
            })
            .collect::<Vec<_>>()
            .join(MESSAGE_SEPARATOR)
    }

    /// Roll message annotations up to the thread: the opening message's
    /// category and the highest priority level seen.
    pub fn refresh_rollup(&mut self) {
        self.category = self.messages.first().and_then(|m| m.category);
        self.priority_level = self.messages.iter().filter_map(|m| m.priority_level).max();
    }

    /// Overwrite every compression field from a digest.
    pub fn apply_digest(&mut self, digest: Digest) {
        self.compressed_summary = Some(digest.summary);
        self.key_decisions = digest.key_decisions;
        self.unresolved_questions = digest.unresolved_questions;
        self.action_items_by_person = digest.action_items_by_person;
        self.timeline = digest.timeline;
        self.original_token_count = digest.original_token_count;
        self.compressed_token_count = digest.compressed_token_count;
        self.compression_ratio = digest.compression_ratio;
    }
}
