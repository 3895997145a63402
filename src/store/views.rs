//! Query parameters and read-side projections served by the store.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::model::{Address, Category, Message, PriorityLevel, Thread};

pub const DEFAULT_MESSAGE_LIMIT: usize = 50;
pub const DEFAULT_THREAD_LIMIT: usize = 20;

/// Group key for messages the classifier has not seen yet.
pub const UNCATEGORIZED: &str = "uncategorized";
/// Distribution key for messages without a priority level.
pub const UNASSIGNED: &str = "UNASSIGNED";

/// Filter and page over the message list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageFilter {
    pub category: Option<Category>,
    pub priority: Option<PriorityLevel>,
    pub limit: usize,
    pub offset: usize,
}

impl Default for MessageFilter {
    fn default() -> Self {
        Self {
            category: None,
            priority: None,
            limit: DEFAULT_MESSAGE_LIMIT,
            offset: 0,
        }
    }
}

impl MessageFilter {
    pub fn matches(&self, message: &Message) -> bool {
        self.category.is_none_or(|c| message.category == Some(c))
            && self.priority.is_none_or(|p| message.priority_level == Some(p))
    }
}

/// One page of messages. `total` counts every match, not just this page.
#[derive(Debug, Clone, Serialize)]
pub struct MessagePage {
    pub total: usize,
    pub emails: Vec<Message>,
}

/// Compact message row for grouped listings.
#[derive(Debug, Clone, Serialize)]
pub struct MessageSummary {
    pub id: String,
    pub subject: String,
    pub sender: String,
    pub priority_score: f64,
    pub priority_level: Option<PriorityLevel>,
    pub received_at: DateTime<Utc>,
    pub requires_response: bool,
}

impl From<&Message> for MessageSummary {
    fn from(message: &Message) -> Self {
        Self {
            id: message.id.clone(),
            subject: message.subject.clone(),
            sender: message.sender.email.clone(),
            priority_score: message.priority_score,
            priority_level: message.priority_level,
            received_at: message.received_at,
            requires_response: message.requires_response,
        }
    }
}

/// Compact thread row for listings.
#[derive(Debug, Clone, Serialize)]
pub struct ThreadSummary {
    pub thread_id: String,
    pub subject: String,
    pub message_count: usize,
    pub participants: Vec<Address>,
    pub first_message: Option<DateTime<Utc>>,
    pub last_message: Option<DateTime<Utc>>,
    pub compression_ratio: f64,
    pub compressed: bool,
}

impl From<&Thread> for ThreadSummary {
    fn from(thread: &Thread) -> Self {
        Self {
            thread_id: thread.thread_id.clone(),
            subject: thread.subject.clone(),
            message_count: thread.message_count(),
            participants: thread.participants.clone(),
            first_message: thread.first_message_at(),
            last_message: thread.last_message_at(),
            compression_ratio: crate::compression::round2(thread.compression_ratio),
            compressed: thread.is_compressed(),
        }
    }
}

/// One page of threads. `total` is the number of stored threads.
#[derive(Debug, Clone, Serialize)]
pub struct ThreadPage {
    pub total: usize,
    pub threads: Vec<ThreadSummary>,
}

/// Inbox counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InboxStats {
    pub total_emails: usize,
    pub total_threads: usize,
    pub categorized_emails: usize,
    pub emails_requiring_response: usize,
}

/// Productivity figures derived from the inbox.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InboxMetrics {
    pub total_emails: usize,
    pub emails_processed: usize,
    /// Percentage of emails classified.
    pub processing_rate: f64,
    pub time_saved_hours: f64,
    /// Percentage of handling time saved per email.
    pub processing_reduction: f64,
    pub category_distribution: BTreeMap<String, usize>,
    pub priority_distribution: BTreeMap<String, usize>,
    pub threads_compressed: usize,
    pub avg_compression_ratio: f64,
}
