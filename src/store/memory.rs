//! In-memory mail store shared between the API and the pipeline.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, info};

use super::views::{
    InboxMetrics, InboxStats, MessageFilter, MessagePage, MessageSummary, ThreadPage,
    ThreadSummary, UNASSIGNED, UNCATEGORIZED,
};
use crate::compression::round2;
use crate::model::{Digest, Message, Thread};

/// Seconds a person spends triaging one email by hand.
const MANUAL_SECONDS_PER_EMAIL: f64 = 180.0;
/// Seconds the automated pipeline spends per email.
const AUTOMATED_SECONDS_PER_EMAIL: f64 = 5.0;

#[derive(Default)]
struct Inbox {
    messages: Vec<Message>,
    threads: Vec<Thread>,
}

fn thread_index(threads: &[Thread]) -> HashMap<&str, usize> {
    threads
        .iter()
        .enumerate()
        .map(|(i, t)| (t.thread_id.as_str(), i))
        .collect()
}

/// Messages and threads in insertion order.
///
/// Thread messages are also stored in the flat message list; the pipeline
/// keeps the two copies' annotations in step.
pub struct MailStore {
    inbox: RwLock<Inbox>,
}

impl MailStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            inbox: RwLock::new(Inbox::default()),
        })
    }

    pub async fn add_messages(&self, messages: Vec<Message>) {
        let count = messages.len();
        let mut inbox = self.inbox.write().await;
        inbox.messages.extend(messages);
        debug!(count, total = inbox.messages.len(), "Messages added");
    }

    /// Store a thread and append its messages to the message list.
    pub async fn add_thread(&self, thread: Thread) {
        let mut inbox = self.inbox.write().await;
        inbox.messages.extend(thread.messages().iter().cloned());
        debug!(
            thread_id = %thread.thread_id,
            messages = thread.message_count(),
            "Thread added"
        );
        inbox.threads.push(thread);
    }

    pub async fn add_threads(&self, threads: Vec<Thread>) {
        for thread in threads {
            self.add_thread(thread).await;
        }
    }

    pub async fn list_messages(&self, filter: &MessageFilter) -> MessagePage {
        let inbox = self.inbox.read().await;
        let matching: Vec<&Message> = inbox
            .messages
            .iter()
            .filter(|m| filter.matches(m))
            .collect();
        MessagePage {
            total: matching.len(),
            emails: matching
                .into_iter()
                .skip(filter.offset)
                .take(filter.limit)
                .cloned()
                .collect(),
        }
    }

    /// Messages grouped by category name, highest priority first.
    pub async fn categorized(&self) -> BTreeMap<String, Vec<MessageSummary>> {
        let inbox = self.inbox.read().await;
        let mut groups: BTreeMap<String, Vec<MessageSummary>> = BTreeMap::new();
        for message in &inbox.messages {
            let key = message
                .category
                .map_or(UNCATEGORIZED, |c| c.as_str())
                .to_string();
            groups.entry(key).or_default().push(message.into());
        }
        for group in groups.values_mut() {
            group.sort_by(|a, b| b.priority_score.total_cmp(&a.priority_score));
        }
        groups
    }

    pub async fn get_message(&self, id: &str) -> Option<Message> {
        let inbox = self.inbox.read().await;
        inbox.messages.iter().find(|m| m.id == id).cloned()
    }

    pub async fn get_thread(&self, thread_id: &str) -> Option<Thread> {
        let inbox = self.inbox.read().await;
        inbox
            .threads
            .iter()
            .find(|t| t.thread_id == thread_id)
            .cloned()
    }

    pub async fn list_threads(&self, limit: usize, offset: usize) -> ThreadPage {
        let inbox = self.inbox.read().await;
        ThreadPage {
            total: inbox.threads.len(),
            threads: inbox
                .threads
                .iter()
                .skip(offset)
                .take(limit)
                .map(ThreadSummary::from)
                .collect(),
        }
    }

    /// Run `annotate` over every message with its stored thread, if any.
    ///
    /// `annotate` returns whether it changed the message. Annotations are
    /// then copied onto the matching messages inside each thread and rolled
    /// up to the thread. Returns the number of changed messages.
    pub async fn annotate_messages<F>(&self, mut annotate: F) -> usize
    where
        F: FnMut(&mut Message, Option<&Thread>) -> bool,
    {
        let mut guard = self.inbox.write().await;
        let inbox = &mut *guard;

        let mut changed = 0;
        {
            let index = thread_index(&inbox.threads);
            for message in inbox.messages.iter_mut() {
                let thread = index
                    .get(message.thread_id.as_str())
                    .map(|&i| &inbox.threads[i]);
                if annotate(message, thread) {
                    changed += 1;
                }
            }
        }

        let by_id: HashMap<&str, &Message> =
            inbox.messages.iter().map(|m| (m.id.as_str(), m)).collect();
        for thread in inbox.threads.iter_mut() {
            thread.update_messages(|m| {
                if let Some(source) = by_id.get(m.id.as_str()) {
                    copy_annotations(source, m);
                }
            });
            thread.refresh_rollup();
        }
        changed
    }

    /// Clones of every thread without a summary.
    pub async fn uncompressed_threads(&self) -> Vec<Thread> {
        let inbox = self.inbox.read().await;
        inbox
            .threads
            .iter()
            .filter(|t| !t.is_compressed())
            .cloned()
            .collect()
    }

    /// Attach a digest to a stored thread. Returns false if the thread is gone.
    pub async fn apply_digest(&self, thread_id: &str, digest: Digest) -> bool {
        let mut inbox = self.inbox.write().await;
        match inbox.threads.iter_mut().find(|t| t.thread_id == thread_id) {
            Some(thread) => {
                thread.apply_digest(digest);
                true
            }
            None => false,
        }
    }

    pub async fn stats(&self) -> InboxStats {
        let inbox = self.inbox.read().await;
        InboxStats {
            total_emails: inbox.messages.len(),
            total_threads: inbox.threads.len(),
            categorized_emails: inbox.messages.iter().filter(|m| m.is_classified()).count(),
            emails_requiring_response: inbox
                .messages
                .iter()
                .filter(|m| m.requires_response)
                .count(),
        }
    }

    pub async fn metrics(&self) -> InboxMetrics {
        let inbox = self.inbox.read().await;
        let total = inbox.messages.len();
        let processed = inbox.messages.iter().filter(|m| m.is_classified()).count();

        let mut category_distribution = BTreeMap::new();
        let mut priority_distribution = BTreeMap::new();
        for message in &inbox.messages {
            let category = message.category.map_or(UNCATEGORIZED, |c| c.as_str());
            *category_distribution.entry(category.to_string()).or_insert(0) += 1;
            let level = message.priority_level.map_or(UNASSIGNED, |l| l.as_str());
            *priority_distribution.entry(level.to_string()).or_insert(0) += 1;
        }

        let compressed: Vec<&Thread> = inbox.threads.iter().filter(|t| t.is_compressed()).collect();
        let avg_compression_ratio = if compressed.is_empty() {
            0.0
        } else {
            compressed.iter().map(|t| t.compression_ratio).sum::<f64>() / compressed.len() as f64
        };

        let processing_rate = if total > 0 {
            processed as f64 / total as f64 * 100.0
        } else {
            0.0
        };
        let seconds_saved =
            processed as f64 * (MANUAL_SECONDS_PER_EMAIL - AUTOMATED_SECONDS_PER_EMAIL);

        InboxMetrics {
            total_emails: total,
            emails_processed: processed,
            processing_rate: round2(processing_rate),
            time_saved_hours: round2(seconds_saved / 3600.0),
            processing_reduction: round2(
                (MANUAL_SECONDS_PER_EMAIL - AUTOMATED_SECONDS_PER_EMAIL)
                    / MANUAL_SECONDS_PER_EMAIL
                    * 100.0,
            ),
            category_distribution,
            priority_distribution,
            threads_compressed: compressed.len(),
            avg_compression_ratio: round2(avg_compression_ratio),
        }
    }

    /// Drop everything.
    pub async fn reset(&self) {
        let mut inbox = self.inbox.write().await;
        let (messages, threads) = (inbox.messages.len(), inbox.threads.len());
        *inbox = Inbox::default();
        info!(messages, threads, "Store reset");
    }
}

fn copy_annotations(from: &Message, to: &mut Message) {
    to.category = from.category;
    to.priority_score = from.priority_score;
    to.priority_level = from.priority_level;
    to.detected_intent = from.detected_intent;
    to.requires_response = from.requires_response;
}
