//! Triage pipeline: classify, then score, then compress.
//!
//! The three stages never call each other; this is the only place that
//! sequences them. Each stage gets exclusive write access to the item for
//! the duration of its call.

use serde::Serialize;
use tracing::{debug, info};

use crate::compression::ThreadCompressor;
use crate::config::TriageConfig;
use crate::model::{Message, Thread};
use crate::priority::PriorityScorer;
use crate::remote::HybridCompressor;
use crate::store::MailStore;
use crate::triage::TriageAgent;

/// Outcome of one inbox pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ProcessReport {
    pub emails_processed: usize,
    pub threads_compressed: usize,
}

pub struct TriagePipeline {
    agent: TriageAgent,
    scorer: PriorityScorer,
    compressor: HybridCompressor,
}

impl TriagePipeline {
    pub fn new(agent: TriageAgent, scorer: PriorityScorer, compressor: HybridCompressor) -> Self {
        Self {
            agent,
            scorer,
            compressor,
        }
    }

    /// Build every stage from one config.
    pub fn from_config(config: &TriageConfig, compressor: HybridCompressor) -> Self {
        Self::new(
            TriageAgent::new(config),
            PriorityScorer::new(config),
            compressor,
        )
    }

    /// Local-only pipeline with default settings.
    pub fn local(config: &TriageConfig) -> Self {
        Self::from_config(
            config,
            HybridCompressor::local_only(ThreadCompressor::new(config.dedup)),
        )
    }

    pub fn agent(&self) -> &TriageAgent {
        &self.agent
    }

    pub fn scorer(&self) -> &PriorityScorer {
        &self.scorer
    }

    pub fn compressor(&self) -> &HybridCompressor {
        &self.compressor
    }

    /// Classify and score one message in place.
    pub fn process_message(&self, message: &mut Message, thread: Option<&Thread>) {
        self.agent.classify_message(message);
        let score = self.scorer.annotate(message, thread);
        debug!(
            id = %message.id,
            category = ?message.category,
            score,
            "Message processed"
        );
    }

    /// Annotate every unannotated message of a thread, then compress it.
    pub async fn process_thread<'a>(&self, thread: &'a mut Thread) -> &'a mut Thread {
        let context = thread.clone();
        thread.update_messages(|m| {
            if !m.is_annotated() {
                self.process_message(m, Some(&context));
            }
        });
        thread.refresh_rollup();
        self.compressor.compress(thread).await
    }

    /// One pass over the store: annotate new messages, compress new threads.
    ///
    /// A message counts as done once it has a category and a non-zero
    /// score; a thread once it has a summary.
    pub async fn process_inbox(&self, store: &MailStore) -> ProcessReport {
        let emails_processed = store
            .annotate_messages(|message, thread| {
                if message.is_annotated() {
                    return false;
                }
                self.process_message(message, thread);
                true
            })
            .await;

        let mut threads_compressed = 0;
        for thread in store.uncompressed_threads().await {
            let digest = self.compressor.digest(&thread).await;
            if store.apply_digest(&thread.thread_id, digest).await {
                threads_compressed += 1;
            }
        }

        let report = ProcessReport {
            emails_processed,
            threads_compressed,
        };
        info!(
            emails_processed = report.emails_processed,
            threads_compressed = report.threads_compressed,
            "Inbox processed"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    use crate::model::{Address, Category, PriorityLevel};

    fn make_message(id: &str, thread_id: &str, subject: &str, body: &str) -> Message {
        Message::new(
            id,
            thread_id,
            subject,
            Address::new("ops@company.com"),
            body,
            Utc::now() - Duration::minutes(10),
        )
    }

    fn make_thread(id: &str) -> Thread {
        let now = Utc::now();
        let messages = (0..4)
            .map(|i| {
                let mut m = make_message(
                    &format!("{id}-m{i}"),
                    id,
                    "Release plan",
                    "We decided to cut the release on Thursday. Can QA sign off by Wednesday?",
                );
                m.received_at = now - Duration::hours(4 - i);
                m
            })
            .collect();
        Thread::new(id, "Release plan", vec![], messages)
    }

    #[test]
    fn process_message_classifies_then_scores() {
        let pipeline = TriagePipeline::local(&TriageConfig::default());
        let mut msg = make_message("m-1", "t-1", "URGENT: db failover", "Could you check now?");

        pipeline.process_message(&mut msg, None);

        assert_eq!(msg.category, Some(Category::Urgent));
        assert!(msg.requires_response);
        assert!(msg.priority_score > 0.0);
        assert_eq!(
            msg.priority_level,
            Some(PriorityLevel::from_score(msg.priority_score))
        );
    }

    #[tokio::test]
    async fn process_thread_annotates_and_compresses() {
        let pipeline = TriagePipeline::local(&TriageConfig::default());
        let mut thread = make_thread("t-1");

        pipeline.process_thread(&mut thread).await;

        assert!(thread.messages().iter().all(|m| m.is_annotated()));
        assert!(thread.category.is_some());
        assert!(thread.priority_level.is_some());
        assert!(thread.is_compressed());
        assert_eq!(
            thread.key_decisions,
            vec!["decided to cut the release on Thursday."]
        );
    }

    #[tokio::test]
    async fn process_inbox_skips_annotated_work() {
        let pipeline = TriagePipeline::local(&TriageConfig::default());
        let store = MailStore::new();

        let mut done = make_message("done", "t-x", "Old", "Already handled.");
        done.category = Some(Category::Personal);
        done.priority_score = 42.0;
        store
            .add_messages(vec![
                done,
                make_message("new", "t-y", "Weekly newsletter", "Read more. Unsubscribe here."),
            ])
            .await;
        store.add_thread(make_thread("t-1")).await;

        let report = pipeline.process_inbox(&store).await;
        assert_eq!(
            report,
            ProcessReport {
                emails_processed: 5,
                threads_compressed: 1,
            }
        );

        // untouched
        let done = store.get_message("done").await.unwrap();
        assert_eq!(done.category, Some(Category::Personal));
        assert_eq!(done.priority_score, 42.0);

        let newsletter = store.get_message("new").await.unwrap();
        assert_eq!(newsletter.category, Some(Category::Newsletter));
        assert!(!newsletter.requires_response);

        // thread copies carry the same annotations
        let thread = store.get_thread("t-1").await.unwrap();
        assert!(thread.is_compressed());
        assert!(thread.messages().iter().all(|m| m.is_annotated()));

        let again = pipeline.process_inbox(&store).await;
        assert_eq!(again, ProcessReport::default());
    }

    #[tokio::test]
    async fn zero_score_counts_as_unprocessed() {
        let pipeline = TriagePipeline::local(&TriageConfig::default());
        let store = MailStore::new();
        let mut half = make_message("half", "t-h", "Hi", "Lunch?");
        half.category = Some(Category::Personal);
        store.add_messages(vec![half]).await;

        let report = pipeline.process_inbox(&store).await;
        assert_eq!(report.emails_processed, 1);
        assert!(store.get_message("half").await.unwrap().priority_score > 0.0);
    }
}
