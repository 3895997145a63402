//! Local thread compressor: clean, extract, pool, dedupe, render, measure.

use std::collections::hash_map::RandomState;
use std::collections::{BTreeMap, HashSet};

use serde::Serialize;
use tracing::{debug, info};

use super::cleaner::clean_message;
use super::extract::{
    extract_action_items, extract_decisions, extract_questions, extract_timeline,
};
use super::format::{Findings, format_digest};
use super::{compression_ratio, estimate_tokens};
use crate::config::DedupStrategy;
use crate::model::{Digest, Thread};

pub const MAX_DECISIONS: usize = 10;
pub const MAX_QUESTIONS: usize = 10;
pub const MAX_TIMELINE: usize = 15;

/// Compresses threads into a [`Digest`] using keyword and regex heuristics.
///
/// With [`DedupStrategy::Unordered`] the surviving decisions and questions
/// come out in hash-set order. The hasher is fixed per compressor, so one
/// instance is repeatable while two instances may order differently.
#[derive(Debug, Clone)]
pub struct ThreadCompressor {
    dedup: DedupStrategy,
    hasher: RandomState,
}

impl Default for ThreadCompressor {
    fn default() -> Self {
        Self::new(DedupStrategy::default())
    }
}

impl ThreadCompressor {
    pub fn new(dedup: DedupStrategy) -> Self {
        Self {
            dedup,
            hasher: RandomState::new(),
        }
    }

    pub fn dedup_strategy(&self) -> DedupStrategy {
        self.dedup
    }

    /// Build a digest without touching the thread.
    pub fn digest(&self, thread: &Thread) -> Digest {
        let original_token_count = estimate_tokens(&thread.total_text());
        let findings = self.collect_findings(thread);
        let summary = format_digest(&findings);
        let compressed_token_count = estimate_tokens(&summary);

        Digest {
            summary,
            key_decisions: findings.key_decisions,
            unresolved_questions: findings.unresolved_questions,
            action_items_by_person: findings.action_items,
            timeline: findings.timeline,
            original_token_count,
            compressed_token_count,
            compression_ratio: compression_ratio(original_token_count, compressed_token_count),
        }
    }

    /// Compress in place and hand the thread back.
    pub fn compress<'a>(&self, thread: &'a mut Thread) -> &'a mut Thread {
        let digest = self.digest(thread);
        info!(
            thread_id = %thread.thread_id,
            messages = thread.message_count(),
            original_tokens = digest.original_token_count,
            compressed_tokens = digest.compressed_token_count,
            ratio = digest.compression_ratio,
            "Thread compressed"
        );
        thread.apply_digest(digest);
        thread
    }

    pub fn stats(&self, thread: &Thread) -> CompressionStats {
        CompressionStats::from(thread)
    }

    fn collect_findings(&self, thread: &Thread) -> Findings {
        let mut decisions = Vec::new();
        let mut questions = Vec::new();
        let mut action_items: BTreeMap<String, Vec<String>> = BTreeMap::new();
        let mut timeline = Vec::new();

        // single ordered pass: per-message caps depend on extraction order
        for message in thread.messages() {
            let cleaned = clean_message(message);
            decisions.extend(extract_decisions(&cleaned));
            questions.extend(extract_questions(&cleaned));
            for (person, items) in extract_action_items(&cleaned) {
                action_items.entry(person).or_default().extend(items);
            }
            timeline.extend(extract_timeline(&cleaned));
        }

        debug!(
            thread_id = %thread.thread_id,
            decisions = decisions.len(),
            questions = questions.len(),
            people = action_items.len(),
            events = timeline.len(),
            "Raw findings extracted"
        );

        let mut key_decisions = self.dedupe(decisions);
        key_decisions.truncate(MAX_DECISIONS);
        let mut unresolved_questions = self.dedupe(questions);
        unresolved_questions.truncate(MAX_QUESTIONS);
        timeline.truncate(MAX_TIMELINE);

        Findings {
            key_decisions,
            unresolved_questions,
            action_items,
            timeline,
        }
    }

    fn dedupe(&self, items: Vec<String>) -> Vec<String> {
        match self.dedup {
            DedupStrategy::Unordered => {
                let mut set = HashSet::with_hasher(self.hasher.clone());
                set.extend(items);
                set.into_iter().collect()
            }
            DedupStrategy::FirstSeen => {
                let mut seen = HashSet::new();
                items
                    .into_iter()
                    .filter(|item| seen.insert(item.clone()))
                    .collect()
            }
        }
    }
}

/// Compression figures for one thread, as reported over the API.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompressionStats {
    pub message_count: usize,
    pub original_tokens: usize,
    pub compressed_tokens: usize,
    pub compression_ratio_pct: f64,
    /// Negative when the digest outgrew the thread.
    pub tokens_saved: i64,
    pub decisions_extracted: usize,
    pub questions_identified: usize,
    pub action_items_count: usize,
}

impl From<&Thread> for CompressionStats {
    fn from(thread: &Thread) -> Self {
        Self {
            message_count: thread.message_count(),
            original_tokens: thread.original_token_count,
            compressed_tokens: thread.compressed_token_count,
            compression_ratio_pct: super::round2(thread.compression_ratio),
            tokens_saved: thread.original_token_count as i64
                - thread.compressed_token_count as i64,
            decisions_extracted: thread.key_decisions.len(),
            questions_identified: thread.unresolved_questions.len(),
            action_items_count: thread.action_items_by_person.values().map(Vec::len).sum(),
        }
    }
}
