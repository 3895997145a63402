//! Weighted priority scoring.
//!
//! Five sub-scores in 0–100 are blended by fixed weights, boosted for
//! urgent mail, and rounded to two decimals.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, warn};

use super::deadline::extract_deadline;
use crate::config::TriageConfig;
use crate::model::{Category, Message, PriorityLevel, Thread};

/// Urgency keywords and their weights (0–10). The strongest hit counts.
const URGENCY_KEYWORDS: &[(&str, f64)] = &[
    ("critical", 10.0),
    ("urgent", 10.0),
    ("asap", 9.0),
    ("immediate", 9.0),
    ("emergency", 10.0),
    ("deadline", 8.0),
    ("today", 7.0),
    ("now", 7.0),
    ("important", 6.0),
    ("please review", 5.0),
    ("action required", 8.0),
    ("time sensitive", 8.0),
];

const URGENT_MULTIPLIER: f64 = 1.2;

/// Relative weight of each sub-score. Sums to 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreWeights {
    pub sender: f64,
    pub keyword: f64,
    pub deadline: f64,
    pub thread: f64,
    pub recency: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            sender: 0.30,
            keyword: 0.25,
            deadline: 0.25,
            thread: 0.10,
            recency: 0.10,
        }
    }
}

/// Individual sub-scores behind a final priority.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub sender: f64,
    pub keyword: f64,
    pub deadline: f64,
    pub thread: f64,
    pub recency: f64,
}

impl ScoreBreakdown {
    fn weighted(&self, weights: &ScoreWeights) -> f64 {
        self.sender * weights.sender
            + self.keyword * weights.keyword
            + self.deadline * weights.deadline
            + self.thread * weights.thread
            + self.recency * weights.recency
    }
}

pub struct PriorityScorer {
    weights: ScoreWeights,
    vip_senders: HashMap<String, f64>,
    work_domains: HashSet<String>,
}

impl PriorityScorer {
    pub fn new(config: &TriageConfig) -> Self {
        let mut scorer = Self {
            weights: ScoreWeights::default(),
            vip_senders: HashMap::with_capacity(config.vip_senders.len()),
            work_domains: config
                .scorer_work_domains
                .iter()
                .map(|d| d.to_lowercase())
                .collect(),
        };
        for (email, importance) in &config.vip_senders {
            scorer.add_vip_sender(email, *importance);
        }
        scorer
    }

    pub fn weights(&self) -> &ScoreWeights {
        &self.weights
    }

    /// Register or update a VIP sender. Importance is clamped to 0–100;
    /// NaN and infinite values are ignored.
    pub fn add_vip_sender(&mut self, email: &str, importance: f64) {
        if !importance.is_finite() {
            warn!(email, importance, "Ignoring non-finite VIP importance");
            return;
        }
        self.vip_senders
            .insert(email.trim().to_lowercase(), importance.clamp(0.0, 100.0));
    }

    pub fn add_work_domain(&mut self, domain: &str) {
        self.work_domains.insert(domain.trim().to_lowercase());
    }

    /// Score against the current wall clock.
    pub fn score(&self, message: &Message, thread: Option<&Thread>) -> f64 {
        self.score_at(message, thread, Utc::now())
    }

    /// Score as of `now`. Result is in 0–100, rounded to two decimals.
    pub fn score_at(&self, message: &Message, thread: Option<&Thread>, now: DateTime<Utc>) -> f64 {
        let breakdown = self.breakdown_at(message, thread, now);
        let mut score = breakdown.weighted(&self.weights);
        if message.category == Some(Category::Urgent) {
            score = (score * URGENT_MULTIPLIER).min(100.0);
        }
        let score = round2(score);

        debug!(
            id = %message.id,
            score,
            sender = breakdown.sender,
            keyword = breakdown.keyword,
            deadline = breakdown.deadline,
            thread = breakdown.thread,
            recency = breakdown.recency,
            "Message scored"
        );
        score
    }

    /// Compute the five sub-scores without blending.
    pub fn breakdown_at(
        &self,
        message: &Message,
        thread: Option<&Thread>,
        now: DateTime<Utc>,
    ) -> ScoreBreakdown {
        let text = message.full_text().to_lowercase();
        ScoreBreakdown {
            sender: self.sender_importance(message),
            keyword: keyword_urgency(&text),
            deadline: deadline_urgency(&text, now),
            thread: thread_activity(thread, now),
            recency: recency(message.received_at, now),
        }
    }

    /// Score a message and write `priority_score` and `priority_level`.
    pub fn annotate(&self, message: &mut Message, thread: Option<&Thread>) -> f64 {
        let score = self.score(message, thread);
        message.priority_score = score;
        message.priority_level = Some(Self::level(score));
        score
    }

    pub fn level(score: f64) -> PriorityLevel {
        PriorityLevel::from_score(score)
    }

    fn sender_importance(&self, message: &Message) -> f64 {
        if let Some(score) = self.vip_senders.get(&message.sender.email.to_lowercase()) {
            return *score;
        }
        match message.sender.domain_lower() {
            Some(domain) if self.work_domains.contains(&domain) => 60.0,
            _ => 40.0,
        }
    }
}

// ── Sub-scores ──────────────────────────────────────────────────────

fn keyword_urgency(lower_text: &str) -> f64 {
    URGENCY_KEYWORDS
        .iter()
        .filter(|(kw, _)| lower_text.contains(kw))
        .map(|(_, weight)| *weight)
        .fold(0.0, f64::max)
        * 10.0
}

fn deadline_urgency(lower_text: &str, now: DateTime<Utc>) -> f64 {
    let Some(deadline) = extract_deadline(lower_text, now) else {
        return 30.0;
    };
    let hours_until = hours_between(now, deadline);
    if hours_until < 0.0 {
        100.0
    } else if hours_until < 4.0 {
        95.0
    } else if hours_until < 24.0 {
        80.0
    } else if hours_until < 48.0 {
        60.0
    } else if hours_until < 168.0 {
        40.0
    } else {
        20.0
    }
}

fn thread_activity(thread: Option<&Thread>, now: DateTime<Utc>) -> f64 {
    let Some(thread) = thread.filter(|t| t.message_count() > 1) else {
        return 50.0;
    };
    let mut score = (thread.message_count() as f64 * 2.0).min(50.0);
    if let Some(last) = thread.last_message_at() {
        let hours_since = hours_between(last, now);
        if hours_since < 2.0 {
            score += 30.0;
        } else if hours_since < 24.0 {
            score += 20.0;
        }
    }
    score.min(100.0)
}

fn recency(received_at: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    let age_hours = hours_between(received_at, now);
    if age_hours < 1.0 {
        100.0
    } else if age_hours < 4.0 {
        80.0
    } else if age_hours < 24.0 {
        60.0
    } else if age_hours < 72.0 {
        40.0
    } else {
        20.0
    }
}

fn hours_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    (to - from).num_milliseconds() as f64 / 3_600_000.0
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    use crate::ingestion::MockGenerator;
    use crate::model::Address;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 10, 9, 0, 0).unwrap()
    }

    fn make_message(sender: &str, subject: &str, body: &str, age: Duration) -> Message {
        Message::new("m-1", "t-1", subject, Address::new(sender), body, now() - age)
    }

    fn scorer() -> PriorityScorer {
        PriorityScorer::new(&TriageConfig::default())
    }

    #[test]
    fn urgent_work_message_scores_high() {
        let mut msg = make_message(
            "ops@company.com",
            "URGENT: server down, respond ASAP",
            "",
            Duration::minutes(30),
        );
        msg.category = Some(Category::Urgent);

        let breakdown = scorer().breakdown_at(&msg, None, now());
        assert_eq!(breakdown.sender, 60.0);
        assert_eq!(breakdown.keyword, 100.0);
        assert_eq!(breakdown.deadline, 30.0);
        assert_eq!(breakdown.thread, 50.0);
        assert_eq!(breakdown.recency, 100.0);

        assert_eq!(round2(breakdown.weighted(&ScoreWeights::default())), 65.5);

        let score = scorer().score_at(&msg, None, now());
        assert_eq!(score, 78.6);
        assert_eq!(PriorityScorer::level(score), PriorityLevel::High);

        msg.category = Some(Category::Work);
        let unboosted = scorer().score_at(&msg, None, now());
        assert_eq!(unboosted, 65.5);
        assert_eq!(PriorityScorer::level(unboosted), PriorityLevel::Medium);
    }

    #[test]
    fn urgent_boost_caps_at_100() {
        let mut s = scorer();
        s.add_vip_sender("ceo@company.com", 100.0);
        let mut msg = make_message(
            "ceo@company.com",
            "Critical deadline",
            "deadline: 3/9/2026",
            Duration::minutes(1),
        );
        msg.category = Some(Category::Urgent);

        assert_eq!(s.score_at(&msg, None, now()), 100.0);
    }

    #[test]
    fn empty_body_scores_low_or_minimal() {
        for age in [Duration::minutes(5), Duration::days(5)] {
            let msg = make_message("someone@elsewhere.net", "Lunch plans", "", age);
            let score = scorer().score_at(&msg, None, now());
            let level = PriorityScorer::level(score);
            assert!(
                matches!(level, PriorityLevel::Low | PriorityLevel::Minimal),
                "score {score} gave {level}"
            );
        }
    }

    #[test]
    fn vip_overrides_domain() {
        let mut s = scorer();
        s.add_vip_sender("Boss@Elsewhere.net", 95.0);
        let msg = make_message("boss@elsewhere.net", "Hi", "", Duration::hours(1));
        assert_eq!(s.breakdown_at(&msg, None, now()).sender, 95.0);
    }

    #[test]
    fn vip_importance_is_clamped() {
        let mut s = scorer();
        s.add_vip_sender("x@y.com", 250.0);
        let msg = make_message("x@y.com", "Hi", "", Duration::hours(1));
        assert_eq!(s.breakdown_at(&msg, None, now()).sender, 100.0);
    }

    #[test]
    fn non_finite_vip_importance_is_ignored() {
        let mut s = scorer();
        s.add_vip_sender("boss@company.com", 90.0);
        s.add_vip_sender("boss@company.com", f64::NAN);
        s.add_vip_sender("nan@elsewhere.net", f64::NAN);
        s.add_vip_sender("inf@elsewhere.net", f64::INFINITY);

        let boss = make_message("boss@company.com", "Hi", "", Duration::hours(1));
        assert_eq!(s.breakdown_at(&boss, None, now()).sender, 90.0);

        for sender in ["nan@elsewhere.net", "inf@elsewhere.net"] {
            let msg = make_message(sender, "Hi", "", Duration::hours(1));
            assert_eq!(s.breakdown_at(&msg, None, now()).sender, 40.0);
            let score = s.score_at(&msg, None, now());
            assert!((0.0..=100.0).contains(&score), "{sender} scored {score}");
        }
    }

    #[test]
    fn config_built_scorer_ignores_non_finite_vips() {
        let mut config = TriageConfig::default();
        config.vip_senders.insert("Boss@Elsewhere.net".into(), f64::NAN);
        config.vip_senders.insert("cfo@elsewhere.net".into(), 85.0);
        let s = PriorityScorer::new(&config);

        let boss = make_message("boss@elsewhere.net", "Hi", "", Duration::hours(1));
        assert_eq!(s.breakdown_at(&boss, None, now()).sender, 40.0);
        let cfo = make_message("cfo@elsewhere.net", "Hi", "", Duration::hours(1));
        assert_eq!(s.breakdown_at(&cfo, None, now()).sender, 85.0);
    }

    #[test]
    fn mock_inbox_scores_stay_in_range() {
        let mut generator = MockGenerator::anchored(7, now());
        let inbox = generator.generate_inbox(200);
        let s = scorer();

        let mut checked = 0;
        let mut check = |message: &Message, thread: Option<&Thread>| {
            for category in [None, Some(Category::Work), Some(Category::Urgent)] {
                let mut message = message.clone();
                message.category = category;
                let score = s.score_at(&message, thread, now());
                assert!((0.0..=100.0).contains(&score), "{} scored {score}", message.id);
                assert_eq!(round2(score), score, "{} not rounded: {score}", message.id);
                checked += 1;
            }
        };
        for message in &inbox.emails {
            check(message, None);
        }
        for thread in &inbox.threads {
            for message in thread.messages() {
                check(message, Some(thread));
            }
        }
        assert_eq!(checked, 3 * (200 + inbox.total_thread_messages()));
    }

    #[test]
    fn added_work_domain_counts() {
        let mut s = scorer();
        let msg = make_message("dev@acme.io", "Hi", "", Duration::hours(1));
        assert_eq!(s.breakdown_at(&msg, None, now()).sender, 40.0);
        s.add_work_domain("ACME.io");
        assert_eq!(s.breakdown_at(&msg, None, now()).sender, 60.0);
    }

    #[test]
    fn strongest_keyword_wins() {
        assert_eq!(keyword_urgency("please review this important doc"), 60.0);
        assert_eq!(keyword_urgency("nothing here"), 0.0);
        assert_eq!(keyword_urgency("action required: emergency"), 100.0);
    }

    #[test]
    fn deadline_buckets() {
        assert_eq!(deadline_urgency("no dates", now()), 30.0);
        assert_eq!(deadline_urgency("deadline: 3/1/2026", now()), 100.0);
        assert_eq!(deadline_urgency("before 11:00 am", now()), 95.0);
        assert_eq!(deadline_urgency("before 8:00 pm", now()), 80.0);
        assert_eq!(deadline_urgency("due 3/11/2026", now()), 80.0);
        assert_eq!(deadline_urgency("due 3/12/2026", now()), 60.0);
        assert_eq!(deadline_urgency("by march 15", now()), 40.0);
        assert_eq!(deadline_urgency("by april 30", now()), 20.0);
    }

    #[test]
    fn recency_buckets() {
        let at = |h: i64| now() - Duration::hours(h);
        assert_eq!(recency(now() - Duration::minutes(59), now()), 100.0);
        assert_eq!(recency(at(3), now()), 80.0);
        assert_eq!(recency(at(23), now()), 60.0);
        assert_eq!(recency(at(71), now()), 40.0);
        assert_eq!(recency(at(72), now()), 20.0);
        // clock skew: future mail counts as fresh
        assert_eq!(recency(now() + Duration::hours(2), now()), 100.0);
    }

    #[test]
    fn thread_activity_rules() {
        let msg = |id: &str, age: Duration| {
            Message::new(id, "t-1", "s", Address::new("a@b.com"), "", now() - age)
        };
        assert_eq!(thread_activity(None, now()), 50.0);

        let single = Thread::new("t-1", "s", vec![], vec![msg("a", Duration::hours(1))]);
        assert_eq!(thread_activity(Some(&single), now()), 50.0);

        let hot = Thread::new(
            "t-1",
            "s",
            vec![],
            vec![msg("a", Duration::hours(5)), msg("b", Duration::minutes(30))],
        );
        assert_eq!(thread_activity(Some(&hot), now()), 4.0 + 30.0);

        let warm = Thread::new(
            "t-1",
            "s",
            vec![],
            vec![msg("a", Duration::hours(30)), msg("b", Duration::hours(10))],
        );
        assert_eq!(thread_activity(Some(&warm), now()), 4.0 + 20.0);

        let long: Vec<Message> = (0..40)
            .map(|i| msg(&format!("m{i}"), Duration::days(3) + Duration::minutes(i)))
            .collect();
        let cold = Thread::new("t-1", "s", vec![], long);
        assert_eq!(thread_activity(Some(&cold), now()), 50.0);
    }

    #[test]
    fn annotate_writes_score_and_level() {
        let mut msg = make_message("a@company.com", "Status", "All good.", Duration::hours(2));
        let score = scorer().annotate(&mut msg, None);
        assert_eq!(msg.priority_score, score);
        assert_eq!(msg.priority_level, Some(PriorityScorer::level(score)));
        assert!((0.0..=100.0).contains(&score));
    }

    #[test]
    fn weights_sum_to_one() {
        let w = ScoreWeights::default();
        let sum = w.sender + w.keyword + w.deadline + w.thread + w.recency;
        assert!((sum - 1.0).abs() < 1e-9);
    }
}
