//! Deterministic synthetic inbox for development and demos.
//!
//! Every value comes from one seeded [`StdRng`], so a seed and an anchor
//! time fully determine the output. Messages are produced unannotated.

use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use crate::model::{Address, Category, Message, Thread};

/// Share of each category in [`MockGenerator::generate_batch`].
pub const DEFAULT_DISTRIBUTION: [(Category, f64); 6] = [
    (Category::Work, 0.35),
    (Category::Personal, 0.15),
    (Category::Newsletter, 0.25),
    (Category::Promotional, 0.15),
    (Category::Urgent, 0.05),
    (Category::Social, 0.05),
];

/// Long threads added by [`MockGenerator::generate_inbox`].
const INBOX_THREADS: usize = 5;

// ── Templates ───────────────────────────────────────────────────────

const WORK_SUBJECTS: &[&str] = &[
    "Q4 Project Status Update",
    "Meeting Request: Product Roadmap Discussion",
    "URGENT: Server Issues in Production",
    "Code Review: PR #1234",
    "Team Sync - Weekly Planning",
    "Budget Approval Needed",
    "Client Feedback on Latest Release",
    "Performance Review Schedule",
    "Security Audit Results",
    "API Integration Questions",
];

const PERSONAL_SUBJECTS: &[&str] = &[
    "Dinner plans this weekend?",
    "Happy Birthday!",
    "Vacation photos",
    "Quick question about the party",
    "Thanks for your help!",
    "Catching up",
    "Movie recommendations?",
    "Family reunion details",
];

const NEWSLETTER_SUBJECTS: &[&str] = &[
    "Weekly Tech Newsletter - Issue #127",
    "Your Monthly Summary",
    "Top Stories This Week",
    "New Articles You Might Like",
    "Developer Updates - February 2026",
];

const PROMOTIONAL_SUBJECTS: &[&str] = &[
    "50% OFF - Limited Time Offer!",
    "Exclusive Deal Just For You",
    "New Arrivals - Check Them Out",
    "Flash Sale Ends Tonight",
    "Your Personalized Recommendations",
];

const WORK_SENTENCES: &[&str] = &[
    "The migration scripts ran cleanly against staging last night.",
    "We decided to postpone the vendor evaluation until January.",
    "Agreed to keep the current API version for mobile clients.",
    "Priya will update the runbook with the new failover steps.",
    "Marcus should prepare the capacity forecast for the review.",
    "Can we get the load test numbers before the planning meeting?",
    "Who owns the on-call rotation for the holiday week?",
    "The client asked for a revised timeline on the reporting module.",
    "Meeting scheduled for Thursday to walk through the audit findings.",
    "Error rates dropped after the cache configuration change.",
    "Final decision is to ship the billing fix behind a feature flag.",
    "Sam needs to sign off on the budget before procurement can proceed.",
    "Is the staging environment still pinned to the old database?",
    "Deadline for the security questionnaire is Friday afternoon.",
    "The design review surfaced three open issues with the data model.",
    "Jordan will follow up with legal about the contract wording.",
    "Latency on the search endpoint is back under the target.",
    "We approved the request to add two more build agents.",
];

const CASUAL_SENTENCES: &[&str] = &[
    "It was so good to see everyone last weekend.",
    "The new place downtown has amazing tacos.",
    "Are you still up for the hike on Saturday?",
    "I finally finished that book you lent me.",
    "The kids had a great time at the lake.",
    "Mom says the reunion is at the usual park this year.",
    "Let me know if you want me to bring anything.",
    "The photos from the trip came out really well.",
    "Did you ever hear back about the apartment?",
    "We should plan something before the holidays.",
];

const BULK_SENTENCES: &[&str] = &[
    "This week we look at what changed in the latest compiler release.",
    "Readers shared their favourite productivity tools.",
    "Our editors picked five stories worth your time.",
    "Browse the new collection curated just for you.",
    "Members get early access to everything in the catalogue.",
    "A community survey shows remote teams are growing.",
    "New tutorials cover testing, tracing and deployment.",
    "Thousands of shoppers have already grabbed theirs.",
    "Someone viewed your profile this week.",
    "You have new connection suggestions waiting.",
    "Your account has been selected for a special reward.",
    "Claim your prize before the window closes.",
];

const FIRST_NAMES: &[&str] = &[
    "Alice", "Bob", "Carol", "David", "Elena", "Farid", "Grace", "Hiro", "Imani", "Jonas",
    "Keiko", "Liam", "Maya", "Noah", "Olga", "Pedro", "Quinn", "Rosa", "Sanjay", "Tara",
];

const LAST_NAMES: &[&str] = &[
    "Chen", "Okafor", "Schmidt", "Garcia", "Novak", "Haddad", "Kim", "Larsen", "Mensah",
    "Patel", "Rossi", "Silva", "Tanaka", "Walsh", "Yilmaz",
];

const WORK_DOMAINS: &[&str] = &["company.com", "organization.org"];
const PERSONAL_DOMAINS: &[&str] = &["gmail.com", "yahoo.com", "outlook.com", "proton.me"];
const NEWSLETTER_SENDERS: &[(&str, &str)] = &[
    ("Tech Weekly", "newsletter@techweekly.io"),
    ("Dev Digest", "digest@devdigest.dev"),
    ("The Morning Brief", "brief@morningbrief.news"),
];
const PROMO_SENDERS: &[(&str, &str)] = &[
    ("ShopMart", "deals@shopmart.com"),
    ("MegaStore", "offers@megastore.com"),
    ("Gadget Hub", "promo@gadgethub.shop"),
];
const SOCIAL_SENDERS: &[(&str, &str)] = &[
    ("LinkedIn", "notifications@linkedin.com"),
    ("Facebook", "notification@facebook.com"),
    ("Instagram", "no-reply@instagram.com"),
];
const SPAM_SENDERS: &[(&str, &str)] = &[
    ("Prize Desk", "winner@suspicious.com"),
    ("Account Team", "security@spam-domain.net"),
];

// ── Generator ───────────────────────────────────────────────────────

/// A generated inbox: standalone emails plus long threads.
#[derive(Debug, Clone, Serialize)]
pub struct MockInbox {
    pub emails: Vec<Message>,
    pub threads: Vec<Thread>,
}

impl MockInbox {
    pub fn total_thread_messages(&self) -> usize {
        self.threads.iter().map(Thread::message_count).sum()
    }
}

pub struct MockGenerator {
    rng: StdRng,
    /// Fixed clock; `None` reads the wall clock on every call.
    anchor: Option<DateTime<Utc>>,
}

impl MockGenerator {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            anchor: None,
        }
    }

    /// Generator whose "now" is fixed, for reproducible timestamps.
    pub fn anchored(seed: u64, now: DateTime<Utc>) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            anchor: Some(now),
        }
    }

    fn now(&self) -> DateTime<Utc> {
        self.anchor.unwrap_or_else(Utc::now)
    }

    /// One standalone email of the given category, received within the
    /// last 30 days.
    pub fn generate_email(&mut self, category: Category) -> Message {
        let id = self.uuid();
        let thread_id = self.uuid();
        let subject = self.subject(category);
        let sender = self.sender(category);
        let recipient = self.person(PERSONAL_DOMAINS);
        let body = self.body(category);

        let age = Duration::days(self.rng.gen_range(0..=30))
            + Duration::hours(self.rng.gen_range(0..=23))
            + Duration::minutes(self.rng.gen_range(0..=59));

        Message::new(id, thread_id, subject, sender, body, self.now() - age)
            .with_recipients(vec![recipient])
    }

    /// `count` emails drawn from [`DEFAULT_DISTRIBUTION`].
    pub fn generate_batch(&mut self, count: usize) -> Vec<Message> {
        self.generate_batch_with(count, &DEFAULT_DISTRIBUTION)
    }

    /// `count` emails drawn from a cumulative category distribution.
    /// Draws past the last cumulative share fall back to work.
    pub fn generate_batch_with(
        &mut self,
        count: usize,
        distribution: &[(Category, f64)],
    ) -> Vec<Message> {
        (0..count)
            .map(|_| {
                let draw: f64 = self.rng.r#gen();
                let mut cumulative = 0.0;
                let category = distribution
                    .iter()
                    .find(|(_, share)| {
                        cumulative += share;
                        draw <= cumulative
                    })
                    .map_or(Category::Work, |(c, _)| *c);
                self.generate_email(category)
            })
            .collect()
    }

    /// A work thread of `message_count` replies between 3–5 colleagues,
    /// starting 30 days ago.
    ///
    /// Message `i` lands `i * rand(2..=8)` hours after the start, so arrival
    /// order and reply order can disagree; [`Thread`] re-sorts by time.
    pub fn generate_thread(&mut self, message_count: usize, category: Category) -> Thread {
        let thread_id = self.uuid();
        let subject = self.pick(WORK_SUBJECTS).to_string();

        let wanted = self.rng.gen_range(3..=5);
        let mut participants: Vec<Address> = Vec::with_capacity(wanted);
        while participants.len() < wanted {
            let person = self.person(WORK_DOMAINS);
            if participants.iter().all(|p| p.email != person.email) {
                participants.push(person);
            }
        }

        let base = self.now() - Duration::days(30);
        let mut messages: Vec<Message> = Vec::with_capacity(message_count);
        let mut root_id: Option<String> = None;

        for i in 0..message_count {
            let sender = participants
                .choose(&mut self.rng)
                .cloned()
                .unwrap_or_else(|| Address::new("unknown@company.com"));
            let recipients = participants
                .iter()
                .filter(|p| p.email != sender.email)
                .cloned()
                .collect();
            let gap = self.rng.gen_range(2..=8_i64) * i as i64;

            let id = self.uuid();
            let line = if i == 0 {
                subject.clone()
            } else {
                format!("Re: {subject}")
            };
            let mut message = Message::new(
                id.clone(),
                thread_id.clone(),
                line,
                sender,
                self.body(category),
                base + Duration::hours(gap),
            )
            .with_recipients(recipients);
            message.in_reply_to = messages.last().map(|m| m.id.clone());
            if let Some(root) = &root_id {
                message.references = vec![root.clone()];
            } else {
                root_id = Some(id);
            }
            messages.push(message);
        }

        Thread::new(thread_id, subject, participants, messages)
    }

    /// A batch of `total` emails plus five threads of 30–70 messages, each
    /// either work or urgent.
    pub fn generate_inbox(&mut self, total: usize) -> MockInbox {
        let emails = self.generate_batch(total);
        let threads = (0..INBOX_THREADS)
            .map(|_| {
                let length = self.rng.gen_range(30..=70);
                let category = if self.rng.gen_bool(0.5) {
                    Category::Work
                } else {
                    Category::Urgent
                };
                self.generate_thread(length, category)
            })
            .collect();
        MockInbox { emails, threads }
    }

    // ── Pieces ──────────────────────────────────────────────────────

    fn uuid(&mut self) -> String {
        uuid::Builder::from_random_bytes(self.rng.r#gen())
            .into_uuid()
            .to_string()
    }

    fn pick(&mut self, items: &[&'static str]) -> &'static str {
        items.choose(&mut self.rng).copied().unwrap_or_default()
    }

    fn person(&mut self, domains: &[&'static str]) -> Address {
        let first = self.pick(FIRST_NAMES);
        let last = self.pick(LAST_NAMES);
        let domain = self.pick(domains);
        Address::new(format!(
            "{}.{}@{domain}",
            first.to_lowercase(),
            last.to_lowercase()
        ))
        .with_name(format!("{first} {last}"))
    }

    fn sender(&mut self, category: Category) -> Address {
        let brands = match category {
            Category::Work | Category::Urgent => return self.person(WORK_DOMAINS),
            Category::Personal => return self.person(PERSONAL_DOMAINS),
            Category::Newsletter => NEWSLETTER_SENDERS,
            Category::Promotional => PROMO_SENDERS,
            Category::Social => SOCIAL_SENDERS,
            Category::Spam => SPAM_SENDERS,
        };
        match brands.choose(&mut self.rng) {
            Some((name, email)) => Address::new(*email).with_name(*name),
            None => self.person(PERSONAL_DOMAINS),
        }
    }

    fn subject(&mut self, category: Category) -> String {
        let pool = match category {
            Category::Work => WORK_SUBJECTS,
            Category::Personal => PERSONAL_SUBJECTS,
            Category::Newsletter => NEWSLETTER_SUBJECTS,
            Category::Promotional => PROMOTIONAL_SUBJECTS,
            Category::Urgent => WORK_SENTENCES,
            Category::Social | Category::Spam => BULK_SENTENCES,
        };
        self.pick(pool).trim_end_matches('.').to_string()
    }

    fn paragraph(&mut self, pool: &[&'static str], sentences: usize) -> String {
        (0..sentences)
            .map(|_| self.pick(pool))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn body(&mut self, category: Category) -> String {
        let variant = self.rng.gen_range(0..3);
        match category {
            Category::Work => match variant {
                0 => format!(
                    "Hi team,\n\n{}\n\nCould you please review and provide feedback by end of day?\n\nBest regards,",
                    self.paragraph(WORK_SENTENCES, 5)
                ),
                1 => format!(
                    "Hello,\n\n{}\n\nLet me know if you have any questions.\n\nThanks,",
                    self.paragraph(WORK_SENTENCES, 3)
                ),
                _ => format!(
                    "Quick update:\n\n{}\n\nNext steps:\n- {}\n- {}\n\nPlease confirm.",
                    self.paragraph(WORK_SENTENCES, 4),
                    self.pick(WORK_SENTENCES),
                    self.pick(WORK_SENTENCES)
                ),
            },
            Category::Personal => match variant {
                0 => format!(
                    "Hey!\n\n{}\n\nLet me know what you think!\n\nCheers,",
                    self.paragraph(CASUAL_SENTENCES, 3)
                ),
                1 => format!(
                    "Hi there,\n\n{}\n\nTalk soon!",
                    self.paragraph(CASUAL_SENTENCES, 2)
                ),
                _ => format!("{}\n\nTake care!", self.paragraph(CASUAL_SENTENCES, 4)),
            },
            Category::Newsletter => {
                if variant == 0 {
                    format!(
                        "# Top Stories This Week\n\n{}\n\n## Featured Article\n{}\n\nUnsubscribe | Manage Preferences",
                        self.paragraph(BULK_SENTENCES, 6),
                        self.paragraph(BULK_SENTENCES, 4)
                    )
                } else {
                    format!(
                        "Your weekly digest:\n\n{}\n\nRead more on our website\n\nTo unsubscribe, click here.",
                        self.paragraph(BULK_SENTENCES, 8)
                    )
                }
            }
            Category::Promotional => {
                if variant == 0 {
                    format!(
                        "🎉 SPECIAL OFFER INSIDE! 🎉\n\n{}\n\nUse code: SAVE50\n\nShop now: [link]\n\nUnsubscribe",
                        self.paragraph(BULK_SENTENCES, 3)
                    )
                } else {
                    format!(
                        "Don't miss out on this amazing deal!\n\n{}\n\nLimited time only!\n\nUnsubscribe from promotional emails.",
                        self.paragraph(BULK_SENTENCES, 4)
                    )
                }
            }
            Category::Urgent => {
                if variant == 0 {
                    format!(
                        "URGENT: {}\n\n{}\n\nPlease address this ASAP.\n\nThanks,",
                        self.pick(WORK_SENTENCES),
                        self.paragraph(WORK_SENTENCES, 3)
                    )
                } else {
                    format!(
                        "IMMEDIATE ACTION REQUIRED\n\n{}\n\nDeadline: Today EOD\n\nPlease confirm receipt.",
                        self.paragraph(WORK_SENTENCES, 2)
                    )
                }
            }
            Category::Social | Category::Spam => self.paragraph(BULK_SENTENCES, 5),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn anchor() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn same_seed_same_inbox() {
        let a = MockGenerator::anchored(7, anchor()).generate_batch(20);
        let b = MockGenerator::anchored(7, anchor()).generate_batch(20);

        for (x, y) in a.iter().zip(&b) {
            assert_eq!(x.id, y.id);
            assert_eq!(x.subject, y.subject);
            assert_eq!(x.body_text, y.body_text);
            assert_eq!(x.received_at, y.received_at);
        }
    }

    #[test]
    fn different_seeds_diverge() {
        let a = MockGenerator::anchored(1, anchor()).generate_batch(5);
        let b = MockGenerator::anchored(2, anchor()).generate_batch(5);
        assert_ne!(
            a.iter().map(|m| &m.id).collect::<Vec<_>>(),
            b.iter().map(|m| &m.id).collect::<Vec<_>>()
        );
    }

    #[test]
    fn emails_are_unannotated_and_recent() {
        let now = anchor();
        let emails = MockGenerator::anchored(42, now).generate_batch(50);

        assert_eq!(emails.len(), 50);
        for email in &emails {
            assert!(email.category.is_none());
            assert_eq!(email.priority_score, 0.0);
            assert_eq!(email.recipients.len(), 1);
            assert_ne!(email.id, email.thread_id);
            assert!(uuid::Uuid::parse_str(&email.id).is_ok());
            assert!(email.received_at <= now);
            assert!(now - email.received_at < Duration::days(31));
        }
    }

    #[test]
    fn single_category_distribution() {
        let emails = MockGenerator::anchored(3, anchor())
            .generate_batch_with(10, &[(Category::Newsletter, 1.0)]);
        assert!(
            emails
                .iter()
                .all(|m| m.body_text.to_lowercase().contains("unsubscribe"))
        );
        assert!(emails.iter().all(|m| NEWSLETTER_SUBJECTS.contains(&m.subject.as_str())));
    }

    #[test]
    fn empty_distribution_defaults_to_work() {
        let emails = MockGenerator::anchored(3, anchor()).generate_batch_with(5, &[]);
        assert!(emails.iter().all(|m| WORK_SUBJECTS.contains(&m.subject.as_str())));
        assert!(
            emails
                .iter()
                .all(|m| m.sender.domain.as_deref().is_some_and(|d| WORK_DOMAINS.contains(&d)))
        );
    }

    #[test]
    fn thread_shape() {
        let now = anchor();
        let thread = MockGenerator::anchored(9, now).generate_thread(12, Category::Work);

        assert_eq!(thread.message_count(), 12);
        assert!((3..=5).contains(&thread.participants.len()));
        assert!(thread.first_message_at() >= Some(now - Duration::days(30)));

        let replies = thread
            .messages()
            .iter()
            .filter(|m| m.subject.starts_with("Re: "))
            .count();
        assert_eq!(replies, 11);

        for message in thread.messages() {
            assert_eq!(message.thread_id, thread.thread_id);
            assert!(thread.participants.contains(&message.sender));
            assert!(message.recipients.iter().all(|r| r.email != message.sender.email));
        }

        // exactly one opener without a parent
        let openers: Vec<_> = thread
            .messages()
            .iter()
            .filter(|m| m.in_reply_to.is_none())
            .collect();
        assert_eq!(openers.len(), 1);
        assert_eq!(openers[0].subject, thread.subject);
        assert!(openers[0].references.is_empty());
    }

    #[test]
    fn inbox_has_five_long_threads() {
        let inbox = MockGenerator::anchored(42, anchor()).generate_inbox(30);

        assert_eq!(inbox.emails.len(), 30);
        assert_eq!(inbox.threads.len(), 5);
        assert!(
            inbox
                .threads
                .iter()
                .all(|t| (30..=70).contains(&t.message_count()))
        );
        assert_eq!(
            inbox.total_thread_messages(),
            inbox.threads.iter().map(|t| t.messages().len()).sum::<usize>()
        );
    }
}
