//! Rule-based category classifier.
//!
//! Categories are tried in a fixed order (spam, newsletter, promotional,
//! urgent, social). The first category with at least one matching predicate
//! wins, with confidence = matched / total predicates for that category.
//! Unmatched mail falls back to the configured work/personal lists, then
//! to a low-confidence `Work`.

use std::collections::HashSet;
use std::sync::Arc;

use regex::Regex;
use tracing::debug;

use crate::config::TriageConfig;
use crate::error::TriageError;
use crate::model::{Category, Message};

/// Confidence reported for configured work/personal matches.
const DOMAIN_MATCH_CONFIDENCE: f64 = 0.8;

/// Confidence reported when nothing matched at all.
const DEFAULT_CONFIDENCE: f64 = 0.3;

/// Which part of a message a predicate inspects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleField {
    Subject,
    Body,
    /// Subject and body joined by a space.
    SubjectOrBody,
    SenderEmail,
    SenderDomain,
}

impl RuleField {
    fn extract(self, message: &Message) -> Option<String> {
        match self {
            Self::Subject => Some(message.subject.clone()),
            Self::Body => Some(message.body_text.clone()),
            Self::SubjectOrBody => Some(message.full_text()),
            Self::SenderEmail => Some(message.sender.email.clone()),
            Self::SenderDomain => message.sender.domain.clone(),
        }
    }
}

/// User-supplied predicate. An `Err` counts as "no match".
pub type CustomPredicate = Arc<dyn Fn(&Message) -> Result<bool, TriageError> + Send + Sync>;

enum Matcher {
    /// Case-insensitive containment of any keyword.
    AnyKeyword(Vec<&'static str>),
    /// Case-sensitive containment of any literal.
    AnyLiteral(Vec<&'static str>),
    /// Exact (case-insensitive) membership.
    OneOf(Vec<&'static str>),
    Pattern(Regex),
    Custom(CustomPredicate),
}

/// A named boolean test against one message field.
pub struct Predicate {
    name: String,
    field: RuleField,
    matcher: Matcher,
}

impl Predicate {
    fn keywords(name: &str, field: RuleField, words: &[&'static str]) -> Self {
        Self {
            name: name.into(),
            field,
            matcher: Matcher::AnyKeyword(words.to_vec()),
        }
    }

    fn literals(name: &str, field: RuleField, words: &[&'static str]) -> Self {
        Self {
            name: name.into(),
            field,
            matcher: Matcher::AnyLiteral(words.to_vec()),
        }
    }

    fn one_of(name: &str, field: RuleField, values: &[&'static str]) -> Self {
        Self {
            name: name.into(),
            field,
            matcher: Matcher::OneOf(values.to_vec()),
        }
    }

    /// Compile a regex predicate.
    pub fn pattern(name: &str, field: RuleField, pattern: &str) -> Result<Self, TriageError> {
        let regex = Regex::new(pattern).map_err(|e| TriageError::InvalidRule {
            name: name.into(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            name: name.into(),
            field,
            matcher: Matcher::Pattern(regex),
        })
    }

    /// Wrap an arbitrary test. `field` is informational only.
    pub fn custom(name: &str, f: CustomPredicate) -> Self {
        Self {
            name: name.into(),
            field: RuleField::SubjectOrBody,
            matcher: Matcher::Custom(f),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn evaluate(&self, message: &Message) -> Result<bool, TriageError> {
        let value = || self.field.extract(message);

        let matched = match &self.matcher {
            Matcher::Custom(f) => return f(message),
            Matcher::AnyKeyword(words) => value().is_some_and(|v| {
                let lower = v.to_lowercase();
                words.iter().any(|w| lower.contains(w))
            }),
            Matcher::AnyLiteral(words) => value().is_some_and(|v| words.iter().any(|w| v.contains(w))),
            Matcher::OneOf(values) => value().is_some_and(|v| {
                let lower = v.to_lowercase();
                values.iter().any(|candidate| *candidate == lower)
            }),
            Matcher::Pattern(regex) => value().is_some_and(|v| regex.is_match(&v)),
        };
        Ok(matched)
    }

    /// Evaluate, treating failures as non-matching.
    fn matches(&self, message: &Message) -> bool {
        match self.evaluate(message) {
            Ok(matched) => matched,
            Err(e) => {
                debug!(
                    id = %message.id,
                    rule = %self.name,
                    error = %e,
                    "Predicate failed, treating as no match"
                );
                false
            }
        }
    }
}

/// All predicates backing one category.
pub struct CategoryRule {
    pub category: Category,
    predicates: Vec<Predicate>,
}

impl CategoryRule {
    pub fn new(category: Category, predicates: Vec<Predicate>) -> Self {
        Self {
            category,
            predicates,
        }
    }

    pub fn len(&self) -> usize {
        self.predicates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    fn matched_count(&self, message: &Message) -> usize {
        self.predicates.iter().filter(|p| p.matches(message)).count()
    }
}

/// Ordered rule classifier with configurable work/personal fallback lists.
pub struct RuleClassifier {
    rules: Vec<CategoryRule>,
    work_domains: HashSet<String>,
    personal_contacts: HashSet<String>,
}

impl RuleClassifier {
    /// Built-in rule table plus the configured fallback lists.
    pub fn new(config: &TriageConfig) -> Self {
        let mut classifier = Self {
            rules: default_rules(),
            work_domains: HashSet::new(),
            personal_contacts: HashSet::new(),
        };
        for domain in &config.work_domains {
            classifier.add_work_domain(domain);
        }
        for contact in &config.personal_contacts {
            classifier.add_personal_contact(contact);
        }
        classifier
    }

    /// A classifier with no rules (for testing).
    pub fn empty() -> Self {
        Self {
            rules: Vec::new(),
            work_domains: HashSet::new(),
            personal_contacts: HashSet::new(),
        }
    }

    pub fn add_work_domain(&mut self, domain: &str) {
        self.work_domains.insert(domain.trim().to_lowercase());
    }

    pub fn add_personal_contact(&mut self, email: &str) {
        self.personal_contacts.insert(email.trim().to_lowercase());
    }

    /// Append a predicate to a category's rule, creating the rule at the
    /// end of the evaluation order if the category has none yet.
    pub fn add_predicate(&mut self, category: Category, predicate: Predicate) {
        match self.rules.iter_mut().find(|r| r.category == category) {
            Some(rule) => rule.predicates.push(predicate),
            None => self.rules.push(CategoryRule::new(category, vec![predicate])),
        }
    }

    /// Categories in evaluation order.
    pub fn rule_order(&self) -> Vec<Category> {
        self.rules.iter().map(|r| r.category).collect()
    }

    /// Returns `(category, confidence)` with confidence in `[0, 1]`.
    pub fn classify(&self, message: &Message) -> (Category, f64) {
        for rule in &self.rules {
            if rule.is_empty() {
                continue;
            }
            let matched = rule.matched_count(message);
            if matched > 0 {
                let confidence = (matched as f64 / rule.len() as f64).min(1.0);
                debug!(
                    id = %message.id,
                    category = %rule.category,
                    matched,
                    total = rule.len(),
                    "Category rule matched"
                );
                return (rule.category, confidence);
            }
        }

        if message
            .sender
            .domain_lower()
            .is_some_and(|d| self.work_domains.contains(&d))
        {
            return (Category::Work, DOMAIN_MATCH_CONFIDENCE);
        }

        if self
            .personal_contacts
            .contains(&message.sender.email.to_lowercase())
        {
            return (Category::Personal, DOMAIN_MATCH_CONFIDENCE);
        }

        (Category::Work, DEFAULT_CONFIDENCE)
    }
}

fn default_rules() -> Vec<CategoryRule> {
    use RuleField::*;

    let noreply_named: CustomPredicate = Arc::new(|m: &Message| {
        Ok(m.sender.display_name.as_deref().is_some_and(|n| !n.is_empty())
            && m.sender.email.to_lowercase().contains("noreply"))
    });

    vec![
        CategoryRule::new(
            Category::Spam,
            vec![
                Predicate::keywords(
                    "spam subject",
                    Subject,
                    &["viagra", "casino", "lottery", "prince", "inheritance", "bitcoin wallet"],
                ),
                Predicate::one_of(
                    "spam domain",
                    SenderDomain,
                    &["suspicious.com", "spam-domain.net"],
                ),
            ],
        ),
        CategoryRule::new(
            Category::Newsletter,
            vec![
                Predicate::keywords(
                    "newsletter subject",
                    Subject,
                    &["newsletter", "digest", "weekly update", "monthly summary"],
                ),
                Predicate::keywords("unsubscribe footer", Body, &["unsubscribe"]),
                Predicate::custom("named noreply sender", noreply_named),
            ],
        ),
        CategoryRule::new(
            Category::Promotional,
            vec![
                Predicate::keywords(
                    "promo subject",
                    Subject,
                    &["sale", "discount", "offer", "deal", "promo", "% off", "50%"],
                ),
                Predicate {
                    name: "percent off body".into(),
                    field: Body,
                    matcher: Matcher::Pattern(percent_off_regex()),
                },
                Predicate::literals("promo emoji", Subject, &["🎉", "💰", "🛍️"]),
            ],
        ),
        CategoryRule::new(
            Category::Urgent,
            vec![
                Predicate::keywords(
                    "urgent subject",
                    Subject,
                    &["urgent", "asap", "immediate", "critical", "emergency"],
                ),
                Predicate::literals("triple bang", SubjectOrBody, &["!!!"]),
                Predicate::literals("shouted subject", Subject, &["URGENT", "IMMEDIATE ACTION"]),
            ],
        ),
        CategoryRule::new(
            Category::Social,
            vec![
                Predicate::one_of(
                    "social network",
                    SenderDomain,
                    &[
                        "facebook.com",
                        "twitter.com",
                        "linkedin.com",
                        "instagram.com",
                        "tiktok.com",
                    ],
                ),
                Predicate::keywords(
                    "social notification",
                    Subject,
                    &[
                        "tagged you",
                        "mentioned you",
                        "sent you a message",
                        "friend request",
                    ],
                ),
            ],
        ),
    ]
}

fn percent_off_regex() -> Regex {
    // static literal, cannot fail
    #[allow(clippy::expect_used)]
    Regex::new(r"(?i)\d+%\s+off").expect("percent-off regex")
}
