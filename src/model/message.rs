//! Message-level types: addresses, categories, priority levels, intents.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ── Category ────────────────────────────────────────────────────────

/// Triage category assigned by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Urgent,
    Work,
    Personal,
    Newsletter,
    Promotional,
    Spam,
    Social,
}

impl Category {
    /// Every category, in declaration order.
    pub const ALL: [Category; 7] = [
        Self::Urgent,
        Self::Work,
        Self::Personal,
        Self::Newsletter,
        Self::Promotional,
        Self::Spam,
        Self::Social,
    ];

    /// Lowercase wire name.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Urgent => "urgent",
            Self::Work => "work",
            Self::Personal => "personal",
            Self::Newsletter => "newsletter",
            Self::Promotional => "promotional",
            Self::Spam => "spam",
            Self::Social => "social",
        }
    }

    /// Bulk mail never expects a reply.
    pub const fn is_bulk(&self) -> bool {
        matches!(self, Self::Newsletter | Self::Promotional | Self::Spam)
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_lowercase();
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == lower)
            .ok_or_else(|| format!("Unknown category: {s}"))
    }
}

// ── Priority level ──────────────────────────────────────────────────

/// Discrete priority bucket derived from a 0–100 score.
///
/// Ordered from least to most pressing so `Ord` compares by urgency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PriorityLevel {
    /// No response needed.
    Minimal = 1,
    /// Respond within a week.
    Low = 2,
    /// Respond within 2 days.
    Medium = 3,
    /// Respond same day.
    High = 4,
    /// Respond within the hour.
    Critical = 5,
}

impl PriorityLevel {
    pub const ALL: [PriorityLevel; 5] = [
        Self::Critical,
        Self::High,
        Self::Medium,
        Self::Low,
        Self::Minimal,
    ];

    /// Map a score onto its level. Thresholds are inclusive lower bounds.
    pub fn from_score(score: f64) -> Self {
        if score >= 85.0 {
            Self::Critical
        } else if score >= 70.0 {
            Self::High
        } else if score >= 50.0 {
            Self::Medium
        } else if score >= 30.0 {
            Self::Low
        } else {
            Self::Minimal
        }
    }

    /// Uppercase wire name.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Critical => "CRITICAL",
            Self::High => "HIGH",
            Self::Medium => "MEDIUM",
            Self::Low => "LOW",
            Self::Minimal => "MINIMAL",
        }
    }
}

impl std::fmt::Display for PriorityLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PriorityLevel {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.to_uppercase();
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == upper)
            .ok_or_else(|| format!("Unknown priority: {s}"))
    }
}

// ── Intent ──────────────────────────────────────────────────────────

/// What the sender appears to want.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    ScheduleMeeting,
    RequestInfo,
    Unsubscribe,
    StatusUpdate,
    ReviewRequest,
}

impl Intent {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ScheduleMeeting => "schedule_meeting",
            Self::RequestInfo => "request_info",
            Self::Unsubscribe => "unsubscribe",
            Self::StatusUpdate => "status_update",
            Self::ReviewRequest => "review_request",
        }
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Address ─────────────────────────────────────────────────────────

/// An email address with optional display name.
///
/// `domain` is derived once from `email` at construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub email: String,
    #[serde(rename = "name")]
    pub display_name: Option<String>,
    pub domain: Option<String>,
}

impl Address {
    pub fn new(email: impl Into<String>) -> Self {
        let email = email.into();
        let domain = email.split('@').nth(1).map(str::to_string);
        Self {
            email,
            display_name: None,
            domain,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// Lowercased domain for set lookups.
    pub fn domain_lower(&self) -> Option<String> {
        self.domain.as_deref().map(str::to_lowercase)
    }
}

// ── Message ─────────────────────────────────────────────────────────

/// A single email.
///
/// Identity fields are set by ingestion; annotation fields start empty and
/// are filled in place by the classifier and scorer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub thread_id: String,
    pub subject: String,
    pub sender: Address,
    pub recipients: Vec<Address>,
    #[serde(default)]
    pub cc: Vec<Address>,
    #[serde(default)]
    pub body_text: String,
    pub received_at: DateTime<Utc>,
    #[serde(default)]
    pub in_reply_to: Option<String>,
    #[serde(default)]
    pub references: Vec<String>,

    // annotations
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub priority_score: f64,
    #[serde(default)]
    pub priority_level: Option<PriorityLevel>,
    #[serde(default)]
    pub detected_intent: Option<Intent>,
    #[serde(default)]
    pub requires_response: bool,
}

impl Message {
    /// Create an unannotated message.
    pub fn new(
        id: impl Into<String>,
        thread_id: impl Into<String>,
        subject: impl Into<String>,
        sender: Address,
        body_text: impl Into<String>,
        received_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            thread_id: thread_id.into(),
            subject: subject.into(),
            sender,
            recipients: Vec::new(),
            cc: Vec::new(),
            body_text: body_text.into(),
            received_at,
            in_reply_to: None,
            references: Vec::new(),
            category: None,
            priority_score: 0.0,
            priority_level: None,
            detected_intent: None,
            requires_response: false,
        }
    }

    pub fn with_recipients(mut self, recipients: Vec<Address>) -> Self {
        self.recipients = recipients;
        self
    }

    /// Copy identity fields with a replacement body, dropping annotations.
    pub fn with_cleaned_body(&self, body_text: String) -> Self {
        let mut cleaned = Self::new(
            self.id.clone(),
            self.thread_id.clone(),
            self.subject.clone(),
            self.sender.clone(),
            body_text,
            self.received_at,
        );
        cleaned.recipients = self.recipients.clone();
        cleaned
    }

    /// Subject and body joined by a space.
    pub fn full_text(&self) -> String {
        format!("{} {}", self.subject, self.body_text)
    }

    /// Whether the classifier has already run.
    pub fn is_classified(&self) -> bool {
        self.category.is_some()
    }

    /// Whether both classification and scoring have run.
    pub fn is_annotated(&self) -> bool {
        self.category.is_some() && self.priority_score > 0.0
    }
}
