//! Triage agent: annotates a message with category, intent and whether
//! it needs a reply.

use tracing::debug;

use super::classifier::RuleClassifier;
use crate::config::TriageConfig;
use crate::model::{Intent, Message};

/// Ordered intent table; the first intent with a matching keyword wins.
const INTENT_KEYWORDS: &[(Intent, &[&str])] = &[
    (
        Intent::ScheduleMeeting,
        &["meeting", "schedule", "call", "zoom", "teams"],
    ),
    (Intent::RequestInfo, &["?", "question"]),
    (Intent::Unsubscribe, &["unsubscribe", "remove me", "opt out"]),
    (Intent::StatusUpdate, &["update", "status", "progress"]),
    (Intent::ReviewRequest, &["review", "feedback", "approve"]),
];

/// Phrases in a body that signal the sender expects an answer.
const RESPONSE_PHRASES: &[&str] = &[
    "please let me know",
    "can you",
    "could you",
    "would you",
    "please confirm",
    "please review",
    "please send",
    "waiting for",
    "looking forward to hearing",
    "please respond",
    "please reply",
    "asap",
];

/// Wraps the rule classifier and fills in the triage annotations.
pub struct TriageAgent {
    classifier: RuleClassifier,
}

impl TriageAgent {
    pub fn new(config: &TriageConfig) -> Self {
        Self {
            classifier: RuleClassifier::new(config),
        }
    }

    pub fn with_classifier(classifier: RuleClassifier) -> Self {
        Self { classifier }
    }

    pub fn classifier(&self) -> &RuleClassifier {
        &self.classifier
    }

    pub fn classifier_mut(&mut self) -> &mut RuleClassifier {
        &mut self.classifier
    }

    /// Set `category`, `detected_intent` and `requires_response` in place.
    ///
    /// Returns the category confidence.
    pub fn classify_message(&self, message: &mut Message) -> f64 {
        let (category, confidence) = self.classifier.classify(message);
        message.category = Some(category);
        message.detected_intent = infer_intent(message);
        message.requires_response = requires_response(message);

        debug!(
            id = %message.id,
            category = %category,
            confidence,
            intent = ?message.detected_intent,
            requires_response = message.requires_response,
            "Message classified"
        );
        confidence
    }
}

/// First-match intent over subject and body.
pub fn infer_intent(message: &Message) -> Option<Intent> {
    let text = message.full_text().to_lowercase();
    INTENT_KEYWORDS
        .iter()
        .find(|(_, words)| words.iter().any(|w| text.contains(w)))
        .map(|(intent, _)| *intent)
}

/// Bulk mail never needs a reply; otherwise a question mark or an
/// expecting phrase in the body does.
pub fn requires_response(message: &Message) -> bool {
    if message.category.is_some_and(|c| c.is_bulk()) {
        return false;
    }
    if message.body_text.contains('?') {
        return true;
    }
    let body = message.body_text.to_lowercase();
    RESPONSE_PHRASES.iter().any(|p| body.contains(p))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    use crate::model::{Address, Category};

    fn make_message(subject: &str, body: &str) -> Message {
        Message::new(
            "m-1",
            "t-1",
            subject,
            Address::new("alice@example.com"),
            body,
            Utc::now(),
        )
    }

    #[test]
    fn meeting_beats_question() {
        let msg = make_message("Zoom tomorrow?", "Can we talk?");
        assert_eq!(infer_intent(&msg), Some(Intent::ScheduleMeeting));
    }

    #[test]
    fn question_mark_is_request_info() {
        let msg = make_message("Budget", "Where is the spreadsheet?");
        assert_eq!(infer_intent(&msg), Some(Intent::RequestInfo));
    }

    #[test]
    fn opt_out_is_unsubscribe() {
        let msg = make_message("Mailing list", "Please remove me from this list.");
        assert_eq!(infer_intent(&msg), Some(Intent::Unsubscribe));
    }

    #[test]
    fn progress_is_status_update() {
        let msg = make_message("Weekly", "Progress is good.");
        assert_eq!(infer_intent(&msg), Some(Intent::StatusUpdate));
    }

    #[test]
    fn feedback_is_review_request() {
        let msg = make_message("Draft", "Feedback welcome.");
        assert_eq!(infer_intent(&msg), Some(Intent::ReviewRequest));
    }

    #[test]
    fn no_keywords_no_intent() {
        let msg = make_message("Hello", "Nice weather.");
        assert_eq!(infer_intent(&msg), None);
    }

    #[test]
    fn bulk_never_requires_response() {
        for category in [Category::Newsletter, Category::Promotional, Category::Spam] {
            let mut msg = make_message("Hi", "Could you answer?");
            msg.category = Some(category);
            assert!(!requires_response(&msg), "{category} should not need a reply");
        }
    }

    #[test]
    fn question_requires_response() {
        let mut msg = make_message("Hi", "Is this ready?");
        msg.category = Some(Category::Work);
        assert!(requires_response(&msg));
    }

    #[test]
    fn phrase_requires_response() {
        let mut msg = make_message("Hi", "Please CONFIRM the booking.");
        msg.category = Some(Category::Personal);
        assert!(requires_response(&msg));
    }

    #[test]
    fn statement_does_not_require_response() {
        let mut msg = make_message("Hi", "The report is attached.");
        msg.category = Some(Category::Work);
        assert!(!requires_response(&msg));
    }

    #[test]
    fn subject_question_mark_is_not_enough() {
        let mut msg = make_message("Lunch?", "Around noon works.");
        msg.category = Some(Category::Personal);
        assert!(!requires_response(&msg));
    }

    #[test]
    fn classify_message_annotates_in_place() {
        let agent = TriageAgent::new(&TriageConfig::default());
        let mut msg = make_message("URGENT: server down", "Could you look at it now?");

        let confidence = agent.classify_message(&mut msg);

        assert_eq!(msg.category, Some(Category::Urgent));
        assert!(confidence > 0.0);
        assert_eq!(msg.detected_intent, Some(Intent::RequestInfo));
        assert!(msg.requires_response);
    }
}
