//! Message triage: category rules, intent and reply detection.

pub mod agent;
pub mod classifier;

pub use agent::{TriageAgent, infer_intent, requires_response};
pub use classifier::{CategoryRule, CustomPredicate, Predicate, RuleClassifier, RuleField};
