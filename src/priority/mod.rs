//! Priority scoring: sender, keyword, deadline, thread and recency signals.

pub mod deadline;
pub mod scorer;

pub use deadline::extract_deadline;
pub use scorer::{PriorityScorer, ScoreBreakdown, ScoreWeights};
