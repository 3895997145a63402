//! Processing pipeline.
//!
//! Every message flows through:
//! 1. `TriageAgent::classify_message()`: category, intent, reply flag
//! 2. `PriorityScorer::annotate()`: score and level, with thread context
//! 3. `HybridCompressor`: thread digest, remote first with local fallback
//!
//! Already-annotated messages and already-compressed threads are skipped.

pub mod processor;
pub mod worker;

pub use processor::{ProcessReport, TriagePipeline};
pub use worker::spawn_inbox_processor;
