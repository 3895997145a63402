//! Shared message and thread entities.

pub mod message;
pub mod thread;

pub use message::{Address, Category, Intent, Message, PriorityLevel};
pub use thread::{Digest, Thread, TimelineEvent};
