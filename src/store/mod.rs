//! In-memory storage for messages and threads.

pub mod memory;
pub mod views;

pub use memory::MailStore;
pub use views::{
    InboxMetrics, InboxStats, MessageFilter, MessagePage, MessageSummary, ThreadPage,
    ThreadSummary,
};
