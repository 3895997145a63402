//! Message sources: a seeded synthetic generator and `.eml` parsing.

pub mod eml;
pub mod mock;

pub use eml::{group_threads, load_dir, parse_message};
pub use mock::{MockGenerator, MockInbox, DEFAULT_DISTRIBUTION};
