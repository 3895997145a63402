//! Mailsift: email triage, priority scoring and thread compression.

pub mod api;
pub mod compression;
pub mod config;
pub mod error;
pub mod ingestion;
pub mod model;
pub mod pipeline;
pub mod priority;
pub mod remote;
pub mod store;
pub mod triage;
