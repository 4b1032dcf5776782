//! `mailgraph` — an in-memory email graph and search engine.
//!
//! This crate ingests parsed email records, builds a typed directed
//! multigraph of messages, users, and threads, and serves multi-modal
//! ranked search (content, temporal, contact, combined) over it.
//!
//! The caller supplies records ([`model::record::EmailRecord`]) and
//! structured queries ([`search::query::SearchQuery`]); OAuth, HTTP,
//! persistence, and natural-language parsing live outside this crate.

pub mod config;
pub mod engine;
pub mod error;
pub mod graph;
pub mod index;
pub mod model;
pub mod search;

pub use engine::EmailEngine;
pub use error::{EngineError, Result};
