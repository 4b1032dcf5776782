//! Core data model: email records, addresses, and graph node types.

pub mod address;
pub mod node;
pub mod record;
