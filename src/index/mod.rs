//! Search indexes built from the completed graph.

pub mod builder;
pub mod centrality;

pub use builder::{tokenize, SearchIndex};
