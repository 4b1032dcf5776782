//! Graph construction: store, node managers, relations, and the
//! batch coordinator.

pub mod builder;
pub mod messages;
pub mod relations;
pub mod snapshot;
pub mod store;
pub mod threads;
pub mod users;

pub use builder::{BuildStats, GraphBuilder};
pub use store::GraphStore;
