//! Identifier generation shared by the broker's components

pub mod ids;

pub use ids::{BufferId, ClientId, ClientIdGenerator, IdGenerator};
