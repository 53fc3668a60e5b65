//! Buffer nodes and the descriptions handed back to clients

pub mod description;
pub mod node;

pub use description::{BufferDescription, BufferTraits};
pub use node::{BufferNode, ClientSlot, MAX_CLIENTS_PER_BUFFER};
