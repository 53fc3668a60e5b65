//! Shared memory regions backing buffer pixels and buffer metadata

pub mod config;
pub mod regions;

pub use config::{BackingType, RegionConfig};
pub use regions::SharedMemoryRegion;
