//! Per-buffer metadata living in shared memory

pub mod header;
pub mod region;

pub use header::MetadataHeader;
pub use region::BufferMetadata;
