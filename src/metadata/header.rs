//! Metadata header shared between every process that maps a buffer

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

/// Header at the start of a buffer's metadata region.
///
/// Lives in shared memory: every field other than `user_metadata_size` is
/// atomic, and `user_metadata_size` is written once before the region is
/// handed out.
#[repr(C)]
#[derive(Debug)]
pub struct MetadataHeader {
    /// Per-client acquire/release state bits
    pub buffer_state: AtomicU32,
    /// Per-client fence-pending bits
    pub fence_state: AtomicU32,
    /// One bit per live client slot
    pub active_clients_bit_mask: AtomicU32,
    /// Bytes of caller metadata following the header
    pub user_metadata_size: u32,
    /// Position of the buffer in its consumer queue, advanced by producers
    pub queue_index: AtomicU64,
}

impl MetadataHeader {
    /// Size of the header in bytes
    pub const SIZE: usize = std::mem::size_of::<MetadataHeader>();

    /// Fresh header with every atomic cleared
    pub fn new(user_metadata_size: u32) -> Self {
        Self {
            buffer_state: AtomicU32::new(0),
            fence_state: AtomicU32::new(0),
            active_clients_bit_mask: AtomicU32::new(0),
            user_metadata_size,
            queue_index: AtomicU64::new(0),
        }
    }

    /// Buffer state as published by writers
    pub fn buffer_state(&self) -> u32 {
        self.buffer_state.load(Ordering::Acquire)
    }

    /// Queue index as published by writers
    pub fn queue_index(&self) -> u64 {
        self.queue_index.load(Ordering::Acquire)
    }

    pub fn active_clients(&self) -> u32 {
        self.active_clients_bit_mask.load(Ordering::Acquire)
    }
}
