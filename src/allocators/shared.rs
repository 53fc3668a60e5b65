//! Allocator backing graphic buffers with shared memory regions

use std::{
    path::PathBuf,
    sync::atomic::{AtomicU64, AtomicUsize, Ordering},
};

use crate::{
    buffers::BufferDescription,
    error::{BufferHubError, Result},
    memory::{BackingType, RegionConfig, SharedMemoryRegion},
};

use super::traits::{GraphicBuffer, GraphicsAllocator};

/// Row alignment in pixels applied to non-blob buffers
pub const STRIDE_ALIGNMENT: u32 = 16;

/// Point-in-time copy of [`AllocatorStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AllocatorStatsSnapshot {
    pub allocations: u64,
    pub frees: u64,
    pub failures: u64,
    pub bytes_in_use: usize,
}

impl AllocatorStatsSnapshot {
    /// Buffers allocated and not yet freed
    pub fn outstanding(&self) -> u64 {
        self.allocations.saturating_sub(self.frees)
    }
}

/// Thread-safe allocator counters
#[derive(Debug, Default)]
pub struct AllocatorStats {
    allocations: AtomicU64,
    frees: AtomicU64,
    failures: AtomicU64,
    bytes_in_use: AtomicUsize,
}

impl AllocatorStats {
    fn record_allocation(&self, bytes: usize) {
        self.allocations.fetch_add(1, Ordering::Relaxed);
        self.bytes_in_use.fetch_add(bytes, Ordering::Relaxed);
    }

    fn record_free(&self, bytes: usize) {
        self.frees.fetch_add(1, Ordering::Relaxed);
        self.bytes_in_use.fetch_sub(bytes, Ordering::Relaxed);
    }

    fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Get current statistics snapshot
    pub fn snapshot(&self) -> AllocatorStatsSnapshot {
        AllocatorStatsSnapshot {
            allocations: self.allocations.load(Ordering::Relaxed),
            frees: self.frees.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            bytes_in_use: self.bytes_in_use.load(Ordering::Relaxed),
        }
    }
}

/// Default allocator: every buffer is its own memfd (or file) mapping, so the
/// handle's fd can be shared with any process that imports the buffer.
#[derive(Debug)]
pub struct SharedMemoryAllocator {
    backing_type: BackingType,
    directory: Option<PathBuf>,
    /// Keeps region names of allocators in one process apart
    instance: u32,
    next_region: AtomicU64,
    stats: AllocatorStats,
}

impl SharedMemoryAllocator {
    /// Allocator using the platform's default backing
    pub fn new() -> Self {
        Self::with_backing(BackingType::default(), None)
    }

    /// Allocator with an explicit backing; `directory` holds file-backed regions
    pub fn with_backing(backing_type: BackingType, directory: Option<PathBuf>) -> Self {
        Self {
            backing_type,
            directory,
            instance: rand::random(),
            next_region: AtomicU64::new(1),
            stats: AllocatorStats::default(),
        }
    }

    pub fn stats(&self) -> AllocatorStatsSnapshot {
        self.stats.snapshot()
    }

    fn aligned_stride(description: &BufferDescription) -> u32 {
        if description.format.is_blob() {
            return description.width;
        }
        description
            .width
            .checked_next_multiple_of(STRIDE_ALIGNMENT)
            .unwrap_or(description.width)
    }

    fn region_config(&self, size: usize) -> RegionConfig {
        let seq = self.next_region.fetch_add(1, Ordering::Relaxed);
        let name = format!("bufferhub-gfx-{}-{:08x}-{}", std::process::id(), self.instance, seq);
        let mut config = RegionConfig::new(name.clone(), size).with_backing_type(self.backing_type);
        if let Some(dir) = &self.directory {
            config = config.with_file_path(dir.join(name));
        }
        config
    }
}

impl Default for SharedMemoryAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphicsAllocator for SharedMemoryAllocator {
    fn allocate(&self, description: &BufferDescription, _user_metadata_size: usize) -> Result<GraphicBuffer> {
        let stride = Self::aligned_stride(description);
        let sized = BufferDescription { stride, ..*description };

        let size = match sized.byte_size() {
            Some(size) if size > 0 => size,
            _ => {
                self.stats.record_failure();
                return Err(BufferHubError::allocation_failed(format!(
                    "cannot size format {} at {}",
                    description.format,
                    description.geometry()
                )));
            }
        };

        let region = SharedMemoryRegion::new(self.region_config(size)).inspect_err(|_| {
            self.stats.record_failure();
        })?;
        self.stats.record_allocation(size);
        log::trace!("Allocated {} bytes for {} (stride {})", size, description.geometry(), stride);

        Ok(GraphicBuffer::with_memory(region, stride))
    }

    fn free(&self, buffer: GraphicBuffer) -> Result<()> {
        let bytes = buffer.memory().map(|m| m.size()).ok_or_else(|| {
            BufferHubError::invalid_parameter("buffer", "Buffer was not allocated by this allocator")
        })?;
        self.stats.record_free(bytes);
        drop(buffer);
        Ok(())
    }
}
