//! A single allocated buffer and its consumer-slot bookkeeping

use std::sync::{atomic::Ordering, Arc};

use crate::{
    allocators::{GraphicBuffer, GraphicsAllocator, NativeHandle},
    error::{BufferHubError, Result},
    memory::RegionConfig,
    metadata::BufferMetadata,
    sync::BufferId,
};

use super::description::BufferDescription;

/// Maximum number of clients that can hold a buffer at the same time.
/// One bit of the 32-bit active-clients mask per client.
pub const MAX_CLIENTS_PER_BUFFER: u32 = 32;

/// Bit position a client owns in a buffer's active-clients mask
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClientSlot(u32);

impl ClientSlot {
    /// Slot of the client that allocated the buffer
    pub const PRODUCER: ClientSlot = ClientSlot(0);

    /// Slot at bit `index`, `None` past the maximum
    pub fn new(index: u32) -> Option<Self> {
        (index < MAX_CLIENTS_PER_BUFFER).then_some(Self(index))
    }

    pub fn index(&self) -> u32 {
        self.0
    }

    /// Single-bit mask for this slot
    pub fn mask(&self) -> u32 {
        1u32 << self.0
    }
}

/// Lowest free slot in `mask`, if any
fn next_free_slot(mask: u32) -> Option<ClientSlot> {
    let free = !mask;
    if free == 0 {
        None
    } else {
        ClientSlot::new(free.trailing_zeros())
    }
}

/// One allocated buffer, shared by every client that references it.
///
/// Dropping the last `Arc<BufferNode>` returns the graphic buffer to the
/// allocator.
#[derive(Debug)]
pub struct BufferNode {
    id: BufferId,
    description: BufferDescription,
    buffer: GraphicBuffer,
    metadata: BufferMetadata,
    allocator: Arc<dyn GraphicsAllocator>,
}

impl BufferNode {
    /// Allocate a buffer and its metadata region.
    ///
    /// Any failure, including a handle the allocator flags as invalid, is
    /// reported as `AllocationFailed` and nothing is kept.
    pub fn create(
        description: &BufferDescription,
        user_metadata_size: usize,
        id: BufferId,
        allocator: Arc<dyn GraphicsAllocator>,
        metadata_region: RegionConfig,
    ) -> Result<Self> {
        let buffer = allocator
            .allocate(description, user_metadata_size)
            .map_err(|e| {
                log::error!("Failed to allocate buffer {}: {}", id, e);
                match e {
                    BufferHubError::AllocationFailed { .. } => e,
                    other => BufferHubError::allocation_failed(other.to_string()),
                }
            })?;

        if !buffer.is_valid() {
            log::error!("Allocator {} returned an invalid handle for buffer {}", allocator.type_name(), id);
            Self::release(allocator.as_ref(), buffer);
            return Err(BufferHubError::allocation_failed("allocator returned an invalid handle"));
        }

        let metadata = match BufferMetadata::create(user_metadata_size, metadata_region) {
            Ok(metadata) => metadata,
            Err(e) => {
                log::error!("Failed to allocate metadata for buffer {}: {}", id, e);
                Self::release(allocator.as_ref(), buffer);
                return Err(BufferHubError::allocation_failed(format!("metadata: {}", e)));
            }
        };

        // The allocating client owns slot 0.
        metadata
            .header()
            .active_clients_bit_mask
            .store(ClientSlot::PRODUCER.mask(), Ordering::Release);

        let description = BufferDescription {
            stride: buffer.stride(),
            ..*description
        };

        Ok(Self {
            id,
            description,
            buffer,
            metadata,
            allocator,
        })
    }

    fn release(allocator: &dyn GraphicsAllocator, buffer: GraphicBuffer) {
        if let Err(e) = allocator.free(buffer) {
            log::warn!("Failed to free graphic buffer: {}", e);
        }
    }

    /// Claim the lowest free slot in the active-clients mask.
    pub fn add_consumer_slot(&self) -> Result<ClientSlot> {
        let mask = &self.metadata.header().active_clients_bit_mask;
        let mut current = mask.load(Ordering::Acquire);
        loop {
            let slot = match next_free_slot(current) {
                Some(slot) => slot,
                None => {
                    log::error!(
                        "Buffer {} reached the maximum of {} clients",
                        self.id,
                        MAX_CLIENTS_PER_BUFFER
                    );
                    return Err(BufferHubError::MaxClientsReached {
                        buffer_id: self.id,
                        max: MAX_CLIENTS_PER_BUFFER,
                    });
                }
            };
            match mask.compare_exchange_weak(
                current,
                current | slot.mask(),
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return Ok(slot),
                Err(actual) => current = actual,
            }
        }
    }

    /// Clear a slot's bit so another client can take it
    pub fn remove_client_slot(&self, slot: ClientSlot) {
        self.metadata
            .header()
            .active_clients_bit_mask
            .fetch_and(!slot.mask(), Ordering::AcqRel);
    }

    pub fn active_clients_bit_mask(&self) -> u32 {
        self.metadata.header().active_clients()
    }

    pub fn id(&self) -> BufferId {
        self.id
    }

    pub fn description(&self) -> &BufferDescription {
        &self.description
    }

    /// Allocator handle for the pixel memory
    pub fn buffer_handle(&self) -> &NativeHandle {
        self.buffer.handle()
    }

    pub fn graphic_buffer(&self) -> &GraphicBuffer {
        &self.buffer
    }

    pub fn metadata(&self) -> &BufferMetadata {
        &self.metadata
    }

    pub fn buffer_state(&self) -> u32 {
        self.metadata.header().buffer_state()
    }

    pub fn queue_index(&self) -> u64 {
        self.metadata.header().queue_index()
    }
}

impl Drop for BufferNode {
    fn drop(&mut self) {
        let buffer = std::mem::replace(&mut self.buffer, GraphicBuffer::invalid(NativeHandle::empty()));
        log::debug!("Freeing buffer {}", self.id);
        Self::release(self.allocator.as_ref(), buffer);
    }
}
