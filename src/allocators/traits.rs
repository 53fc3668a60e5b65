//! Allocator trait definition

use crate::{
    buffers::BufferDescription,
    error::Result,
    memory::SharedMemoryRegion,
};

use super::handle::NativeHandle;

/// Graphics memory handed out by a [`GraphicsAllocator`]
#[derive(Debug)]
pub struct GraphicBuffer {
    handle: NativeHandle,
    stride: u32,
    valid: bool,
    /// Pixel storage, for allocators that back buffers with shared memory
    memory: Option<SharedMemoryRegion>,
}

impl GraphicBuffer {
    /// Wrap an allocator-specific handle
    pub fn new(handle: NativeHandle, stride: u32) -> Self {
        Self {
            handle,
            stride,
            valid: true,
            memory: None,
        }
    }

    /// Buffer backed by a shared memory region; the handle carries its fd
    pub fn with_memory(memory: SharedMemoryRegion, stride: u32) -> Self {
        let handle = NativeHandle::new(vec![memory.fd()], vec![stride as i32]);
        Self {
            handle,
            stride,
            valid: true,
            memory: Some(memory),
        }
    }

    /// A buffer the allocator reports as unusable
    pub fn invalid(handle: NativeHandle) -> Self {
        Self {
            handle,
            stride: 0,
            valid: false,
            memory: None,
        }
    }

    pub fn handle(&self) -> &NativeHandle {
        &self.handle
    }

    pub fn stride(&self) -> u32 {
        self.stride
    }

    /// Valid when the allocator accepted it and the handle is not null
    pub fn is_valid(&self) -> bool {
        self.valid && !self.handle.is_empty()
    }

    pub fn memory(&self) -> Option<&SharedMemoryRegion> {
        self.memory.as_ref()
    }

    pub fn memory_mut(&mut self) -> Option<&mut SharedMemoryRegion> {
        self.memory.as_mut()
    }
}

/// Platform allocator the broker delegates physical allocation to
pub trait GraphicsAllocator: Send + Sync + std::fmt::Debug {
    /// Allocate memory for `description`. `user_metadata_size` is the amount
    /// of caller metadata the broker will attach alongside the buffer.
    fn allocate(&self, description: &BufferDescription, user_metadata_size: usize) -> Result<GraphicBuffer>;

    /// Release a buffer previously returned by `allocate`
    fn free(&self, buffer: GraphicBuffer) -> Result<()>;

    /// Get allocator type name for debugging
    fn type_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}
