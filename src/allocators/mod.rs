//! Graphics allocator seam, handles, formats and the default allocator

pub mod format;
pub mod handle;
pub mod shared;
pub mod traits;

pub use format::{BufferUsage, PixelFormat};
pub use handle::NativeHandle;
pub use shared::{AllocatorStats, AllocatorStatsSnapshot, SharedMemoryAllocator};
pub use traits::{GraphicBuffer, GraphicsAllocator};
