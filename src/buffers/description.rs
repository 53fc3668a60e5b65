//! Buffer geometry and the bundle returned to clients

use crate::{
    allocators::{BufferUsage, NativeHandle, PixelFormat},
    error::{BufferHubError, Result},
};

/// Immutable description of an allocated buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferDescription {
    /// Width in pixels, or size in bytes for `BLOB`
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Number of image layers
    pub layers: u32,
    /// Pixel format
    pub format: PixelFormat,
    /// Usage flags
    pub usage: BufferUsage,
    /// Row stride in pixels, filled in by the allocator
    pub stride: u32,
}

impl BufferDescription {
    /// Create a description; stride is left for the allocator to decide
    pub fn new(width: u32, height: u32, layers: u32, format: PixelFormat, usage: BufferUsage) -> Self {
        Self {
            width,
            height,
            layers,
            format,
            usage,
            stride: 0,
        }
    }

    /// Linear byte buffer of `size` bytes
    pub fn blob(size: u32, usage: BufferUsage) -> Self {
        Self::new(size, 1, 1, PixelFormat::BLOB, usage)
    }

    /// Reject geometry no allocator can satisfy
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 {
            return Err(BufferHubError::invalid_parameter("width", "Width must be greater than 0"));
        }
        if self.height == 0 {
            return Err(BufferHubError::invalid_parameter("height", "Height must be greater than 0"));
        }
        if self.layers == 0 {
            return Err(BufferHubError::invalid_parameter("layers", "Layer count must be greater than 0"));
        }
        Ok(())
    }

    /// Geometry as shown in diagnostics: "N B" for blobs, "WxHxL" otherwise
    pub fn geometry(&self) -> String {
        if self.format.is_blob() {
            format!("{} B", self.width)
        } else {
            format!("{}x{}x{}", self.width, self.height, self.layers)
        }
    }

    /// Bytes needed to back this buffer, `None` for unknown formats or overflow
    pub fn byte_size(&self) -> Option<usize> {
        let bpp = self.format.bytes_per_pixel()?;
        if self.format.is_blob() {
            return Some(self.width as usize);
        }
        let row = self.stride.max(self.width) as usize;
        row.checked_mul(self.height as usize)?
            .checked_mul(self.layers as usize)?
            .checked_mul(bpp)
    }
}

/// Read-only bundle returned by allocate and import for the transport layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferTraits {
    /// Description of the buffer, stride included
    pub description: BufferDescription,
    /// Allocator handle for the pixel memory
    pub buffer_handle: NativeHandle,
    /// Metadata region fd plus `[buffer id, client slot mask, user metadata size]`
    pub buffer_info: NativeHandle,
}
