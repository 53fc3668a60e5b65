//! Pixel formats and usage flags understood by the allocators

use std::fmt;

use bitflags::bitflags;

/// Pixel format code, as passed through from the client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PixelFormat(pub u32);

impl PixelFormat {
    pub const RGBA_8888: Self = Self(1);
    pub const RGBX_8888: Self = Self(2);
    pub const RGB_888: Self = Self(3);
    pub const RGB_565: Self = Self(4);
    pub const RGBA_FP16: Self = Self(0x16);
    /// Linear byte buffer; width is the size in bytes, height and layers are 1
    pub const BLOB: Self = Self(0x21);
    pub const RGBA_1010102: Self = Self(0x2b);
    pub const R_8: Self = Self(0x38);

    /// Raw format code
    pub fn code(&self) -> u32 {
        self.0
    }

    /// True for formats whose geometry is a byte count
    pub fn is_blob(&self) -> bool {
        *self == Self::BLOB
    }

    /// Bytes per pixel, `None` for formats we cannot size
    pub fn bytes_per_pixel(&self) -> Option<usize> {
        match *self {
            Self::RGBA_8888 | Self::RGBX_8888 | Self::RGBA_1010102 => Some(4),
            Self::RGB_888 => Some(3),
            Self::RGB_565 => Some(2),
            Self::RGBA_FP16 => Some(8),
            Self::BLOB | Self::R_8 => Some(1),
            _ => None,
        }
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

bitflags! {
    /// Buffer usage bits
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BufferUsage: u64 {
        const CPU_READ_RARELY = 0x2;
        const CPU_READ_OFTEN = 0x3;
        const CPU_WRITE_RARELY = 0x20;
        const CPU_WRITE_OFTEN = 0x30;
        const GPU_SAMPLED_IMAGE = 0x100;
        const GPU_COLOR_OUTPUT = 0x200;
        const COMPOSER_OVERLAY = 0x800;
        const PROTECTED_CONTENT = 0x4000;
        const VIDEO_ENCODE = 0x10000;
        const SENSOR_DIRECT_DATA = 0x80_0000;
        const GPU_DATA_BUFFER = 0x100_0000;
        const GPU_CUBE_MAP = 0x200_0000;
        const GPU_MIPMAP_COMPLETE = 0x400_0000;
    }
}

impl BufferUsage {
    /// Build from raw bits, keeping vendor bits we do not name
    pub fn from_raw(bits: u64) -> Self {
        Self::from_bits_retain(bits)
    }

    /// True if the CPU maps the buffer for reading or writing
    pub fn cpu_accessible(&self) -> bool {
        self.intersects(Self::CPU_READ_OFTEN | Self::CPU_WRITE_OFTEN)
    }
}
