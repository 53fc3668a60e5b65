//! Shared memory region implementation

use std::{
    fs::{File, OpenOptions},
    os::fd::{AsRawFd, OwnedFd, RawFd},
    os::unix::fs::OpenOptionsExt,
    path::PathBuf,
    time::SystemTime,
};

use memmap2::{MmapMut, MmapOptions};

use crate::error::{BufferHubError, Result};

use super::config::{BackingType, RegionConfig};

/// A mapped shared memory region that can be handed to another process by fd
#[derive(Debug)]
pub struct SharedMemoryRegion {
    name: String,
    size: usize,
    backing_type: BackingType,
    created_at: SystemTime,
    mmap: MmapMut,
    /// Keeps the descriptor open for the lifetime of the mapping
    backing: OwnedFd,
    /// Backing file to unlink on drop, for file-backed regions
    unlink_path: Option<PathBuf>,
}

impl SharedMemoryRegion {
    /// Create a fresh zero-filled shared memory region
    pub fn new(config: RegionConfig) -> Result<Self> {
        config.validate()?;

        let (backing, unlink_path) = match config.backing_type {
            BackingType::FileBacked => Self::create_file_backing(&config)?,
            #[cfg(target_os = "linux")]
            BackingType::MemFd => (Self::create_memfd_backing(&config)?, None),
        };

        let mmap = unsafe {
            MmapOptions::new()
                .len(config.size)
                .map_mut(&backing)
                .map_err(|e| BufferHubError::from_io(e, "Failed to create memory mapping"))?
        };

        Ok(Self {
            name: config.name,
            size: config.size,
            backing_type: config.backing_type,
            created_at: SystemTime::now(),
            mmap,
            backing,
            unlink_path,
        })
    }

    /// Open (truncating) the backing file and size it; the path is
    /// remembered so drop can unlink it
    fn create_file_backing(config: &RegionConfig) -> Result<(OwnedFd, Option<PathBuf>)> {
        let path = config.backing_path();

        let file: File = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .mode(config.permissions)
            .open(&path)
            .map_err(|e| BufferHubError::from_io(e, "Failed to create backing file"))?;

        file.set_len(config.size as u64)
            .map_err(|e| BufferHubError::from_io(e, "Failed to set file size"))?;

        Ok((OwnedFd::from(file), Some(path)))
    }

    #[cfg(target_os = "linux")]
    fn create_memfd_backing(config: &RegionConfig) -> Result<OwnedFd> {
        use std::ffi::CString;

        use nix::{
            sys::memfd::{memfd_create, MemFdCreateFlag},
            unistd::ftruncate,
        };

        let name_cstr = CString::new(config.name.clone())
            .map_err(|_| BufferHubError::invalid_parameter("name", "Name contains null bytes"))?;

        let owned_fd = memfd_create(&name_cstr, MemFdCreateFlag::MFD_CLOEXEC)
            .map_err(|e| BufferHubError::platform(format!("Failed to create memfd: {}", e)))?;

        ftruncate(&owned_fd, config.size as libc::off_t)
            .map_err(|e| BufferHubError::platform(format!("Failed to set memfd size: {}", e)))?;

        Ok(owned_fd)
    }

    /// The mapped bytes
    pub fn as_slice(&self) -> &[u8] {
        &self.mmap
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.mmap
    }

    /// Start of the mapping as a `T`; page aligned
    pub fn as_ptr<T>(&self) -> *const T {
        self.mmap.as_ptr() as *const T
    }

    pub fn as_mut_ptr<T>(&mut self) -> *mut T {
        self.mmap.as_mut_ptr() as *mut T
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Backing storage kind
    pub fn backing_type(&self) -> BackingType {
        self.backing_type
    }

    /// Creation timestamp
    pub fn created_at(&self) -> SystemTime {
        self.created_at
    }

    /// File descriptor to pass to another process
    pub fn fd(&self) -> RawFd {
        self.backing.as_raw_fd()
    }

    pub fn is_file_backed(&self) -> bool {
        matches!(self.backing_type, BackingType::FileBacked)
    }
}

impl Drop for SharedMemoryRegion {
    fn drop(&mut self) {
        if let Some(path) = self.unlink_path.take() {
            if let Err(e) = std::fs::remove_file(&path) {
                log::warn!("Failed to unlink region file {}: {}", path.display(), e);
            }
        }
    }
}
