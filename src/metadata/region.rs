//! Shared metadata region attached to every buffer

use std::os::fd::RawFd;

use crate::{
    error::{BufferHubError, Result},
    memory::{RegionConfig, SharedMemoryRegion},
};

use super::header::MetadataHeader;

/// A [`MetadataHeader`] followed by caller metadata, in its own shared mapping
#[derive(Debug)]
pub struct BufferMetadata {
    region: SharedMemoryRegion,
    user_metadata_size: usize,
}

impl BufferMetadata {
    /// Create the region described by `config`, sized for the header plus
    /// `user_metadata_size` bytes, and initialize the header in place.
    pub fn create(user_metadata_size: usize, mut config: RegionConfig) -> Result<Self> {
        let user_size = u32::try_from(user_metadata_size).map_err(|_| {
            BufferHubError::invalid_parameter("user_metadata_size", "User metadata size exceeds u32")
        })?;
        config.size = MetadataHeader::SIZE + user_metadata_size;

        let mut region = SharedMemoryRegion::new(config)?;

        // The mapping is page aligned and at least SIZE bytes long.
        unsafe {
            region
                .as_mut_ptr::<MetadataHeader>()
                .write(MetadataHeader::new(user_size));
        }

        Ok(Self {
            region,
            user_metadata_size,
        })
    }

    /// The header at the start of the region
    pub fn header(&self) -> &MetadataHeader {
        // Initialized in `create`, and the region outlives the borrow.
        unsafe { &*self.region.as_ptr::<MetadataHeader>() }
    }

    /// Caller metadata following the header
    pub fn user_metadata(&self) -> &[u8] {
        &self.region.as_slice()[MetadataHeader::SIZE..]
    }

    pub fn user_metadata_mut(&mut self) -> &mut [u8] {
        &mut self.region.as_mut_slice()[MetadataHeader::SIZE..]
    }

    pub fn user_metadata_size(&self) -> usize {
        self.user_metadata_size
    }

    /// File descriptor of the metadata region
    pub fn fd(&self) -> RawFd {
        self.region.fd()
    }

    pub fn region(&self) -> &SharedMemoryRegion {
        &self.region
    }
}
