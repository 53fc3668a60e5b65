//! Integration tests for shared memory regions and buffer metadata

use tempfile::TempDir;
use bufferhub::{
    allocators::{BufferUsage, GraphicsAllocator, PixelFormat, SharedMemoryAllocator},
    memory::{BackingType, RegionConfig, SharedMemoryRegion},
    metadata::{BufferMetadata, MetadataHeader},
    BufferDescription,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_config_builder() {
        let config = RegionConfig::new("test", 4096)
            .with_backing_type(BackingType::FileBacked)
            .with_permissions(0o640);

        assert_eq!(config.name, "test");
        assert_eq!(config.size, 4096);
        assert_eq!(config.backing_type, BackingType::FileBacked);
        assert_eq!(config.permissions, 0o640);
    }

    #[test]
    fn test_region_config_rejects_bad_names() {
        assert!(RegionConfig::new("", 64).validate().is_err());
        assert!(RegionConfig::new("nested/name", 64).validate().is_err());
        assert!(SharedMemoryRegion::new(RegionConfig::new("nul\0name", 64)).is_err());
    }

    #[test]
    fn test_file_backed_region() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("test_shm");
        let config = RegionConfig::new("test_region", 4096)
            .with_backing_type(BackingType::FileBacked)
            .with_file_path(&path);

        let region = SharedMemoryRegion::new(config).unwrap();
        assert_eq!(region.name(), "test_region");
        assert_eq!(region.size(), 4096);
        assert!(region.is_file_backed());
        assert!(path.exists());

        drop(region);
        assert!(!path.exists());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_memfd_region() {
        let config = RegionConfig::new("test_memfd", 4096).with_backing_type(BackingType::MemFd);

        let region = SharedMemoryRegion::new(config).unwrap();
        assert_eq!(region.size(), 4096);
        assert_eq!(region.backing_type(), BackingType::MemFd);
        assert!(!region.is_file_backed());
        assert!(region.fd() >= 0);
    }

    #[test]
    fn test_typed_access_matches_bytes() {
        let temp_dir = TempDir::new().unwrap();
        let config = RegionConfig::new("typed", 64)
            .with_backing_type(BackingType::FileBacked)
            .with_file_path(temp_dir.path().join("typed"));

        let mut region = SharedMemoryRegion::new(config).unwrap();
        assert!(region.as_slice().iter().all(|&b| b == 0));

        unsafe {
            region.as_mut_ptr::<u64>().write(0x0102_0304_0506_0708);
        }
        let bytes: [u8; 8] = region.as_slice()[..8].try_into().unwrap();
        assert_eq!(u64::from_ne_bytes(bytes), 0x0102_0304_0506_0708);
        assert_eq!(unsafe { *region.as_ptr::<u64>() }, 0x0102_0304_0506_0708);
    }

    #[test]
    fn test_metadata_region_layout() {
        let temp_dir = TempDir::new().unwrap();
        let config = RegionConfig::new("meta", 0)
            .with_backing_type(BackingType::FileBacked)
            .with_file_path(temp_dir.path().join("meta"));

        let mut metadata = BufferMetadata::create(100, config).unwrap();
        assert_eq!(metadata.region().size(), MetadataHeader::SIZE + 100);
        assert_eq!(metadata.user_metadata_size(), 100);
        assert_eq!(metadata.header().user_metadata_size, 100);
        assert_eq!(metadata.header().active_clients(), 0);

        metadata.user_metadata_mut()[99] = 7;
        assert_eq!(metadata.user_metadata()[99], 7);
        assert_eq!(metadata.region().as_slice()[MetadataHeader::SIZE + 99], 7);
    }

    #[test]
    fn test_allocator_regions_in_directory() {
        let temp_dir = TempDir::new().unwrap();
        let allocator =
            SharedMemoryAllocator::with_backing(BackingType::FileBacked, Some(temp_dir.path().to_path_buf()));
        let desc = BufferDescription::new(100, 10, 2, PixelFormat::RGB_888, BufferUsage::CPU_READ_RARELY);

        let buffer = allocator.allocate(&desc, 0).unwrap();
        assert_eq!(buffer.stride(), 112);
        assert_eq!(buffer.memory().unwrap().size(), 112 * 10 * 2 * 3);
        assert_eq!(std::fs::read_dir(temp_dir.path()).unwrap().count(), 1);

        allocator.free(buffer).unwrap();
        assert_eq!(std::fs::read_dir(temp_dir.path()).unwrap().count(), 0);
    }
}
