//! Region settings

use std::{fmt, path::PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{BufferHubError, Result};

/// Where a region's pages come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackingType {
    /// A regular file, unlinked when the region is dropped
    FileBacked,
    /// An anonymous memfd; only the descriptor names it
    #[cfg(target_os = "linux")]
    MemFd,
}

impl Default for BackingType {
    #[cfg(target_os = "linux")]
    fn default() -> Self {
        Self::MemFd
    }

    #[cfg(not(target_os = "linux"))]
    fn default() -> Self {
        Self::FileBacked
    }
}

impl BackingType {
    pub fn name(&self) -> &'static str {
        match self {
            BackingType::FileBacked => "file-backed",
            #[cfg(target_os = "linux")]
            BackingType::MemFd => "memfd",
        }
    }
}

impl fmt::Display for BackingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How to create one [`SharedMemoryRegion`](super::SharedMemoryRegion)
#[derive(Debug, Clone)]
pub struct RegionConfig {
    /// Region name; also the memfd name and the default file name
    pub name: String,
    /// Mapped length in bytes
    pub size: usize,
    pub backing_type: BackingType,
    /// Explicit location of the backing file
    pub file_path: Option<PathBuf>,
    /// Mode bits of the backing file
    pub permissions: u32,
}

impl Default for RegionConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            size: 0,
            backing_type: BackingType::default(),
            file_path: None,
            // Buffers are private to the processes holding the fd
            permissions: 0o600,
        }
    }
}

impl RegionConfig {
    pub fn new(name: impl Into<String>, size: usize) -> Self {
        Self {
            name: name.into(),
            size,
            ..Default::default()
        }
    }

    pub fn with_backing_type(mut self, backing_type: BackingType) -> Self {
        self.backing_type = backing_type;
        self
    }

    pub fn with_file_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.file_path = Some(path.into());
        self
    }

    pub fn with_permissions(mut self, permissions: u32) -> Self {
        self.permissions = permissions;
        self
    }

    /// Reject settings no backing can honor
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(BufferHubError::invalid_parameter("name", "Region name cannot be empty"));
        }
        if self.name.contains(['\0', '/']) {
            return Err(BufferHubError::invalid_parameter(
                "name",
                format!("Region name {:?} contains '/' or a NUL byte", self.name),
            ));
        }
        if self.size == 0 {
            return Err(BufferHubError::invalid_parameter("size", "Region size must be greater than 0"));
        }
        if self.permissions & !0o777 != 0 {
            return Err(BufferHubError::invalid_parameter(
                "permissions",
                format!("{:#o} is not a file mode", self.permissions),
            ));
        }
        Ok(())
    }

    /// File a file-backed region lives in: `file_path`, or the region name
    /// under the system temp dir
    pub fn backing_path(&self) -> PathBuf {
        match &self.file_path {
            Some(path) => path.clone(),
            None => std::env::temp_dir().join(&self.name),
        }
    }
}
