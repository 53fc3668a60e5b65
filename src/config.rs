//! Broker configuration

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{
    error::{BufferHubError, Result},
    memory::{BackingType, RegionConfig},
};

/// Default upper bound on caller metadata attached to a buffer (64KB)
pub const DEFAULT_MAX_USER_METADATA_SIZE: usize = 64 * 1024;

/// Configuration for a [`BufferBroker`](crate::BufferBroker)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrokerConfig {
    /// Backing used for per-buffer metadata regions
    pub metadata_backing: BackingType,
    /// Directory for file-backed metadata regions, system temp dir if unset
    pub metadata_dir: Option<PathBuf>,
    /// Largest caller metadata size accepted by allocate
    pub max_user_metadata_size: usize,
    /// Fixed seed for the token generator; tokens are unpredictable when unset
    pub token_seed: Option<u64>,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            metadata_backing: BackingType::default(),
            metadata_dir: None,
            max_user_metadata_size: DEFAULT_MAX_USER_METADATA_SIZE,
            token_seed: None,
        }
    }
}

impl BrokerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the metadata backing type
    pub fn with_metadata_backing(mut self, backing: BackingType) -> Self {
        self.metadata_backing = backing;
        self
    }

    /// Set the directory for file-backed metadata regions
    pub fn with_metadata_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.metadata_dir = Some(dir.into());
        self
    }

    /// Set the caller metadata limit
    pub fn with_max_user_metadata_size(mut self, size: usize) -> Self {
        self.max_user_metadata_size = size;
        self
    }

    /// Seed the token generator
    pub fn with_token_seed(mut self, seed: u64) -> Self {
        self.token_seed = Some(seed);
        self
    }

    /// Parse a TOML document; missing keys take their defaults
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| BufferHubError::from_io(e, &format!("Failed to read {}", path.display())))?;
        Self::from_toml_str(&text)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.max_user_metadata_size > u32::MAX as usize {
            return Err(BufferHubError::invalid_parameter(
                "max_user_metadata_size",
                "Must fit in 32 bits",
            ));
        }

        if let Some(dir) = &self.metadata_dir {
            if !dir.is_dir() {
                return Err(BufferHubError::invalid_parameter(
                    "metadata_dir",
                    format!("{} is not a directory", dir.display()),
                ));
            }
        }

        Ok(())
    }

    /// Region settings for a metadata region called `name`; the size is
    /// filled in by the metadata layer.
    pub fn metadata_region(&self, name: &str) -> RegionConfig {
        let config = RegionConfig::new(name, 0).with_backing_type(self.metadata_backing);
        match &self.metadata_dir {
            Some(dir) => config.with_file_path(dir.join(name)),
            None => config,
        }
    }
}
