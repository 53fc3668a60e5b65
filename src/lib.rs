//! # bufferhub - Shared Graphics Buffer Broker
//!
//! bufferhub allocates graphics buffers, lets one process hand a buffer to
//! another through a single-use token, and tracks every client referencing
//! every buffer so a buffer is freed exactly when nobody needs it anymore.
//!
//! ## Features
//!
//! - **Single-use tokens**: random, unforgeable within a broker, erased on read
//! - **Weak client registry**: a closed or dropped client never leaks entries
//! - **Consumer slots**: lock-free bitmask of up to 32 clients per buffer
//! - **Shared metadata**: `#[repr(C)]` header in a memfd or file-backed region
//! - **Pluggable allocation**: any [`GraphicsAllocator`], shared memory by default
//! - **Diagnostics**: a stable text report of active buffers and unused tokens
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                 BufferBroker                    │
//! ├─────────────────────────────────────────────────┤
//! │  Client registry         │  Token registry      │
//! │  - id -> Weak<client>    │  - token -> Weak     │
//! │  - report snapshots      │  - erase on read     │
//! └─────────────────────────────────────────────────┘
//!           │                         │
//!           ▼                         ▼
//! ┌─────────────────┐    ┌─────────────────────────┐
//! │  BufferClient   │───▶│  Arc<BufferNode>        │
//! │  (one slot bit) │    │  allocator handle       │
//! └─────────────────┘    │  metadata header        │
//!                        └─────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use bufferhub::{BufferBroker, BufferDescription, BufferUsage, PixelFormat, SharedMemoryAllocator};
//!
//! # fn main() -> bufferhub::Result<()> {
//! let broker = BufferBroker::new(Arc::new(SharedMemoryAllocator::new()));
//! let desc = BufferDescription::new(64, 64, 1, PixelFormat::RGBA_8888, BufferUsage::CPU_READ_OFTEN);
//!
//! let producer = broker.allocate(&desc, 0)?;
//! let token = producer.client.duplicate()?;
//! let consumer = broker.import(&token)?;
//!
//! assert_eq!(consumer.client.buffer_id(), producer.client.buffer_id());
//! print!("{}", broker.report());
//! # Ok(())
//! # }
//! ```

pub mod allocators;
pub mod broker;
pub mod buffers;
pub mod config;
pub mod error;
pub mod memory;
pub mod metadata;
pub mod sync;

// Main API re-exports
pub use allocators::{
    BufferUsage, GraphicBuffer, GraphicsAllocator, NativeHandle, PixelFormat, SharedMemoryAllocator,
};
pub use broker::{
    AllocatedBuffer, BrokerReport, BrokerStatsSnapshot, BufferBroker, BufferClient, BufferReportRow, Token,
    TokenReportRow,
};
pub use buffers::{BufferDescription, BufferNode, BufferTraits, ClientSlot, MAX_CLIENTS_PER_BUFFER};
pub use config::BrokerConfig;
pub use error::{BufferHubError, BufferHubStatus, Result};
pub use memory::{BackingType, RegionConfig, SharedMemoryRegion};
pub use metadata::{BufferMetadata, MetadataHeader};
pub use sync::{BufferId, ClientId};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
