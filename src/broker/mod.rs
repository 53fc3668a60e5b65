//! The broker façade: client registry, token handoff, reporting

pub mod client;
pub mod report;
pub mod service;
pub mod stats;
pub mod tokens;

pub use client::BufferClient;
pub use report::{BrokerReport, BufferReportRow, TokenReportRow};
pub use service::{AllocatedBuffer, BufferBroker};
pub use stats::{BrokerStats, BrokerStatsSnapshot};
pub use tokens::{Token, TokenEntry, TokenRegistry};
