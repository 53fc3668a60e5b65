//! Broker activity counters

use std::sync::atomic::{AtomicU64, Ordering};

/// Point-in-time copy of [`BrokerStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BrokerStatsSnapshot {
    /// Successful allocate calls
    pub allocations: u64,
    /// Failed allocate calls
    pub allocation_failures: u64,
    /// Tokens handed out
    pub tokens_minted: u64,
    /// Successful imports
    pub imports: u64,
    /// Failed imports, for any reason
    pub import_failures: u64,
    /// Clients closed, explicitly or by drop
    pub clients_closed: u64,
}

impl BrokerStatsSnapshot {
    /// Clients created and not yet closed
    pub fn open_clients(&self) -> u64 {
        (self.allocations + self.imports).saturating_sub(self.clients_closed)
    }

    /// Fraction of import attempts that succeeded (1.0 when there were none)
    pub fn import_success_rate(&self) -> f64 {
        let attempts = self.imports + self.import_failures;
        if attempts == 0 {
            return 1.0;
        }
        self.imports as f64 / attempts as f64
    }
}

/// Thread-safe broker counters
#[derive(Debug, Default)]
pub struct BrokerStats {
    allocations: AtomicU64,
    allocation_failures: AtomicU64,
    tokens_minted: AtomicU64,
    imports: AtomicU64,
    import_failures: AtomicU64,
    clients_closed: AtomicU64,
}

impl BrokerStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_allocation(&self) {
        self.allocations.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_allocation_failure(&self) {
        self.allocation_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_token(&self) {
        self.tokens_minted.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_import(&self) {
        self.imports.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_import_failure(&self) {
        self.import_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_close(&self) {
        self.clients_closed.fetch_add(1, Ordering::Relaxed);
    }

    /// Get current statistics snapshot
    pub fn snapshot(&self) -> BrokerStatsSnapshot {
        BrokerStatsSnapshot {
            allocations: self.allocations.load(Ordering::Relaxed),
            allocation_failures: self.allocation_failures.load(Ordering::Relaxed),
            tokens_minted: self.tokens_minted.load(Ordering::Relaxed),
            imports: self.imports.load(Ordering::Relaxed),
            import_failures: self.import_failures.load(Ordering::Relaxed),
            clients_closed: self.clients_closed.load(Ordering::Relaxed),
        }
    }
}
