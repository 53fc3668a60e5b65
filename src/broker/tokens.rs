//! Single-use import tokens

use std::{
    collections::{BTreeMap, HashMap},
    sync::{Arc, Weak},
};

use parking_lot::Mutex;
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::{
    error::{BufferHubError, Result},
    sync::{BufferId, ClientId},
};

use super::client::BufferClient;

/// Opaque import capability
pub type Token = u32;

/// What a token resolves to
#[derive(Debug, Clone)]
pub struct TokenEntry {
    /// Client that minted the token
    pub client_id: ClientId,
    /// Buffer the client referred to at mint time
    pub buffer_id: BufferId,
    /// The client to clone on import
    pub client: Weak<BufferClient>,
}

#[derive(Debug)]
struct TokenTable {
    entries: HashMap<Token, TokenEntry>,
    rng: StdRng,
}

/// Map of outstanding tokens. One lock covers both the map and the random
/// source, so a drawn token is checked and inserted atomically.
#[derive(Debug)]
pub struct TokenRegistry {
    table: Mutex<TokenTable>,
}

impl TokenRegistry {
    /// Registry drawing tokens from an entropy-seeded generator
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Registry with a deterministic token sequence
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            table: Mutex::new(TokenTable {
                entries: HashMap::new(),
                rng,
            }),
        }
    }

    /// Register a new token for `client`, retrying on collision
    pub fn mint(&self, client: &Arc<BufferClient>, buffer_id: BufferId) -> Token {
        let mut table = self.table.lock();
        let token = loop {
            let candidate: Token = table.rng.gen();
            if !table.entries.contains_key(&candidate) {
                break candidate;
            }
        };
        table.entries.insert(
            token,
            TokenEntry {
                client_id: client.id(),
                buffer_id,
                client: Arc::downgrade(client),
            },
        );
        token
    }

    /// Look a token up and erase it in the same critical section
    pub fn resolve_and_remove(&self, token: Token) -> Result<TokenEntry> {
        self.table
            .lock()
            .entries
            .remove(&token)
            .ok_or_else(|| BufferHubError::invalid_token(format!("token {:#010x} is not registered", token)))
    }

    /// Drop a single token; true if it was outstanding
    pub fn remove(&self, token: Token) -> bool {
        self.table.lock().entries.remove(&token).is_some()
    }

    /// Purge every token minted by `client_id`, returning how many were removed
    pub fn remove_all_for_client(&self, client_id: ClientId) -> usize {
        let mut table = self.table.lock();
        let before = table.entries.len();
        table.entries.retain(|_, entry| entry.client_id != client_id);
        before - table.entries.len()
    }

    /// Outstanding tokens per buffer, skipping tokens whose client is gone
    pub fn outstanding_by_buffer(&self) -> BTreeMap<BufferId, u32> {
        let table = self.table.lock();
        let mut counts = BTreeMap::new();
        for entry in table.entries.values() {
            if entry.client.strong_count() > 0 {
                *counts.entry(entry.buffer_id).or_insert(0) += 1;
            }
        }
        counts
    }

    pub fn len(&self) -> usize {
        self.table.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for TokenRegistry {
    fn default() -> Self {
        Self::new()
    }
}
