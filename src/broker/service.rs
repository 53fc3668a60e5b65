//! The buffer broker service

use std::{
    collections::{BTreeMap, HashMap},
    io::Write,
    sync::{Arc, Weak},
};

use parking_lot::Mutex;

use crate::{
    allocators::{GraphicsAllocator, NativeHandle},
    buffers::{BufferDescription, BufferNode, BufferTraits, ClientSlot},
    config::BrokerConfig,
    error::{BufferHubError, Result},
    sync::{BufferId, ClientId, ClientIdGenerator, IdGenerator},
};

use super::{
    client::BufferClient,
    report::{BrokerReport, BufferReportRow, TokenReportRow},
    stats::{BrokerStats, BrokerStatsSnapshot},
    tokens::{Token, TokenRegistry},
};

/// A client together with the bundle its transport needs to map the buffer
#[derive(Debug)]
pub struct AllocatedBuffer {
    pub client: Arc<BufferClient>,
    pub traits: BufferTraits,
}

/// State shared between the broker and the clients it issued
#[derive(Debug)]
pub(crate) struct BrokerShared {
    allocator: Arc<dyn GraphicsAllocator>,
    config: BrokerConfig,
    buffer_ids: IdGenerator,
    client_ids: ClientIdGenerator,
    /// Distinguishes metadata region names of brokers in one process
    instance: u32,
    /// Every open client, by weak reference
    clients: Mutex<HashMap<ClientId, Weak<BufferClient>>>,
    tokens: TokenRegistry,
    stats: BrokerStats,
}

impl BrokerShared {
    fn register_client(&self, client: &Arc<BufferClient>) {
        self.clients.lock().insert(client.id(), Arc::downgrade(client));
    }

    pub(crate) fn mint_token(&self, client: &Arc<BufferClient>) -> Result<Token> {
        let node = client.buffer_node()?;
        let token = self.tokens.mint(client, node.id());

        // A close racing with the mint may have purged before our insert.
        if client.is_closed() {
            self.tokens.remove(token);
            return Err(BufferHubError::ClientClosed { client_id: client.id() });
        }

        self.stats.record_token();
        log::trace!("Client {} minted a token for buffer {}", client.id(), node.id());
        Ok(token)
    }

    pub(crate) fn on_client_closed(&self, client_id: ClientId) {
        let purged = self.tokens.remove_all_for_client(client_id);
        self.clients.lock().remove(&client_id);
        self.stats.record_close();
        log::trace!("Unregistered client {} ({} tokens purged)", client_id, purged);
    }
}

/// Allocates buffers, hands them between clients through single-use tokens,
/// and keeps the bookkeeping needed to report on them.
///
/// Cloning is cheap and every clone refers to the same broker.
///
/// Locking: the client set and the token map each have their own mutex.
/// Neither is held across an allocator call, across the other lock, or while
/// a strong client reference could be dropped (dropping the last one closes
/// the client, which takes both locks).
#[derive(Debug, Clone)]
pub struct BufferBroker {
    shared: Arc<BrokerShared>,
}

impl BufferBroker {
    /// Broker with the default configuration
    pub fn new(allocator: Arc<dyn GraphicsAllocator>) -> Self {
        Self::build(allocator, BrokerConfig::default())
    }

    /// Broker with a validated configuration
    pub fn with_config(allocator: Arc<dyn GraphicsAllocator>, config: BrokerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(allocator, config))
    }

    fn build(allocator: Arc<dyn GraphicsAllocator>, config: BrokerConfig) -> Self {
        let tokens = match config.token_seed {
            Some(seed) => TokenRegistry::with_seed(seed),
            None => TokenRegistry::new(),
        };
        Self {
            shared: Arc::new(BrokerShared {
                allocator,
                config,
                buffer_ids: IdGenerator::new(),
                client_ids: ClientIdGenerator::new(),
                instance: rand::random(),
                clients: Mutex::new(HashMap::new()),
                tokens,
                stats: BrokerStats::new(),
            }),
        }
    }

    /// Allocate a buffer and return its first client, which owns slot 0
    pub fn allocate(&self, description: &BufferDescription, user_metadata_size: usize) -> Result<AllocatedBuffer> {
        let shared = &self.shared;
        let result = self.create_node(description, user_metadata_size);
        let node = match result {
            Ok(node) => node,
            Err(e) => {
                shared.stats.record_allocation_failure();
                return Err(e);
            }
        };

        let client = BufferClient::new(
            shared.client_ids.next_id(),
            ClientSlot::PRODUCER,
            node.clone(),
            Arc::downgrade(shared),
        );
        shared.register_client(&client);
        shared.stats.record_allocation();
        log::debug!(
            "Allocated buffer {} ({}) for client {}",
            node.id(),
            node.description().geometry(),
            client.id()
        );

        Ok(AllocatedBuffer {
            traits: buffer_traits(&node, client.slot()),
            client,
        })
    }

    fn create_node(&self, description: &BufferDescription, user_metadata_size: usize) -> Result<Arc<BufferNode>> {
        let shared = &self.shared;
        description.validate()?;
        if user_metadata_size > shared.config.max_user_metadata_size {
            return Err(BufferHubError::invalid_parameter(
                "user_metadata_size",
                format!(
                    "{} exceeds the limit of {} bytes",
                    user_metadata_size, shared.config.max_user_metadata_size
                ),
            ));
        }

        let id = shared.buffer_ids.next_id();
        let region_name = format!("bufferhub-meta-{:08x}-{}", shared.instance, id);
        let node = BufferNode::create(
            description,
            user_metadata_size,
            id,
            shared.allocator.clone(),
            shared.config.metadata_region(&region_name),
        )?;
        Ok(Arc::new(node))
    }

    /// Mint a single-use token for `client`, wrapped in its transport carrier
    pub fn mint_token(&self, client: &Arc<BufferClient>) -> Result<NativeHandle> {
        self.check_owned(client)?;
        self.shared.mint_token(client).map(NativeHandle::from_token)
    }

    /// Redeem a token for a new client of the same buffer.
    ///
    /// The token is consumed by the lookup whether or not the import
    /// succeeds.
    pub fn import(&self, token: &NativeHandle) -> Result<AllocatedBuffer> {
        let result = self.import_token(token);
        match &result {
            Ok(_) => self.shared.stats.record_import(),
            Err(_) => self.shared.stats.record_import_failure(),
        }
        result
    }

    fn import_token(&self, carrier: &NativeHandle) -> Result<AllocatedBuffer> {
        let shared = &self.shared;
        let token = carrier.token()?;
        let entry = shared.tokens.resolve_and_remove(token)?;

        // Closing a client purges its tokens, so a dead referent here means
        // the bookkeeping slipped somewhere.
        let node = match entry.client.upgrade().map(|origin| origin.buffer_node()) {
            Some(Ok(node)) => node,
            _ => {
                log::error!(
                    "Token {:#010x} resolved to client {} which is gone",
                    token,
                    entry.client_id
                );
                return Err(BufferHubError::BufferFreed {
                    client_id: entry.client_id,
                });
            }
        };

        let slot = node.add_consumer_slot()?;
        let client = BufferClient::new(shared.client_ids.next_id(), slot, node.clone(), Arc::downgrade(shared));
        shared.register_client(&client);
        log::debug!(
            "Client {} imported buffer {} from client {} (slot {})",
            client.id(),
            node.id(),
            entry.client_id,
            slot.index()
        );

        Ok(AllocatedBuffer {
            traits: buffer_traits(&node, slot),
            client,
        })
    }

    /// Close `client`: purge its tokens, drop it from the client set, and
    /// release its slot and buffer reference.
    pub fn close(&self, client: &BufferClient) -> Result<()> {
        self.check_owned(client)?;
        client.close()
    }

    fn check_owned(&self, client: &BufferClient) -> Result<()> {
        if client.belongs_to(&self.shared) {
            Ok(())
        } else {
            Err(BufferHubError::invalid_parameter(
                "client",
                "Client was not issued by this broker",
            ))
        }
    }

    /// Snapshot of active buffers and unused tokens
    pub fn report(&self) -> BrokerReport {
        let shared = &self.shared;

        // Strong references are only taken and dropped outside the lock.
        let live: Vec<Arc<BufferClient>> = {
            let clients = shared.clients.lock();
            clients.values().filter_map(Weak::upgrade).collect()
        };

        let mut per_buffer: BTreeMap<BufferId, (Arc<BufferNode>, u32)> = BTreeMap::new();
        for client in &live {
            if let Ok(node) = client.buffer_node() {
                let id = node.id();
                per_buffer.entry(id).or_insert_with(|| (node, 0)).1 += 1;
            }
        }

        let buffers = per_buffer
            .values()
            .map(|(node, clients)| BufferReportRow {
                id: node.id(),
                clients: *clients,
                description: *node.description(),
                state: node.buffer_state(),
                queue_index: node.queue_index(),
            })
            .collect();

        let tokens = shared
            .tokens
            .outstanding_by_buffer()
            .into_iter()
            .map(|(buffer_id, tokens)| TokenReportRow { buffer_id, tokens })
            .collect();

        BrokerReport { buffers, tokens }
    }

    /// Write the text report to `out`. Arguments are not supported; passing
    /// any adds a note saying they were ignored.
    pub fn dump(&self, out: &mut dyn Write, args: &[String]) -> Result<()> {
        if !args.is_empty() {
            writeln!(out, "Note: bufferhub dump does not support args. Input arguments are ignored.")?;
        }
        let report = self.report();
        write!(out, "{}", report)?;
        out.flush()?;
        Ok(())
    }

    /// Registered clients, including any whose last reference is being dropped
    pub fn client_count(&self) -> usize {
        self.shared.clients.lock().len()
    }

    pub fn outstanding_tokens(&self) -> usize {
        self.shared.tokens.len()
    }

    pub fn stats(&self) -> BrokerStatsSnapshot {
        self.shared.stats.snapshot()
    }

    pub fn config(&self) -> &BrokerConfig {
        &self.shared.config
    }

    /// Id the next successful or failed allocation will use
    pub fn next_buffer_id(&self) -> BufferId {
        self.shared.buffer_ids.peek()
    }
}

fn buffer_traits(node: &BufferNode, slot: ClientSlot) -> BufferTraits {
    let metadata = node.metadata();
    BufferTraits {
        description: *node.description(),
        buffer_handle: node.buffer_handle().clone(),
        buffer_info: NativeHandle::new(
            vec![metadata.fd()],
            vec![
                node.id() as i32,
                slot.mask() as i32,
                metadata.user_metadata_size() as i32,
            ],
        ),
    }
}
