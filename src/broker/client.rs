//! A client's reference to a buffer

use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::{
    allocators::NativeHandle,
    buffers::{BufferNode, ClientSlot},
    error::{BufferHubError, Result},
    sync::{BufferId, ClientId},
};

use super::service::BrokerShared;

/// One process's interest in one buffer.
///
/// The transport layer owns the `Arc<BufferClient>`; the broker only keeps
/// weak references. A client is `Active` until [`close`](Self::close) is
/// called or the last strong reference is dropped, then `Closed` for good:
/// it gives up its slot bit and its buffer reference, and any token it
/// minted stops resolving.
#[derive(Debug)]
pub struct BufferClient {
    id: ClientId,
    slot: ClientSlot,
    /// `None` once closed
    node: Mutex<Option<Arc<BufferNode>>>,
    broker: Weak<BrokerShared>,
}

impl BufferClient {
    pub(crate) fn new(
        id: ClientId,
        slot: ClientSlot,
        node: Arc<BufferNode>,
        broker: Weak<BrokerShared>,
    ) -> Arc<Self> {
        Arc::new(Self {
            id,
            slot,
            node: Mutex::new(Some(node)),
            broker,
        })
    }

    pub fn id(&self) -> ClientId {
        self.id
    }

    /// Slot this client owns in the buffer's active-clients mask
    pub fn slot(&self) -> ClientSlot {
        self.slot
    }

    pub fn is_closed(&self) -> bool {
        self.node.lock().is_none()
    }

    /// The buffer this client refers to
    pub fn buffer_node(&self) -> Result<Arc<BufferNode>> {
        self.node
            .lock()
            .clone()
            .ok_or(BufferHubError::ClientClosed { client_id: self.id })
    }

    /// Id of the referenced buffer, `None` once closed
    pub fn buffer_id(&self) -> Option<BufferId> {
        self.node.lock().as_ref().map(|node| node.id())
    }

    /// Mint a single-use token another process can import this buffer with
    pub fn duplicate(self: &Arc<Self>) -> Result<NativeHandle> {
        let broker = self
            .broker
            .upgrade()
            .ok_or_else(|| BufferHubError::platform("broker has shut down"))?;
        broker.mint_token(self).map(NativeHandle::from_token)
    }

    /// Close the client. Fails with `ClientClosed` if it already was.
    pub fn close(&self) -> Result<()> {
        let node = self
            .node
            .lock()
            .take()
            .ok_or(BufferHubError::ClientClosed { client_id: self.id })?;
        self.release(node);
        Ok(())
    }

    pub(crate) fn belongs_to(&self, broker: &Arc<BrokerShared>) -> bool {
        std::ptr::eq(self.broker.as_ptr(), Arc::as_ptr(broker))
    }

    fn release(&self, node: Arc<BufferNode>) {
        if let Some(broker) = self.broker.upgrade() {
            broker.on_client_closed(self.id);
        }
        node.remove_client_slot(self.slot);
        log::debug!(
            "Client {} closed (buffer {}, slot {})",
            self.id,
            node.id(),
            self.slot.index()
        );
    }
}

impl Drop for BufferClient {
    fn drop(&mut self) {
        if let Some(node) = self.node.get_mut().take() {
            log::warn!("Client {} of buffer {} dropped without close", self.id, node.id());
            self.release(node);
        }
    }
}
