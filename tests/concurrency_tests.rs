//! Concurrent broker usage: racing imports, mints racing closes, parallel allocation

use std::{
    collections::HashSet,
    sync::{Arc, Barrier},
    thread,
};

use bufferhub::{
    BufferBroker, BufferDescription, BufferHubError, BufferUsage, PixelFormat, SharedMemoryAllocator,
    MAX_CLIENTS_PER_BUFFER,
};

fn test_broker() -> BufferBroker {
    BufferBroker::new(Arc::new(SharedMemoryAllocator::new()))
}

fn blob_desc() -> BufferDescription {
    BufferDescription::blob(1024, BufferUsage::CPU_READ_OFTEN)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_concurrent_imports_get_distinct_slots() {
        const IMPORTERS: usize = 40;

        let broker = test_broker();
        let producer = broker.allocate(&blob_desc(), 0).unwrap().client;
        let tokens: Vec<_> = (0..IMPORTERS).map(|_| producer.duplicate().unwrap()).collect();
        let barrier = Arc::new(Barrier::new(IMPORTERS));

        let handles: Vec<_> = tokens
            .into_iter()
            .map(|token| {
                let broker = broker.clone();
                let barrier = barrier.clone();
                thread::spawn(move || {
                    barrier.wait();
                    broker.import(&token).map(|imported| imported.client)
                })
            })
            .collect();

        let mut clients = Vec::new();
        let mut refused = 0;
        for handle in handles {
            match handle.join().unwrap() {
                Ok(client) => clients.push(client),
                Err(BufferHubError::MaxClientsReached { .. }) => refused += 1,
                Err(e) => panic!("unexpected import error: {}", e),
            }
        }

        let granted = MAX_CLIENTS_PER_BUFFER as usize - 1;
        assert_eq!(clients.len(), granted);
        assert_eq!(refused, IMPORTERS - granted);

        let slots: HashSet<_> = clients.iter().map(|c| c.slot().index()).collect();
        assert_eq!(slots.len(), granted);
        assert!(!slots.contains(&0));
        assert_eq!(producer.buffer_node().unwrap().active_clients_bit_mask(), u32::MAX);
        assert_eq!(broker.client_count(), MAX_CLIENTS_PER_BUFFER as usize);
        assert_eq!(broker.outstanding_tokens(), 0);
    }

    #[test]
    fn test_minting_while_closing_leaves_no_tokens() {
        let broker = test_broker();
        let producer = broker.allocate(&blob_desc(), 0).unwrap().client;

        for _ in 0..50 {
            let consumer = broker.import(&producer.duplicate().unwrap()).unwrap().client;
            let barrier = Arc::new(Barrier::new(2));

            let minter = {
                let consumer = consumer.clone();
                let barrier = barrier.clone();
                thread::spawn(move || {
                    barrier.wait();
                    let mut minted = 0usize;
                    loop {
                        match consumer.duplicate() {
                            Ok(_) => minted += 1,
                            Err(BufferHubError::ClientClosed { .. }) => return minted,
                            Err(e) => panic!("unexpected mint error: {}", e),
                        }
                    }
                })
            };

            barrier.wait();
            broker.close(&consumer).unwrap();
            minter.join().unwrap();

            assert_eq!(broker.outstanding_tokens(), 0);
        }

        assert_eq!(broker.client_count(), 1);
        assert_eq!(producer.buffer_node().unwrap().active_clients_bit_mask(), 0b1);
    }

    #[test]
    fn test_parallel_allocations_get_unique_ids() {
        const THREADS: usize = 8;
        const PER_THREAD: usize = 16;

        let broker = test_broker();
        let barrier = Arc::new(Barrier::new(THREADS));

        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let broker = broker.clone();
                let barrier = barrier.clone();
                thread::spawn(move || {
                    barrier.wait();
                    (0..PER_THREAD)
                        .map(|_| broker.allocate(&blob_desc(), 0).unwrap().client)
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let clients: Vec<_> = handles.into_iter().flat_map(|h| h.join().unwrap()).collect();
        let ids: HashSet<_> = clients.iter().filter_map(|c| c.buffer_id()).collect();
        assert_eq!(ids.len(), THREADS * PER_THREAD);
        assert_eq!(broker.report().buffers.len(), THREADS * PER_THREAD);
    }

    #[test]
    fn test_report_while_clients_come_and_go() {
        let broker = test_broker();
        let producer = broker.allocate(&blob_desc(), 0).unwrap().client;
        let barrier = Arc::new(Barrier::new(5));

        let workers: Vec<_> = (0..4)
            .map(|_| {
                let broker = broker.clone();
                let producer = producer.clone();
                let barrier = barrier.clone();
                thread::spawn(move || {
                    barrier.wait();
                    for _ in 0..200 {
                        let token = producer.duplicate().unwrap();
                        let consumer = broker.import(&token).unwrap().client;
                        // Alternate explicit close and drop
                        if consumer.id() % 2 == 0 {
                            broker.close(&consumer).unwrap();
                        }
                    }
                })
            })
            .collect();

        barrier.wait();
        for _ in 0..200 {
            let report = broker.report();
            for row in &report.buffers {
                assert!(row.clients >= 1);
            }
        }
        for worker in workers {
            worker.join().unwrap();
        }

        let report = broker.report();
        assert_eq!(report.buffer(1).unwrap().clients, 1);
        assert!(report.tokens.is_empty());
        assert_eq!(producer.buffer_node().unwrap().active_clients_bit_mask(), 0b1);
    }
}
