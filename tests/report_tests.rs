//! Diagnostic report contents and text format

use std::sync::{atomic::Ordering, Arc};

use bufferhub::{
    BrokerConfig, BufferBroker, BufferDescription, BufferUsage, PixelFormat, SharedMemoryAllocator,
};

fn test_broker() -> BufferBroker {
    let config = BrokerConfig::new().with_token_seed(1);
    BufferBroker::with_config(Arc::new(SharedMemoryAllocator::new()), config).unwrap()
}

fn image_desc() -> BufferDescription {
    BufferDescription::new(64, 64, 1, PixelFormat::RGBA_8888, BufferUsage::CPU_READ_OFTEN)
}

fn dump_to_string(broker: &BufferBroker, args: &[String]) -> String {
    let mut out = Vec::new();
    broker.dump(&mut out, args).unwrap();
    String::from_utf8(out).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_broker() {
        let broker = test_broker();
        let expected = "\
Active Buffers:
    Id   Clients       Geometry Format      Usage      State      Index

Unused Tokens:
Buffer Id Tokens
";
        assert_eq!(dump_to_string(&broker, &[]), expected);
    }

    #[test]
    fn test_dump_format() {
        let broker = test_broker();
        let producer = broker.allocate(&image_desc(), 0).unwrap().client;
        let _consumer = broker.import(&producer.duplicate().unwrap()).unwrap().client;
        let blob = broker
            .allocate(&BufferDescription::blob(4096, BufferUsage::CPU_WRITE_OFTEN), 0)
            .unwrap()
            .client;
        producer.duplicate().unwrap();

        let node = blob.buffer_node().unwrap();
        let header = node.metadata().header();
        header.buffer_state.store(0x8000_0001, Ordering::Release);
        header.queue_index.store(42, Ordering::Release);

        let expected = "\
Active Buffers:
    Id   Clients       Geometry Format      Usage      State      Index
     1         2        64x64x1      1 0x00000003 0x00000000 00000000
     2         1         4096 B     33 0x00000030 0x80000001 0000002a

Unused Tokens:
Buffer Id Tokens
       1      1
";
        assert_eq!(dump_to_string(&broker, &[]), expected);
    }

    #[test]
    fn test_dump_with_args_adds_note() {
        let broker = test_broker();
        let _client = broker.allocate(&image_desc(), 0).unwrap().client;

        let plain = dump_to_string(&broker, &[]);
        let noted = dump_to_string(&broker, &["--verbose".to_string()]);
        let (note, rest) = noted.split_once('\n').unwrap();
        assert!(note.contains("ignored"));
        assert_eq!(rest, plain);
    }

    #[test]
    fn test_closed_buffers_disappear() {
        let broker = test_broker();
        let first = broker.allocate(&image_desc(), 0).unwrap().client;
        let second = broker.allocate(&image_desc(), 0).unwrap().client;
        second.duplicate().unwrap();

        broker.close(&second).unwrap();
        drop(second);

        let report = broker.report();
        assert_eq!(report.buffers.len(), 1);
        assert_eq!(report.buffers[0].id, first.buffer_id().unwrap());
        assert_eq!(report.tokens_for(2), 0);
        assert!(report.buffers.iter().all(|row| row.clients > 0));
    }

    #[test]
    fn test_rows_are_ordered_by_id() {
        let broker = test_broker();
        let clients: Vec<_> = (0..12)
            .map(|_| broker.allocate(&image_desc(), 0).unwrap().client)
            .collect();
        for client in &clients {
            client.duplicate().unwrap();
        }

        let report = broker.report();
        let ids: Vec<_> = report.buffers.iter().map(|row| row.id).collect();
        assert_eq!(ids, (1..=12).collect::<Vec<_>>());
        let token_ids: Vec<_> = report.tokens.iter().map(|row| row.buffer_id).collect();
        assert_eq!(token_ids, ids);
        assert_eq!(report.total_clients(), 12);
    }

    #[test]
    fn test_report_does_not_mutate() {
        let broker = test_broker();
        let producer = broker.allocate(&image_desc(), 0).unwrap().client;
        let token = producer.duplicate().unwrap();

        let first = broker.report();
        let second = broker.report();
        assert_eq!(first, second);
        assert_eq!(broker.outstanding_tokens(), 1);
        assert!(broker.import(&token).is_ok());
    }
}
