//! Trap queue consumer.

use crate::mapper::EventMapper;
use crate::sink::EventSink;
use crate::trap::Trap;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Map and deliver traps one at a time, in queue order, until every sender
/// is dropped and the queue is drained.
///
/// Mapping and sink failures are logged with the trap rendering and the
/// trap is dropped. Returns the number of events delivered.
pub async fn dispatch(
    mut traps: mpsc::Receiver<Trap>,
    mapper: EventMapper,
    sink: Arc<dyn EventSink>,
) -> u64 {
    let mut delivered = 0;

    while let Some(trap) = traps.recv().await {
        tracing::debug!(
            snmp.source = ?trap.source,
            snmp.pdu_type = %trap.pdu.pdu_type(),
            snmp.varbind_count = trap.varbinds().len(),
            "trap received"
        );

        let event = match mapper.map(&trap) {
            Ok(event) => event,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    snmp.trap = %trap,
                    "SNMP trap handling failed"
                );
                continue;
            }
        };

        match sink.send(event).await {
            Ok(()) => delivered += 1,
            Err(e) => tracing::warn!(
                error = %e,
                snmp.trap = %trap,
                "failed to deliver event"
            ),
        }
    }

    delivered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::FieldPath;
    use crate::message::MessagePdu;
    use crate::oid;
    use crate::pdu::Pdu;
    use crate::sink::QueueSink;
    use crate::version::Version;
    use bytes::Bytes;
    use std::time::Duration;

    fn trap(request_id: i32) -> Trap {
        let pdu = Pdu::trap_v2(request_id, 0, oid!(1, 3, 6, 1, 6, 3, 1, 1, 5, 1), vec![]);
        Trap::new(
            Version::V2c,
            Bytes::from_static(b"public"),
            Some("10.0.0.1:162".parse().unwrap()),
            MessagePdu::Generic(pdu),
        )
    }

    #[tokio::test]
    async fn test_dispatch_preserves_order_and_drains() {
        let (tx, rx) = mpsc::channel(8);
        let (sink, mut events) = QueueSink::channel(8, Duration::from_millis(100));

        for id in 1..=3 {
            tx.send(trap(id)).await.unwrap();
        }
        drop(tx);

        let delivered = dispatch(rx, EventMapper::default(), Arc::new(sink)).await;
        assert_eq!(delivered, 3);

        for id in 1..=3 {
            let event = events.recv().await.unwrap();
            let message = event.get(&FieldPath::key("message")).unwrap();
            assert!(
                message.as_str().unwrap().contains(&format!("request_id={} ", id)),
                "{}",
                message
            );
        }
    }

    #[tokio::test]
    async fn test_mapping_failure_is_contained() {
        // Target `[host]` makes the flat host write land on an object.
        let mapper = EventMapper::new(
            FieldPath::key("host"),
            Some(FieldPath::key("host")),
        );
        let (tx, rx) = mpsc::channel(8);
        let (sink, mut events) = QueueSink::channel(8, Duration::from_millis(100));

        tx.send(trap(1)).await.unwrap();
        drop(tx);

        assert_eq!(dispatch(rx, mapper, Arc::new(sink)).await, 0);
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_sink_failure_is_contained() {
        let (tx, rx) = mpsc::channel(8);
        let (sink, events) = QueueSink::channel(1, Duration::from_millis(10));
        drop(events);

        tx.send(trap(1)).await.unwrap();
        tx.send(trap(2)).await.unwrap();
        drop(tx);

        assert_eq!(dispatch(rx, EventMapper::default(), Arc::new(sink)).await, 0);
    }
}
