//! Supervision: restart after bind failures, stop, end-to-end delivery.

mod common;

use common::*;
use snmptrap_input::event::FieldPath;
use snmptrap_input::{
    EcsCompatibility, Event, EventMapper, ListenerConfig, QueueSink, Supervisor, SupervisorState,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

fn supervisor(
    listener: ListenerConfig,
    mapper: EventMapper,
    cooldown: Duration,
) -> (Arc<Supervisor>, mpsc::Receiver<Event>) {
    let (sink, rx) = QueueSink::channel(16, Duration::from_secs(1));
    let sup = Supervisor::new(listener, mapper, sink).cooldown(cooldown);
    (Arc::new(sup), rx)
}

fn spawn_run(
    sup: &Arc<Supervisor>,
) -> tokio::task::JoinHandle<snmptrap_input::Result<()>> {
    let sup = Arc::clone(sup);
    tokio::spawn(async move { sup.run().await })
}

#[tokio::test]
async fn bind_error_cools_down_then_retries() {
    let (holder, addr) = hold_port();
    let (sup, mut events) = supervisor(
        ListenerConfig::new(addr),
        EventMapper::default(),
        Duration::from_millis(100),
    );
    let mut states = sup.subscribe();
    let task = spawn_run(&sup);

    tokio::time::timeout(WAIT, states.wait_for(|s| *s == SupervisorState::CoolingDown))
        .await
        .unwrap()
        .unwrap();

    drop(holder);
    tokio::time::timeout(WAIT, states.wait_for(|s| *s == SupervisorState::Running))
        .await
        .unwrap()
        .unwrap();

    send_datagrams(addr, &[v2c_link_up(b"public", 1)]).await;
    let event = recv(&mut events).await;
    assert_eq!(field(&event, "host"), Some("127.0.0.1"));

    sup.stop();
    tokio::time::timeout(WAIT, task).await.unwrap().unwrap().unwrap();
    assert_eq!(sup.state(), SupervisorState::Idle);
}

#[tokio::test]
async fn stop_during_cooldown_returns_promptly() {
    let (_holder, addr) = hold_port();
    let (sup, _events) = supervisor(
        ListenerConfig::new(addr),
        EventMapper::default(),
        Duration::from_secs(60),
    );
    let mut states = sup.subscribe();
    let task = spawn_run(&sup);

    tokio::time::timeout(WAIT, states.wait_for(|s| *s == SupervisorState::CoolingDown))
        .await
        .unwrap()
        .unwrap();

    let transitions = tokio::spawn(async move {
        let mut seen = Vec::new();
        while states.changed().await.is_ok() {
            let state = *states.borrow_and_update();
            seen.push(state);
            if state == SupervisorState::Idle {
                break;
            }
        }
        seen
    });

    sup.stop();
    tokio::time::timeout(Duration::from_secs(2), task)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert_eq!(sup.state(), SupervisorState::Idle);

    let seen = tokio::time::timeout(WAIT, transitions).await.unwrap().unwrap();
    assert!(!seen.contains(&SupervisorState::Starting), "{:?}", seen);
    assert_eq!(seen.last(), Some(&SupervisorState::Idle));
}

#[tokio::test]
async fn trap_flows_to_sink() {
    let (holder, addr) = hold_port();
    drop(holder);

    let mapper = EventMapper::with_ecs(EcsCompatibility::V1, Some(FieldPath::key("snmp")));
    let (sup, mut events) = supervisor(
        ListenerConfig::new(addr),
        mapper,
        Duration::from_millis(100),
    );
    let mut states = sup.subscribe();
    let task = spawn_run(&sup);

    tokio::time::timeout(WAIT, states.wait_for(|s| *s == SupervisorState::Running))
        .await
        .unwrap()
        .unwrap();

    send_datagrams(addr, &[garbage(), v2c_link_up(b"public", 42)]).await;
    let event = recv(&mut events).await;

    let host = FieldPath::parse("[host][ip]").unwrap();
    assert_eq!(event.get(&host).and_then(|v| v.as_str()), Some("127.0.0.1"));

    let snmp = event.get(&FieldPath::key("snmp")).unwrap();
    assert_eq!(snmp["1.3.6.1.2.1.1.3.0"], "00:00:10.11");
    assert_eq!(snmp["1.3.6.1.6.3.1.1.4.1.0"], "1.3.6.1.6.3.1.1.5.4");
    assert_eq!(snmp["1.3.6.1.2.1.2.2.1.1.2"], "2");
    assert_eq!(snmp["1.3.6.1.2.1.2.2.1.2.2"], "eth1");
    let message = snmp["message"].as_str().unwrap();
    assert!(message.contains("request_id=42"), "{}", message);
    assert!(message.contains("community=\"public\""), "{}", message);
    assert!(event.get(&FieldPath::key("message")).is_none());

    sup.stop();
    tokio::time::timeout(WAIT, task).await.unwrap().unwrap().unwrap();
}
