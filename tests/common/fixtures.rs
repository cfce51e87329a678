//! Trap datagrams and socket helpers.

use bytes::Bytes;
use snmptrap_input::event::{Event, FieldPath};
use snmptrap_input::pdu::{GenericTrap, Pdu, TrapV1Pdu};
use snmptrap_input::{CommunityMessage, Oid, Value, VarBind, oid};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::sync::mpsc;

/// How long a test waits for something that should happen promptly.
pub const WAIT: Duration = Duration::from_secs(5);

// =============================================================================
// OIDs
// =============================================================================

/// linkUp notification: 1.3.6.1.6.3.1.1.5.4
pub fn link_up() -> Oid {
    oid!(1, 3, 6, 1, 6, 3, 1, 1, 5, 4)
}

/// ifIndex.2
pub fn if_index_2() -> Oid {
    oid!(1, 3, 6, 1, 2, 1, 2, 2, 1, 1, 2)
}

/// ifDescr.2
pub fn if_descr_2() -> Oid {
    oid!(1, 3, 6, 1, 2, 1, 2, 2, 1, 2, 2)
}

/// Private enterprise used for v1 traps.
pub fn enterprise() -> Oid {
    oid!(1, 3, 6, 1, 4, 1, 99999)
}

// =============================================================================
// Datagrams
// =============================================================================

/// SNMPv2c linkUp trap for interface 2, with sysUpTime 10.11 seconds.
pub fn v2c_link_up(community: &'static [u8], request_id: i32) -> Bytes {
    let pdu = Pdu::trap_v2(
        request_id,
        1011,
        link_up(),
        vec![
            VarBind::new(if_index_2(), Value::Integer(2)),
            VarBind::new(if_descr_2(), Value::from("eth1")),
        ],
    );
    CommunityMessage::v2c(community, pdu).encode()
}

/// SNMPv1 linkUp trap from 192.168.1.1 for interface 2.
pub fn v1_link_up(community: &'static [u8]) -> Bytes {
    let pdu = TrapV1Pdu::new(
        enterprise(),
        [192, 168, 1, 1],
        GenericTrap::LinkUp,
        0,
        4200,
        vec![VarBind::new(if_index_2(), Value::Integer(2))],
    );
    CommunityMessage::v1(community, pdu).encode()
}

/// Bytes that look like a message but are not one.
pub fn garbage() -> Bytes {
    Bytes::from_static(b"\x30\x05\x02\x01")
}

// =============================================================================
// Sockets and queues
// =============================================================================

/// Send each datagram to `addr` from a fresh loopback socket.
pub async fn send_datagrams(addr: SocketAddr, datagrams: &[Bytes]) {
    let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    for datagram in datagrams {
        socket.send_to(datagram, addr).await.unwrap();
    }
}

/// Receive the next item or panic after [`WAIT`].
pub async fn recv<T>(rx: &mut mpsc::Receiver<T>) -> T {
    tokio::time::timeout(WAIT, rx.recv())
        .await
        .expect("timed out waiting for queue")
        .expect("queue closed")
}

/// Top-level string field of an event.
pub fn field<'a>(event: &'a Event, name: &str) -> Option<&'a str> {
    event.get(&FieldPath::key(name)).and_then(|v| v.as_str())
}

/// Reserve a loopback UDP port and keep it held.
pub fn hold_port() -> (std::net::UdpSocket, SocketAddr) {
    let socket = std::net::UdpSocket::bind("127.0.0.1:0").unwrap();
    let addr = socket.local_addr().unwrap();
    (socket, addr)
}
