//! Internal utilities.

use std::net::SocketAddr;

use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::UdpSocket;

use crate::error::{Error, Result};

/// Create and bind the trap receive socket.
///
/// IPv6 addresses are bound dual-stack (`IPV6_V6ONLY = false`) so `[::]`
/// also receives IPv4 traps. `SO_REUSEADDR` is left off: a port held by
/// another process must fail the bind. The kernel may cap
/// `recv_buffer_size` at `net.core.rmem_max`.
///
/// Must be called from within a tokio runtime.
pub(crate) fn bind_udp_socket(
    addr: SocketAddr,
    recv_buffer_size: Option<usize>,
) -> Result<UdpSocket> {
    let bind_err = |source| Error::Bind { addr, source };

    let domain = if addr.is_ipv6() {
        Domain::IPV6
    } else {
        Domain::IPV4
    };

    let socket = Socket::new(domain, Type::DGRAM, Some(Protocol::UDP)).map_err(bind_err)?;

    if addr.is_ipv6() {
        socket.set_only_v6(false).map_err(bind_err)?;
    }

    if let Some(size) = recv_buffer_size
        && let Err(e) = socket.set_recv_buffer_size(size)
    {
        tracing::debug!(
            snmp.local_addr = %addr,
            error = %e,
            "could not set receive buffer size"
        );
    }

    socket.set_nonblocking(true).map_err(bind_err)?;
    socket.bind(&addr.into()).map_err(bind_err)?;

    UdpSocket::from_std(socket.into()).map_err(bind_err)
}
