//! UDP trap listener.
//!
//! A [`TrapListener`] owns one bound socket. [`run`](TrapListener::run)
//! receives datagrams until its cancellation token fires, decodes each one
//! and queues accepted traps in arrival order. Bad datagrams are logged and
//! skipped; only socket failures end the loop with an error.

use crate::decoder::{Decoded, TrapDecoder};
use crate::error::{Error, Result};
use crate::mib::Mib;
use crate::trap::Trap;
use crate::util::bind_udp_socket;
use bytes::Bytes;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Largest UDP payload.
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 65535;

/// Default trap port (unprivileged alternative to 162).
pub const DEFAULT_PORT: u16 = 1062;

/// Socket and decoding parameters for a listener.
#[derive(Debug, Clone, PartialEq)]
pub struct ListenerConfig {
    /// Address to bind.
    pub bind_addr: SocketAddr,
    /// Accepted community strings (exact match).
    pub communities: Vec<String>,
    /// Directory holding YAML MIB modules.
    pub mib_dir: Option<PathBuf>,
    /// Modules to load from `mib_dir`.
    pub mib_modules: Vec<String>,
    /// Receive buffer size per datagram.
    pub max_message_size: usize,
    /// Kernel receive buffer size (`SO_RCVBUF`).
    pub recv_buffer_size: Option<usize>,
}

impl ListenerConfig {
    /// Listen on `bind_addr` for the `public` community.
    pub fn new(bind_addr: SocketAddr) -> Self {
        Self {
            bind_addr,
            communities: vec!["public".to_string()],
            mib_dir: None,
            mib_modules: Vec::new(),
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
            recv_buffer_size: None,
        }
    }

    /// Replace the accepted communities.
    pub fn communities<I, S>(mut self, communities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.communities = communities.into_iter().map(Into::into).collect();
        self
    }

    /// Resolve symbolic names from the given modules in `dir`.
    pub fn mib(mut self, dir: impl Into<PathBuf>, modules: Vec<String>) -> Self {
        self.mib_dir = Some(dir.into());
        self.mib_modules = modules;
        self
    }

    /// Check the invariants a listener relies on.
    pub fn validate(&self) -> Result<()> {
        if self.communities.is_empty() {
            return Err(Error::config("at least one community is required"));
        }
        if self.max_message_size == 0 {
            return Err(Error::config("max_message_size must be greater than zero"));
        }
        Ok(())
    }

    /// Build the decoder, loading MIB modules if a directory is set.
    pub fn decoder(&self) -> TrapDecoder {
        let decoder = TrapDecoder::new(&self.communities);
        match &self.mib_dir {
            Some(dir) => decoder.with_mib(Mib::load(dir, &self.mib_modules)),
            None => decoder,
        }
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self::new(SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)))
    }
}

/// A bound trap socket.
///
/// The socket is closed by [`terminate`](Self::terminate) or when
/// [`run`](Self::run) returns, whichever comes last.
pub struct TrapListener {
    socket: Mutex<Option<Arc<UdpSocket>>>,
    local_addr: SocketAddr,
    decoder: TrapDecoder,
    traps: mpsc::Sender<Trap>,
    token: CancellationToken,
    max_message_size: usize,
}

impl TrapListener {
    /// Bind the socket described by `config`.
    ///
    /// Decoded traps are sent on `traps`. Cancelling `token` has the same
    /// effect as [`terminate`](Self::terminate). Must be called from within
    /// a tokio runtime.
    pub fn bind(
        config: &ListenerConfig,
        decoder: TrapDecoder,
        traps: mpsc::Sender<Trap>,
        token: CancellationToken,
    ) -> Result<Self> {
        config.validate()?;
        let socket = bind_udp_socket(config.bind_addr, config.recv_buffer_size)?;
        let local_addr = socket.local_addr().map_err(|source| Error::Bind {
            addr: config.bind_addr,
            source,
        })?;

        Ok(Self {
            socket: Mutex::new(Some(Arc::new(socket))),
            local_addr,
            decoder,
            traps,
            token,
            max_message_size: config.max_message_size,
        })
    }

    /// The bound address (resolves port 0).
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stop [`run`](Self::run) and close the socket. Idempotent.
    pub fn terminate(&self) {
        self.token.cancel();
        self.close();
    }

    fn close(&self) {
        self.socket
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }

    fn socket(&self) -> Option<Arc<UdpSocket>> {
        self.socket
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Whether [`terminate`](Self::terminate) has been called.
    pub fn is_terminated(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Receive until terminated.
    ///
    /// Returns `Ok(())` on terminate or when the trap queue has been closed,
    /// and [`Error::Transport`] when the socket fails. The socket is closed
    /// on return, so a listener runs at most once.
    pub async fn run(&self) -> Result<()> {
        let Some(socket) = self.socket() else {
            return Ok(());
        };
        let result = self.receive(&socket).await;
        drop(socket);
        self.close();
        result
    }

    async fn receive(&self, socket: &UdpSocket) -> Result<()> {
        let mut buf = vec![0u8; self.max_message_size];

        loop {
            let (len, source) = tokio::select! {
                biased;
                _ = self.token.cancelled() => return Ok(()),
                recv = socket.recv_from(&mut buf) => recv.map_err(|source| {
                    tracing::error!(
                        snmp.local_addr = %self.local_addr,
                        error = %source,
                        "receive failed"
                    );
                    Error::Transport {
                        local_addr: Some(self.local_addr),
                        source,
                    }
                })?,
            };

            tracing::trace!(
                snmp.source = %source,
                snmp.bytes = len,
                "received datagram"
            );

            let data = Bytes::copy_from_slice(&buf[..len]);
            let trap = match self.decoder.decode(data, Some(source)) {
                Ok(Decoded::Trap(trap)) => trap,
                Ok(Decoded::Filtered(reason)) => {
                    tracing::debug!(
                        snmp.source = %source,
                        %reason,
                        "ignoring datagram"
                    );
                    continue;
                }
                Err(e) => {
                    tracing::warn!(
                        snmp.source = %source,
                        snmp.bytes = len,
                        error = %e,
                        "dropping undecodable datagram"
                    );
                    continue;
                }
            };

            tokio::select! {
                biased;
                _ = self.token.cancelled() => return Ok(()),
                sent = self.traps.send(*trap) => {
                    if sent.is_err() {
                        tracing::warn!(
                            snmp.local_addr = %self.local_addr,
                            "trap queue closed, stopping listener"
                        );
                        return Ok(());
                    }
                }
            }
        }
    }
}

impl std::fmt::Debug for TrapListener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrapListener")
            .field("local_addr", &self.local_addr)
            .field("terminated", &self.is_terminated())
            .finish_non_exhaustive()
    }
}
