//! SNMP v1/v2c trap listener that turns notifications into structured events.
//!
//! A [`Supervisor`] keeps a UDP [`TrapListener`] alive, restarting it after a
//! cooldown when the socket fails. Every accepted trap is decoded into a
//! [`Trap`], flattened into an [`Event`] by the [`EventMapper`] and handed to
//! an [`EventSink`].
//!
//! ```rust,no_run
//! use snmptrap_input::{Config, JsonLinesSink, Supervisor};
//!
//! # async fn example() -> snmptrap_input::Result<()> {
//! let config = Config::from_yaml_file("snmptrap.yaml".as_ref())?;
//! let supervisor = Supervisor::from_config(&config, JsonLinesSink::stdout())?;
//! supervisor.run().await
//! # }
//! ```
//!
//! # Events
//!
//! Each varbind becomes one field keyed by its OID (or its MIB name when a
//! YAML MIB directory is configured), valued with the textual form of the
//! value. `message` holds the full trap rendering and the source address is
//! written to `host`, or `[host][ip]` with ECS compatibility enabled. A
//! `target` nests everything except the host field under that reference.
//!
//! # Logging
//!
//! Diagnostics go through [`tracing`]. Nothing is printed unless the
//! application installs a subscriber.
//!
//! | Level | What |
//! |-------|------|
//! | `error` | Socket receive failures |
//! | `warn` | Listener restarts, undecodable datagrams, mapping and delivery failures, bad MIB modules |
//! | `info` | Listener start/stop, MIB discovery |
//! | `debug` | Filtered datagrams, per-trap receipt, state transitions |
//! | `trace` | Raw datagram sizes |
//!
//! Structured fields use the `snmp.` prefix:
//!
//! | Field | Meaning |
//! |-------|---------|
//! | `snmp.source` | Sender address |
//! | `snmp.local_addr` | Bound listener address |
//! | `snmp.pdu_type` | PDU type of the trap |
//! | `snmp.varbind_count` | Number of varbinds |
//! | `snmp.bytes` | Datagram size |
//! | `snmp.trap` | Full trap rendering, on failures |
//!
//! Targets are `snmptrap_input::<module>`, so
//! `RUST_LOG=snmptrap_input::listener=debug` narrows output to the socket.

#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod ber;
pub mod config;
pub mod decoder;
pub mod dispatcher;
pub mod error;
pub mod event;
pub mod listener;
pub mod mapper;
pub mod message;
pub mod mib;
pub mod oid;
pub mod pdu;
pub mod prelude;
pub mod sink;
pub mod supervisor;
pub mod trap;
pub mod value;
pub mod varbind;
pub mod version;

mod util;

#[cfg(feature = "cli")]
#[cfg_attr(docsrs, doc(cfg(feature = "cli")))]
pub mod cli;

pub use config::Config;
pub use decoder::{Decoded, FilterReason, TrapDecoder};
pub use error::{Error, Result};
pub use event::{Event, FieldPath};
pub use listener::{ListenerConfig, TrapListener};
pub use mapper::{EcsCompatibility, EventMapper};
pub use message::{CommunityMessage, Message, MessagePdu};
pub use mib::Mib;
pub use oid::Oid;
pub use pdu::{GenericTrap, Pdu, PduType, TrapV1Pdu};
pub use sink::{EventSink, JsonLinesSink, QueueSink};
pub use supervisor::{Supervisor, SupervisorState};
pub use trap::Trap;
pub use value::Value;
pub use varbind::VarBind;
pub use version::Version;
