//! Decoded notifications.

use crate::message::MessagePdu;
use crate::mib::Mib;
use crate::oid::Oid;
use crate::pdu::GenericTrap;
use crate::value::format_timeticks;
use crate::varbind::VarBind;
use crate::version::Version;
use bytes::Bytes;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

/// One accepted SNMPv1 or SNMPv2c trap.
///
/// Owns everything decoded from the datagram; the bindings are zero-copy
/// slices of the receive buffer.
#[derive(Debug, Clone)]
pub struct Trap {
    /// Message version.
    pub version: Version,
    /// Community string the trap was sent with.
    pub community: Bytes,
    /// UDP peer the datagram came from.
    pub source: Option<SocketAddr>,
    /// The notification PDU.
    pub pdu: MessagePdu,
    mib: Option<Arc<Mib>>,
}

impl Trap {
    /// Create a trap from decoded parts.
    pub fn new(
        version: Version,
        community: Bytes,
        source: Option<SocketAddr>,
        pdu: MessagePdu,
    ) -> Self {
        Self {
            version,
            community,
            source,
            pdu,
            mib: None,
        }
    }

    /// Attach MIB modules used for field naming and rendering.
    pub fn with_mib(mut self, mib: Option<Arc<Mib>>) -> Self {
        self.mib = mib;
        self
    }

    /// Variable bindings in wire order.
    pub fn varbinds(&self) -> &[VarBind] {
        self.pdu.varbinds()
    }

    /// Source IP address, with IPv4-mapped IPv6 addresses unwrapped.
    pub fn source_ip(&self) -> Option<IpAddr> {
        self.source.map(|addr| addr.ip().to_canonical())
    }

    /// Field name for `oid`: its symbolic name when a loaded MIB covers it,
    /// otherwise the dotted numeric form.
    pub fn field_name(&self, oid: &Oid) -> String {
        self.mib
            .as_ref()
            .and_then(|mib| mib.resolve(oid))
            .unwrap_or_else(|| oid.to_string())
    }

    /// Equivalent SNMPv2 trap OID.
    pub fn trap_oid(&self) -> Option<Oid> {
        match &self.pdu {
            MessagePdu::TrapV1(pdu) => Some(pdu.v2_trap_oid()),
            MessagePdu::Generic(pdu) => pdu.trap_oid().cloned(),
        }
    }
}

struct Community<'a>(&'a [u8]);

impl fmt::Display for Community<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", String::from_utf8_lossy(self.0))
    }
}

/// Full text rendering, used as the event `message`.
impl fmt::Display for Trap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.version, self.pdu.pdu_type())?;
        if let Some(source) = self.source {
            write!(f, " from {}", source)?;
        }
        write!(f, " community={}", Community(&self.community))?;

        match &self.pdu {
            MessagePdu::TrapV1(pdu) => {
                let generic = GenericTrap::from_i32(pdu.generic_trap)
                    .map(|g| g.to_string())
                    .unwrap_or_else(|| "unknown".into());
                write!(
                    f,
                    " enterprise={} agent_addr={}.{}.{}.{} generic_trap={}({}) specific_trap={} timestamp={}",
                    self.field_name(&pdu.enterprise),
                    pdu.agent_addr[0],
                    pdu.agent_addr[1],
                    pdu.agent_addr[2],
                    pdu.agent_addr[3],
                    generic,
                    pdu.generic_trap,
                    pdu.specific_trap,
                    format_timeticks(pdu.time_stamp),
                )?;
            }
            MessagePdu::Generic(pdu) => {
                write!(
                    f,
                    " request_id={} error_status={} error_index={}",
                    pdu.request_id, pdu.error_status, pdu.error_index
                )?;
            }
        }

        f.write_str(" varbinds=[")?;
        for (i, vb) in self.varbinds().iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(
                f,
                "{} = {}: {}",
                self.field_name(&vb.oid),
                vb.value.type_name(),
                vb.value
            )?;
        }
        f.write_str("]")
    }
}
