//! SNMP Protocol Data Units.
//!
//! Two layouts reach a trap receiver: the SNMPv1 Trap-PDU, with its own
//! enterprise/agent-addr header, and the generic request-id layout shared by
//! SNMPv2-Trap, InformRequest and every other operation.

use crate::ber::{Decoder, EncodeBuf, tag};
use crate::error::{DecodeErrorKind, Error, Result};
use crate::oid::Oid;
use crate::value::Value;
use crate::varbind::{VarBind, decode_varbind_list, encode_varbind_list};

/// `sysUpTime.0`, first binding of every SNMPv2 notification.
pub const SYS_UPTIME: [u32; 9] = [1, 3, 6, 1, 2, 1, 1, 3, 0];
/// `snmpTrapOID.0`, second binding of every SNMPv2 notification.
pub const SNMP_TRAP_OID: [u32; 11] = [1, 3, 6, 1, 6, 3, 1, 1, 4, 1, 0];
/// `snmpTraps`, parent of the generic trap OIDs.
pub const SNMP_TRAPS: [u32; 9] = [1, 3, 6, 1, 6, 3, 1, 1, 5];

/// PDU type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PduType {
    GetRequest = 0xA0,
    GetNextRequest = 0xA1,
    Response = 0xA2,
    SetRequest = 0xA3,
    TrapV1 = 0xA4,
    GetBulkRequest = 0xA5,
    InformRequest = 0xA6,
    TrapV2 = 0xA7,
    Report = 0xA8,
}

impl PduType {
    /// Create from tag byte.
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            tag::pdu::GET_REQUEST => Some(Self::GetRequest),
            tag::pdu::GET_NEXT_REQUEST => Some(Self::GetNextRequest),
            tag::pdu::RESPONSE => Some(Self::Response),
            tag::pdu::SET_REQUEST => Some(Self::SetRequest),
            tag::pdu::TRAP_V1 => Some(Self::TrapV1),
            tag::pdu::GET_BULK_REQUEST => Some(Self::GetBulkRequest),
            tag::pdu::INFORM_REQUEST => Some(Self::InformRequest),
            tag::pdu::TRAP_V2 => Some(Self::TrapV2),
            tag::pdu::REPORT => Some(Self::Report),
            _ => None,
        }
    }

    /// Get the tag byte.
    pub fn tag(self) -> u8 {
        self as u8
    }

    /// Unconfirmed notification types a receiver turns into events.
    pub fn is_trap(self) -> bool {
        matches!(self, PduType::TrapV1 | PduType::TrapV2)
    }
}

impl std::fmt::Display for PduType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::GetRequest => write!(f, "GetRequest"),
            Self::GetNextRequest => write!(f, "GetNextRequest"),
            Self::Response => write!(f, "Response"),
            Self::SetRequest => write!(f, "SetRequest"),
            Self::TrapV1 => write!(f, "TrapV1"),
            Self::GetBulkRequest => write!(f, "GetBulkRequest"),
            Self::InformRequest => write!(f, "InformRequest"),
            Self::TrapV2 => write!(f, "TrapV2"),
            Self::Report => write!(f, "Report"),
        }
    }
}

/// PDU with the request-id / error-status / error-index header.
#[derive(Debug, Clone, PartialEq)]
pub struct Pdu {
    /// PDU type
    pub pdu_type: PduType,
    /// Request ID
    pub request_id: i32,
    /// Error status (zero in traps)
    pub error_status: i32,
    /// Error index (zero in traps)
    pub error_index: i32,
    /// Variable bindings
    pub varbinds: Vec<VarBind>,
}

impl Pdu {
    /// Build an SNMPv2-Trap PDU.
    ///
    /// `sysUpTime.0` and `snmpTrapOID.0` are prepended to `varbinds`.
    pub fn trap_v2(request_id: i32, uptime: u32, trap_oid: Oid, varbinds: Vec<VarBind>) -> Self {
        let mut all = Vec::with_capacity(varbinds.len() + 2);
        all.push(VarBind::new(
            Oid::from_slice(&SYS_UPTIME),
            Value::TimeTicks(uptime),
        ));
        all.push(VarBind::new(
            Oid::from_slice(&SNMP_TRAP_OID),
            Value::ObjectIdentifier(trap_oid),
        ));
        all.extend(varbinds);
        Self {
            pdu_type: PduType::TrapV2,
            request_id,
            error_status: 0,
            error_index: 0,
            varbinds: all,
        }
    }

    /// `snmpTrapOID.0` of a notification, when present.
    pub fn trap_oid(&self) -> Option<&Oid> {
        self.varbinds
            .iter()
            .find(|vb| vb.oid.arcs() == SNMP_TRAP_OID)
            .and_then(|vb| vb.value.as_oid())
    }

    /// `sysUpTime.0` of a notification, when present.
    pub fn uptime(&self) -> Option<u32> {
        self.varbinds
            .iter()
            .find(|vb| vb.oid.arcs() == SYS_UPTIME)
            .and_then(|vb| match vb.value {
                Value::TimeTicks(t) => Some(t),
                _ => None,
            })
    }

    /// Encode to BER.
    pub fn encode(&self, buf: &mut EncodeBuf) {
        buf.push_constructed(self.pdu_type.tag(), |buf| {
            encode_varbind_list(buf, &self.varbinds);
            buf.push_integer(self.error_index);
            buf.push_integer(self.error_status);
            buf.push_integer(self.request_id);
        });
    }

    /// Decode from BER.
    pub fn decode(decoder: &mut Decoder) -> Result<Self> {
        let offset = decoder.offset();
        let tag = decoder.read_tag()?;
        let pdu_type = PduType::from_tag(tag)
            .ok_or_else(|| Error::decode(offset, DecodeErrorKind::UnknownPduType(tag)))?;

        let len = decoder.read_length()?;
        let mut pdu = decoder.sub_decoder(len)?;

        let request_id = pdu.read_integer()?;
        let error_status = pdu.read_integer()?;
        let error_index = pdu.read_integer()?;
        let varbinds = decode_varbind_list(&mut pdu)?;

        Ok(Pdu {
            pdu_type,
            request_id,
            error_status,
            error_index,
            varbinds,
        })
    }
}

/// SNMPv1 generic trap types (RFC 1157 Section 4.1.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum GenericTrap {
    ColdStart = 0,
    WarmStart = 1,
    LinkDown = 2,
    LinkUp = 3,
    AuthenticationFailure = 4,
    EgpNeighborLoss = 5,
    EnterpriseSpecific = 6,
}

impl GenericTrap {
    /// Create from integer value.
    pub fn from_i32(v: i32) -> Option<Self> {
        match v {
            0 => Some(Self::ColdStart),
            1 => Some(Self::WarmStart),
            2 => Some(Self::LinkDown),
            3 => Some(Self::LinkUp),
            4 => Some(Self::AuthenticationFailure),
            5 => Some(Self::EgpNeighborLoss),
            6 => Some(Self::EnterpriseSpecific),
            _ => None,
        }
    }

    /// Get the integer value.
    pub fn as_i32(self) -> i32 {
        self as i32
    }
}

impl std::fmt::Display for GenericTrap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::ColdStart => "coldStart",
            Self::WarmStart => "warmStart",
            Self::LinkDown => "linkDown",
            Self::LinkUp => "linkUp",
            Self::AuthenticationFailure => "authenticationFailure",
            Self::EgpNeighborLoss => "egpNeighborLoss",
            Self::EnterpriseSpecific => "enterpriseSpecific",
        };
        f.write_str(name)
    }
}

/// SNMPv1 Trap-PDU.
#[derive(Debug, Clone, PartialEq)]
pub struct TrapV1Pdu {
    /// Enterprise OID (sysObjectID of the sender)
    pub enterprise: Oid,
    /// Agent address as reported by the sender
    pub agent_addr: [u8; 4],
    /// Generic trap type
    pub generic_trap: i32,
    /// Specific trap code
    pub specific_trap: i32,
    /// sysUpTime of the sender, in hundredths of a second
    pub time_stamp: u32,
    /// Variable bindings
    pub varbinds: Vec<VarBind>,
}

impl TrapV1Pdu {
    /// Create a new SNMPv1 Trap-PDU.
    pub fn new(
        enterprise: Oid,
        agent_addr: [u8; 4],
        generic_trap: GenericTrap,
        specific_trap: i32,
        time_stamp: u32,
        varbinds: Vec<VarBind>,
    ) -> Self {
        Self {
            enterprise,
            agent_addr,
            generic_trap: generic_trap.as_i32(),
            specific_trap,
            time_stamp,
            varbinds,
        }
    }

    /// Generic trap type, if it is one of the seven defined values.
    pub fn generic_trap_enum(&self) -> Option<GenericTrap> {
        GenericTrap::from_i32(self.generic_trap)
    }

    /// Equivalent SNMPv2 trap OID (RFC 3584 Section 3.1).
    ///
    /// Generic traps map to `snmpTraps.{generic + 1}`, enterprise-specific
    /// traps to `enterprise.0.specific`.
    pub fn v2_trap_oid(&self) -> Oid {
        if self.generic_trap == GenericTrap::EnterpriseSpecific.as_i32() {
            self.enterprise.child(0).child(self.specific_trap as u32)
        } else {
            Oid::from_slice(&SNMP_TRAPS).child((self.generic_trap as u32).wrapping_add(1))
        }
    }

    /// Encode to BER.
    pub fn encode(&self, buf: &mut EncodeBuf) {
        buf.push_constructed(tag::pdu::TRAP_V1, |buf| {
            encode_varbind_list(buf, &self.varbinds);
            buf.push_unsigned32(tag::application::TIMETICKS, self.time_stamp);
            buf.push_integer(self.specific_trap);
            buf.push_integer(self.generic_trap);
            buf.push_ip_address(self.agent_addr);
            buf.push_oid(&self.enterprise);
        });
    }

    /// Decode from BER.
    pub fn decode(decoder: &mut Decoder) -> Result<Self> {
        let mut pdu = decoder.read_constructed(tag::pdu::TRAP_V1)?;

        let enterprise = pdu.read_oid()?;
        let agent_addr = pdu.read_ip_address()?;
        let generic_trap = pdu.read_integer()?;
        let specific_trap = pdu.read_integer()?;
        let ts_len = pdu.expect_tag(tag::application::TIMETICKS)?;
        let time_stamp = pdu.read_unsigned32_value(ts_len)?;
        let varbinds = decode_varbind_list(&mut pdu)?;

        Ok(TrapV1Pdu {
            enterprise,
            agent_addr,
            generic_trap,
            specific_trap,
            time_stamp,
            varbinds,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oid;
    use bytes::Bytes;

    #[test]
    fn test_trap_v2_prepends_standard_bindings() {
        let pdu = Pdu::trap_v2(
            7,
            1011,
            oid!(1, 3, 6, 1, 6, 3, 1, 1, 5, 3),
            vec![VarBind::new(oid!(1, 3, 6, 1, 2, 1, 2, 2, 1, 1, 2), Value::Integer(2))],
        );
        assert_eq!(pdu.varbinds.len(), 3);
        assert_eq!(pdu.uptime(), Some(1011));
        assert_eq!(pdu.trap_oid(), Some(&oid!(1, 3, 6, 1, 6, 3, 1, 1, 5, 3)));
    }

    #[test]
    fn test_pdu_roundtrip() {
        let pdu = Pdu::trap_v2(42, 500, oid!(1, 3, 6, 1, 4, 1, 8072, 2, 3, 0, 1), vec![]);
        let mut buf = EncodeBuf::new();
        pdu.encode(&mut buf);
        let bytes = buf.finish();
        assert_eq!(bytes[0], tag::pdu::TRAP_V2);

        let decoded = Pdu::decode(&mut Decoder::new(bytes)).unwrap();
        assert_eq!(decoded, pdu);
    }

    #[test]
    fn test_pdu_unknown_type() {
        let data = Bytes::from_static(&[0xAF, 0x00]);
        assert!(matches!(
            Pdu::decode(&mut Decoder::new(data)),
            Err(Error::Decode {
                offset: 0,
                kind: DecodeErrorKind::UnknownPduType(0xAF)
            })
        ));
    }

    #[test]
    fn test_trap_v1_roundtrip() {
        let trap = TrapV1Pdu::new(
            oid!(1, 3, 6, 1, 4, 1, 9, 1, 1),
            [192, 168, 1, 11],
            GenericTrap::LinkDown,
            0,
            1011,
            vec![VarBind::new(oid!(1, 3, 6, 1, 2, 1, 2, 2, 1, 1, 1), Value::Integer(111))],
        );
        let mut buf = EncodeBuf::new();
        trap.encode(&mut buf);
        let decoded = TrapV1Pdu::decode(&mut Decoder::new(buf.finish())).unwrap();
        assert_eq!(decoded, trap);
        assert_eq!(decoded.generic_trap_enum(), Some(GenericTrap::LinkDown));
    }

    #[test]
    fn test_v2_trap_oid_mapping() {
        let mut trap = TrapV1Pdu::new(
            oid!(1, 3, 6, 1, 4, 1, 9999),
            [10, 0, 0, 1],
            GenericTrap::ColdStart,
            0,
            0,
            vec![],
        );
        assert_eq!(trap.v2_trap_oid(), oid!(1, 3, 6, 1, 6, 3, 1, 1, 5, 1));

        trap.generic_trap = GenericTrap::EnterpriseSpecific.as_i32();
        trap.specific_trap = 42;
        assert_eq!(trap.v2_trap_oid(), oid!(1, 3, 6, 1, 4, 1, 9999, 0, 42));
    }
}
