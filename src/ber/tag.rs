//! Identifier octets seen in SNMP v1/v2c notifications.
//!
//! Only single-octet (low tag number) identifiers occur in SNMP, so a tag is
//! a plain `u8`: class in bits 7-6, constructed flag in bit 5, number in
//! bits 4-0 (X.690 Section 8.1.2).

/// Constructed flag (bit 5).
pub const CONSTRUCTED: u8 = 0x20;

const APPLICATION: u8 = 0x40;
const CONTEXT_SPECIFIC: u8 = 0x80;

const fn application(number: u8) -> u8 {
    APPLICATION | number
}

const fn context(number: u8) -> u8 {
    CONTEXT_SPECIFIC | number
}

const fn context_constructed(number: u8) -> u8 {
    CONTEXT_SPECIFIC | CONSTRUCTED | number
}

/// ASN.1 universal types.
pub mod universal {
    use super::CONSTRUCTED;

    pub const INTEGER: u8 = 0x02;
    pub const OCTET_STRING: u8 = 0x04;
    /// Segmented OCTET STRING; agents never send it and the decoder rejects it.
    pub const OCTET_STRING_CONSTRUCTED: u8 = OCTET_STRING | CONSTRUCTED;
    pub const NULL: u8 = 0x05;
    pub const OBJECT_IDENTIFIER: u8 = 0x06;
    pub const SEQUENCE: u8 = 0x10 | CONSTRUCTED;
}

/// SMI application types (RFC 2578 Section 7.1).
pub mod application {
    use super::application;

    pub const IP_ADDRESS: u8 = application(0);
    pub const COUNTER32: u8 = application(1);
    /// Gauge32 and Unsigned32 share a tag.
    pub const GAUGE32: u8 = application(2);
    pub const TIMETICKS: u8 = application(3);
    pub const OPAQUE: u8 = application(4);
    pub const COUNTER64: u8 = application(6);
}

/// Exception values (RFC 3416 Section 3).
pub mod context {
    use super::context;

    pub const NO_SUCH_OBJECT: u8 = context(0);
    pub const NO_SUCH_INSTANCE: u8 = context(1);
    pub const END_OF_MIB_VIEW: u8 = context(2);
}

/// PDU types. A listener only dispatches the two trap forms; the others
/// are recognised so they can be filtered by name.
pub mod pdu {
    use super::context_constructed;

    pub const GET_REQUEST: u8 = context_constructed(0);
    pub const GET_NEXT_REQUEST: u8 = context_constructed(1);
    pub const RESPONSE: u8 = context_constructed(2);
    pub const SET_REQUEST: u8 = context_constructed(3);
    /// SNMPv1 Trap-PDU.
    pub const TRAP_V1: u8 = context_constructed(4);
    pub const GET_BULK_REQUEST: u8 = context_constructed(5);
    pub const INFORM_REQUEST: u8 = context_constructed(6);
    /// SNMPv2-Trap-PDU.
    pub const TRAP_V2: u8 = context_constructed(7);
    pub const REPORT: u8 = context_constructed(8);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_values() {
        assert_eq!(universal::SEQUENCE, 0x30);
        assert_eq!(universal::OCTET_STRING_CONSTRUCTED, 0x24);
        assert_eq!(application::TIMETICKS, 0x43);
        assert_eq!(application::COUNTER64, 0x46);
        assert_eq!(context::END_OF_MIB_VIEW, 0x82);
        assert_eq!(pdu::TRAP_V1, 0xA4);
        assert_eq!(pdu::INFORM_REQUEST, 0xA6);
        assert_eq!(pdu::TRAP_V2, 0xA7);
    }
}
