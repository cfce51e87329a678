//! Datagram to [`Trap`] conversion with community and PDU-type filtering.

use crate::error::Result;
use crate::message::{CommunityMessage, Message};
use crate::mib::Mib;
use crate::pdu::PduType;
use crate::trap::Trap;
use bytes::Bytes;
use std::net::SocketAddr;
use std::sync::Arc;

/// Why a well-formed datagram was not turned into a trap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterReason {
    /// The community is not in the configured set.
    CommunityMismatch,
    /// SNMPv3 message.
    UnsupportedVersion,
    /// InformRequest; accepting it would require sending a Response.
    Inform,
    /// Any PDU that is not a notification.
    NotANotification(PduType),
}

impl std::fmt::Display for FilterReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CommunityMismatch => write!(f, "community mismatch"),
            Self::UnsupportedVersion => write!(f, "SNMPv3 not supported"),
            Self::Inform => write!(f, "inform requests are not acknowledged"),
            Self::NotANotification(t) => write!(f, "{} is not a notification", t),
        }
    }
}

/// Outcome of decoding one datagram.
#[derive(Debug, Clone)]
pub enum Decoded {
    /// An accepted trap.
    Trap(Box<Trap>),
    /// A valid message that is not dispatched.
    Filtered(FilterReason),
}

/// Decodes datagrams into traps for a fixed community set.
#[derive(Debug, Clone)]
pub struct TrapDecoder {
    communities: Arc<[Bytes]>,
    mib: Option<Arc<Mib>>,
}

impl TrapDecoder {
    /// Create a decoder accepting exactly the given communities.
    pub fn new<I, C>(communities: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: AsRef<[u8]>,
    {
        Self {
            communities: communities
                .into_iter()
                .map(|c| Bytes::copy_from_slice(c.as_ref()))
                .collect(),
            mib: None,
        }
    }

    /// Attach MIB modules for symbolic field names.
    pub fn with_mib(mut self, mib: Mib) -> Self {
        self.mib = Some(Arc::new(mib));
        self
    }

    /// Whether `community` is accepted.
    pub fn accepts(&self, community: &[u8]) -> bool {
        self.communities.iter().any(|c| c.as_ref() == community)
    }

    /// Decode one datagram received from `source`.
    ///
    /// Malformed data is an error; well-formed messages that are not
    /// accepted traps come back as [`Decoded::Filtered`].
    pub fn decode(&self, data: Bytes, source: Option<SocketAddr>) -> Result<Decoded> {
        let msg = match Message::decode(data)? {
            Message::Community(msg) => msg,
            Message::V3 => return Ok(Decoded::Filtered(FilterReason::UnsupportedVersion)),
        };

        let CommunityMessage {
            version,
            community,
            pdu,
        } = msg;

        if !self.accepts(&community) {
            return Ok(Decoded::Filtered(FilterReason::CommunityMismatch));
        }

        match pdu.pdu_type() {
            t if t.is_trap() => {}
            PduType::InformRequest => return Ok(Decoded::Filtered(FilterReason::Inform)),
            other => return Ok(Decoded::Filtered(FilterReason::NotANotification(other))),
        }

        let trap = Trap::new(version, community, source, pdu).with_mib(self.mib.clone());
        Ok(Decoded::Trap(Box::new(trap)))
    }
}
