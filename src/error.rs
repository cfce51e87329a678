//! Error types for snmptrap-input.
//!
//! Only [`Error::Bind`] and [`Error::Transport`] ever escape a running
//! [`TrapListener`](crate::listener::TrapListener); decode, mapping and
//! enqueue failures are contained per datagram or per trap and only surface
//! as log records.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Result type alias using the library's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// BER decode error kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeErrorKind {
    /// Expected different tag.
    UnexpectedTag { expected: u8, actual: u8 },
    /// Data truncated unexpectedly.
    TruncatedData,
    /// Indefinite length not supported.
    IndefiniteLength,
    /// Integer value overflow.
    IntegerOverflow,
    /// Zero-length integer.
    ZeroLengthInteger,
    /// Invalid OID encoding.
    InvalidOidEncoding,
    /// OID exceeds maximum arc count during decode.
    OidTooLong { count: usize, max: usize },
    /// Unknown SNMP version.
    UnknownVersion(i32),
    /// Unknown PDU type.
    UnknownPduType(u8),
    /// Constructed OCTET STRING not supported.
    ConstructedOctetString,
    /// Missing required PDU.
    MissingPdu,
    /// NULL with non-zero length.
    InvalidNull,
    /// Invalid IP address length.
    InvalidIpAddressLength { length: usize },
    /// Length field too long.
    LengthTooLong { octets: usize },
    /// Integer64 too long.
    Integer64TooLong { length: usize },
    /// Empty datagram.
    EmptyMessage,
    /// TLV extends past end of data.
    TlvOverflow,
    /// Insufficient data for read.
    InsufficientData { needed: usize, available: usize },
    /// Bytes left over after the message.
    TrailingData { remaining: usize },
}

impl std::fmt::Display for DecodeErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnexpectedTag { expected, actual } => {
                write!(f, "expected tag 0x{:02X}, got 0x{:02X}", expected, actual)
            }
            Self::TruncatedData => write!(f, "unexpected end of data"),
            Self::IndefiniteLength => write!(f, "indefinite length encoding not supported"),
            Self::IntegerOverflow => write!(f, "integer overflow"),
            Self::ZeroLengthInteger => write!(f, "zero-length integer"),
            Self::InvalidOidEncoding => write!(f, "invalid OID encoding"),
            Self::OidTooLong { count, max } => {
                write!(f, "OID has {} arcs, exceeds maximum {}", count, max)
            }
            Self::UnknownVersion(v) => write!(f, "unknown SNMP version: {}", v),
            Self::UnknownPduType(t) => write!(f, "unknown PDU type: 0x{:02X}", t),
            Self::ConstructedOctetString => {
                write!(f, "constructed OCTET STRING (0x24) not supported")
            }
            Self::MissingPdu => write!(f, "missing PDU in message"),
            Self::InvalidNull => write!(f, "NULL with non-zero length"),
            Self::InvalidIpAddressLength { length } => {
                write!(f, "IP address must be 4 bytes, got {}", length)
            }
            Self::LengthTooLong { octets } => {
                write!(f, "length encoding too long ({} octets)", octets)
            }
            Self::Integer64TooLong { length } => {
                write!(f, "integer64 too long: {} bytes", length)
            }
            Self::EmptyMessage => write!(f, "empty datagram"),
            Self::TlvOverflow => write!(f, "TLV extends past end of data"),
            Self::InsufficientData { needed, available } => {
                write!(f, "need {} bytes but only {} remaining", needed, available)
            }
            Self::TrailingData { remaining } => {
                write!(f, "{} trailing bytes after message", remaining)
            }
        }
    }
}

/// OID validation error kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OidErrorKind {
    /// Empty OID string.
    Empty,
    /// Invalid arc value.
    InvalidArc,
    /// First arc must be 0, 1, or 2.
    InvalidFirstArc(u32),
    /// OID has too many arcs (exceeds MAX_OID_LEN).
    TooManyArcs { count: usize, max: usize },
}

impl std::fmt::Display for OidErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "empty OID"),
            Self::InvalidArc => write!(f, "invalid arc value"),
            Self::InvalidFirstArc(v) => write!(f, "first arc must be 0, 1, or 2, got {}", v),
            Self::TooManyArcs { count, max } => {
                write!(f, "OID has {} arcs, exceeds maximum {}", count, max)
            }
        }
    }
}

/// Reasons an event field could not be assigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MappingErrorKind {
    /// A path segment that must be an object already holds a scalar.
    NotAnObject,
    /// A scalar write would replace an existing object.
    WouldReplaceObject,
}

impl std::fmt::Display for MappingErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotAnObject => write!(f, "intermediate field is not an object"),
            Self::WouldReplaceObject => write!(f, "field already holds an object"),
        }
    }
}

/// Reasons the downstream output refused an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueErrorKind {
    /// The consumer side of the queue is gone.
    Closed,
    /// The queue stayed full for the whole enqueue timeout.
    TimedOut(Duration),
}

impl std::fmt::Display for EnqueueErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Closed => write!(f, "output queue closed"),
            Self::TimedOut(after) => write!(f, "output queue full for {:?}", after),
        }
    }
}

/// Library error type.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The listen address is in use, not permitted, or otherwise unavailable.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// The bound socket failed while receiving.
    #[error("transport error{}: {source}", local_addr.map(|a| format!(" on {}", a)).unwrap_or_default())]
    Transport {
        local_addr: Option<SocketAddr>,
        #[source]
        source: std::io::Error,
    },

    /// BER decoding error.
    #[error("decode error at offset {offset}: {kind}")]
    Decode {
        offset: usize,
        kind: DecodeErrorKind,
    },

    /// Invalid OID format.
    #[error("invalid OID: {kind}")]
    InvalidOid {
        kind: OidErrorKind,
        input: Option<Box<str>>, // Only allocated when parsing string input
    },

    /// A trap could not be turned into an event.
    #[error("cannot set field {path}: {kind}")]
    Mapping {
        path: String,
        kind: MappingErrorKind,
    },

    /// The output refused an event.
    #[error("failed to enqueue event: {kind}")]
    Enqueue { kind: EnqueueErrorKind },

    /// Output I/O failure (e.g. stdout closed).
    #[error("output error: {source}")]
    Output {
        #[source]
        source: std::io::Error,
    },

    /// Invalid configuration.
    #[error("invalid configuration: {message}")]
    Config { message: String },

    /// A MIB module could not be read or parsed.
    #[error("MIB module {}: {message}", path.display())]
    Mib { path: PathBuf, message: String },

    /// `Supervisor::run` was called while a run is already in progress.
    #[error("supervisor is already running")]
    AlreadyRunning,
}

impl Error {
    /// Create a decode error.
    pub fn decode(offset: usize, kind: DecodeErrorKind) -> Self {
        Self::Decode { offset, kind }
    }

    /// Create an invalid OID error from a kind (no input string).
    pub fn invalid_oid(kind: OidErrorKind) -> Self {
        Self::InvalidOid { kind, input: None }
    }

    /// Create an invalid OID error with the input string that failed.
    pub fn invalid_oid_with_input(kind: OidErrorKind, input: impl Into<Box<str>>) -> Self {
        Self::InvalidOid {
            kind,
            input: Some(input.into()),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a mapping error for the given field path.
    pub fn mapping(path: impl std::fmt::Display, kind: MappingErrorKind) -> Self {
        Self::Mapping {
            path: path.to_string(),
            kind,
        }
    }

    /// Whether the supervisor should cool down and start a new listener.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Bind { .. } | Self::Transport { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_error_display() {
        let err = Error::Bind {
            addr: "0.0.0.0:162".parse().unwrap(),
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        };
        let msg = err.to_string();
        assert!(msg.contains("0.0.0.0:162"), "{}", msg);
        assert!(err.is_retryable());
    }

    #[test]
    fn test_transport_error_display_without_addr() {
        let err = Error::Transport {
            local_addr: None,
            source: std::io::Error::other("socket closed"),
        };
        assert_eq!(err.to_string(), "transport error: socket closed");
        assert!(err.is_retryable());
    }

    #[test]
    fn test_contained_errors_not_retryable() {
        assert!(!Error::decode(3, DecodeErrorKind::TruncatedData).is_retryable());
        assert!(!Error::mapping("[host]", MappingErrorKind::NotAnObject).is_retryable());
        assert!(
            !Error::Enqueue {
                kind: EnqueueErrorKind::Closed
            }
            .is_retryable()
        );
    }

    #[test]
    fn test_decode_error_display() {
        let err = Error::decode(
            7,
            DecodeErrorKind::UnexpectedTag {
                expected: 0x30,
                actual: 0x02,
            },
        );
        assert_eq!(
            err.to_string(),
            "decode error at offset 7: expected tag 0x30, got 0x02"
        );
    }
}
