//! BER (Basic Encoding Rules) codec for SNMP notifications.
//!
//! Decoding follows X.690 with permissive parsing aligned with net-snmp
//! behavior: non-minimal lengths and integers are accepted, indefinite
//! lengths and constructed OCTET STRINGs are rejected. The encoder exists to
//! build notification datagrams (tests, benchmarks, fuzz seeds).

mod decode;
mod encode;
mod length;
pub mod tag;

pub use decode::*;
pub use encode::*;
pub use length::*;
