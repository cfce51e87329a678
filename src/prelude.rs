//! Common imports.
//!
//! ```rust,no_run
//! use snmptrap_input::prelude::*;
//! ```
//!
//! Brings in the types needed to run a listener and consume its events,
//! plus the [`oid!`] macro.

pub use crate::config::Config;
pub use crate::error::{Error, Result};
pub use crate::event::{Event, FieldPath};
pub use crate::mapper::{EcsCompatibility, EventMapper};
pub use crate::oid::Oid;
pub use crate::sink::{EventSink, JsonLinesSink, QueueSink};
pub use crate::supervisor::{Supervisor, SupervisorState};
pub use crate::trap::Trap;
pub use crate::value::Value;
pub use crate::varbind::VarBind;
pub use crate::version::Version;

#[doc(no_inline)]
pub use crate::oid;
