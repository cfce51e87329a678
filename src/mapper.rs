//! Trap to event mapping.

use crate::error::{Error, Result};
use crate::event::{Event, FieldPath};
use crate::trap::Trap;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use std::str::FromStr;

/// Name of the field holding the full trap rendering.
pub const MESSAGE_FIELD: &str = "message";

/// Elastic Common Schema compatibility mode.
///
/// Only decides where the source address goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EcsCompatibility {
    /// Source address in a flat `host` field.
    #[default]
    Disabled,
    /// Source address in `[host][ip]`.
    V1,
    /// Same placement as `V1`.
    V8,
}

impl EcsCompatibility {
    /// Field the source address is written to.
    pub fn host_field(self) -> FieldPath {
        match self {
            EcsCompatibility::Disabled => FieldPath::key("host"),
            EcsCompatibility::V1 | EcsCompatibility::V8 => FieldPath::key("host").child("ip"),
        }
    }

    /// Whether ECS field placement is active.
    pub fn is_enabled(self) -> bool {
        !matches!(self, EcsCompatibility::Disabled)
    }
}

impl FromStr for EcsCompatibility {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "disabled" => Ok(EcsCompatibility::Disabled),
            "v1" => Ok(EcsCompatibility::V1),
            "v8" => Ok(EcsCompatibility::V8),
            other => Err(Error::config(format!(
                "unknown ecs_compatibility {:?} (expected disabled, v1 or v8)",
                other
            ))),
        }
    }
}

/// Turns traps into events.
///
/// Field placement is fixed at construction; `map` does no mode branching.
#[derive(Debug, Clone)]
pub struct EventMapper {
    host_field: FieldPath,
    target: Option<FieldPath>,
}

impl EventMapper {
    /// Create a mapper writing the source address to `host_field` and
    /// nesting everything else under `target`, if set.
    pub fn new(host_field: FieldPath, target: Option<FieldPath>) -> Self {
        Self { host_field, target }
    }

    /// Create a mapper for an ECS compatibility mode.
    pub fn with_ecs(ecs: EcsCompatibility, target: Option<FieldPath>) -> Self {
        if ecs.is_enabled() && target.is_none() {
            tracing::info!(
                "ECS compatibility is enabled but `target` is not set; trap fields will be added at the event root"
            );
        }
        Self::new(ecs.host_field(), target)
    }

    /// Field receiving the source address.
    pub fn host_field(&self) -> &FieldPath {
        &self.host_field
    }

    /// Field trap data is nested under.
    pub fn target(&self) -> Option<&FieldPath> {
        self.target.as_ref()
    }

    /// Map one trap.
    ///
    /// Each binding becomes `field_name(oid) => value text`; a repeated OID
    /// keeps its last value. `message` holds the trap rendering. Both are
    /// nested under the target; the host field is always relative to the root.
    pub fn map(&self, trap: &Trap) -> Result<Event> {
        let mut fields = Event::new();
        for vb in trap.varbinds() {
            fields.set(
                &FieldPath::key(trap.field_name(&vb.oid)),
                vb.value.to_string(),
            )?;
        }
        fields.set(&FieldPath::key(MESSAGE_FIELD), trap.to_string())?;

        let mut event = match &self.target {
            Some(target) => {
                let mut event = Event::new();
                event.set(target, JsonValue::from(fields))?;
                event
            }
            None => fields,
        };

        if let Some(ip) = trap.source_ip() {
            event.set(&self.host_field, ip.to_string())?;
        }

        Ok(event)
    }
}

impl Default for EventMapper {
    fn default() -> Self {
        Self::new(EcsCompatibility::Disabled.host_field(), None)
    }
}
