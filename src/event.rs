//! Structured events and field references.

use crate::error::{Error, MappingErrorKind, Result};
use serde::Serialize;
use serde_json::{Map, Value as JsonValue};
use std::fmt;
use std::str::FromStr;

/// Path to a (possibly nested) event field.
///
/// Uses field-reference syntax: `[host][ip]` is the `ip` key inside the
/// `host` object. A bare word such as `host` or `1.3.6.1.2.1.1.3.0` is a
/// single top-level key; dots never split a path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldPath {
    segments: Vec<String>,
}

impl FieldPath {
    /// A single top-level key, taken verbatim.
    pub fn key(name: impl Into<String>) -> Self {
        Self {
            segments: vec![name.into()],
        }
    }

    /// Parse a field reference.
    pub fn parse(s: &str) -> Result<Self> {
        let invalid = || Error::config(format!("invalid field reference {:?}", s));

        if s.is_empty() {
            return Err(invalid());
        }
        if !s.starts_with('[') {
            if s.contains(['[', ']']) {
                return Err(invalid());
            }
            return Ok(Self::key(s));
        }

        let mut segments = Vec::new();
        let mut rest = s;
        while !rest.is_empty() {
            let inner = rest.strip_prefix('[').ok_or_else(invalid)?;
            let end = inner.find(']').ok_or_else(invalid)?;
            let segment = &inner[..end];
            if segment.is_empty() || segment.contains('[') {
                return Err(invalid());
            }
            segments.push(segment.to_string());
            rest = &inner[end + 1..];
        }
        Ok(Self { segments })
    }

    /// Extend the path by one segment.
    pub fn child(mut self, segment: impl Into<String>) -> Self {
        self.segments.push(segment.into());
        self
    }

    /// Path segments from the root.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.segments {
            write!(f, "[{}]", segment)?;
        }
        Ok(())
    }
}

impl FromStr for FieldPath {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// A structured event: a JSON object built by the mapper.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Event {
    fields: Map<String, JsonValue>,
}

impl Event {
    /// Create an empty event.
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign `value` at `path`, creating intermediate objects.
    ///
    /// Fails if an intermediate field holds a non-object, or if a non-object
    /// value would replace an existing object.
    pub fn set(&mut self, path: &FieldPath, value: impl Into<JsonValue>) -> Result<()> {
        let value = value.into();
        let Some((leaf, parents)) = path.segments.split_last() else {
            return Err(Error::mapping(path, MappingErrorKind::NotAnObject));
        };

        let mut current = &mut self.fields;
        for segment in parents {
            let slot = current
                .entry(segment.clone())
                .or_insert_with(|| JsonValue::Object(Map::new()));
            current = match slot {
                JsonValue::Object(map) => map,
                _ => return Err(Error::mapping(path, MappingErrorKind::NotAnObject)),
            };
        }

        if matches!(current.get(leaf), Some(JsonValue::Object(_))) && !value.is_object() {
            return Err(Error::mapping(path, MappingErrorKind::WouldReplaceObject));
        }
        current.insert(leaf.clone(), value);
        Ok(())
    }

    /// Value at `path`, if any.
    pub fn get(&self, path: &FieldPath) -> Option<&JsonValue> {
        let (first, rest) = path.segments.split_first()?;
        rest.iter()
            .try_fold(self.fields.get(first)?, |value, segment| {
                value.as_object()?.get(segment)
            })
    }

    /// Top-level fields.
    pub fn fields(&self) -> &Map<String, JsonValue> {
        &self.fields
    }

    /// Number of top-level fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// True when the event has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Consume the event, returning its JSON object.
    pub fn into_inner(self) -> Map<String, JsonValue> {
        self.fields
    }
}

impl From<Event> for JsonValue {
    fn from(event: Event) -> Self {
        JsonValue::Object(event.fields)
    }
}
