//! Structured logging contract between an embedded gateway and its host.
//!
//! The gateway emits [`LogRecord`]s through a [`LogHandler`] supplied at
//! startup; the host decides how records are rendered and where they go.
//! Levels follow the gateway's numeric convention, with gaps between the
//! named values so custom severities stay ordered.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Log severity as understood by the embedded gateway.
///
/// Levels are ordered integers rather than a closed enum: the gateway may
/// emit any value, and handlers map unrecognized values to a sensible
/// default rather than dropping the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Level(pub i8);

impl Level {
    /// Verbose diagnostics, usually disabled in production.
    pub const DEBUG: Level = Level(-4);
    /// Routine operational messages.
    pub const INFO: Level = Level(0);
    /// Recoverable problems worth operator attention.
    pub const WARN: Level = Level(4);
    /// Failures the gateway survives but should never hide.
    pub const ERROR: Level = Level(8);

    /// Parses a level name as written in configuration (`debug`, `info`,
    /// `warn`, `error`, any ASCII case). Returns `None` for anything else.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Level> {
        let lower = name.to_ascii_lowercase();
        match lower.as_str() {
            "debug" => Some(Level::DEBUG),
            "info" => Some(Level::INFO),
            "warn" => Some(Level::WARN),
            "error" => Some(Level::ERROR),
            _ => None,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Level::DEBUG => f.write_str("debug"),
            Level::INFO => f.write_str("info"),
            Level::WARN => f.write_str("warn"),
            Level::ERROR => f.write_str("error"),
            Level(other) => write!(f, "level({other})"),
        }
    }
}

/// Typed value of a log attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    /// UTF-8 text.
    String(String),
    /// Signed 64-bit integer.
    Int(i64),
    /// Unsigned 64-bit integer.
    Uint(u64),
    /// 64-bit IEEE 754 float.
    Float(f64),
    /// Boolean flag.
    Bool(bool),
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::String(v) => f.write_str(v),
            AttrValue::Int(v) => write!(f, "{v}"),
            AttrValue::Uint(v) => write!(f, "{v}"),
            AttrValue::Float(v) => write!(f, "{v}"),
            AttrValue::Bool(v) => write!(f, "{v}"),
        }
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        AttrValue::String(value.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        AttrValue::String(value)
    }
}

impl From<i64> for AttrValue {
    fn from(value: i64) -> Self {
        AttrValue::Int(value)
    }
}

impl From<u64> for AttrValue {
    fn from(value: u64) -> Self {
        AttrValue::Uint(value)
    }
}

impl From<f64> for AttrValue {
    fn from(value: f64) -> Self {
        AttrValue::Float(value)
    }
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        AttrValue::Bool(value)
    }
}

/// One key/value attribute attached to a record or bound to a handler.
#[derive(Debug, Clone, PartialEq)]
pub struct Attr {
    /// Attribute key, possibly qualified by group names (`group.key`).
    pub key: String,
    /// Attribute value.
    pub value: AttrValue,
}

impl Attr {
    /// Builds an attribute from any supported key and value type.
    #[must_use]
    pub fn new(key: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// One log event emitted by the gateway.
///
/// Attribute order is significant: handlers render attributes in the order
/// they were attached.
#[derive(Debug, Clone)]
pub struct LogRecord {
    /// Severity of the event.
    pub level: Level,
    /// Human-readable message text.
    pub message: String,
    /// Attributes in attachment order.
    pub attrs: Vec<Attr>,
}

impl LogRecord {
    /// Creates a record with no attributes.
    #[must_use]
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            attrs: Vec::new(),
        }
    }

    /// Appends one attribute, preserving insertion order.
    #[must_use]
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.attrs.push(Attr::new(key, value));
        self
    }
}

/// Handler contract the gateway logs through.
///
/// Mirrors what the gateway expects from a structured logger: a cheap
/// level check so callers can skip building expensive records, a record
/// sink, and two derivation operations producing independent child
/// handlers. A handler and its derivations must not share mutable state.
pub trait LogHandler: Send + Sync {
    /// Reports whether records at `level` would currently be emitted.
    ///
    /// Callers use this to skip formatting work; `handle` may still apply
    /// its own filtering.
    fn enabled(&self, level: Level) -> bool;

    /// Renders and emits one record.
    fn handle(&self, record: &LogRecord);

    /// Returns a handler with `attrs` bound in addition to any attributes
    /// already bound. The receiver is unchanged.
    fn with_attrs(&self, attrs: Vec<Attr>) -> Arc<dyn LogHandler>;

    /// Returns a handler that qualifies the keys of subsequently bound
    /// attributes, and of record attributes at emission time, under
    /// `name` (nested groups accumulate as `outer.inner.key`). An empty
    /// name derives an equivalent handler. The receiver is unchanged.
    fn with_group(&self, name: &str) -> Arc<dyn LogHandler>;
}
