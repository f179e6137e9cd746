//! Bridges gateway log records onto the host's `tracing` subscriber.
//!
//! The gateway knows nothing about `tracing`; it logs through the
//! [`LogHandler`] contract. [`TracingBridge`] implements that contract by
//! mapping gateway levels onto `tracing` levels and rendering attributes
//! into the message line, so gateway events land in whatever subscriber
//! the host installed, under the [`GATEWAY_LOG_TARGET`] target.

use std::fmt::Write as _;
use std::sync::Arc;

use cableway_core::logging::{Attr, Level, LogHandler, LogRecord};

/// Target every bridged record is emitted under. Hosts can filter on it
/// (for example `cableway::gateway=debug` in an `EnvFilter`).
pub const GATEWAY_LOG_TARGET: &str = "cableway::gateway";

/// Maps a gateway level to the host level it is emitted at.
///
/// The named gateway levels map one-to-one; every other value, including
/// severities between the named ones, is reported as info.
#[must_use]
pub fn tracing_level_for(level: Level) -> tracing::Level {
    match level {
        Level::DEBUG => tracing::Level::DEBUG,
        Level::WARN => tracing::Level::WARN,
        Level::ERROR => tracing::Level::ERROR,
        _ => tracing::Level::INFO,
    }
}

/// Maps a host level to the nearest gateway level.
///
/// `TRACE` has no gateway counterpart and narrows to debug, so feeding a
/// level through both maps is stable after the first round.
#[must_use]
pub fn gateway_level_for(level: tracing::Level) -> Level {
    if level == tracing::Level::ERROR {
        Level::ERROR
    } else if level == tracing::Level::WARN {
        Level::WARN
    } else if level == tracing::Level::INFO {
        Level::INFO
    } else {
        Level::DEBUG
    }
}

/// Asks the current subscriber whether it cares about `level` events
/// under the gateway target.
fn host_enabled(level: tracing::Level) -> bool {
    if level == tracing::Level::ERROR {
        tracing::enabled!(target: GATEWAY_LOG_TARGET, tracing::Level::ERROR)
    } else if level == tracing::Level::WARN {
        tracing::enabled!(target: GATEWAY_LOG_TARGET, tracing::Level::WARN)
    } else if level == tracing::Level::INFO {
        tracing::enabled!(target: GATEWAY_LOG_TARGET, tracing::Level::INFO)
    } else {
        tracing::enabled!(target: GATEWAY_LOG_TARGET, tracing::Level::DEBUG)
    }
}

/// Emits one rendered line at the mapped level.
fn emit(level: tracing::Level, line: &str) {
    if level == tracing::Level::ERROR {
        tracing::error!(target: GATEWAY_LOG_TARGET, "{line}");
    } else if level == tracing::Level::WARN {
        tracing::warn!(target: GATEWAY_LOG_TARGET, "{line}");
    } else if level == tracing::Level::INFO {
        tracing::info!(target: GATEWAY_LOG_TARGET, "{line}");
    } else {
        tracing::debug!(target: GATEWAY_LOG_TARGET, "{line}");
    }
}

/// [`LogHandler`] implementation over the host's `tracing` subscriber.
///
/// Derivations are plain values: `with_attrs` and `with_group` clone the
/// bridge, so a handler and its children never share mutable state.
#[derive(Debug, Clone)]
pub struct TracingBridge {
    /// Attributes bound by `with_attrs`, keys already group-qualified.
    bound: Vec<Attr>,
    /// Open group path; qualifies keys attached or emitted from here on.
    groups: Vec<String>,
    /// Records below this level are dropped before reaching `tracing`.
    min_level: Level,
}

impl TracingBridge {
    /// Creates a bridge that forwards every record the host subscriber
    /// accepts.
    #[must_use]
    pub fn new() -> Self {
        Self {
            bound: Vec::new(),
            groups: Vec::new(),
            min_level: Level::DEBUG,
        }
    }

    /// Drops records below `level` regardless of the host subscriber's
    /// own filtering.
    #[must_use]
    pub fn with_min_level(mut self, level: Level) -> Self {
        self.min_level = level;
        self
    }

    /// Wraps the bridge in the shared handler shape the gateway expects.
    #[must_use]
    pub fn into_handler(self) -> Arc<dyn LogHandler> {
        Arc::new(self)
    }

    fn qualified_key(&self, key: &str) -> String {
        if self.groups.is_empty() {
            key.to_string()
        } else {
            let mut qualified = self.groups.join(".");
            qualified.push('.');
            qualified.push_str(key);
            qualified
        }
    }

    /// Renders message, bound attributes and record attributes into the
    /// single line handed to `tracing`.
    fn render_line(&self, record: &LogRecord) -> String {
        let mut line = record.message.clone();
        for attr in &self.bound {
            let _ = write!(line, " {}={}", attr.key, attr.value);
        }
        for attr in &record.attrs {
            let _ = write!(line, " {}={}", self.qualified_key(&attr.key), attr.value);
        }
        line
    }

    fn child_with_attrs(&self, attrs: Vec<Attr>) -> TracingBridge {
        let mut child = self.clone();
        for attr in attrs {
            let key = self.qualified_key(&attr.key);
            child.bound.push(Attr {
                key,
                value: attr.value,
            });
        }
        child
    }

    fn child_with_group(&self, name: &str) -> TracingBridge {
        let mut child = self.clone();
        if !name.is_empty() {
            child.groups.push(name.to_string());
        }
        child
    }
}

impl Default for TracingBridge {
    fn default() -> Self {
        Self::new()
    }
}

impl LogHandler for TracingBridge {
    fn enabled(&self, level: Level) -> bool {
        if level < self.min_level {
            return false;
        }
        host_enabled(tracing_level_for(level))
    }

    fn handle(&self, record: &LogRecord) {
        if record.level < self.min_level {
            return;
        }
        let line = self.render_line(record);
        emit(tracing_level_for(record.level), &line);
    }

    fn with_attrs(&self, attrs: Vec<Attr>) -> Arc<dyn LogHandler> {
        Arc::new(self.child_with_attrs(attrs))
    }

    fn with_group(&self, name: &str) -> Arc<dyn LogHandler> {
        Arc::new(self.child_with_group(name))
    }
}
