//! Request routing rules for dispatching realtime traffic.
//!
//! A fixed-priority table evaluated on every inbound request: the
//! server-push route first when enabled, then the persistent-stream
//! patterns in declaration order, otherwise the request stays with the
//! surrounding pipeline. Matching is exact, or literal-prefix when a
//! pattern carries a trailing `*`. No regular expressions on this path.

use std::fmt;

use crate::config::GatewayConfig;

/// Which long-lived gateway handler a request belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandlerKind {
    /// Bidirectional persistent streams (`WebSocket`).
    PersistentStream,
    /// Unidirectional push streams (SSE).
    ServerPush,
}

impl HandlerKind {
    /// Short label used in logs and error messages.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            HandlerKind::PersistentStream => "persistent-stream",
            HandlerKind::ServerPush => "server-push",
        }
    }
}

impl fmt::Display for HandlerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of routing one request path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// The request belongs to the named gateway handler.
    Dispatch(HandlerKind),
    /// Not gateway traffic; the surrounding pipeline continues.
    Forward,
}

/// Immutable routing table, built once at provisioning time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingRules {
    stream_paths: Vec<String>,
    server_push_path: Option<String>,
}

impl RoutingRules {
    /// Builds rules directly from patterns. `server_push_path` of `None`
    /// disables server-push routing entirely.
    #[must_use]
    pub fn new(stream_paths: Vec<String>, server_push_path: Option<String>) -> Self {
        Self {
            stream_paths,
            server_push_path,
        }
    }

    /// Derives rules from an effective gateway config.
    #[must_use]
    pub fn from_config(config: &GatewayConfig) -> Self {
        let server_push_path = config
            .server_push
            .enabled
            .then(|| config.server_push.path.clone());
        Self {
            stream_paths: config.stream_paths.clone(),
            server_push_path,
        }
    }

    /// Whether a server-push route exists.
    #[must_use]
    pub fn server_push_enabled(&self) -> bool {
        self.server_push_path.is_some()
    }

    /// Routes one request path. First match wins; the server-push route
    /// outranks every persistent-stream pattern.
    #[must_use]
    pub fn decide(&self, path: &str) -> Decision {
        if let Some(push_path) = &self.server_push_path {
            if path_matches(push_path, path) {
                return Decision::Dispatch(HandlerKind::ServerPush);
            }
        }
        for pattern in &self.stream_paths {
            if path_matches(pattern, path) {
                return Decision::Dispatch(HandlerKind::PersistentStream);
            }
        }
        Decision::Forward
    }
}

/// A trailing `*` makes the pattern a literal-prefix match; anything else
/// must match exactly.
fn path_matches(pattern: &str, path: &str) -> bool {
    match pattern.strip_suffix('*') {
        Some(prefix) => path.starts_with(prefix),
        None => pattern == path,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerPushConfig;

    fn stream_only(patterns: &[&str]) -> RoutingRules {
        RoutingRules::new(patterns.iter().map(ToString::to_string).collect(), None)
    }

    #[test]
    fn exact_pattern_requires_exact_path() {
        let rules = stream_only(&["/cable"]);
        assert_eq!(
            rules.decide("/cable"),
            Decision::Dispatch(HandlerKind::PersistentStream)
        );
        assert_eq!(rules.decide("/cable/session"), Decision::Forward);
        assert_eq!(rules.decide("/cables"), Decision::Forward);
        assert_eq!(rules.decide("/"), Decision::Forward);
    }

    #[test]
    fn trailing_wildcard_matches_by_prefix() {
        let rules = stream_only(&["/cable*"]);
        for path in ["/cable", "/cables", "/cable/9", "/cable/a/b"] {
            assert_eq!(
                rules.decide(path),
                Decision::Dispatch(HandlerKind::PersistentStream),
                "{path} should match /cable*"
            );
        }
        assert_eq!(rules.decide("/cab"), Decision::Forward);
    }

    #[test]
    fn bare_star_matches_everything() {
        let rules = stream_only(&["*"]);
        assert_eq!(
            rules.decide("/anything"),
            Decision::Dispatch(HandlerKind::PersistentStream)
        );
    }

    #[test]
    fn later_patterns_are_tried_after_earlier_ones() {
        let rules = stream_only(&["/cable", "/socket"]);
        assert_eq!(
            rules.decide("/socket"),
            Decision::Dispatch(HandlerKind::PersistentStream)
        );
        assert_eq!(rules.decide("/other"), Decision::Forward);
    }

    #[test]
    fn server_push_outranks_overlapping_stream_patterns() {
        let rules = RoutingRules::new(vec!["/ev*".to_string()], Some("/events".to_string()));
        assert_eq!(
            rules.decide("/events"),
            Decision::Dispatch(HandlerKind::ServerPush)
        );
        assert_eq!(
            rules.decide("/everything-else"),
            Decision::Dispatch(HandlerKind::PersistentStream)
        );
    }

    #[test]
    fn disabled_server_push_forwards_its_path() {
        let rules = stream_only(&["/cable"]);
        assert!(!rules.server_push_enabled());
        assert_eq!(rules.decide("/events"), Decision::Forward);
    }

    #[test]
    fn no_patterns_forward_everything() {
        let rules = RoutingRules::new(Vec::new(), None);
        assert_eq!(rules.decide("/cable"), Decision::Forward);
    }

    #[test]
    fn from_config_respects_server_push_enablement() {
        let config = GatewayConfig::default();
        let rules = RoutingRules::from_config(&config);
        assert!(!rules.server_push_enabled());
        assert_eq!(rules.decide("/events"), Decision::Forward);

        let config = GatewayConfig {
            server_push: ServerPushConfig {
                enabled: true,
                ..ServerPushConfig::default()
            },
            ..GatewayConfig::default()
        };
        let rules = RoutingRules::from_config(&config);
        assert!(rules.server_push_enabled());
        assert_eq!(
            rules.decide("/events"),
            Decision::Dispatch(HandlerKind::ServerPush)
        );
        assert_eq!(
            rules.decide("/cable"),
            Decision::Dispatch(HandlerKind::PersistentStream)
        );
    }

    #[test]
    fn handler_kind_labels() {
        assert_eq!(HandlerKind::PersistentStream.to_string(), "persistent-stream");
        assert_eq!(HandlerKind::ServerPush.to_string(), "server-push");
    }
}
