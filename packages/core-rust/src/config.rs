//! Gateway configuration assembled from collected options.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::logging::Level;

/// Errors from building a [`GatewayConfig`] out of an option list.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// An entry was not shaped `--name=value`.
    #[error("option {option} is not in --name=value form")]
    MalformedOption {
        /// The offending entry, verbatim.
        option: String,
    },
    /// A recognized key carried a value that does not parse.
    #[error("invalid value {value} for option {key}: expected {expected}")]
    InvalidValue {
        /// The recognized key.
        key: &'static str,
        /// The rejected value, verbatim.
        value: String,
        /// What a valid value looks like.
        expected: &'static str,
    },
}

/// Server-push (SSE) endpoint settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerPushConfig {
    /// Whether server-push traffic is routed at all.
    pub enabled: bool,
    /// Path served by the server-push handler when enabled.
    pub path: String,
}

impl Default for ServerPushConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            path: "/events".to_string(),
        }
    }
}

/// The slice of the embedded gateway's configuration the host touches.
///
/// Everything else the gateway accepts travels through `passthrough`
/// untouched; the gateway applies its own parsing and defaults there.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Paths served by the persistent-stream (`WebSocket`) handler.
    /// A trailing `*` makes an entry a prefix pattern.
    pub stream_paths: Vec<String>,
    /// Server-push endpoint settings.
    pub server_push: ServerPushConfig,
    /// How long shutdown waits for in-flight connections to drain.
    pub shutdown_timeout: Duration,
    /// Minimum level the gateway logs at.
    pub log_level: Level,
    /// Options recognized by the gateway but not by this view, as
    /// `(key, value)` pairs in input order.
    pub passthrough: Vec<(String, String)>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            stream_paths: vec!["/cable".to_string()],
            server_push: ServerPushConfig::default(),
            shutdown_timeout: Duration::from_secs(30),
            log_level: Level::INFO,
            passthrough: Vec::new(),
        }
    }
}

impl GatewayConfig {
    /// Builds a config from collected `--name=value` options.
    ///
    /// Recognized keys overwrite their field, so the last occurrence of a
    /// repeated key wins, matching the flag parsers the options ultimately
    /// feed. Unrecognized keys land in [`GatewayConfig::passthrough`] in
    /// input order, every occurrence kept.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MalformedOption`] for entries not shaped
    /// `--name=value` and [`ConfigError::InvalidValue`] when a recognized
    /// key's value does not parse.
    pub fn from_options(options: &[String]) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        for option in options {
            let (key, value) = split_option(option)?;
            match key {
                "path" => config.stream_paths = parse_paths(value)?,
                "sse" => {
                    config.server_push.enabled =
                        parse_bool(value).ok_or_else(|| ConfigError::InvalidValue {
                            key: "sse",
                            value: value.to_string(),
                            expected: "true, false, 1 or 0",
                        })?;
                }
                "sse_path" => config.server_push.path = value.to_string(),
                "shutdown_timeout" => {
                    let secs: u64 = value.parse().map_err(|_| ConfigError::InvalidValue {
                        key: "shutdown_timeout",
                        value: value.to_string(),
                        expected: "a whole number of seconds",
                    })?;
                    config.shutdown_timeout = Duration::from_secs(secs);
                }
                "log_level" => {
                    config.log_level =
                        Level::from_name(value).ok_or_else(|| ConfigError::InvalidValue {
                            key: "log_level",
                            value: value.to_string(),
                            expected: "debug, info, warn or error",
                        })?;
                }
                _ => config
                    .passthrough
                    .push((key.to_string(), value.to_string())),
            }
        }

        Ok(config)
    }
}

fn split_option(option: &str) -> Result<(&str, &str), ConfigError> {
    let malformed = || ConfigError::MalformedOption {
        option: option.to_string(),
    };
    let rest = option.strip_prefix("--").ok_or_else(malformed)?;
    let (key, value) = rest.split_once('=').ok_or_else(malformed)?;
    if key.is_empty() {
        return Err(malformed());
    }
    Ok((key, value))
}

/// Splits a comma-separated path list, trimming surrounding whitespace.
fn parse_paths(value: &str) -> Result<Vec<String>, ConfigError> {
    let paths: Vec<String> = value
        .split(',')
        .map(str::trim)
        .filter(|path| !path.is_empty())
        .map(ToString::to_string)
        .collect();
    if paths.is_empty() {
        return Err(ConfigError::InvalidValue {
            key: "path",
            value: value.to_string(),
            expected: "one or more comma-separated paths",
        });
    }
    Ok(paths)
}

fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::collect;

    #[test]
    fn gateway_config_defaults() {
        let config = GatewayConfig::default();
        assert_eq!(config.stream_paths, vec!["/cable"]);
        assert!(!config.server_push.enabled);
        assert_eq!(config.server_push.path, "/events");
        assert_eq!(config.shutdown_timeout, Duration::from_secs(30));
        assert_eq!(config.log_level, Level::INFO);
        assert!(config.passthrough.is_empty());
    }

    #[test]
    fn parses_recognized_keys() {
        let options = vec![
            "--path=/cable,/socket".to_string(),
            "--sse=true".to_string(),
            "--sse_path=/push".to_string(),
            "--shutdown_timeout=5".to_string(),
            "--log_level=debug".to_string(),
        ];
        let config = GatewayConfig::from_options(&options).unwrap();
        assert_eq!(config.stream_paths, vec!["/cable", "/socket"]);
        assert!(config.server_push.enabled);
        assert_eq!(config.server_push.path, "/push");
        assert_eq!(config.shutdown_timeout, Duration::from_secs(5));
        assert_eq!(config.log_level, Level::DEBUG);
    }

    #[test]
    fn path_list_trims_whitespace() {
        let options = vec!["--path=/cable, /socket".to_string()];
        let config = GatewayConfig::from_options(&options).unwrap();
        assert_eq!(config.stream_paths, vec!["/cable", "/socket"]);
    }

    #[test]
    fn last_occurrence_of_a_recognized_key_wins() {
        let options = vec![
            "--sse_path=/first".to_string(),
            "--sse_path=/second".to_string(),
        ];
        let config = GatewayConfig::from_options(&options).unwrap();
        assert_eq!(config.server_push.path, "/second");
    }

    #[test]
    fn unknown_keys_pass_through_in_order() {
        let options = vec![
            "--redis_url=redis://localhost:6379/5".to_string(),
            "--rpc_host=localhost:50051".to_string(),
            "--redis_url=redis://localhost:6379/6".to_string(),
        ];
        let config = GatewayConfig::from_options(&options).unwrap();
        assert_eq!(
            config.passthrough,
            vec![
                (
                    "redis_url".to_string(),
                    "redis://localhost:6379/5".to_string()
                ),
                ("rpc_host".to_string(), "localhost:50051".to_string()),
                (
                    "redis_url".to_string(),
                    "redis://localhost:6379/6".to_string()
                ),
            ]
        );
    }

    #[test]
    fn rejects_malformed_entries() {
        for option in ["path=/cable", "--path", "--=oops", "path"] {
            let err = GatewayConfig::from_options(&[option.to_string()]).unwrap_err();
            assert!(
                matches!(err, ConfigError::MalformedOption { .. }),
                "{option} should be malformed"
            );
        }
    }

    #[test]
    fn empty_value_is_allowed_for_passthrough_keys() {
        let options = vec!["--turbo_rails_key=".to_string()];
        let config = GatewayConfig::from_options(&options).unwrap();
        assert_eq!(
            config.passthrough,
            vec![("turbo_rails_key".to_string(), String::new())]
        );
    }

    #[test]
    fn rejects_invalid_values_naming_the_key() {
        let cases = [
            ("--sse=maybe", "sse"),
            ("--shutdown_timeout=soon", "shutdown_timeout"),
            ("--log_level=loud", "log_level"),
            ("--path=,,", "path"),
        ];
        for (option, expected_key) in cases {
            let err = GatewayConfig::from_options(&[option.to_string()]).unwrap_err();
            match err {
                ConfigError::InvalidValue { key, .. } => assert_eq!(key, expected_key),
                other => panic!("{option} produced unexpected error {other:?}"),
            }
        }
    }

    #[test]
    fn builds_from_a_collected_block() {
        let block = "anycable {\n  path /cable,/socket\n  sse true\n  log_level warn\n}";
        let options = collect(block).unwrap();
        let config = GatewayConfig::from_options(&options).unwrap();
        assert_eq!(config.stream_paths, vec!["/cable", "/socket"]);
        assert!(config.server_push.enabled);
        assert_eq!(config.log_level, Level::WARN);
    }
}
