//! Cableway Core — gateway options, routing rules, and the logging contract.

pub mod config;
pub mod logging;
pub mod options;
pub mod routing;

pub use config::{ConfigError, GatewayConfig, ServerPushConfig};
pub use logging::{Attr, AttrValue, Level, LogHandler, LogRecord};
pub use options::{collect, OptionError, OptionList};
pub use routing::{Decision, HandlerKind, RoutingRules};
