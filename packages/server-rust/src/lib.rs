//! Cableway Server — `axum` middleware embedding a realtime messaging gateway.

pub mod gateway;
pub mod logging;
pub mod middleware;
pub mod module;

pub use gateway::{
    request_handler, Component, EmbeddedGateway, GatewayRunner, RequestHandler, RunnerOptions,
    DEFAULT_INSTANCE_NAME,
};
pub use logging::{gateway_level_for, tracing_level_for, TracingBridge, GATEWAY_LOG_TARGET};
pub use middleware::{GatewayLayer, GatewayService};
pub use module::{GatewayHandle, GatewayModule, ProvisionError, ShutdownError};
