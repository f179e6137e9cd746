//! The embedding surface of a realtime messaging gateway.
//!
//! The gateway itself lives behind two narrow traits: [`GatewayRunner`]
//! starts a configured instance, and [`EmbeddedGateway`] is the running
//! instance -- two request handlers plus a graceful shutdown. Everything
//! the host needs to route traffic into the gateway flows through these
//! seams, which is also what makes the lifecycle testable with doubles.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::response::Response;
use http::Request;
use tower::util::BoxCloneSyncService;
use tower::Service;

use cableway_core::config::GatewayConfig;
use cableway_core::logging::LogHandler;

/// Gateway instance name used when the host does not pick one.
pub const DEFAULT_INSTANCE_NAME: &str = "cableway";

// ---------------------------------------------------------------------------
// RequestHandler
// ---------------------------------------------------------------------------

/// A gateway-owned request handler, shareable across request tasks.
///
/// Handlers are cloned per dispatch, so a gateway hands them out once at
/// startup and the router drives a fresh clone for every request.
pub type RequestHandler = BoxCloneSyncService<Request<Body>, Response, Infallible>;

/// Boxes any compatible service (for example an axum `Router`) into the
/// shared [`RequestHandler`] shape.
#[must_use]
pub fn request_handler<S>(service: S) -> RequestHandler
where
    S: Service<Request<Body>, Response = Response, Error = Infallible>
        + Clone
        + Send
        + Sync
        + 'static,
    S::Future: Send + 'static,
{
    BoxCloneSyncService::new(service)
}

// ---------------------------------------------------------------------------
// RunnerOptions
// ---------------------------------------------------------------------------

/// Default integrations a gateway instance starts with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    /// Dispatches commands to the application's RPC controller.
    RpcController,
    /// Keeps session and stream state for reconnecting clients.
    Broker,
    /// Subscribes the node to the pub/sub backend.
    Subscriber,
    /// Publishes broadcast messages to other nodes.
    Broadcaster,
}

impl Component {
    /// Short label used in logs.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Component::RpcController => "rpc-controller",
            Component::Broker => "broker",
            Component::Subscriber => "subscriber",
            Component::Broadcaster => "broadcaster",
        }
    }
}

/// Startup options handed to a [`GatewayRunner`] alongside the config.
#[derive(Clone)]
pub struct RunnerOptions {
    /// Instance name, surfaced in the gateway's own diagnostics.
    pub name: String,
    /// Integrations to start, in order.
    pub components: Vec<Component>,
    /// Logger the gateway emits through.
    pub logger: Arc<dyn LogHandler>,
}

impl RunnerOptions {
    /// The standard embedded bundle: RPC controller, broker, subscriber
    /// and broadcaster, under the default instance name.
    #[must_use]
    pub fn embedded_defaults(logger: Arc<dyn LogHandler>) -> Self {
        Self {
            name: DEFAULT_INSTANCE_NAME.to_string(),
            components: vec![
                Component::RpcController,
                Component::Broker,
                Component::Subscriber,
                Component::Broadcaster,
            ],
            logger,
        }
    }

    /// Overrides the instance name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

// ---------------------------------------------------------------------------
// Gateway traits
// ---------------------------------------------------------------------------

/// A running gateway instance.
#[async_trait]
pub trait EmbeddedGateway: Send + Sync {
    /// Handler for persistent bidirectional streams (`WebSocket`).
    ///
    /// # Errors
    ///
    /// Returns an error if the gateway cannot expose the handler, for
    /// example because the transport was compiled out.
    fn websocket_handler(&self) -> anyhow::Result<RequestHandler>;

    /// Handler for unidirectional push streams (SSE).
    ///
    /// # Errors
    ///
    /// Returns an error if the gateway cannot expose the handler.
    fn sse_handler(&self) -> anyhow::Result<RequestHandler>;

    /// Gracefully stops the gateway, allowing in-flight connections at
    /// most `deadline` to drain.
    ///
    /// # Errors
    ///
    /// Returns an error if teardown fails; connections may already have
    /// been dropped by then.
    async fn shutdown(&self, deadline: Duration) -> anyhow::Result<()>;
}

/// Starts gateway instances.
#[async_trait]
pub trait GatewayRunner: Send + Sync {
    /// Starts one instance for `config` and hands back its embedding
    /// surface. The instance is fully operational on return.
    ///
    /// # Errors
    ///
    /// Returns an error if any component fails to start; a failed start
    /// leaves nothing running.
    async fn start(
        &self,
        config: &GatewayConfig,
        options: RunnerOptions,
    ) -> anyhow::Result<Box<dyn EmbeddedGateway>>;
}
