//! Tower middleware that routes realtime traffic to gateway handlers.
//!
//! Evaluated once per request: traffic matching the routing rules is handed
//! to a gateway handler and the middleware is terminal for it; everything
//! else reaches the inner service exactly once. The decision is a pure
//! function over rules fixed at provisioning time, so concurrent requests
//! share nothing mutable.

use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::body::Body;
use axum::response::Response;
use http::Request;
use tower::{Layer, Service, ServiceExt};

use cableway_core::routing::{Decision, HandlerKind, RoutingRules};

use crate::gateway::RequestHandler;

// ---------------------------------------------------------------------------
// GatewayLayer
// ---------------------------------------------------------------------------

/// Tower layer installing gateway routing in front of a service stack.
///
/// Usually obtained from a provisioned
/// [`GatewayModule`](crate::module::GatewayModule), but can be built
/// directly from rules and handlers.
#[derive(Clone)]
pub struct GatewayLayer {
    rules: Arc<RoutingRules>,
    stream_handler: RequestHandler,
    push_handler: Option<RequestHandler>,
}

impl GatewayLayer {
    /// Builds a layer from routing rules and published handlers.
    ///
    /// # Panics
    ///
    /// Panics if `rules` route server-push traffic but `push_handler` is
    /// `None`. A request could then only be dispatched into a void, and a
    /// missing handler must fail loudly, never downgrade to forwarding.
    #[must_use]
    pub fn new(
        rules: Arc<RoutingRules>,
        stream_handler: RequestHandler,
        push_handler: Option<RequestHandler>,
    ) -> Self {
        assert!(
            !rules.server_push_enabled() || push_handler.is_some(),
            "server-push routing is enabled but no server-push handler was published"
        );
        Self {
            rules,
            stream_handler,
            push_handler,
        }
    }
}

impl<S> Layer<S> for GatewayLayer {
    type Service = GatewayService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        GatewayService {
            inner,
            rules: Arc::clone(&self.rules),
            stream_handler: self.stream_handler.clone(),
            push_handler: self.push_handler.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// GatewayService
// ---------------------------------------------------------------------------

/// Service wrapper performing the per-request dispatch.
#[derive(Clone)]
pub struct GatewayService<S> {
    inner: S,
    rules: Arc<RoutingRules>,
    stream_handler: RequestHandler,
    push_handler: Option<RequestHandler>,
}

impl<S> Service<Request<Body>> for GatewayService<S>
where
    S: Service<Request<Body>, Response = Response, Error = Infallible>,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Response, Infallible>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        match self.rules.decide(req.uri().path()) {
            Decision::Dispatch(HandlerKind::PersistentStream) => {
                Box::pin(self.stream_handler.clone().oneshot(req))
            }
            Decision::Dispatch(HandlerKind::ServerPush) => {
                let handler = self.push_handler.clone().expect(
                    "server-push routing is enabled but no server-push handler was published",
                );
                Box::pin(handler.oneshot(req))
            }
            Decision::Forward => Box::pin(self.inner.call(req)),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
