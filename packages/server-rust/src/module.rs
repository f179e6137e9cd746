//! Embedded gateway lifecycle: provisioning and graceful teardown.
//!
//! [`GatewayModule`] follows the deferred lifecycle its host drives:
//! collect options at construction, `provision()` once to start the
//! gateway and publish its handlers, hand the routing layer to the
//! middleware stack, and `shutdown()` once when the host drains. Between
//! provisioning and teardown the published handle is read-only and safe
//! to share across request tasks.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{error, info};

use cableway_core::config::{ConfigError, GatewayConfig};
use cableway_core::logging::LogHandler;
use cableway_core::options::{collect, OptionError, OptionList};
use cableway_core::routing::{HandlerKind, RoutingRules};

use crate::gateway::{EmbeddedGateway, GatewayRunner, RequestHandler, RunnerOptions};
use crate::middleware::GatewayLayer;

/// Errors from provisioning the embedded gateway.
#[derive(Debug, Error)]
pub enum ProvisionError {
    /// `provision()` ran on an already-provisioned module.
    #[error("gateway is already provisioned")]
    AlreadyProvisioned,
    /// The collected options do not form a valid configuration.
    #[error("invalid gateway options: {0}")]
    Config(#[from] ConfigError),
    /// The gateway failed to start; nothing was published.
    #[error("embedded gateway failed to start")]
    Startup(#[source] anyhow::Error),
    /// A handler the routing rules require could not be retrieved.
    #[error("embedded gateway exposes no {kind} handler")]
    Handler {
        /// Which handler was required.
        kind: HandlerKind,
        /// What the gateway reported.
        source: anyhow::Error,
    },
}

/// Errors from shutting the embedded gateway down.
#[derive(Debug, Error)]
pub enum ShutdownError {
    /// The gateway reported a teardown failure.
    #[error("embedded gateway reported a shutdown failure")]
    Gateway(#[source] anyhow::Error),
    /// The gateway did not return within the drain deadline.
    #[error("embedded gateway did not stop within {deadline:?}")]
    DeadlineExceeded {
        /// The deadline that expired.
        deadline: Duration,
    },
}

/// Handle to a provisioned, running gateway.
///
/// Published once by [`GatewayModule::provision`] and consumed once by
/// shutdown; everything in between is shared read-only.
pub struct GatewayHandle {
    config: Arc<GatewayConfig>,
    rules: Arc<RoutingRules>,
    stream_handler: RequestHandler,
    push_handler: Option<RequestHandler>,
    gateway: Arc<dyn EmbeddedGateway>,
}

impl GatewayHandle {
    /// Effective configuration the gateway was started with.
    #[must_use]
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Routing rules derived from the configuration.
    #[must_use]
    pub fn rules(&self) -> Arc<RoutingRules> {
        Arc::clone(&self.rules)
    }

    /// Builds the routing layer for this gateway.
    #[must_use]
    pub fn routing_layer(&self) -> GatewayLayer {
        GatewayLayer::new(
            Arc::clone(&self.rules),
            self.stream_handler.clone(),
            self.push_handler.clone(),
        )
    }
}

/// Owns the embedded gateway's lifecycle inside a host server.
///
/// 1. `from_directive()` / `from_options()` -- store the option list
/// 2. `provision()` -- build config, start the gateway, publish handlers
/// 3. `routing_layer()` -- install dispatch into the host's stack
/// 4. `shutdown()` -- drain within the configured deadline
pub struct GatewayModule {
    options: OptionList,
    logger: Arc<dyn LogHandler>,
    handle: Option<GatewayHandle>,
}

impl GatewayModule {
    /// Creates a module from a raw directive block.
    ///
    /// # Errors
    ///
    /// Returns the collection error verbatim when the block is malformed;
    /// a module is only created from a fully valid block.
    pub fn from_directive(block: &str, logger: Arc<dyn LogHandler>) -> Result<Self, OptionError> {
        let options = collect(block)?;
        Ok(Self::from_options(options, logger))
    }

    /// Creates a module from already-collected options.
    #[must_use]
    pub fn from_options(options: OptionList, logger: Arc<dyn LogHandler>) -> Self {
        Self {
            options,
            logger,
            handle: None,
        }
    }

    /// The collected `--key=value` options, in input order.
    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    /// Whether `provision()` has completed and the handle is live.
    #[must_use]
    pub fn is_provisioned(&self) -> bool {
        self.handle.is_some()
    }

    /// The published handle, if provisioning completed.
    #[must_use]
    pub fn handle(&self) -> Option<&GatewayHandle> {
        self.handle.as_ref()
    }

    /// Builds configuration from the stored options, starts the gateway
    /// through `runner` with the standard component bundle and this
    /// module's logger, retrieves the request handlers, and publishes the
    /// handle.
    ///
    /// The persistent-stream handler is always required. The server-push
    /// handler is required when server-push routing is enabled, and kept
    /// only if available otherwise.
    ///
    /// # Errors
    ///
    /// Any failure aborts provisioning and publishes nothing: invalid
    /// options, a failed start, or a missing required handler.
    pub async fn provision(&mut self, runner: &dyn GatewayRunner) -> Result<(), ProvisionError> {
        if self.handle.is_some() {
            return Err(ProvisionError::AlreadyProvisioned);
        }

        let config = GatewayConfig::from_options(&self.options)?;
        let rules = RoutingRules::from_config(&config);

        let options = RunnerOptions::embedded_defaults(Arc::clone(&self.logger));
        let gateway = runner
            .start(&config, options)
            .await
            .map_err(ProvisionError::Startup)?;

        let stream_handler = gateway
            .websocket_handler()
            .map_err(|source| ProvisionError::Handler {
                kind: HandlerKind::PersistentStream,
                source,
            })?;
        let push_handler = if config.server_push.enabled {
            let handler = gateway
                .sse_handler()
                .map_err(|source| ProvisionError::Handler {
                    kind: HandlerKind::ServerPush,
                    source,
                })?;
            Some(handler)
        } else {
            // Not routed, but kept on the handle when the gateway offers one.
            gateway.sse_handler().ok()
        };

        info!(
            "Embedded gateway provisioned (stream paths {:?}, server-push {})",
            config.stream_paths, config.server_push.enabled
        );

        self.handle = Some(GatewayHandle {
            config: Arc::new(config),
            rules: Arc::new(rules),
            stream_handler,
            push_handler,
            gateway: Arc::from(gateway),
        });
        Ok(())
    }

    /// Builds the routing layer from the published handle.
    ///
    /// # Panics
    ///
    /// Panics if `provision()` has not completed. Routing without a live
    /// gateway is a wiring bug, not a runtime condition.
    #[must_use]
    pub fn routing_layer(&self) -> GatewayLayer {
        self.handle
            .as_ref()
            .expect("provision() must complete before building the routing layer")
            .routing_layer()
    }

    /// Shuts the gateway down within the configured drain deadline.
    ///
    /// A module that never provisioned, or that already shut down, returns
    /// success immediately.
    ///
    /// # Errors
    ///
    /// Propagates gateway-reported failures and deadline expiry, after
    /// logging them.
    pub async fn shutdown(&mut self) -> Result<(), ShutdownError> {
        let Some(deadline) = self.handle.as_ref().map(|h| h.config.shutdown_timeout) else {
            return Ok(());
        };
        self.shutdown_within(deadline).await
    }

    /// Shuts the gateway down within an explicit deadline.
    ///
    /// The deadline is passed to the gateway and enforced here as well,
    /// so the call returns no later than `deadline` even against a
    /// collaborator that never does. The handle is taken before awaiting:
    /// teardown runs at most once.
    ///
    /// # Errors
    ///
    /// Propagates gateway-reported failures and deadline expiry, after
    /// logging them.
    pub async fn shutdown_within(&mut self, deadline: Duration) -> Result<(), ShutdownError> {
        let Some(handle) = self.handle.take() else {
            return Ok(());
        };

        info!("Shutting down embedded gateway (deadline {deadline:?})");
        match tokio::time::timeout(deadline, handle.gateway.shutdown(deadline)).await {
            Ok(Ok(())) => {
                info!("Embedded gateway stopped");
                Ok(())
            }
            Ok(Err(source)) => {
                error!("Embedded gateway shutdown failed: {source:#}");
                Err(ShutdownError::Gateway(source))
            }
            Err(_elapsed) => {
                error!("Embedded gateway shutdown exceeded its {deadline:?} deadline");
                Err(ShutdownError::DeadlineExceeded { deadline })
            }
        }
    }
}

impl fmt::Debug for GatewayModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewayModule")
            .field("options", &self.options)
            .field("provisioned", &self.handle.is_some())
            .finish_non_exhaustive()
    }
}
