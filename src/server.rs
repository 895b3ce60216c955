use axum::Router;
use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::readiness::ReadinessGate;
use crate::translation::Translator;

/// Lifecycle errors reported to the runner that drives the server
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("http server is already running")]
    AlreadyRunning,

    #[error("failed to bind http listener on {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("http server failed: {0}")]
    Serve(#[source] std::io::Error),

    #[error("http server did not drain within {0:?}")]
    DrainTimeout(Duration),

    #[error("http server task panicked: {0}")]
    Panicked(String),

    #[error("timeout after {0:?} while waiting for the http server to be ready")]
    ReadyTimeout(Duration),

    #[error("shutdown requested before the http server became ready")]
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ServerState {
    Idle = 0,
    Starting = 1,
    Ready = 2,
    Serving = 3,
    ShuttingDown = 4,
    Stopped = 5,
    Failed = 6,
}

impl ServerState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Idle,
            1 => Self::Starting,
            2 => Self::Ready,
            3 => Self::Serving,
            4 => Self::ShuttingDown,
            5 => Self::Stopped,
            _ => Self::Failed,
        }
    }
}

/// Options for [`HttpServer`]
#[derive(Debug, Clone)]
pub struct ServerOptions {
    pub addr: SocketAddr,
    /// Upper bound for draining open connections on shutdown
    pub shutdown_timeout: Duration,
}

pub struct HttpServer {
    options: ServerOptions,
    router: Router,
    translator: Arc<dyn Translator>,
    state: AtomicU8,
    ready: ReadinessGate,
    local_addr: OnceLock<SocketAddr>,
}

impl HttpServer {
    pub fn new(router: Router, translator: Arc<dyn Translator>, options: ServerOptions) -> Self {
        Self {
            options,
            router,
            translator,
            state: AtomicU8::new(ServerState::Idle as u8),
            ready: ReadinessGate::new(),
            local_addr: OnceLock::new(),
        }
    }

    pub fn state(&self) -> ServerState {
        ServerState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Address the listener is bound to, once bound
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr.get().copied()
    }

    fn set_state(&self, state: ServerState) {
        self.state.store(state as u8, Ordering::Release);
    }

    fn fail(&self, err: LifecycleError) -> LifecycleError {
        self.set_state(ServerState::Failed);
        error!("{}", err);
        err
    }

    /// Bind, serve until `token` is cancelled, then shut down in order.
    ///
    /// A server instance runs at most once: any call after the first fails
    /// with [`LifecycleError::AlreadyRunning`] without touching the first run.
    pub async fn run(&self, token: CancellationToken) -> Result<(), LifecycleError> {
        if self
            .state
            .compare_exchange(
                ServerState::Idle as u8,
                ServerState::Starting as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_err()
        {
            return Err(LifecycleError::AlreadyRunning);
        }

        info!("Starting http server on {}", self.options.addr);

        let listener = match TcpListener::bind(self.options.addr).await {
            Ok(listener) => listener,
            Err(source) => {
                return Err(self.fail(LifecycleError::Bind {
                    addr: self.options.addr,
                    source,
                }))
            }
        };
        let local_addr = listener.local_addr().map_err(|e| self.fail(LifecycleError::Serve(e)))?;
        let _ = self.local_addr.set(local_addr);

        self.set_state(ServerState::Ready);
        self.ready.fire();

        // Drain is triggered separately so the backend can be closed first
        let drain = CancellationToken::new();
        let mut serve = tokio::spawn(
            axum::serve(listener, self.router.clone())
                .with_graceful_shutdown(drain.clone().cancelled_owned())
                .into_future(),
        );
        self.set_state(ServerState::Serving);
        info!("Http server listening on {}", local_addr);

        let early_exit = tokio::select! {
            () = token.cancelled() => None,
            joined = &mut serve => Some(joined),
        };

        if let Some(joined) = early_exit {
            // The accept loop ended without a shutdown request
            self.translator.close();
            return match joined {
                Ok(Ok(())) => Err(self.fail(LifecycleError::Serve(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    "accept loop exited unexpectedly",
                )))),
                Ok(Err(e)) => Err(self.fail(LifecycleError::Serve(e))),
                Err(e) => Err(self.fail(LifecycleError::Panicked(e.to_string()))),
            };
        }

        self.set_state(ServerState::ShuttingDown);
        info!("Shutting down http server");

        self.translator.close();
        drain.cancel();

        match tokio::time::timeout(self.options.shutdown_timeout, &mut serve).await {
            Ok(Ok(Ok(()))) => {
                self.set_state(ServerState::Stopped);
                info!("Http server stopped");
                Ok(())
            }
            Ok(Ok(Err(e))) => Err(self.fail(LifecycleError::Serve(e))),
            Ok(Err(e)) => Err(self.fail(LifecycleError::Panicked(e.to_string()))),
            Err(_) => {
                serve.abort();
                Err(self.fail(LifecycleError::DrainTimeout(
                    self.options.shutdown_timeout,
                )))
            }
        }
    }

    /// Wait until the listener is bound, for at most `timeout`.
    ///
    /// Returns immediately if the server is already ready.
    pub async fn ready(
        &self,
        timeout: Duration,
        token: &CancellationToken,
    ) -> Result<(), LifecycleError> {
        tokio::select! {
            fired = self.ready.wait_timeout(timeout) => {
                if fired {
                    Ok(())
                } else {
                    Err(LifecycleError::ReadyTimeout(timeout))
                }
            }
            () = token.cancelled(), if !self.ready.is_fired() => Err(LifecycleError::Cancelled),
        }
    }
}
