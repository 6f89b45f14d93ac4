//! HTTP/1.1 server implementation

use async_trait::async_trait;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::handlers::{handle_request, AppState};

/// How long in-flight connections get to finish after shutdown is requested
pub const DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

/// Pause after a failed accept so a full fd table does not spin the loop
pub const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Source of inbound TCP connections
#[async_trait]
pub trait Acceptor: Send + Sync {
    async fn accept(&self) -> io::Result<(TcpStream, SocketAddr)>;

    fn local_addr(&self) -> io::Result<SocketAddr>;
}

#[async_trait]
impl Acceptor for TcpListener {
    async fn accept(&self) -> io::Result<(TcpStream, SocketAddr)> {
        TcpListener::accept(self).await
    }

    fn local_addr(&self) -> io::Result<SocketAddr> {
        TcpListener::local_addr(self)
    }
}

pub struct VacanciesServer {
    state: Arc<AppState>,
}

impl VacanciesServer {
    pub fn new(state: AppState) -> Self {
        Self {
            state: Arc::new(state),
        }
    }

    pub async fn serve(self, addr: SocketAddr, shutdown: impl Future<Output = ()>) -> io::Result<()> {
        let listener = TcpListener::bind(addr).await?;
        self.serve_listener(listener, shutdown).await
    }

    /// Accept connections on `listener` until `shutdown` resolves
    ///
    /// A failed accept is logged and retried; only binding can fail the
    /// server. On shutdown, open connections finish their current request
    /// and are closed.
    pub async fn serve_listener<L: Acceptor>(
        self,
        listener: L,
        shutdown: impl Future<Output = ()>,
    ) -> io::Result<()> {
        info!("vacancies server listening on {}", listener.local_addr()?);

        let (stop_tx, stop_rx) = watch::channel(false);
        let mut connections = JoinSet::new();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                accepted = listener.accept() => {
                    let (stream, remote_addr) = match accepted {
                        Ok(accepted) => accepted,
                        Err(e) => {
                            warn!(error = %e, "Failed to accept connection");
                            tokio::time::sleep(ACCEPT_BACKOFF).await;
                            continue;
                        }
                    };
                    debug!("New connection from {}", remote_addr);

                    let state = Arc::clone(&self.state);
                    let stop = stop_rx.clone();
                    connections.spawn(async move {
                        if let Err(err) = Self::handle_connection(stream, state, stop).await {
                            error!("Connection error from {}: {}", remote_addr, err);
                        }
                    });
                }
                Some(_) = connections.join_next(), if !connections.is_empty() => {}
                _ = &mut shutdown => {
                    info!("Shutdown requested, draining {} connection(s)", connections.len());
                    break;
                }
            }
        }

        let _ = stop_tx.send(true);
        let drain = async { while connections.join_next().await.is_some() {} };
        if tokio::time::timeout(DRAIN_TIMEOUT, drain).await.is_err() {
            warn!(
                "Shutdown timeout after {}s, remaining connections are dropped",
                DRAIN_TIMEOUT.as_secs()
            );
        }

        Ok(())
    }

    async fn handle_connection(
        stream: TcpStream,
        state: Arc<AppState>,
        mut stop: watch::Receiver<bool>,
    ) -> hyper::Result<()> {
        let io = TokioIo::new(stream);

        let service = service_fn(move |req| {
            let state = Arc::clone(&state);
            async move { handle_request(req, state).await }
        });

        let conn = http1::Builder::new().serve_connection(io, service);
        tokio::pin!(conn);

        tokio::select! {
            result = conn.as_mut() => result,
            _ = stop.changed() => {
                conn.as_mut().graceful_shutdown();
                conn.await
            }
        }
    }
}
