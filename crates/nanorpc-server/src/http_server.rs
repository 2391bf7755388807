//! HTTP Server for nanorpc
//!
//! Listener plumbing around [`HttpRouter`], built on hyper's HTTP/1.1
//! connection builder.
//!
//! # Architecture
//!
//! The server:
//! - Accepts TCP connections until the shutdown future resolves
//! - Spawns a tokio task for each connection
//! - Routes every request through the [`HttpRouter`]
//! - On shutdown, stops accepting and gives open connections a grace
//!   period to finish before returning
//!
//! # Example
//!
//! ```no_run
//! use nanorpc_server::Server;
//! use tokio::net::TcpListener;
//!
//! #[tokio::main]
//! async fn main() {
//!     let server = Server::new();
//!     server
//!         .register("hello", |name: String| -> Result<String, String> {
//!             Ok(format!("hello {}", name))
//!         })
//!         .unwrap();
//!
//!     let listener = TcpListener::bind("127.0.0.1:8080").await.unwrap();
//!     server
//!         .serve(listener, std::future::pending::<()>())
//!         .await
//!         .unwrap();
//! }
//! ```

use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;

use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::Request;
use hyper_util::rt::TokioIo;
use hyper_util::server::graceful::GracefulShutdown;
use nanorpc_common::ServeError;
use tokio::net::TcpListener;

use crate::http_router::HttpRouter;

/// Default time open connections get to finish after shutdown is requested.
pub const DEFAULT_SHUTDOWN_GRACE: Duration = Duration::from_secs(1);

/// HTTP/1.1 server driving an [`HttpRouter`].
#[derive(Debug, Clone)]
pub struct HttpServer {
    router: HttpRouter,
    shutdown_grace: Duration,
}

impl HttpServer {
    pub fn new(router: HttpRouter) -> Self {
        Self {
            router,
            shutdown_grace: DEFAULT_SHUTDOWN_GRACE,
        }
    }

    pub fn with_shutdown_grace(mut self, grace: Duration) -> Self {
        self.shutdown_grace = grace;
        self
    }

    /// Bind `addr` and serve until `shutdown` resolves.
    pub async fn run<F>(self, addr: SocketAddr, shutdown: F) -> Result<(), ServeError>
    where
        F: Future<Output = ()> + Send,
    {
        let listener = TcpListener::bind(addr).await.map_err(|e| ServeError::Bind {
            addr: addr.to_string(),
            source: e,
        })?;
        self.serve(listener, shutdown).await
    }

    /// Serve connections from `listener` until `shutdown` resolves.
    ///
    /// Accept errors are logged and do not stop the server. After shutdown
    /// the listener is closed first, then open connections are drained for
    /// at most the shutdown grace period.
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> Result<(), ServeError>
    where
        F: Future<Output = ()> + Send,
    {
        let local_addr = listener.local_addr().map_err(ServeError::LocalAddr)?;
        tracing::info!("nanorpc server listening on {}", local_addr);

        let graceful = GracefulShutdown::new();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                accepted = listener.accept() => {
                    let (stream, peer) = match accepted {
                        Ok(conn) => conn,
                        Err(e) => {
                            tracing::error!("Failed to accept connection: {}", e);
                            continue;
                        }
                    };

                    let io = TokioIo::new(stream);
                    let router = self.router.clone();
                    let service = service_fn(move |req: Request<Incoming>| {
                        let router = router.clone();
                        async move { Ok::<_, Infallible>(router.handle(req).await) }
                    });

                    let conn = graceful.watch(http1::Builder::new().serve_connection(io, service));
                    tokio::spawn(async move {
                        if let Err(err) = conn.await {
                            tracing::error!("Error serving connection from {}: {}", peer, err);
                        }
                    });
                }
                _ = &mut shutdown => {
                    tracing::info!("shutdown requested, no longer accepting connections");
                    break;
                }
            }
        }

        drop(listener);

        tokio::select! {
            _ = graceful.shutdown() => {
                tracing::debug!("all connections closed");
            }
            _ = tokio::time::sleep(self.shutdown_grace) => {
                tracing::warn!(
                    "connections still open after {:?}, shutting down anyway",
                    self.shutdown_grace
                );
            }
        }

        Ok(())
    }
}
