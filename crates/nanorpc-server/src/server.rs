//! The [`Server`] facade: one method table plus its transport adapters.

use std::collections::BTreeSet;
use std::fmt;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use hyper::body::Body;
use hyper::Request;
use nanorpc_common::{Codec, DispatchError, HyperResponse, RegistrationError, ServeError};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::net::TcpListener;

use crate::dispatcher::Dispatcher;
use crate::http_router::HttpRouter;
use crate::http_server::{HttpServer, DEFAULT_SHUTDOWN_GRACE};
use crate::method_table::MethodTable;
use crate::service::Service;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// How long open connections may keep running after shutdown starts.
    pub shutdown_grace: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            shutdown_grace: DEFAULT_SHUTDOWN_GRACE,
        }
    }
}

impl ServerConfig {
    pub fn with_shutdown_grace(mut self, grace: Duration) -> Self {
        self.shutdown_grace = grace;
        self
    }
}

/// Exposes registered callables over HTTP.
///
/// Clones share the same method table, so endpoints registered through one
/// handle are visible to a server already running from another.
///
/// # Example
///
/// ```
/// use nanorpc_server::Server;
///
/// let server = Server::new();
/// server
///     .register("hello", |name: String| -> Result<String, String> {
///         Ok(format!("hello {}", name))
///     })
///     .unwrap();
///
/// let out = server.dispatch("hello", br#""reddec""#).unwrap();
/// assert_eq!(out, br#""hello reddec""#);
/// ```
#[derive(Clone, Default)]
pub struct Server {
    table: Arc<MethodTable>,
    codec: Codec,
    config: ServerConfig,
}

impl Server {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ServerConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn with_codec(mut self, codec: Codec) -> Self {
        self.codec = codec;
        self
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// The shared method table, for descriptor-level access.
    pub fn table(&self) -> &Arc<MethodTable> {
        &self.table
    }

    /// Register a callable taking its argument by value.
    pub fn register<A, R, E, F>(&self, name: &str, callable: F) -> Result<(), RegistrationError>
    where
        A: DeserializeOwned + 'static,
        R: Serialize + 'static,
        E: fmt::Display + 'static,
        F: Fn(A) -> Result<R, E> + Send + Sync + 'static,
    {
        self.table.register(name, callable)
    }

    /// Register a callable taking `&mut` to its argument.
    pub fn register_by_ref<A, R, E, F>(
        &self,
        name: &str,
        callable: F,
    ) -> Result<(), RegistrationError>
    where
        A: DeserializeOwned + 'static,
        R: Serialize + 'static,
        E: fmt::Display + 'static,
        F: Fn(&mut A) -> Result<R, E> + Send + Sync + 'static,
    {
        self.table.register_by_ref(name, callable)
    }

    /// Register every public endpoint of `service`; returns how many.
    pub fn register_all<S: Service>(&self, service: Arc<S>) -> usize {
        self.table.register_all(service)
    }

    pub fn names(&self) -> BTreeSet<String> {
        self.table.names()
    }

    pub fn dispatcher(&self) -> Dispatcher {
        Dispatcher::new(self.table.clone(), self.codec)
    }

    /// Dispatch one call without going through HTTP.
    pub fn dispatch(&self, name: &str, argument: &[u8]) -> Result<Vec<u8>, DispatchError> {
        self.dispatcher().dispatch(name, argument)
    }

    pub fn router(&self) -> HttpRouter {
        HttpRouter::new(self.dispatcher())
    }

    /// Handle one HTTP request.
    pub async fn handle<B>(&self, req: Request<B>) -> HyperResponse
    where
        B: Body + Send,
        B::Data: Send,
        B::Error: fmt::Display,
    {
        self.router().handle(req).await
    }

    /// An axum router that sends every request to this server.
    ///
    /// ```
    /// use axum::Router;
    /// use nanorpc_server::Server;
    ///
    /// let server = Server::new();
    /// let app: Router = Router::new().nest("/rpc", server.into_router());
    /// ```
    pub fn into_router(self) -> Router {
        self.router().into_axum()
    }

    pub fn http_server(&self) -> HttpServer {
        HttpServer::new(self.router()).with_shutdown_grace(self.config.shutdown_grace)
    }

    /// Serve on an already bound listener until `shutdown` resolves.
    pub async fn serve<F>(&self, listener: TcpListener, shutdown: F) -> Result<(), ServeError>
    where
        F: Future<Output = ()> + Send,
    {
        self.http_server().serve(listener, shutdown).await
    }

    /// Bind `addr` and serve until `shutdown` resolves.
    pub async fn listen_and_serve<F>(&self, addr: SocketAddr, shutdown: F) -> Result<(), ServeError>
    where
        F: Future<Output = ()> + Send,
    {
        self.http_server().run(addr, shutdown).await
    }
}

impl fmt::Debug for Server {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Server")
            .field("endpoints", &self.table.names())
            .field("codec", &self.codec)
            .field("config", &self.config)
            .finish()
    }
}
