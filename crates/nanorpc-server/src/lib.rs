//! nanorpc Server
//!
//! This crate exposes ordinary Rust functions and closures as named remote
//! endpoints over HTTP.
//!
//! - [`MethodTable`]: endpoint name → validated [`MethodDescriptor`]
//! - [`Dispatcher`]: lookup, decode, invoke and encode for one call
//! - [`HttpRouter`]: the HTTP adapter, usable under hyper or axum
//! - [`HttpServer`]: listener loop with graceful shutdown
//! - [`Server`]: facade tying the pieces together

pub mod dispatcher;
pub mod http_router;
pub mod http_server;
pub mod method_table;
pub mod server;
pub mod service;

pub use dispatcher::Dispatcher;
pub use http_router::HttpRouter;
pub use http_server::HttpServer;
pub use method_table::{ArgPassing, MethodDescriptor, MethodTable};
pub use server::{Server, ServerConfig};
pub use service::Service;
