//! nanorpc Client
//!
//! Invokes endpoints exposed by a nanorpc server: encodes the argument,
//! performs the HTTP exchange, classifies failures and retries under a
//! [`RetryPolicy`] until the call's [`CallContext`] is done.
//!
//! [`CallContext`]: nanorpc_common::CallContext

pub mod client;
pub mod retry;
pub mod transport;

pub use client::{Client, ClientConfig, DEFAULT_TIMEOUT};
pub use nanorpc_common::{CallContext, InvokeError};
pub use retry::RetryPolicy;
pub use transport::{HttpTransport, Transport, TransportRequest, TransportResponse};
