//! nanorpc Error Types
//!
//! Every failure in the system is one of the enums below. Server-side errors
//! ([`RegistrationError`], [`DispatchError`]) never cross the wire as values;
//! the HTTP adapter turns a [`DispatchError`] into a status code plus a
//! plain-text message, and the client reports it back as
//! [`InvokeError::Remote`].

use hyper::StatusCode;
use thiserror::Error;

/// Failure to encode or decode a value with a [`Codec`](crate::Codec).
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("encode error: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("decode error: {0}")]
    Decode(#[source] serde_json::Error),
}

/// Rejected endpoint registration. Nothing is inserted when this is returned.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistrationError {
    #[error("endpoint name must not be empty")]
    EmptyName,

    #[error("endpoint name '{0}' must be a single URL path segment")]
    InvalidName(String),
}

/// Failure of a single dispatched call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    #[error("method {0} not found")]
    NotFound(String),

    #[error("bad argument: {0}")]
    BadArgument(String),

    /// The callable returned an error; carries its textual description.
    #[error("{0}")]
    Remote(String),

    #[error("failed to encode result: {0}")]
    Encoding(String),
}

impl DispatchError {
    /// HTTP status reported for this failure.
    pub fn status(&self) -> StatusCode {
        match self {
            DispatchError::NotFound(_) => StatusCode::NOT_FOUND,
            DispatchError::BadArgument(_) => StatusCode::BAD_REQUEST,
            DispatchError::Remote(_) | DispatchError::Encoding(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// Why a [`CallContext`](crate::CallContext) is done.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextError {
    #[error("context canceled")]
    Cancelled,

    #[error("context deadline exceeded")]
    DeadlineExceeded,
}

/// Failure of one request/response exchange, before any status was seen.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("invalid URI '{uri}': {reason}")]
    InvalidUri { uri: String, reason: String },

    #[error("failed to connect: {0}")]
    Connect(String),

    #[error("HTTP request failed: {0}")]
    Request(String),

    #[error("failed to read response body: {0}")]
    Body(String),

    #[error("exchange cancelled: {0}")]
    Cancelled(#[from] ContextError),
}

impl TransportError {
    /// Network failures may clear up; a bad URL or a finished context won't.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            TransportError::Connect(_) | TransportError::Request(_) | TransportError::Body(_)
        )
    }
}

/// Failure of a client invocation, as surfaced to the caller.
#[derive(Error, Debug)]
pub enum InvokeError {
    #[error("failed to encode argument: {0}")]
    Encode(#[source] CodecError),

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The server answered with a non-success status.
    #[error("code {status}: {message}")]
    Remote { status: u16, message: String },

    #[error("failed to decode result: {0}")]
    Decode(#[source] CodecError),

    #[error("context canceled")]
    Cancelled,

    #[error("context deadline exceeded")]
    DeadlineExceeded,
}

impl InvokeError {
    /// Status code of a remote failure, if the server produced one.
    pub fn status(&self) -> Option<u16> {
        match self {
            InvokeError::Remote { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns `true` for failures that another attempt might not hit.
    ///
    /// Network failures are retryable; remote failures only when
    /// `retry_remote` is set. Invalid URLs, encode, decode and context
    /// failures never are.
    pub fn is_retryable(&self, retry_remote: bool) -> bool {
        match self {
            InvokeError::Transport(e) => e.is_retryable(),
            InvokeError::Remote { .. } => retry_remote,
            _ => false,
        }
    }

    /// Returns `true` if the invocation was stopped by its context.
    pub fn is_context(&self) -> bool {
        matches!(self, InvokeError::Cancelled | InvokeError::DeadlineExceeded)
    }
}

impl From<ContextError> for InvokeError {
    fn from(err: ContextError) -> Self {
        match err {
            ContextError::Cancelled => InvokeError::Cancelled,
            ContextError::DeadlineExceeded => InvokeError::DeadlineExceeded,
        }
    }
}

/// Failure of the listener plumbing around the HTTP adapter.
#[derive(Error, Debug)]
pub enum ServeError {
    #[error("failed to bind to {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to get local address: {0}")]
    LocalAddr(#[source] std::io::Error),
}
