//! nanorpc Common Types
//!
//! This crate provides the pieces shared by the nanorpc server and client:
//!
//! - **Codec**: JSON encoding of endpoint arguments and results
//! - **Wire helpers**: building HTTP requests and responses for the
//!   `POST <base>/<endpoint>` protocol
//! - **Call contexts**: cancellation and deadline signals carried by every
//!   client invocation
//! - **Errors**: the full error taxonomy of registration, dispatch and
//!   invocation
//!
//! # Wire Protocol
//!
//! - **Transport**: HTTP/1.1, `POST` only
//! - **Target**: `<base URL>/<endpoint name>`
//! - **Request body**: JSON encoding of the single argument
//! - **Success**: `200` with the JSON encoding of the result
//! - **Failure**: `400`/`404`/`405`/`500` with a plain-text message
//!
//! # Example
//!
//! ```
//! use nanorpc_common::{Codec, HttpWire};
//!
//! let codec = Codec::new();
//! let body = codec.encode("reddec").unwrap();
//! assert_eq!(body, br#""reddec""#);
//!
//! let url = HttpWire::endpoint_url("http://127.0.0.1:8080", "hello");
//! assert_eq!(url, "http://127.0.0.1:8080/hello");
//! ```

pub mod codec;
pub mod context;
pub mod error;
pub mod http;

pub use codec::{Codec, JsonCodec};
pub use context::CallContext;
pub use error::{
    CodecError, ContextError, DispatchError, InvokeError, RegistrationError, ServeError,
    TransportError,
};
pub use http::{HttpWire, HyperResponse, TEXT_PLAIN};
