//! HTTP Wire Utilities
//!
//! Helpers shared by the server adapter and the client transport for the
//! `POST <base>/<endpoint>` protocol.
//!
//! # Components
//!
//! - **[`HttpWire`]**: request/response construction and endpoint addressing
//! - **[`HyperResponse`]**: Type alias for Hyper responses with a full body

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{HeaderValue, CONTENT_LENGTH, CONTENT_TYPE};
use hyper::{Method, Request, Response, StatusCode, Uri};

use crate::error::TransportError;

/// Type alias for Hyper responses with full body
pub type HyperResponse = Response<Full<Bytes>>;

/// Content type of plain-text error bodies.
pub const TEXT_PLAIN: &str = "text/plain; charset=utf-8";

/// HTTP wire utility functions
pub struct HttpWire;

impl HttpWire {
    /// `200 OK` carrying an encoded result.
    ///
    /// `Content-Length` is always the exact body length.
    pub fn success_response(body: Vec<u8>, content_type: &'static str) -> HyperResponse {
        Self::response(StatusCode::OK, Bytes::from(body), content_type)
    }

    /// Error response with a human-readable plain-text body.
    ///
    /// # Example
    ///
    /// ```
    /// use hyper::StatusCode;
    /// use nanorpc_common::HttpWire;
    ///
    /// let response = HttpWire::error_response(StatusCode::METHOD_NOT_ALLOWED, "only POST allowed");
    /// assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    /// ```
    pub fn error_response(status: StatusCode, message: impl Into<String>) -> HyperResponse {
        Self::response(status, Bytes::from(message.into()), TEXT_PLAIN)
    }

    fn response(status: StatusCode, body: Bytes, content_type: &'static str) -> HyperResponse {
        let length = body.len();
        let mut response = Response::new(Full::new(body));
        *response.status_mut() = status;
        let headers = response.headers_mut();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
        headers.insert(CONTENT_LENGTH, HeaderValue::from(length));
        response
    }

    /// Build the `POST` request for one exchange.
    pub fn build_request(
        url: &str,
        body: Bytes,
        content_type: &'static str,
    ) -> Result<Request<Full<Bytes>>, TransportError> {
        let uri = Self::parse_url(url)?;

        let mut request = Request::new(Full::new(body));
        *request.method_mut() = Method::POST;
        *request.uri_mut() = uri;
        request
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
        Ok(request)
    }

    /// Parse an endpoint URL. Only plain `http://` is supported; TLS
    /// endpoints need a proxy in front of them.
    pub fn parse_url(url: &str) -> Result<Uri, TransportError> {
        let uri = url.parse::<Uri>().map_err(|e| TransportError::InvalidUri {
            uri: url.to_string(),
            reason: e.to_string(),
        })?;
        if uri.scheme_str() != Some("http") {
            return Err(TransportError::InvalidUri {
                uri: url.to_string(),
                reason: "only http:// URLs are supported".to_string(),
            });
        }
        Ok(uri)
    }

    /// Join a base URL and an endpoint name with exactly one `/`.
    pub fn endpoint_url(base_url: &str, endpoint: &str) -> String {
        format!("{}/{}", base_url.trim_end_matches('/'), endpoint)
    }

    /// Final segment of a request path; a trailing `/` is ignored.
    ///
    /// ```
    /// use nanorpc_common::HttpWire;
    ///
    /// assert_eq!(HttpWire::endpoint_name("/api/v1/hello"), "hello");
    /// assert_eq!(HttpWire::endpoint_name("/hello/"), "hello");
    /// ```
    pub fn endpoint_name(path: &str) -> &str {
        path.trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or_default()
    }
}
