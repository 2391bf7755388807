//! Single request/response exchanges.
//!
//! The [`Transport`] trait is the seam between the invocation pipeline and
//! the network. [`HttpTransport`] is the production implementation; tests
//! substitute scripted ones.

use std::error::Error as StdError;
use std::future::Future;

use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper::StatusCode;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client as LegacyClient;
use hyper_util::rt::TokioExecutor;
use nanorpc_common::{CallContext, HttpWire, TransportError};

/// Everything one exchange needs.
#[derive(Debug, Clone)]
pub struct TransportRequest {
    /// Full endpoint URL, `<base>/<endpoint>`.
    pub url: String,
    pub content_type: &'static str,
    /// Encoded argument.
    pub body: Bytes,
    /// Aborts the exchange when done.
    pub context: CallContext,
}

/// Status and body of a completed exchange, whatever the status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: Bytes,
}

/// Performs one request/response exchange.
///
/// Implementations return `Ok` for any response the server produced,
/// including error statuses, and `Err` only when no complete response was
/// obtained. An exchange interrupted by its context must fail with
/// [`TransportError::Cancelled`].
pub trait Transport: Send + Sync + 'static {
    fn exchange(
        &self,
        request: &TransportRequest,
    ) -> impl Future<Output = Result<TransportResponse, TransportError>> + Send;
}

/// HTTP/1.1 transport over hyper's pooled client.
#[derive(Clone)]
pub struct HttpTransport {
    client: LegacyClient<HttpConnector, Full<Bytes>>,
}

impl HttpTransport {
    pub fn new() -> Self {
        let client = LegacyClient::builder(TokioExecutor::new()).build_http();
        Self { client }
    }

    async fn send(&self, request: &TransportRequest) -> Result<TransportResponse, TransportError> {
        let http_request =
            HttpWire::build_request(&request.url, request.body.clone(), request.content_type)?;

        let response = self.client.request(http_request).await.map_err(|e| {
            if e.is_connect() {
                TransportError::Connect(error_chain(&e))
            } else {
                TransportError::Request(error_chain(&e))
            }
        })?;

        let status = response.status();
        let body = match response.into_body().collect().await {
            Ok(collected) => collected.to_bytes(),
            // an error status stands without its message
            Err(e) if status != StatusCode::OK => {
                tracing::debug!(
                    url = %request.url,
                    %status,
                    "dropping unreadable error body: {}",
                    e
                );
                Bytes::new()
            }
            Err(e) => return Err(TransportError::Body(error_chain(&e))),
        };

        Ok(TransportResponse {
            status: status.as_u16(),
            body,
        })
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport").finish_non_exhaustive()
    }
}

impl Transport for HttpTransport {
    async fn exchange(
        &self,
        request: &TransportRequest,
    ) -> Result<TransportResponse, TransportError> {
        tokio::select! {
            biased;
            reason = request.context.done() => Err(TransportError::Cancelled(reason)),
            result = self.send(request) => {
                if let Ok(response) = &result {
                    tracing::trace!(
                        url = %request.url,
                        status = response.status,
                        bytes = response.body.len(),
                        "exchange complete"
                    );
                }
                result
            }
        }
    }
}

/// Render an error and its sources, since hyper's top-level messages are
/// terse ("client error (Connect)").
fn error_chain(err: &(dyn StdError + 'static)) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
