use std::sync::Arc;
use std::time::Duration;

use hyper::body::Bytes;
use hyper::StatusCode;
use nanorpc_common::{CallContext, Codec, HttpWire, InvokeError, TransportError};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::retry::RetryPolicy;
use crate::transport::{HttpTransport, Transport, TransportRequest};

/// Timeout applied by [`Client::invoke`].
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL endpoints are appended to, e.g. `http://127.0.0.1:8080`.
    pub base_url: String,
    pub retry: RetryPolicy,
    /// Deadline used by [`Client::invoke`].
    ///
    /// Default: 30 seconds
    pub default_timeout: Duration,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            retry: RetryPolicy::default(),
            default_timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }
}

/// Invokes endpoints of one nanorpc server.
///
/// Every call encodes its argument, performs the exchange through the
/// [`Transport`], classifies the outcome and retries retryable failures
/// under the configured [`RetryPolicy`] until the call's [`CallContext`] is
/// done. Clones share configuration and connection pool.
///
/// Only plain `http://` base URLs are supported. An `https://` or otherwise
/// unparsable base URL fails every call before any exchange.
///
/// # Example
///
/// ```no_run
/// use nanorpc_client::Client;
///
/// #[tokio::main]
/// async fn main() {
///     let client = Client::new("http://127.0.0.1:8080");
///     let greeting: String = client.invoke("hello", "reddec").await.unwrap();
///     assert_eq!(greeting, "hello reddec");
/// }
/// ```
#[derive(Debug)]
pub struct Client<T = HttpTransport> {
    config: Arc<ClientConfig>,
    transport: Arc<T>,
    codec: Codec,
}

impl<T> Clone for Client<T> {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            transport: self.transport.clone(),
            codec: self.codec,
        }
    }
}

impl Client<HttpTransport> {
    /// Client for `base_url` with a single attempt per call.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_config(ClientConfig::new(base_url))
    }

    pub fn with_config(config: ClientConfig) -> Self {
        Self::with_transport(config, HttpTransport::new())
    }
}

impl<T: Transport> Client<T> {
    pub fn with_transport(config: ClientConfig, transport: T) -> Self {
        Self {
            config: Arc::new(config),
            transport: Arc::new(transport),
            codec: Codec::new(),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Invoke `endpoint` with the default timeout.
    pub async fn invoke<A, R>(&self, endpoint: &str, argument: &A) -> Result<R, InvokeError>
    where
        A: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        self.invoke_timeout(self.config.default_timeout, endpoint, argument)
            .await
    }

    /// Invoke `endpoint`, giving up once `timeout` has elapsed.
    pub async fn invoke_timeout<A, R>(
        &self,
        timeout: Duration,
        endpoint: &str,
        argument: &A,
    ) -> Result<R, InvokeError>
    where
        A: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let ctx = CallContext::background().with_timeout(timeout);
        self.invoke_with_context(&ctx, endpoint, argument).await
    }

    /// Invoke `endpoint` and write the decoded result into `out`.
    ///
    /// `out` is left untouched when the call fails.
    pub async fn invoke_into<A, R>(
        &self,
        ctx: &CallContext,
        endpoint: &str,
        argument: &A,
        out: &mut R,
    ) -> Result<(), InvokeError>
    where
        A: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        *out = self.invoke_with_context(ctx, endpoint, argument).await?;
        Ok(())
    }

    /// Invoke `endpoint` until it succeeds, fails terminally, runs out of
    /// retries or `ctx` is done.
    ///
    /// # Errors
    ///
    /// - [`InvokeError::Encode`]: the argument did not encode; nothing was sent
    /// - [`InvokeError::Transport`] with [`TransportError::InvalidUri`]: the
    ///   endpoint URL is malformed or not `http://`; nothing was sent
    /// - [`InvokeError::Transport`]: the last exchange failed and the retry
    ///   budget is spent
    /// - [`InvokeError::Remote`]: the server answered with a non-success status
    /// - [`InvokeError::Decode`]: the success body did not decode; never retried
    /// - [`InvokeError::Cancelled`] / [`InvokeError::DeadlineExceeded`]: `ctx`
    ///   finished first
    pub async fn invoke_with_context<A, R>(
        &self,
        ctx: &CallContext,
        endpoint: &str,
        argument: &A,
    ) -> Result<R, InvokeError>
    where
        A: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let body = self.codec.encode(argument).map_err(InvokeError::Encode)?;
        let url = HttpWire::endpoint_url(&self.config.base_url, endpoint);
        HttpWire::parse_url(&url)?;
        let request = TransportRequest {
            url,
            content_type: self.codec.content_type(),
            body: Bytes::from(body),
            context: ctx.clone(),
        };

        let policy = &self.config.retry;
        let mut retries: u32 = 0;

        loop {
            let err = match self.attempt(&request).await {
                Ok(result) => return Ok(result),
                Err(err) => err,
            };

            if !policy.should_retry(&err) || !policy.allows_retry(retries) {
                return Err(err);
            }
            retries = retries.saturating_add(1);

            tracing::warn!(
                "call to {} failed (retry {}): {}, retrying in {:?}",
                request.url,
                retries,
                err,
                policy.retry_delay
            );

            tokio::select! {
                biased;
                reason = ctx.done() => return Err(reason.into()),
                _ = tokio::time::sleep(policy.retry_delay) => {}
            }
        }
    }

    async fn attempt<R: DeserializeOwned>(
        &self,
        request: &TransportRequest,
    ) -> Result<R, InvokeError> {
        let response = match self.transport.exchange(request).await {
            Ok(response) => response,
            Err(TransportError::Cancelled(reason)) => return Err(reason.into()),
            Err(e) => return Err(InvokeError::Transport(e)),
        };

        if response.status != StatusCode::OK.as_u16() {
            return Err(InvokeError::Remote {
                status: response.status,
                message: String::from_utf8_lossy(&response.body).trim_end().to_string(),
            });
        }

        self.codec
            .decode(&response.body)
            .map_err(InvokeError::Decode)
    }
}
