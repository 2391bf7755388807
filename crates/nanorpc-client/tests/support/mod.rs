//! Shared fixtures for client integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::convert::Infallible;
use std::sync::{Arc, Mutex};

use http_body_util::{BodyExt, Full};
use hyper::body::{Bytes, Incoming};
use hyper::header::CONTENT_TYPE;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response};
use hyper_util::rt::TokioIo;
use nanorpc_client::{Transport, TransportRequest, TransportResponse};
use nanorpc_common::TransportError;
use tokio::net::TcpListener;

// ============================================================================
// Scripted transport
// ============================================================================

/// One scripted exchange outcome.
#[derive(Debug, Clone)]
pub enum Step {
    /// Fail before any response, like a refused connection.
    Fail(&'static str),
    /// Respond with a status and body.
    Respond(u16, &'static str),
    /// Never respond; only the call's context ends the exchange.
    Hang,
}

#[derive(Default)]
struct Script {
    steps: VecDeque<Step>,
    exchanges: usize,
    urls: Vec<String>,
    bodies: Vec<Bytes>,
}

/// Transport that plays back a fixed script and counts exchanges.
///
/// Clones share the script, so a test can keep one to inspect after the
/// client has consumed the other.
#[derive(Clone, Default)]
pub struct ScriptedTransport {
    script: Arc<Mutex<Script>>,
}

impl ScriptedTransport {
    pub fn new(steps: impl IntoIterator<Item = Step>) -> Self {
        let script = Script {
            steps: steps.into_iter().collect(),
            ..Script::default()
        };
        Self {
            script: Arc::new(Mutex::new(script)),
        }
    }

    pub fn exchanges(&self) -> usize {
        self.script.lock().unwrap().exchanges
    }

    pub fn urls(&self) -> Vec<String> {
        self.script.lock().unwrap().urls.clone()
    }

    pub fn bodies(&self) -> Vec<Bytes> {
        self.script.lock().unwrap().bodies.clone()
    }
}

impl Transport for ScriptedTransport {
    async fn exchange(
        &self,
        request: &TransportRequest,
    ) -> Result<TransportResponse, TransportError> {
        let step = {
            let mut script = self.script.lock().unwrap();
            script.exchanges += 1;
            script.urls.push(request.url.clone());
            script.bodies.push(request.body.clone());
            script
                .steps
                .pop_front()
                .unwrap_or(Step::Fail("script exhausted"))
        };

        match step {
            Step::Fail(reason) => Err(TransportError::Connect(reason.to_string())),
            Step::Respond(status, body) => Ok(TransportResponse {
                status,
                body: Bytes::from_static(body.as_bytes()),
            }),
            Step::Hang => Err(TransportError::Cancelled(request.context.done().await)),
        }
    }
}

// ============================================================================
// Test HTTP server
// ============================================================================

/// What the test server saw for one request.
#[derive(Debug, Clone)]
pub struct SeenRequest {
    pub method: String,
    pub path: String,
    pub content_type: Option<String>,
    pub body: Bytes,
}

type Handler = Arc<dyn Fn(&str, &[u8]) -> (u16, String) + Send + Sync>;

/// Plain hyper server answering from a handler closure.
pub struct TestHttpServer {
    pub addr: String,
    seen: Arc<Mutex<Vec<SeenRequest>>>,
    shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl TestHttpServer {
    /// Starts a new test server on a random port.
    ///
    /// The handler receives the request path and body and returns the
    /// status and body to send.
    pub async fn start<F>(handler: F) -> Self
    where
        F: Fn(&str, &[u8]) -> (u16, String) + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let handler: Handler = Arc::new(handler);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let (shutdown_tx, mut shutdown_rx) = tokio::sync::oneshot::channel();

        let recorder = seen.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    result = listener.accept() => {
                        let Ok((stream, _)) = result else { continue };
                        let io = TokioIo::new(stream);
                        let handler = handler.clone();
                        let recorder = recorder.clone();

                        tokio::spawn(async move {
                            let service = service_fn(move |req: Request<Incoming>| {
                                let handler = handler.clone();
                                let recorder = recorder.clone();
                                async move {
                                    let method = req.method().to_string();
                                    let path = req.uri().path().to_string();
                                    let content_type = req
                                        .headers()
                                        .get(CONTENT_TYPE)
                                        .and_then(|v| v.to_str().ok())
                                        .map(str::to_string);
                                    let body = req.into_body().collect().await.unwrap().to_bytes();

                                    let (status, reply) = handler(&path, &body);
                                    recorder.lock().unwrap().push(SeenRequest {
                                        method,
                                        path,
                                        content_type,
                                        body,
                                    });

                                    let response = Response::builder()
                                        .status(status)
                                        .body(Full::new(Bytes::from(reply)))
                                        .unwrap();
                                    Ok::<_, Infallible>(response)
                                }
                            });

                            let _ = http1::Builder::new().serve_connection(io, service).await;
                        });
                    }
                    _ = &mut shutdown_rx => break,
                }
            }
        });

        Self {
            addr,
            seen,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn seen(&self) -> Vec<SeenRequest> {
        self.seen.lock().unwrap().clone()
    }
}

impl Drop for TestHttpServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}
