//! HTTP adapter for the dispatcher
//!
//! Maps one HTTP request onto one dispatched call.
//!
//! # Status Codes
//!
//! | outcome                          | status |
//! |----------------------------------|--------|
//! | success                          | 200    |
//! | method other than `POST`         | 405    |
//! | unknown endpoint                 | 404    |
//! | body read failed / bad argument  | 400    |
//! | callable error / encoding failed | 500    |
//!
//! The endpoint is looked up before the body is read, so an unknown name is
//! reported as 404 without consuming the request. Callables run on tokio's
//! blocking pool; a panicking callable is reported as 500.

use std::fmt::Display;

use axum::Router;
use http_body_util::BodyExt;
use hyper::body::Body;
use hyper::{Method, Request, StatusCode};
use nanorpc_common::{DispatchError, HttpWire, HyperResponse};

use crate::dispatcher::Dispatcher;

/// Body of a 405 response.
pub const ONLY_POST_ALLOWED: &str = "only POST allowed";

/// Body of a 400 response when the request body could not be read.
pub const INTERRUPTED: &str = "interrupted";

/// Routes HTTP requests to a [`Dispatcher`].
#[derive(Debug, Clone)]
pub struct HttpRouter {
    dispatcher: Dispatcher,
}

impl HttpRouter {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self { dispatcher }
    }

    /// Handle one request. Never fails; every failure becomes a response.
    pub async fn handle<B>(&self, req: Request<B>) -> HyperResponse
    where
        B: Body + Send,
        B::Data: Send,
        B::Error: Display,
    {
        if req.method() != Method::POST {
            return HttpWire::error_response(StatusCode::METHOD_NOT_ALLOWED, ONLY_POST_ALLOWED);
        }

        let name = HttpWire::endpoint_name(req.uri().path()).to_string();
        let Some(descriptor) = self.dispatcher.table().lookup(&name) else {
            let err = DispatchError::NotFound(name);
            return HttpWire::error_response(err.status(), err.to_string());
        };

        let body = match req.into_body().collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(e) => {
                tracing::warn!(endpoint = %name, "failed to read request body: {}", e);
                return HttpWire::error_response(StatusCode::BAD_REQUEST, INTERRUPTED);
            }
        };

        let dispatcher = self.dispatcher.clone();
        let outcome =
            tokio::task::spawn_blocking(move || dispatcher.invoke(&descriptor, &body)).await;

        match outcome {
            Ok(Ok(encoded)) => {
                HttpWire::success_response(encoded, self.dispatcher.codec().content_type())
            }
            Ok(Err(err)) => HttpWire::error_response(err.status(), err.to_string()),
            Err(join_err) => {
                tracing::error!(endpoint = %name, "endpoint task failed: {}", join_err);
                HttpWire::error_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("method {} panicked", name),
                )
            }
        }
    }

    /// Mount the adapter as the fallback of an axum router.
    ///
    /// Every path reaches the adapter, so the endpoint name is still the
    /// final path segment and non-`POST` methods still get 405.
    pub fn into_axum(self) -> Router {
        Router::new().fallback(move |req: axum::extract::Request| {
            let router = self.clone();
            async move { router.handle(req).await }
        })
    }
}
