// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Built-in managed objects.
//!
//! Each backend pairs a stateless [`Resource`] descriptor with an instance
//! type built on [`InstanceCore`](crate::instance::InstanceCore) that adds
//! the side effects. Together they compose a live HTTP stack:
//!
//! ```text
//! server ──► router ──► handlers (static, api)
//!               └─────► middleware (logger)
//! ```
//!
//! # Available Backends
//!
//! - **router**: composes handlers and middleware into one axum router,
//!   optionally serving an OpenAPI document listing the mounted paths
//! - **server**: binds a listener and serves a router in the background
//! - **logger**: request logging middleware
//! - **static**: serves a directory with tower-http's `ServeDir`
//! - **stub** (test builds only): journals every lifecycle call
//!
//! Instances never hold one another except through reference fields in
//! their configuration; anything else is looked up by name at use time.

use axum::extract::Request;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::ServiceExt;

use crate::engine::Manager;
use crate::errors::Result;
use crate::traits::Resource;

pub mod logger;
pub mod router;
pub mod server;
pub mod static_files;
#[cfg(test)]
pub mod stub;

pub use logger::LoggerResource;
pub use router::RouterResource;
pub use server::ServerResource;
pub use static_files::StaticResource;

/// Registers router, server, logger and static with `manager`.
pub fn register_builtin(manager: &Manager) -> Result<()> {
    let builtin: [Arc<dyn Resource>; 4] = [
        Arc::new(RouterResource),
        Arc::new(ServerResource),
        Arc::new(LoggerResource),
        Arc::new(StaticResource),
    ];
    for resource in builtin {
        manager.register_resource(resource)?;
    }
    Ok(())
}

/// Runs `req` through `service`, or answers 503 while there is none.
pub(crate) async fn forward(service: Option<axum::Router>, req: Request) -> Response {
    match service {
        Some(router) => match router.oneshot(req).await {
            Ok(response) => response,
            Err(never) => match never {},
        },
        None => StatusCode::SERVICE_UNAVAILABLE.into_response(),
    }
}

type Lookup = Arc<dyn Fn() -> Option<axum::Router> + Send + Sync>;

/// A tower service that looks up its target router on every request, so a
/// re-applied target is picked up without rebuilding whoever mounts it.
#[derive(Clone)]
pub(crate) struct Dispatch(Lookup);

impl Dispatch {
    pub fn new(lookup: impl Fn() -> Option<axum::Router> + Send + Sync + 'static) -> Self {
        Self(Arc::new(lookup))
    }
}

impl tower::Service<Request> for Dispatch {
    type Response = Response;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = std::result::Result<Response, Infallible>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<std::result::Result<(), Infallible>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request) -> Self::Future {
        let service = (self.0)();
        Box::pin(async move { Ok(forward(service, req).await) })
    }
}

/// `base` and `path` joined with exactly one slash between them.
pub(crate) fn join_path(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    match (base.is_empty(), path.is_empty()) {
        (true, true) => "/".to_string(),
        (true, false) => format!("/{}", path),
        (false, true) => base.to_string(),
        (false, false) => format!("{}/{}", base, path),
    }
}

/// Why `path` cannot be used as a mount path, if it cannot. Mount paths
/// are literal: no `:name`/`*rest` segments and no `{}` captures.
pub(crate) fn mount_path_problem(path: &str) -> Option<String> {
    if !path.starts_with('/') {
        return Some("must start with \"/\"".to_string());
    }
    if path.contains('{') || path.contains('}') {
        return Some("must not contain \"{\" or \"}\"".to_string());
    }
    path.split('/')
        .find(|segment| segment.starts_with(':') || segment.starts_with('*'))
        .map(|segment| format!("segment \"{}\" must not start with \":\" or \"*\"", segment))
}
