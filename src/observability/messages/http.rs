// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for managed listeners and request logging.

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use std::time::Duration;
use tracing::Span;

/// A server bound its listener and started serving.
///
/// # Log Level
/// `info!`
///
/// # Example
/// ```
/// use the_rigging::observability::messages::http::ServerListening;
///
/// let msg = ServerListening {
///     instance: "server-main",
///     endpoint: "http://127.0.0.1:8080",
/// };
///
/// assert_eq!(msg.to_string(), "Server 'server-main' listening on http://127.0.0.1:8080");
/// ```
pub struct ServerListening<'a> {
    pub instance: &'a str,
    pub endpoint: &'a str,
}

impl Display for ServerListening<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Server '{}' listening on {}", self.instance, self.endpoint)
    }
}

impl StructuredLog for ServerListening<'_> {
    fn log(&self) {
        tracing::info!(instance = self.instance, endpoint = self.endpoint, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "server",
            span_name = name,
            instance = self.instance,
            endpoint = self.endpoint,
        )
    }
}

/// A server stopped serving.
///
/// # Log Level
/// `info!`
pub struct ServerStopped<'a> {
    pub instance: &'a str,
    pub endpoint: &'a str,
}

impl Display for ServerStopped<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Server '{}' on {} stopped", self.instance, self.endpoint)
    }
}

impl StructuredLog for ServerStopped<'_> {
    fn log(&self) {
        tracing::info!(instance = self.instance, endpoint = self.endpoint, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("server", span_name = name, instance = self.instance)
    }
}

/// The serve loop returned an error, or shutdown overran its grace period.
///
/// # Log Level
/// `warn!`
pub struct ServerShutdownProblem<'a> {
    pub instance: &'a str,
    pub detail: &'a str,
}

impl Display for ServerShutdownProblem<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Server '{}' did not stop cleanly: {}", self.instance, self.detail)
    }
}

impl StructuredLog for ServerShutdownProblem<'_> {
    fn log(&self) {
        tracing::warn!(instance = self.instance, detail = self.detail, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!("server", span_name = name, instance = self.instance)
    }
}

/// One request passed through a logger middleware.
///
/// # Log Level
/// `info!`, or `warn!` when `slow`
pub struct RequestServed<'a> {
    pub tag: &'a str,
    pub method: &'a str,
    pub path: &'a str,
    pub status: u16,
    pub elapsed: Duration,
    pub slow: bool,
}

impl Display for RequestServed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "[{}] {} {} -> {} in {:?}",
            self.tag, self.method, self.path, self.status, self.elapsed
        )
    }
}

impl StructuredLog for RequestServed<'_> {
    fn log(&self) {
        let elapsed_ms = self.elapsed.as_millis() as u64;
        if self.slow {
            tracing::warn!(
                tag = self.tag,
                method = self.method,
                path = self.path,
                status = self.status,
                elapsed_ms,
                "{}", self
            );
        } else {
            tracing::info!(
                tag = self.tag,
                method = self.method,
                path = self.path,
                status = self.status,
                elapsed_ms,
                "{}", self
            );
        }
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "request",
            span_name = name,
            method = self.method,
            path = self.path,
        )
    }
}
