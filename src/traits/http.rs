// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::Serialize;

/// Wraps every route of a router, e.g. request logging.
pub trait HttpMiddleware: Send + Sync {
    fn wrap(&self, router: axum::Router) -> axum::Router;
}

/// Serves everything below `path` of the router that mounts it.
pub trait HttpHandler: Send + Sync {
    fn path(&self) -> String;

    /// Paths seen by the service are relative to `path`. `None` until applied.
    fn service(&self) -> Option<axum::Router>;

    fn spec(&self) -> Option<HandlerSpec> {
        None
    }
}

/// A composed set of routes a listener can host.
pub trait HttpRouter: Send + Sync {
    fn service(&self) -> Option<axum::Router>;
}

/// A listener with a bound address.
pub trait HttpServer: Send + Sync {
    fn endpoint(&self) -> Option<String>;
}

/// Documentation for one mounted handler.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HandlerSpec {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub summary: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
}
