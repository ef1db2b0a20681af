// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Request logging middleware.
//!
//! Wrapped routers read the logger's settings on every request, so
//! re-applying a logger takes effect without re-applying the routers that
//! use it.

use async_trait::async_trait;
use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::errors::Result;
use crate::instance::{Context, InstanceCore, Plan, ValidatedConfig};
use crate::observability::messages::http::RequestServed;
use crate::observability::messages::StructuredLog;
use crate::schema::{Attribute, Configuration, SchemaBuilder};
use crate::state::State;
use crate::traits::{HttpMiddleware, InstanceRef, Resolver, Resource, ResourceInstance};

#[derive(Debug, Clone, Default)]
pub struct LoggerConfig {
    pub tag: String,
    pub slow: Duration,
}

impl Configuration for LoggerConfig {
    fn describe(schema: &mut SchemaBuilder<Self>) {
        schema
            .field("tag", |c| &c.tag, |c| &mut c.tag)
            .default("http")
            .help("Label attached to every request event");
        schema
            .field("slow", |c| &c.slow, |c| &mut c.slow)
            .default("1s")
            .help("Requests taking at least this long are logged as warnings; 0s disables");
    }
}

pub struct LoggerResource;

impl Resource for LoggerResource {
    fn name(&self) -> &str {
        "logger"
    }

    fn schema(&self) -> Vec<Attribute> {
        LoggerConfig::schema().attributes()
    }

    fn new_instance(self: Arc<Self>, name: &str) -> InstanceRef {
        Arc::new(LoggerInstance {
            core: InstanceCore::new(name, self),
            settings: Arc::new(RwLock::new(LoggerConfig::default())),
        })
    }
}

pub struct LoggerInstance {
    core: InstanceCore<LoggerConfig>,
    settings: Arc<RwLock<LoggerConfig>>,
}

#[async_trait]
impl ResourceInstance for LoggerInstance {
    fn name(&self) -> &str {
        self.core.name()
    }

    fn resource(&self) -> Arc<dyn Resource> {
        self.core.resource()
    }

    async fn validate(
        &self,
        _ctx: &Context,
        state: &State,
        resolver: Option<&dyn Resolver>,
    ) -> Result<ValidatedConfig> {
        self.core.validate(state, resolver)
    }

    async fn plan(&self, _ctx: &Context, config: &ValidatedConfig) -> Result<Plan> {
        self.core.plan(config)
    }

    async fn apply(&self, _ctx: &Context, config: ValidatedConfig) -> Result<()> {
        let config = self.core.unseal(config)?;
        *self.settings.write() = config.clone();
        self.core.commit(config);
        Ok(())
    }

    async fn read(&self, _ctx: &Context) -> Result<State> {
        Ok(self.core.read())
    }

    async fn destroy(&self, _ctx: &Context) -> Result<()> {
        if self.core.clear().is_some() {
            *self.settings.write() = LoggerConfig::default();
        }
        Ok(())
    }

    fn references(&self) -> Vec<String> {
        self.core.references()
    }

    fn as_middleware(&self) -> Option<&dyn HttpMiddleware> {
        Some(self)
    }
}

impl HttpMiddleware for LoggerInstance {
    fn wrap(&self, router: axum::Router) -> axum::Router {
        router.layer(axum::middleware::from_fn_with_state(
            Arc::clone(&self.settings),
            log_request,
        ))
    }
}

async fn log_request(
    axum::extract::State(settings): axum::extract::State<Arc<RwLock<LoggerConfig>>>,
    req: Request,
    next: Next,
) -> Response {
    let method = req.method().to_string();
    let path = req.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(req).await;

    let elapsed = started.elapsed();
    let (tag, slow) = {
        let settings = settings.read();
        (settings.tag.clone(), settings.slow)
    };
    RequestServed {
        tag: &tag,
        method: &method,
        path: &path,
        status: response.status().as_u16(),
        elapsed,
        slow: !slow.is_zero() && elapsed >= slow,
    }
    .log();

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::routing::get;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_defaults_and_wrapping() {
        let instance = Arc::new(LoggerResource).new_instance("logger-main");
        let ctx = Context::default();

        let config = instance.validate(&ctx, &State::new(), None).await.unwrap();
        instance.apply(&ctx, config).await.unwrap();

        let state = instance.read(&ctx).await.unwrap();
        assert_eq!(state.get("tag"), Some(&serde_json::json!("http")));
        assert_eq!(state.get("slow"), Some(&serde_json::json!("1s")));

        let routes = axum::Router::new().route("/ping", get(|| async { "pong" }));
        let wrapped = instance.as_middleware().unwrap().wrap(routes);
        let response = wrapped
            .oneshot(Request::builder().uri("/ping").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_rejects_malformed_duration() {
        let instance = Arc::new(LoggerResource).new_instance("logger-main");
        let ctx = Context::default();

        let result = instance
            .validate(&ctx, &State::new().with("slow", "soon"), None)
            .await;

        assert!(result.is_err());
    }
}
