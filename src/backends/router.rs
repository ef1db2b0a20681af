// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Composes handlers and middleware into one routable service.
//!
//! Handlers are mounted under `prefix` at their own `path`; a handler at `/`
//! becomes the fallback. Middleware wraps every route, the first listed
//! outermost. Mounted handlers are looked up on every request, so a handler
//! that is re-applied keeps serving through the same router.
//!
//! The router never references the servers hosting it. It learns their
//! bound endpoints when they notify it after their own Apply, and reports
//! them, joined with `prefix`, as the read-only `endpoints` attribute.

use async_trait::async_trait;
use axum::http::HeaderValue;
use axum::routing::get;
use axum::Json;
use parking_lot::RwLock;
use serde_json::{json, Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::backends::{join_path, mount_path_problem, Dispatch};
use crate::config::consts::OPENAPI_PATH;
use crate::errors::{ConfigError, ReferenceError, Result};
use crate::instance::{Context, InstanceCore, Plan, ValidatedConfig};
use crate::schema::{Attribute, Configuration, SchemaBuilder};
use crate::state::State;
use crate::traits::{HandlerSpec, HttpRouter, InstanceRef, Resolver, Resource, ResourceInstance};

#[derive(Clone, Default)]
pub struct RouterConfig {
    pub prefix: String,
    pub origin: String,
    pub title: String,
    pub version: String,
    pub openapi: bool,
    pub middleware: Vec<InstanceRef>,
    pub handlers: Vec<InstanceRef>,
    pub endpoints: Vec<String>,
}

impl Configuration for RouterConfig {
    fn describe(schema: &mut SchemaBuilder<Self>) {
        schema
            .field("prefix", |c| &c.prefix, |c| &mut c.prefix)
            .default("/")
            .help("Path every handler is mounted under");
        schema
            .field("origin", |c| &c.origin, |c| &mut c.origin)
            .help("Allowed CORS origin, or * for any; empty disables CORS");
        schema.field("title", |c| &c.title, |c| &mut c.title).required();
        schema.field("version", |c| &c.version, |c| &mut c.version).required();
        schema
            .field("openapi", |c| &c.openapi, |c| &mut c.openapi)
            .default("true")
            .help("Serve an OpenAPI document of the mounted paths");
        schema
            .references("middleware", |c| &c.middleware, |c| &mut c.middleware)
            .help("Middleware wrapping every route, outermost first");
        schema.references("handlers", |c| &c.handlers, |c| &mut c.handlers);
        schema
            .field("endpoints", |c| &c.endpoints, |c| &mut c.endpoints)
            .read_only()
            .help("URLs this router is reachable on");
    }
}

pub struct RouterResource;

impl Resource for RouterResource {
    fn name(&self) -> &str {
        "router"
    }

    fn schema(&self) -> Vec<Attribute> {
        RouterConfig::schema().attributes()
    }

    fn new_instance(self: Arc<Self>, name: &str) -> InstanceRef {
        Arc::new(RouterInstance {
            core: InstanceCore::new(name, self),
            service: RwLock::new(None),
            endpoints: Arc::new(RwLock::new(BTreeMap::new())),
        })
    }
}

pub struct RouterInstance {
    core: InstanceCore<RouterConfig>,
    service: RwLock<Option<axum::Router>>,
    /// Hosting server name to its bound endpoint.
    endpoints: Arc<RwLock<BTreeMap<String, String>>>,
}

impl RouterInstance {
    fn compose(&self, config: &RouterConfig) -> Result<axum::Router> {
        let mut routes = axum::Router::new();
        let mut paths = BTreeMap::new();

        for (path, handler) in mounts(config)? {
            let spec = handler.as_handler().and_then(|h| h.spec()).unwrap_or_default();
            let target = Arc::clone(&handler);
            let service = Dispatch::new(move || target.as_handler().and_then(|h| h.service()));
            routes = if path == "/" {
                routes.fallback_service(service)
            } else {
                routes.nest_service(&path, service)
            };
            paths.insert(path, spec);
        }

        if config.openapi {
            let document = Document {
                title: config.title.clone(),
                version: config.version.clone(),
                prefix: config.prefix.clone(),
                paths,
                endpoints: Arc::clone(&self.endpoints),
            };
            routes = routes.route(
                OPENAPI_PATH,
                get(move || {
                    let document = document.clone();
                    async move { Json(document.render()) }
                }),
            );
        }

        for middleware in config.middleware.iter().rev() {
            if let Some(middleware) = middleware.as_middleware() {
                routes = middleware.wrap(routes);
            }
        }

        if !config.origin.is_empty() {
            routes = routes.layer(cors(&config.origin)?);
        }

        let prefix = config.prefix.trim_end_matches('/');
        Ok(if prefix.is_empty() {
            routes
        } else {
            axum::Router::new().nest(prefix, routes)
        })
    }

    fn urls(&self, prefix: &str) -> Vec<String> {
        let urls: BTreeSet<String> = self
            .endpoints
            .read()
            .values()
            .map(|endpoint| join_path(endpoint, prefix))
            .collect();
        urls.into_iter().collect()
    }
}

/// Mount path of every handler, checked for type and uniqueness.
fn mounts(config: &RouterConfig) -> Result<Vec<(String, InstanceRef)>> {
    let mut seen = BTreeSet::new();
    let mut mounts = Vec::with_capacity(config.handlers.len());

    for handler in &config.handlers {
        let Some(side) = handler.as_handler() else {
            return Err(wrong_type("handlers", "handler", handler).into());
        };
        let raw = side.path();
        if let Some(problem) = mount_path_problem(&raw) {
            return Err(ConfigError::invalid(
                "handlers",
                format!("\"{}\" has path \"{}\", which {}", handler.name(), raw, problem),
            )
            .into());
        }
        let path = match raw.trim_end_matches('/') {
            "" => "/".to_string(),
            trimmed => trimmed.to_string(),
        };
        if config.openapi && path == OPENAPI_PATH {
            return Err(ConfigError::invalid(
                "handlers",
                format!("\"{}\" is reserved for the OpenAPI document", OPENAPI_PATH),
            )
            .into());
        }
        if !seen.insert(path.clone()) {
            return Err(ConfigError::invalid("handlers", format!("duplicate path \"{}\"", path)).into());
        }
        mounts.push((path, Arc::clone(handler)));
    }
    Ok(mounts)
}

fn wrong_type(field: &str, expected: &str, instance: &InstanceRef) -> ReferenceError {
    ReferenceError::WrongType {
        field: field.to_string(),
        expected: expected.to_string(),
        actual: instance.resource().name().to_string(),
    }
}

fn cors(origin: &str) -> Result<CorsLayer> {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origin == "*" {
        return Ok(layer.allow_origin(Any));
    }
    let origin = HeaderValue::from_str(origin)
        .map_err(|e| ConfigError::invalid("origin", e.to_string()))?;
    Ok(layer.allow_origin(origin))
}

#[derive(Clone)]
struct Document {
    title: String,
    version: String,
    prefix: String,
    paths: BTreeMap<String, HandlerSpec>,
    endpoints: Arc<RwLock<BTreeMap<String, String>>>,
}

impl Document {
    fn render(&self) -> Value {
        let servers: BTreeSet<String> = self
            .endpoints
            .read()
            .values()
            .map(|endpoint| join_path(endpoint, &self.prefix))
            .collect();

        let mut paths = Map::new();
        for (path, spec) in &self.paths {
            let mut operation = Map::new();
            if !spec.summary.is_empty() {
                operation.insert("summary".to_string(), json!(spec.summary));
            }
            if !spec.description.is_empty() {
                operation.insert("description".to_string(), json!(spec.description));
            }
            operation.insert("responses".to_string(), json!({ "200": { "description": "OK" } }));
            paths.insert(path.clone(), json!({ "get": operation }));
        }

        json!({
            "openapi": "3.0.3",
            "info": { "title": self.title, "version": self.version },
            "servers": servers.into_iter().map(|url| json!({ "url": url })).collect::<Vec<_>>(),
            "paths": paths,
        })
    }
}

#[async_trait]
impl ResourceInstance for RouterInstance {
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
        let config = self.core.decode(state, resolver)?;
        if let Some(problem) = mount_path_problem(&config.prefix) {
            return Err(ConfigError::invalid("prefix", problem).into());
        }
        if let Some(bad) = config.middleware.iter().find(|m| m.as_middleware().is_none()) {
            return Err(wrong_type("middleware", "middleware", bad).into());
        }
        mounts(&config)?;
        if !config.origin.is_empty() {
            cors(&config.origin)?;
        }
        Ok(self.core.seal(config))
    }

    async fn plan(&self, _ctx: &Context, config: &ValidatedConfig) -> Result<Plan> {
        self.core.plan(config)
    }

    async fn apply(&self, _ctx: &Context, config: ValidatedConfig) -> Result<()> {
        let config = self.core.unseal(config)?;
        let service = self.compose(&config)?;
        *self.service.write() = Some(service);
        self.core.commit(config);
        Ok(())
    }

    async fn read(&self, _ctx: &Context) -> Result<State> {
        let mut state = self.core.read();
        if let Some(config) = self.core.current() {
            state.insert("endpoints", json!(self.urls(&config.prefix)));
        }
        Ok(state)
    }

    async fn destroy(&self, _ctx: &Context) -> Result<()> {
        self.service.write().take();
        self.endpoints.write().clear();
        self.core.clear();
        Ok(())
    }

    fn references(&self) -> Vec<String> {
        self.core.references()
    }

    fn on_dependency_changed(&self, source: &InstanceRef) {
        let Some(server) = source.as_server() else {
            return;
        };
        let hosted = source.references().iter().any(|r| r == self.name());
        let mut endpoints = self.endpoints.write();
        match server.endpoint().filter(|_| hosted) {
            Some(endpoint) => {
                endpoints.insert(source.name().to_string(), endpoint);
            }
            None => {
                endpoints.remove(source.name());
            }
        }
    }

    fn on_dependency_removed(&self, source: &InstanceRef) {
        self.endpoints.write().remove(source.name());
    }

    fn as_router(&self) -> Option<&dyn HttpRouter> {
        Some(self)
    }
}

impl HttpRouter for RouterInstance {
    fn service(&self) -> Option<axum::Router> {
        self.service.read().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::logger::LoggerResource;
    use crate::backends::stub::{stub_instance, StubResource};
    use crate::errors::Error;
    use axum::body::Body;
    use axum::http::Request;
    use axum::http::StatusCode;
    use tower::ServiceExt;

    fn router() -> InstanceRef {
        Arc::new(RouterResource).new_instance("router-main")
    }

    fn resolver_for(instances: Vec<InstanceRef>) -> impl Fn(&str) -> Option<InstanceRef> + Send + Sync {
        move |name: &str| instances.iter().find(|i| i.name() == name).cloned()
    }

    async fn get_body(router: axum::Router, uri: &str) -> (StatusCode, Value) {
        let response = router
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    #[tokio::test]
    async fn test_apply_then_same_config_is_noop() {
        let instance = router();
        let ctx = Context::default();
        let desired = State::new().with("title", "T").with("version", "1.0.0");

        let config = instance.validate(&ctx, &desired, None).await.unwrap();
        let plan = instance.plan(&ctx, &config).await.unwrap();
        assert_eq!(plan.action, crate::instance::Action::Create);
        instance.apply(&ctx, config).await.unwrap();

        let again = instance.validate(&ctx, &desired, None).await.unwrap();
        assert!(instance.plan(&ctx, &again).await.unwrap().is_noop());
    }

    #[tokio::test]
    async fn test_serves_openapi_document_under_prefix() {
        let instance = router();
        let ctx = Context::default();
        let desired = State::new()
            .with("title", "Docs")
            .with("version", "2.1.0")
            .with("prefix", "/v1");

        let config = instance.validate(&ctx, &desired, None).await.unwrap();
        instance.apply(&ctx, config).await.unwrap();
        let service = instance.as_router().unwrap().service().unwrap();

        let (status, document) = get_body(service.clone(), "/v1/openapi.json").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(document["info"]["title"], "Docs");
        assert_eq!(document["info"]["version"], "2.1.0");

        let (status, _) = get_body(service, "/openapi.json").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_required_fields() {
        let instance = router();
        let ctx = Context::default();

        let result = instance.validate(&ctx, &State::new().with("title", "T"), None).await;

        assert!(matches!(result, Err(Error::Config(ConfigError::Missing { ref field })) if field == "version"));
    }

    #[tokio::test]
    async fn test_rejects_non_handler_and_non_middleware() {
        let journal = Default::default();
        let node = StubResource::named("node", &journal);
        let stub = stub_instance(&node, "node-a");
        let logger = Arc::new(LoggerResource).new_instance("logger-main");
        let resolver = resolver_for(vec![stub, logger]);
        let instance = router();
        let ctx = Context::default();
        let base = State::new().with("title", "T").with("version", "1");

        let as_handler = instance
            .validate(&ctx, &base.clone().with("handlers", json!(["node-a"])), Some(&resolver as &dyn Resolver))
            .await;
        assert!(matches!(as_handler, Err(Error::Reference(ReferenceError::WrongType { ref field, .. })) if field == "handlers"));

        let as_middleware = instance
            .validate(&ctx, &base.clone().with("middleware", json!(["node-a"])), Some(&resolver as &dyn Resolver))
            .await;
        assert!(matches!(as_middleware, Err(Error::Reference(ReferenceError::WrongType { ref field, .. })) if field == "middleware"));

        let logged = instance
            .validate(&ctx, &base.with("middleware", json!(["logger-main"])), Some(&resolver as &dyn Resolver))
            .await;
        assert!(logged.is_ok());
    }

    #[tokio::test]
    async fn test_rejects_bad_origin_and_prefix() {
        let instance = router();
        let ctx = Context::default();
        let base = State::new().with("title", "T").with("version", "1");

        let origin = instance
            .validate(&ctx, &base.clone().with("origin", "bad\norigin"), None)
            .await;
        assert!(matches!(origin, Err(Error::Config(ConfigError::Invalid { ref field, .. })) if field == "origin"));

        for bad in ["api", "/:version", "/*rest", "/v1/{id}"] {
            let prefix = instance.validate(&ctx, &base.clone().with("prefix", bad), None).await;
            assert!(
                matches!(prefix, Err(Error::Config(ConfigError::Invalid { ref field, .. })) if field == "prefix"),
                "prefix {:?}",
                bad
            );
        }
    }

    #[tokio::test]
    async fn test_destroy_is_idempotent() {
        let instance = router();
        let ctx = Context::default();

        instance.destroy(&ctx).await.unwrap();
        assert!(instance.as_router().unwrap().service().is_none());
        assert!(instance.read(&ctx).await.unwrap().is_empty());
    }
}
