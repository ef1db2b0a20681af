// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Serves a directory below a path of whichever routers mount it.

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::{json, Value};
use std::collections::BTreeSet;
use std::sync::Arc;
use tower_http::services::ServeDir;

use crate::backends::{join_path, mount_path_problem};
use crate::errors::{ConfigError, Result};
use crate::instance::{Context, InstanceCore, Plan, ValidatedConfig};
use crate::schema::{Attribute, Configuration, SchemaBuilder};
use crate::state::State;
use crate::traits::{HandlerSpec, HttpHandler, InstanceRef, Resolver, Resource, ResourceInstance};

#[derive(Debug, Clone, Default)]
pub struct StaticConfig {
    pub path: String,
    pub dir: String,
    pub summary: String,
    pub description: String,
    pub endpoints: Vec<String>,
}

impl Configuration for StaticConfig {
    fn describe(schema: &mut SchemaBuilder<Self>) {
        schema
            .field("path", |c| &c.path, |c| &mut c.path)
            .required()
            .help("Mount path within the router");
        schema
            .field("dir", |c| &c.dir, |c| &mut c.dir)
            .required()
            .help("Directory to serve");
        schema.field("summary", |c| &c.summary, |c| &mut c.summary);
        schema.field("description", |c| &c.description, |c| &mut c.description);
        schema
            .field("endpoints", |c| &c.endpoints, |c| &mut c.endpoints)
            .read_only();
    }
}

pub struct StaticResource;

impl Resource for StaticResource {
    fn name(&self) -> &str {
        "static"
    }

    fn schema(&self) -> Vec<Attribute> {
        StaticConfig::schema().attributes()
    }

    fn new_instance(self: Arc<Self>, name: &str) -> InstanceRef {
        Arc::new(StaticInstance {
            core: InstanceCore::new(name, self),
            service: RwLock::new(None),
            routers: RwLock::new(BTreeSet::new()),
        })
    }
}

pub struct StaticInstance {
    core: InstanceCore<StaticConfig>,
    service: RwLock<Option<axum::Router>>,
    /// Routers currently mounting this handler.
    routers: RwLock<BTreeSet<String>>,
}

#[async_trait]
impl ResourceInstance for StaticInstance {
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
        if let Some(problem) = mount_path_problem(&config.path) {
            return Err(ConfigError::invalid("path", problem).into());
        }
        match tokio::fs::metadata(&config.dir).await {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => return Err(ConfigError::invalid("dir", format!("{} is not a directory", config.dir)).into()),
            Err(e) => return Err(ConfigError::invalid("dir", format!("{}: {}", config.dir, e)).into()),
        }
        Ok(self.core.seal(config))
    }

    async fn plan(&self, _ctx: &Context, config: &ValidatedConfig) -> Result<Plan> {
        self.core.plan(config)
    }

    async fn apply(&self, _ctx: &Context, config: ValidatedConfig) -> Result<()> {
        let config = self.core.unseal(config)?;
        let service = axum::Router::new().fallback_service(ServeDir::new(&config.dir));
        *self.service.write() = Some(service);
        self.core.commit(config);
        Ok(())
    }

    /// `endpoints` is recomputed from the routers mounting this handler.
    async fn read(&self, ctx: &Context) -> Result<State> {
        let mut state = self.core.read();
        let Some(config) = self.core.current() else {
            return Ok(state);
        };

        let routers: Vec<String> = self.routers.read().iter().cloned().collect();
        let mut endpoints = BTreeSet::new();
        for name in routers {
            let Some(router) = ctx.resolve(&name) else {
                continue;
            };
            let router_state = router.read(ctx).await?;
            if let Some(Value::Array(urls)) = router_state.get("endpoints") {
                for url in urls.iter().filter_map(Value::as_str) {
                    endpoints.insert(join_path(url, &config.path));
                }
            }
        }
        state.insert("endpoints", json!(endpoints));
        Ok(state)
    }

    async fn destroy(&self, _ctx: &Context) -> Result<()> {
        self.service.write().take();
        self.core.clear();
        Ok(())
    }

    fn references(&self) -> Vec<String> {
        self.core.references()
    }

    fn on_dependency_changed(&self, source: &InstanceRef) {
        if source.as_router().is_none() {
            return;
        }
        let mounted = source.references().iter().any(|r| r == self.name());
        let mut routers = self.routers.write();
        if mounted {
            routers.insert(source.name().to_string());
        } else {
            routers.remove(source.name());
        }
    }

    fn on_dependency_removed(&self, source: &InstanceRef) {
        self.routers.write().remove(source.name());
    }

    fn as_handler(&self) -> Option<&dyn HttpHandler> {
        Some(self)
    }
}

impl HttpHandler for StaticInstance {
    fn path(&self) -> String {
        self.core.current().map(|c| c.path.clone()).unwrap_or_default()
    }

    fn service(&self) -> Option<axum::Router> {
        self.service.read().clone()
    }

    fn spec(&self) -> Option<HandlerSpec> {
        self.core.current().map(|c| HandlerSpec {
            summary: c.summary.clone(),
            description: c.description.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::Error;
    use axum::body::Body;
    use axum::http::Request;
    use axum::http::StatusCode;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_serves_files_from_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("hello.txt"), "hi there").unwrap();
        let instance = Arc::new(StaticResource).new_instance("static-docs");
        let ctx = Context::default();
        let desired = State::new()
            .with("path", "/docs")
            .with("dir", dir.path().to_string_lossy().to_string());

        let config = instance.validate(&ctx, &desired, None).await.unwrap();
        instance.apply(&ctx, config).await.unwrap();

        let handler = instance.as_handler().unwrap();
        assert_eq!(handler.path(), "/docs");
        let response = handler
            .service()
            .unwrap()
            .oneshot(Request::builder().uri("/hello.txt").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"hi there");
    }

    #[tokio::test]
    async fn test_path_must_be_literal() {
        let dir = tempfile::tempdir().unwrap();
        let instance = Arc::new(StaticResource).new_instance("static-docs");

        for path in ["docs", "/:id", "/files/*rest", "/{id}"] {
            let desired = State::new()
                .with("path", path)
                .with("dir", dir.path().to_string_lossy().to_string());
            let result = instance.validate(&Context::default(), &desired, None).await;
            assert!(
                matches!(result, Err(Error::Config(ConfigError::Invalid { ref field, .. })) if field == "path"),
                "path {:?}",
                path
            );
        }
    }

    #[tokio::test]
    async fn test_dir_must_exist() {
        struct TestCase {
            name: &'static str,
            dir: String,
        }

        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("plain.txt");
        std::fs::write(&file, "x").unwrap();

        let cases = vec![
            TestCase {
                name: "missing",
                dir: dir.path().join("nope").to_string_lossy().into_owned(),
            },
            TestCase {
                name: "a file",
                dir: file.to_string_lossy().into_owned(),
            },
        ];

        let instance = Arc::new(StaticResource).new_instance("static-docs");
        for case in cases {
            let desired = State::new().with("path", "/docs").with("dir", case.dir.as_str());
            let result = instance.validate(&Context::default(), &desired, None).await;
            assert!(
                matches!(result, Err(Error::Config(ConfigError::Invalid { ref field, .. })) if field == "dir"),
                "case: {}",
                case.name
            );
        }
    }
}
