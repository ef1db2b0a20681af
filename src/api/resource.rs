// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The management surface as a resource of its own, so a router can mount it
//! like any other handler.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::sync::{Arc, Weak};

use crate::backends::mount_path_problem;
use crate::config::consts::{API_RESOURCE, DEFAULT_API_PATH};
use crate::engine::Manager;
use crate::errors::{ConfigError, LifecycleError, Result};
use crate::instance::{Context, InstanceCore, Plan, ValidatedConfig};
use crate::schema::{Attribute, Configuration, SchemaBuilder};
use crate::state::State;
use crate::traits::{HandlerSpec, HttpHandler, InstanceRef, Resolver, Resource, ResourceInstance};

#[derive(Debug, Clone, Default)]
pub struct ApiConfig {
    pub path: String,
}

impl Configuration for ApiConfig {
    fn describe(schema: &mut SchemaBuilder<Self>) {
        schema
            .field("path", |c| &c.path, |c| &mut c.path)
            .default(DEFAULT_API_PATH)
            .help("Mount path within the router");
    }
}

/// Holds the manager weakly: the manager owns this resource's instances.
pub struct ApiResource {
    manager: Weak<Manager>,
}

impl ApiResource {
    pub fn new(manager: &Arc<Manager>) -> Arc<Self> {
        Arc::new(Self {
            manager: Arc::downgrade(manager),
        })
    }
}

impl Resource for ApiResource {
    fn name(&self) -> &str {
        API_RESOURCE
    }

    fn schema(&self) -> Vec<Attribute> {
        ApiConfig::schema().attributes()
    }

    fn new_instance(self: Arc<Self>, name: &str) -> InstanceRef {
        let manager = self.manager.clone();
        Arc::new(ApiInstance {
            core: InstanceCore::new(name, self),
            manager,
            service: RwLock::new(None),
        })
    }
}

pub struct ApiInstance {
    core: InstanceCore<ApiConfig>,
    manager: Weak<Manager>,
    service: RwLock<Option<axum::Router>>,
}

#[async_trait]
impl ResourceInstance for ApiInstance {
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
        Ok(self.core.seal(config))
    }

    async fn plan(&self, _ctx: &Context, config: &ValidatedConfig) -> Result<Plan> {
        self.core.plan(config)
    }

    async fn apply(&self, _ctx: &Context, config: ValidatedConfig) -> Result<()> {
        let config = self.core.unseal(config)?;
        let manager = self.manager.upgrade().ok_or_else(|| LifecycleError::Apply {
            reason: "manager is gone".to_string(),
        })?;
        *self.service.write() = Some(super::router(manager));
        self.core.commit(config);
        Ok(())
    }

    async fn read(&self, _ctx: &Context) -> Result<State> {
        Ok(self.core.read())
    }

    async fn destroy(&self, _ctx: &Context) -> Result<()> {
        self.service.write().take();
        self.core.clear();
        Ok(())
    }

    fn references(&self) -> Vec<String> {
        self.core.references()
    }

    fn as_handler(&self) -> Option<&dyn HttpHandler> {
        Some(self)
    }
}

impl HttpHandler for ApiInstance {
    fn path(&self) -> String {
        self.core.current().map(|c| c.path.clone()).unwrap_or_default()
    }

    fn service(&self) -> Option<axum::Router> {
        self.service.read().clone()
    }

    fn spec(&self) -> Option<HandlerSpec> {
        self.core.current().map(|_| HandlerSpec {
            summary: "Resource management".to_string(),
            description: "Create, plan, apply and destroy managed instances".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Provider;
    use axum::body::Body;
    use axum::http::Request;
    use axum::http::StatusCode;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_read_only_api_serves_the_manager() {
        let manager = Arc::new(Manager::new(Provider::default()));

        let meta = manager
            .register_and_apply(ApiResource::new(&manager), Some("main"), &State::new())
            .await
            .unwrap();
        assert_eq!(meta.name, "api-main");
        assert!(meta.readonly);
        assert_eq!(meta.state.get("path"), Some(&serde_json::json!("/api")));

        let instance = manager.instance("api-main").unwrap();
        let service = instance.as_handler().unwrap().service().unwrap();
        let response = service
            .oneshot(Request::builder().uri("/resource/api-main").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let err = manager.destroy_instance("api-main", false).await.unwrap_err();
        assert!(matches!(err.root(), crate::errors::Error::Lifecycle(LifecycleError::ReadOnly { .. })));
    }

    #[tokio::test]
    async fn test_path_must_be_literal() {
        let manager = Arc::new(Manager::new(Provider::default()));
        let instance = ApiResource::new(&manager).new_instance("api-main");

        for path in ["api", "/:version", "/*rest", "/{id}"] {
            let result = instance
                .validate(&Context::default(), &State::new().with("path", path), None)
                .await;
            assert!(
                matches!(result, Err(crate::errors::Error::Config(ConfigError::Invalid { ref field, .. })) if field == "path"),
                "path {:?}",
                path
            );
        }
    }

    #[tokio::test]
    async fn test_apply_fails_once_manager_dropped() {
        let manager = Arc::new(Manager::new(Provider::default()));
        let instance = ApiResource::new(&manager).new_instance("api-main");
        drop(manager);
        let ctx = Context::default();

        let config = instance.validate(&ctx, &State::new(), None).await.unwrap();
        let err = instance.apply(&ctx, config).await.unwrap_err();

        assert!(matches!(err, crate::errors::Error::Lifecycle(LifecycleError::Apply { .. })));
        assert!(instance.as_handler().unwrap().service().is_none());
    }
}
