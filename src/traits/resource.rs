// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use std::sync::Arc;

use crate::errors::Result;
use crate::instance::{Context, Plan, ValidatedConfig};
use crate::schema::Attribute;
use crate::state::State;
use crate::traits::{HttpHandler, HttpMiddleware, HttpRouter, HttpServer};

pub type InstanceRef = Arc<dyn ResourceInstance>;

/// Name-to-instance lookup used while decoding references.
pub trait Resolver: Send + Sync {
    fn resolve(&self, name: &str) -> Option<InstanceRef>;
}

impl<F> Resolver for F
where
    F: Fn(&str) -> Option<InstanceRef> + Send + Sync,
{
    fn resolve(&self, name: &str) -> Option<InstanceRef> {
        self(name)
    }
}

/// Named type descriptor and factory. Stateless; shared by every instance.
pub trait Resource: Send + Sync + 'static {
    fn name(&self) -> &str;

    fn schema(&self) -> Vec<Attribute>;

    fn new_instance(self: Arc<Self>, name: &str) -> InstanceRef;
}

#[async_trait]
pub trait ResourceInstance: Send + Sync + 'static {
    fn name(&self) -> &str;

    fn resource(&self) -> Arc<dyn Resource>;

    /// Decodes `state` into this instance's configuration, binding references
    /// through `resolver`, and checks required fields and reference types.
    async fn validate(
        &self,
        ctx: &Context,
        state: &State,
        resolver: Option<&dyn Resolver>,
    ) -> Result<ValidatedConfig>;

    async fn plan(&self, ctx: &Context, config: &ValidatedConfig) -> Result<Plan>;

    /// Performs the side effect and commits `config` as current state.
    /// On failure the instance is left as it was.
    async fn apply(&self, ctx: &Context, config: ValidatedConfig) -> Result<()>;

    async fn read(&self, ctx: &Context) -> Result<State>;

    /// Reverses the side effects of Apply. A no-op when never applied.
    async fn destroy(&self, ctx: &Context) -> Result<()>;

    /// Names of the instances this one currently depends on.
    fn references(&self) -> Vec<String>;

    /// An instance linked to this one by a dependency edge was applied.
    /// Runs on the applying task; must not block.
    fn on_dependency_changed(&self, _source: &InstanceRef) {}

    /// An instance linked to this one by a dependency edge was destroyed.
    fn on_dependency_removed(&self, _source: &InstanceRef) {}

    fn as_middleware(&self) -> Option<&dyn HttpMiddleware> {
        None
    }

    fn as_handler(&self) -> Option<&dyn HttpHandler> {
        None
    }

    fn as_router(&self) -> Option<&dyn HttpRouter> {
        None
    }

    fn as_server(&self) -> Option<&dyn HttpServer> {
        None
    }
}
