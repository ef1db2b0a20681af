// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Journalling resource for lifecycle and manager tests.
//!
//! Every side effect and observer hook is appended to a shared [`Journal`] as
//! `"{event}:{instance}"` (hooks as `"{event}:{instance}<-{source}"`), so a
//! test can assert on ordering across instances.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::errors::{LifecycleError, Result};
use crate::instance::{Context, InstanceCore, Plan, ValidatedConfig};
use crate::schema::{Attribute, Configuration, SchemaBuilder};
use crate::state::State;
use crate::traits::{InstanceRef, Resolver, Resource, ResourceInstance};

pub type Journal = Arc<Mutex<Vec<String>>>;

pub struct StubResource {
    name: String,
    journal: Journal,
    failing: AtomicBool,
    panicking: AtomicBool,
    stalling: AtomicBool,
}

impl StubResource {
    pub fn named(name: &str, journal: &Journal) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            journal: Arc::clone(journal),
            failing: AtomicBool::new(false),
            panicking: AtomicBool::new(false),
            stalling: AtomicBool::new(false),
        })
    }

    /// Makes every later Apply and Destroy of this type fail.
    pub fn fail(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Makes every later Apply of this type panic.
    pub fn panic_on_apply(&self, panicking: bool) {
        self.panicking.store(panicking, Ordering::SeqCst);
    }

    /// Makes every later Apply of this type wait forever, so the caller can
    /// drop it midway.
    pub fn stall_apply(&self, stalling: bool) {
        self.stalling.store(stalling, Ordering::SeqCst);
    }

    fn record(&self, entry: String) {
        self.journal.lock().push(entry);
    }

    fn check(&self, operation: &str) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(LifecycleError::Apply {
                reason: format!("stub {} failure", operation),
            }
            .into());
        }
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct StubConfig {
    pub value: String,
    pub secret: String,
    pub parent: Option<InstanceRef>,
    pub deps: Vec<InstanceRef>,
}

impl Configuration for StubConfig {
    fn describe(schema: &mut SchemaBuilder<Self>) {
        schema.field("value", |c| &c.value, |c| &mut c.value);
        schema.field("secret", |c| &c.secret, |c| &mut c.secret).sensitive();
        schema.reference("parent", |c| &c.parent, |c| &mut c.parent).target("node");
        schema.references("deps", |c| &c.deps, |c| &mut c.deps);
    }
}

impl Resource for StubResource {
    fn name(&self) -> &str {
        &self.name
    }

    fn schema(&self) -> Vec<Attribute> {
        StubConfig::schema().attributes()
    }

    fn new_instance(self: Arc<Self>, name: &str) -> InstanceRef {
        Arc::new(StubInstance {
            core: InstanceCore::new(name, self.clone()),
            resource: self,
        })
    }
}

pub struct StubInstance {
    core: InstanceCore<StubConfig>,
    resource: Arc<StubResource>,
}

#[async_trait]
impl ResourceInstance for StubInstance {
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
        self.resource.check("apply")?;
        if self.resource.panicking.load(Ordering::SeqCst) {
            panic!("stub apply panicked for {}", self.name());
        }
        if self.resource.stalling.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        self.core.commit(config);
        self.resource.record(format!("apply:{}", self.name()));
        Ok(())
    }

    async fn read(&self, _ctx: &Context) -> Result<State> {
        Ok(self.core.read())
    }

    async fn destroy(&self, _ctx: &Context) -> Result<()> {
        if !self.core.is_applied() {
            return Ok(());
        }
        self.resource.check("destroy")?;
        self.core.clear();
        self.resource.record(format!("destroy:{}", self.name()));
        Ok(())
    }

    fn references(&self) -> Vec<String> {
        self.core.references()
    }

    fn on_dependency_changed(&self, source: &InstanceRef) {
        self.resource
            .record(format!("changed:{}<-{}", self.name(), source.name()));
    }

    fn on_dependency_removed(&self, source: &InstanceRef) {
        self.resource
            .record(format!("removed:{}<-{}", self.name(), source.name()));
    }
}

pub fn stub_instance(resource: &Arc<StubResource>, name: &str) -> InstanceRef {
    Arc::clone(resource).new_instance(name)
}

/// Journal entries starting with `prefix`, in order.
pub fn entries(journal: &Journal, prefix: &str) -> Vec<String> {
    journal
        .lock()
        .iter()
        .filter(|e| e.starts_with(prefix))
        .cloned()
        .collect()
}
