// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The orchestrator tying registries, references and ordering together.
//!
//! # Locking
//!
//! Lifecycle calls for one instance name are serialized by that entry's
//! async mutex; different names proceed concurrently. The edge index and the
//! registries sit behind short-lived `parking_lot` locks that are never held
//! across an `.await` or while calling into an instance. When both are needed
//! the edge index is taken first.
//!
//! # Edge index
//!
//! The manager keeps its own [`DependencyGraph`] of instance names. Before an
//! Apply the instance's outgoing edges are reserved there, which is where a
//! cycle or a reference to an instance being destroyed is refused. After the
//! Apply settles, the edges are reset to what the instance actually reports
//! from `references()`. Destroy consults the reverse edges.

use parking_lot::{Mutex, RwLock};
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, Span};

use crate::engine::meta::{
    DestroyResponse, InstanceMeta, ListResourcesResponse, Provider, ResourceMeta, UpdateResponse,
};
use crate::engine::registry::{Entry, InstanceRegistry};
use crate::errors::{ConfigError, Error, LifecycleError, Result};
use crate::graph::DependencyGraph;
use crate::instance::Context;
use crate::observability::messages::manager::{
    DependencyNotified, DestroyRefused, InstanceApplied, InstanceCreated, InstanceDestroyed,
    LifecycleStarted, ManagerClosing, OperationFailed, PlanComputed, ResourceRegistered,
};
use crate::observability::messages::StructuredLog;
use crate::state::{self, State};
use crate::traits::{InstanceRef, Resolver, Resource};

pub struct Manager {
    provider: Provider,
    resources: RwLock<BTreeMap<String, Arc<dyn Resource>>>,
    instances: InstanceRegistry,
    edges: Mutex<DependencyGraph<String>>,
    counter: AtomicU64,
    shutdown: CancellationToken,
}

impl Manager {
    pub fn new(provider: Provider) -> Self {
        Self::with_shutdown(provider, CancellationToken::new())
    }

    /// Background work started by Apply hangs off children of `shutdown`.
    pub fn with_shutdown(provider: Provider, shutdown: CancellationToken) -> Self {
        Self {
            provider,
            resources: RwLock::new(BTreeMap::new()),
            instances: InstanceRegistry::default(),
            edges: Mutex::new(DependencyGraph::new()),
            counter: AtomicU64::new(0),
            shutdown,
        }
    }

    pub fn provider(&self) -> &Provider {
        &self.provider
    }

    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Context handed to every lifecycle call, resolving through the live
    /// instance registry.
    pub fn context(&self) -> Context {
        Context::new(self.shutdown.clone()).with_resolver(Arc::new(self.instances.clone()))
    }

    pub fn register_resource(&self, resource: Arc<dyn Resource>) -> Result<()> {
        let name = resource.name().to_string();
        if name.is_empty() {
            return Err(ConfigError::invalid("resource", "name must not be empty").into());
        }

        let mut resources = self.resources.write();
        if resources.contains_key(&name) {
            return Err(Error::Conflict(format!("resource \"{}\" already registered", name)));
        }

        ResourceRegistered {
            resource: &name,
            attributes: resource.schema().len(),
        }
        .log();
        resources.insert(name, resource);
        Ok(())
    }

    pub fn resource(&self, name: &str) -> Result<Arc<dyn Resource>> {
        self.resources
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| Error::not_found("resource", name))
    }

    pub fn resource_names(&self) -> Vec<String> {
        self.resources.read().keys().cloned().collect()
    }

    /// Live instance by name, unless it is being destroyed.
    pub fn instance(&self, name: &str) -> Option<InstanceRef> {
        self.instances
            .get(name)
            .filter(|entry| !entry.is_retiring())
            .map(|entry| Arc::clone(&entry.instance))
    }

    pub fn instance_names(&self) -> Vec<String> {
        self.instances
            .entries()
            .iter()
            .map(|entry| entry.name().to_string())
            .collect()
    }

    /// Registers a fresh, unconfigured instance of `resource`, named
    /// `{resource}-{label}` or `{resource}-{NN}` when no label is given.
    pub async fn create_instance(&self, resource: &str, label: Option<&str>) -> Result<InstanceMeta> {
        let entry = self.create_entry(resource, label)?;
        self.describe(&entry).await
    }

    fn create_entry(&self, resource: &str, label: Option<&str>) -> Result<Arc<Entry>> {
        let descriptor = self.resource(resource)?;
        let name = match label.filter(|l| !l.is_empty()) {
            Some(label) if is_valid_label(label) => format!("{}-{}", resource, label),
            Some(label) => {
                return Err(ConfigError::invalid(
                    "label",
                    format!("\"{}\" must start with a letter and contain only letters, digits and '_'", label),
                )
                .into())
            }
            None => self.next_name(resource),
        };

        let entry = self.instances.insert(descriptor.new_instance(&name))?;
        self.edges.lock().add_node(name.clone(), []);
        InstanceCreated {
            instance: &name,
            resource,
        }
        .log();
        Ok(entry)
    }

    fn next_name(&self, resource: &str) -> String {
        loop {
            let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
            let name = format!("{}-{:02}", resource, n);
            if !self.instances.contains(&name) {
                return name;
            }
        }
    }

    pub async fn get_instance(&self, name: &str) -> Result<InstanceMeta> {
        let entry = self.entry(name)?;
        self.describe(&entry).await
    }

    /// Every registered type with its attributes and live instances. With a
    /// filter, only that type.
    pub async fn list_resources(&self, filter: Option<&str>) -> Result<ListResourcesResponse> {
        let resources: Vec<Arc<dyn Resource>> = match filter {
            Some(name) => vec![self.resource(name)?],
            None => self.resources.read().values().cloned().collect(),
        };

        let entries = self.instances.entries();
        let mut listed = Vec::with_capacity(resources.len());
        for resource in resources {
            let mut instances = Vec::new();
            for entry in entries
                .iter()
                .filter(|e| e.instance.resource().name() == resource.name() && !e.is_retiring())
            {
                instances.push(self.describe(entry).await?);
            }
            listed.push(ResourceMeta {
                name: resource.name().to_string(),
                attributes: resource.schema(),
                instances,
            });
        }

        Ok(ListResourcesResponse {
            provider: self.provider.name.clone(),
            description: self.provider.description.clone(),
            version: self.provider.version.clone(),
            resources: listed,
        })
    }

    /// Validates `desired` and plans it against the instance's current state.
    /// With `apply`, a non-noop plan is then applied. The returned instance
    /// metadata is read after the operation.
    pub async fn update_instance(&self, name: &str, desired: &State, apply: bool) -> Result<UpdateResponse> {
        let entry = self.entry(name)?;
        if entry.is_read_only() {
            return Err(LifecycleError::ReadOnly {
                name: name.to_string(),
            }
            .into());
        }
        self.update_entry(&entry, desired, apply)
            .await
            .map_err(|e| Error::instance(name, e))
    }

    async fn update_entry(&self, entry: &Arc<Entry>, desired: &State, apply: bool) -> Result<UpdateResponse> {
        let _guard = entry.lock.lock().await;
        let name = entry.name();
        if !self.instances.contains(name) {
            return Err(Error::not_found("instance", name));
        }
        if entry.is_retiring() {
            return Err(LifecycleError::Retiring {
                name: name.to_string(),
            }
            .into());
        }

        let span = self.lifecycle_span(entry, "update");
        self.reconcile(entry, desired, apply).instrument(span).await
    }

    /// Validate, Plan and, when asked, Apply. The caller holds the entry lock.
    async fn reconcile(&self, entry: &Arc<Entry>, desired: &State, apply: bool) -> Result<UpdateResponse> {
        let name = entry.name();
        let instance = &entry.instance;
        let wanted = state::references_in(&instance.resource().schema(), desired);
        self.check_edges(name, &wanted)?;

        let ctx = self.context();
        let resolver: &dyn Resolver = &self.instances;
        let config = instance.validate(&ctx, desired, Some(resolver)).await?;
        let plan = instance.plan(&ctx, &config).await?;
        PlanComputed {
            instance: name,
            action: plan.action,
            fields: &plan.fields(),
        }
        .log();

        if apply && !plan.is_noop() {
            let previous = instance.references();
            self.reserve_edges(name, &previous, &wanted)?;
            let reservation = Reservation {
                manager: self,
                instance,
            };

            let applied = instance.apply(&ctx, config).await;
            drop(reservation);
            if let Err(e) = applied {
                OperationFailed {
                    instance: name,
                    operation: "apply",
                    error: &e,
                }
                .log();
                return Err(e);
            }

            let current = instance.references();
            InstanceApplied {
                instance: name,
                action: plan.action,
                references: &current,
            }
            .log();
            self.publish_changed(instance, &previous, &current);
        }

        let meta = self.describe(entry).await?;
        Ok(UpdateResponse { instance: meta, plan })
    }

    /// Creates, applies and marks read-only in one step. The type is
    /// registered first when it is not yet known. Nothing stays registered
    /// when any step fails.
    pub async fn register_and_apply(
        &self,
        resource: Arc<dyn Resource>,
        label: Option<&str>,
        desired: &State,
    ) -> Result<InstanceMeta> {
        let name = resource.name().to_string();
        if self.resource(&name).is_err() {
            self.register_resource(resource)?;
        }
        self.create_and_apply(&name, label, desired).await
    }

    /// [`register_and_apply`](Self::register_and_apply) for an already
    /// registered type.
    pub async fn create_and_apply(&self, resource: &str, label: Option<&str>, desired: &State) -> Result<InstanceMeta> {
        let entry = self.create_entry(resource, label)?;
        let name = entry.name().to_string();

        match self.update_entry(&entry, desired, true).await {
            Ok(response) => {
                entry.set_read_only();
                Ok(InstanceMeta {
                    readonly: true,
                    ..response.instance
                })
            }
            Err(e) => {
                self.discard(&entry).await;
                Err(Error::instance(&name, e))
            }
        }
    }

    async fn discard(&self, entry: &Arc<Entry>) {
        let _guard = entry.lock.lock().await;
        let _ = entry.instance.destroy(&self.context()).await;
        self.edges.lock().remove_node(&entry.name().to_string());
        self.instances.remove(entry.name());
    }

    /// Destroys `name`. Without `cascade` this is refused while any other
    /// instance depends on it; with `cascade` those dependents are destroyed
    /// first, in reverse dependency order.
    pub async fn destroy_instance(&self, name: &str, cascade: bool) -> Result<DestroyResponse> {
        let entry = self.entry(name)?;
        if entry.is_read_only() {
            return Err(LifecycleError::ReadOnly {
                name: name.to_string(),
            }
            .into());
        }

        let order = if cascade {
            self.cascade_order(name)?
        } else {
            vec![name.to_string()]
        };

        let mut destroyed = Vec::with_capacity(order.len());
        for target in &order {
            destroyed.push(self.destroy_one(target).await?);
        }
        Ok(DestroyResponse { instances: destroyed })
    }

    /// `name` and everything transitively depending on it, dependents first.
    fn cascade_order(&self, name: &str) -> Result<Vec<String>> {
        let edges = self.edges.lock();

        let mut members = BTreeSet::from([name.to_string()]);
        let mut queue = VecDeque::from([name.to_string()]);
        while let Some(node) = queue.pop_front() {
            for dependent in edges.dependents_of(&node) {
                if members.insert(dependent.clone()) {
                    queue.push_back(dependent);
                }
            }
        }

        let mut sub = DependencyGraph::new();
        for member in &members {
            if let Some(entry) = self.instances.get(member) {
                if entry.is_read_only() {
                    return Err(LifecycleError::ReadOnly {
                        name: member.clone(),
                    }
                    .into());
                }
            }
            let inside = edges
                .dependencies_of(member)
                .iter()
                .filter(|d| members.contains(*d))
                .cloned()
                .collect::<Vec<_>>();
            sub.add_node(member.clone(), inside);
        }

        let mut order = sub.resolve_all()?;
        order.reverse();
        Ok(order)
    }

    async fn destroy_one(&self, name: &str) -> Result<InstanceMeta> {
        let entry = self.entry(name)?;
        let _guard = entry.lock.lock().await;
        if !self.instances.contains(name) {
            return Err(Error::not_found("instance", name));
        }

        {
            let edges = self.edges.lock();
            if let Some(dependent) = edges.dependents_of(&name.to_string()).into_iter().next() {
                DestroyRefused {
                    instance: name,
                    dependent: &dependent,
                }
                .log();
                return Err(LifecycleError::HasDependents {
                    name: name.to_string(),
                    dependent,
                }
                .into());
            }
            entry.set_retiring(true);
        }

        let meta = match self.describe(&entry).await {
            Ok(meta) => meta,
            Err(_) => InstanceMeta {
                name: name.to_string(),
                resource: entry.instance.resource().name().to_string(),
                readonly: entry.is_read_only(),
                state: State::new(),
                references: entry.instance.references(),
            },
        };

        let dependencies = entry.instance.references();
        let span = self.lifecycle_span(&entry, "destroy");
        if let Err(e) = entry.instance.destroy(&self.context()).instrument(span).await {
            entry.set_retiring(false);
            OperationFailed {
                instance: name,
                operation: "destroy",
                error: &e,
            }
            .log();
            return Err(Error::instance(name, e));
        }

        self.publish_removed(&entry.instance, &dependencies);
        self.edges.lock().remove_node(&name.to_string());
        self.instances.remove(name);
        InstanceDestroyed { instance: name }.log();
        Ok(meta)
    }

    fn lifecycle_span(&self, entry: &Entry, operation: &str) -> Span {
        let resource = entry.instance.resource();
        let started = LifecycleStarted {
            instance: entry.name(),
            resource: resource.name(),
            operation,
        };
        let span = started.span("lifecycle");
        span.in_scope(|| started.log());
        span
    }

    /// Destroys every instance, read-only ones included, in one reverse
    /// dependency order. Stops at the first failure. The shutdown token is
    /// cancelled either way.
    pub async fn close(&self) -> Result<()> {
        let result = self.destroy_all().await;
        self.shutdown.cancel();
        result
    }

    async fn destroy_all(&self) -> Result<()> {
        let mut order = self.edges.lock().resolve_all()?;
        order.reverse();
        order.retain(|name| self.instances.contains(name));

        ManagerClosing {
            provider: &self.provider.name,
            instances: order.len(),
        }
        .log();

        for name in &order {
            self.destroy_one(name).await?;
        }
        Ok(())
    }

    fn entry(&self, name: &str) -> Result<Arc<Entry>> {
        self.instances
            .get(name)
            .ok_or_else(|| Error::not_found("instance", name))
    }

    async fn describe(&self, entry: &Entry) -> Result<InstanceMeta> {
        let instance = &entry.instance;
        let resource = instance.resource();
        let state = instance
            .read(&self.context())
            .await
            .map_err(|e| Error::instance(instance.name(), e))?;

        Ok(InstanceMeta {
            name: instance.name().to_string(),
            resource: resource.name().to_string(),
            readonly: entry.is_read_only(),
            state: state.redacted(&resource.schema()),
            references: instance.references(),
        })
    }

    /// Refuses `wanted` as the outgoing edges of `name` if that would close a
    /// cycle. Names not in the index cannot, and are left to Validate.
    fn check_edges(&self, name: &str, wanted: &[String]) -> Result<()> {
        let mut edges = self.edges.lock();
        let known: Vec<String> = wanted.iter().filter(|w| edges.contains(*w)).cloned().collect();
        let node = name.to_string();
        let previous = edges.dependencies_of(&node).to_vec();
        try_edges(&mut edges, name, known)?;
        edges.set_dependencies(node, previous);
        Ok(())
    }

    /// Records the union of the current and wanted edges for the duration of
    /// an Apply, so neither set of dependencies can be destroyed under it.
    fn reserve_edges(&self, name: &str, previous: &[String], wanted: &[String]) -> Result<()> {
        let mut edges = self.edges.lock();
        for target in wanted {
            match self.instances.get(target) {
                None => return Err(Error::not_found("instance", target.as_str())),
                Some(entry) if entry.is_retiring() => {
                    return Err(LifecycleError::Retiring {
                        name: target.clone(),
                    }
                    .into())
                }
                Some(_) => {}
            }
        }

        let union: BTreeSet<String> = previous.iter().chain(wanted).cloned().collect();
        try_edges(&mut edges, name, union.into_iter().collect())
    }

    fn settle_edges(&self, name: &str, references: Vec<String>) {
        self.edges.lock().set_dependencies(name.to_string(), references);
    }

    /// Fires `on_dependency_changed` on every instance linked to `source`:
    /// what it references and what references it. Instances it stopped
    /// referencing get `on_dependency_removed`.
    fn publish_changed(&self, source: &InstanceRef, previous: &[String], current: &[String]) {
        let dependents = self.edges.lock().dependents_of(&source.name().to_string());
        let linked: BTreeSet<&String> = current.iter().chain(dependents.iter()).collect();

        for target in linked {
            self.notify(target, source, "changed", |t| t.on_dependency_changed(source));
        }
        for target in previous.iter().filter(|p| !current.contains(p)) {
            self.notify(target, source, "removed", |t| t.on_dependency_removed(source));
        }
    }

    fn publish_removed(&self, source: &InstanceRef, dependencies: &[String]) {
        for target in dependencies {
            self.notify(target, source, "removed", |t| t.on_dependency_removed(source));
        }
    }

    fn notify(&self, target: &str, source: &InstanceRef, event: &str, hook: impl FnOnce(&InstanceRef)) {
        if target == source.name() {
            return;
        }
        if let Some(entry) = self.instances.get(target) {
            DependencyNotified {
                target,
                source: source.name(),
                event,
            }
            .log();
            hook(&entry.instance);
        }
    }
}

/// Edges reserved for an Apply in flight. Dropping it, including when the
/// Apply panics or its future is dropped, resets the instance's edges to the
/// references it actually holds.
struct Reservation<'a> {
    manager: &'a Manager,
    instance: &'a InstanceRef,
}

impl Drop for Reservation<'_> {
    fn drop(&mut self) {
        self.manager
            .settle_edges(self.instance.name(), self.instance.references());
    }
}

/// Sets the edges of `name` if the graph stays acyclic, otherwise restores
/// the previous edges and reports the cycle.
fn try_edges(edges: &mut DependencyGraph<String>, name: &str, dependencies: Vec<String>) -> Result<()> {
    let node = name.to_string();
    let previous = edges.dependencies_of(&node).to_vec();
    edges.set_dependencies(node.clone(), dependencies);
    match edges.resolve(&node) {
        Ok(_) => Ok(()),
        Err(cycle) => {
            edges.set_dependencies(node, previous);
            Err(cycle.into())
        }
    }
}

fn is_valid_label(label: &str) -> bool {
    let mut chars = label.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_validation() {
        struct TestCase {
            label: &'static str,
            valid: bool,
        }

        let cases = vec![
            TestCase { label: "main", valid: true },
            TestCase { label: "edge_2", valid: true },
            TestCase { label: "A1", valid: true },
            TestCase { label: "2nd", valid: false },
            TestCase { label: "_x", valid: false },
            TestCase { label: "has-dash", valid: false },
            TestCase { label: "sp ace", valid: false },
        ];

        for case in cases {
            assert_eq!(is_valid_label(case.label), case.valid, "label {:?}", case.label);
        }
    }

    #[test]
    fn test_cycle_restores_previous_edges() {
        let mut edges = DependencyGraph::new();
        edges.add_node("a".to_string(), ["b".to_string()]);
        edges.add_node("b".to_string(), []);

        let err = try_edges(&mut edges, "b", vec!["a".to_string()]).unwrap_err();

        assert!(matches!(err, Error::Cycle(_)));
        assert!(edges.dependencies_of(&"b".to_string()).is_empty());
        assert_eq!(edges.dependencies_of(&"a".to_string()), ["b".to_string()]);
    }
}
