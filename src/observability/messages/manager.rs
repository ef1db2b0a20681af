// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for the manager's registries and instance lifecycle.

use crate::instance::Action;
use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// A resource type was added to the type registry.
///
/// # Log Level
/// `info!`
pub struct ResourceRegistered<'a> {
    pub resource: &'a str,
    pub attributes: usize,
}

impl Display for ResourceRegistered<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Registered resource type '{}' with {} attributes",
            self.resource, self.attributes
        )
    }
}

impl StructuredLog for ResourceRegistered<'_> {
    fn log(&self) {
        tracing::info!(
            resource = self.resource,
            attributes = self.attributes,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("resource", span_name = name, resource = self.resource)
    }
}

/// A new, unconfigured instance was registered.
///
/// # Log Level
/// `info!`
pub struct InstanceCreated<'a> {
    pub instance: &'a str,
    pub resource: &'a str,
}

impl Display for InstanceCreated<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Created instance '{}' of type '{}'", self.instance, self.resource)
    }
}

impl StructuredLog for InstanceCreated<'_> {
    fn log(&self) {
        tracing::info!(instance = self.instance, resource = self.resource, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "instance",
            span_name = name,
            instance = self.instance,
            resource = self.resource,
        )
    }
}

/// An Update or Destroy acquired the instance and is about to run.
///
/// # Log Level
/// `debug!`
pub struct LifecycleStarted<'a> {
    pub instance: &'a str,
    pub resource: &'a str,
    pub operation: &'a str,
}

impl Display for LifecycleStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Starting {} of instance '{}'", self.operation, self.instance)
    }
}

impl StructuredLog for LifecycleStarted<'_> {
    fn log(&self) {
        tracing::debug!(
            instance = self.instance,
            resource = self.resource,
            operation = self.operation,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "lifecycle",
            span_name = name,
            instance = self.instance,
            resource = self.resource,
            operation = self.operation,
        )
    }
}

/// Plan computed for an update. Lists changed field names only.
///
/// # Log Level
/// `debug!`
pub struct PlanComputed<'a> {
    pub instance: &'a str,
    pub action: Action,
    pub fields: &'a [&'a str],
}

impl Display for PlanComputed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Plan for '{}': {}", self.instance, self.action)?;
        if !self.fields.is_empty() {
            write!(f, " ({})", self.fields.join(", "))?;
        }
        Ok(())
    }
}

impl StructuredLog for PlanComputed<'_> {
    fn log(&self) {
        tracing::debug!(
            instance = self.instance,
            action = %self.action,
            changes = self.fields.len(),
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "plan",
            span_name = name,
            instance = self.instance,
            action = %self.action,
        )
    }
}

/// Apply committed new state.
///
/// # Log Level
/// `info!`
pub struct InstanceApplied<'a> {
    pub instance: &'a str,
    pub action: Action,
    pub references: &'a [String],
}

impl Display for InstanceApplied<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Applied '{}' ({})", self.instance, self.action)
    }
}

impl StructuredLog for InstanceApplied<'_> {
    fn log(&self) {
        tracing::info!(
            instance = self.instance,
            action = %self.action,
            references = ?self.references,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("apply", span_name = name, instance = self.instance)
    }
}

/// A lifecycle operation failed and the instance was left as it was.
///
/// # Log Level
/// `error!`
pub struct OperationFailed<'a> {
    pub instance: &'a str,
    pub operation: &'a str,
    pub error: &'a dyn std::error::Error,
}

impl Display for OperationFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{} of '{}' failed: {}", self.operation, self.instance, self.error)
    }
}

impl StructuredLog for OperationFailed<'_> {
    fn log(&self) {
        tracing::error!(
            instance = self.instance,
            operation = self.operation,
            error = %self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "operation",
            span_name = name,
            instance = self.instance,
            operation = self.operation,
        )
    }
}

/// Destroy refused because another instance still references this one.
///
/// # Log Level
/// `warn!`
pub struct DestroyRefused<'a> {
    pub instance: &'a str,
    pub dependent: &'a str,
}

impl Display for DestroyRefused<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Refusing to destroy '{}': '{}' depends on it",
            self.instance, self.dependent
        )
    }
}

impl StructuredLog for DestroyRefused<'_> {
    fn log(&self) {
        tracing::warn!(instance = self.instance, dependent = self.dependent, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!("destroy", span_name = name, instance = self.instance)
    }
}

/// Instance destroyed and removed from the registry.
///
/// # Log Level
/// `info!`
pub struct InstanceDestroyed<'a> {
    pub instance: &'a str,
}

impl Display for InstanceDestroyed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Destroyed instance '{}'", self.instance)
    }
}

impl StructuredLog for InstanceDestroyed<'_> {
    fn log(&self) {
        tracing::info!(instance = self.instance, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("destroy", span_name = name, instance = self.instance)
    }
}

/// An observer hook fired.
///
/// # Log Level
/// `debug!`
pub struct DependencyNotified<'a> {
    pub target: &'a str,
    pub source: &'a str,
    pub event: &'a str,
}

impl Display for DependencyNotified<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Notified '{}' that '{}' {}", self.target, self.source, self.event)
    }
}

impl StructuredLog for DependencyNotified<'_> {
    fn log(&self) {
        tracing::debug!(
            target_instance = self.target,
            source_instance = self.source,
            event = self.event,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "notify",
            span_name = name,
            target_instance = self.target,
            source_instance = self.source,
        )
    }
}

/// Close started tearing everything down.
///
/// # Log Level
/// `info!`
pub struct ManagerClosing<'a> {
    pub provider: &'a str,
    pub instances: usize,
}

impl Display for ManagerClosing<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Closing '{}': destroying {} instances in dependency order",
            self.provider, self.instances
        )
    }
}

impl StructuredLog for ManagerClosing<'_> {
    fn log(&self) {
        tracing::info!(provider = self.provider, instances = self.instances, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("close", span_name = name, provider = self.provider)
    }
}
