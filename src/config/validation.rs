// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Manifest checks run before anything is applied.
//!
//! Every problem is collected rather than stopping at the first, in this
//! order: duplicate names, unknown resource types, references to instances
//! that are neither declared nor already live, and finally cycles among the
//! declared instances. Cycle detection only runs once the graph is complete.

use std::collections::BTreeSet;

use crate::config::Manifest;
use crate::engine::{InstanceMeta, Manager};
use crate::errors::{Error, ManifestError, Result};
use crate::graph::DependencyGraph;
use crate::observability::messages::validation::{ManifestApplied, ManifestProblem};
use crate::observability::messages::StructuredLog;
use crate::state;

pub fn validate_manifest(manifest: &Manifest, manager: &Manager) -> std::result::Result<(), Vec<ManifestError>> {
    let mut errors = Vec::new();

    let mut declared = BTreeSet::new();
    for instance in &manifest.instances {
        if !declared.insert(instance.name()) {
            errors.push(ManifestError::DuplicateInstance { name: instance.name() });
        }
    }

    let mut graph = DependencyGraph::new();
    for instance in &manifest.instances {
        let name = instance.name();
        let Ok(resource) = manager.resource(&instance.resource) else {
            errors.push(ManifestError::UnknownResource {
                instance: name,
                resource: instance.resource.clone(),
            });
            continue;
        };

        let references = state::references_in(&resource.schema(), &instance.attributes);
        for reference in &references {
            if !declared.contains(reference) && manager.instance(reference).is_none() {
                errors.push(ManifestError::UnresolvedReference {
                    instance: name.clone(),
                    reference: reference.clone(),
                });
            }
        }
        let local: Vec<String> = references.into_iter().filter(|r| declared.contains(r)).collect();
        graph.add_node(name, local);
    }

    if errors.is_empty() {
        if let Err(cycle) = graph.resolve_all() {
            errors.push(ManifestError::CyclicDependency { cycle: cycle.path });
        }
    }

    for error in &errors {
        ManifestProblem { error }.log();
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validates `manifest`, then creates and applies every declared instance as
/// read-only, dependencies first. Stops at the first failure; instances
/// applied before it stay registered.
pub async fn apply_manifest(manager: &Manager, manifest: &Manifest) -> Result<Vec<InstanceMeta>> {
    validate_manifest(manifest, manager).map_err(Error::Manifest)?;

    let order = dependency_order(manifest, manager)?;
    let mut applied = Vec::with_capacity(order.len());
    for name in &order {
        let Some(instance) = manifest.instance(name) else {
            continue;
        };
        let meta = manager
            .create_and_apply(&instance.resource, Some(instance.label.as_str()), &instance.attributes)
            .await?;
        applied.push(meta);
    }

    ManifestApplied {
        provider: &manager.provider().name,
        order: &order,
    }
    .log();
    Ok(applied)
}

fn dependency_order(manifest: &Manifest, manager: &Manager) -> Result<Vec<String>> {
    let declared: BTreeSet<String> = manifest.instances.iter().map(|i| i.name()).collect();
    let mut graph = DependencyGraph::new();
    for instance in &manifest.instances {
        let resource = manager.resource(&instance.resource)?;
        let local: Vec<String> = state::references_in(&resource.schema(), &instance.attributes)
            .into_iter()
            .filter(|r| declared.contains(r))
            .collect();
        graph.add_node(instance.name(), local);
    }
    Ok(graph.resolve_all()?)
}
