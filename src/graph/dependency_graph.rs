// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Dependency ordering over opaque node identities.
//!
//! # Algorithm
//!
//! [`DependencyGraph::resolve`] is a depth-first traversal that tracks two sets:
//! - **resolved**: nodes already placed in the output, in dependency-first order
//! - **on stack**: nodes currently being expanded
//!
//! Reaching a node that is still on the stack means the graph has a cycle; the
//! traversal stops at once with a [`CycleError`] naming that node and the path
//! that led back to it. No partial order is ever returned. A node that is
//! already resolved is not expanded again, so diamonds produce each node once.
//!
//! **Time Complexity**: O(V + E) per resolve
//!
//! # Example
//!
//! ```rust
//! use the_rigging::graph::DependencyGraph;
//!
//! let mut graph = DependencyGraph::new();
//! graph.add_node("server", ["router"]);
//! graph.add_node("router", ["logger", "static"]);
//!
//! let order = graph.resolve(&"server").unwrap();
//! assert_eq!(order, vec!["logger", "static", "router", "server"]);
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Display;

use crate::errors::CycleError;

/// Node to the nodes it depends on.
#[derive(Debug, Clone)]
pub struct DependencyGraph<N: Ord>(BTreeMap<N, Vec<N>>);

impl<N: Ord> Default for DependencyGraph<N> {
    fn default() -> Self {
        Self(BTreeMap::new())
    }
}

impl<N: Clone + Ord + Display> DependencyGraph<N> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that `node` requires each of `dependencies`. Calling this again
    /// for the same node appends. Unknown dependencies are registered as leaves.
    pub fn add_node(&mut self, node: N, dependencies: impl IntoIterator<Item = N>) {
        let dependencies: Vec<N> = dependencies.into_iter().collect();
        for dependency in &dependencies {
            self.0.entry(dependency.clone()).or_default();
        }
        self.0.entry(node).or_default().extend(dependencies);
    }

    /// Replaces the dependencies of `node`.
    pub fn set_dependencies(&mut self, node: N, dependencies: impl IntoIterator<Item = N>) {
        self.0.entry(node.clone()).or_default().clear();
        self.add_node(node, dependencies);
    }

    /// Drops `node` and every edge pointing at it.
    pub fn remove_node(&mut self, node: &N) -> Option<Vec<N>> {
        let removed = self.0.remove(node);
        for dependencies in self.0.values_mut() {
            dependencies.retain(|d| d != node);
        }
        removed
    }

    pub fn contains(&self, node: &N) -> bool {
        self.0.contains_key(node)
    }

    pub fn dependencies_of(&self, node: &N) -> &[N] {
        self.0.get(node).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Reverse edges: the nodes that depend on `node`.
    pub fn dependents_of(&self, node: &N) -> Vec<N> {
        self.0
            .iter()
            .filter(|(_, dependencies)| dependencies.contains(node))
            .map(|(dependent, _)| dependent.clone())
            .collect()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &N> {
        self.0.keys()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Every node reachable from `node`, each after all of its dependencies,
    /// ending with `node` itself.
    pub fn resolve(&self, node: &N) -> Result<Vec<N>, CycleError> {
        let mut walk = Walk::default();
        self.visit(node, &mut walk)?;
        Ok(walk.resolved)
    }

    /// Dependency-first order over every node in the graph.
    pub fn resolve_all(&self) -> Result<Vec<N>, CycleError> {
        let mut walk = Walk::default();
        for node in self.0.keys() {
            self.visit(node, &mut walk)?;
        }
        Ok(walk.resolved)
    }

    fn visit(&self, node: &N, walk: &mut Walk<N>) -> Result<(), CycleError> {
        if walk.seen.contains(node) {
            return Ok(());
        }
        if walk.on_stack.contains(node) {
            let start = walk.stack.iter().position(|n| n == node).unwrap_or(0);
            let mut path: Vec<String> = walk.stack[start..].iter().map(ToString::to_string).collect();
            path.push(node.to_string());
            return Err(CycleError {
                node: node.to_string(),
                path,
            });
        }

        walk.on_stack.insert(node.clone());
        walk.stack.push(node.clone());
        for dependency in self.dependencies_of(node) {
            self.visit(dependency, walk)?;
        }
        walk.stack.pop();
        walk.on_stack.remove(node);

        walk.seen.insert(node.clone());
        walk.resolved.push(node.clone());
        Ok(())
    }
}

struct Walk<N> {
    resolved: Vec<N>,
    seen: BTreeSet<N>,
    on_stack: BTreeSet<N>,
    stack: Vec<N>,
}

impl<N> Default for Walk<N> {
    fn default() -> Self {
        Self {
            resolved: Vec::new(),
            seen: BTreeSet::new(),
            on_stack: BTreeSet::new(),
            stack: Vec::new(),
        }
    }
}

impl<N: Ord> From<BTreeMap<N, Vec<N>>> for DependencyGraph<N> {
    fn from(edges: BTreeMap<N, Vec<N>>) -> Self {
        Self(edges)
    }
}

impl<N: Ord> From<DependencyGraph<N>> for BTreeMap<N, Vec<N>> {
    fn from(graph: DependencyGraph<N>) -> Self {
        graph.0
    }
}
