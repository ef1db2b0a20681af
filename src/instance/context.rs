// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::traits::{InstanceRef, Resolver};

/// Passed to every lifecycle call.
///
/// `shutdown` lives as long as the process, not the triggering request;
/// background work started by Apply hangs off a child of it.
#[derive(Clone)]
pub struct Context {
    shutdown: CancellationToken,
    resolver: Option<Arc<dyn Resolver>>,
}

impl Context {
    pub fn new(shutdown: CancellationToken) -> Self {
        Self {
            shutdown,
            resolver: None,
        }
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn Resolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn shutdown(&self) -> &CancellationToken {
        &self.shutdown
    }

    pub fn child_token(&self) -> CancellationToken {
        self.shutdown.child_token()
    }

    pub fn resolver(&self) -> Option<&dyn Resolver> {
        self.resolver.as_deref()
    }

    pub fn resolve(&self, name: &str) -> Option<InstanceRef> {
        self.resolver.as_ref().and_then(|r| r.resolve(name))
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new(CancellationToken::new())
    }
}
