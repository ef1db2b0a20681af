// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use thiserror::Error;

/// The dependency graph contains a cycle. `path` runs from the first
/// occurrence of `node` on the traversal stack back to `node` itself.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("circular dependency detected at \"{node}\": {}", .path.join(" -> "))]
pub struct CycleError {
    pub node: String,
    pub path: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LifecycleError {
    #[error("cannot destroy \"{name}\": instance \"{dependent}\" depends on it")]
    HasDependents { name: String, dependent: String },

    #[error("configuration was not validated for \"{name}\"")]
    NotValidated { name: String },

    #[error("instance \"{name}\" is read-only")]
    ReadOnly { name: String },

    #[error("instance \"{name}\" is being destroyed")]
    Retiring { name: String },

    #[error("apply failed: {reason}")]
    Apply { reason: String },
}
