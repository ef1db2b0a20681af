// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::fmt;

/// Problems found while validating a startup manifest
#[derive(Debug, Clone, PartialEq)]
pub enum ManifestError {
    /// Two declared instances share a name
    DuplicateInstance {
        /// The duplicated instance name
        name: String,
    },
    /// An instance names a resource type nobody registered
    UnknownResource {
        /// The declaring instance
        instance: String,
        /// The unknown resource type
        resource: String,
    },
    /// A reference attribute names an instance the manifest does not declare
    UnresolvedReference {
        /// The instance holding the reference
        instance: String,
        /// The missing instance name
        reference: String,
    },
    /// The declared instances reference each other in a loop
    CyclicDependency {
        /// The cycle path
        cycle: Vec<String>,
    },
}

impl fmt::Display for ManifestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ManifestError::DuplicateInstance { name } => {
                write!(f, "Duplicate instance: '{}'", name)
            }
            ManifestError::UnknownResource { instance, resource } => {
                write!(
                    f,
                    "Instance '{}' uses unknown resource type '{}'",
                    instance, resource
                )
            }
            ManifestError::UnresolvedReference {
                instance,
                reference,
            } => {
                write!(
                    f,
                    "Instance '{}' references '{}' which is not declared",
                    instance, reference
                )
            }
            ManifestError::CyclicDependency { cycle } => {
                write!(f, "Cyclic dependency detected: {}", cycle.join(" -> "))
            }
        }
    }
}

impl std::error::Error for ManifestError {}
