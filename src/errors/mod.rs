// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod config;
mod field;
mod lifecycle;

pub use config::ManifestError;
pub use field::{ConfigError, ReferenceError};
pub use lifecycle::{CycleError, LifecycleError};

use thiserror::Error;

/// Crate-wide error. Every operation that can fail returns this, wrapped with
/// the offending instance name where one is known.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Reference(#[from] ReferenceError),

    #[error(transparent)]
    Cycle(#[from] CycleError),

    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    #[error("{kind} \"{name}\" not found")]
    NotFound { kind: &'static str, name: String },

    #[error("{0}")]
    Conflict(String),

    #[error("{path}: {reason}")]
    Parse { path: String, reason: String },

    #[error("invalid manifest: {}", join_manifest_errors(.0))]
    Manifest(Vec<ManifestError>),

    #[error("{name}: {source}")]
    Instance {
        name: String,
        #[source]
        source: Box<Error>,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn not_found(kind: &'static str, name: impl Into<String>) -> Self {
        Error::NotFound {
            kind,
            name: name.into(),
        }
    }

    /// Wraps `source` with the instance it concerns, unless it already names it.
    pub fn instance(name: &str, source: Error) -> Self {
        match source {
            Error::Instance { name: ref inner, .. } if inner == name => source,
            other => Error::Instance {
                name: name.to_string(),
                source: Box::new(other),
            },
        }
    }

    /// The underlying error with any instance wrappers removed.
    pub fn root(&self) -> &Error {
        match self {
            Error::Instance { source, .. } => source.root(),
            other => other,
        }
    }
}

fn join_manifest_errors(errors: &[ManifestError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
