// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use thiserror::Error;

/// A configuration attribute is missing or holds a value that cannot be used.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("field \"{field}\": required")]
    Missing { field: String },

    #[error("field \"{field}\": {reason}")]
    Invalid { field: String, reason: String },
}

/// A reference attribute could not be bound to a live instance.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReferenceError {
    #[error("field \"{field}\": required reference not set")]
    NotSet { field: String },

    #[error("field \"{field}\": reference \"{name}\" not found")]
    NotFound { field: String, name: String },

    #[error("field \"{field}\": no resolver available for reference \"{name}\"")]
    NoResolver { field: String, name: String },

    #[error("field \"{field}\": must be of type \"{expected}\", got \"{actual}\"")]
    WrongType {
        field: String,
        expected: String,
        actual: String,
    },
}

impl ConfigError {
    pub fn invalid(field: &str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}
