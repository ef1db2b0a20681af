// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for startup manifest loading and validation.

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// Manifest parsed from disk.
///
/// # Log Level
/// `info!`
pub struct ManifestLoaded<'a> {
    pub path: &'a str,
    pub instances: usize,
}

impl Display for ManifestLoaded<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Loaded manifest {} declaring {} instances", self.path, self.instances)
    }
}

impl StructuredLog for ManifestLoaded<'_> {
    fn log(&self) {
        tracing::info!(path = self.path, instances = self.instances, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("manifest", span_name = name, path = self.path)
    }
}

/// One problem found while validating a manifest.
///
/// # Log Level
/// `error!` - Failure requiring attention
///
/// # Example
/// ```
/// use the_rigging::observability::messages::validation::ManifestProblem;
///
/// let error = std::io::Error::new(std::io::ErrorKind::Other, "duplicate instance");
/// let msg = ManifestProblem {
///     error: &error,
/// };
///
/// tracing::error!("{}", msg);
/// ```
pub struct ManifestProblem<'a> {
    pub error: &'a dyn std::error::Error,
}

impl Display for ManifestProblem<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Manifest validation failed: {}", self.error)
    }
}

impl StructuredLog for ManifestProblem<'_> {
    fn log(&self) {
        tracing::error!(error = %self.error, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::span!(tracing::Level::ERROR, "manifest", span_name = name)
    }
}

/// Every declared instance registered and applied.
///
/// # Log Level
/// `info!`
pub struct ManifestApplied<'a> {
    pub provider: &'a str,
    pub order: &'a [String],
}

impl Display for ManifestApplied<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Applied {} instances for '{}': {}",
            self.order.len(),
            self.provider,
            self.order.join(" -> ")
        )
    }
}

impl StructuredLog for ManifestApplied<'_> {
    fn log(&self) {
        tracing::info!(provider = self.provider, instances = self.order.len(), "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("manifest", span_name = name, provider = self.provider)
    }
}
