// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::config::consts::PROVIDER_NAME;
use crate::engine::Provider;
use crate::errors::{Error, Result};
use crate::observability::messages::validation::ManifestLoaded;
use crate::observability::messages::StructuredLog;
use crate::state::State;

/// Startup manifest: provider metadata plus the instances to wire up before
/// anything else runs.
///
/// Instances may be listed in any order; each is named `{resource}-{label}`
/// and may reference the others by that name.
///
/// # Example
/// ```yaml
/// name: rigging
/// version: 0.1.0
/// instances:
///   - resource: server
///     label: main
///     attributes:
///       listen: 127.0.0.1:8080
///       router: router-main
///   - resource: router
///     label: main
///     attributes:
///       title: Rigging
///       version: 0.1.0
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Manifest {
    pub name: String,
    pub description: String,
    pub version: String,
    pub instances: Vec<InstanceConfig>,
}

impl Manifest {
    pub fn provider(&self) -> Provider {
        Provider {
            name: if self.name.is_empty() {
                PROVIDER_NAME.to_string()
            } else {
                self.name.clone()
            },
            description: self.description.clone(),
            version: self.version.clone(),
        }
    }

    pub fn instance(&self, name: &str) -> Option<&InstanceConfig> {
        self.instances.iter().find(|i| i.name() == name)
    }
}

/// One declared instance.
#[derive(Debug, Clone, Deserialize)]
pub struct InstanceConfig {
    pub resource: String,
    pub label: String,
    #[serde(default)]
    pub attributes: State,
}

impl InstanceConfig {
    pub fn name(&self) -> String {
        format!("{}-{}", self.resource, self.label)
    }
}

/// Reads a manifest, choosing the format by extension: `.yaml`/`.yml`,
/// `.toml` or `.json`.
pub fn load_manifest<P: AsRef<Path>>(path: P) -> Result<Manifest> {
    let path = path.as_ref();
    let display = path.display().to_string();
    let parse_error = |reason: String| Error::Parse {
        path: display.clone(),
        reason,
    };

    let content = fs::read_to_string(path).map_err(|e| parse_error(e.to_string()))?;
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();

    let manifest: Manifest = match extension.as_str() {
        "yaml" | "yml" => serde_yaml::from_str(&content).map_err(|e| parse_error(e.to_string()))?,
        "toml" => toml::from_str(&content).map_err(|e| parse_error(e.to_string()))?,
        "json" => serde_json::from_str(&content).map_err(|e| parse_error(e.to_string()))?,
        other => return Err(parse_error(format!("unsupported manifest format \"{}\"", other))),
    };

    ManifestLoaded {
        path: &display,
        instances: manifest.instances.len(),
    }
    .log();
    Ok(manifest)
}
