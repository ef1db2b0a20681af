// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Transport shapes returned by the manager's external operations.

use serde::{Deserialize, Serialize};

use crate::instance::Plan;
use crate::schema::Attribute;
use crate::state::State;

/// One live instance as seen from outside. `state` is the instance's Read
/// output with sensitive values redacted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InstanceMeta {
    pub name: String,
    pub resource: String,
    pub readonly: bool,
    pub state: State,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub references: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceMeta {
    pub name: String,
    pub attributes: Vec<Attribute>,
    pub instances: Vec<InstanceMeta>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListResourcesResponse {
    pub provider: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub version: String,
    pub resources: Vec<ResourceMeta>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateRequest {
    pub resource: String,
    #[serde(default)]
    pub label: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateRequest {
    #[serde(default)]
    pub attributes: State,
    #[serde(default)]
    pub apply: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpdateResponse {
    pub instance: InstanceMeta,
    pub plan: Plan,
}

/// Every instance a destroy removed, dependents first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DestroyResponse {
    pub instances: Vec<InstanceMeta>,
}

/// Who this manager reports itself as.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provider {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub version: String,
}
