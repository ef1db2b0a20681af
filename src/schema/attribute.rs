// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::{Serialize, Serializer};
use std::fmt::{self, Display, Formatter};

/// Declared type of a configuration attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeType {
    String,
    Bool,
    Int,
    Uint,
    Float,
    Duration,
    Timestamp,
    List(Box<AttributeType>),
    Map(Box<AttributeType>),
    /// Handle to another instance
    Reference,
    /// Handles to several instances
    ReferenceList,
    /// Explicit override, e.g. `file` or `url`
    Named(String),
}

impl Display for AttributeType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            AttributeType::String => f.write_str("string"),
            AttributeType::Bool => f.write_str("bool"),
            AttributeType::Int => f.write_str("int"),
            AttributeType::Uint => f.write_str("uint"),
            AttributeType::Float => f.write_str("float"),
            AttributeType::Duration => f.write_str("duration"),
            AttributeType::Timestamp => f.write_str("timestamp"),
            AttributeType::List(element) => write!(f, "[]{}", element),
            AttributeType::Map(value) => write!(f, "map[string]{}", value),
            AttributeType::Reference => f.write_str("reference"),
            AttributeType::ReferenceList => f.write_str("[]reference"),
            AttributeType::Named(name) => f.write_str(name),
        }
    }
}

impl Serialize for AttributeType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Schema metadata for one configurable field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Attribute {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: AttributeType,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub required: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub sensitive: bool,
    #[serde(rename = "readonly", skip_serializing_if = "std::ops::Not::not")]
    pub read_only: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub reference: bool,
    /// Resource type a reference must point at
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
}

impl Attribute {
    pub fn new(name: &str, kind: AttributeType) -> Self {
        let reference = matches!(kind, AttributeType::Reference | AttributeType::ReferenceList);
        Self {
            name: name.to_string(),
            kind,
            description: String::new(),
            default: None,
            required: false,
            sensitive: false,
            read_only: false,
            reference,
            target: None,
        }
    }

    /// True when a caller may supply a value for this attribute.
    pub fn is_input(&self) -> bool {
        !self.read_only
    }
}
