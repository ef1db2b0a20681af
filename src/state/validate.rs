// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde_json::Value;

use crate::errors::{ConfigError, ReferenceError, Result};
use crate::schema::{Access, Attribute, Schema};
use crate::state::State;
use crate::traits::InstanceRef;

/// Plain attributes marked required must hold a non-zero value.
pub fn validate_required<C>(schema: &Schema<C>, config: &C) -> Result<()> {
    for field in schema.fields() {
        let attribute = &field.attribute;
        if !attribute.required || attribute.read_only || attribute.default.is_some() {
            continue;
        }
        if let Access::Value { is_zero, .. } = &field.access {
            if is_zero(config) {
                return Err(ConfigError::Missing {
                    field: attribute.name.clone(),
                }
                .into());
            }
        }
    }
    Ok(())
}

/// Required references must be bound, and bound references must point at
/// an instance of the declared target type.
pub fn validate_references<C>(schema: &Schema<C>, config: &C) -> Result<()> {
    for field in schema.fields() {
        let attribute = &field.attribute;
        let bound: Vec<InstanceRef> = match &field.access {
            Access::Reference { get, .. } => get(config).into_iter().collect(),
            Access::References { get, .. } => get(config),
            Access::Value { .. } => continue,
        };
        if bound.is_empty() && attribute.required {
            return Err(ReferenceError::NotSet {
                field: attribute.name.clone(),
            }
            .into());
        }
        check_target(attribute, &bound)?;
    }
    Ok(())
}

fn check_target(attribute: &Attribute, bound: &[InstanceRef]) -> Result<()> {
    let Some(expected) = attribute.target.as_deref() else {
        return Ok(());
    };
    for instance in bound {
        let resource = instance.resource();
        if resource.name() != expected {
            return Err(ReferenceError::WrongType {
                field: attribute.name.clone(),
                expected: expected.to_string(),
                actual: resource.name().to_string(),
            }
            .into());
        }
    }
    Ok(())
}

/// Names of every instance `config` references, in schema order, without
/// duplicates.
pub fn references_of<C>(schema: &Schema<C>, config: &C) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for field in schema.fields() {
        let bound: Vec<InstanceRef> = match &field.access {
            Access::Reference { get, .. } => get(config).into_iter().collect(),
            Access::References { get, .. } => get(config),
            Access::Value { .. } => continue,
        };
        for instance in bound {
            if !names.iter().any(|n| n == instance.name()) {
                names.push(instance.name().to_string());
            }
        }
    }
    names
}

/// Reference names in a raw State, read without decoding it.
pub fn references_in(attributes: &[Attribute], state: &State) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    let mut push = |name: &str| {
        if !name.is_empty() && !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    };
    for attribute in attributes.iter().filter(|a| a.reference && a.is_input()) {
        match state.get(&attribute.name) {
            Some(Value::String(name)) => push(name.as_str()),
            Some(Value::Array(items)) => items.iter().filter_map(Value::as_str).for_each(&mut push),
            _ => {}
        }
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::stub::{stub_instance, StubResource};
    use crate::errors::Error;
    use crate::schema::{Configuration, SchemaBuilder};
    use serde_json::json;

    #[derive(Clone, Default)]
    struct Site {
        title: String,
        retries: u32,
        parent: Option<InstanceRef>,
        peers: Vec<InstanceRef>,
        status: String,
    }

    impl Configuration for Site {
        fn describe(schema: &mut SchemaBuilder<Self>) {
            schema.field("title", |c| &c.title, |c| &mut c.title).required();
            schema.field("retries", |c| &c.retries, |c| &mut c.retries).required().default("3");
            schema.reference("parent", |c| &c.parent, |c| &mut c.parent).required().target("node");
            schema.references("peers", |c| &c.peers, |c| &mut c.peers).target("node");
            schema.field("status", |c| &c.status, |c| &mut c.status).required().read_only();
        }
    }

    #[test]
    fn test_required_plain_fields() {
        let schema = Site::schema();

        let missing = validate_required(&schema, &Site::default()).unwrap_err();
        assert!(matches!(missing, Error::Config(ConfigError::Missing { ref field }) if field == "title"));

        let present = Site {
            title: "docs".to_string(),
            ..Default::default()
        };
        // retries carries a default and status is read-only, neither is checked
        assert!(validate_required(&schema, &present).is_ok());
    }

    #[test]
    fn test_reference_type_checks() {
        let journal = Default::default();
        let node = StubResource::named("node", &journal);
        let other = StubResource::named("other", &journal);
        let n1 = stub_instance(&node, "node-1");
        let o1 = stub_instance(&other, "other-1");
        let schema = Site::schema();

        let unset = validate_references(&schema, &Site::default()).unwrap_err();
        assert!(matches!(unset, Error::Reference(ReferenceError::NotSet { .. })));

        let good = Site {
            parent: Some(n1.clone()),
            peers: vec![n1.clone()],
            ..Default::default()
        };
        assert!(validate_references(&schema, &good).is_ok());

        let wrong = Site {
            parent: Some(n1.clone()),
            peers: vec![n1.clone(), o1.clone()],
            ..Default::default()
        };
        let err = validate_references(&schema, &wrong).unwrap_err();
        assert_eq!(
            err.to_string(),
            "field \"peers\": must be of type \"node\", got \"other\""
        );
    }

    #[test]
    fn test_references_of_deduplicates() {
        let journal = Default::default();
        let node = StubResource::named("node", &journal);
        let n1 = stub_instance(&node, "node-1");
        let n2 = stub_instance(&node, "node-2");
        let site = Site {
            parent: Some(n1.clone()),
            peers: vec![n2.clone(), n1.clone()],
            ..Default::default()
        };

        assert_eq!(references_of(&Site::schema(), &site), vec!["node-1", "node-2"]);
    }

    #[test]
    fn test_references_in_raw_state() {
        let attributes = Site::schema().attributes();
        let state = State::new()
            .with("title", "x")
            .with("parent", "node-1")
            .with("peers", json!(["node-2", "node-1", 7]));

        assert_eq!(references_in(&attributes, &state), vec!["node-1", "node-2"]);
    }
}
