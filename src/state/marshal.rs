// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde_json::Value;

use crate::errors::{ConfigError, ReferenceError, Result};
use crate::schema::{kind_of, Access, AttributeType, Schema};
use crate::state::State;
use crate::traits::{InstanceRef, Resolver};

/// Captures `config` as a [`State`]. References become instance names; unset
/// references and empty reference lists are omitted.
pub fn snapshot<C>(schema: &Schema<C>, config: &C) -> State {
    let mut state = State::new();
    for field in schema.fields() {
        let name = field.attribute.name.clone();
        match &field.access {
            Access::Value { snapshot, .. } => {
                state.insert(name, snapshot(config));
            }
            Access::Reference { get, .. } => {
                if let Some(instance) = get(config) {
                    state.insert(name, Value::String(instance.name().to_string()));
                }
            }
            Access::References { get, .. } => {
                let names: Vec<Value> = get(config)
                    .iter()
                    .map(|instance| Value::String(instance.name().to_string()))
                    .collect();
                if !names.is_empty() {
                    state.insert(name, Value::Array(names));
                }
            }
        }
    }
    state
}

/// Decodes `state` into `config`.
///
/// Read-only attributes are never taken from `state`. A named reference that
/// cannot be resolved is an error even on an optional attribute. Plain
/// attributes absent from `state` take their default, if any; a present key
/// always wins over the default, even when it holds a zero value.
pub fn restore<C>(
    schema: &Schema<C>,
    state: &State,
    resolver: Option<&dyn Resolver>,
    config: &mut C,
) -> Result<()> {
    for field in schema.fields() {
        let attribute = &field.attribute;
        if !attribute.is_input() {
            continue;
        }
        let field_name = attribute.name.as_str();
        let value = state.get(field_name);

        match &field.access {
            Access::Reference { set, .. } => {
                let name = match value {
                    None | Some(Value::Null) => None,
                    Some(Value::String(s)) if s.is_empty() => None,
                    Some(Value::String(s)) => Some(s.as_str()),
                    Some(other) => {
                        return Err(ConfigError::invalid(
                            field_name,
                            format!("expected an instance name, got {}", kind_of(other)),
                        )
                        .into())
                    }
                };
                match name {
                    Some(name) => set(config, Some(resolve(resolver, field_name, name)?)),
                    None if attribute.required => {
                        return Err(ReferenceError::NotSet {
                            field: field_name.to_string(),
                        }
                        .into())
                    }
                    None => {}
                }
            }
            Access::References { set, .. } => {
                let items = match value {
                    None | Some(Value::Null) => continue,
                    Some(Value::Array(items)) => items,
                    Some(other) => {
                        return Err(ConfigError::invalid(
                            field_name,
                            format!("expected a list of instance names, got {}", kind_of(other)),
                        )
                        .into())
                    }
                };
                let mut instances = Vec::with_capacity(items.len());
                for item in items {
                    let Value::String(name) = item else {
                        return Err(ConfigError::invalid(
                            field_name,
                            format!("expected an instance name, got {}", kind_of(item)),
                        )
                        .into());
                    };
                    instances.push(resolve(resolver, field_name, name)?);
                }
                set(config, instances);
            }
            Access::Value { restore, .. } => {
                let value = match (value, &attribute.default) {
                    (Some(value), _) => value.clone(),
                    (None, Some(default)) => default_value(&attribute.kind, default),
                    (None, None) => continue,
                };
                restore(config, &value).map_err(|reason| ConfigError::invalid(field_name, reason))?;
            }
        }
    }
    Ok(())
}

/// Defaults are declared as text. Map defaults are written as JSON objects.
fn default_value(kind: &AttributeType, text: &str) -> Value {
    match kind {
        AttributeType::Map(_) => match serde_json::from_str::<Value>(text) {
            Ok(value @ Value::Object(_)) => value,
            _ => Value::String(text.to_string()),
        },
        _ => Value::String(text.to_string()),
    }
}

fn resolve(resolver: Option<&dyn Resolver>, field: &str, name: &str) -> Result<InstanceRef> {
    let resolver = resolver.ok_or_else(|| ReferenceError::NoResolver {
        field: field.to_string(),
        name: name.to_string(),
    })?;
    resolver.resolve(name).ok_or_else(|| {
        ReferenceError::NotFound {
            field: field.to_string(),
            name: name.to_string(),
        }
        .into()
    })
}
