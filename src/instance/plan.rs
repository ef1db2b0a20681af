// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use std::fmt::{self, Display, Formatter};

use crate::config::consts::REDACTED;
use crate::schema::{is_zero_value, Attribute};
use crate::state::State;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Create,
    Update,
    Destroy,
    Noop,
}

impl Display for Action {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Action::Create => "create",
            Action::Update => "update",
            Action::Destroy => "destroy",
            Action::Noop => "noop",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Change {
    pub field: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new: Option<Value>,
}

/// What an Apply would do.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub action: Action,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub changes: Vec<Change>,
}

impl Plan {
    pub fn noop() -> Self {
        Self {
            action: Action::Noop,
            changes: Vec::new(),
        }
    }

    /// Diffs `desired` against the last-applied `current` state.
    ///
    /// Without a current state the plan is a create listing every non-zero
    /// field. Read-only attributes never take part in the comparison, and
    /// sensitive values are redacted from the result.
    pub fn diff(attributes: &[Attribute], current: Option<&State>, desired: &State) -> Self {
        let computed: BTreeSet<&str> = attributes
            .iter()
            .filter(|a| a.read_only)
            .map(|a| a.name.as_str())
            .collect();

        let plan = match current {
            None => Plan {
                action: Action::Create,
                changes: desired
                    .iter()
                    .filter(|(field, value)| !computed.contains(field.as_str()) && !is_zero_value(value))
                    .map(|(field, value)| Change {
                        field: field.clone(),
                        old: None,
                        new: Some(value.clone()),
                    })
                    .collect(),
            },
            Some(current) => {
                let fields: BTreeSet<&String> = current.keys().chain(desired.keys()).collect();
                let changes: Vec<Change> = fields
                    .into_iter()
                    .filter(|field| !computed.contains(field.as_str()))
                    .filter_map(|field| {
                        let old = current.get(field).cloned().unwrap_or(Value::Null);
                        let new = desired.get(field).cloned().unwrap_or(Value::Null);
                        (old != new).then(|| Change {
                            field: field.clone(),
                            old: Some(old),
                            new: Some(new),
                        })
                    })
                    .collect();
                if changes.is_empty() {
                    Plan::noop()
                } else {
                    Plan {
                        action: Action::Update,
                        changes,
                    }
                }
            }
        };
        plan.redacted(attributes)
    }

    pub fn is_noop(&self) -> bool {
        self.action == Action::Noop
    }

    /// Field names only; safe for log records.
    pub fn fields(&self) -> Vec<&str> {
        self.changes.iter().map(|c| c.field.as_str()).collect()
    }

    fn redacted(mut self, attributes: &[Attribute]) -> Self {
        let sensitive: BTreeSet<&str> = attributes
            .iter()
            .filter(|a| a.sensitive)
            .map(|a| a.name.as_str())
            .collect();
        for change in self.changes.iter_mut().filter(|c| sensitive.contains(c.field.as_str())) {
            for value in [&mut change.old, &mut change.new].into_iter().flatten() {
                if !value.is_null() {
                    *value = Value::String(REDACTED.to_string());
                }
            }
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::AttributeType;
    use serde_json::json;

    fn attributes() -> Vec<Attribute> {
        let mut secret = Attribute::new("secret", AttributeType::String);
        secret.sensitive = true;
        let mut endpoint = Attribute::new("endpoint", AttributeType::String);
        endpoint.read_only = true;
        vec![
            Attribute::new("title", AttributeType::String),
            Attribute::new("port", AttributeType::Uint),
            secret,
            endpoint,
        ]
    }

    #[test]
    fn test_create_lists_non_zero_fields() {
        let desired = State::new()
            .with("title", "T")
            .with("port", 0)
            .with("secret", "")
            .with("endpoint", "http://x");

        let plan = Plan::diff(&attributes(), None, &desired);

        assert_eq!(plan.action, Action::Create);
        assert_eq!(plan.fields(), vec!["title"]);
        assert_eq!(plan.changes[0].old, None);
        assert_eq!(plan.changes[0].new, Some(json!("T")));
    }

    #[test]
    fn test_identical_state_is_noop() {
        let state = State::new().with("title", "T").with("port", 80);

        let plan = Plan::diff(&attributes(), Some(&state), &state.clone());

        assert!(plan.is_noop());
        assert!(plan.changes.is_empty());
    }

    #[test]
    fn test_single_field_update() {
        let current = State::new().with("title", "T").with("port", 80);
        let desired = State::new().with("title", "T").with("port", 8080);

        let plan = Plan::diff(&attributes(), Some(&current), &desired);

        assert_eq!(plan.action, Action::Update);
        assert_eq!(
            plan.changes,
            vec![Change {
                field: "port".to_string(),
                old: Some(json!(80)),
                new: Some(json!(8080)),
            }]
        );
    }

    #[test]
    fn test_read_only_differences_are_ignored() {
        let current = State::new().with("title", "T").with("endpoint", "http://a");
        let desired = State::new().with("title", "T").with("endpoint", "");

        assert!(Plan::diff(&attributes(), Some(&current), &desired).is_noop());
    }

    #[test]
    fn test_sensitive_values_are_redacted() {
        let current = State::new().with("secret", "old-password");
        let desired = State::new().with("secret", "new-password");

        let plan = Plan::diff(&attributes(), Some(&current), &desired);

        assert_eq!(plan.changes[0].old, Some(json!(REDACTED)));
        assert_eq!(plan.changes[0].new, Some(json!(REDACTED)));
        let rendered = serde_json::to_string(&plan).unwrap();
        assert!(!rendered.contains("password"));
    }
}
