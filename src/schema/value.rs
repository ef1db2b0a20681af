// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Conversions between typed configuration fields and transport-safe values.
//!
//! Restoring is deliberately tolerant: values that have been through a JSON or
//! YAML round trip arrive as floats, strings or untyped lists, and are converted
//! back to the field's own type where that is lossless.

use crate::schema::AttributeType;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

/// A plain (non-reference) configuration field type.
pub trait FieldValue: Sized + Send + Sync + 'static {
    fn attribute_type() -> AttributeType;

    fn to_value(&self) -> Value;

    fn from_value(value: &Value) -> Result<Self, String>;

    fn is_zero(&self) -> bool {
        is_zero_value(&self.to_value())
    }
}

/// Null, false, zero, and empty strings, lists and maps are all "zero".
pub fn is_zero_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
    }
}

pub(crate) fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "map",
    }
}

fn cannot_assign(value: &Value, target: &str) -> String {
    format!("cannot assign {} to {}", kind_of(value), target)
}

fn parse_bool(text: &str) -> Option<bool> {
    match text.trim() {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
        _ => None,
    }
}

fn integer_of(value: &Value) -> Result<i128, String> {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(i as i128)
            } else if let Some(u) = n.as_u64() {
                Ok(u as i128)
            } else {
                match n.as_f64() {
                    Some(f) if f.is_finite() && f.fract() == 0.0 => Ok(f as i128),
                    _ => Err(format!("cannot assign non-integral number {} to integer", n)),
                }
            }
        }
        Value::String(s) => s
            .trim()
            .parse::<i128>()
            .map_err(|_| format!("cannot parse {:?} as integer", s)),
        other => Err(cannot_assign(other, "integer")),
    }
}

impl FieldValue for String {
    fn attribute_type() -> AttributeType {
        AttributeType::String
    }

    fn to_value(&self) -> Value {
        Value::String(self.clone())
    }

    fn from_value(value: &Value) -> Result<Self, String> {
        match value {
            Value::String(s) => Ok(s.clone()),
            Value::Number(n) => Ok(n.to_string()),
            Value::Bool(b) => Ok(b.to_string()),
            Value::Null => Ok(String::new()),
            other => Err(cannot_assign(other, "string")),
        }
    }
}

impl FieldValue for bool {
    fn attribute_type() -> AttributeType {
        AttributeType::Bool
    }

    fn to_value(&self) -> Value {
        Value::Bool(*self)
    }

    fn from_value(value: &Value) -> Result<Self, String> {
        match value {
            Value::Bool(b) => Ok(*b),
            Value::String(s) => parse_bool(s).ok_or_else(|| format!("cannot parse {:?} as bool", s)),
            other => Err(cannot_assign(other, "bool")),
        }
    }
}

macro_rules! impl_integer {
    ($kind:expr, $($t:ty),+) => {$(
        impl FieldValue for $t {
            fn attribute_type() -> AttributeType {
                $kind
            }

            fn to_value(&self) -> Value {
                Value::from(*self)
            }

            fn from_value(value: &Value) -> Result<Self, String> {
                let wide = integer_of(value)?;
                <$t>::try_from(wide)
                    .map_err(|_| format!("{} out of range for {}", wide, stringify!($t)))
            }
        }
    )+};
}

impl_integer!(AttributeType::Int, i8, i16, i32, i64, isize);
impl_integer!(AttributeType::Uint, u8, u16, u32, u64, usize);

macro_rules! impl_float {
    ($($t:ty),+) => {$(
        impl FieldValue for $t {
            fn attribute_type() -> AttributeType {
                AttributeType::Float
            }

            fn to_value(&self) -> Value {
                Value::from(*self)
            }

            fn from_value(value: &Value) -> Result<Self, String> {
                match value {
                    Value::Number(n) => n
                        .as_f64()
                        .map(|f| f as $t)
                        .ok_or_else(|| format!("cannot assign {} to float", n)),
                    Value::String(s) => s
                        .trim()
                        .parse::<$t>()
                        .map_err(|_| format!("cannot parse {:?} as float", s)),
                    other => Err(cannot_assign(other, "float")),
                }
            }
        }
    )+};
}

impl_float!(f32, f64);

impl FieldValue for Duration {
    fn attribute_type() -> AttributeType {
        AttributeType::Duration
    }

    fn to_value(&self) -> Value {
        Value::String(humantime::format_duration(*self).to_string())
    }

    fn from_value(value: &Value) -> Result<Self, String> {
        match value {
            Value::String(s) => humantime::parse_duration(s.trim())
                .map_err(|err| format!("cannot parse {:?} as duration: {}", s, err)),
            other => Err(cannot_assign(other, "duration")),
        }
    }

    fn is_zero(&self) -> bool {
        Duration::is_zero(self)
    }
}

impl FieldValue for DateTime<Utc> {
    fn attribute_type() -> AttributeType {
        AttributeType::Timestamp
    }

    fn to_value(&self) -> Value {
        Value::String(self.to_rfc3339())
    }

    fn from_value(value: &Value) -> Result<Self, String> {
        match value {
            Value::String(s) => DateTime::parse_from_rfc3339(s.trim())
                .map(|t| t.with_timezone(&Utc))
                .map_err(|err| format!("cannot parse {:?} as timestamp: {}", s, err)),
            other => Err(cannot_assign(other, "timestamp")),
        }
    }

    fn is_zero(&self) -> bool {
        *self == DateTime::<Utc>::default()
    }
}

impl<T: FieldValue> FieldValue for Option<T> {
    fn attribute_type() -> AttributeType {
        T::attribute_type()
    }

    fn to_value(&self) -> Value {
        self.as_ref().map_or(Value::Null, T::to_value)
    }

    fn from_value(value: &Value) -> Result<Self, String> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }

    fn is_zero(&self) -> bool {
        self.is_none()
    }
}

impl<T: FieldValue> FieldValue for Vec<T> {
    fn attribute_type() -> AttributeType {
        AttributeType::List(Box::new(T::attribute_type()))
    }

    fn to_value(&self) -> Value {
        Value::Array(self.iter().map(T::to_value).collect())
    }

    fn from_value(value: &Value) -> Result<Self, String> {
        match value {
            Value::Null => Ok(Vec::new()),
            Value::Array(items) => items
                .iter()
                .enumerate()
                .map(|(i, item)| T::from_value(item).map_err(|err| format!("[{}]: {}", i, err)))
                .collect(),
            // defaults and query strings carry lists as comma separated text
            Value::String(s) if s.trim().is_empty() => Ok(Vec::new()),
            Value::String(s) => s
                .split(',')
                .map(|part| T::from_value(&Value::String(part.trim().to_string())))
                .collect(),
            other => Err(cannot_assign(other, "list")),
        }
    }
}

fn entries_of<T: FieldValue>(value: &Value) -> Result<Vec<(String, T)>, String> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Object(map) => map
            .iter()
            .map(|(key, item)| {
                T::from_value(item)
                    .map(|v| (key.clone(), v))
                    .map_err(|err| format!("[{}]: {}", key, err))
            })
            .collect(),
        other => Err(cannot_assign(other, "map")),
    }
}

impl<T: FieldValue> FieldValue for BTreeMap<String, T> {
    fn attribute_type() -> AttributeType {
        AttributeType::Map(Box::new(T::attribute_type()))
    }

    fn to_value(&self) -> Value {
        Value::Object(self.iter().map(|(k, v)| (k.clone(), v.to_value())).collect())
    }

    fn from_value(value: &Value) -> Result<Self, String> {
        entries_of(value).map(|entries| entries.into_iter().collect())
    }
}

impl<T: FieldValue> FieldValue for HashMap<String, T> {
    fn attribute_type() -> AttributeType {
        AttributeType::Map(Box::new(T::attribute_type()))
    }

    fn to_value(&self) -> Value {
        Value::Object(self.iter().map(|(k, v)| (k.clone(), v.to_value())).collect())
    }

    fn from_value(value: &Value) -> Result<Self, String> {
        entries_of(value).map(|entries| entries.into_iter().collect())
    }
}
