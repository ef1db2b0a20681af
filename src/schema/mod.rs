// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Attribute schemas for configuration shapes.
//!
//! Each configuration type registers its fields once through a
//! [`SchemaBuilder`]; the resulting [`Schema`] both describes the attributes
//! to callers and carries the accessors used by the `state` module.

mod attribute;
mod builder;
mod value;

pub use attribute::{Attribute, AttributeType};
pub(crate) use builder::Access;
pub use builder::{AttributeBuilder, Configuration, Field, Schema, SchemaBuilder};
pub(crate) use value::kind_of;
pub use value::{is_zero_value, FieldValue};
