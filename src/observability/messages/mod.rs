// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Centralized message types for structured logging.
//!
//! Each message type implements `Display` for the human-readable line and
//! [`StructuredLog`] to emit the same event with structured fields at the
//! right level.
//!
//! # Organization
//!
//! * `manager` - registry and lifecycle orchestration events
//! * `http` - managed listeners and request logging
//! * `validation` - startup manifest loading and validation
//!
//! # Usage Pattern
//!
//! ```rust
//! use the_rigging::observability::messages::manager::InstanceCreated;
//! use the_rigging::observability::messages::StructuredLog;
//!
//! let msg = InstanceCreated {
//!     instance: "router-main",
//!     resource: "router",
//! };
//!
//! msg.log();
//! ```
//!
//! Messages never carry attribute values, only attribute names, so sensitive
//! configuration cannot reach a log record.

use tracing::Span;

pub mod http;
pub mod manager;
pub mod validation;

pub trait StructuredLog {
    /// Emits the event with structured fields.
    fn log(&self);

    /// Opens a span carrying the same fields.
    fn span(&self, name: &str) -> Span;
}
