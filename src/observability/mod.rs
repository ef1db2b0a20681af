// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Structured logging and tracing.
//!
//! This module provides centralized message types for all diagnostic and operational
//! logging throughout the rigging crate. Message types follow a struct-based pattern
//! with `Display` trait implementation to:
//!
//! * Eliminate magic strings scattered throughout the codebase
//! * Enable future internationalization without code changes
//! * Maintain Single Responsibility Principle (SRP)
//! * Provide consistent, structured logging output
//!
//! # Architecture
//!
//! Messages are organized by subsystem:
//! * `messages::manager` - registries, lifecycle operations and notifications
//! * `messages::http` - managed listeners and per-request logging
//! * `messages::validation` - startup manifest loading and validation
//!
//! # Usage
//!
//! ```rust
//! use the_rigging::observability::messages::manager::OperationFailed;
//!
//! let error = std::io::Error::new(std::io::ErrorKind::AddrInUse, "address in use");
//! let msg = OperationFailed {
//!     instance: "server-main",
//!     operation: "apply",
//!     error: &error,
//! };
//!
//! tracing::error!("{}", msg);
//! ```

pub mod messages;
