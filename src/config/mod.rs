// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Startup manifest loading, validation and application.

mod loader;
mod validation;

#[cfg(test)]
mod integration_tests;
pub mod consts;

pub use loader::{load_manifest, InstanceConfig, Manifest};
pub use validation::{apply_manifest, validate_manifest};
