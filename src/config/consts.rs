// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

/// Placeholder written in place of sensitive attribute values on export
pub const REDACTED: &str = "(sensitive)";
/// Manifest read at startup when no path is given on the command line
pub const DEFAULT_MANIFEST: &str = "rigging.yaml";
/// Log filter used when `RUST_LOG` is unset
pub const DEFAULT_LOG_FILTER: &str = "info";
/// Provider name reported by resource listings
pub const PROVIDER_NAME: &str = "rigging";
/// Resource type of the self-management API
pub const API_RESOURCE: &str = "api";
/// Path the composed router serves its OpenAPI document on
pub const OPENAPI_PATH: &str = "/openapi.json";
/// Mount path of the self-management API when none is configured
pub const DEFAULT_API_PATH: &str = "/api";
