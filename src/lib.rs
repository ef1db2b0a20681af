// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod api;            // HTTP management surface
pub mod backends;       // built-in resource types
pub mod config;         // startup manifest + constants
pub mod engine;         // lifecycle manager
pub mod errors;         // error handling
pub mod graph;          // dependency ordering
pub mod instance;       // lifecycle building blocks for resource authors
pub mod observability;
pub mod schema;         // typed attribute schemas
pub mod state;          // attribute snapshots
pub mod traits;         // resource + HTTP side interfaces
