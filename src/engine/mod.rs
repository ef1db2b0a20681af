// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Lifecycle orchestration over live instances.
//!
//! [`Manager`] owns the type registry, the instance registry and the edge
//! index between instances. Callers create instances of registered types,
//! submit desired state to plan or apply, and destroy them; the manager keeps
//! references valid and the dependency graph acyclic throughout, and
//! publishes dependency changes to linked instances after each commit.
//!
//! ```rust
//! use the_rigging::engine::{Manager, Provider};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = Manager::new(Provider {
//!     name: "rigging".to_string(),
//!     ..Default::default()
//! });
//! the_rigging::backends::register_builtin(&manager)?;
//!
//! let router = manager.create_instance("router", Some("main")).await?;
//! assert_eq!(router.name, "router-main");
//!
//! manager.close().await?;
//! # Ok(())
//! # }
//! ```

mod manager;
mod meta;
mod registry;


pub use manager::Manager;
pub use meta::{
    CreateRequest, DestroyResponse, InstanceMeta, ListResourcesResponse, Provider, ResourceMeta,
    UpdateRequest, UpdateResponse,
};
