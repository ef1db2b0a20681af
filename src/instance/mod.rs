// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Lifecycle scaffolding shared by every managed object.

mod base;
mod context;
mod plan;
mod validated;

pub use base::InstanceCore;
pub use context::Context;
pub use plan::{Action, Change, Plan};
pub use validated::ValidatedConfig;
