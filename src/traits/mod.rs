// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod http;
pub mod resource;

pub use http::{HandlerSpec, HttpHandler, HttpMiddleware, HttpRouter, HttpServer};
pub use resource::{InstanceRef, Resolver, Resource, ResourceInstance};
