// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! HTTP surface over a [`Manager`].
//!
//! | Method | Path | Operation |
//! |--------|------|-----------|
//! | GET | `/resource?type=T` | list types, their schemas and live instances |
//! | POST | `/resource` | create an instance: `{resource, label}` |
//! | GET | `/resource/{name}` | one instance's current state |
//! | PATCH | `/resource/{name}` | plan, or plan and apply: `{attributes, apply}` |
//! | DELETE | `/resource/{name}?cascade=true` | destroy, dependents first with `cascade` |
//!
//! Paths are relative; the surface is usually mounted by the `api` resource
//! under a managed router, or nested directly by the embedding program.

mod error;
mod resource;

pub use resource::{ApiConfig, ApiResource};

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use std::sync::Arc;

use crate::engine::{
    CreateRequest, DestroyResponse, InstanceMeta, ListResourcesResponse, Manager, UpdateRequest,
    UpdateResponse,
};
use crate::errors::Error;

pub fn router(manager: Arc<Manager>) -> Router {
    Router::new()
        .route("/resource", get(list_resources).post(create_instance))
        .route(
            "/resource/{name}",
            get(get_instance).patch(update_instance).delete(destroy_instance),
        )
        .with_state(manager)
}

#[derive(Debug, Default, Deserialize)]
struct ListQuery {
    #[serde(rename = "type")]
    resource: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct DestroyQuery {
    #[serde(default)]
    cascade: bool,
}

async fn list_resources(
    State(manager): State<Arc<Manager>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ListResourcesResponse>, Error> {
    let filter = query.resource.as_deref().filter(|t| !t.is_empty());
    Ok(Json(manager.list_resources(filter).await?))
}

async fn create_instance(
    State(manager): State<Arc<Manager>>,
    Json(request): Json<CreateRequest>,
) -> Result<(StatusCode, Json<InstanceMeta>), Error> {
    let meta = manager
        .create_instance(&request.resource, request.label.as_deref())
        .await?;
    Ok((StatusCode::CREATED, Json(meta)))
}

async fn get_instance(
    State(manager): State<Arc<Manager>>,
    Path(name): Path<String>,
) -> Result<Json<InstanceMeta>, Error> {
    Ok(Json(manager.get_instance(&name).await?))
}

async fn update_instance(
    State(manager): State<Arc<Manager>>,
    Path(name): Path<String>,
    Json(request): Json<UpdateRequest>,
) -> Result<Json<UpdateResponse>, Error> {
    Ok(Json(
        manager
            .update_instance(&name, &request.attributes, request.apply)
            .await?,
    ))
}

async fn destroy_instance(
    State(manager): State<Arc<Manager>>,
    Path(name): Path<String>,
    Query(query): Query<DestroyQuery>,
) -> Result<Json<DestroyResponse>, Error> {
    Ok(Json(manager.destroy_instance(&name, query.cascade).await?))
}
