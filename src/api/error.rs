// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::errors::{Error, LifecycleError};

impl Error {
    /// Status the external surface answers with for this error.
    pub fn status(&self) -> StatusCode {
        match self.root() {
            Error::Config(_) | Error::Reference(_) | Error::Cycle(_) => StatusCode::BAD_REQUEST,
            Error::Parse { .. } | Error::Manifest(_) => StatusCode::BAD_REQUEST,
            Error::NotFound { .. } => StatusCode::NOT_FOUND,
            Error::Conflict(_) => StatusCode::CONFLICT,
            Error::Lifecycle(
                LifecycleError::HasDependents { .. }
                | LifecycleError::ReadOnly { .. }
                | LifecycleError::Retiring { .. },
            ) => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
