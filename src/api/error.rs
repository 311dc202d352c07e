// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use crate::api::types::ErrorBody;
use crate::errors::{CoreError, ModuleError};
use crate::observability::messages::api::RequestFailed;
use crate::observability::messages::StructuredLog;

/// Everything a handler can fail with, mapped to a status code in one place.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Module(#[from] ModuleError),

    /// Malformed pid, body or header.
    #[error("{0}")]
    BadRequest(String),

    /// An extractor refused the request before the handler ran.
    #[error("{message}")]
    Rejected { status: StatusCode, message: String },
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Core(CoreError::ResourceExhausted { .. }) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Core(CoreError::WaitTimedOut { .. }) => StatusCode::GATEWAY_TIMEOUT,
            ApiError::Core(CoreError::Module(e)) | ApiError::Module(e) => module_status(e),
            ApiError::Core(e) if e.is_client_error() => StatusCode::BAD_REQUEST,
            ApiError::Core(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Rejected { status, .. } => *status,
        }
    }
}

fn module_status(error: &ModuleError) -> StatusCode {
    match error {
        ModuleError::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
        _ => StatusCode::BAD_REQUEST,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error = self.to_string();
        RequestFailed {
            status: status.as_u16(),
            error: &error,
        }
        .log();
        (status, Json(ErrorBody { error })).into_response()
    }
}
