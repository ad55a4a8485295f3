// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::blockchain::error::ServiceError;

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub error_code: &'static str,
}

/// Error body returned by every endpoint.
#[derive(Serialize, ToSchema)]
pub struct ErrorBody {
    error: String,
    error_code: String,
}

impl ApiError {
    pub fn new(status: StatusCode, error_code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            error_code,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "BAD_REQUEST", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "NOT_FOUND", message)
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        let status = match &err {
            ServiceError::InvalidInput(_)
            | ServiceError::KeyDerivation(_)
            | ServiceError::InvalidRange { .. } => StatusCode::BAD_REQUEST,
            ServiceError::AccountLookup { .. } => StatusCode::NOT_FOUND,
            ServiceError::GasEstimation { .. } | ServiceError::BroadcastRejected { .. } => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            ServiceError::Chain { .. }
            | ServiceError::Broadcast(_)
            | ServiceError::BlockFetch { .. }
            | ServiceError::RangeAborted { .. } => StatusCode::SERVICE_UNAVAILABLE,
            ServiceError::Secret(_)
            | ServiceError::Signing(_)
            | ServiceError::Decode(_)
            | ServiceError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            tracing::error!(error = %err, code = err.error_code(), "Request failed");
        } else {
            tracing::debug!(error = %err, code = err.error_code(), "Request rejected");
        }

        // Secret failures stay in the logs.
        let message = match &err {
            ServiceError::Secret(_) => "Secret unavailable".to_string(),
            _ => err.to_string(),
        };

        Self {
            status,
            message,
            error_code: err.error_code(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            error: self.message,
            error_code: self.error_code.to_string(),
        });
        (self.status, body).into_response()
    }
}
