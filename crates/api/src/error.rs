//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use provisioning::{AuthorizationError, ProvisioningError};

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Bad request from the client.
    BadRequest(String),
    /// Service provisioning error.
    Provisioning(ProvisioningError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message, field) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg, None),
            ApiError::Provisioning(err) => provisioning_error_to_response(err),
        };

        metrics::counter!("api_errors_total", "status" => status.as_str().to_owned()).increment(1);

        let body = match field {
            Some(field) => serde_json::json!({ "error": message, "field": field }),
            None => serde_json::json!({ "error": message }),
        };
        (status, axum::Json(body)).into_response()
    }
}

fn provisioning_error_to_response(
    err: ProvisioningError,
) -> (StatusCode, String, Option<&'static str>) {
    match &err {
        ProvisioningError::Validation(validation) => {
            (StatusCode::BAD_REQUEST, err.to_string(), validation.field_name())
        }
        ProvisioningError::Authorization(AuthorizationError::NotAuthenticated) => {
            (StatusCode::UNAUTHORIZED, err.to_string(), None)
        }
        ProvisioningError::Authorization(AuthorizationError::Forbidden { .. }) => {
            (StatusCode::FORBIDDEN, err.to_string(), None)
        }
        ProvisioningError::Authorization(AuthorizationError::Unavailable(_)) => {
            tracing::error!(error = %err, "access check unavailable");
            (StatusCode::SERVICE_UNAVAILABLE, err.to_string(), None)
        }
        ProvisioningError::DataStore { .. } if err.is_slug_conflict() => {
            (StatusCode::CONFLICT, err.to_string(), Some("slug"))
        }
        ProvisioningError::DataStore { step, .. } => {
            tracing::error!(%step, error = %err, "data store error");
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string(), None)
        }
        ProvisioningError::Compensation { failure, .. } => {
            tracing::error!(
                service_id = %failure.service_id(),
                error = %err,
                "rollback failed; rows need manual cleanup"
            );
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string(), None)
        }
    }
}

impl From<ProvisioningError> for ApiError {
    fn from(err: ProvisioningError) -> Self {
        ApiError::Provisioning(err)
    }
}
