use axum::Json;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use talentmatch_core::FieldErrors;

/// Request-level failures with their HTTP mapping.
///
/// Pipeline-stage failures never appear here: they are captured into the run
/// record and surfaced through polling.
#[derive(Debug)]
pub enum ApiError {
    /// Malformed/contradictory input; carries every violated field.
    Validation(FieldErrors),
    /// Record absent or not owned by the caller.
    NotFound,
    /// Feature flag off; no record was created.
    FeatureDisabled(&'static str),
    /// Store-level failure the handler cannot express otherwise.
    Internal(String),
}

impl ApiError {
    pub fn validation_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = FieldErrors::new();
        errors.push(field, message);
        ApiError::Validation(errors)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        match self {
            ApiError::Validation(fields) => (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "error": "validation_error",
                    "fields": fields,
                })),
            )
                .into_response(),
            ApiError::NotFound => json_error(StatusCode::NOT_FOUND, "not_found", "Not found."),
            ApiError::FeatureDisabled(message) => {
                json_error(StatusCode::SERVICE_UNAVAILABLE, "feature_disabled", message)
            }
            ApiError::Internal(message) => {
                json_error(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", message)
            }
        }
    }
}

impl From<talentmatch_runs::RunStoreError> for ApiError {
    fn from(err: talentmatch_runs::RunStoreError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
