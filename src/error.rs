use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::json;
use std::collections::BTreeMap;

/// Key under which errors not tied to a single input field are reported,
/// e.g. the duplicate-review rejection.
pub const NON_FIELD_ERRORS: &str = "non_field_errors";

/// FieldError
///
/// One user-correctable problem with one input field. Validation errors are
/// aggregated per call so a client sees every problem at once instead of
/// fixing them one round-trip at a time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }

    /// An error that does not belong to any single field.
    pub fn non_field(message: impl Into<String>) -> Self {
        Self::new(NON_FIELD_ERRORS, message)
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// ApiError
///
/// The full error taxonomy of the request pipeline. Every outcome is a typed
/// value returned to the caller; nothing in this crate is allowed to crash a
/// request. The wire shape for field-scoped variants is a JSON object mapping
/// field names to arrays of messages.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// One or more user-correctable input problems. 400.
    #[error("validation failed")]
    Validation(Vec<FieldError>),

    /// The actor is known but lacks privilege. 403. Distinct from a missing
    /// resource, which is `NotFound` raised by the lookup path.
    #[error("permission denied")]
    PermissionDenied,

    /// The referenced entity does not exist. 404.
    #[error("not found")]
    NotFound,

    /// A missing entity reported against a specific input field, e.g. a token
    /// request naming an unknown username. 404 with a field-scoped body.
    #[error("{} not found", .0.field)]
    NotFoundField(FieldError),

    /// A uniqueness violation surfaced by the store at commit time. Rendered
    /// as 400 with a field-scoped body, matching the sign-up contract.
    #[error("conflict on {}", .0.field)]
    Conflict(FieldError),

    /// A collaborator failure. The detail is logged; the client gets a
    /// generic 500 body.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Collects field errors into the `{field: [messages...]}` wire shape,
/// preserving multiple messages per field.
fn field_map(errors: &[FieldError]) -> BTreeMap<String, Vec<String>> {
    let mut map: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for err in errors {
        map.entry(err.field.clone()).or_default().push(err.message.clone());
    }
    map
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Validation(errors) => {
                (StatusCode::BAD_REQUEST, Json(field_map(&errors))).into_response()
            }
            ApiError::PermissionDenied => (
                StatusCode::FORBIDDEN,
                Json(json!({
                    "detail": "You do not have permission to perform this action."
                })),
            )
                .into_response(),
            ApiError::NotFound => {
                (StatusCode::NOT_FOUND, Json(json!({ "detail": "Not found." }))).into_response()
            }
            ApiError::NotFoundField(err) => {
                (StatusCode::NOT_FOUND, Json(field_map(&[err]))).into_response()
            }
            ApiError::Conflict(err) => {
                (StatusCode::BAD_REQUEST, Json(field_map(&[err]))).into_response()
            }
            ApiError::Internal(detail) => {
                tracing::error!("internal error: {detail}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "detail": "A server error occurred." })),
                )
                    .into_response()
            }
        }
    }
}
