use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use domain::services::{AttendanceError, StoreError};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    message: String,
}

impl ApiError {
    fn parts(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            ApiError::Conflict(_) => (StatusCode::CONFLICT, "conflict"),
            ApiError::Validation(_) => (StatusCode::BAD_REQUEST, "validation_error"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
            ApiError::ServiceUnavailable(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, "service_unavailable")
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code) = self.parts();
        let message = match self {
            ApiError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                "An internal error occurred".to_string()
            }
            ApiError::NotFound(msg)
            | ApiError::Conflict(msg)
            | ApiError::Validation(msg)
            | ApiError::ServiceUnavailable(msg) => msg,
        };

        let body = ErrorBody {
            error: error_code.into(),
            message,
        };

        (status, Json(body)).into_response()
    }
}

impl From<AttendanceError> for ApiError {
    fn from(err: AttendanceError) -> Self {
        match err {
            AttendanceError::SubjectNotFound(_) => ApiError::NotFound(err.to_string()),
            AttendanceError::AlreadyCheckedIn(_)
            | AttendanceError::NoOpenSession(_)
            | AttendanceError::AlreadyCheckedOut(_) => ApiError::Conflict(err.to_string()),
            AttendanceError::PhotoRequired => ApiError::Validation(err.to_string()),
            AttendanceError::FaceServiceUnavailable(_) => {
                ApiError::ServiceUnavailable(err.to_string())
            }
            AttendanceError::Store(StoreError::Unavailable(msg)) => {
                ApiError::ServiceUnavailable(format!("Storage unavailable: {}", msg))
            }
            AttendanceError::Store(StoreError::Backend(msg)) => {
                ApiError::Internal(format!("Storage error: {}", msg))
            }
            AttendanceError::Store(StoreError::Conflict(msg)) => ApiError::Conflict(msg),
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut messages: Vec<String> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |e| match &e.message {
                    Some(m) => format!("{}: {}", field, m),
                    None => format!("{}: invalid value", field),
                })
            })
            .collect();
        messages.sort();

        ApiError::Validation(messages.join("; "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;
    use validator::Validate;

    #[test]
    fn test_api_error_status_codes() {
        let cases = [
            (ApiError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (ApiError::Conflict("x".into()), StatusCode::CONFLICT),
            (ApiError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (ApiError::Internal("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (
                ApiError::ServiceUnavailable("x".into()),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
        ];
        for (error, status) in cases {
            assert_eq!(error.into_response().status(), status);
        }
    }

    #[test]
    fn test_api_error_display() {
        assert_eq!(
            format!("{}", ApiError::NotFound("test".to_string())),
            "Not found: test"
        );
        assert_eq!(
            format!("{}", ApiError::Validation("test".to_string())),
            "Validation error: test"
        );
    }

    #[test]
    fn test_from_attendance_error() {
        let id = Uuid::new_v4();
        assert!(matches!(
            ApiError::from(AttendanceError::SubjectNotFound(id)),
            ApiError::NotFound(_)
        ));
        assert!(matches!(
            ApiError::from(AttendanceError::AlreadyCheckedIn(id)),
            ApiError::Conflict(_)
        ));
        assert!(matches!(
            ApiError::from(AttendanceError::NoOpenSession(id)),
            ApiError::Conflict(_)
        ));
        assert!(matches!(
            ApiError::from(AttendanceError::PhotoRequired),
            ApiError::Validation(_)
        ));
        assert!(matches!(
            ApiError::from(AttendanceError::FaceServiceUnavailable("down".into())),
            ApiError::ServiceUnavailable(_)
        ));
        assert!(matches!(
            ApiError::from(AttendanceError::Store(StoreError::Backend("boom".into()))),
            ApiError::Internal(_)
        ));
        assert!(matches!(
            ApiError::from(AttendanceError::Store(StoreError::Conflict("dup".into()))),
            ApiError::Conflict(_)
        ));
    }

    #[derive(Validate)]
    struct Reading {
        #[validate(range(min = -90.0, max = 90.0, message = "out of range"))]
        latitude: f64,
    }

    #[test]
    fn test_from_validation_errors() {
        let errors = Reading { latitude: 91.0 }.validate().unwrap_err();
        match ApiError::from(errors) {
            ApiError::Validation(msg) => assert_eq!(msg, "latitude: out of range"),
            other => panic!("Expected Validation error, got {other:?}"),
        }
    }
}
