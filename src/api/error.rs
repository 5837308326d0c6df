//! API error types with structured JSON responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::assistant::AssistantError;
use crate::core_state::CoreError;
use crate::directory::DirectoryError;
use crate::household::HouseholdError;
use crate::models::enums::InvalidEnum;

/// Structured error response body for dashboard clients.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: &'static str,
    pub message: String,
}

/// API-level errors with HTTP status mapping.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Invalid request: {0}")]
    BadRequest(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Assistant unavailable: {0}")]
    BadGateway(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            ApiError::NotFound(detail) => (StatusCode::NOT_FOUND, "NOT_FOUND", detail),
            ApiError::BadRequest(detail) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", detail),
            ApiError::Conflict(detail) => (StatusCode::CONFLICT, "CONFLICT", detail),
            ApiError::BadGateway(detail) => {
                tracing::warn!(detail = %detail, "Assistant backend failed");
                (StatusCode::BAD_GATEWAY, "ASSISTANT_UNAVAILABLE", detail)
            }
            ApiError::Internal(detail) => {
                tracing::error!(detail = %detail, "API internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = ErrorBody {
            error: ErrorDetail { code, message },
        };
        (status, Json(body)).into_response()
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        let message = err.to_string();
        match err {
            CoreError::LockPoisoned | CoreError::Vitals(_) => ApiError::Internal(message),
            CoreError::NotMonitoring | CoreError::NoActiveEpisode => ApiError::Conflict(message),
            CoreError::Household(
                HouseholdError::SubjectNotFound(_) | HouseholdError::DeviceNotFound(_),
            )
            | CoreError::Directory(DirectoryError::NotFound(_)) => ApiError::NotFound(message),
            CoreError::Directory(
                DirectoryError::DuplicateName(_) | DirectoryError::NoCurrentDoctor,
            ) => ApiError::Conflict(message),
            CoreError::Household(_) | CoreError::Directory(_) | CoreError::Records(_) => {
                ApiError::BadRequest(message)
            }
        }
    }
}

impl From<AssistantError> for ApiError {
    fn from(err: AssistantError) -> Self {
        match err {
            AssistantError::SubjectData(_) => ApiError::Internal(err.to_string()),
            _ => ApiError::BadGateway(err.to_string()),
        }
    }
}

impl From<InvalidEnum> for ApiError {
    fn from(err: InvalidEnum) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::vital_sign::{VitalKind, VitalsError};
    use crate::records::RecordsError;
    use http_body_util::BodyExt;

    async fn body_json(response: Response) -> serde_json::Value {
        let body = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn not_monitoring_returns_409() {
        let response = ApiError::from(CoreError::NotMonitoring).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
        let json = body_json(response).await;
        assert_eq!(json["error"]["code"], "CONFLICT");
        assert_eq!(json["error"]["message"], "No device connected for the current subject");
    }

    #[tokio::test]
    async fn internal_error_hides_detail() {
        let response = ApiError::Internal("secret detail".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(response).await;
        assert_eq!(json["error"]["code"], "INTERNAL");
        assert!(!json["error"]["message"].as_str().unwrap().contains("secret"));
    }

    #[test]
    fn domain_errors_map_to_statuses() {
        let cases = [
            (CoreError::Household(HouseholdError::SubjectNotFound(9)), StatusCode::NOT_FOUND),
            (CoreError::Household(HouseholdError::DeviceNotFound(9)), StatusCode::NOT_FOUND),
            (
                CoreError::Household(HouseholdError::InvalidDeviceCode("X".into())),
                StatusCode::BAD_REQUEST,
            ),
            (CoreError::Directory(DirectoryError::NotFound(9)), StatusCode::NOT_FOUND),
            (
                CoreError::Directory(DirectoryError::DuplicateName("Dr. A".into())),
                StatusCode::CONFLICT,
            ),
            (
                CoreError::Records(RecordsError::InvalidTime("25:00".into())),
                StatusCode::BAD_REQUEST,
            ),
            (CoreError::NoActiveEpisode, StatusCode::CONFLICT),
            (CoreError::LockPoisoned, StatusCode::INTERNAL_SERVER_ERROR),
            (
                CoreError::Vitals(VitalsError::DangerUnreachable(VitalKind::HeartRate)),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).into_response().status(), status);
        }
    }

    #[tokio::test]
    async fn assistant_failure_is_bad_gateway() {
        let err = AssistantError::OllamaConnection("http://localhost:11434".into());
        let response = ApiError::from(err).into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let json = body_json(response).await;
        assert_eq!(json["error"]["code"], "ASSISTANT_UNAVAILABLE");
    }

    #[test]
    fn missing_subject_data_is_internal() {
        let err = ApiError::from(AssistantError::SubjectData("Internal lock error".into()));
        assert!(matches!(err, ApiError::Internal(_)));
    }

    #[test]
    fn unknown_flow_is_bad_request() {
        let err: ApiError = "billing"
            .parse::<crate::models::enums::AssistantFlow>()
            .unwrap_err()
            .into();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }
}
