use axum::{
    extract::multipart::{MultipartError, MultipartRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::classifier::ClassifierError;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("Upload error: {0}")]
    Upload(#[from] MultipartError),

    #[error("Not a multipart upload: {0}")]
    NotMultipart(#[from] MultipartRejection),

    #[error("Model not available: {0}")]
    ModelUnavailable(String),

    #[error("Could not decode image: {0}")]
    Decode(String),

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ClassifierError> for ApiError {
    fn from(err: ClassifierError) -> Self {
        match err {
            ClassifierError::ModelNotFound(_) | ClassifierError::Load(_) => {
                ApiError::ModelUnavailable(err.to_string())
            }
            ClassifierError::Decode(e) => ApiError::Decode(e.to_string()),
            ClassifierError::Inference(msg) => ApiError::Inference(msg),
            ClassifierError::Io(e) => ApiError::Io(e),
        }
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::NotMultipart(_) => StatusCode::BAD_REQUEST,
            ApiError::Upload(e) => e.status(),
            ApiError::ModelUnavailable(_)
            | ApiError::Decode(_)
            | ApiError::Inference(_)
            | ApiError::Internal(_)
            | ApiError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error_message = match &self {
            ApiError::Validation(_) => {
                tracing::warn!("Rejected upload: {}", self);
                self.to_string()
            }
            ApiError::Upload(e) => {
                tracing::warn!("Multipart error: {}", self);
                e.body_text()
            }
            ApiError::NotMultipart(_) => {
                tracing::warn!("Rejected upload: {}", self);
                "No file provided. Expected a multipart/form-data body with field \"file\""
                    .to_string()
            }
            ApiError::ModelUnavailable(_) => {
                tracing::error!("{}", self);
                "Model not available".to_string()
            }
            ApiError::Decode(_) | ApiError::Inference(_) => {
                tracing::error!("Prediction failed: {}", self);
                self.to_string()
            }
            ApiError::Internal(_) | ApiError::Io(_) => {
                tracing::error!("Internal error: {}", self);
                "Internal server error".to_string()
            }
        };

        let body = Json(json!({ "error": error_message }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_error_kind() {
        assert_eq!(
            ApiError::Validation("no file".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::ModelUnavailable("gone".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::Decode("bad".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn classifier_errors_map_to_api_errors() {
        let err: ApiError = ClassifierError::ModelNotFound("a.onnx".into()).into();
        assert!(matches!(err, ApiError::ModelUnavailable(_)));

        let err: ApiError = ClassifierError::Inference("shape".into()).into();
        assert!(matches!(err, ApiError::Inference(_)));

        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk");
        let err: ApiError = ClassifierError::Io(io).into();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn upload_and_internal_errors_keep_their_status() {
        let response = ApiError::Internal("secret path /var/x".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let response = ApiError::Validation("Empty filename".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
