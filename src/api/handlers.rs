use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde_json::json;
use std::sync::Arc;

use crate::api::upload::{read_file_field, validate_upload, ScratchFile, FILE_FIELD};
use crate::api::AppState;
use crate::classifier::{label_table, preprocess, ClassifierError, Prediction, BILL_LABELS};
use crate::error::ApiError;

fn missing_file() -> ApiError {
    ApiError::Validation(format!("No file provided. Expected field: \"{}\"", FILE_FIELD))
}

pub async fn predict(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Prediction>, ApiError> {
    let start_time = Utc::now();
    let mut multipart = multipart?;

    let upload = read_file_field(&mut multipart).await?.ok_or_else(missing_file)?;
    let extension = validate_upload(&upload, &state.config.allowed_extensions)?;
    tracing::info!("Received {} ({} bytes)", upload.filename, upload.data.len());

    let scratch = ScratchFile::create(&state.config.upload_dir, &extension, &upload.data).await?;

    let classifier = state.model.get_or_load().await?;

    let image_size = state.config.image_size;
    let prediction = tokio::task::spawn_blocking(move || -> Result<Prediction, ClassifierError> {
        let image = preprocess::decode_file(scratch.path())?;
        let input = preprocess::to_input_tensor(&image, image_size);
        let probabilities = classifier.predict(input)?;
        Prediction::from_probabilities(&probabilities)
    })
    .await
    .map_err(|e| ApiError::Internal(format!("prediction task failed: {}", e)))??;

    let duration_ms = (Utc::now() - start_time).num_milliseconds().max(0);
    tracing::info!(
        "Predicted {} (class {}, confidence {:.2}%) in {}ms",
        prediction.label,
        prediction.class_index,
        prediction.confidence * 100.0,
        duration_ms
    );

    Ok(Json(prediction))
}

pub async fn test_upload(
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let content_length = headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok());
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-");
    tracing::info!(
        "Test upload: content-type {}, content-length {:?}",
        content_type,
        content_length
    );

    let mut multipart = multipart?;
    let upload = read_file_field(&mut multipart).await?.ok_or_else(missing_file)?;
    tracing::info!("Test upload received {}", upload.filename);

    Ok(Json(json!({
        "status": "ok",
        "filename": upload.filename,
        "size": content_length.unwrap_or(upload.data.len() as u64),
    })))
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "model_loaded": state.model.is_loaded(),
        "message": "Bill recognition API ready",
        "max_content_length": state.config.max_content_length,
    }))
}

pub async fn model_info(State(state): State<Arc<AppState>>) -> Response {
    match state.model.get() {
        Some(classifier) => Json(json!({
            "model_loaded": true,
            "input_shape": classifier.input_shape(),
            "output_shape": classifier.output_shape(),
            "classes": BILL_LABELS.len(),
            "labels": label_table(),
        }))
        .into_response(),
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "model_loaded": false,
                "message": "Model not loaded",
            })),
        )
            .into_response(),
    }
}
