use axum::Json;
use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use futures::StreamExt;
use futures::stream;
use serde::Serialize;

use crate::application::services::{AudioUpload, EncounterSummary};
use crate::domain::{ModelSize, TranscriptSegment};
use crate::presentation::handlers::error_response;
use crate::presentation::state::AppState;

#[derive(Debug, Serialize)]
pub struct SegmentResponse {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct UploadAudioResponse {
    pub text: String,
    pub summary: String,
    pub language: String,
    pub processing_time: f64,
    pub segments: Vec<SegmentResponse>,
}

impl From<TranscriptSegment> for SegmentResponse {
    fn from(segment: TranscriptSegment) -> Self {
        Self {
            start: segment.start,
            end: segment.end,
            text: segment.text,
        }
    }
}

impl From<EncounterSummary> for UploadAudioResponse {
    fn from(encounter: EncounterSummary) -> Self {
        let transcription = encounter.transcription;
        Self {
            text: transcription.full_text,
            summary: encounter.summary,
            language: transcription.detected_language,
            processing_time: transcription.elapsed_seconds,
            segments: transcription
                .segments
                .into_iter()
                .map(SegmentResponse::from)
                .collect(),
        }
    }
}

#[tracing::instrument(skip(state, multipart))]
pub async fn upload_audio_handler(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    let mut multipart = match multipart {
        Ok(multipart) => multipart,
        Err(rejection) => {
            tracing::warn!(error = %rejection, "Rejected non-multipart upload");
            return error_response(StatusCode::BAD_REQUEST, rejection.body_text());
        }
    };
    let mut file: Option<(String, Bytes)> = None;
    let mut model_size = ModelSize::default().to_string();

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read multipart");
                return error_response(
                    StatusCode::BAD_REQUEST,
                    format!("Failed to read multipart: {}", e),
                );
            }
        };

        match field.name().map(str::to_owned).as_deref() {
            Some("file") => {
                let filename = field.file_name().unwrap_or_default().to_string();
                match field.bytes().await {
                    Ok(data) => file = Some((filename, data)),
                    Err(e) => {
                        tracing::warn!(error = %e, "Failed to read file bytes");
                        return error_response(
                            StatusCode::BAD_REQUEST,
                            format!("Failed to read file: {}", e),
                        );
                    }
                }
            }
            Some("model_size") => match field.text().await {
                Ok(value) => model_size = value,
                Err(e) => {
                    return error_response(
                        StatusCode::BAD_REQUEST,
                        format!("Failed to read model_size: {}", e),
                    );
                }
            },
            _ => {}
        }
    }

    let Some((filename, data)) = file else {
        tracing::warn!("Upload request with no file");
        return error_response(StatusCode::BAD_REQUEST, "No file uploaded");
    };

    tracing::debug!(filename = %filename, bytes = data.len(), "Audio upload received");

    let upload = AudioUpload {
        filename,
        model_size,
        data: stream::iter([Ok::<Bytes, std::io::Error>(data)]).boxed(),
    };

    match state.ingestion_service.process(upload).await {
        Ok(encounter) => {
            (StatusCode::OK, Json(UploadAudioResponse::from(encounter))).into_response()
        }
        Err(e) if e.is_client_error() => error_response(StatusCode::BAD_REQUEST, e.to_string()),
        Err(e) => error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Error while processing audio: {}", e),
        ),
    }
}
