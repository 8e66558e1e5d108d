use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use tracing::{error, info};

use esgscope_common::{Config, JobRecord, Stage};
use esgscope_pipeline::extract::UploadedFile;
use esgscope_pipeline::orchestrator::{run_pipeline, NoopObserver, StageObserver};

use crate::job_store::JobStore;
use crate::AppState;

pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok", "service": "ESGScope"}))
}

/// Publishes the job record at every stage boundary so pollers see progress
/// while the run is still going.
struct JobProgress {
    record: JobRecord,
    store: Arc<dyn JobStore>,
}

#[async_trait]
impl StageObserver for JobProgress {
    async fn on_stage(&mut self, stage: Stage) {
        self.record.advance(stage);
        self.store.set(self.record.clone()).await;
    }
}

/// Buffer the multipart upload, enforcing per-file and total size caps.
async fn collect_files(
    config: &Config,
    multipart: &mut Multipart,
) -> Result<Vec<UploadedFile>, (StatusCode, String)> {
    let mut files = Vec::new();
    let mut total_bytes: u64 = 0;
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                return Err((
                    StatusCode::BAD_REQUEST,
                    format!("Malformed multipart body: {e}"),
                ))
            }
        };
        // Fields without a filename are form noise, not uploads.
        let filename = match field.file_name() {
            Some(name) => name.to_string(),
            None => continue,
        };
        let content_type = field.content_type().map(|c| c.to_string());
        let data = match field.bytes().await {
            Ok(data) => data,
            Err(e) => {
                return Err((
                    StatusCode::BAD_REQUEST,
                    format!("Failed to read {filename}: {e}"),
                ))
            }
        };
        if data.len() as u64 > config.max_file_bytes() {
            return Err((
                StatusCode::PAYLOAD_TOO_LARGE,
                format!("{filename} exceeds max file size."),
            ));
        }
        total_bytes += data.len() as u64;
        if total_bytes > config.max_total_bytes() {
            return Err((
                StatusCode::PAYLOAD_TOO_LARGE,
                "Total upload exceeds max size.".to_string(),
            ));
        }
        files.push(UploadedFile {
            filename,
            data: data.to_vec(),
            content_type,
        });
    }
    if files.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "No files uploaded.".to_string()));
    }
    Ok(files)
}

fn preview_of(raw_text: &str, max_chars: usize) -> String {
    raw_text.chars().take(max_chars).collect()
}

async fn run_job(state: Arc<AppState>, record: JobRecord, files: Vec<UploadedFile>) {
    let job_id = record.job_id.clone();
    let mut observer = JobProgress {
        record,
        store: state.store.clone(),
    };
    match run_pipeline(&files, &state.deps, &job_id, &mut observer).await {
        Ok(outcome) => {
            let mut record = observer.record;
            record.complete(
                outcome.output,
                preview_of(&outcome.raw_text, state.config.preview_chars),
            );
            state.store.set(record).await;
            info!(job_id, "job complete");
        }
        Err(e) => {
            let mut record = observer.record;
            error!(job_id, error = %e, "job failed");
            record.fail("Pipeline failed.", e.to_string());
            state.store.set(record).await;
        }
    }
}

/// Accept an upload, create the job record, and run the pipeline in the
/// background. Returns immediately; clients poll `/api/jobs/{id}`.
pub async fn extract(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> impl IntoResponse {
    let files = match collect_files(&state.config, &mut multipart).await {
        Ok(files) => files,
        Err((status, message)) => {
            return (status, Json(serde_json::json!({"error": message}))).into_response()
        }
    };

    let record = JobRecord::new(files.iter().map(|f| f.filename.clone()).collect());
    let job_id = record.job_id.clone();
    state.store.set(record.clone()).await;
    info!(job_id, file_count = files.len(), "job accepted");

    tokio::spawn(run_job(state.clone(), record, files));

    (
        StatusCode::ACCEPTED,
        Json(serde_json::json!({"job_id": job_id, "status": "queued"})),
    )
        .into_response()
}

/// Run the pipeline inline and return the terminal record shape. Useful for
/// scripted clients that would rather wait than poll.
pub async fn extract_sync(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> impl IntoResponse {
    let files = match collect_files(&state.config, &mut multipart).await {
        Ok(files) => files,
        Err((status, message)) => {
            return (status, Json(serde_json::json!({"error": message}))).into_response()
        }
    };

    let mut record = JobRecord::new(files.iter().map(|f| f.filename.clone()).collect());
    match run_pipeline(&files, &state.deps, &record.job_id, &mut NoopObserver).await {
        Ok(outcome) => {
            record.complete(
                outcome.output,
                preview_of(&outcome.raw_text, state.config.preview_chars),
            );
            Json(record).into_response()
        }
        Err(e) => {
            error!(job_id = record.job_id, error = %e, "sync job failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({
                    "error": "Pipeline failed.",
                    "detail": e.to_string(),
                })),
            )
                .into_response()
        }
    }
}

pub async fn job_status(
    State(state): State<Arc<AppState>>,
    Path(job_id): Path<String>,
) -> impl IntoResponse {
    match state.store.get(&job_id).await {
        Some(record) => Json(record).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({"error": "Job not found."})),
        )
            .into_response(),
    }
}
