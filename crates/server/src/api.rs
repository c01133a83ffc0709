//! HTTP handlers for the generation, curriculum, research, content, and
//! agent endpoints.

use std::sync::Arc;

use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::response::{AppendHeaders, IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use lernwerk_core::{JobKind, Module, NoteType, PipelineError, SourceDescriptor};
use lernwerk_store::NoteSummary;

use crate::agents;
use crate::jobs::{self, JobOutcome};
use crate::state::AppState;

// ── Error mapping ─────────────────────────────────────────────────

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Wrapper so handlers can `?` on `PipelineError`.
pub struct ApiError(pub PipelineError);

impl From<PipelineError> for ApiError {
    fn from(e: PipelineError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (
            status,
            Json(ErrorResponse {
                error: self.0.to_string(),
            }),
        )
            .into_response()
    }
}

// ── Health ────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

// ── Synchronous generation ────────────────────────────────────────

#[derive(Deserialize)]
pub struct GenerateRequest {
    pub url: String,
    pub video_type: String,
}

#[derive(Serialize)]
pub struct GenerateMetadata {
    pub title: String,
    pub duration: u64,
}

#[derive(Serialize)]
pub struct GenerateResponse {
    pub notes: String,
    pub metadata: GenerateMetadata,
}

/// POST /generate — blocks until the job is terminal. The job id travels
/// back in the `X-Job-Id` header so clients can follow `/logs/stream`.
pub async fn generate(
    State(state): State<Arc<AppState>>,
    Json(request): Json<GenerateRequest>,
) -> Response {
    info!(url = %request.url, video_type = %request.video_type, "generation request");
    let note_type = NoteType::from_client_str(&request.video_type);
    let handle = jobs::submit(
        state,
        JobKind::NoteGeneration,
        SourceDescriptor::YoutubeUrl(request.url),
        note_type,
    );
    // The id travels back on success and failure alike, so a client
    // already watching /logs/stream can match either outcome to its job.
    let headers = AppendHeaders([("x-job-id", handle.id.to_string())]);

    match handle.wait().await {
        Ok(JobOutcome::Note {
            note,
            duration_seconds,
        }) => (
            headers,
            Json(GenerateResponse {
                notes: note.body,
                metadata: GenerateMetadata {
                    title: note.title,
                    duration: duration_seconds.unwrap_or(0),
                },
            }),
        )
            .into_response(),
        Ok(JobOutcome::Curriculum(_)) => (
            headers,
            ApiError(PipelineError::Generation(
                "note-generation job produced a curriculum".into(),
            )),
        )
            .into_response(),
        Err(e) => (headers, ApiError(e)).into_response(),
    }
}

// ── Curriculum ────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct CurriculumRequest {
    pub url: String,
}

#[derive(Serialize)]
pub struct CurriculumResponse {
    pub content_id: Uuid,
    pub modules: Vec<Module>,
}

/// POST /api/v1/curriculum/analyze — synchronous; the decomposed
/// curriculum is persisted before the response returns.
pub async fn analyze_curriculum(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CurriculumRequest>,
) -> Result<Json<CurriculumResponse>, ApiError> {
    info!(url = %request.url, "curriculum analysis request");
    let handle = jobs::submit(
        state,
        JobKind::CurriculumAnalysis,
        SourceDescriptor::CourseUrl(request.url),
        NoteType::CurriculumModule,
    );

    match handle.wait().await? {
        JobOutcome::Curriculum(curriculum) => Ok(Json(CurriculumResponse {
            content_id: curriculum.content_id,
            modules: curriculum.modules,
        })),
        JobOutcome::Note { .. } => Err(ApiError(PipelineError::Generation(
            "curriculum job produced a note".into(),
        ))),
    }
}

#[derive(Deserialize)]
pub struct ModuleGenerationRequest {
    pub curriculum_id: Uuid,
    /// Optional: resolved by title match when omitted (the browser client
    /// sends only title and description).
    pub module_number: Option<u32>,
    pub module_title: String,
    #[serde(default)]
    pub module_description: String,
}

#[derive(Serialize)]
pub struct JobAck {
    pub message: String,
    pub job_id: Uuid,
}

/// POST /api/v1/curriculum/generate-module — async; idempotent per
/// `(curriculum_id, module_number)` while a job is in flight.
pub async fn generate_module(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ModuleGenerationRequest>,
) -> Result<(StatusCode, Json<JobAck>), ApiError> {
    let curriculum = state
        .store
        .get_curriculum(request.curriculum_id)
        .map_err(|e| PipelineError::Store(e.to_string()))?
        .ok_or_else(|| {
            PipelineError::NotFound(format!("curriculum {}", request.curriculum_id))
        })?;

    let module = match request.module_number {
        Some(n) => curriculum.module(n),
        None => curriculum.module_by_title(&request.module_title),
    }
    .ok_or_else(|| {
        PipelineError::InvalidInput(format!(
            "no module matching '{}' in curriculum {}",
            request.module_title, request.curriculum_id
        ))
    })?
    .clone();

    let handle = jobs::submit_module(state, &curriculum, &module)?;
    info!(
        curriculum_id = %request.curriculum_id,
        module_number = module.module_number,
        job_id = %handle.id,
        "module generation started"
    );
    Ok((
        StatusCode::ACCEPTED,
        Json(JobAck {
            message: format!("Generating notes for {}...", module.title),
            job_id: handle.id,
        }),
    ))
}

// ── Research ingest ───────────────────────────────────────────────

#[derive(Deserialize)]
pub struct ResearchUrlRequest {
    pub url: String,
}

/// POST /api/v1/research/process-url — async ingest of a paper URL.
pub async fn process_research_url(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ResearchUrlRequest>,
) -> Result<(StatusCode, Json<JobAck>), ApiError> {
    info!(url = %request.url, "research URL submitted");
    let handle = jobs::submit(
        state,
        JobKind::ResearchIngest,
        SourceDescriptor::PaperUrl(request.url),
        NoteType::Research,
    );
    Ok((
        StatusCode::ACCEPTED,
        Json(JobAck {
            message: "Research paper processing started".into(),
            job_id: handle.id,
        }),
    ))
}

/// POST /api/v1/research/upload — multipart PDF upload, ≤ 10 MB. The
/// size check runs before any job exists.
pub async fn upload_research_paper(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<JobAck>), ApiError> {
    let limit = state.config.limits.max_upload_bytes;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| PipelineError::InvalidInput(format!("bad multipart body: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field
            .file_name()
            .unwrap_or("upload.pdf")
            .to_string();
        if !filename.ends_with(".pdf") {
            return Err(ApiError(PipelineError::UnsupportedFormat(
                "only PDF files are accepted".into(),
            )));
        }
        let bytes = field
            .bytes()
            .await
            .map_err(|e| PipelineError::InvalidInput(format!("failed to read upload: {e}")))?
            .to_vec();
        if bytes.len() > limit {
            return Err(ApiError(PipelineError::PayloadTooLarge {
                size: bytes.len(),
                limit,
            }));
        }

        info!(filename = %filename, size = bytes.len(), "paper uploaded");
        let handle = jobs::submit(
            state,
            JobKind::ResearchIngest,
            SourceDescriptor::PaperUpload { filename, bytes },
            NoteType::Research,
        );
        return Ok((
            StatusCode::ACCEPTED,
            Json(JobAck {
                message: "Paper uploaded and processing started".into(),
                job_id: handle.id,
            }),
        ));
    }

    Err(ApiError(PipelineError::InvalidInput(
        "multipart body has no 'file' field".into(),
    )))
}

// ── Content listing ───────────────────────────────────────────────

#[derive(Deserialize)]
pub struct ContentQuery {
    pub source_type: Option<String>,
}

pub async fn list_content(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ContentQuery>,
) -> Result<Json<Vec<NoteSummary>>, ApiError> {
    let notes = state
        .store
        .list_notes(query.source_type.as_deref())
        .map_err(|e| PipelineError::Store(e.to_string()))?;
    Ok(Json(notes))
}

pub async fn get_content(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<lernwerk_core::Note>, ApiError> {
    let note = state
        .store
        .get_note(id)
        .map_err(|e| PipelineError::Store(e.to_string()))?
        .ok_or_else(|| PipelineError::NotFound(format!("note {id}")))?;
    Ok(Json(note))
}

// ── Agent chat ────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct ChatRequest {
    pub message: String,
    pub agent_type: Option<String>,
}

/// POST /api/v1/agents/chat — stateless per call, outside the pipeline.
pub async fn chat(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<agents::ChatReply>, ApiError> {
    let reply = agents::chat(
        state.chat.as_ref(),
        &request.message,
        request.agent_type.as_deref(),
    )
    .await?;
    Ok(Json(reply))
}
