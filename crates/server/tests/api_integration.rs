//! Integration tests for the HTTP API surface.
//!
//! The router is exercised in-process with `tower::ServiceExt::oneshot`;
//! source adapters and LLM providers are replaced with canned
//! implementations so no network is involved.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use lernwerk_core::config::{Config, LimitsConfig, LlmConfig, ServerConfig, StorageConfig};
use lernwerk_core::{Curriculum, ExtractedContent, Module, PipelineError, SourceDescriptor};
use lernwerk_ingest::SourceAdapter;
use lernwerk_llm::{CurriculumDecomposer, LlmError, LlmProvider, Message, NoteSynthesizer};
use lernwerk_server::jobs::JobRegistry;
use lernwerk_server::logs::LogBroadcaster;
use lernwerk_server::router::build_router;
use lernwerk_server::state::AppState;
use lernwerk_store::ContentStore;

// ── Canned capabilities ───────────────────────────────────────────

/// Adapter that always returns the same extracted content.
struct StaticAdapter {
    content: ExtractedContent,
}

impl StaticAdapter {
    fn transcript() -> Self {
        Self {
            content: ExtractedContent {
                text: "A thorough walkthrough of merge sort and quicksort, covering \
                       divide and conquer, recurrence relations, pivot selection, \
                       stability, and in-place partitioning, with worked examples."
                    .repeat(3),
                title: "Sorting Algorithms Deep Dive".into(),
                duration_seconds: Some(1260),
                origin_url: Some("https://studies.example/sorting".into()),
            },
        }
    }
}

#[async_trait]
impl SourceAdapter for StaticAdapter {
    async fn extract(
        &self,
        _source: &SourceDescriptor,
    ) -> Result<ExtractedContent, PipelineError> {
        Ok(self.content.clone())
    }
}

/// Adapter that fails the way a private video does.
struct UnavailableAdapter;

#[async_trait]
impl SourceAdapter for UnavailableAdapter {
    async fn extract(
        &self,
        _source: &SourceDescriptor,
    ) -> Result<ExtractedContent, PipelineError> {
        Err(PipelineError::UnavailableSource(
            "video is private, deleted, or unavailable".into(),
        ))
    }
}

/// Provider that returns a fixed reply, optionally after a delay so a
/// test can observe a job while it is still in flight.
#[derive(Debug)]
struct CannedProvider {
    reply: String,
    delay: Duration,
}

impl CannedProvider {
    fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            delay: Duration::ZERO,
        }
    }

    fn with_delay(reply: impl Into<String>, delay: Duration) -> Self {
        Self {
            reply: reply.into(),
            delay,
        }
    }
}

#[async_trait]
impl LlmProvider for CannedProvider {
    async fn complete(
        &self,
        _messages: Vec<Message>,
        _temperature: f32,
        _max_tokens: u32,
    ) -> Result<String, LlmError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Ok(self.reply.clone())
    }
}

const NOTE_BODY: &str = "# Sorting Algorithms\n\nMerge sort splits the input, sorts each \
     half, and merges. Quicksort partitions around a pivot. Both run in O(n log n) on \
     average; merge sort is stable, quicksort is usually in-place.";

// ── Harness ───────────────────────────────────────────────────────

fn test_config(data_dir: &std::path::Path) -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".into(),
            port: 0,
        },
        storage: StorageConfig {
            data_dir: data_dir.to_path_buf(),
        },
        llm: LlmConfig {
            provider: "gemini".into(),
            api_key: None,
            model: "canned".into(),
            fast_model: "canned".into(),
            base_url: String::new(),
            temperature: 0.4,
            max_tokens: 1024,
        },
        limits: LimitsConfig {
            max_upload_bytes: 1024,
            min_input_chars: 50,
            stage_timeout_secs: 30,
            log_grace_secs: 5,
        },
    }
}

struct Harness {
    state: Arc<AppState>,
    _data_dir: tempfile::TempDir,
}

impl Harness {
    fn build(
        youtube: Box<dyn SourceAdapter>,
        synth: Box<dyn LlmProvider>,
        decomp: Box<dyn LlmProvider>,
        chat: Box<dyn LlmProvider>,
    ) -> Self {
        let data_dir = tempfile::tempdir().expect("tempdir");
        let config = test_config(data_dir.path());
        let store = ContentStore::new(&config.storage.data_dir).expect("store");
        let synthesizer = NoteSynthesizer::new(
            synth,
            config.llm.temperature,
            config.llm.max_tokens,
            config.limits.min_input_chars,
        );
        let decomposer = CurriculumDecomposer::new(decomp, config.llm.max_tokens);

        let state = Arc::new(AppState {
            logs: LogBroadcaster::new(Duration::from_secs(config.limits.log_grace_secs)),
            jobs: JobRegistry::new(),
            youtube,
            course: Box::new(StaticAdapter::transcript()),
            paper: Box::new(StaticAdapter::transcript()),
            synthesizer,
            decomposer,
            chat,
            store,
            config,
        });
        Self {
            state,
            _data_dir: data_dir,
        }
    }

    fn default() -> Self {
        Self::build(
            Box::new(StaticAdapter::transcript()),
            Box::new(CannedProvider::new(NOTE_BODY)),
            Box::new(CannedProvider::new("[]")),
            Box::new(CannedProvider::new("Happy to help with that topic.")),
        )
    }

    fn router(&self) -> axum::Router {
        build_router(Arc::clone(&self.state))
    }
}

async fn request(
    app: &axum::Router,
    method: &str,
    path: &str,
    body: Option<Value>,
) -> (StatusCode, axum::http::HeaderMap, Value) {
    let mut builder = Request::builder().method(method).uri(path);
    let body = match body {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    let response = app
        .clone()
        .oneshot(builder.body(body).expect("request"))
        .await
        .expect("response");
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, headers, json)
}

/// Poll /api/v1/content until `want` notes exist or the deadline passes.
async fn wait_for_notes(app: &axum::Router, want: usize) -> Vec<Value> {
    for _ in 0..100 {
        let (status, _, body) = request(app, "GET", "/api/v1/content", None).await;
        assert_eq!(status, StatusCode::OK);
        let notes = body.as_array().cloned().unwrap_or_default();
        if notes.len() >= want {
            return notes;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("expected {want} notes to appear");
}

// ── Tests ─────────────────────────────────────────────────────────

#[tokio::test]
async fn health_reports_ok() {
    let harness = Harness::default();
    let (status, _, body) = request(&harness.router(), "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn generate_returns_notes_and_job_id_header() {
    let harness = Harness::default();
    let app = harness.router();

    let (status, headers, body) = request(
        &app,
        "POST",
        "/generate",
        Some(json!({"url": "https://youtu.be/dQw4w9WgXcQ", "video_type": "dsa"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["notes"].as_str().unwrap().contains("Merge sort"));
    assert_eq!(body["metadata"]["title"], "Sorting Algorithms Deep Dive");
    assert_eq!(body["metadata"]["duration"], 1260);

    let job_id = headers
        .get("x-job-id")
        .and_then(|v| v.to_str().ok())
        .expect("x-job-id header");
    Uuid::parse_str(job_id).expect("header is a uuid");

    // The note was persisted and is listable.
    let notes = wait_for_notes(&app, 1).await;
    assert_eq!(notes[0]["source_type"], "youtube");
}

#[tokio::test]
async fn generate_maps_unavailable_source_to_bad_gateway() {
    let harness = Harness::build(
        Box::new(UnavailableAdapter),
        Box::new(CannedProvider::new(NOTE_BODY)),
        Box::new(CannedProvider::new("[]")),
        Box::new(CannedProvider::new("ok")),
    );

    let app = harness.router();
    let (status, headers, body) = request(
        &app,
        "POST",
        "/generate",
        Some(json!({"url": "https://youtu.be/gone", "video_type": "stanford"})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body["error"].as_str().unwrap().contains("unavailable"));

    // The failure still identifies its job for log-stream correlation.
    let job_id = headers
        .get("x-job-id")
        .and_then(|v| v.to_str().ok())
        .expect("x-job-id header on failure");
    Uuid::parse_str(job_id).expect("header is a uuid");

    // The failed job persisted nothing.
    let (_, _, notes) = request(&app, "GET", "/api/v1/content", None).await;
    assert_eq!(notes.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn curriculum_analyze_persists_modules() {
    let modules_json = json!([
        {"title": "Foundations", "description": "Basics first", "key_concepts": ["arrays"]},
        {"title": "Recursion", "description": "Divide and conquer", "key_concepts": []}
    ])
    .to_string();
    let harness = Harness::build(
        Box::new(StaticAdapter::transcript()),
        Box::new(CannedProvider::new(NOTE_BODY)),
        Box::new(CannedProvider::new(format!("```json\n{modules_json}\n```"))),
        Box::new(CannedProvider::new("ok")),
    );
    let app = harness.router();

    let (status, _, body) = request(
        &app,
        "POST",
        "/api/v1/curriculum/analyze",
        Some(json!({"url": "https://studies.example/course"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let content_id = body["content_id"].as_str().expect("content_id");
    let content_id = Uuid::parse_str(content_id).expect("uuid");
    let modules = body["modules"].as_array().expect("modules");
    assert_eq!(modules.len(), 2);
    assert_eq!(modules[0]["module_number"], 1);
    assert_eq!(modules[1]["title"], "Recursion");

    // Persisted before the response returned.
    let stored = harness
        .state
        .store
        .get_curriculum(content_id)
        .expect("read")
        .expect("curriculum exists");
    assert_eq!(stored.modules.len(), 2);
}

fn seed_curriculum(harness: &Harness) -> Curriculum {
    let curriculum = Curriculum {
        content_id: Uuid::new_v4(),
        title: "Algorithms 101".into(),
        source_url: "https://studies.example/course".into(),
        created_at: chrono::Utc::now(),
        modules: vec![Module {
            module_number: 1,
            title: "Graph Traversal".into(),
            description: "BFS and DFS from first principles".into(),
            key_concepts: vec!["bfs".into(), "dfs".into()],
        }],
    };
    harness.state.store.put_curriculum(&curriculum).expect("seed");
    curriculum
}

#[tokio::test]
async fn duplicate_module_trigger_is_rejected_while_in_flight() {
    // Slow synthesis keeps the first job in flight while the duplicate
    // request arrives.
    let harness = Harness::build(
        Box::new(StaticAdapter::transcript()),
        Box::new(CannedProvider::with_delay(
            NOTE_BODY,
            Duration::from_millis(300),
        )),
        Box::new(CannedProvider::new("[]")),
        Box::new(CannedProvider::new("ok")),
    );
    let app = harness.router();
    let curriculum = seed_curriculum(&harness);

    let trigger = json!({
        "curriculum_id": curriculum.content_id,
        "module_number": 1,
        "module_title": "Graph Traversal",
        "module_description": "BFS and DFS from first principles"
    });

    let (first, _, first_body) = request(
        &app,
        "POST",
        "/api/v1/curriculum/generate-module",
        Some(trigger.clone()),
    )
    .await;
    assert_eq!(first, StatusCode::ACCEPTED);
    Uuid::parse_str(first_body["job_id"].as_str().unwrap()).expect("job id");

    let (second, _, second_body) = request(
        &app,
        "POST",
        "/api/v1/curriculum/generate-module",
        Some(trigger.clone()),
    )
    .await;
    assert_eq!(second, StatusCode::CONFLICT);
    assert!(second_body["error"].as_str().unwrap().contains("already"));

    // Exactly one note comes out of the pair.
    let notes = wait_for_notes(&app, 1).await;
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0]["note_type"], "curriculum_module");

    // Once the first job finishes its key is released and a re-trigger
    // is accepted again. The key is dropped just after the note lands,
    // so give the worker a moment to finish its bookkeeping.
    tokio::time::sleep(Duration::from_millis(50)).await;
    let (third, _, _) = request(
        &app,
        "POST",
        "/api/v1/curriculum/generate-module",
        Some(trigger),
    )
    .await;
    assert_eq!(third, StatusCode::ACCEPTED);
}

#[tokio::test]
async fn module_resolves_by_title_when_number_is_omitted() {
    let harness = Harness::default();
    let app = harness.router();
    let curriculum = seed_curriculum(&harness);

    let (status, _, body) = request(
        &app,
        "POST",
        "/api/v1/curriculum/generate-module",
        Some(json!({
            "curriculum_id": curriculum.content_id,
            "module_title": "Graph Traversal"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert!(body["message"].as_str().unwrap().contains("Graph Traversal"));
}

#[tokio::test]
async fn module_trigger_for_unknown_curriculum_is_not_found() {
    let harness = Harness::default();
    let (status, _, _) = request(
        &harness.router(),
        "POST",
        "/api/v1/curriculum/generate-module",
        Some(json!({
            "curriculum_id": Uuid::new_v4(),
            "module_number": 1,
            "module_title": "Anything"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

fn multipart_upload(filename: &str, payload: &[u8]) -> Request<Body> {
    let boundary = "lernwerk-test-boundary";
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; \
             filename=\"{filename}\"\r\nContent-Type: application/pdf\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(payload);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri("/api/v1/research/upload")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .expect("request")
}

#[tokio::test]
async fn oversized_upload_is_rejected_before_any_job_exists() {
    let harness = Harness::default();
    let app = harness.router();

    // One byte over the configured 1 KiB cap.
    let payload = vec![b'x'; 1025];
    let response = app
        .clone()
        .oneshot(multipart_upload("thesis.pdf", &payload))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);

    // No job was created for the rejected upload, so nothing ever lands
    // in the store.
    tokio::time::sleep(Duration::from_millis(50)).await;
    let (_, _, notes) = request(&app, "GET", "/api/v1/content", None).await;
    assert_eq!(notes.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn non_pdf_upload_is_unsupported() {
    let harness = Harness::default();
    let response = harness
        .router()
        .oneshot(multipart_upload("notes.docx", b"not a pdf"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
}

#[tokio::test]
async fn accepted_upload_yields_research_note() {
    let harness = Harness::default();
    let app = harness.router();

    let response = app
        .clone()
        .oneshot(multipart_upload("paper.pdf", b"%PDF-1.4 tiny"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    let notes = wait_for_notes(&app, 1).await;
    assert_eq!(notes[0]["note_type"], "research");
}

#[tokio::test]
async fn content_listing_filters_by_source_type() {
    let harness = Harness::default();
    let app = harness.router();

    // One youtube note, one paper note.
    let (status, _, _) = request(
        &app,
        "POST",
        "/generate",
        Some(json!({"url": "https://youtu.be/abc12345", "video_type": "podcast"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let (status, _, _) = request(
        &app,
        "POST",
        "/api/v1/research/process-url",
        Some(json!({"url": "https://arxiv.example/paper.pdf"})),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);
    wait_for_notes(&app, 2).await;

    let (_, _, filtered) = request(
        &app,
        "GET",
        "/api/v1/content?source_type=youtube",
        None,
    )
    .await;
    let filtered = filtered.as_array().unwrap();
    assert_eq!(filtered.len(), 1);
    assert_eq!(filtered[0]["source_type"], "youtube");

    // Full note fetch by id round-trips the body.
    let id = filtered[0]["id"].as_str().unwrap();
    let (status, _, note) =
        request(&app, "GET", &format!("/api/v1/content/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(note["body"].as_str().unwrap().contains("Merge sort"));
}

#[tokio::test]
async fn unknown_content_id_is_not_found() {
    let harness = Harness::default();
    let (status, _, body) = request(
        &harness.router(),
        "GET",
        &format!("/api/v1/content/{}", Uuid::new_v4()),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("Not found"));
}

#[tokio::test]
async fn chat_answers_with_requested_agent() {
    let harness = Harness::build(
        Box::new(StaticAdapter::transcript()),
        Box::new(CannedProvider::new(NOTE_BODY)),
        Box::new(CannedProvider::new("[]")),
        Box::new(CannedProvider::new(
            "Try these:\n- Review your sorting notes tonight\n- Redo the recursion module tomorrow",
        )),
    );

    let (status, _, body) = request(
        &harness.router(),
        "POST",
        "/api/v1/agents/chat",
        Some(json!({"message": "Plan my week", "agent_type": "coach"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["agent_type"], "coach");
    let suggestions = body["suggestions"].as_array().expect("coach suggestions");
    assert_eq!(suggestions.len(), 2);
    assert!(suggestions[0]
        .as_str()
        .unwrap()
        .contains("sorting notes"));
}

#[tokio::test]
async fn log_stream_for_unknown_job_is_not_found() {
    let harness = Harness::default();
    let (status, _, _) = request(
        &harness.router(),
        "GET",
        &format!("/logs/stream?job_id={}", Uuid::new_v4()),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
