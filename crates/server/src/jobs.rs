//! Job Orchestrator — drives each submission through the pipeline state
//! machine, publishing one progress line per transition.
//!
//! Every job runs as an independent tokio task; nothing serializes
//! unrelated jobs against each other. The only cross-job coordination is
//! the in-flight `(content_id, module_number)` key set, which makes
//! module-generation triggers idempotent while one is running.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use tokio::sync::oneshot;
use tracing::{error, info};
use uuid::Uuid;

use lernwerk_core::{
    Curriculum, ExtractedContent, Job, JobKind, JobStatus, Module, Note, NoteType, PipelineError,
    SourceDescriptor,
};

use crate::state::AppState;

pub type ModuleKey = (Uuid, u32);

/// What a completed job hands back to a synchronous caller.
pub enum JobOutcome {
    Note {
        note: Note,
        duration_seconds: Option<u64>,
    },
    Curriculum(Curriculum),
}

/// Awaitable handle returned by `submit`. The synchronous endpoints await
/// it; fire-and-forget endpoints drop it after reading the id.
pub struct JobHandle {
    pub id: Uuid,
    done: oneshot::Receiver<Result<JobOutcome, PipelineError>>,
}

impl JobHandle {
    /// Block until the job is terminal.
    pub async fn wait(self) -> Result<JobOutcome, PipelineError> {
        self.done
            .await
            .unwrap_or_else(|_| Err(PipelineError::Generation("job worker vanished".into())))
    }
}

/// All jobs the process has seen, plus the in-flight module keys.
pub struct JobRegistry {
    jobs: RwLock<HashMap<Uuid, Job>>,
    inflight_modules: Mutex<HashSet<ModuleKey>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self {
            jobs: RwLock::new(HashMap::new()),
            inflight_modules: Mutex::new(HashSet::new()),
        }
    }

    /// Idempotent, side-effect-free status read.
    pub fn status(&self, job_id: Uuid) -> Option<Job> {
        self.jobs.read().unwrap().get(&job_id).cloned()
    }

    fn insert(&self, job: Job) {
        self.jobs.write().unwrap().insert(job.id, job);
    }

    fn with_job<R>(&self, job_id: Uuid, f: impl FnOnce(&mut Job) -> R) -> Option<R> {
        self.jobs.write().unwrap().get_mut(&job_id).map(f)
    }

    /// Claim the `(content_id, module_number)` key. A duplicate trigger
    /// while one is in flight gets `AlreadyInProgress` instead of a
    /// second job.
    pub fn try_begin_module(&self, key: ModuleKey) -> Result<(), PipelineError> {
        let mut inflight = self.inflight_modules.lock().unwrap();
        if !inflight.insert(key) {
            return Err(PipelineError::AlreadyInProgress {
                content_id: key.0,
                module_number: key.1,
            });
        }
        Ok(())
    }

    fn end_module(&self, key: ModuleKey) {
        self.inflight_modules.lock().unwrap().remove(&key);
    }
}

impl Default for JobRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Submit a job whose input is a raw source.
pub fn submit(
    state: Arc<AppState>,
    kind: JobKind,
    source: SourceDescriptor,
    note_type: NoteType,
) -> JobHandle {
    spawn_job(state, kind, source, note_type, None, None)
}

/// Submit a module-generation job. Claims the idempotency key first; the
/// key is released when the job reaches a terminal state.
pub fn submit_module(
    state: Arc<AppState>,
    curriculum: &Curriculum,
    module: &Module,
) -> Result<JobHandle, PipelineError> {
    let key = (curriculum.content_id, module.module_number);
    state.jobs.try_begin_module(key)?;

    // The module brief is the synthesis input; no fetch stage work needed.
    let prepared = ExtractedContent {
        text: format!(
            "TOPIC: {}\nDETAILS: {}\n\nExplain this topic in extreme depth.",
            module.title, module.description
        ),
        title: module.title.clone(),
        duration_seconds: None,
        origin_url: Some(curriculum.source_url.clone()),
    };

    Ok(spawn_job(
        state,
        JobKind::ModuleGeneration,
        SourceDescriptor::CourseUrl(curriculum.source_url.clone()),
        NoteType::CurriculumModule,
        Some(prepared),
        Some(key),
    ))
}

fn spawn_job(
    state: Arc<AppState>,
    kind: JobKind,
    source: SourceDescriptor,
    note_type: NoteType,
    prepared: Option<ExtractedContent>,
    module_key: Option<ModuleKey>,
) -> JobHandle {
    let job = Job::new(kind, source, note_type);
    let job_id = job.id;
    state.jobs.insert(job);
    state.logs.register(job_id);

    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
        let result = execute(&state, job_id, prepared).await;
        match &result {
            Ok(_) => {
                state.jobs.with_job(job_id, |job| {
                    job.advance(); // persisting -> completed
                });
                info!(job_id = %job_id, "job completed");
                state
                    .logs
                    .finish(job_id, JobStatus::Completed.progress_line());
            }
            Err(e) => {
                let reason = e.to_string();
                error!(job_id = %job_id, error = %reason, "job failed");
                state.jobs.with_job(job_id, |job| job.fail(reason.clone()));
                // Exactly one failure line per failed job.
                state
                    .logs
                    .finish(job_id, format!("Generation failed: {reason}"));
            }
        }
        if let Some(key) = module_key {
            state.jobs.end_module(key);
        }
        let _ = tx.send(result);
    });

    JobHandle { id: job_id, done: rx }
}

/// Advance the job one stage and publish that stage's progress line.
fn advance(state: &AppState, job_id: Uuid) {
    if let Some(Some(status)) = state.jobs.with_job(job_id, |job| job.advance()) {
        if !status.is_terminal() {
            state.logs.publish(job_id, status.progress_line());
        }
    }
}

/// Wrap a capability call in the configured per-stage deadline.
async fn with_deadline<T>(
    state: &AppState,
    fut: impl std::future::Future<Output = Result<T, PipelineError>>,
    on_timeout: impl FnOnce(u64) -> PipelineError,
) -> Result<T, PipelineError> {
    let secs = state.config.limits.stage_timeout_secs;
    match tokio::time::timeout(Duration::from_secs(secs), fut).await {
        Ok(result) => result,
        Err(_) => Err(on_timeout(secs)),
    }
}

/// Drive the pipeline for one job. Advances the state machine stage by
/// stage; the first capability error aborts with that error, which the
/// spawn wrapper turns into a `failed` status and a final log line.
async fn execute(
    state: &Arc<AppState>,
    job_id: Uuid,
    prepared: Option<ExtractedContent>,
) -> Result<JobOutcome, PipelineError> {
    let job = state
        .jobs
        .status(job_id)
        .ok_or_else(|| PipelineError::NotFound(format!("job {job_id}")))?;

    // queued -> fetching
    advance(state, job_id);
    let extracted = match prepared {
        Some(ready) => ready,
        None => {
            let adapter = match &job.source {
                SourceDescriptor::YoutubeUrl(_) => &state.youtube,
                SourceDescriptor::CourseUrl(_) => &state.course,
                SourceDescriptor::PaperUrl(_) | SourceDescriptor::PaperUpload { .. } => {
                    &state.paper
                }
            };
            with_deadline(state, adapter.extract(&job.source), |secs| {
                PipelineError::UnavailableSource(format!("source fetch timed out after {secs}s"))
            })
            .await?
        }
    };

    // fetching -> extracting
    advance(state, job_id);
    info!(
        job_id = %job_id,
        title = %extracted.title,
        chars = extracted.text.len(),
        "content extracted"
    );

    // extracting -> synthesizing
    advance(state, job_id);
    let outcome = match job.kind {
        JobKind::CurriculumAnalysis => {
            let modules = with_deadline(state, state.decomposer.decompose(&extracted), |secs| {
                PipelineError::Generation(format!("curriculum analysis timed out after {secs}s"))
            })
            .await?;
            let curriculum = Curriculum {
                content_id: Uuid::new_v4(),
                title: extracted.title.clone(),
                source_url: extracted.origin_url.clone().unwrap_or_default(),
                created_at: chrono::Utc::now(),
                modules,
            };

            // synthesizing -> persisting
            advance(state, job_id);
            state
                .store
                .put_curriculum(&curriculum)
                .map_err(|e| PipelineError::Store(e.to_string()))?;
            JobOutcome::Curriculum(curriculum)
        }
        _ => {
            let draft = with_deadline(
                state,
                state.synthesizer.synthesize(&extracted, job.note_type),
                |secs| PipelineError::Generation(format!("synthesis timed out after {secs}s")),
            )
            .await?;
            let duration_seconds = extracted.duration_seconds;
            let note = Note::from_draft(draft, job.note_type, job.source.clone());

            // synthesizing -> persisting
            advance(state, job_id);
            state
                .store
                .put_note(&note)
                .map_err(|e| PipelineError::Store(e.to_string()))?;
            state.jobs.with_job(job_id, |job| job.note_id = Some(note.id));
            JobOutcome::Note {
                note,
                duration_seconds,
            }
        }
    };

    Ok(outcome)
}
