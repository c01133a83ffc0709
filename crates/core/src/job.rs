use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::note::{NoteType, SourceDescriptor};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    NoteGeneration,
    CurriculumAnalysis,
    ModuleGeneration,
    ResearchIngest,
}

/// Pipeline stage of a job. Advances strictly forward; `Completed` and
/// `Failed` are terminal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Queued,
    Fetching,
    Extracting,
    Synthesizing,
    Persisting,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    /// The next non-terminal stage, if any.
    pub fn next(&self) -> Option<JobStatus> {
        match self {
            JobStatus::Queued => Some(JobStatus::Fetching),
            JobStatus::Fetching => Some(JobStatus::Extracting),
            JobStatus::Extracting => Some(JobStatus::Synthesizing),
            JobStatus::Synthesizing => Some(JobStatus::Persisting),
            JobStatus::Persisting => Some(JobStatus::Completed),
            JobStatus::Completed | JobStatus::Failed => None,
        }
    }

    /// Human-readable progress line published on entering this stage.
    pub fn progress_line(&self) -> &'static str {
        match self {
            JobStatus::Queued => "Job queued...",
            JobStatus::Fetching => "Fetching source...",
            JobStatus::Extracting => "Extracting content...",
            JobStatus::Synthesizing => "Synthesizing notes...",
            JobStatus::Persisting => "Saving results...",
            JobStatus::Completed => "Notes generated successfully!",
            JobStatus::Failed => "Generation failed",
        }
    }
}

/// One execution of the pipeline. Owned by the orchestrator; immutable
/// once terminal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: Uuid,
    pub kind: JobKind,
    pub status: JobStatus,
    pub source: SourceDescriptor,
    pub note_type: NoteType,
    pub created_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
    /// Id of the note produced on success.
    pub note_id: Option<Uuid>,
}

impl Job {
    pub fn new(kind: JobKind, source: SourceDescriptor, note_type: NoteType) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            status: JobStatus::Queued,
            source,
            note_type,
            created_at: Utc::now(),
            finished_at: None,
            error: None,
            note_id: None,
        }
    }

    /// Advance to the next stage. Returns the new status, or `None` when
    /// the job is already terminal (terminal jobs never move again).
    pub fn advance(&mut self) -> Option<JobStatus> {
        let next = self.status.next()?;
        self.status = next;
        if next.is_terminal() {
            self.finished_at = Some(Utc::now());
        }
        Some(next)
    }

    /// Transition directly to `Failed` recording the reason. No-op on an
    /// already-terminal job.
    pub fn fail(&mut self, reason: String) {
        if self.status.is_terminal() {
            return;
        }
        self.status = JobStatus::Failed;
        self.error = Some(reason);
        self.finished_at = Some(Utc::now());
    }
}
