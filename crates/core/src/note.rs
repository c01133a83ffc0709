use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A raw input the pipeline knows how to ingest.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum SourceDescriptor {
    YoutubeUrl(String),
    CourseUrl(String),
    PaperUrl(String),
    PaperUpload {
        filename: String,
        #[serde(skip_serializing, default)]
        bytes: Vec<u8>,
    },
}

impl SourceDescriptor {
    /// Stable tag used by listing filters ("youtube", "course", "paper").
    pub fn source_type(&self) -> &'static str {
        match self {
            SourceDescriptor::YoutubeUrl(_) => "youtube",
            SourceDescriptor::CourseUrl(_) => "course",
            SourceDescriptor::PaperUrl(_) | SourceDescriptor::PaperUpload { .. } => "paper",
        }
    }

    pub fn url(&self) -> Option<&str> {
        match self {
            SourceDescriptor::YoutubeUrl(u)
            | SourceDescriptor::CourseUrl(u)
            | SourceDescriptor::PaperUrl(u) => Some(u),
            SourceDescriptor::PaperUpload { .. } => None,
        }
    }
}

/// Which synthesis strategy runs and what shape the output takes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum NoteType {
    /// Deep-comprehension lecture notes.
    Stanford,
    /// Interview / DSA drill notes.
    Dsa,
    /// Podcast wisdom extraction.
    Podcast,
    /// Condensed cheat sheet.
    Cheatsheet,
    /// Deep dive on a single curriculum module.
    CurriculumModule,
    /// Research paper breakdown.
    Research,
}

impl NoteType {
    /// Parse the client's `video_type` string; unknown values fall back
    /// to deep-comprehension, matching the original service.
    pub fn from_client_str(s: &str) -> Self {
        match s {
            "stanford" => NoteType::Stanford,
            "dsa" => NoteType::Dsa,
            "podcast" => NoteType::Podcast,
            "cheatsheet" => NoteType::Cheatsheet,
            "curriculum_module" | "module" => NoteType::CurriculumModule,
            "research" | "research_paper" => NoteType::Research,
            _ => NoteType::Stanford,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NoteType::Stanford => "stanford",
            NoteType::Dsa => "dsa",
            NoteType::Podcast => "podcast",
            NoteType::Cheatsheet => "cheatsheet",
            NoteType::CurriculumModule => "curriculum_module",
            NoteType::Research => "research",
        }
    }
}

/// Normalized output of a source adapter, input to synthesis.
/// Never persisted on its own — only as part of a Note.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedContent {
    pub text: String,
    pub title: String,
    pub duration_seconds: Option<u64>,
    pub origin_url: Option<String>,
}

/// What a synthesis strategy returns before the orchestrator persists it.
#[derive(Debug, Clone)]
pub struct NoteDraft {
    pub title: String,
    pub body: String,
    pub tags: Vec<String>,
}

/// A generated note. Immutable after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Note {
    pub id: Uuid,
    pub title: String,
    pub note_type: NoteType,
    /// Markdown body.
    pub body: String,
    pub word_count: usize,
    pub source: SourceDescriptor,
    pub created_at: DateTime<Utc>,
    pub tags: Vec<String>,
}

impl Note {
    pub fn from_draft(draft: NoteDraft, note_type: NoteType, source: SourceDescriptor) -> Self {
        let word_count = count_words(&draft.body);
        Self {
            id: Uuid::new_v4(),
            title: draft.title,
            note_type,
            body: draft.body,
            word_count,
            source,
            created_at: Utc::now(),
            tags: draft.tags,
        }
    }
}

/// Whitespace-delimited token count.
pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

/// One independently generatable unit of a course.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Module {
    /// 1-based, strictly increasing, no gaps.
    pub module_number: u32,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub key_concepts: Vec<String>,
}

/// Ordered module breakdown of a course page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Curriculum {
    pub content_id: Uuid,
    pub title: String,
    pub source_url: String,
    pub created_at: DateTime<Utc>,
    pub modules: Vec<Module>,
}

impl Curriculum {
    pub fn module(&self, module_number: u32) -> Option<&Module> {
        self.modules.iter().find(|m| m.module_number == module_number)
    }

    /// Find a module by exact title, used when the client omits the number.
    pub fn module_by_title(&self, title: &str) -> Option<&Module> {
        self.modules.iter().find(|m| m.title == title)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn word_count_is_whitespace_tokens() {
        assert_eq!(count_words(""), 0);
        assert_eq!(count_words("   "), 0);
        assert_eq!(count_words("# Notes\n\nOne two   three"), 5);
    }

    #[test]
    fn note_from_draft_counts_body_words() {
        let draft = NoteDraft {
            title: "T".into(),
            body: "alpha beta gamma".into(),
            tags: vec![],
        };
        let note = Note::from_draft(
            draft,
            NoteType::Stanford,
            SourceDescriptor::YoutubeUrl("https://youtu.be/abc123".into()),
        );
        assert_eq!(note.word_count, 3);
        assert_eq!(note.note_type, NoteType::Stanford);
        assert!(!note.body.is_empty());
    }

    #[test]
    fn source_type_tags() {
        assert_eq!(
            SourceDescriptor::CourseUrl("x".into()).source_type(),
            "course"
        );
        assert_eq!(
            SourceDescriptor::PaperUpload {
                filename: "p.pdf".into(),
                bytes: vec![]
            }
            .source_type(),
            "paper"
        );
    }

    #[test]
    fn note_type_client_parse_falls_back_to_stanford() {
        assert_eq!(NoteType::from_client_str("dsa"), NoteType::Dsa);
        assert_eq!(NoteType::from_client_str("bogus"), NoteType::Stanford);
    }

    #[test]
    fn upload_bytes_not_serialized() {
        let source = SourceDescriptor::PaperUpload {
            filename: "p.pdf".into(),
            bytes: vec![1, 2, 3],
        };
        let json = serde_json::to_string(&source).unwrap();
        assert!(!json.contains("bytes"));
    }
}
